//! In-process stand-in for the case-management API and its blob store.
//!
//! - `POST /graphql` answers the four documents the pipeline sends.
//! - `PUT /blobs/{key}` accepts each negotiated slot once, streaming the body
//!   through MD5 and rejecting it when the digest does not match the
//!   checksum submitted at negotiation.

#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{post, put},
};
use base64::{Engine as _, engine::general_purpose};
use futures::StreamExt;
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const TOKEN: &str = "test-token";

#[derive(Clone, Debug)]
struct PendingSlot {
    blob_id: String,
    filename: String,
    byte_size: u64,
    checksum: String,
    content_type: String,
}

#[derive(Clone, Debug)]
pub struct StoredBlob {
    pub filename: String,
    pub byte_size: u64,
    pub checksum: String,
    pub content_type: String,
}

#[derive(Default)]
struct Inner {
    base_url: String,
    cases: HashMap<i64, Value>,
    procedures: HashMap<i64, Value>,
    slots: HashMap<String, PendingSlot>,
    blobs: HashMap<String, StoredBlob>,
    next_blob: u32,
    forced_message_errors: Vec<String>,
    operations: Vec<String>,
    put_attempts: usize,
}

#[derive(Clone, Default)]
pub struct MockApi {
    inner: Arc<Mutex<Inner>>,
}

impl MockApi {
    /// Bind on an ephemeral port and serve in the background.
    pub async fn start() -> Self {
        let api = MockApi::default();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        api.inner.lock().unwrap().base_url = format!("http://{addr}");

        let app = Router::new()
            .route("/graphql", post(graphql))
            .route("/blobs/{key}", put(upload_blob))
            .with_state(api.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        api
    }

    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.inner.lock().unwrap().base_url)
    }

    pub fn add_case(&self, case: Value) {
        let number = case["number"].as_i64().unwrap();
        self.inner.lock().unwrap().cases.insert(number, case);
    }

    pub fn add_procedure(&self, procedure: Value) {
        let number = procedure["number"].as_i64().unwrap();
        self.inner
            .lock()
            .unwrap()
            .procedures
            .insert(number, procedure);
    }

    pub fn force_message_errors(&self, messages: &[&str]) {
        self.inner.lock().unwrap().forced_message_errors =
            messages.iter().map(|m| m.to_string()).collect();
    }

    /// Names of the GraphQL operations received, in order.
    pub fn operations(&self) -> Vec<String> {
        self.inner.lock().unwrap().operations.clone()
    }

    pub fn blob(&self, blob_id: &str) -> Option<StoredBlob> {
        self.inner.lock().unwrap().blobs.get(blob_id).cloned()
    }

    pub fn put_attempts(&self) -> usize {
        self.inner.lock().unwrap().put_attempts
    }
}

/// A case with two reviewers and one earlier message.
pub fn case_fixture(number: i64) -> Value {
    json!({
        "id": format!("Dossier-{number}"),
        "number": number,
        "instructeurs": [
            {"id": "Instructeur-1", "email": "agent@example.gouv.fr"},
            {"id": "Instructeur-2", "email": "backup@example.gouv.fr"}
        ],
        "messages": [
            {"email": "usager@example.org", "body": "Voici mon dossier", "attachment": null}
        ]
    })
}

async fn graphql(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> impl IntoResponse {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {TOKEN}").as_str());
    if !authorized {
        // Some deployments answer auth failures with a lone `error` field.
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Unauthorized"}})),
        );
    }

    let query = request["query"].as_str().unwrap_or_default().to_string();
    let vars = request["variables"].clone();
    let mut inner = api.inner.lock().unwrap();

    let body = if query.contains("createDirectUpload") {
        inner.operations.push("createDirectUpload".into());
        create_direct_upload(&mut inner, &vars)
    } else if query.contains("dossierEnvoyerMessage") {
        inner.operations.push("dossierEnvoyerMessage".into());
        send_message(&inner, &vars)
    } else if query.contains("demarche(") {
        inner.operations.push("demarche".into());
        demarche(&inner, &vars)
    } else if query.contains("dossier(") {
        inner.operations.push("dossier".into());
        dossier(&inner, &vars)
    } else {
        json!({"errors": [{"message": "unknown operation"}]})
    };

    (StatusCode::OK, Json(body))
}

fn dossier(inner: &Inner, vars: &Value) -> Value {
    let number = vars["dossierNumber"].as_i64().unwrap_or_default();
    match inner.cases.get(&number) {
        Some(case) => json!({"data": {"dossier": case}}),
        None => json!({
            "data": {"dossier": null},
            "errors": [
                {"message": format!("Dossier not found: {number}"), "path": ["dossier"]},
                {"message": "Variable dossierNumber does not match any dossier"}
            ]
        }),
    }
}

fn demarche(inner: &Inner, vars: &Value) -> Value {
    let number = vars["demarcheNumber"].as_i64().unwrap_or_default();
    let Some(procedure) = inner.procedures.get(&number) else {
        return json!({"errors": [{"message": format!("Demarche not found: {number}")}]});
    };

    let mut procedure = procedure.clone();
    if let Some(state) = vars["state"].as_str() {
        let nodes: Vec<Value> = procedure["dossiers"]["nodes"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|node| node["state"] == state)
            .collect();
        procedure["dossiers"]["nodes"] = Value::Array(nodes);
    }
    json!({"data": {"demarche": procedure}})
}

fn create_direct_upload(inner: &mut Inner, vars: &Value) -> Value {
    let Some(checksum) = vars["checksum"].as_str() else {
        return json!({"errors": [{"message": "checksum is required"}]});
    };
    let content_type = vars["contentType"].as_str().unwrap_or_default();
    if content_type.is_empty() {
        return json!({"errors": [{"message": "contentType can't be blank"}]});
    }

    inner.next_blob += 1;
    let blob_id = format!("blob-{}", inner.next_blob);
    let key = Uuid::new_v4().to_string();
    inner.slots.insert(
        key.clone(),
        PendingSlot {
            blob_id: blob_id.clone(),
            filename: vars["filename"].as_str().unwrap_or_default().to_string(),
            byte_size: vars["byteSize"].as_u64().unwrap_or_default(),
            checksum: checksum.to_string(),
            content_type: content_type.to_string(),
        },
    );

    let headers = json!({"Content-Type": content_type, "Content-MD5": checksum}).to_string();
    json!({
        "data": {
            "createDirectUpload": {
                "directUpload": {
                    "url": format!("{}/blobs/{}", inner.base_url, key),
                    "headers": headers,
                    "signedBlobId": blob_id
                }
            }
        }
    })
}

fn send_message(inner: &Inner, vars: &Value) -> Value {
    let payload = |message: Value, errors: Vec<Value>| {
        json!({"data": {"dossierEnvoyerMessage": {"message": message, "errors": errors}}})
    };

    if !inner.forced_message_errors.is_empty() {
        let errors = inner
            .forced_message_errors
            .iter()
            .map(|m| json!({"message": m}))
            .collect();
        return payload(Value::Null, errors);
    }

    let attachment = match vars["attachment"].as_str() {
        None => Value::Null,
        Some(blob_id) => match inner.blobs.get(blob_id) {
            Some(blob) => json!({
                "filename": blob.filename,
                "url": format!("{}/files/{}", inner.base_url, blob_id),
                // BigInt fields come back as strings.
                "byteSize": blob.byte_size.to_string(),
                "checksum": blob.checksum,
                "contentType": blob.content_type
            }),
            None => {
                return payload(
                    Value::Null,
                    vec![json!({"message": "La pièce jointe n'a pas été téléversée"})],
                );
            }
        },
    };

    payload(
        json!({
            "email": "agent@example.gouv.fr",
            "body": vars["body"],
            "attachment": attachment
        }),
        Vec::new(),
    )
}

/// Object-store style upload: stream, digest, compare, then commit.
async fn upload_blob(
    State(api): State<MockApi>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> impl IntoResponse {
    let slot = {
        let mut inner = api.inner.lock().unwrap();
        inner.put_attempts += 1;
        // Slots are single-use whatever the outcome.
        inner.slots.remove(&key)
    };
    let Some(slot) = slot else {
        return (StatusCode::NOT_FOUND, "NoSuchUpload".to_string());
    };

    let mut digest = md5::Context::new();
    let mut size: u64 = 0;
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else {
            return (StatusCode::BAD_REQUEST, "IncompleteBody".to_string());
        };
        size += chunk.len() as u64;
        digest.consume(&chunk);
    }
    let actual = general_purpose::STANDARD.encode(digest.compute().0);

    let declared = headers
        .get("content-md5")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if declared != slot.checksum || actual != slot.checksum || size != slot.byte_size {
        return (
            StatusCode::BAD_REQUEST,
            format!("BadDigest: expected {} got {}", slot.checksum, actual),
        );
    }

    api.inner.lock().unwrap().blobs.insert(
        slot.blob_id,
        StoredBlob {
            filename: slot.filename,
            byte_size: size,
            checksum: actual,
            content_type: slot.content_type,
        },
    );
    (StatusCode::OK, String::new())
}
