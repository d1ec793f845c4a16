//! Minimal GraphQL-over-HTTP client for the case-management API.
//!
//! One POST per call with `{query, variables}` and a bearer token. Transport
//! failures, an `errors` array and a lone top-level `error` field all come
//! back as a single [`ApiError`].

use crate::errors::{ApiCause, ApiError, Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::debug;

/// Stateless client; cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct GraphQLClient {
    http: Client,
    endpoint: String,
    token: String,
}

impl std::fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GraphQLClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_http_client(Client::new(), endpoint, token)
    }

    /// Use a preconfigured reqwest client (timeouts, proxies, TLS).
    pub fn with_http_client(
        http: Client,
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run `document` with `variables` and return the raw `data` payload.
    pub async fn execute(
        &self,
        document: &str,
        variables: Value,
    ) -> std::result::Result<Value, ApiError> {
        let body = json!({ "query": document, "variables": variables });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|err| ApiError::transport(error_chain(&err)))?;

        let status = response.status();
        debug!("GraphQL response status {}", status);

        let envelope = response.json::<Value>().await.map_err(|err| {
            ApiError::protocol(vec![ApiCause::new(format!(
                "unreadable response body (HTTP {}): {}",
                status.as_u16(),
                error_chain(&err)
            ))])
        })?;

        normalize_response(envelope)
    }

    /// Like [`execute`](Self::execute), then deserialize `data` into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        document: &str,
        variables: Value,
    ) -> Result<T> {
        let data = self.execute(document, variables).await?;
        serde_json::from_value(data).map_err(|err| Error::UnexpectedResponse(err.to_string()))
    }
}

/// Collapse the possible error shapes of a GraphQL response.
///
/// A non-empty `errors` array wins over `data`, even when both are present.
pub fn normalize_response(envelope: Value) -> std::result::Result<Value, ApiError> {
    let mut map: Map<String, Value> = match envelope {
        Value::Object(map) => map,
        other => {
            return Err(ApiError::protocol(vec![ApiCause::new(format!(
                "response is not a JSON object: {other}"
            ))]));
        }
    };

    match map.remove("errors") {
        Some(Value::Array(items)) if !items.is_empty() => {
            return Err(ApiError::protocol(
                items.into_iter().map(ApiCause::from_value).collect(),
            ));
        }
        Some(Value::Array(_)) | Some(Value::Null) | None => {}
        Some(other) => return Err(ApiError::protocol(vec![ApiCause::from_value(other)])),
    }

    match map.remove("error") {
        Some(Value::Null) | None => {}
        Some(error) => return Err(ApiError::protocol(vec![ApiCause::from_value(error)])),
    }

    match map.remove("data") {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(ApiError::protocol(vec![ApiCause::new(
            "response carried neither data nor errors",
        )])),
    }
}

/// Render an error with its sources, e.g. `error sending request: connection refused`.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
