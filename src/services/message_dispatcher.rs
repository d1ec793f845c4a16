//! Posts a message on a case, optionally attaching an uploaded blob.

use crate::{
    errors::{Error, Result},
    models::{
        message::{Message, SendMessageOutcome},
        upload::UploadedBlob,
    },
    services::graphql_client::GraphQLClient,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

pub const ENVOYER_MESSAGE: &str = r#"mutation($dossierId: ID!, $instructeurId: ID!, $body: String!, $attachment: ID) {
  dossierEnvoyerMessage(input: {
    dossierId: $dossierId,
    instructeurId: $instructeurId,
    body: $body,
    attachment: $attachment
  }) {
    message {
      email
      body
      attachment {
        filename
        url
        byteSize
        checksum
        contentType
      }
    }
    errors {
      message
    }
  }
}"#;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvoyerMessageData {
    dossier_envoyer_message: SendMessageOutcome,
}

#[derive(Clone, Debug)]
pub struct MessageDispatcher {
    client: GraphQLClient,
}

impl MessageDispatcher {
    pub fn new(client: GraphQLClient) -> Self {
        Self { client }
    }

    /// Send `body` as `reviewer_id` on `case_id`.
    ///
    /// Field-level errors are part of the returned outcome, not an `Err`.
    pub async fn send(
        &self,
        case_id: &str,
        reviewer_id: &str,
        body: &str,
        attachment: Option<&UploadedBlob>,
    ) -> Result<SendMessageOutcome> {
        let variables = json!({
            "dossierId": case_id,
            "instructeurId": reviewer_id,
            "body": body,
            "attachment": attachment.map(|blob| blob.signed_blob_id().as_str()),
        });

        let data: EnvoyerMessageData = self.client.request(ENVOYER_MESSAGE, variables).await?;
        let outcome = data.dossier_envoyer_message;

        if !outcome.errors.is_empty() {
            for error in &outcome.errors {
                warn!("message rejected: {}", error.message);
            }
        } else if outcome.message.is_some() {
            info!("message sent on case {}", case_id);
        }

        Ok(outcome)
    }

    /// [`send`](Self::send), treating field errors as a failure.
    pub async fn send_checked(
        &self,
        case_id: &str,
        reviewer_id: &str,
        body: &str,
        attachment: Option<&UploadedBlob>,
    ) -> Result<Message> {
        let outcome = self.send(case_id, reviewer_id, body, attachment).await?;
        into_message(outcome)
    }
}

pub fn into_message(outcome: SendMessageOutcome) -> Result<Message> {
    if !outcome.errors.is_empty() {
        return Err(Error::ValidationErrors(outcome.errors));
    }
    outcome.message.ok_or_else(|| {
        Error::UnexpectedResponse("message mutation returned neither message nor errors".into())
    })
}
