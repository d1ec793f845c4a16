//! Locates the target case and the reviewer who will author the message.
//!
//! Three ways in, see [`CaseTarget`]:
//! - by case number: one `dossier` query, first reviewer of the case;
//! - by procedure number: one `demarche` query, first case in the requested
//!   state and first reviewer of the first reviewer group, then optionally
//!   a `dossier` query for that case's message history;
//! - by known ids: no query at all.

use crate::{
    errors::{Error, Result},
    models::{
        case::{Case, CaseState},
        message::Message,
        procedure::Procedure,
    },
    services::graphql_client::GraphQLClient,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

pub const GET_DOSSIER: &str = r#"query($dossierNumber: Int!) {
  dossier(number: $dossierNumber) {
    id
    number
    instructeurs {
      id
      email
    }
    messages {
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
  }
}"#;

pub const GET_DEMARCHE: &str = r#"query($demarcheNumber: Int!, $state: DossierState) {
  demarche(number: $demarcheNumber) {
    id
    number
    groupeInstructeurs {
      instructeurs {
        id
        email
      }
    }
    dossiers(state: $state) {
      nodes {
        id
        number
        state
      }
    }
  }
}"#;

/// How the target case is identified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaseTarget {
    ByCaseNumber(i64),
    ByProcedure {
        number: i64,
        state: CaseState,
        /// Fetch the chosen case's messages with a second query.
        fetch_history: bool,
    },
    ByKnownIds {
        case_id: String,
        reviewer_id: String,
    },
}

/// Outcome of resolution. `messages` is informational only.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ResolvedCase {
    pub case_id: String,
    pub case_number: Option<i64>,
    pub reviewer_id: String,
    pub reviewer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
}

#[derive(Deserialize)]
struct DossierData {
    dossier: Option<Case>,
}

#[derive(Deserialize)]
struct DemarcheData {
    demarche: Option<Procedure>,
}

#[derive(Clone, Debug)]
pub struct CaseResolver {
    client: GraphQLClient,
}

impl CaseResolver {
    pub fn new(client: GraphQLClient) -> Self {
        Self { client }
    }

    pub async fn resolve(&self, target: &CaseTarget) -> Result<ResolvedCase> {
        let resolved = match target {
            CaseTarget::ByCaseNumber(number) => self.resolve_case_number(*number).await?,
            CaseTarget::ByProcedure {
                number,
                state,
                fetch_history,
            } => {
                self.resolve_procedure(*number, *state, *fetch_history)
                    .await?
            }
            CaseTarget::ByKnownIds {
                case_id,
                reviewer_id,
            } => ResolvedCase {
                case_id: case_id.clone(),
                case_number: None,
                reviewer_id: reviewer_id.clone(),
                reviewer_email: None,
                messages: None,
            },
        };

        info!("case: {}", resolved.case_id);
        info!("reviewer: {}", resolved.reviewer_id);
        Ok(resolved)
    }

    /// Fetch a case with its reviewers and messages.
    pub async fn fetch_case(&self, number: i64) -> Result<Case> {
        let data: DossierData = self
            .client
            .request(GET_DOSSIER, json!({ "dossierNumber": number }))
            .await?;
        data.dossier
            .ok_or_else(|| Error::NoCaseAvailable(format!("case {number} was not found")))
    }

    /// Fetch a procedure with its reviewer groups and its cases in `state`.
    pub async fn fetch_procedure(&self, number: i64, state: CaseState) -> Result<Procedure> {
        let variables = json!({ "demarcheNumber": number, "state": state.as_str() });
        let data: DemarcheData = self.client.request(GET_DEMARCHE, variables).await?;
        data.demarche
            .ok_or_else(|| Error::NoCaseAvailable(format!("procedure {number} was not found")))
    }

    async fn resolve_case_number(&self, number: i64) -> Result<ResolvedCase> {
        let case = self.fetch_case(number).await?;
        let reviewer = case
            .first_reviewer()
            .cloned()
            .ok_or_else(|| Error::NoReviewerAvailable(case.number.to_string()))?;

        Ok(ResolvedCase {
            case_id: case.id,
            case_number: Some(case.number),
            reviewer_id: reviewer.id,
            reviewer_email: Some(reviewer.email),
            messages: Some(case.messages),
        })
    }

    async fn resolve_procedure(
        &self,
        number: i64,
        state: CaseState,
        fetch_history: bool,
    ) -> Result<ResolvedCase> {
        let procedure = self.fetch_procedure(number, state).await?;

        let case = procedure.first_case().cloned().ok_or_else(|| {
            Error::NoCaseAvailable(format!(
                "procedure {number} has no case in state {}",
                state.as_str()
            ))
        })?;
        let reviewer = procedure
            .first_reviewer()
            .cloned()
            .ok_or_else(|| Error::NoReviewerAvailable(case.number.to_string()))?;

        let messages = if fetch_history {
            let history = self.fetch_case(case.number).await?;
            info!("case {} has {} message(s)", case.number, history.messages.len());
            Some(history.messages)
        } else {
            None
        };

        Ok(ResolvedCase {
            case_id: case.id,
            case_number: Some(case.number),
            reviewer_id: reviewer.id,
            reviewer_email: Some(reviewer.email),
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_ids_need_no_request() {
        // Nothing listens on this port; any request would fail.
        let resolver = CaseResolver::new(GraphQLClient::new("http://127.0.0.1:9/graphql", "t"));
        let resolved = resolver
            .resolve(&CaseTarget::ByKnownIds {
                case_id: "RG9zc2llci0x".into(),
                reviewer_id: "SW5zdHJ1Y3RldXItMQ==".into(),
            })
            .await
            .unwrap();

        assert_eq!(resolved.case_id, "RG9zc2llci0x");
        assert_eq!(resolved.reviewer_id, "SW5zdHJ1Y3RldXItMQ==");
        assert_eq!(resolved.case_number, None);
        assert!(resolved.messages.is_none());
    }
}
