//! A case (dossier) and the reviewers (instructeurs) allowed to act on it.

use crate::models::message::Message;
use serde::{Deserialize, Serialize};

/// A reviewer of a case.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Reviewer {
    /// Opaque GraphQL id, used as the message author.
    pub id: String,

    /// Contact email of the reviewer.
    pub email: String,
}

/// Snapshot of a case as returned by the `dossier` query.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Case {
    /// Opaque GraphQL id (target of uploads and messages).
    pub id: String,

    /// Human-facing case number.
    pub number: i64,

    /// Reviewers in API order; the first one is the message author.
    #[serde(rename = "instructeurs", default)]
    pub reviewers: Vec<Reviewer>,

    /// Message history, oldest first.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Case {
    pub fn first_reviewer(&self) -> Option<&Reviewer> {
        self.reviewers.first()
    }
}

/// Workflow state of a case, in the API's enum spelling.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaseState {
    EnConstruction,
    #[default]
    EnInstruction,
    Accepte,
    Refuse,
    SansSuite,
}

impl CaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseState::EnConstruction => "en_construction",
            CaseState::EnInstruction => "en_instruction",
            CaseState::Accepte => "accepte",
            CaseState::Refuse => "refuse",
            CaseState::SansSuite => "sans_suite",
        }
    }
}

impl std::str::FromStr for CaseState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en_construction" => Ok(CaseState::EnConstruction),
            "en_instruction" => Ok(CaseState::EnInstruction),
            "accepte" => Ok(CaseState::Accepte),
            "refuse" => Ok(CaseState::Refuse),
            "sans_suite" => Ok(CaseState::SansSuite),
            other => Err(format!("unknown case state `{other}`")),
        }
    }
}
