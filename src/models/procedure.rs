//! A procedure (démarche): the workflow definition grouping many cases.

use crate::models::case::{CaseState, Reviewer};
use serde::{Deserialize, Serialize};

/// A group of reviewers attached to a procedure.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReviewerGroup {
    #[serde(rename = "instructeurs", default)]
    pub reviewers: Vec<Reviewer>,
}

/// Lightweight case entry listed under a procedure.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CaseSummary {
    pub id: String,
    pub number: i64,
    pub state: Option<CaseState>,
}

/// Relay-style connection wrapper used by the API for paginated lists.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

/// Snapshot of a procedure as returned by the `demarche` query.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Procedure {
    pub id: String,
    pub number: i64,

    #[serde(rename = "groupeInstructeurs", default)]
    pub reviewer_groups: Vec<ReviewerGroup>,

    /// Cases already filtered server-side by state.
    #[serde(rename = "dossiers")]
    pub cases: Connection<CaseSummary>,
}

impl Procedure {
    pub fn first_case(&self) -> Option<&CaseSummary> {
        self.cases.nodes.first()
    }

    /// First reviewer of the first reviewer group.
    ///
    /// Only the first group is considered; later groups are not searched
    /// when it happens to be empty.
    pub fn first_reviewer(&self) -> Option<&Reviewer> {
        self.reviewer_groups
            .first()
            .and_then(|group| group.reviewers.first())
    }
}
