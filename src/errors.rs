//! Error types shared by every pipeline step.
//!
//! GraphQL failures of any origin are normalized into [`ApiError`], which
//! keeps the full list of causes reported by the remote API. Everything else
//! the pipeline can fail on is a variant of [`Error`].

use crate::models::message::FieldError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, io, path::PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Where a GraphQL failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorOrigin {
    /// No response was received (connection, DNS, timeout).
    Transport,
    /// A response was received and reported errors, or could not be read.
    Protocol,
}

/// One underlying cause of an [`ApiError`], as reported by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCause {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl ApiCause {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            extensions: None,
        }
    }

    /// Build a cause from an arbitrary JSON error entry.
    ///
    /// Entries usually follow the GraphQL error shape, but some endpoints
    /// emit a bare string or an object without `message`; those are kept
    /// as their JSON text rather than dropped.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(message) => Self::new(message),
            Value::Object(_) => match serde_json::from_value::<ApiCause>(value.clone()) {
                Ok(cause) => cause,
                Err(_) => Self::new(value.to_string()),
            },
            other => Self::new(other.to_string()),
        }
    }
}

/// Uniform failure of a GraphQL request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub origin: ApiErrorOrigin,
    causes: Vec<ApiCause>,
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            origin: ApiErrorOrigin::Transport,
            causes: vec![ApiCause::new(message)],
        }
    }

    /// Protocol-level failure. An empty cause list is replaced by a generic
    /// cause so that `first_message` always has something to show.
    pub fn protocol(causes: Vec<ApiCause>) -> Self {
        let causes = if causes.is_empty() {
            vec![ApiCause::new("the API reported an unspecified error")]
        } else {
            causes
        };
        Self {
            origin: ApiErrorOrigin::Protocol,
            causes,
        }
    }

    /// Every cause, in the order the API reported them.
    pub fn causes(&self) -> &[ApiCause] {
        &self.causes
    }

    pub fn first_message(&self) -> &str {
        self.causes
            .first()
            .map(|c| c.message.as_str())
            .unwrap_or_default()
    }

    pub fn is_transport(&self) -> bool {
        self.origin == ApiErrorOrigin::Transport
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_message())?;
        if self.causes.len() > 1 {
            write!(f, " (and {} more)", self.causes.len() - 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(ApiError),

    #[error("API error: {0}")]
    Protocol(ApiError),

    #[error("file `{}` not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("file `{}` could not be read: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no case available: {0}")]
    NoCaseAvailable(String),

    #[error("no reviewer available for case {0}")]
    NoReviewerAvailable(String),

    #[error("upload slot header `{name}` is not a valid HTTP header")]
    InvalidUploadHeader { name: String },

    #[error("blob upload failed: {0}")]
    UploadFailed(#[source] reqwest::Error),

    #[error("blob store rejected the upload with HTTP {status}: {body}")]
    UploadRejected { status: u16, body: String },

    #[error("message rejected: {}", join_field_errors(.0))]
    ValidationErrors(Vec<FieldError>),

    #[error("unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        match err.origin {
            ApiErrorOrigin::Transport => Error::Transport(err),
            ApiErrorOrigin::Protocol => Error::Protocol(err),
        }
    }
}

impl Error {
    /// The normalized GraphQL error, when this failure came from one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Transport(err) | Error::Protocol(err) => Some(err),
            _ => None,
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
