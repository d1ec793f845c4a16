//! Attach a local file to a case of a case-management GraphQL API and
//! notify the case reviewer with a message referencing it.
//!
//! The work happens in [`services::pipeline`]; each step lives in its own
//! service module and can be used on its own.

pub mod config;
pub mod errors;
pub mod models;
pub mod services;

pub use config::PipelineConfig;
pub use errors::{ApiCause, ApiError, Error, Result};
pub use services::case_resolver::CaseTarget;
pub use services::pipeline::{Pipeline, PipelineReport};
