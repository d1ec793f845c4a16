//! Data model of the case-management API as seen by the pipeline.
//!
//! These types mirror the GraphQL documents the services issue. Field names
//! follow the API's camelCase (and French) naming through serde renames so
//! the Rust side can use the domain vocabulary.

pub mod case;
pub mod file;
pub mod message;
pub mod procedure;
pub mod upload;
