pub mod blob_uploader;
pub mod case_resolver;
pub mod direct_upload_service;
pub mod graphql_client;
pub mod message_dispatcher;
pub mod metadata_service;
pub mod pipeline;
