//! The upload-and-notify pipeline.
//!
//! resolve case -> describe file -> negotiate slot -> PUT bytes -> send message
//!
//! Steps run strictly in order and the first error ends the run. Nothing is
//! retried: a caller that wants to retry runs the whole pipeline again so a
//! fresh slot is negotiated.

use crate::{
    config::PipelineConfig,
    errors::{Error, Result},
    models::{file::FileDescriptor, message::Message, upload::BlobId},
    services::{
        blob_uploader::BlobUploader,
        case_resolver::{CaseResolver, CaseTarget, ResolvedCase},
        direct_upload_service::DirectUploadService,
        graphql_client::GraphQLClient,
        message_dispatcher::MessageDispatcher,
        metadata_service,
    },
};
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// What a successful run produced.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PipelineReport {
    pub case: ResolvedCase,
    pub file: FileDescriptor,
    pub upload_url: String,
    pub blob_id: BlobId,
    pub message: Message,
}

#[derive(Clone, Debug)]
pub struct Pipeline {
    resolver: CaseResolver,
    negotiator: DirectUploadService,
    uploader: BlobUploader,
    dispatcher: MessageDispatcher,
}

impl Pipeline {
    /// Build the services for `config`'s endpoint and token.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| Error::Configuration(err.to_string()))?;

        let client =
            GraphQLClient::with_http_client(http.clone(), &config.endpoint_url, &config.token);
        Ok(Self::from_parts(client, http))
    }

    /// Assemble from an existing GraphQL client and the HTTP client used for
    /// the blob PUT.
    pub fn from_parts(client: GraphQLClient, http: Client) -> Self {
        Self {
            resolver: CaseResolver::new(client.clone()),
            negotiator: DirectUploadService::new(client.clone()),
            uploader: BlobUploader::new(http),
            dispatcher: MessageDispatcher::new(client),
        }
    }

    pub async fn run(
        &self,
        target: &CaseTarget,
        file_path: &Path,
        message_body: &str,
    ) -> Result<PipelineReport> {
        let case = self.resolver.resolve(target).await?;

        let file = metadata_service::describe_file(file_path).await?;
        info!(
            "file: {} ({} bytes, {}, md5 {})",
            file.filename, file.byte_size, file.content_type, file.checksum
        );

        let slot = self.negotiator.negotiate(&case.case_id, &file).await?;
        let upload_url = slot.url.clone();

        let blob = self.uploader.upload(slot, file_path).await?;

        let message = self
            .dispatcher
            .send_checked(&case.case_id, &case.reviewer_id, message_body, Some(&blob))
            .await?;
        info!("message: {} <{}>", message.body, message.email);

        Ok(PipelineReport {
            case,
            file,
            upload_url,
            blob_id: blob.signed_blob_id().clone(),
            message,
        })
    }
}

/// Run the pipeline once for `config`.
pub async fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    Pipeline::new(config)?
        .run(&config.target, &config.file_path, &config.message_body)
        .await
}
