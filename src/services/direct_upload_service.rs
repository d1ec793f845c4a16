//! Negotiates a direct-upload slot for a described file.

use crate::{
    errors::Result,
    models::{file::FileDescriptor, upload::UploadSlot},
    services::graphql_client::GraphQLClient,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

pub const CREATE_DIRECT_UPLOAD: &str = r#"mutation($dossierId: ID!, $filename: String!, $byteSize: Int!, $checksum: String!, $contentType: String!) {
  createDirectUpload(input: {
    dossierId: $dossierId,
    filename: $filename,
    byteSize: $byteSize,
    checksum: $checksum,
    contentType: $contentType
  }) {
    directUpload {
      url
      headers
      signedBlobId
    }
  }
}"#;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDirectUploadData {
    create_direct_upload: CreateDirectUploadPayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDirectUploadPayload {
    direct_upload: UploadSlot,
}

#[derive(Clone, Debug)]
pub struct DirectUploadService {
    client: GraphQLClient,
}

impl DirectUploadService {
    pub fn new(client: GraphQLClient) -> Self {
        Self { client }
    }

    /// Request an upload slot valid for exactly `file`'s size and checksum.
    ///
    /// Not retried: every call yields a distinct slot and blob id.
    pub async fn negotiate(&self, case_id: &str, file: &FileDescriptor) -> Result<UploadSlot> {
        let variables = json!({
            "dossierId": case_id,
            "filename": file.filename,
            "byteSize": file.byte_size,
            "checksum": file.checksum,
            "contentType": file.content_type.as_str(),
        });

        let data: CreateDirectUploadData =
            self.client.request(CREATE_DIRECT_UPLOAD, variables).await?;
        let slot = data.create_direct_upload.direct_upload;

        info!(
            "negotiated upload slot for {} (blob {}) at {}",
            file.filename, slot.signed_blob_id, slot.url
        );
        debug!("upload slot headers: {:?}", slot.headers);

        Ok(slot)
    }
}
