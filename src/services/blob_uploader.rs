//! Transfers file bytes to a negotiated upload slot.

use crate::{
    errors::{Error, Result},
    models::upload::{UploadSlot, UploadedBlob},
    services::metadata_service::read_file,
};
use bytes::Bytes;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use std::{collections::BTreeMap, path::Path};
use tracing::{debug, info};

/// Longest slice of a rejection body kept in the error.
const MAX_REJECTION_BODY: usize = 512;

#[derive(Clone, Debug)]
pub struct BlobUploader {
    http: Client,
}

impl BlobUploader {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// PUT the contents of `path` to the slot URL with the slot headers.
    ///
    /// The slot is consumed whatever the outcome; a failed upload needs a
    /// fresh negotiation.
    pub async fn upload(&self, slot: UploadSlot, path: &Path) -> Result<UploadedBlob> {
        let UploadSlot {
            url,
            headers,
            signed_blob_id,
        } = slot;

        let headers = header_map(&headers)?;
        let body = Bytes::from(read_file(path).await?);
        let byte_size = body.len();

        debug!("PUT {} bytes to {}", byte_size, url);
        let response = self
            .http
            .put(&url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(Error::UploadFailed)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UploadRejected {
                status: status.as_u16(),
                body: truncate(body, MAX_REJECTION_BODY),
            });
        }

        info!("uploaded {} bytes for blob {}", byte_size, signed_blob_id);
        Ok(UploadedBlob::new(signed_blob_id))
    }
}

/// Convert the slot headers verbatim; nothing is added or overridden.
fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = || Error::InvalidUploadHeader { name: name.clone() };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}
