//! Direct-upload slot returned by negotiation and the blob it produces.

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

/// Signed identifier of a blob, referenced when attaching it to a message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BlobId(String);

impl BlobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A write-once upload target.
///
/// Deliberately not `Clone`: the uploader takes the slot by value, so a slot
/// can be consumed at most once.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadSlot {
    /// Storage URL receiving the PUT.
    pub url: String,

    /// Headers to forward verbatim with the PUT.
    #[serde(deserialize_with = "deserialize_headers")]
    pub headers: BTreeMap<String, String>,

    /// Blob identifier to reference once the bytes are stored.
    pub signed_blob_id: BlobId,
}

/// Proof that the bytes of a negotiated slot were accepted by the store.
///
/// Only [`crate::services::blob_uploader::BlobUploader`] creates these, so a
/// message can only reference a blob that was negotiated and uploaded.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadedBlob {
    signed_blob_id: BlobId,
}

impl UploadedBlob {
    pub(crate) fn new(signed_blob_id: BlobId) -> Self {
        Self { signed_blob_id }
    }

    pub fn signed_blob_id(&self) -> &BlobId {
        &self.signed_blob_id
    }
}

/// The API sends `headers` as a JSON-encoded string; an inline object is
/// accepted as well. Non-string header values are kept as their JSON text.
fn deserialize_headers<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let object = match raw {
        Value::String(encoded) => serde_json::from_str::<Value>(&encoded)
            .map_err(|err| de::Error::custom(format!("headers are not valid JSON: {err}")))?,
        other => other,
    };

    match object {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, value)
            })
            .collect()),
        Value::Null => Ok(BTreeMap::new()),
        other => Err(de::Error::custom(format!(
            "headers must be a JSON object, got {other}"
        ))),
    }
}
