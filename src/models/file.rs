//! Description of a local file as submitted to upload negotiation.

use serde::{Serialize, Serializer};
use std::fmt;

/// Sentinel sent when the MIME type cannot be derived from the extension.
pub const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// MIME type of a file, with an explicit unresolved state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentType {
    Known(String),
    Unknown,
}

impl ContentType {
    /// Value submitted to the API. `Unknown` maps to
    /// [`UNKNOWN_CONTENT_TYPE`] because the API requires a non-null type.
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::Known(mime) => mime,
            ContentType::Unknown => UNKNOWN_CONTENT_TYPE,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, ContentType::Known(_))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Size, checksum and type of a local file.
///
/// Serializes to the variable names of the `createDirectUpload` mutation.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Basename of the file, without any directory component.
    pub filename: String,

    /// Exact byte length of the contents.
    pub byte_size: u64,

    /// Base64-encoded MD5 digest of the full contents.
    pub checksum: String,

    /// MIME type derived from the extension.
    pub content_type: ContentType,
}
