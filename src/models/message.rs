//! Messages exchanged on a case and the outcome of sending one.

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

/// File attached to a message, as echoed back by the API.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,

    /// Download URL, when the API exposes one.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(deserialize_with = "deserialize_byte_size")]
    pub byte_size: u64,

    pub checksum: String,

    #[serde(default)]
    pub content_type: Option<String>,
}

/// A message posted on a case.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Sender email.
    pub email: String,
    pub body: String,
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

/// A field-level validation error returned by a mutation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub message: String,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Payload of the `dossierEnvoyerMessage` mutation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SendMessageOutcome {
    #[serde(default)]
    pub message: Option<Message>,

    /// Always present; `null` from the API becomes an empty list.
    #[serde(default, deserialize_with = "deserialize_nullable_list")]
    pub errors: Vec<FieldError>,
}

impl SendMessageOutcome {
    pub fn is_accepted(&self) -> bool {
        self.errors.is_empty() && self.message.is_some()
    }
}

/// `byteSize` is a BigInt on the API side and may arrive as a string.
fn deserialize_byte_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("invalid byte size {n}"))),
        Value::String(s) => s
            .parse::<u64>()
            .map_err(|_| de::Error::custom(format!("invalid byte size `{s}`"))),
        other => Err(de::Error::custom(format!("invalid byte size {other}"))),
    }
}

fn deserialize_nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
