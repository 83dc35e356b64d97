//! Repository record types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, InvalidInputError};
use crate::types::AtUri;

/// A record payload: a JSON object carrying a string `$type`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue(Value);

impl RecordValue {
    /// Wraps `value`, checking that it is an object with a string `$type`.
    pub fn new(value: Value) -> Result<Self, Error> {
        match value.get("$type") {
            Some(Value::String(_)) if value.is_object() => Ok(Self(value)),
            _ => Err(InvalidInputError::Other {
                message: "record value must be an object with a string $type".into(),
            }
            .into()),
        }
    }

    /// The `$type` of the record.
    pub fn record_type(&self) -> &str {
        self.0
            .get("$type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl Serialize for RecordValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RecordValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RecordValue::new(value).map_err(serde::de::Error::custom)
    }
}

/// A record read from a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub uri: AtUri,
    pub cid: String,
    pub value: RecordValue,
}

/// One page of `com.atproto.repo.listRecords`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRecordsOutput {
    pub records: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// The location of a written record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutput {
    pub uri: AtUri,
    pub cid: String,
}
