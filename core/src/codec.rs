//! Storage encoding of [`Status`].
//!
//! A status is stored as one compact JSON document in a single column. Keys
//! are the PascalCase field names, enums are integers and durations are
//! integer nanoseconds.

use std::str::FromStr;

use crate::status::Status;

/// A scalar as read back from a storage column.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Null,
    Text(String),
    Bytes(Vec<u8>),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl StoredValue {
    const fn type_name(&self) -> &'static str {
        use StoredValue::*;
        match self {
            Null => "null",
            Text(_) => "text",
            Bytes(_) => "bytes",
            Integer(_) => "integer",
            Float(_) => "float",
            Bool(_) => "bool",
        }
    }

    /// Text and raw bytes are both just a byte sequence to the decoder.
    fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            StoredValue::Text(s) => Some(s.as_bytes()),
            StoredValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<String> for StoredValue {
    fn from(s: String) -> Self {
        StoredValue::Text(s)
    }
}

impl From<Vec<u8>> for StoredValue {
    fn from(b: Vec<u8>) -> Self {
        StoredValue::Bytes(b)
    }
}

impl<T: Into<StoredValue>> From<Option<T>> for StoredValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(StoredValue::Null, Into::into)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Cannot encode status: {0}")]
pub struct EncodeError(#[source] serde_json::Error);

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Cannot decode status from null")]
    Null,

    #[error("Cannot decode status from a {0} value (expected text or bytes)")]
    UnsupportedType(&'static str),

    #[error("Malformed status document: {0}")]
    Malformed(#[source] serde_json::Error),
}

impl Status {
    pub fn encode(&self) -> Result<String, EncodeError> {
        serde_json::to_string(self).map_err(EncodeError)
    }

    pub fn to_stored_value(&self) -> Result<StoredValue, EncodeError> {
        self.encode().map(StoredValue::Text)
    }

    /// Overwrites `self` with the status stored in `value`.
    /// On error `self` is left untouched.
    pub fn scan(&mut self, value: &StoredValue) -> Result<(), DecodeError> {
        *self = Self::decode(value)?;
        Ok(())
    }

    pub fn decode(value: &StoredValue) -> Result<Self, DecodeError> {
        if let StoredValue::Null = value {
            return Err(DecodeError::Null);
        }
        let bytes = value
            .as_bytes()
            .ok_or_else(|| DecodeError::UnsupportedType(value.type_name()))?;
        Self::try_from(bytes)
    }
}

impl TryFrom<&[u8]> for Status {
    type Error = DecodeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        serde_json::from_slice(bytes).map_err(DecodeError::Malformed)
    }
}

impl FromStr for Status {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.as_bytes())
    }
}

pub(crate) mod duration_nanos {
    use std::time::Duration;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let nanos = u64::try_from(d.as_nanos()).map_err(serde::ser::Error::custom)?;
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = i64::deserialize(deserializer)?;
        let nanos = u64::try_from(nanos).map_err(|_| {
            de::Error::invalid_value(de::Unexpected::Signed(nanos), &"a non-negative duration")
        })?;
        Ok(Duration::from_nanos(nanos))
    }
}
