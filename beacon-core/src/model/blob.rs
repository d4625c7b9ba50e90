use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Offer or answer payload. Opaque to the signalling layer: only the peer
/// connection capability on either end knows its structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalBlob(pub Value);

impl SignalBlob {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Encode a typed description (e.g. an SDP session description) as a blob.
    pub fn from_typed<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self)
    }

    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    /// `null`, `""`, `{}` and `[]` carry nothing a peer could negotiate with.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for SignalBlob {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
