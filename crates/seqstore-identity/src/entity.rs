use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{IdentityError, IdentityResult};

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Numeric identifier of a stored entity. Always at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct EntityId(u64);

impl EntityId {
    /// The first id handed out under an empty prefix.
    pub const FIRST: EntityId = EntityId(1);

    pub fn new(value: u64) -> IdentityResult<Self> {
        if value == 0 {
            return Err(IdentityError::InvalidId("id must be greater than 0".into()));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdentityError::InvalidId(format!("not a positive integer: {s:?}")));
        }
        let value = trimmed
            .parse::<u64>()
            .map_err(|e| IdentityError::InvalidId(format!("{s:?}: {e}")))?;
        Self::new(value)
    }
}

impl TryFrom<u64> for EntityId {
    type Error = IdentityError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A caller-supplied JSON object.
///
/// The identity field is addressed by name at runtime because its name is
/// configuration. Field order is preserved through serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(Map<String, Value>);

impl Entity {
    /// Accept a JSON value as an entity. Must be a non-empty object.
    pub fn from_value(value: Value) -> IdentityResult<Self> {
        match value {
            Value::Object(map) if !map.is_empty() => Ok(Self(map)),
            Value::Object(_) => Err(IdentityError::InvalidEntity("entity is empty".into())),
            Value::Null => Err(IdentityError::InvalidEntity("entity is missing".into())),
            other => Err(IdentityError::InvalidEntity(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }

    /// Parse a request body into an entity.
    pub fn from_json(body: &[u8]) -> IdentityResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(IdentityError::InvalidEntity("entity is missing".into()));
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| IdentityError::InvalidEntity(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set `field` to the numeric id, replacing any previous value.
    pub fn set_id(&mut self, field: &str, id: EntityId) {
        self.0.insert(field.to_string(), Value::from(id.get()));
    }

    /// Read `field` as an id. Accepts an integral JSON number (`5` or `5.0`)
    /// or a decimal string.
    pub fn id(&self, field: &str) -> Option<EntityId> {
        match self.0.get(field)? {
            Value::Number(n) => integral(n).and_then(|v| EntityId::new(v).ok()),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Human-readable rendering of `field` for error messages.
    pub fn describe_field(&self, field: &str) -> String {
        match self.0.get(field) {
            None => "missing".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn to_json_bytes(&self) -> IdentityResult<Vec<u8>> {
        serde_json::to_vec(&self.0).map_err(|e| IdentityError::Serialization(e.to_string()))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// A JSON number as `u64` when it has no fractional part.
fn integral(n: &Number) -> Option<u64> {
    if let Some(v) = n.as_u64() {
        return Some(v);
    }
    let f = n.as_f64()?;
    // 2^64 is exactly representable; anything at or above it does not fit.
    (f.fract() == 0.0 && (0.0..18_446_744_073_709_551_616.0).contains(&f)).then_some(f as u64)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
