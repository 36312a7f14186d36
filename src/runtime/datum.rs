//! The untyped tree generated codecs read and write.
//!
//! `Datum` mirrors the ReQL datum model: JSON values plus a first-class time
//! type. The JSON bridge encodes times with the ReQL `TIME` pseudo-type so a
//! tree survives a trip through the wire format.
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// Canonical runtime representation of the `time` storage kind.
pub type Timestamp = DateTime<Utc>;

/// Ordered key → value mapping.
pub type Object = IndexMap<String, Datum>;

const REQL_TYPE: &str = "$reql_type$";
const REQL_TIME: &str = "TIME";
const EPOCH_TIME: &str = "epoch_time";
const TIMEZONE: &str = "timezone";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Datum {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Time(Timestamp),
    Array(Vec<Datum>),
    Object(Object),
}

impl Datum {
    /// Shape name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Bool(_) => "bool",
            Datum::Number(_) => "number",
            Datum::String(_) => "string",
            Datum::Time(_) => "time",
            Datum::Array(_) => "array",
            Datum::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    // ------------------------- checked projections ------------------------- //
    // Each hands the datum back on mismatch so callers can report its shape.

    pub fn into_text(self) -> Result<String, Datum> {
        match self {
            Datum::String(s) => Ok(s),
            other => Err(other),
        }
    }

    pub fn into_number(self) -> Result<f64, Datum> {
        match self {
            Datum::Number(n) => Ok(n),
            other => Err(other),
        }
    }

    pub fn into_bool(self) -> Result<bool, Datum> {
        match self {
            Datum::Bool(b) => Ok(b),
            other => Err(other),
        }
    }

    pub fn into_time(self) -> Result<Timestamp, Datum> {
        match self {
            Datum::Time(t) => Ok(t),
            other => Err(other),
        }
    }

    pub fn into_array(self) -> Result<Vec<Datum>, Datum> {
        match self {
            Datum::Array(items) => Ok(items),
            other => Err(other),
        }
    }

    pub fn into_object(self) -> Result<Object, Datum> {
        match self {
            Datum::Object(map) => Ok(map),
            other => Err(other),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Datum> {
        match self {
            Datum::Object(map) => map.get(key),
            _ => None,
        }
    }

    // ------------------------------ JSON bridge ----------------------------- //

    /// Render as ReQL wire JSON. Non-finite numbers have no JSON form and become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Datum::Null => Value::Null,
            Datum::Bool(b) => Value::Bool(*b),
            Datum::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Datum::String(s) => Value::String(s.clone()),
            Datum::Time(t) => {
                let mut obj = Map::new();
                obj.insert(REQL_TYPE.to_owned(), Value::String(REQL_TIME.to_owned()));
                let epoch = t.timestamp_millis() as f64 / 1000.0;
                obj.insert(EPOCH_TIME.to_owned(), Number::from_f64(epoch).map_or(Value::Null, Value::Number));
                obj.insert(TIMEZONE.to_owned(), Value::String("+00:00".to_owned()));
                Value::Object(obj)
            }
            Datum::Array(items) => Value::Array(items.iter().map(Datum::to_json).collect()),
            Datum::Object(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }

    /// Read ReQL wire JSON. `TIME` pseudo-types become [`Datum::Time`]; a
    /// malformed pseudo-type is kept as a plain object.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Datum::Null,
            Value::Bool(b) => Datum::Bool(b),
            Value::Number(n) => n.as_f64().map_or(Datum::Null, Datum::Number),
            Value::String(s) => Datum::String(s),
            Value::Array(items) => Datum::Array(items.into_iter().map(Datum::from_json).collect()),
            Value::Object(obj) => match time_pseudo_type(&obj) {
                Some(t) => Datum::Time(t),
                None => Datum::Object(obj.into_iter().map(|(k, v)| (k, Datum::from_json(v))).collect()),
            },
        }
    }
}

fn time_pseudo_type(obj: &Map<String, Value>) -> Option<Timestamp> {
    if obj.get(REQL_TYPE).and_then(Value::as_str) != Some(REQL_TIME) {
        return None;
    }
    let epoch = obj.get(EPOCH_TIME).and_then(Value::as_f64)?;
    if !epoch.is_finite() {
        return None;
    }
    // ReQL times carry millisecond precision.
    DateTime::from_timestamp_millis((epoch * 1000.0).round() as i64)
}

// ————————————————————————————————————————————————————————————————————————————
// CONVERSIONS
// ————————————————————————————————————————————————————————————————————————————

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Datum::String(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::String(value.to_owned())
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Datum::Number(value)
    }
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Datum::Bool(value)
    }
}

impl From<Timestamp> for Datum {
    fn from(value: Timestamp) -> Self {
        Datum::Time(value)
    }
}

impl From<Vec<Datum>> for Datum {
    fn from(value: Vec<Datum>) -> Self {
        Datum::Array(value)
    }
}

impl From<Object> for Datum {
    fn from(value: Object) -> Self {
        Datum::Object(value)
    }
}

impl FromIterator<(String, Datum)> for Datum {
    fn from_iter<I: IntoIterator<Item = (String, Datum)>>(iter: I) -> Self {
        Datum::Object(iter.into_iter().collect())
    }
}

impl Serialize for Datum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Datum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Datum::from_json)
    }
}
