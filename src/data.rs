use std::fmt;

use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;

/// A single bus as embedded in the results page.
///
/// Every field is kept as the raw JSON value it arrived as; the renderer only
/// tests the coordinates for presence and interpolates the rest verbatim. An
/// element that is not an object has no fields at all, and a repeated key
/// keeps its last value.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(from = "Value")]
pub struct BusRecord {
    pub bus_number: Option<Value>,
    pub eta: Option<Value>,
    pub seats: Option<Value>,
    pub lat: Option<Value>,
    pub lon: Option<Value>,
}

impl From<Value> for BusRecord {
    fn from(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };
        Self {
            bus_number: fields.remove("bus_number"),
            eta: fields.remove("eta"),
            seats: fields.remove("seats"),
            lat: fields.remove("lat"),
            lon: fields.remove("lon"),
        }
    }
}

impl BusRecord {
    /// Both coordinates present and truthy. A coordinate of exactly `0` counts as absent.
    pub fn has_coordinates(&self) -> bool {
        truthy(self.lat.as_ref()) && truthy(self.lon.as_ref())
    }
}

/// Truthiness as the page's scripting environment sees it.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Formats a field the way template-literal interpolation would.
pub struct Interpolated<'a>(pub Option<&'a Value>);

impl fmt::Display for Interpolated<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => f.write_str("undefined"),
            Some(value) => write_value(f, value),
        }
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Number(n) => match n.as_f64() {
            Some(x) => write!(f, "{}", Number(x)),
            None => write!(f, "{n}"),
        },
        Value::String(s) => f.write_str(s),
        // nested null elements print as empty strings when an array is joined
        Value::Array(items) => write!(
            f,
            "{}",
            items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => Interpolated(Some(other)).to_string(),
                })
                .join(",")
        ),
        Value::Object(_) => f.write_str("[object Object]"),
    }
}

/// A float printed the way the page's scripting environment prints numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Number(pub f64);

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = self.0;
        if x.is_nan() {
            f.write_str("NaN")
        } else if x.is_infinite() {
            f.write_str(if x > 0.0 { "Infinity" } else { "-Infinity" })
        } else if x == 0.0 {
            // also covers -0
            f.write_str("0")
        } else if x.abs() >= 1e21 || x.abs() < 1e-6 {
            let exp = format!("{x:e}");
            match exp.split_once('e') {
                Some((mantissa, power)) if !power.starts_with('-') => write!(f, "{mantissa}e+{power}"),
                _ => f.write_str(&exp),
            }
        } else {
            write!(f, "{x}")
        }
    }
}
