//! Metric value types and their transformations.

use std::fmt;

use crate::{Float, Int};

/// Single metric value as found in manifest profiles and result cells.
///
/// Deserialization is untagged, so structured inputs pick the narrowest
/// matching variant on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(Int),
    Float(Float),
    String(String),
}

impl Value {
    /// Parses a csv cell into a typed value. Empty cells are missing values
    /// and yield `None`.
    pub fn from_csv_cell(cell: &str) -> Option<Value> {
        if cell.is_empty() {
            return None;
        }
        if let Ok(i) = cell.parse::<Int>() {
            return Some(Value::Int(i));
        }
        if let Ok(f) = cell.parse::<Float>() {
            return Some(Value::Float(f));
        }
        match cell {
            "true" | "True" => Some(Value::Bool(true)),
            "false" | "False" => Some(Value::Bool(false)),
            _ => Some(Value::String(cell.to_string())),
        }
    }

    /// Numeric view of the value, used for mean aggregation.
    pub fn as_float(&self) -> Option<Float> {
        match self {
            Value::Int(i) => Some(*i as Float),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_float().is_some()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
        }
    }
}

#[test]
fn value_from_cell() {
    assert_eq!(Value::from_csv_cell(""), None);
    assert_eq!(Value::from_csv_cell("42"), Some(Value::Int(42)));
    assert_eq!(Value::from_csv_cell("-3"), Some(Value::Int(-3)));
    assert_eq!(Value::from_csv_cell("0.5"), Some(Value::Float(0.5)));
    assert_eq!(Value::from_csv_cell("true"), Some(Value::Bool(true)));
    assert_eq!(
        Value::from_csv_cell("option-1"),
        Some(Value::String("option-1".to_string()))
    );
}

#[test]
fn value_as_float() {
    assert_eq!(Value::Int(2).as_float(), Some(2.0));
    assert_eq!(Value::Float(0.25).as_float(), Some(0.25));
    assert_eq!(Value::String("2".to_string()).as_float(), None);
    assert_eq!(Value::Bool(true).as_float(), None);
}
