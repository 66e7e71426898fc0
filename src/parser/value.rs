use serde_json::Value;
use std::fmt;

use crate::schema::ColumnType;

/// A single cell of a flattened row
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
}

impl CellValue {
    /// Take a JSON value as-is. Nested objects and arrays are kept as their
    /// JSON text.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => CellValue::Null,
            Some(Value::Bool(b)) => CellValue::Boolean(*b),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => n.as_f64().map(CellValue::Real).unwrap_or(CellValue::Null),
            },
            Some(Value::String(s)) => CellValue::Text(s.clone()),
            Some(v) => CellValue::Text(v.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Integer view of the value, if it has one without losing information
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Real(f) => integral_f64(*f),
            CellValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral_f64))
            }
            CellValue::Boolean(b) => Some(*b as i64),
            CellValue::Null => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Real(f) => Some(*f),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            CellValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Null => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Integer(0) => Some(false),
            CellValue::Integer(1) => Some(true),
            CellValue::Real(f) if *f == 0.0 => Some(false),
            CellValue::Real(f) if *f == 1.0 => Some(true),
            CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Convert to the representation declared for a column. Values that
    /// can't be represented become null.
    pub fn coerce(self, col_type: ColumnType) -> Self {
        if self.is_null() {
            return self;
        }

        let coerced = match col_type {
            ColumnType::Integer | ColumnType::Count => self.as_i64().map(CellValue::Integer),
            ColumnType::Real => self.as_f64().map(CellValue::Real),
            ColumnType::Boolean => self.as_bool().map(CellValue::Boolean),
            ColumnType::Text => match self {
                CellValue::Text(s) => Some(CellValue::Text(s)),
                other => Some(CellValue::Text(other.to_string())),
            },
        };

        coerced.unwrap_or(CellValue::Null)
    }
}

/// Renders the way the value is written to CSV. Null is the empty string.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Real(r) => write!(f, "{}", format_real(*r)),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Boolean(true) => write!(f, "True"),
            CellValue::Boolean(false) => write!(f, "False"),
        }
    }
}

/// Integral reals keep a trailing `.0` so they stay distinguishable from
/// integer columns in the output.
fn format_real(r: f64) -> String {
    if r.is_finite() && r.fract() == 0.0 && r.abs() < 1e16 {
        format!("{:.1}", r)
    } else {
        format!("{}", r)
    }
}

fn integral_f64(f: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_807.0;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < LIMIT {
        Some(f as i64)
    } else {
        None
    }
}
