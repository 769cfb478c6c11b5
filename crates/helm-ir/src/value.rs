use std::fmt;

use serde::{Deserialize, Serialize};

/// A primitive session variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for Primitive {
    fn from(v: bool) -> Self {
        Primitive::Bool(v)
    }
}

impl From<f64> for Primitive {
    fn from(v: f64) -> Self {
        Primitive::Number(v)
    }
}

impl From<i64> for Primitive {
    fn from(v: i64) -> Self {
        Primitive::Number(v as f64)
    }
}

impl From<&str> for Primitive {
    fn from(v: &str) -> Self {
        Primitive::Text(v.to_string())
    }
}

impl From<String> for Primitive {
    fn from(v: String) -> Self {
        Primitive::Text(v)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Bool(b) => write!(f, "{b}"),
            Primitive::Number(n) => write!(f, "{n}"),
            Primitive::Text(s) => write!(f, "{s}"),
        }
    }
}
