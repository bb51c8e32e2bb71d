use std::collections::HashMap;

use crate::error::{LayerError, Result};

/// A single layer parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Bool(bool),
    Float(f64),
    String(String),
}

impl ParamValue {
    /// Returns a human-readable name for the variant (used in error messages).
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "Int",
            ParamValue::Bool(_) => "Bool",
            ParamValue::Float(_) => "Float",
            ParamValue::String(_) => "String",
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

/// Named parameters a layer is constructed from.
#[derive(Debug, Clone, Default)]
pub struct LayerParams {
    pub entries: HashMap<String, ParamValue>,
}

impl LayerParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a parameter. Returns self for builder-style usage.
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Retrieve an integer value by key.
    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.entries.get(key) {
            Some(ParamValue::Int(v)) => Ok(*v),
            Some(other) => Err(LayerError::ParamType {
                key: key.to_string(),
                expected: "Int".to_string(),
                got: other.type_name().to_string(),
            }),
            None => Err(LayerError::MissingParam(key.to_string())),
        }
    }

    /// Retrieve a boolean value by key.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.entries.get(key) {
            Some(ParamValue::Bool(v)) => Ok(*v),
            Some(other) => Err(LayerError::ParamType {
                key: key.to_string(),
                expected: "Bool".to_string(),
                got: other.type_name().to_string(),
            }),
            None => Err(LayerError::MissingParam(key.to_string())),
        }
    }

    /// Retrieve an integer, falling back to `default` only when the key is absent.
    pub fn get_int_or(&self, key: &str, default: i64) -> Result<i64> {
        if self.contains(key) {
            self.get_int(key)
        } else {
            Ok(default)
        }
    }

    /// Retrieve a boolean, falling back to `default` only when the key is absent.
    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        if self.contains(key) {
            self.get_bool(key)
        } else {
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let p = LayerParams::new().with("num_output", 10i64).with("bias_term", false);
        assert_eq!(p.get_int("num_output").unwrap(), 10);
        assert!(!p.get_bool("bias_term").unwrap());
    }

    #[test]
    fn test_missing_key() {
        let p = LayerParams::new();
        assert!(matches!(p.get_int("axis"), Err(LayerError::MissingParam(k)) if k == "axis"));
        assert_eq!(p.get_int_or("axis", 1).unwrap(), 1);
        assert!(p.get_bool_or("bias_term", true).unwrap());
    }

    #[test]
    fn test_wrong_type_is_not_defaulted() {
        let p = LayerParams::new().with("axis", "one");
        match p.get_int_or("axis", 1) {
            Err(LayerError::ParamType { key, expected, got }) => {
                assert_eq!(key, "axis");
                assert_eq!(expected, "Int");
                assert_eq!(got, "String");
            }
            other => panic!("expected ParamType error, got {:?}", other),
        }
    }
}
