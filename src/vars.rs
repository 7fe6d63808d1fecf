//! Variable bags.
//!
//! A bag is the named, typed parameter set registered next to a script. It is
//! the only form of a task's configuration the rule engine hands back, so
//! reconciliation rebuilds catalog rows from it.
//!
//! Encoding is strict: numeric values that do not parse are rejected. Decoding
//! is total: a missing or mistyped entry decodes to the zero value of its field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VarError {
    #[error("variable {name} is not a valid {ty}: {value:?}")]
    InvalidNumber {
        name: String,
        value: String,
        ty: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    String,
    Int,
    Float,
    /// Engine-side types this service never writes (duration, regex, ...).
    #[serde(other)]
    Other,
}

impl VarType {
    fn as_str(&self) -> &'static str {
        match self {
            VarType::String => "string",
            VarType::Int => "int",
            VarType::Float => "float",
            VarType::Other => "other",
        }
    }
}

/// One bag entry. The description repeats the variable name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Var {
    #[serde(rename = "type")]
    pub ty: VarType,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableBag(BTreeMap<String, Var>);

impl VariableBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value given in its raw string form, coerced to `ty`.
    ///
    /// Empty values are skipped so absent fields never appear in the bag.
    pub fn encode(&mut self, name: &str, raw: &str, ty: VarType) -> Result<(), VarError> {
        if raw.is_empty() {
            return Ok(());
        }
        let invalid = || VarError::InvalidNumber {
            name: name.to_string(),
            value: raw.to_string(),
            ty: ty.as_str(),
        };
        let value = match ty {
            VarType::Int => Value::from(raw.trim().parse::<i64>().map_err(|_| invalid())?),
            VarType::Float => {
                let f = raw.trim().parse::<f64>().map_err(|_| invalid())?;
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(invalid)?
            }
            VarType::String | VarType::Other => Value::String(raw.to_string()),
        };
        self.insert(name, ty, value);
        Ok(())
    }

    pub fn put_str(&mut self, name: &str, value: &str) {
        if !value.is_empty() {
            self.insert(name, VarType::String, Value::String(value.to_string()));
        }
    }

    pub fn put_int(&mut self, name: &str, value: i64) {
        self.insert(name, VarType::Int, Value::from(value));
    }

    /// Non-finite values are skipped.
    pub fn put_float(&mut self, name: &str, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.insert(name, VarType::Float, Value::Number(n));
        }
    }

    fn insert(&mut self, name: &str, ty: VarType, value: Value) {
        self.0.insert(
            name.to_string(),
            Var {
                ty,
                value,
                description: name.to_string(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Var> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Var)> {
        self.0.iter()
    }

    /// String value of `name`, or `""` when absent.
    pub fn str_value(&self, name: &str) -> String {
        match self.get(name).map(|v| &v.value) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Integer value of `name`, or `0` when absent or not numeric.
    ///
    /// Engines may report integers as floats; those are truncated.
    pub fn int_value(&self, name: &str) -> i64 {
        match self.get(name).map(|v| &v.value) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        }
    }

    /// Float value of `name`, or `0.0` when absent or not numeric.
    pub fn float_value(&self, name: &str) -> f64 {
        match self.get(name).map(|v| &v.value) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
            Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
            _ => 0.0,
        }
    }
}

impl FromIterator<(String, Var)> for VariableBag {
    fn from_iter<I: IntoIterator<Item = (String, Var)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_skipped() {
        let mut bag = VariableBag::new();
        bag.encode("slack", "", VarType::String).unwrap();
        bag.put_str("post", "");
        assert!(bag.is_empty());
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let mut bag = VariableBag::new();
        bag.encode("crit", "1000", VarType::Int).unwrap();
        bag.encode("sigma", "1.5", VarType::Float).unwrap();
        assert_eq!(bag.get("crit").unwrap().value, Value::from(1000));
        assert_eq!(bag.int_value("crit"), 1000);
        assert_eq!(bag.float_value("sigma"), 1.5);
    }

    #[test]
    fn test_malformed_numbers_are_rejected() {
        let mut bag = VariableBag::new();
        let err = bag.encode("crit", "lots", VarType::Int).unwrap_err();
        assert!(err.to_string().contains("crit"));
        assert!(bag.encode("sigma", "high", VarType::Float).is_err());
        assert!(bag.is_empty());
    }

    #[test]
    fn test_decoding_is_total() {
        let bag = VariableBag::new();
        assert_eq!(bag.str_value("slack"), "");
        assert_eq!(bag.int_value("crit"), 0);
        assert_eq!(bag.float_value("sigma"), 0.0);
    }

    #[test]
    fn test_entries_serialize_in_engine_shape() {
        let mut bag = VariableBag::new();
        bag.put_str("app", "svc");
        let json = serde_json::to_value(&bag).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"app": {"type": "string", "value": "svc", "description": "app"}})
        );
    }

    #[test]
    fn test_engine_floats_decode_as_ints() {
        let bag: VariableBag = serde_json::from_value(serde_json::json!({
            "crit": {"type": "float", "value": 1000.0, "description": "crit"},
            "every": {"type": "duration", "value": "1m"}
        }))
        .unwrap();
        assert_eq!(bag.int_value("crit"), 1000);
        assert_eq!(bag.get("every").unwrap().ty, VarType::Other);
        assert_eq!(bag.str_value("every"), "1m");
    }
}
