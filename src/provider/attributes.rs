//! Boundary with the orchestrator's resource-attribute bag.
//!
//! The orchestrator owns the schema; the engine only needs typed get/set over
//! a fixed set of names plus a single identity slot. Each resource kind
//! converts the bag into a typed configuration struct once, at this boundary,
//! so the controllers never see loosely typed values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// A value stored under an attribute name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    String(String),
    Map(BTreeMap<String, String>),
    Blocks(Vec<BTreeMap<String, String>>),
}

impl AttributeValue {
    fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Int(_) => "int",
            AttributeValue::String(_) => "string",
            AttributeValue::Map(_) => "map",
            AttributeValue::Blocks(_) => "block list",
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<BTreeMap<String, String>> for AttributeValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        AttributeValue::Map(value)
    }
}

impl From<Vec<BTreeMap<String, String>>> for AttributeValue {
    fn from(value: Vec<BTreeMap<String, String>>) -> Self {
        AttributeValue::Blocks(value)
    }
}

fn mismatch(name: &str, expected: &str, found: &AttributeValue) -> Error {
    Error::config(format!(
        "attribute '{}' must be a {}, found {}",
        name,
        expected,
        found.kind()
    ))
}

/// Typed read/write access to one resource's attributes.
pub trait AttributeBag: Send {
    /// Raw value under `name`, if set.
    fn get(&self, name: &str) -> Option<&AttributeValue>;

    /// Store a computed value.
    fn set(&mut self, name: &str, value: AttributeValue);

    /// Resource identity, if one has been assigned.
    fn id(&self) -> Option<&str>;

    /// Assign the resource identity.
    fn set_id(&mut self, id: &str);

    /// String attribute. Empty strings read as unset.
    fn get_str(&self, name: &str) -> Result<Option<&str>> {
        match self.get(name) {
            None => Ok(None),
            Some(AttributeValue::String(s)) if s.is_empty() => Ok(None),
            Some(AttributeValue::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(mismatch(name, "string", other)),
        }
    }

    /// String attribute that must be present and non-empty.
    fn require_str(&self, name: &str) -> Result<&str> {
        self.get_str(name)?
            .ok_or_else(|| Error::config(format!("attribute '{}' is required", name)))
    }

    fn get_bool(&self, name: &str) -> Result<Option<bool>> {
        match self.get(name) {
            None => Ok(None),
            Some(AttributeValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(mismatch(name, "bool", other)),
        }
    }

    fn get_int(&self, name: &str) -> Result<Option<i64>> {
        match self.get(name) {
            None => Ok(None),
            Some(AttributeValue::Int(i)) => Ok(Some(*i)),
            Some(other) => Err(mismatch(name, "int", other)),
        }
    }

    fn get_blocks(&self, name: &str) -> Result<&[BTreeMap<String, String>]> {
        match self.get(name) {
            None => Ok(&[]),
            Some(AttributeValue::Blocks(blocks)) => Ok(blocks.as_slice()),
            Some(other) => Err(mismatch(name, "block list", other)),
        }
    }
}

/// In-memory attribute bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub values: BTreeMap<String, AttributeValue>,
}

impl MapAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// Builder-style identity.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(AttributeValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl AttributeBag for MapAttributes {
    fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    fn set(&mut self, name: &str, value: AttributeValue) {
        self.values.insert(name.to_string(), value);
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: &str) {
        self.id = Some(id.to_string());
    }
}
