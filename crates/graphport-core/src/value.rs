//! Attribute values read from the source and property values written to the graph.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::SourceInstance;

/// A dynamically-typed attribute value as stored in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Instance(SourceInstance),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&SourceInstance> {
        match self {
            Self::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn into_instance(self) -> Option<SourceInstance> {
        match self {
            Self::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// Convert a primitive value to a graph property. References have no
    /// primitive form and yield `None`.
    pub fn into_property(self) -> Option<PropertyValue> {
        match self {
            Self::Text(s) => Some(PropertyValue::Text(s)),
            Self::Integer(i) => Some(PropertyValue::Integer(i)),
            Self::Float(f) => Some(PropertyValue::Float(f)),
            Self::Boolean(b) => Some(PropertyValue::Boolean(b)),
            Self::Instance(_) => None,
        }
    }

    /// Text form used for list properties, which are always string arrays.
    pub fn into_list_item(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Boolean(b) => Some(b.to_string()),
            Self::Instance(_) => None,
        }
    }
}

/// A property value on a graph node or edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    TextList(Vec<String>),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// Property map of a node or edge. Ordered so dumps are deterministic.
pub type PropertyMap = BTreeMap<String, PropertyValue>;
