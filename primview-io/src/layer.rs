//! Un-composed scene description as produced by the readers
//!
//! A [`Layer`] mirrors the text of an asset: nested prim specs with their
//! metadata and property specs. [`crate::Stage`] flattens it into a prim tree.

use crate::time::TimeSamples;
use crate::value::Value;

/// A literal as written in a layer, before it is typed by its declaration
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number { value: f64, integral: bool },
    String(String),
    Identifier(String),
    Asset(String),
    Path(String),
    Tuple(Vec<RawValue>),
    List(Vec<RawValue>),
    Dictionary(Vec<(String, RawValue)>),
}

impl RawValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number { value, .. } => Some(*value),
            RawValue::Identifier(s) => match s.as_str() {
                "inf" => Some(f64::INFINITY),
                "-inf" => Some(f64::NEG_INFINITY),
                "nan" => Some(f64::NAN),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) | RawValue::Identifier(s) | RawValue::Asset(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Identifier(s) if s == "true" => Some(true),
            RawValue::Identifier(s) if s == "false" => Some(false),
            RawValue::Number { value, .. } => Some(*value != 0.0),
            _ => None,
        }
    }

    pub fn is_none_literal(&self) -> bool {
        matches!(self, RawValue::Identifier(s) if s == "None")
    }

    /// Short description for error messages
    pub fn describe(&self) -> String {
        match self {
            RawValue::Number { value, .. } => format!("number {}", value),
            RawValue::String(s) => format!("string {:?}", s),
            RawValue::Identifier(s) => format!("identifier `{}`", s),
            RawValue::Asset(s) => format!("asset @{}@", s),
            RawValue::Path(s) => format!("path <{}>", s),
            RawValue::Tuple(items) => format!("{}-tuple", items.len()),
            RawValue::List(items) => format!("list of {}", items.len()),
            RawValue::Dictionary(_) => "dictionary".to_string(),
        }
    }
}

/// Ordered metadata entries of a layer, prim or attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, RawValue)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, keeping first-seen order
    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `other` into `self`; entries in `other` win
    pub fn extend(&mut self, other: Metadata) {
        for (k, v) in other.entries {
            self.insert(k, v);
        }
    }
}

/// How a prim spec contributes to the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier {
    Def,
    Over,
    Class,
}

impl Specifier {
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "def" => Some(Specifier::Def),
            "over" => Some(Specifier::Over),
            "class" => Some(Specifier::Class),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Specifier::Def => "def",
            Specifier::Over => "over",
            Specifier::Class => "class",
        }
    }
}

/// An attribute as declared in a layer
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    pub name: String,
    pub type_name: String,
    pub custom: bool,
    pub uniform: bool,
    pub default: Option<Value>,
    pub time_samples: Option<TimeSamples>,
    pub connections: Vec<String>,
    pub metadata: Metadata,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            custom: false,
            uniform: false,
            default: None,
            time_samples: None,
            connections: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Fold a later declaration of the same attribute into this one
    pub fn merge(&mut self, other: AttributeSpec) {
        self.type_name = other.type_name;
        self.custom |= other.custom;
        self.uniform |= other.uniform;
        if other.default.is_some() {
            self.default = other.default;
        }
        if other.time_samples.is_some() {
            self.time_samples = other.time_samples;
        }
        self.connections.extend(other.connections);
        self.metadata.extend(other.metadata);
    }
}

/// A relationship as declared in a layer
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipSpec {
    pub name: String,
    pub custom: bool,
    pub targets: Vec<String>,
    pub metadata: Metadata,
}

/// Any property declared on a prim
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySpec {
    Attribute(AttributeSpec),
    Relationship(RelationshipSpec),
}

impl PropertySpec {
    pub fn name(&self) -> &str {
        match self {
            PropertySpec::Attribute(a) => &a.name,
            PropertySpec::Relationship(r) => &r.name,
        }
    }
}

/// Add `property`, folding it into an earlier declaration of the same name
pub(crate) fn merge_property(properties: &mut Vec<PropertySpec>, property: PropertySpec) {
    let existing = properties.iter_mut().find(|p| p.name() == property.name());
    match (existing, property) {
        (Some(PropertySpec::Attribute(a)), PropertySpec::Attribute(b)) => a.merge(b),
        (Some(slot), property) => *slot = property,
        (None, property) => properties.push(property),
    }
}

/// A prim block with its nested children
#[derive(Debug, Clone, PartialEq)]
pub struct PrimSpec {
    pub specifier: Specifier,
    pub type_name: Option<String>,
    pub name: String,
    pub metadata: Metadata,
    pub properties: Vec<PropertySpec>,
    pub children: Vec<PrimSpec>,
}

impl PrimSpec {
    pub fn new(specifier: Specifier, type_name: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            specifier,
            type_name: type_name.map(str::to_string),
            name: name.into(),
            metadata: Metadata::new(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeSpec) -> Self {
        self.properties.push(PropertySpec::Attribute(attribute));
        self
    }

    pub fn with_child(mut self, child: PrimSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// A whole parsed asset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    pub metadata: Metadata,
    pub root_prims: Vec<PrimSpec>,
}
