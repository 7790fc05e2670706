//! Domain types shared by the metadata source and the resolver.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime data read from an entity member.
pub type FieldValue = serde_json::Value;

/// Key reserved in every field mapping for the identifier.
pub const IDENTIFIER_KEY: &str = "id";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        };
        f.write_str(s)
    }
}

/// Index-side field type. Each type maps onto a dynamic field suffix so that
/// an unaliased field lands in a correctly typed index column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Text,
    Date,
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    Strings,
    Texts,
    Dates,
    Booleans,
    Integers,
    Longs,
    Floats,
    Doubles,
}

impl FieldType {
    pub fn suffix(self) -> &'static str {
        match self {
            FieldType::String => "_s",
            FieldType::Text => "_t",
            FieldType::Date => "_dt",
            FieldType::Boolean => "_b",
            FieldType::Integer => "_i",
            FieldType::Long => "_l",
            FieldType::Float => "_f",
            FieldType::Double => "_d",
            FieldType::Strings => "_ss",
            FieldType::Texts => "_txt",
            FieldType::Dates => "_dts",
            FieldType::Booleans => "_bs",
            FieldType::Integers => "_is",
            FieldType::Longs => "_ls",
            FieldType::Floats => "_fs",
            FieldType::Doubles => "_ds",
        }
    }
}

/// Member-level declaration shared by fields and identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldDeclaration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub boost: Option<f64>,
}

impl FieldDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }
}

/// Boost exactly as it was declared. Validation is deferred to read time so
/// that a bad value is reported against the entity that carries it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawBoost {
    Number(f64),
    Text(String),
    Other(FieldValue),
}

impl Default for RawBoost {
    fn default() -> Self {
        RawBoost::Number(0.0)
    }
}

impl RawBoost {
    pub fn validate(&self) -> std::result::Result<f64, String> {
        let value = match self {
            RawBoost::Number(n) => *n,
            RawBoost::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid boost value \"{}\"", s))?,
            RawBoost::Other(v) => return Err(format!("Invalid boost value {}", v)),
        };
        if !value.is_finite() || value < 0.0 {
            return Err(format!("Invalid boost value {}", value));
        }
        Ok(value)
    }
}

impl From<f64> for RawBoost {
    fn from(n: f64) -> Self {
        RawBoost::Number(n)
    }
}

impl From<&str> for RawBoost {
    fn from(s: &str) -> Self {
        RawBoost::Text(s.to_string())
    }
}

/// Class-level marker declaring a type indexable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DocumentDeclaration {
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub boost: RawBoost,
}

impl DocumentDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    pub fn boost(mut self, boost: impl Into<RawBoost>) -> Self {
        self.boost = boost.into();
        self
    }
}

/// Class-level callback gating whether an instance is sent to the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SynchronizationFilter {
    pub callback: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Property,
    Method,
}

/// The entity member a descriptor was read from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceMember {
    pub kind: MemberKind,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorKind {
    Field,
    Identifier,
}

/// One indexable unit of an entity, populated with the member's current value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDescriptor {
    pub kind: DescriptorKind,
    pub name: String,
    pub alias: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    pub boost: Option<f64>,
    pub value: FieldValue,
    pub source: SourceMember,
}

impl FieldDescriptor {
    pub fn from_declaration(
        kind: DescriptorKind,
        declaration: &FieldDeclaration,
        source: SourceMember,
        value: FieldValue,
    ) -> Self {
        let name = declaration
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| source.name.clone());
        Self {
            kind,
            name,
            alias: declaration.alias.clone(),
            field_type: declaration.field_type,
            boost: declaration.boost,
            value,
            source,
        }
    }

    /// Index-side key: the alias when one is declared, otherwise the name
    /// followed by the type suffix.
    pub fn mapping_key(&self) -> String {
        match self.alias.as_deref() {
            Some(alias) if !alias.is_empty() => alias.to_string(),
            _ => match self.field_type {
                Some(t) => format!("{}{}", self.name, t.suffix()),
                None => self.name.clone(),
            },
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source.name
    }

    pub fn is_field(&self) -> bool {
        self.kind == DescriptorKind::Field
    }
}

/// Ordered index-key to source-member association.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldMapping(IndexMap<String, String>);

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later writes to an existing key replace its value in place.
    pub fn insert(&mut self, key: impl Into<String>, source: impl Into<String>) {
        self.0.insert(key.into(), source.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn identifier(&self) -> Option<&str> {
        self.get(IDENTIFIER_KEY)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything the resolver knows about one entity, gathered in a single call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub class_name: String,
    pub has_document: bool,
    pub repository: String,
    pub boost: f64,
    pub synchronization_callback: String,
    pub identifier: FieldDescriptor,
    pub fields: Vec<FieldDescriptor>,
    pub mapping: FieldMapping,
}
