//! Declaration files.
//!
//! A TOML file describing entity classes, used to populate a
//! [`MetadataRegistry`] for [`Record`] entities:
//!
//! ```toml
//! [[entity]]
//! class = "User"
//! synchronization_callback = "isActive"
//!
//! [entity.document]
//! repository = "UserRepository"
//! boost = 1.5
//!
//! [[entity.properties]]
//! name = "id"
//! identifier = true
//!
//! [[entity.properties]]
//! name = "name"
//! field = { alias = "full_name" }
//!
//! [[entity.methods]]
//! name = "getStatus"
//! field = {}
//! ```

use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;

use docmap_core::error::{Error, Result};
use docmap_core::traits::{Entity, Metadata};
use docmap_core::types::{DocumentDeclaration, FieldDeclaration, Visibility};

use crate::registry::{EntityMetadata, MetadataRegistry};

/// A dynamically shaped entity: property values plus precomputed method results.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub class: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
    #[serde(default)]
    pub methods: serde_json::Map<String, Value>,
}

impl Record {
    pub fn new(class: impl Into<String>) -> Self {
        Self { class: class.into(), ..Self::default() }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_method(mut self, name: impl Into<String>, result: impl Into<Value>) -> Self {
        self.methods.insert(name.into(), result.into());
        self
    }
}

impl Entity for Record {
    fn class_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.class)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PropertyDeclaration {
    pub name: String,
    #[serde(default)]
    pub identifier: bool,
    #[serde(default)]
    pub field: Option<FieldDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MethodDeclaration {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    /// Parent class the method is inherited from, if any.
    #[serde(default)]
    pub declared_in: Option<String>,
    #[serde(default)]
    pub field: Option<FieldDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EntityDeclaration {
    pub class: String,
    #[serde(default)]
    pub document: Option<DocumentDeclaration>,
    #[serde(default)]
    pub synchronization_callback: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDeclaration>,
    #[serde(default)]
    pub methods: Vec<MethodDeclaration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DeclarationFile {
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityDeclaration>,
}

impl DeclarationFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::InvalidDeclaration(format!("{} does not exist", path.display())));
        }
        Self::extract(Figment::from(Toml::file(path)))
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::extract(Figment::from(Toml::string(toml)))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let file: Self = figment
            .extract()
            .map_err(|e| Error::InvalidDeclaration(e.to_string()))?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<()> {
        let mut classes = HashSet::new();
        for entity in &self.entities {
            if entity.class.trim().is_empty() {
                return Err(Error::InvalidDeclaration("entity without a class name".into()));
            }
            if !classes.insert(entity.class.as_str()) {
                return Err(Error::InvalidDeclaration(format!("class {} is declared twice", entity.class)));
            }
            if matches!(entity.synchronization_callback.as_deref(), Some(c) if c.trim().is_empty()) {
                return Err(Error::InvalidDeclaration(format!(
                    "class {} has an empty synchronization callback",
                    entity.class
                )));
            }
            for p in &entity.properties {
                if p.name.trim().is_empty() {
                    return Err(Error::InvalidDeclaration(format!("class {} has an unnamed property", entity.class)));
                }
                if !p.identifier && p.field.is_none() {
                    return Err(Error::InvalidDeclaration(format!(
                        "property {}::{} declares neither identifier nor field",
                        entity.class, p.name
                    )));
                }
            }
            for m in &entity.methods {
                if m.name.trim().is_empty() {
                    return Err(Error::InvalidDeclaration(format!("class {} has an unnamed method", entity.class)));
                }
                if m.field.is_none() {
                    return Err(Error::InvalidDeclaration(format!(
                        "method {}::{} declares no field",
                        entity.class, m.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Registers every declared class for [`Record`] entities.
    pub fn register_into(&self, registry: &mut MetadataRegistry) {
        for entity in &self.entities {
            registry.register(entity.to_metadata());
        }
        tracing::debug!(classes = self.entities.len(), "registered declared entities");
    }

    pub fn into_registry(self) -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        self.register_into(&mut registry);
        registry
    }
}

impl EntityDeclaration {
    fn to_metadata(&self) -> EntityMetadata<Record> {
        let mut metadata = EntityMetadata::new(self.class.clone());
        if let Some(document) = &self.document {
            metadata = metadata.document(document.clone());
        }
        if let Some(callback) = &self.synchronization_callback {
            let result_name = callback.clone();
            metadata = metadata.synchronization_filter(callback.clone()).callback(callback.clone(), move |r: &Record| {
                r.methods.get(&result_name).and_then(Value::as_bool).unwrap_or(false)
            });
        }
        for p in &self.properties {
            let mut declared = Vec::new();
            if p.identifier {
                declared.push(Metadata::Identifier(FieldDeclaration::new()));
            }
            if let Some(field) = &p.field {
                declared.push(Metadata::Field(field.clone()));
            }
            let name = p.name.clone();
            metadata = metadata.property(p.name.clone(), declared, move |r: &Record| {
                r.properties.get(&name).cloned().unwrap_or(Value::Null)
            });
        }
        for m in &self.methods {
            let declared = m.field.clone().map(Metadata::Field);
            let name = m.name.clone();
            let declaring_class = m.declared_in.clone().unwrap_or_else(|| self.class.clone());
            metadata = metadata.inherited_method(declaring_class, m.name.clone(), m.visibility, declared, move |r: &Record| {
                r.methods.get(&name).cloned().unwrap_or(Value::Null)
            });
        }
        metadata
    }
}
