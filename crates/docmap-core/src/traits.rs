use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

use crate::types::{
    DocumentDeclaration, FieldDeclaration, FieldValue, SynchronizationFilter, Visibility,
};

/// Reads a property value or invokes a zero-argument accessor.
pub type Accessor<E> = Arc<dyn Fn(&E) -> FieldValue + Send + Sync>;

/// A named boolean callback, used by synchronization filters.
pub type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// An application value that can be mapped onto a search document.
///
/// The class name selects the metadata registered for the instance. The
/// default is the unqualified type name; dynamic records override it.
pub trait Entity: Any {
    fn class_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(short_type_name::<Self>())
    }
}

/// `my_app::model::User<T>` -> `User`
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Document,
    Field,
    Identifier,
    SynchronizationFilter,
}

/// A declaration attached to a class, property or method.
#[derive(Debug, Clone, PartialEq)]
pub enum Metadata {
    Document(DocumentDeclaration),
    Field(FieldDeclaration),
    Identifier(FieldDeclaration),
    SynchronizationFilter(SynchronizationFilter),
}

impl Metadata {
    pub fn kind(&self) -> MetadataKind {
        match self {
            Metadata::Document(_) => MetadataKind::Document,
            Metadata::Field(_) => MetadataKind::Field,
            Metadata::Identifier(_) => MetadataKind::Identifier,
            Metadata::SynchronizationFilter(_) => MetadataKind::SynchronizationFilter,
        }
    }

    pub fn as_document(&self) -> Option<&DocumentDeclaration> {
        match self {
            Metadata::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Field and identifier declarations share a shape.
    pub fn as_field(&self) -> Option<&FieldDeclaration> {
        match self {
            Metadata::Field(f) | Metadata::Identifier(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_synchronization_filter(&self) -> Option<&SynchronizationFilter> {
        match self {
            Metadata::SynchronizationFilter(s) => Some(s),
            _ => None,
        }
    }
}

/// A property carrying metadata of the requested kind.
pub struct PropertyMetadata<'a, E> {
    pub property: &'a str,
    pub metadata: &'a Metadata,
    pub read: &'a Accessor<E>,
}

/// A method carrying metadata of the requested kind.
pub struct MethodMetadata<'a, E> {
    pub method: &'a str,
    pub declaring_class: &'a str,
    pub visibility: Visibility,
    pub metadata: &'a Metadata,
    pub invoke: &'a Accessor<E>,
}

/// Per-class metadata lookups. Members are returned in declaration order.
pub trait MetadataSource<E> {
    fn class_name(&self) -> &str;
    fn class_metadata(&self, kind: MetadataKind) -> Option<&Metadata>;
    fn property_metadata(&self, kind: MetadataKind) -> Vec<PropertyMetadata<'_, E>>;
    fn method_metadata(&self, kind: MetadataKind) -> Vec<MethodMetadata<'_, E>>;
    fn callback(&self, name: &str) -> Option<&Predicate<E>>;
}

/// Finds the metadata source for a live entity, or none when its class
/// carries no declarations at all.
pub trait MetadataProvider: Send + Sync {
    fn source_for<E: Entity>(&self, entity: &E) -> Option<&dyn MetadataSource<E>>;
}
