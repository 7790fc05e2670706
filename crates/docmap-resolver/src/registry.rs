use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use docmap_core::traits::{
    Accessor, Entity, Metadata, MetadataKind, MetadataProvider, MetadataSource, MethodMetadata,
    Predicate, PropertyMetadata, short_type_name,
};
use docmap_core::types::{
    DocumentDeclaration, FieldDeclaration, FieldValue, SynchronizationFilter, Visibility,
};

struct PropertyEntry<E> {
    name: String,
    metadata: Vec<Metadata>,
    read: Accessor<E>,
}

struct MethodEntry<E> {
    name: String,
    declaring_class: String,
    visibility: Visibility,
    metadata: Vec<Metadata>,
    invoke: Accessor<E>,
}

fn first_of_kind(metadata: &[Metadata], kind: MetadataKind) -> Option<&Metadata> {
    metadata.iter().find(|m| m.kind() == kind)
}

/// Statically declared metadata for one entity class.
///
/// Members keep the order in which they were declared; that order is the
/// enumeration order seen by the resolver.
///
/// ```ignore
/// let user = EntityMetadata::<User>::new("User")
///     .document(DocumentDeclaration::new().repository("UserRepository"))
///     .identifier("id", |u| json!(u.id))
///     .field("name", FieldDeclaration::new().alias("full_name"), |u| json!(u.name))
///     .accessor("getStatus", FieldDeclaration::new(), |u| json!(u.status()));
/// ```
pub struct EntityMetadata<E> {
    class_name: String,
    class_metadata: Vec<Metadata>,
    properties: Vec<PropertyEntry<E>>,
    methods: Vec<MethodEntry<E>>,
    callbacks: HashMap<String, Predicate<E>>,
}

impl<E: 'static> EntityMetadata<E> {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            class_metadata: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            callbacks: HashMap::new(),
        }
    }

    pub fn document(mut self, declaration: DocumentDeclaration) -> Self {
        self.class_metadata.push(Metadata::Document(declaration));
        self
    }

    /// Declares the filter only; the callback itself is registered with
    /// [`EntityMetadata::callback`].
    pub fn synchronization_filter(mut self, callback: impl Into<String>) -> Self {
        self.class_metadata
            .push(Metadata::SynchronizationFilter(SynchronizationFilter { callback: callback.into() }));
        self
    }

    pub fn callback<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.callbacks.insert(name.into(), Arc::new(predicate));
        self
    }

    pub fn property<F>(
        mut self,
        name: impl Into<String>,
        metadata: impl IntoIterator<Item = Metadata>,
        read: F,
    ) -> Self
    where
        F: Fn(&E) -> FieldValue + Send + Sync + 'static,
    {
        self.properties.push(PropertyEntry {
            name: name.into(),
            metadata: metadata.into_iter().collect(),
            read: Arc::new(read),
        });
        self
    }

    pub fn identifier<F>(self, name: impl Into<String>, read: F) -> Self
    where
        F: Fn(&E) -> FieldValue + Send + Sync + 'static,
    {
        self.property(name, [Metadata::Identifier(FieldDeclaration::new())], read)
    }

    pub fn field<F>(self, name: impl Into<String>, declaration: FieldDeclaration, read: F) -> Self
    where
        F: Fn(&E) -> FieldValue + Send + Sync + 'static,
    {
        self.property(name, [Metadata::Field(declaration)], read)
    }

    pub fn method<F>(
        self,
        name: impl Into<String>,
        visibility: Visibility,
        metadata: impl IntoIterator<Item = Metadata>,
        invoke: F,
    ) -> Self
    where
        F: Fn(&E) -> FieldValue + Send + Sync + 'static,
    {
        let declaring_class = self.class_name.clone();
        self.inherited_method(declaring_class, name, visibility, metadata, invoke)
    }

    /// A method declared on a parent class.
    pub fn inherited_method<F>(
        mut self,
        declaring_class: impl Into<String>,
        name: impl Into<String>,
        visibility: Visibility,
        metadata: impl IntoIterator<Item = Metadata>,
        invoke: F,
    ) -> Self
    where
        F: Fn(&E) -> FieldValue + Send + Sync + 'static,
    {
        self.methods.push(MethodEntry {
            name: name.into(),
            declaring_class: declaring_class.into(),
            visibility,
            metadata: metadata.into_iter().collect(),
            invoke: Arc::new(invoke),
        });
        self
    }

    /// Public zero-argument accessor carrying a field declaration.
    pub fn accessor<F>(self, name: impl Into<String>, declaration: FieldDeclaration, invoke: F) -> Self
    where
        F: Fn(&E) -> FieldValue + Send + Sync + 'static,
    {
        self.method(name, Visibility::Public, [Metadata::Field(declaration)], invoke)
    }
}

impl<E> MetadataSource<E> for EntityMetadata<E> {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn class_metadata(&self, kind: MetadataKind) -> Option<&Metadata> {
        first_of_kind(&self.class_metadata, kind)
    }

    fn property_metadata(&self, kind: MetadataKind) -> Vec<PropertyMetadata<'_, E>> {
        self.properties
            .iter()
            .filter_map(|p| {
                first_of_kind(&p.metadata, kind).map(|metadata| PropertyMetadata {
                    property: &p.name,
                    metadata,
                    read: &p.read,
                })
            })
            .collect()
    }

    fn method_metadata(&self, kind: MetadataKind) -> Vec<MethodMetadata<'_, E>> {
        self.methods
            .iter()
            .filter_map(|m| {
                first_of_kind(&m.metadata, kind).map(|metadata| MethodMetadata {
                    method: &m.name,
                    declaring_class: &m.declaring_class,
                    visibility: m.visibility,
                    metadata,
                    invoke: &m.invoke,
                })
            })
            .collect()
    }

    fn callback(&self, name: &str) -> Option<&Predicate<E>> {
        self.callbacks.get(name)
    }
}

/// Entity metadata keyed by Rust type and class name, populated at startup.
#[derive(Default)]
pub struct MetadataRegistry {
    entries: HashMap<TypeId, HashMap<String, Box<dyn Any + Send + Sync>>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `metadata` for entities of type `E` whose class name matches
    /// the metadata's class name. A type left on its default class name also
    /// finds metadata registered under another name when it is the type's
    /// only registration. A second registration replaces the first.
    pub fn register<E: Entity>(&mut self, metadata: EntityMetadata<E>) -> &mut Self {
        let class_name = metadata.class_name.clone();
        let replaced = self
            .entries
            .entry(TypeId::of::<E>())
            .or_default()
            .insert(class_name.clone(), Box::new(metadata))
            .is_some();
        if replaced {
            tracing::debug!(class = %class_name, "replaced entity metadata");
        }
        self
    }

    pub fn with<E: Entity>(mut self, metadata: EntityMetadata<E>) -> Self {
        self.register(metadata);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataProvider for MetadataRegistry {
    fn source_for<E: Entity>(&self, entity: &E) -> Option<&dyn MetadataSource<E>> {
        let by_class = self.entries.get(&TypeId::of::<E>())?;
        let class_name = entity.class_name();
        let entry = match by_class.get(&*class_name) {
            Some(entry) => entry,
            // A static type is its own class, whatever name it was registered under.
            None if by_class.len() == 1 && class_name == short_type_name::<E>() => by_class.values().next()?,
            None => return None,
        };
        let metadata = entry.downcast_ref::<EntityMetadata<E>>()?;
        Some(metadata as &dyn MetadataSource<E>)
    }
}
