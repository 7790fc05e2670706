//! Resolution of entity metadata into field descriptors and index mappings.

use tracing::{debug, warn};

use docmap_core::config::{IdentifierPolicy, Settings};
use docmap_core::error::{Error, Result};
use docmap_core::traits::{Entity, Metadata, MetadataKind, MetadataProvider, MetadataSource};
use docmap_core::types::{
    DescriptorKind, DocumentMetadata, FieldDescriptor, FieldMapping, MemberKind, SourceMember,
    IDENTIFIER_KEY,
};

use crate::registry::MetadataRegistry;

/// Reads entity metadata through a [`MetadataProvider`].
///
/// Every operation is a pure function of the entity and the provider; the
/// resolver keeps no state between calls.
pub struct MetadataResolver<P = MetadataRegistry> {
    provider: P,
    identifier_policy: IdentifierPolicy,
}

impl<P: MetadataProvider> MetadataResolver<P> {
    pub fn new(provider: P) -> Self {
        Self { provider, identifier_policy: IdentifierPolicy::default() }
    }

    pub fn with_settings(provider: P, settings: &Settings) -> Self {
        Self::new(provider).with_identifier_policy(settings.identifier_policy)
    }

    pub fn with_identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier_policy = policy;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn source<E: Entity>(&self, entity: &E) -> Option<&dyn MetadataSource<E>> {
        self.provider.source_for(entity)
    }

    fn class_name<E: Entity>(&self, entity: &E) -> String {
        match self.source(entity) {
            Some(source) => source.class_name().to_string(),
            None => entity.class_name().into_owned(),
        }
    }

    fn class_metadata<E: Entity>(&self, entity: &E, kind: MetadataKind) -> Option<&Metadata> {
        self.source(entity)?.class_metadata(kind)
    }

    fn properties_by_kind<E: Entity>(&self, entity: &E, kind: MetadataKind) -> Vec<FieldDescriptor> {
        let Some(source) = self.source(entity) else {
            return Vec::new();
        };
        let descriptor_kind = descriptor_kind(kind);
        source
            .property_metadata(kind)
            .into_iter()
            .filter_map(|p| {
                let declaration = p.metadata.as_field()?;
                let member = SourceMember { kind: MemberKind::Property, name: p.property.to_string() };
                Some(FieldDescriptor::from_declaration(descriptor_kind, declaration, member, (p.read)(entity)))
            })
            .collect()
    }

    fn methods_by_kind<E: Entity>(&self, entity: &E, kind: MetadataKind) -> Result<Vec<FieldDescriptor>> {
        let Some(source) = self.source(entity) else {
            return Ok(Vec::new());
        };
        let descriptor_kind = descriptor_kind(kind);
        let mut fields = Vec::new();
        for m in source.method_metadata(kind) {
            let Some(declaration) = m.metadata.as_field() else {
                continue;
            };
            if !m.visibility.is_public() {
                return Err(Error::NotCallable {
                    method: m.method.to_string(),
                    class: m.declaring_class.to_string(),
                    visibility: m.visibility,
                });
            }
            let member = SourceMember { kind: MemberKind::Method, name: m.method.to_string() };
            fields.push(FieldDescriptor::from_declaration(descriptor_kind, declaration, member, (m.invoke)(entity)));
        }
        Ok(fields)
    }

    /// Property-sourced fields followed by method-sourced fields.
    pub fn get_fields<E: Entity>(&self, entity: &E) -> Result<Vec<FieldDescriptor>> {
        let mut fields = self.properties_by_kind(entity, MetadataKind::Field);
        fields.extend(self.methods_by_kind(entity, MetadataKind::Field)?);
        Ok(fields)
    }

    /// Class-level boost, 0 when the class is not a document.
    pub fn get_entity_boost<E: Entity>(&self, entity: &E) -> Result<f64> {
        let Some(document) = self
            .class_metadata(entity, MetadataKind::Document)
            .and_then(Metadata::as_document)
        else {
            return Ok(0.0);
        };
        document.boost.validate().map_err(|message| Error::InvalidBoost {
            message,
            class: self.class_name(entity),
        })
    }

    pub fn get_identifier<E: Entity>(&self, entity: &E) -> Result<FieldDescriptor> {
        let mut identifiers = self.properties_by_kind(entity, MetadataKind::Identifier).into_iter();
        let first = identifiers
            .next()
            .ok_or_else(|| Error::NoIdentifierDeclared(self.class_name(entity)))?;

        if let Some(second) = identifiers.next() {
            let class = self.class_name(entity);
            match self.identifier_policy {
                IdentifierPolicy::Strict => {
                    return Err(Error::DuplicateIdentifier {
                        class,
                        first: first.source.name,
                        second: second.source.name,
                    });
                }
                IdentifierPolicy::FirstWins => {
                    warn!(%class, used = %first.source.name, ignored = %second.source.name, "entity declares more than one identifier");
                }
            }
        }
        Ok(first)
    }

    pub fn get_repository<E: Entity>(&self, entity: &E) -> String {
        self.class_metadata(entity, MetadataKind::Document)
            .and_then(Metadata::as_document)
            .map(|d| d.repository.clone())
            .unwrap_or_default()
    }

    /// Index key to source member for every field, plus the reserved `id`
    /// entry which always points at the identifier.
    pub fn get_field_mapping<E: Entity>(&self, entity: &E) -> Result<FieldMapping> {
        let fields = self.get_fields(entity)?;
        let identifier = self.get_identifier(entity)?;
        Ok(self.build_mapping(entity, &fields, &identifier))
    }

    fn build_mapping<E: Entity>(&self, entity: &E, fields: &[FieldDescriptor], identifier: &FieldDescriptor) -> FieldMapping {
        let mut mapping = FieldMapping::new();
        for field in fields.iter().filter(|f| f.is_field()) {
            mapping.insert(field.mapping_key(), field.source_name());
        }
        mapping.insert(IDENTIFIER_KEY, identifier.source_name());

        debug!(class = %self.class_name(entity), fields = fields.len(), keys = mapping.len(), "resolved field mapping");
        mapping
    }

    pub fn has_document_declaration<E: Entity>(&self, entity: &E) -> bool {
        self.class_metadata(entity, MetadataKind::Document).is_some()
    }

    /// Name of the callback gating synchronization, empty when unfiltered.
    pub fn get_synchronization_callback<E: Entity>(&self, entity: &E) -> String {
        self.class_metadata(entity, MetadataKind::SynchronizationFilter)
            .and_then(Metadata::as_synchronization_filter)
            .map(|f| f.callback.clone())
            .unwrap_or_default()
    }

    /// Runs the synchronization filter's callback against `entity`.
    pub fn should_synchronize<E: Entity>(&self, entity: &E) -> Result<bool> {
        let callback = self.get_synchronization_callback(entity);
        if callback.is_empty() {
            return Ok(true);
        }
        let predicate = self
            .source(entity)
            .and_then(|source| source.callback(&callback))
            .ok_or_else(|| Error::UnknownCallback { class: self.class_name(entity), callback: callback.clone() })?;
        Ok(predicate(entity))
    }

    pub fn describe<E: Entity>(&self, entity: &E) -> Result<DocumentMetadata> {
        let fields = self.get_fields(entity)?;
        let identifier = self.get_identifier(entity)?;
        let mapping = self.build_mapping(entity, &fields, &identifier);
        Ok(DocumentMetadata {
            class_name: self.class_name(entity),
            has_document: self.has_document_declaration(entity),
            repository: self.get_repository(entity),
            boost: self.get_entity_boost(entity)?,
            synchronization_callback: self.get_synchronization_callback(entity),
            identifier,
            mapping,
            fields,
        })
    }
}

fn descriptor_kind(kind: MetadataKind) -> DescriptorKind {
    match kind {
        MetadataKind::Identifier => DescriptorKind::Identifier,
        _ => DescriptorKind::Field,
    }
}
