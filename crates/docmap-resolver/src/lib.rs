//! docmap-resolver
//!
//! Entity metadata registry and the resolver turning registered declarations
//! plus live entity data into field descriptors and index field mappings.

pub mod declaration;
pub mod registry;
pub mod resolver;

pub use declaration::{DeclarationFile, Record};
pub use registry::{EntityMetadata, MetadataRegistry};
pub use resolver::MetadataResolver;
