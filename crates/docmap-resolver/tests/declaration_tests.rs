use std::fs;
use tempfile::TempDir;

use docmap_core::error::Error;
use docmap_core::types::Visibility;
use docmap_resolver::{DeclarationFile, MetadataResolver, Record};

const USERS: &str = r#"
[[entity]]
class = "User"
synchronization_callback = "isActive"

[entity.document]
repository = "UserRepository"
boost = 2

[[entity.properties]]
name = "id"
identifier = true

[[entity.properties]]
name = "name"
field = { alias = "full_name" }

[[entity.properties]]
name = "createdAt"
field = { name = "created", type = "date" }

[[entity.methods]]
name = "getStatus"
field = {}

[[entity]]
class = "Tag"

[[entity.properties]]
name = "label"
field = { type = "string" }
"#;

fn user() -> Record {
    Record::new("User")
        .with_property("id", 42)
        .with_property("name", "Alice")
        .with_property("createdAt", "2024-01-15T00:00:00Z")
        .with_method("getStatus", "active")
        .with_method("isActive", true)
}

#[test]
fn declared_user_resolves_like_annotated_class() {
    let registry = DeclarationFile::from_toml_str(USERS).expect("parse").into_registry();
    assert_eq!(registry.len(), 2);
    let r = MetadataResolver::new(registry);
    let user = user();

    let mapping = r.get_field_mapping(&user).expect("mapping");
    let entries: Vec<(&str, &str)> = mapping.iter().collect();
    assert_eq!(
        entries,
        vec![("full_name", "name"), ("created_dt", "createdAt"), ("getStatus", "getStatus"), ("id", "id")]
    );
    assert_eq!(r.get_entity_boost(&user).unwrap(), 2.0);
    assert_eq!(r.get_repository(&user), "UserRepository");
    assert!(r.should_synchronize(&user).unwrap());

    let fields = r.get_fields(&user).unwrap();
    assert_eq!(fields[0].value, serde_json::json!("Alice"));
    assert_eq!(fields[2].value, serde_json::json!("active"));
}

#[test]
fn record_class_selects_declarations() {
    let r = MetadataResolver::new(DeclarationFile::from_toml_str(USERS).unwrap().into_registry());

    let tag = Record::new("Tag").with_property("label", "rust");
    assert!(!r.has_document_declaration(&tag));
    assert_eq!(r.get_entity_boost(&tag).unwrap(), 0.0);
    assert_eq!(r.get_fields(&tag).unwrap()[0].mapping_key(), "label_s");
    assert_eq!(r.get_identifier(&tag), Err(Error::NoIdentifierDeclared("Tag".to_string())));

    let unknown = Record::new("Comment");
    assert!(r.get_fields(&unknown).unwrap().is_empty());
    assert_eq!(r.get_repository(&unknown), "");
}

#[test]
fn missing_callback_result_skips_synchronization() {
    let r = MetadataResolver::new(DeclarationFile::from_toml_str(USERS).unwrap().into_registry());
    let inactive = Record::new("User").with_property("id", 1).with_method("isActive", false);
    let silent = Record::new("User").with_property("id", 2);

    assert!(!r.should_synchronize(&inactive).unwrap());
    assert!(!r.should_synchronize(&silent).unwrap());
}

#[test]
fn protected_method_declaration_fails_resolution() {
    let toml = r#"
[[entity]]
class = "Post"

[[entity.properties]]
name = "slug"
identifier = true

[[entity.methods]]
name = "getBody"
visibility = "protected"
declared_in = "Content"
field = {}
"#;
    let file = DeclarationFile::from_toml_str(toml).unwrap();
    assert_eq!(file.entities[0].methods[0].visibility, Visibility::Protected);
    let r = MetadataResolver::new(file.into_registry());

    let err = r.get_fields(&Record::new("Post").with_property("slug", "a")).unwrap_err();
    assert!(matches!(err, Error::NotCallable { ref class, .. } if class == "Content"), "{err}");
}

#[test]
fn string_boost_is_validated_at_read_time() {
    let toml = r#"
[[entity]]
class = "Post"
document = { boost = "lots" }
"#;
    let r = MetadataResolver::new(DeclarationFile::from_toml_str(toml).unwrap().into_registry());
    let err = r.get_entity_boost(&Record::new("Post")).unwrap_err();
    assert_eq!(err.to_string(), "Invalid boost value \"lots\" for entity Post");
}

#[test]
fn malformed_declarations_are_rejected() {
    let duplicate = "[[entity]]\nclass = \"A\"\n[[entity]]\nclass = \"A\"\n";
    assert!(matches!(DeclarationFile::from_toml_str(duplicate), Err(Error::InvalidDeclaration(_))));

    let bare_property = "[[entity]]\nclass = \"A\"\n[[entity.properties]]\nname = \"x\"\n";
    assert!(matches!(DeclarationFile::from_toml_str(bare_property), Err(Error::InvalidDeclaration(_))));

    let bad_visibility =
        "[[entity]]\nclass = \"A\"\n[[entity.methods]]\nname = \"m\"\nvisibility = \"secret\"\nfield = {}\n";
    assert!(matches!(DeclarationFile::from_toml_str(bad_visibility), Err(Error::InvalidDeclaration(_))));

    let empty_callback = "[[entity]]\nclass = \"A\"\nsynchronization_callback = \"\"\n";
    assert!(matches!(DeclarationFile::from_toml_str(empty_callback), Err(Error::InvalidDeclaration(_))));
}

#[test]
fn declarations_load_from_disk() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("entities.toml");
    fs::write(&path, USERS).unwrap();

    let file = DeclarationFile::from_path(&path).expect("load");
    assert_eq!(file.entities.len(), 2);
    assert_eq!(file.entities[0].class, "User");

    assert!(DeclarationFile::from_path(&tmp.path().join("missing.toml")).is_err());
}

#[test]
fn non_scalar_boost_fails_when_read_and_names_the_class() {
    let toml = r#"
[[entity]]
class = "B"

[entity.document]
boost = true
"#;
    let r = MetadataResolver::new(DeclarationFile::from_toml_str(toml).expect("parse").into_registry());
    let err = r.get_entity_boost(&Record::new("B")).unwrap_err();
    assert!(matches!(err, Error::InvalidBoost { ref class, .. } if class == "B"), "{err}");
    assert_eq!(err.to_string(), "Invalid boost value true for entity B");
}

#[test]
fn unknown_declaration_keys_are_rejected() {
    let typo_field = "[[entity]]\nclass = \"A\"\n[[entity.properties]]\nname = \"x\"\nfield = { aliass = \"y\" }\n";
    assert!(matches!(DeclarationFile::from_toml_str(typo_field), Err(Error::InvalidDeclaration(_))));

    let typo_document = "[[entity]]\nclass = \"A\"\n[entity.document]\nrepo = \"R\"\n";
    assert!(matches!(DeclarationFile::from_toml_str(typo_document), Err(Error::InvalidDeclaration(_))));

    let typo_entity = "[[entity]]\nclass = \"A\"\nsync_callback = \"c\"\n";
    assert!(matches!(DeclarationFile::from_toml_str(typo_entity), Err(Error::InvalidDeclaration(_))));
}

#[test]
fn single_declared_class_does_not_capture_other_records() {
    let toml = "[[entity]]\nclass = \"Tag\"\n[[entity.properties]]\nname = \"label\"\nidentifier = true\n";
    let r = MetadataResolver::new(DeclarationFile::from_toml_str(toml).unwrap().into_registry());

    let comment = Record::new("Comment").with_property("label", "x");
    assert_eq!(r.get_identifier(&comment), Err(Error::NoIdentifierDeclared("Comment".to_string())));
}
