use clap::Parser;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

use docmap_cli::{load_settings, read_record, run, Cli, Commands};
use docmap_core::config::{IdentifierPolicy, Settings};

const DECLARATIONS: &str = r#"
[[entity]]
class = "User"

[entity.document]
repository = "UserRepository"

[[entity.properties]]
name = "id"
identifier = true

[[entity.properties]]
name = "name"
field = { alias = "full_name" }

[[entity.methods]]
name = "getStatus"
field = {}
"#;

const USER: &str = r#"{
  "class": "User",
  "properties": { "id": 1, "name": "Alice" },
  "methods": { "getStatus": "active" }
}"#;

fn fixtures() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let tmp = TempDir::new().unwrap();
    let decl = tmp.path().join("entities.toml");
    let entity = tmp.path().join("user.json");
    fs::write(&decl, DECLARATIONS).unwrap();
    fs::write(&entity, USER).unwrap();
    (tmp, decl, entity)
}

#[test]
fn parses_subcommand_and_paths() {
    let cli = Cli::try_parse_from(["docmap", "-d", "entities.toml", "-e", "user.json", "mapping"]).unwrap();
    assert_eq!(cli.command, Commands::Mapping);
    assert_eq!(cli.declarations.to_str(), Some("entities.toml"));
    assert!(cli.config.is_none());
}

#[test]
fn mapping_command_prints_ordered_mapping() {
    let (_tmp, decl, entity) = fixtures();
    let record = read_record(&entity).expect("record");

    let out = run(Commands::Mapping, &decl, &record, &Settings::default()).expect("run");
    assert_eq!(out, json!({"full_name": "name", "getStatus": "getStatus", "id": "id"}));
    let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 3);
}

#[test]
fn scalar_commands() {
    let (_tmp, decl, entity) = fixtures();
    let record = read_record(&entity).unwrap();
    let settings = Settings::default();

    assert_eq!(run(Commands::Boost, &decl, &record, &settings).unwrap(), json!(0.0));
    assert_eq!(run(Commands::Repository, &decl, &record, &settings).unwrap(), json!("UserRepository"));
    assert_eq!(run(Commands::Document, &decl, &record, &settings).unwrap(), json!(true));
    assert_eq!(
        run(Commands::Sync, &decl, &record, &settings).unwrap(),
        json!({"callback": "", "synchronize": true})
    );
}

#[test]
fn describe_includes_identifier_value() {
    let (_tmp, decl, entity) = fixtures();
    let record = read_record(&entity).unwrap();

    let out = run(Commands::Describe, &decl, &record, &Settings::default()).unwrap();
    assert_eq!(out["class_name"], json!("User"));
    assert_eq!(out["identifier"]["value"], json!(1));
    assert_eq!(out["fields"].as_array().map(Vec::len), Some(2));
}

#[test]
fn unknown_class_reports_missing_identifier() {
    let (tmp, decl, _) = fixtures();
    let other = tmp.path().join("tag.json");
    fs::write(&other, r#"{"class": "Tag"}"#).unwrap();
    let record = read_record(&other).unwrap();

    let err = run(Commands::Identifier, &decl, &record, &Settings::default()).unwrap_err();
    assert!(err.to_string().contains("Tag"), "{err}");
}

#[test]
fn settings_come_from_explicit_config() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("docmap.toml");
    fs::write(&path, "identifier_policy = \"strict\"\n").unwrap();

    let settings = load_settings(Some(&path)).unwrap();
    assert_eq!(settings.identifier_policy, IdentifierPolicy::Strict);
}
