//! Configuration loader.
//!
//! Uses Figment to merge built-in defaults + `docmap.toml` + `docmap.<env>.toml`
//! + `DOCMAP_*` env vars into [`Settings`].

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::Error;

/// How the resolver treats an entity declaring more than one identifier.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierPolicy {
    /// Use the first identifier in declaration order.
    #[default]
    FirstWins,
    /// Reject a second identifier.
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub identifier_policy: IdentifierPolicy,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self { identifier_policy: IdentifierPolicy::default(), log_level: default_log_level() }
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("docmap.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("docmap.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("docmap.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("docmap.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("DOCMAP_"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// Defaults overlaid with a single TOML file and `DOCMAP_*` variables.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Err(Error::InvalidConfig(format!("{} does not exist", path.display())).into());
        }
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("DOCMAP_"));
        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()).into())
    }
}
