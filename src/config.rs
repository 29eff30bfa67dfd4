use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bitbucket::NotificationClient;
use crate::credentials::{CredentialStore, Credentials};

const CANDIDATES: [&str; 4] = ["ubuild.toml", "ubuild.json", "ubuild.yaml", "ubuild.yml"];

/// Configuration file structure for ubuild.
///
/// Holds the transport settings used to reach Bitbucket and the credentials
/// runs may reference by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub review_server: ReviewServerConfig,

    /// Credentials by id, as referenced by the run's SCM source
    #[serde(default)]
    pub credentials: HashMap<String, Credentials>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReviewServerConfig {
    /// Whole-request timeout in seconds; unset keeps the transport default
    pub timeout_secs: Option<u64>,

    /// User agent sent with notifications
    pub user_agent: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./ubuild.toml, ./ubuild.json, ./ubuild.yaml, ./ubuild.yml
    /// 3. The same names under `<config dir>/ubuild/`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let user_dir = dirs::config_dir().map(|dir| dir.join("ubuild"));
        let candidates = CANDIDATES
            .iter()
            .map(PathBuf::from)
            .chain(
                user_dir
                    .iter()
                    .flat_map(|dir| CANDIDATES.iter().map(move |name| dir.join(name))),
            );

        for candidate in candidates {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    pub fn notification_client(&self) -> NotificationClient {
        NotificationClient::new(
            self.review_server.user_agent.clone(),
            self.review_server.timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::new(self.credentials.clone())
    }
}
