//! Configuration management for SheetChat.
//!
//! Loads configuration from ${SHEETCHAT_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::files::AcceptedTypes;

/// Environment variable that overrides `[backend] base_url`.
pub const BASE_URL_ENV: &str = "SHEETCHAT_BASE_URL";

/// Returns the default config template.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for SheetChat configuration.
    //!
    //! SHEETCHAT_HOME resolution order:
    //! 1. SHEETCHAT_HOME environment variable (if set)
    //! 2. ~/.config/sheetchat (default)

    use std::path::PathBuf;

    /// Returns the SheetChat home directory.
    pub fn sheetchat_home() -> PathBuf {
        if let Ok(home) = std::env::var("SHEETCHAT_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".sheetchat"),
            |h| h.join(".config").join("sheetchat"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        sheetchat_home().join("config.toml")
    }
}

/// Remote backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the chat backend (upload, query and health endpoints hang off it).
    pub base_url: String,
    /// Deadline for each request in seconds (0 disables)
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: Config::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 0,
        }
    }
}

/// Upload validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Accept delimited text (.csv) alongside Excel workbooks.
    pub accept_csv: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { accept_csv: true }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub upload: UploadConfig,
}

impl Config {
    pub const DEFAULT_BASE_URL: &str = "https://excel-talk-ai.onrender.com";

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the backend base URL with precedence: env > config > default.
    pub fn effective_base_url(&self) -> Result<String> {
        resolve_base_url(std::env::var(BASE_URL_ENV).ok().as_deref(), &self.backend.base_url)
    }

    /// Returns the per-request deadline, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.backend.request_timeout_secs > 0)
            .then(|| Duration::from_secs(self.backend.request_timeout_secs))
    }

    /// Returns the MIME allow-list selected by `[upload] accept_csv`.
    pub fn accepted_types(&self) -> AcceptedTypes {
        if self.upload.accept_csv {
            AcceptedTypes::SpreadsheetOrCsv
        } else {
            AcceptedTypes::Spreadsheet
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// Uses the embedded template for structure/comments and merges
    /// generated values from `Config::default()` into it.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let generated_toml = toml::to_string(&Config::default())
            .context("Failed to serialize default config to TOML")?;

        // Parse template as base (preserves comments)
        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;

        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to move {} into place at {}",
                tmp_path.display(),
                path.display()
            )
        })?;
        Ok(())
    }
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

fn resolve_base_url(env_value: Option<&str>, config_value: &str) -> Result<String> {
    let chosen = env_value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| Some(config_value.trim()).filter(|s| !s.is_empty()))
        .unwrap_or(Config::DEFAULT_BASE_URL);

    url::Url::parse(chosen).with_context(|| format!("Invalid backend base URL: {chosen}"))?;
    Ok(chosen.trim_end_matches('/').to_string())
}
