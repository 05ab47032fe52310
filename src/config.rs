use crate::export::DEFAULT_EXPORT_NAME;
use crate::source::DEFAULT_SOURCE_URL;
use crate::store::DEFAULT_PAGE_SIZE;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// Where the user list is fetched from
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub load_on_start: bool,
}

fn default_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_ms: default_timeout_ms(),
            load_on_start: default_true(),
        }
    }
}

/// Table display settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// CSV export destination
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_name")]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_export_name() -> String {
    DEFAULT_EXPORT_NAME.to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: default_export_name(),
            dir: None,
        }
    }
}

/// One config file layer. Every section is optional so a layer only
/// overrides what it mentions.
#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigLayer {
    #[serde(default)]
    source: Option<toml::Table>,
    #[serde(default)]
    view: Option<toml::Table>,
    #[serde(default)]
    export: Option<toml::Table>,
    #[serde(default)]
    journal_dir: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: local (.userdash/config.local.toml) > project (.userdash/config.toml)
    /// > user (~/.userdash/config.toml) > built-in defaults
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".userdash").join("config.toml");
            if user_config.exists() {
                config.merge_file(&user_config)?;
            }
        }

        let project_config = Path::new(".userdash").join("config.toml");
        if project_config.exists() {
            config.merge_file(&project_config)?;
        }

        // Local overrides, should be gitignored
        let local_config = Path::new(".userdash").join("config.local.toml");
        if local_config.exists() {
            config.merge_file(&local_config)?;
        }

        Ok(config)
    }

    /// Load configuration from a specific path on top of the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge_file(path)?;
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        self.merge_str(&content)
    }

    /// Merge a TOML document into this config; keys it sets take priority
    pub fn merge_str(&mut self, content: &str) -> Result<()> {
        let layer: ConfigLayer = toml::from_str(content)?;
        if let Some(table) = layer.source {
            self.source = overlay(&self.source, table)?;
        }
        if let Some(table) = layer.view {
            self.view = overlay(&self.view, table)?;
        }
        if let Some(table) = layer.export {
            self.export = overlay(&self.export, table)?;
        }
        if layer.journal_dir.is_some() {
            self.journal_dir = layer.journal_dir;
        }
        Ok(())
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let url = self.source.url.trim();
        if url.is_empty() {
            errors.push(ValidationError {
                field: "source.url".to_string(),
                message: "Must not be empty".to_string(),
            });
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ValidationError {
                field: "source.url".to_string(),
                message: format!("Expected an http(s) URL, got '{}'", url),
            });
        }

        if self.source.timeout_ms == 0 {
            errors.push(ValidationError {
                field: "source.timeout_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.view.page_size == 0 {
            errors.push(ValidationError {
                field: "view.page_size".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        let name = &self.export.file_name;
        if name.trim().is_empty() {
            errors.push(ValidationError {
                field: "export.file_name".to_string(),
                message: "Must not be empty".to_string(),
            });
        } else if name.contains('/') || name.contains('\\') {
            errors.push(ValidationError {
                field: "export.file_name".to_string(),
                message: format!("Must be a bare file name, got '{}'", name),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// Serialize the current section, lay the new keys over it, and read it back
fn overlay<T>(current: &T, table: toml::Table) -> Result<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let mut base = match toml::Value::try_from(current)? {
        toml::Value::Table(t) => t,
        _ => toml::Table::new(),
    };
    for (key, value) in table {
        base.insert(key, value);
    }
    Ok(toml::Value::Table(base).try_into()?)
}
