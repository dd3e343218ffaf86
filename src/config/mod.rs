//! Configuration management.
//!
//! [`Settings`] holds runtime values (where the database lives, HTTP client
//! options). [`Config`] is the file users write: global overrides plus the
//! list of crawl definitions.

mod crawl;

pub use crawl::{CrawlConfig, PaginationConfig, RequestLimit, SeedConfig, SuccessCheck};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_client::{ClientOptions, USER_AGENT};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "apicrawl.db";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Crawl '{crawl}': header '{header}' references an unset variable: {message}")]
    MissingEnv {
        crawl: String,
        header: String,
        message: String,
    },

    #[error("Crawl '{crawl}': {reason}")]
    Invalid { crawl: String, reason: String },

    #[error("No crawl named '{0}' in the configuration")]
    NotFound(String),
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("apicrawl");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            user_agent: USER_AGENT.to_string(),
            request_timeout: 30,
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        match self.database_url {
            Some(ref url) => url.clone(),
            None => format!("sqlite:{}", self.database_path().display()),
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        match self.database_url {
            Some(ref url) => PathBuf::from(
                url.strip_prefix("sqlite://")
                    .or_else(|| url.strip_prefix("sqlite:"))
                    .unwrap_or(url),
            ),
            None => self.data_dir.join(&self.database_filename),
        }
    }

    /// Check if the database appears to be initialized.
    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.request_timeout),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "target")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Crawl definitions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crawls: Vec<CrawlConfig>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover a config file in the standard locations.
    pub async fn discover() -> Result<Self, ConfigError> {
        match prefer::load("apicrawl").await {
            Ok(found) => match found.source_path() {
                Some(path) => Self::load_from_path(path).await,
                None => Ok(Self::default()),
            },
            Err(e) => {
                tracing::debug!("No config file discovered: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file path.
    /// JSON, TOML and YAML are chosen by file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error(e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Check every crawl definition and reject duplicate names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for crawl in &self.crawls {
            crawl.validate()?;
            if !names.insert(crawl.name.as_str()) {
                return Err(ConfigError::Invalid {
                    crawl: crawl.name.clone(),
                    reason: "duplicate crawl name".to_string(),
                });
            }
        }
        Ok(())
    }

    /// A crawl ready to run, with header variables expanded.
    pub fn crawl(&self, name: &str) -> Result<CrawlConfig, ConfigError> {
        let mut crawl = self
            .crawls
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))?;
        crawl.expand_env()?;
        Ok(crawl)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory or database file (--target flag).
    pub target: Option<PathBuf>,
}

fn is_database_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3")
        || path.is_file()
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

/// Look for a config file next to the database.
fn find_config_next_to_db(data_dir: &Path) -> Option<PathBuf> {
    let extensions = ["json", "yaml", "yml", "toml"];
    let basenames = ["apicrawl", "config"];

    basenames
        .iter()
        .flat_map(|base| extensions.iter().map(move |ext| format!("{}.{}", base, ext)))
        .map(|name| data_dir.join(name))
        .find(|path| path.exists())
}

/// Load settings with explicit options.
///
/// Config priority: `--config`, then a config file next to the target, then
/// discovery. `--target` beats the config's data dir; `DATABASE_URL` beats both.
pub async fn load_settings(options: LoadOptions) -> Result<(Settings, Config), ConfigError> {
    let target = options.target.as_deref().map(absolute);
    let (target_dir, target_file) = match target {
        Some(ref path) if is_database_file(path) => (
            path.parent().map(Path::to_path_buf),
            path.file_name().and_then(|n| n.to_str()).map(str::to_string),
        ),
        Some(ref path) => (Some(path.clone()), None),
        None => (None, None),
    };

    let config = if let Some(ref path) = options.config_path {
        Config::load_from_path(path).await?
    } else if let Some(path) = target_dir.as_deref().and_then(find_config_next_to_db) {
        tracing::debug!("Found config next to data dir: {}", path.display());
        Config::load_from_path(&path).await?
    } else {
        Config::discover().await?
    };

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(dir) = target_dir {
        settings.data_dir = dir;
    }
    if let Some(file) = target_file {
        settings.database_filename = file;
    }

    if let Some(url) = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using DATABASE_URL from environment: {}", url);
        settings.database_url = Some(url);
    }

    Ok((settings, config))
}
