use std::{fs, path::PathBuf};

use object_store::ObjectStoreConfig;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

pub const APP_NAME: &str = "strata";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
pub const BLOBS_DIR_NAME: &str = "blobs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Owner used when a command doesn't pass --owner
    #[serde(default = "default_owner")]
    pub default_owner: String,
    /// Default log filter; RUST_LOG overrides it
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily rolling log files (optional)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub blob_store: BlobStoreConfig,
}

fn default_owner() -> String {
    "default".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl AppConfig {
    /// The configured default log level.
    pub fn log_level_filter(&self) -> Result<LevelFilter, StateError> {
        self.log_level
            .parse::<LevelFilter>()
            .map_err(|_| StateError::InvalidLogLevel(self.log_level.clone()))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_owner: default_owner(),
            log_level: default_log_level(),
            log_dir: None,
            blob_store: BlobStoreConfig::default(),
        }
    }
}

/// Where blob bytes are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlobStoreConfig {
    /// Local filesystem (default)
    Filesystem {
        /// Path for blob storage (defaults to strata_dir/blobs/)
        path: Option<PathBuf>,
    },

    /// Process memory; content is lost on exit
    Memory,

    /// S3-compatible object storage
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        BlobStoreConfig::Filesystem { path: None }
    }
}

impl BlobStoreConfig {
    /// Backend configuration, with local storage defaulting to `blobs_path`.
    pub fn to_object_store_config(&self, blobs_path: &std::path::Path) -> ObjectStoreConfig {
        match self {
            BlobStoreConfig::Filesystem { path } => ObjectStoreConfig::Local {
                path: path.clone().unwrap_or_else(|| blobs_path.to_path_buf()),
            },
            BlobStoreConfig::Memory => ObjectStoreConfig::Memory,
            BlobStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => ObjectStoreConfig::S3 {
                endpoint: endpoint.clone(),
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
                bucket: bucket.clone(),
                region: region.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the strata directory (~/.strata)
    pub strata_dir: PathBuf,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Path to the blobs directory
    pub blobs_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the strata directory path (custom or default ~/.strata)
    pub fn strata_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new strata state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let strata_dir = Self::strata_dir(custom_path)?;

        if strata_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        let config = config.unwrap_or_default();
        config.log_level_filter()?;

        fs::create_dir_all(&strata_dir)?;

        let blobs_path = strata_dir.join(BLOBS_DIR_NAME);
        fs::create_dir_all(&blobs_path)?;

        let config_path = strata_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        // the schema is created on first open
        let db_path = strata_dir.join(DB_FILE_NAME);

        Ok(Self {
            strata_dir,
            db_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the strata directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let strata_dir = Self::strata_dir(custom_path)?;

        let config_path = strata_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::NotInitialized);
        }

        let db_path = strata_dir.join(DB_FILE_NAME);
        let blobs_path = strata_dir.join(BLOBS_DIR_NAME);

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            strata_dir,
            db_path,
            blobs_path,
            config_path,
            config,
        })
    }

    pub fn object_store_config(&self) -> ObjectStoreConfig {
        self.config.blob_store.to_object_store_config(&self.blobs_path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("strata directory not initialized. Run 'strata init' first")]
    NotInitialized,

    #[error("strata directory already initialized")]
    AlreadyInitialized,

    #[error("invalid log level '{0}' (expected off, error, warn, info, debug or trace)")]
    InvalidLogLevel(String),

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
