//! Configuration for pdfsmith
//!
//! Configuration is a plain serde struct with per-field defaults, so embedders
//! can deserialize it from any format, plus [`Config::from_env`] for the
//! environment-variable surface the binary uses.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// Top-level service configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Artifact storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// PDF generation settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Background expiry reaper settings
    #[serde(default)]
    pub reaper: ReaperConfig,

    /// REST API server settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            generation: GenerationConfig::default(),
            reaper: ReaperConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Config {
    /// Build the configuration from environment variables
    ///
    /// Recognized variables (defaults in parentheses):
    /// - `HOST` (`0.0.0.0`), `PORT` (`8080`)
    /// - `UPLOAD_FOLDER` (`generated_pdfs`)
    /// - `MAX_FILE_AGE_HOURS` (`24`)
    /// - `COMPRESSION_ENABLED` (`true`), `COMPRESSION_LEVEL` (`3`)
    /// - `SWEEP_INTERVAL_MINUTES` (`30`)
    /// - `API_KEY` (unset: no authentication)
    /// - `PUBLIC_BASE_URL` (unset: relative download URLs)
    ///
    /// Unset variables fall back to defaults; present-but-unparsable values
    /// are rejected with a `Config` error rather than silently defaulted.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Some(folder) = env_var("UPLOAD_FOLDER") {
            config.storage.upload_folder = PathBuf::from(folder);
        }
        if let Some(hours) = env_var("MAX_FILE_AGE_HOURS") {
            config.storage.max_file_age_hours = parse_env("MAX_FILE_AGE_HOURS", &hours)?;
        }

        if let Some(enabled) = env_var("COMPRESSION_ENABLED") {
            config.generation.compression_enabled = parse_env("COMPRESSION_ENABLED", &enabled)?;
        }
        if let Some(level) = env_var("COMPRESSION_LEVEL") {
            let raw: u8 = parse_env("COMPRESSION_LEVEL", &level)?;
            config.generation.compression_level = CompressionLevel::from_u8(raw);
        }

        if let Some(minutes) = env_var("SWEEP_INTERVAL_MINUTES") {
            let minutes: u64 = parse_env("SWEEP_INTERVAL_MINUTES", &minutes)?;
            config.reaper.sweep_interval = Duration::from_secs(minutes * 60);
        }

        let host = env_var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = match env_var("PORT") {
            Some(port) => parse_env("PORT", &port)?,
            None => 8080,
        };
        config.api.bind_address =
            format!("{host}:{port}")
                .parse()
                .map_err(|_| Error::Config {
                    message: format!("invalid bind address {host}:{port}"),
                    key: Some("HOST".to_string()),
                })?;

        config.api.api_key = env_var("API_KEY");
        config.api.public_base_url = env_var("PUBLIC_BASE_URL");

        Ok(config)
    }

    /// The configured artifact time-to-live
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.storage.max_file_age_hours as i64)
    }
}

/// Where and for how long artifacts are stored
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Directory holding published artifact files
    #[serde(default = "default_upload_folder")]
    pub upload_folder: PathBuf,

    /// Hours after creation at which an artifact becomes eligible for expiry
    ///
    /// Fixed per-artifact at creation; changing it never moves existing
    /// deadlines.
    #[serde(default = "default_max_file_age_hours")]
    pub max_file_age_hours: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_folder: default_upload_folder(),
            max_file_age_hours: default_max_file_age_hours(),
        }
    }
}

/// PDF generation and compression settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerationConfig {
    /// Whether to attempt compression of rendered output
    #[serde(default = "default_true")]
    pub compression_enabled: bool,

    /// How aggressively to compress (carried opaquely to the compressor)
    #[serde(default)]
    pub compression_level: CompressionLevel,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            compression_enabled: default_true(),
            compression_level: CompressionLevel::default(),
        }
    }
}

/// Compression aggressiveness on the original 0-4 scale
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Level 0: barely touch the document
    Minimal,
    /// Level 1
    Light,
    /// Level 2
    Medium,
    /// Level 3 (default)
    #[default]
    High,
    /// Level 4: smallest output, slowest
    Maximum,
}

impl CompressionLevel {
    /// Convert to the numeric scale used on the configuration surface
    pub fn to_u8(self) -> u8 {
        match self {
            CompressionLevel::Minimal => 0,
            CompressionLevel::Light => 1,
            CompressionLevel::Medium => 2,
            CompressionLevel::High => 3,
            CompressionLevel::Maximum => 4,
        }
    }

    /// Convert from the numeric scale; out-of-range values fall back to the
    /// default level rather than failing
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => CompressionLevel::Minimal,
            1 => CompressionLevel::Light,
            2 => CompressionLevel::Medium,
            3 => CompressionLevel::High,
            4 => CompressionLevel::Maximum,
            _ => CompressionLevel::High, // Default
        }
    }
}

/// Background expiry reaper settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ReaperConfig {
    /// How often the reaper sweeps the store
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub sweep_interval: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: default_sweep_interval(),
        }
    }
}

/// REST API server settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional API key; when set, requests must carry it in `X-Api-Key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Whether to add a CORS layer
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins ("*" for any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Whether to serve Swagger UI at `/swagger-ui`
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Base URL prepended to download paths in responses
    ///
    /// When unset, responses carry relative `/download/{filename}` paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: default_true(),
            cors_origins: default_cors_origins(),
            swagger_ui: default_true(),
            public_base_url: None,
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| Error::Config {
        message: format!("invalid value {value:?} for {key}"),
        key: Some(key.to_string()),
    })
}

fn default_upload_folder() -> PathBuf {
    PathBuf::from("generated_pdfs")
}

fn default_max_file_age_hours() -> u64 {
    24
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_bind_address() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap_or_else(|_| {
        SocketAddr::from(([0, 0, 0, 0], 8080))
    })
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
