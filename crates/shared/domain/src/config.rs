use crate::constants::DEFAULT_ALLOWED_ORIGINS;
use serde::Deserialize;
use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Immutable configuration snapshot produced once at startup.
#[derive(Default, Debug, Clone)]
pub struct AppConfigInner {
    pub framework: FrameworkConfig,
    pub server: ServerConfig,
    pub service: ServiceConfig,
}

/// Thin Arc-wrapped snapshot for inexpensive cloning into handlers and slices.
///
/// There is deliberately no `DerefMut`: the snapshot is written once by the
/// configuration propagator and only read afterwards.
#[derive(Default, Debug, Clone)]
pub struct AppConfig {
    inner: Arc<AppConfigInner>,
}

impl AppConfig {
    #[must_use]
    pub fn new(framework: FrameworkConfig, server: ServerConfig, service: ServiceConfig) -> Self {
        Self { inner: Arc::new(AppConfigInner { framework, server, service }) }
    }
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Settings copied into the web framework configuration store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkConfig {
    /// `SWAGGER_UI_DOC_EXPANSION`
    pub doc_expansion: DocExpansion,
    /// `RESTX_VALIDATE`
    pub validate: bool,
    /// `RESTX_MASK_SWAGGER`
    pub mask_swagger: bool,
    /// `SWAGGER_UI_JSONEDITOR`
    pub json_editor: bool,
    /// `ERROR_404_HELP`
    pub error_404_help: bool,
    /// `WTF_CSRF_ENABLED`
    pub csrf_enabled: bool,
}

/// Listener and warm-up settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `FLASK_HOST`
    pub host: String,
    /// `FLASK_PORT`
    pub port: u16,
    /// `FLASK_SERVER_NAME`
    pub server_name: String,
    /// `FLASK_DEBUG`
    pub debug: bool,
    /// `MULTITHREADED_INIT`
    pub multithreaded_init: bool,
}

/// How much of the operation list the documentation UI expands by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocExpansion {
    None,
    #[default]
    List,
    Full,
}

impl DocExpansion {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::List => "list",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for DocExpansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocExpansion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "list" => Ok(Self::List),
            "full" => Ok(Self::Full),
            other => Err(format!("'{other}' is not a doc expansion. Use none, list or full.")),
        }
    }
}

/// Structured sections of the settings file.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub logging: LoggingConfig,
    pub model: ModelConfig,
    pub cors: CorsConfig,
}

/// Logging setup, read once before anything else starts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub console: bool,
    pub json: bool,
    pub path: Option<PathBuf>,
    pub env_filter: Option<String>,
    pub max_files: usize,
}

/// Trained model artifact location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// Artificial delay added to warm-up, for exercising readiness in staging.
    pub warmup_delay_ms: u64,
}

/// Cross-origin policy for `/api/*`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub max_age_seconds: u64,
}

// --- Default ---

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            doc_expansion: DocExpansion::List,
            validate: true,
            mask_swagger: false,
            json_editor: true,
            error_404_help: false,
            csrf_enabled: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8888,
            server_name: "localhost:8888".to_owned(),
            debug: false,
            multithreaded_init: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            console: true,
            json: false,
            path: None,
            env_filter: None,
            max_files: 10,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("model/waste-classifier.json"), warmup_delay_ms: 0 }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|&o| o.to_owned()).collect(),
            max_age_seconds: 3600,
        }
    }
}
