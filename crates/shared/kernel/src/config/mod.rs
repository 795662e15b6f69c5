mod propagate;

pub use propagate::{Configuration, propagate};

use crate::format_context;
use crate::security::SecurityError;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use dwaste_domain::config::{FrameworkConfig, ServerConfig, ServiceConfig};
use dwaste_domain::settings::{SettingKey, SettingKind, SettingValue};
use fxhash::FxHashMap;
use std::borrow::Cow;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings file looked up in the working directory when no path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";
/// Prefix for structured-section environment overrides (`DWASTE__MODEL__PATH`).
pub const ENV_PREFIX: &str = "DWASTE";

/// Errors raised while resolving settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Missing setting{}: {key}", format_context(.context))]
    Missing { key: SettingKey, context: Option<Cow<'static, str>> },

    #[error("Invalid setting {key}{}: {message}", format_context(.context))]
    Invalid { key: SettingKey, message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Security error{}: {source}", format_context(.context))]
    Security { source: SecurityError, context: Option<Cow<'static, str>> },
}

impl From<config::ConfigError> for ConfigError {
    fn from(source: config::ConfigError) -> Self {
        Self::Config { source, context: None }
    }
}

impl From<SecurityError> for ConfigError {
    fn from(source: SecurityError) -> Self {
        Self::Security { source, context: None }
    }
}

pub trait ConfigErrorExt<T> {
    /// Attaches a human-readable context to the error.
    ///
    /// # Errors
    /// Returns the original error, annotated.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError>;
}

impl<T> ConfigErrorExt<T> for Result<T, ConfigError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                ConfigError::Config { context: c, .. }
                | ConfigError::Missing { context: c, .. }
                | ConfigError::Invalid { context: c, .. }
                | ConfigError::Security { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl<T> ConfigErrorExt<T> for Result<T, config::ConfigError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError> {
        self.map_err(|source| ConfigError::Config { source, context: Some(context.into()) })
    }
}

/// Resolves a named setting to a typed value.
///
/// Implementations must fail for keys they cannot resolve rather than guess:
/// a service must not start on half a configuration.
pub trait SettingsResolver: Debug + Send + Sync {
    /// Returns the value for `key`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] for unknown keys and [`ConfigError::Invalid`]
    /// or [`ConfigError::Config`] for values of the wrong type.
    fn resolve(&self, key: SettingKey) -> Result<SettingValue, ConfigError>;
}

/// Layered settings: built-in defaults, then the settings file, then the process environment.
///
/// Contract keys are overridden by environment variables of the same name (`FLASK_PORT=8080`).
/// Structured sections (`logging`, `model`, `cors`) are overridden with `DWASTE__` variables,
/// nested with double underscores (`DWASTE__MODEL__PATH` maps to `model.path`).
#[derive(Debug, Clone)]
pub struct LayeredSettings {
    inner: Config,
    file: Option<PathBuf>,
}

impl LayeredSettings {
    /// Loads settings using the real process environment.
    ///
    /// With `None`, `settings.toml` in the working directory is used if present.
    /// An explicit path must exist.
    ///
    /// # Errors
    /// Returns an error if the file is missing (explicit path only), unparsable,
    /// or an override cannot be applied.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Loads settings with an injected environment lookup for contract-key overrides.
    ///
    /// # Errors
    /// See [`LayeredSettings::load`].
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (file, required) = path.map_or_else(
            || (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
            |p| (p.to_path_buf(), true),
        );

        let mut builder = with_defaults(Config::builder())
            .context("Failed to register default settings")?
            .add_source(File::from(file.as_path()).required(required))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true));

        for key in SettingKey::all() {
            if let Some(value) = lookup(key.as_str()) {
                builder = builder
                    .set_override(key.file_key(), value)
                    .context(format!("Failed to apply environment override {key}"))?;
            }
        }

        let inner = builder.build().context("Failed to build settings")?;
        let file = (required || file.is_file()).then_some(file);
        debug!(file = ?file, "Settings layers built");

        Ok(Self { inner, file })
    }

    /// The settings file that was read, if any.
    ///
    /// Loading usually happens before logging is configured, so callers report this afterwards.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Deserializes the structured sections of the settings.
    ///
    /// # Errors
    /// Returns an error if a section does not match its expected shape.
    pub fn service_config(&self) -> Result<ServiceConfig, ConfigError> {
        self.inner
            .clone()
            .try_deserialize::<ServiceConfig>()
            .context("Failed to deserialize service sections")
    }
}

impl SettingsResolver for LayeredSettings {
    fn resolve(&self, key: SettingKey) -> Result<SettingValue, ConfigError> {
        let path = key.file_key();
        let value = match key.kind() {
            SettingKind::Bool => self.inner.get_bool(path).map(SettingValue::Bool),
            SettingKind::Int => self.inner.get_int(path).map(SettingValue::Int),
            SettingKind::Str => self.inner.get_string(path).map(SettingValue::Str),
        };

        value.map_err(|source| match source {
            config::ConfigError::NotFound(_) => ConfigError::Missing { key, context: None },
            source => ConfigError::Config { source, context: Some(key.as_str().into()) },
        })
    }
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    let framework = FrameworkConfig::default();
    let server = ServerConfig::default();

    builder
        .set_default(SettingKey::SwaggerUiDocExpansion.file_key(), framework.doc_expansion.as_str())?
        .set_default(SettingKey::RestxValidate.file_key(), framework.validate)?
        .set_default(SettingKey::RestxMaskSwagger.file_key(), framework.mask_swagger)?
        .set_default(SettingKey::SwaggerUiJsonEditor.file_key(), framework.json_editor)?
        .set_default(SettingKey::Error404Help.file_key(), framework.error_404_help)?
        .set_default(SettingKey::WtfCsrfEnabled.file_key(), framework.csrf_enabled)?
        .set_default(SettingKey::MultithreadedInit.file_key(), server.multithreaded_init)?
        .set_default(SettingKey::FlaskDebug.file_key(), server.debug)?
        .set_default(SettingKey::FlaskPort.file_key(), i64::from(server.port))?
        .set_default(SettingKey::FlaskHost.file_key(), server.host)?
        .set_default(SettingKey::FlaskServerName.file_key(), server.server_name)
}

/// In-memory resolver, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MapSettings {
    values: FxHashMap<SettingKey, SettingValue>,
}

impl MapSettings {
    /// An empty resolver: every key is missing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver holding the built-in default of every key.
    #[must_use]
    pub fn defaults() -> Self {
        let framework = FrameworkConfig::default();
        let server = ServerConfig::default();

        Self::new()
            .with(SettingKey::SwaggerUiDocExpansion, framework.doc_expansion.as_str())
            .with(SettingKey::RestxValidate, framework.validate)
            .with(SettingKey::RestxMaskSwagger, framework.mask_swagger)
            .with(SettingKey::SwaggerUiJsonEditor, framework.json_editor)
            .with(SettingKey::Error404Help, framework.error_404_help)
            .with(SettingKey::WtfCsrfEnabled, framework.csrf_enabled)
            .with(SettingKey::MultithreadedInit, server.multithreaded_init)
            .with(SettingKey::FlaskDebug, server.debug)
            .with(SettingKey::FlaskPort, i64::from(server.port))
            .with(SettingKey::FlaskHost, server.host)
            .with(SettingKey::FlaskServerName, server.server_name)
    }

    #[must_use]
    pub fn with(mut self, key: SettingKey, value: impl Into<SettingValue>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    #[must_use]
    pub fn without(mut self, key: SettingKey) -> Self {
        self.values.remove(&key);
        self
    }
}

impl SettingsResolver for MapSettings {
    fn resolve(&self, key: SettingKey) -> Result<SettingValue, ConfigError> {
        let value = self.values.get(&key).ok_or(ConfigError::Missing { key, context: None })?;
        if value.kind() != key.kind() {
            return Err(ConfigError::Invalid {
                key,
                message: format!("expected {:?}, found {value:?}", key.kind()).into(),
                context: None,
            });
        }
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    #[serial]
    fn defaults_resolve_without_a_file() {
        let settings = LayeredSettings::load_with(None, no_env).expect("defaults load");
        assert_eq!(settings.source(), None);
        assert_eq!(
            settings.resolve(SettingKey::FlaskPort).expect("port"),
            SettingValue::Int(8888)
        );
        assert_eq!(
            settings.resolve(SettingKey::SwaggerUiDocExpansion).expect("expansion"),
            SettingValue::Str("list".to_owned())
        );
    }

    #[test]
    #[serial]
    fn file_values_and_env_overrides_are_layered() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "flask_port = 9000\nflask_debug = true\n[model]\npath = \"/srv/m.json\"")?;

        let settings = LayeredSettings::load_with(Some(file.path()), |name| {
            (name == "FLASK_DEBUG").then(|| "false".to_owned())
        })?;

        assert_eq!(settings.source(), Some(file.path()));
        assert_eq!(settings.resolve(SettingKey::FlaskPort)?, SettingValue::Int(9000));
        assert_eq!(settings.resolve(SettingKey::FlaskDebug)?, SettingValue::Bool(false));
        assert_eq!(settings.service_config()?.model.path, PathBuf::from("/srv/m.json"));
        Ok(())
    }

    #[test]
    #[serial]
    fn malformed_override_fails_resolution() -> Result<(), ConfigError> {
        let settings = LayeredSettings::load_with(None, |name| {
            (name == "FLASK_PORT").then(|| "eighty".to_owned())
        })?;

        let err = settings.resolve(SettingKey::FlaskPort).expect_err("port must be numeric");
        assert!(matches!(err, ConfigError::Config { .. }), "unexpected error: {err}");
        Ok(())
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = LayeredSettings::load_with(Some(Path::new("/nonexistent/settings.toml")), no_env)
            .expect_err("explicit path must exist");
        assert!(err.to_string().contains("Failed to build settings"));
    }

    #[test]
    fn map_settings_reports_missing_and_mistyped_keys() {
        let settings = MapSettings::defaults()
            .without(SettingKey::FlaskHost)
            .with(SettingKey::FlaskPort, "not a number");

        assert!(matches!(
            settings.resolve(SettingKey::FlaskHost),
            Err(ConfigError::Missing { key: SettingKey::FlaskHost, .. })
        ));
        assert!(matches!(
            settings.resolve(SettingKey::FlaskPort),
            Err(ConfigError::Invalid { key: SettingKey::FlaskPort, .. })
        ));
    }
}
