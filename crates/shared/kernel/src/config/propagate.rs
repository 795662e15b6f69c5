use super::{ConfigError, ConfigErrorExt, SettingsResolver};
use crate::security::secret::SecretKey;
use dwaste_domain::config::{AppConfig, DocExpansion, FrameworkConfig, ServerConfig, ServiceConfig};
use dwaste_domain::settings::{SettingKey, SettingValue};
use tracing::debug;

/// Result of configuration propagation: the frozen snapshot plus the per-process secret.
#[derive(Debug)]
pub struct Configuration {
    pub config: AppConfig,
    pub secret: SecretKey,
}

/// Resolves every named setting, copies them into an immutable snapshot and
/// generates a fresh secret key.
///
/// All keys are resolved before anything is returned, so a single failing key
/// leaves no partial configuration behind.
///
/// # Errors
/// Returns the first resolution failure, or a security error if the secret
/// cannot be generated.
pub fn propagate(
    resolver: &dyn SettingsResolver,
    service: ServiceConfig,
) -> Result<Configuration, ConfigError> {
    let framework = FrameworkConfig {
        doc_expansion: doc_expansion(resolver)?,
        validate: bool_setting(resolver, SettingKey::RestxValidate)?,
        mask_swagger: bool_setting(resolver, SettingKey::RestxMaskSwagger)?,
        json_editor: bool_setting(resolver, SettingKey::SwaggerUiJsonEditor)?,
        error_404_help: bool_setting(resolver, SettingKey::Error404Help)?,
        csrf_enabled: bool_setting(resolver, SettingKey::WtfCsrfEnabled)?,
    };

    let server = ServerConfig {
        host: str_setting(resolver, SettingKey::FlaskHost)?,
        port: port(resolver)?,
        server_name: str_setting(resolver, SettingKey::FlaskServerName)?,
        debug: bool_setting(resolver, SettingKey::FlaskDebug)?,
        multithreaded_init: bool_setting(resolver, SettingKey::MultithreadedInit)?,
    };

    let secret = SecretKey::generate().map_err(ConfigError::from).context("secret key")?;

    debug!(
        doc_expansion = %framework.doc_expansion,
        validate = framework.validate,
        csrf = framework.csrf_enabled,
        "Framework configuration propagated"
    );

    Ok(Configuration { config: AppConfig::new(framework, server, service), secret })
}

fn mismatch(key: SettingKey, value: &SettingValue) -> ConfigError {
    ConfigError::Invalid {
        key,
        message: format!("expected {:?}, found {value:?}", key.kind()).into(),
        context: None,
    }
}

fn bool_setting(resolver: &dyn SettingsResolver, key: SettingKey) -> Result<bool, ConfigError> {
    let value = resolver.resolve(key)?;
    value.as_bool().ok_or_else(|| mismatch(key, &value))
}

fn str_setting(resolver: &dyn SettingsResolver, key: SettingKey) -> Result<String, ConfigError> {
    let value = resolver.resolve(key)?;
    value.as_str().map(str::to_owned).ok_or_else(|| mismatch(key, &value))
}

fn port(resolver: &dyn SettingsResolver) -> Result<u16, ConfigError> {
    let key = SettingKey::FlaskPort;
    let value = resolver.resolve(key)?;
    let raw = value.as_int().ok_or_else(|| mismatch(key, &value))?;

    u16::try_from(raw).map_err(|_| ConfigError::Invalid {
        key,
        message: format!("{raw} is not a TCP port").into(),
        context: None,
    })
}

fn doc_expansion(resolver: &dyn SettingsResolver) -> Result<DocExpansion, ConfigError> {
    let key = SettingKey::SwaggerUiDocExpansion;
    str_setting(resolver, key)?
        .parse()
        .map_err(|message: String| ConfigError::Invalid { key, message: message.into(), context: None })
}
