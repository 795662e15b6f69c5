//! The fixed set of named settings the service consumes at startup.
//!
//! Key names are a contract shared with deployment tooling: they are matched
//! verbatim against process environment overrides.

use std::fmt;

/// Value type a setting resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Bool,
    Str,
    Int,
}

/// A named setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingKey {
    SwaggerUiDocExpansion,
    RestxValidate,
    RestxMaskSwagger,
    SwaggerUiJsonEditor,
    Error404Help,
    WtfCsrfEnabled,
    MultithreadedInit,
    FlaskDebug,
    FlaskPort,
    FlaskHost,
    FlaskServerName,
}

impl SettingKey {
    /// Settings copied into the framework configuration store.
    pub const FRAMEWORK: [Self; 6] = [
        Self::SwaggerUiDocExpansion,
        Self::RestxValidate,
        Self::RestxMaskSwagger,
        Self::SwaggerUiJsonEditor,
        Self::Error404Help,
        Self::WtfCsrfEnabled,
    ];

    /// Settings steering warm-up and the listener.
    pub const SERVER: [Self; 5] =
        [Self::MultithreadedInit, Self::FlaskDebug, Self::FlaskPort, Self::FlaskHost, Self::FlaskServerName];

    /// Contract name, e.g. `FLASK_PORT`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SwaggerUiDocExpansion => "SWAGGER_UI_DOC_EXPANSION",
            Self::RestxValidate => "RESTX_VALIDATE",
            Self::RestxMaskSwagger => "RESTX_MASK_SWAGGER",
            Self::SwaggerUiJsonEditor => "SWAGGER_UI_JSONEDITOR",
            Self::Error404Help => "ERROR_404_HELP",
            Self::WtfCsrfEnabled => "WTF_CSRF_ENABLED",
            Self::MultithreadedInit => "MULTITHREADED_INIT",
            Self::FlaskDebug => "FLASK_DEBUG",
            Self::FlaskPort => "FLASK_PORT",
            Self::FlaskHost => "FLASK_HOST",
            Self::FlaskServerName => "FLASK_SERVER_NAME",
        }
    }

    /// Key inside the settings file (lower snake case of the contract name).
    #[must_use]
    pub const fn file_key(self) -> &'static str {
        match self {
            Self::SwaggerUiDocExpansion => "swagger_ui_doc_expansion",
            Self::RestxValidate => "restx_validate",
            Self::RestxMaskSwagger => "restx_mask_swagger",
            Self::SwaggerUiJsonEditor => "swagger_ui_jsoneditor",
            Self::Error404Help => "error_404_help",
            Self::WtfCsrfEnabled => "wtf_csrf_enabled",
            Self::MultithreadedInit => "multithreaded_init",
            Self::FlaskDebug => "flask_debug",
            Self::FlaskPort => "flask_port",
            Self::FlaskHost => "flask_host",
            Self::FlaskServerName => "flask_server_name",
        }
    }

    #[must_use]
    pub const fn kind(self) -> SettingKind {
        match self {
            Self::SwaggerUiDocExpansion | Self::FlaskHost | Self::FlaskServerName => {
                SettingKind::Str
            },
            Self::FlaskPort => SettingKind::Int,
            _ => SettingKind::Bool,
        }
    }

    /// Every key, framework keys first.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::FRAMEWORK.into_iter().chain(Self::SERVER)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved, typed setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Str(String),
    Int(i64),
}

impl SettingValue {
    #[must_use]
    pub const fn kind(&self) -> SettingKind {
        match self {
            Self::Bool(_) => SettingKind::Bool,
            Self::Str(_) => SettingKind::Str,
            Self::Int(_) => SettingKind::Int,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(v) = self { Some(*v) } else { None }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::Str(v) = self { Some(v) } else { None }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        if let Self::Int(v) = self { Some(*v) } else { None }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}
