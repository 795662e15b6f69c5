//! Kernel utilities shared across slices.
//! Keep this crate lightweight: it owns settings resolution, security primitives and the
//! HTTP scaffolding (state, health, blueprints, middleware) every slice plugs into.
//!
//! ## Settings resolution
//! ```rust
//! use dwaste_kernel::config::{MapSettings, SettingsResolver};
//! use dwaste_kernel::domain::settings::{SettingKey, SettingValue};
//!
//! let settings = MapSettings::new().with(SettingKey::FlaskPort, 8080_i64);
//! assert_eq!(settings.resolve(SettingKey::FlaskPort).unwrap(), SettingValue::Int(8080));
//! assert!(settings.resolve(SettingKey::FlaskHost).is_err());
//! ```

pub mod config;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod security;
pub mod server;

pub use dwaste_domain as domain;
pub use error::format_context;
