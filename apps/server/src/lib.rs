//! # DWaste Server
//!
//! Bootstrap of the inference service: environment detection, configuration propagation,
//! blueprint registration, model warm-up dispatch and (standalone only) the development
//! listener.
//!
//! Startup is a single synchronous composition step producing an immutable [`App`]:
//!
//! ```text
//! EnvironmentDetected → Configured → BlueprintRegistered → [ModelWarming] → Ready
//! ```
//!
//! ## Example
//! ```no_run
//! use dwaste_kernel::config::MapSettings;
//! use dwaste_server::Bootstrapper;
//!
//! # fn example() -> anyhow::Result<()> {
//! let app = Bootstrapper::new().settings(MapSettings::defaults()).build()?;
//! assert!(app.config().framework.validate);
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod lifecycle;
mod router;
mod runner;
mod runtime;

pub use dispatch::WarmupPlan;
pub use lifecycle::{Stage, StageLog};
pub use runtime::RuntimeProfile;

use anyhow::{Context, Result};
use axum::Router;
use dwaste_domain::config::{AppConfig, ServiceConfig};
use dwaste_domain::constants::SETTINGS_PATH_VAR;
use dwaste_domain::environment::HostEnvironment;
use dwaste_domain::registry::InitializedSlice;
use dwaste_kernel::config::{Configuration, LayeredSettings, SettingsResolver, propagate};
use dwaste_kernel::diagnostics::{self, NoticeCode};
use dwaste_kernel::environment;
use dwaste_kernel::server::ApiState;
use dwaste_model::{ModelWrapper, WarmupHandle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Settings file location: `DWASTE_SETTINGS`, or `None` for `./settings.toml` if present.
#[must_use]
pub fn settings_path() -> Option<PathBuf> {
    std::env::var_os(SETTINGS_PATH_VAR).map(PathBuf::from)
}

/// A fluent builder composing the application.
///
/// Every collaborator is injectable; anything left unset comes from the process: settings from
/// the layered loader, the environment from `SERVER_SOFTWARE`, the model from the `model`
/// settings section.
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct Bootstrapper {
    settings: Option<Arc<dyn SettingsResolver>>,
    service: Option<ServiceConfig>,
    environment: Option<HostEnvironment>,
    model: Option<ModelWrapper>,
}

impl Bootstrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver for the named settings.
    pub fn settings(mut self, resolver: impl SettingsResolver + 'static) -> Self {
        self.settings = Some(Arc::new(resolver));
        self
    }

    /// Structured sections (`logging`, `model`, `cors`). Defaults apply when unset.
    pub fn service_config(mut self, service: ServiceConfig) -> Self {
        self.service = Some(service);
        self
    }

    pub const fn environment(mut self, environment: HostEnvironment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn model(mut self, model: ModelWrapper) -> Self {
        self.model = Some(model);
        self
    }

    /// Consumes the builder and brings the application up.
    ///
    /// # Process
    /// 1. Detects the hosting environment
    /// 2. Resolves every named setting into the configuration snapshot and generates the secret key
    /// 3. Registers the aggregate blueprint with the late-setup notice suppressed
    /// 4. Warms the model up, in the background only when `MULTITHREADED_INIT` is set and the
    ///    process runs standalone
    ///
    /// # Errors
    /// Returns an error if:
    /// * Any setting cannot be resolved (nothing is registered or loaded in that case)
    /// * The settings file is malformed
    /// * Blocking warm-up fails
    /// * The background warm-up thread cannot be spawned
    pub fn build(self) -> Result<App> {
        let mut stages = StageLog::default();

        // 1. Environment
        let environment = self.environment.unwrap_or_else(environment::detect);
        stages.enter(Stage::EnvironmentDetected);
        info!(%environment, "Runtime environment detected");

        // 2. Configuration
        let (resolver, service) = match self.settings {
            Some(resolver) => (resolver, self.service.unwrap_or_default()),
            None => {
                let layered = LayeredSettings::load(settings_path().as_deref())
                    .context("Critical: settings are malformed")?;
                let service = match self.service {
                    Some(service) => service,
                    None => layered.service_config().context("Critical: settings are malformed")?,
                };
                (Arc::new(layered) as Arc<dyn SettingsResolver>, service)
            },
        };

        let Configuration { config, secret } =
            propagate(resolver.as_ref(), service).context("Configuration propagation failed")?;
        stages.enter(Stage::Configured);

        // 3. State and blueprint
        let model = self.model.unwrap_or_else(|| dwaste_model::init(&config.service.model));

        let state = ApiState::builder()
            .config(config.clone())
            .secret(secret)
            .readiness(Arc::new(model.clone()))
            .register_slice(InitializedSlice::new(model.clone()))
            .build()
            .context("Failed to finalize API state registry")?;

        let router = {
            let _quiet = diagnostics::suppress(NoticeCode::LateSetupMethod);
            router::init(&state)?
        };
        stages.enter(Stage::BlueprintRegistered);

        // 4. Model warm-up
        let warmup = match WarmupPlan::choose(config.server.multithreaded_init, environment) {
            WarmupPlan::Background => {
                let handle =
                    model.multithreaded_init().context("Failed to start background model warm-up")?;
                stages.enter(Stage::ModelWarming);
                Some(handle)
            },
            WarmupPlan::Blocking => {
                model.init().context("Model warm-up failed")?;
                None
            },
        };
        stages.enter(Stage::Ready);

        Ok(App { router, config, environment, stages, model, warmup })
    }
}

/// A fully bootstrapped application.
#[must_use = "call .run() to start serving"]
#[derive(Debug)]
pub struct App {
    router: Router,
    config: AppConfig,
    environment: HostEnvironment,
    stages: StageLog,
    model: ModelWrapper,
    warmup: Option<WarmupHandle>,
}

impl App {
    /// The complete HTTP surface.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub const fn environment(&self) -> HostEnvironment {
        self.environment
    }

    #[must_use]
    pub const fn stages(&self) -> &StageLog {
        &self.stages
    }

    #[must_use]
    pub const fn model(&self) -> &ModelWrapper {
        &self.model
    }

    /// Handle on the background warm-up, when one was dispatched.
    #[must_use]
    pub const fn warmup(&self) -> Option<&WarmupHandle> {
        self.warmup.as_ref()
    }

    /// Serves until a shutdown signal arrives and returns the complete stage record.
    ///
    /// Standalone processes get the development listener; hosted ones the production listener
    /// with graceful shutdown.
    ///
    /// # Errors
    /// Returns an error if the listener cannot bind or fails while serving.
    pub async fn run(self) -> Result<StageLog> {
        let Self { router, config, environment, mut stages, .. } = self;
        stages.enter(Stage::Listening);

        match environment {
            HostEnvironment::Standalone => runner::standalone(router, &config.server).await?,
            HostEnvironment::Hosted => runner::hosted(router, &config.server).await?,
        }

        stages.enter(Stage::Terminated);
        Ok(stages)
    }
}
