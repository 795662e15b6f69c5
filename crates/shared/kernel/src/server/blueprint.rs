use crate::diagnostics::{self, Notice, NoticeCode};
use dwaste_domain::config::AppConfig;
use std::fmt;
use tracing::debug;
use utoipa_axum::router::OpenApiRouter;

type SetupHook = Box<dyn FnOnce(&AppConfig) + Send>;

/// A named bundle of routes plus the setup hooks to run when it is attached.
///
/// Blueprints are assembled independently and registered as one opaque unit once the
/// configuration snapshot exists.
pub struct Blueprint<S> {
    name: &'static str,
    router: OpenApiRouter<S>,
    hooks: Vec<(&'static str, SetupHook)>,
}

impl<S> Blueprint<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, router: OpenApiRouter<S>) -> Self {
        Self { name, router, hooks: Vec::new() }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Adds a hook that receives the configuration snapshot at registration time.
    #[must_use]
    pub fn on_setup<F>(mut self, label: &'static str, hook: F) -> Self
    where
        F: FnOnce(&AppConfig) + Send + 'static,
    {
        self.hooks.push((label, Box::new(hook)));
        self
    }

    /// Folds another blueprint into this one, keeping its routes and hooks.
    #[must_use]
    pub fn nest(mut self, other: Self) -> Self {
        self.router = self.router.merge(other.router);
        self.hooks.extend(other.hooks);
        self
    }

    /// Attaches the blueprint: runs every setup hook, then hands back the routes.
    ///
    /// Each hook runs after the application already exists and therefore raises a
    /// [`NoticeCode::LateSetupMethod`] notice; callers that expect this wrap the call
    /// in [`diagnostics::suppress`].
    pub fn register(self, config: &AppConfig) -> OpenApiRouter<S> {
        let Self { name, router, hooks } = self;

        for (label, hook) in hooks {
            diagnostics::emit(&Notice::new(
                NoticeCode::LateSetupMethod,
                format!("Setup method '{label}' of blueprint '{name}' ran after the application was created"),
            ));
            hook(config);
        }

        debug!(blueprint = name, "Blueprint registered");
        router
    }
}

impl<S> fmt::Debug for Blueprint<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("name", &self.name)
            .field("hooks", &self.hooks.iter().map(|(label, _)| *label).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
