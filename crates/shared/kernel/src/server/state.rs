use super::health::{AlwaysReady, Readiness, ReadinessProbe};
use crate::format_context;
use crate::security::{CsrfTokens, SecretKey};
use axum::extract::FromRef;
use dwaste_domain::config::AppConfig;
use dwaste_domain::registry::{FeatureSlice, InitializedSlice};
use fxhash::FxHashMap;
use std::any::TypeId;
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ApiStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("State missing feature slice{}: {message}", format_context(.context))]
    MissingSlice { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[derive(Debug)]
pub struct ApiStateInner {
    pub config: AppConfig,
    pub csrf: CsrfTokens,
    readiness: Arc<dyn ReadinessProbe>,
    slices: FxHashMap<TypeId, InitializedSlice>,
}

/// Shared application state, cloned into every handler.
#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }

    #[must_use]
    pub fn get_slice<T: FeatureSlice>(&self) -> Option<&T> {
        self.inner
            .slices
            .get(&TypeId::of::<T>())
            .and_then(|initialized| initialized.state.as_any().downcast_ref::<T>())
    }

    /// Returns a reference to the slice if it is registered.
    ///
    /// # Errors
    /// Returns an error if the slice is not registered.
    pub fn try_get_slice<T: FeatureSlice>(&self) -> Result<&T, ApiStateError> {
        self.get_slice::<T>().ok_or_else(|| ApiStateError::MissingSlice {
            message: std::any::type_name::<T>().into(),
            context: None,
        })
    }

    /// Names of the registered slices (for diagnostics).
    pub fn slice_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.inner.slices.values().map(InitializedSlice::name)
    }

    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.inner.readiness.readiness()
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<ApiState> for AppConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.config.clone()
    }
}

impl FromRef<ApiState> for CsrfTokens {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.csrf.clone()
    }
}

#[derive(Debug, Default)]
pub struct ApiStateBuilder {
    config: Option<AppConfig>,
    secret: Option<SecretKey>,
    readiness: Option<Arc<dyn ReadinessProbe>>,
    slices: FxHashMap<TypeId, InitializedSlice>,
}

impl ApiStateBuilder {
    #[must_use]
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn secret(mut self, secret: SecretKey) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Probe answering `/api/health/readiness`. Defaults to [`AlwaysReady`].
    #[must_use]
    pub fn readiness(mut self, probe: Arc<dyn ReadinessProbe>) -> Self {
        self.readiness = Some(probe);
        self
    }

    #[must_use]
    pub fn register_slice(mut self, slice: InitializedSlice) -> Self {
        self.slices.insert(slice.id, slice);
        self
    }

    /// Consumes the builder.
    ///
    /// # Errors
    /// Returns [`ApiStateError::Validation`] when the configuration or secret key is missing.
    pub fn build(self) -> Result<ApiState, ApiStateError> {
        let config = self.config.ok_or_else(|| ApiStateError::Validation {
            message: "AppConfig not provided".into(),
            context: None,
        })?;
        let secret = self.secret.ok_or_else(|| ApiStateError::Validation {
            message: "Secret key not provided".into(),
            context: None,
        })?;
        let readiness = self.readiness.unwrap_or_else(|| Arc::new(AlwaysReady));

        Ok(ApiState {
            inner: Arc::new(ApiStateInner {
                config,
                csrf: CsrfTokens::new(secret),
                readiness,
                slices: self.slices,
            }),
        })
    }
}
