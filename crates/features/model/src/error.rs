use dwaste_kernel::format_context;
use dwaste_kernel::server::ApiError;
use std::borrow::Cow;

/// A specialized [`ModelError`] enum of this crate.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The model artifact could not be read.
    #[error("Model I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
    /// The model artifact is malformed or inconsistent.
    #[error("Model artifact error{}: {message}", format_context(.context))]
    Artifact { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// The request payload could not be decoded into an image.
    #[error("Image decode error{}: {message}", format_context(.context))]
    Decode { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// The request payload failed validation.
    #[error("Invalid input{}: {message}", format_context(.context))]
    InvalidInput { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// Inference was requested before warm-up succeeded.
    #[error("Model not ready{}: {message}", format_context(.context))]
    NotReady { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// Warm-up could not be started or did not complete.
    #[error("Model warm-up error{}: {message}", format_context(.context))]
    Warmup { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal model error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ModelError {
    pub(crate) fn artifact(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Artifact { message: message.into(), context: None }
    }

    pub(crate) fn decode(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Decode { message: message.into(), context: None }
    }

    pub(crate) fn invalid_input(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidInput { message: message.into(), context: None }
    }

    pub(crate) fn not_ready(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotReady { message: message.into(), context: None }
    }

    pub(crate) fn warmup(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Warmup { message: message.into(), context: None }
    }

    pub(crate) fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal { message: message.into(), context: None }
    }
}

pub trait ModelErrorExt<T> {
    /// Attaches a human-readable context to the error.
    ///
    /// # Errors
    /// Returns the original error, annotated.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ModelError>;
}

impl<T> ModelErrorExt<T> for Result<T, ModelError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                ModelError::Io { context: c, .. }
                | ModelError::Artifact { context: c, .. }
                | ModelError::Decode { context: c, .. }
                | ModelError::InvalidInput { context: c, .. }
                | ModelError::NotReady { context: c, .. }
                | ModelError::Warmup { context: c, .. }
                | ModelError::Internal { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl<T> ModelErrorExt<T> for Result<T, std::io::Error> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ModelError> {
        self.map_err(|source| ModelError::Io { source, context: Some(context.into()) })
    }
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Decode { .. } | ModelError::InvalidInput { .. } => {
                Self::bad_request(e.to_string())
            },
            ModelError::NotReady { .. } => Self::unavailable(e.to_string()),
            ModelError::Io { .. }
            | ModelError::Artifact { .. }
            | ModelError::Warmup { .. }
            | ModelError::Internal { .. } => Self::internal(e.to_string()),
        }
    }
}
