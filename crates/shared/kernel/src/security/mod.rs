//! Per-process secrets and the request-forgery tokens derived from them.

pub mod csrf;
pub mod secret;

pub use csrf::CsrfTokens;
pub use secret::SecretKey;

use crate::format_context;
use std::borrow::Cow;

#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    #[error("Entropy source failed{}: {message}", format_context(.context))]
    Entropy { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("CSRF token missing")]
    CsrfMissing,

    #[error("CSRF token rejected{}: {message}", format_context(.context))]
    CsrfInvalid { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Key derivation failed")]
    Derivation,
}

impl SecurityError {
    pub(crate) fn entropy(error: &getrandom::Error) -> Self {
        Self::Entropy { message: error.to_string().into(), context: None }
    }

    pub(crate) fn csrf_invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Self::CsrfInvalid { message: message.into(), context: None }
    }
}
