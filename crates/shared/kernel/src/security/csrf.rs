use super::{SecretKey, SecurityError};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use constant_time_eq::constant_time_eq;
use hkdf::Hkdf;
use sha2::Sha256;
use std::sync::Arc;

const NONCE_LEN: usize = 16;
const TAG_LEN: usize = 32;
const INFO: &[u8] = b"dwaste/csrf/v1";

/// Stateless CSRF tokens: `base64url(nonce || HKDF-SHA256(secret, salt = nonce))`.
///
/// Tokens stay valid for the lifetime of the process; a restart rotates the
/// secret and invalidates all of them.
#[derive(Debug, Clone)]
pub struct CsrfTokens {
    secret: Arc<SecretKey>,
}

impl CsrfTokens {
    #[must_use]
    pub fn new(secret: SecretKey) -> Self {
        Self { secret: Arc::new(secret) }
    }

    /// Issues a fresh token.
    ///
    /// # Errors
    /// Fails only if the entropy source or key derivation fails.
    pub fn issue(&self) -> Result<String, SecurityError> {
        let mut nonce = [0u8; NONCE_LEN];
        getrandom::fill(&mut nonce).map_err(|e| SecurityError::entropy(&e))?;

        let tag = self.tag(&nonce)?;
        let mut raw = Vec::with_capacity(NONCE_LEN + TAG_LEN);
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&tag);

        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    /// Checks that `token` was issued by this process.
    ///
    /// # Errors
    /// Returns [`SecurityError::CsrfInvalid`] for malformed or forged tokens.
    pub fn verify(&self, token: &str) -> Result<(), SecurityError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| SecurityError::csrf_invalid("token is not base64url"))?;

        if raw.len() != NONCE_LEN + TAG_LEN {
            return Err(SecurityError::csrf_invalid("token has the wrong length"));
        }

        let (nonce, tag) = raw.split_at(NONCE_LEN);
        let expected = self.tag(nonce)?;

        if constant_time_eq(tag, &expected) {
            Ok(())
        } else {
            Err(SecurityError::csrf_invalid("token signature mismatch"))
        }
    }

    fn tag(&self, nonce: &[u8]) -> Result<[u8; TAG_LEN], SecurityError> {
        let hk = Hkdf::<Sha256>::new(Some(nonce), self.secret.expose());
        let mut okm = [0u8; TAG_LEN];
        hk.expand(INFO, &mut okm).map_err(|_| SecurityError::Derivation)?;
        Ok(okm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::secret::SECRET_KEY_LEN;

    fn tokens(seed: u8) -> CsrfTokens {
        CsrfTokens::new(SecretKey::from_bytes([seed; SECRET_KEY_LEN]))
    }

    #[test]
    fn issued_token_verifies() {
        let csrf = tokens(1);
        let token = csrf.issue().expect("issue");
        assert!(csrf.verify(&token).is_ok());
    }

    #[test]
    fn token_from_another_process_is_rejected() {
        let token = tokens(1).issue().expect("issue");
        assert!(matches!(tokens(2).verify(&token), Err(SecurityError::CsrfInvalid { .. })));
    }

    #[test]
    fn tampered_and_garbage_tokens_are_rejected() {
        let csrf = tokens(3);
        let mut token = csrf.issue().expect("issue");
        let last = if token.ends_with('A') { 'B' } else { 'A' };
        token.pop();
        token.push(last);

        assert!(csrf.verify(&token).is_err());
        assert!(csrf.verify("not a token!").is_err());
        assert!(csrf.verify("").is_err());
    }
}
