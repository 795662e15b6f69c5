use super::SecurityError;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const SECRET_KEY_LEN: usize = 32;

/// Random per-process signing key. Regenerated on every start; never persisted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; SECRET_KEY_LEN]);

impl SecretKey {
    /// Draws a new key from the OS entropy source.
    ///
    /// # Errors
    /// Returns [`SecurityError::Entropy`] if the OS refuses to provide randomness.
    pub fn generate() -> Result<Self, SecurityError> {
        let mut bytes = [0u8; SECRET_KEY_LEN];
        getrandom::fill(&mut bytes).map_err(|e| SecurityError::entropy(&e))?;
        Ok(Self(bytes))
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; SECRET_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub(crate) const fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(**redacted**)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let key = SecretKey::from_bytes([7; SECRET_KEY_LEN]);
        assert_eq!(format!("{key:?}"), "SecretKey(**redacted**)");
    }

    #[test]
    fn generated_keys_are_not_all_zero() {
        let key = SecretKey::generate().expect("entropy available");
        assert!(key.expose().iter().any(|&b| b != 0));
    }
}
