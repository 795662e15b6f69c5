use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the process runs, decided once at startup.
///
/// * `Hosted` - a production host owns the process and its worker/thread lifecycle.
/// * `Standalone` - the process is its own top-level program and starts its own listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostEnvironment {
    Hosted,
    Standalone,
}

impl HostEnvironment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hosted => "hosted",
            Self::Standalone => "standalone",
        }
    }

    #[must_use]
    pub const fn is_hosted(self) -> bool {
        matches!(self, Self::Hosted)
    }
}

impl fmt::Display for HostEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
