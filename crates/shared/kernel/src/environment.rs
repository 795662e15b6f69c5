use dwaste_domain::constants::HOST_SOFTWARE_VAR;
use dwaste_domain::environment::HostEnvironment;
use tracing::debug;

/// Detects the hosting environment from the real process environment.
#[must_use]
pub fn detect() -> HostEnvironment {
    detect_with(|name| std::env::var(name).ok())
}

/// A process host identifies itself through a non-empty `SERVER_SOFTWARE`.
pub fn detect_with<F>(lookup: F) -> HostEnvironment
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(HOST_SOFTWARE_VAR) {
        Some(software) if !software.trim().is_empty() => {
            debug!(%software, "Running under a process host");
            HostEnvironment::Hosted
        },
        _ => HostEnvironment::Standalone,
    }
}
