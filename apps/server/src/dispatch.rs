use dwaste_domain::environment::HostEnvironment;

/// How the model is warmed up at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupPlan {
    /// Warm up on a background thread; startup does not wait.
    Background,
    /// Warm up on the startup thread; startup waits and fails with it.
    Blocking,
}

impl WarmupPlan {
    /// Background warm-up only when requested AND the process owns its own lifecycle.
    /// Under a process host the worker must be ready before it accepts traffic.
    #[must_use]
    pub const fn choose(multithreaded_init: bool, environment: HostEnvironment) -> Self {
        if multithreaded_init && !environment.is_hosted() { Self::Background } else { Self::Blocking }
    }
}
