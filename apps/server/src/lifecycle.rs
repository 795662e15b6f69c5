use std::fmt;

/// Startup stages, in the order the bootstrapper passes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    EnvironmentDetected,
    Configured,
    BlueprintRegistered,
    /// Background warm-up dispatched. Absent when warm-up ran on the startup thread.
    ModelWarming,
    Ready,
    Listening,
    Terminated,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnvironmentDetected => "environment_detected",
            Self::Configured => "configured",
            Self::BlueprintRegistered => "blueprint_registered",
            Self::ModelWarming => "model_warming",
            Self::Ready => "ready",
            Self::Listening => "listening",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered record of the stages passed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageLog(Vec<Stage>);

impl StageLog {
    pub(crate) fn enter(&mut self, stage: Stage) {
        tracing::debug!(%stage, "Startup stage reached");
        self.0.push(stage);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Stage] {
        &self.0
    }

    #[must_use]
    pub fn contains(&self, stage: Stage) -> bool {
        self.0.contains(&stage)
    }

    /// Position of `stage` in the record.
    #[must_use]
    pub fn position(&self, stage: Stage) -> Option<usize> {
        self.0.iter().position(|&s| s == stage)
    }
}
