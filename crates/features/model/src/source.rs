use crate::classifier::{Classifier, ClassifierArtifact};
use crate::error::{ModelError, ModelErrorExt};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a classifier comes from.
pub trait ModelSource: Debug + Send + Sync {
    /// Loads and validates the classifier. May block.
    ///
    /// # Errors
    /// Returns an error if the artifact cannot be read or is invalid.
    fn load(&self) -> Result<Classifier, ModelError>;
}

/// Reads a JSON [`ClassifierArtifact`] from disk.
#[derive(Debug, Clone)]
pub struct FileModelSource {
    path: PathBuf,
}

impl FileModelSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelSource for FileModelSource {
    fn load(&self) -> Result<Classifier, ModelError> {
        let raw = std::fs::read_to_string(&self.path)
            .context(format!("reading {}", self.path.display()))?;

        let artifact: ClassifierArtifact = serde_json::from_str(&raw).map_err(|e| ModelError::Artifact {
            message: e.to_string().into(),
            context: Some(format!("parsing {}", self.path.display()).into()),
        })?;

        debug!(path = %self.path.display(), version = %artifact.version, "Model artifact read");
        Classifier::from_artifact(artifact).context(format!("validating {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_valid_artifact() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{"version":"1","labels":["a"],"input_size":8,"bins":1,"weights":[[0,0,0]],"bias":[0]}}"#
        )?;

        let classifier = FileModelSource::new(file.path()).load()?;
        assert_eq!(classifier.version(), "1");
        assert_eq!(classifier.feature_len(), 3);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = FileModelSource::new("/nonexistent/model.json").load().expect_err("must fail");
        assert!(matches!(err, ModelError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/model.json"));
    }
}
