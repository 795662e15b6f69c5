//! Linear soft-max classifier over colour histograms.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// On-disk model artifact, as produced by the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub version: String,
    pub labels: Vec<String>,
    /// Side of the square the image is resized to before feature extraction.
    pub input_size: u32,
    /// Histogram bins per RGB channel.
    pub bins: usize,
    /// One row of `3 * bins` weights per label.
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

/// A validated classifier, ready for inference.
#[derive(Debug, Clone)]
pub struct Classifier {
    version: String,
    labels: Vec<String>,
    input_size: u32,
    bins: usize,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
/// Probability assigned to one label
pub struct LabelScore {
    /// Waste category
    pub label: String,
    /// Probability in `0.0..=1.0`
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Classification result
pub struct Prediction {
    /// Most likely waste category
    pub label: String,
    /// Probability of `label`
    pub confidence: f32,
    /// Every label, most likely first
    pub scores: Vec<LabelScore>,
    /// Version of the model that produced the prediction
    pub model_version: String,
}

impl Classifier {
    /// Validates the artifact's shape.
    ///
    /// # Errors
    /// Returns [`ModelError::Artifact`] when labels, weights and bias disagree in size.
    pub fn from_artifact(artifact: ClassifierArtifact) -> Result<Self, ModelError> {
        let ClassifierArtifact { version, labels, input_size, bins, weights, bias } = artifact;

        if labels.is_empty() {
            return Err(ModelError::artifact("artifact declares no labels"));
        }
        if input_size == 0 || !(1..=256).contains(&bins) {
            return Err(ModelError::artifact(format!(
                "unsupported geometry: input_size={input_size}, bins={bins}"
            )));
        }
        if weights.len() != labels.len() || bias.len() != labels.len() {
            return Err(ModelError::artifact(format!(
                "{} labels but {} weight rows and {} biases",
                labels.len(),
                weights.len(),
                bias.len()
            )));
        }
        let width = bins * 3;
        if let Some((row, _)) = weights.iter().enumerate().find(|(_, w)| w.len() != width) {
            return Err(ModelError::artifact(format!(
                "weight row {row} has the wrong length, expected {width}"
            )));
        }

        Ok(Self { version, labels, input_size, bins, weights, bias })
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub const fn input_size(&self) -> u32 {
        self.input_size
    }

    #[must_use]
    pub const fn bins(&self) -> usize {
        self.bins
    }

    #[must_use]
    pub const fn feature_len(&self) -> usize {
        self.bins * 3
    }

    /// Scores a feature vector.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidInput`] if the vector has the wrong length.
    pub fn predict(&self, features: &[f32]) -> Result<Prediction, ModelError> {
        if features.len() != self.feature_len() {
            return Err(ModelError::invalid_input(format!(
                "expected {} features, got {}",
                self.feature_len(),
                features.len()
            )));
        }

        let logits: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect();

        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exp: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = exp.iter().sum();

        let mut scores: Vec<LabelScore> = self
            .labels
            .iter()
            .zip(exp)
            .map(|(label, e)| LabelScore { label: label.clone(), score: e / total })
            .collect();
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));

        let (label, confidence) = scores
            .first()
            .map(|top| (top.label.clone(), top.score))
            .ok_or_else(|| ModelError::internal("classifier has no labels"))?;

        Ok(Prediction { label, confidence, scores, model_version: self.version.clone() })
    }
}
