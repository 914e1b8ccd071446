//! Face capability — the external detection/recognition collaborator.
//!
//! Detection, landmark extraction and descriptor computation all live behind
//! [`FaceCapability`]. The session only sequences calls into it.

use crate::types::{Descriptor, FaceDetection, Frame};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// Tiny face detector defaults.
const DEFAULT_INPUT_SIZE: u32 = 416;
const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("failed to load {kind} model from {source_uri}: {reason}")]
    ModelLoad {
        kind: ModelKind,
        source_uri: String,
        reason: String,
    },
    #[error("detection failed: {0}")]
    Detection(String),
}

/// The three model assets that must be loaded before any detection call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    Detector,
    Recognizer,
    Landmarks,
}

impl ModelKind {
    /// Load order used by the model loader.
    pub const ALL: [ModelKind; 3] = [ModelKind::Detector, ModelKind::Recognizer, ModelKind::Landmarks];
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::Detector => "detector",
            ModelKind::Recognizer => "recognizer",
            ModelKind::Landmarks => "landmarks",
        };
        f.write_str(name)
    }
}

/// Options passed through to every detection call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorOptions {
    /// Square input size the detector resizes frames to.
    pub input_size: u32,
    /// Minimum detector score for a face to be reported.
    pub score_threshold: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

/// Face detection and recognition provider.
#[async_trait]
pub trait FaceCapability: Send + Sync {
    /// Load one model asset from `source` (a directory path or base URI).
    async fn load_model(&self, kind: ModelKind, source: &str) -> Result<(), CapabilityError>;

    /// Detect the most prominent face with landmarks and descriptor, if any.
    async fn detect_single_face(
        &self,
        frame: &Frame,
        options: &DetectorOptions,
    ) -> Result<Option<FaceDetection>, CapabilityError>;

    /// Detect every face in the frame with landmarks and descriptors.
    async fn detect_all_faces(
        &self,
        frame: &Frame,
        options: &DetectorOptions,
    ) -> Result<Vec<FaceDetection>, CapabilityError>;

    /// Distance between a stored reference and a fresh candidate. Lower = more similar.
    fn match_distance(&self, reference: &Descriptor, candidate: &Descriptor) -> f32 {
        reference.euclidean_distance(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_load_order() {
        assert_eq!(
            ModelKind::ALL,
            [ModelKind::Detector, ModelKind::Recognizer, ModelKind::Landmarks]
        );
    }

    #[test]
    fn test_detector_options_default() {
        let opts = DetectorOptions::default();
        assert_eq!(opts.input_size, 416);
        assert!((opts.score_threshold - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_model_load_error_message() {
        let err = CapabilityError::ModelLoad {
            kind: ModelKind::Recognizer,
            source_uri: "/models".into(),
            reason: "missing".into(),
        };
        assert_eq!(err.to_string(), "failed to load recognizer model from /models: missing");
    }
}
