//! Loaded model artifact plus its declared input arity.
//!
//! `Scorer::load` is the only place that touches the disk. Once built a scorer
//! is immutable and can be shared freely between request tasks.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::batch::{FeatureVector, Prediction, PredictionBatch, PredictionResult};
use crate::error::ErrorKind;

mod artifact;
#[cfg(feature = "onnx")] mod onnx;

/// Inference backend behind a [`Scorer`]. Implementations must be
/// deterministic and must return exactly one prediction per row.
pub trait Model: Send + Sync {
    /// Short format name reported by `/status`.
    fn format(&self) -> &'static str;
    fn arity(&self) -> usize;
    fn predict(&self, rows: &[FeatureVector]) -> anyhow::Result<Vec<Prediction>>;
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("cannot read model artifact {}: {source}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("unrecognized model format for {}: {reason}", path.display())]
    UnrecognizedFormat { path: PathBuf, reason: String },
    #[error("invalid {format} artifact {}: {reason}", path.display())]
    Invalid { path: PathBuf, format: &'static str, reason: String },
    #[error("artifact digest mismatch for {}: expected={expected} got={actual}", path.display())]
    DigestMismatch { path: PathBuf, expected: String, actual: String },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoringError {
    #[error("instances have {got} features, model expects {expected}")]
    ArityMismatch { expected: usize, got: usize },
    #[error("model fault: {0}")]
    Fault(String),
}

impl ScoringError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScoringError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            ScoringError::Fault(_) => ErrorKind::ScoringFault,
        }
    }
}

/// Descriptive metadata captured at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub format: &'static str,
    pub arity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

pub struct Scorer {
    model: Box<dyn Model>,
    info: ModelInfo,
}

impl std::fmt::Debug for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scorer").field("info", &self.info).finish_non_exhaustive()
    }
}

impl Scorer {
    /// Wraps an in-memory model. Arity is read once and fixed from here on.
    pub fn new(model: impl Model + 'static) -> Self {
        let info = ModelInfo { format: model.format(), arity: model.arity(), path: None, sha256: None };
        Self { model: Box::new(model), info }
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> { Self::load_verified(path, None) }

    /// Loads an artifact and, when `expected_sha256` is non-empty, refuses it
    /// unless the file's SHA-256 matches.
    pub fn load_verified(path: &Path, expected_sha256: Option<&str>) -> Result<Self, ArtifactError> {
        let bytes = std::fs::read(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ArtifactError::NotFound(path.to_path_buf()),
            _ => ArtifactError::Io { path: path.to_path_buf(), source },
        })?;
        let digest = hex::encode(Sha256::digest(&bytes));
        if let Some(expected) = expected_sha256.map(str::trim).filter(|e| !e.is_empty()) {
            if !expected.eq_ignore_ascii_case(&digest) {
                return Err(ArtifactError::DigestMismatch { path: path.to_path_buf(), expected: expected.to_string(), actual: digest });
            }
        }
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        let model: Box<dyn Model> = match ext.as_deref() {
            Some("json") => artifact::from_json(path, &bytes)?,
            #[cfg(feature = "onnx")]
            Some("onnx") => Box::new(onnx::OnnxModel::load(path)?),
            _ => return Err(ArtifactError::UnrecognizedFormat {
                path: path.to_path_buf(),
                reason: format!("unsupported extension {:?}", ext.as_deref().unwrap_or("")),
            }),
        };
        let info = ModelInfo { format: model.format(), arity: model.arity(), path: Some(path.to_path_buf()), sha256: Some(digest) };
        info!(path = %path.display(), format = info.format, arity = info.arity, "model artifact loaded");
        Ok(Self { model, info })
    }

    pub fn arity(&self) -> usize { self.info.arity }
    pub fn info(&self) -> &ModelInfo { &self.info }

    pub fn score(&self, batch: &PredictionBatch) -> Result<PredictionResult, ScoringError> {
        if batch.width() != self.info.arity {
            return Err(ScoringError::ArityMismatch { expected: self.info.arity, got: batch.width() });
        }
        let predictions = self.model.predict(batch.rows()).map_err(|e| ScoringError::Fault(format!("{e:#}")))?;
        if predictions.len() != batch.len() {
            return Err(ScoringError::Fault(format!("model returned {} predictions for {} instances", predictions.len(), batch.len())));
        }
        // serde_json would write these as null
        if let Some(row) = predictions.iter().position(|p| matches!(p, Prediction::Value(v) if !v.is_finite())) {
            return Err(ScoringError::Fault(format!("model produced a non-finite value for instance {row}")));
        }
        debug!(rows = batch.len(), "batch scored");
        Ok(PredictionResult::new(predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct Echo { width: usize, drop_last: bool }

    impl Model for Echo {
        fn format(&self) -> &'static str { "echo" }
        fn arity(&self) -> usize { self.width }
        fn predict(&self, rows: &[FeatureVector]) -> anyhow::Result<Vec<Prediction>> {
            let mut out: Vec<Prediction> = rows.iter().map(|r| Prediction::Value(r.values().iter().sum())).collect();
            if self.drop_last { out.pop(); }
            Ok(out)
        }
    }

    fn batch(rows: &[&[f64]]) -> PredictionBatch {
        PredictionBatch::new(rows.iter().map(|r| FeatureVector::new(r.to_vec())).collect()).unwrap()
    }

    fn temp_artifact(ext: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("scorer-{}.{ext}", uuid::Uuid::new_v4()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn score_preserves_order_and_length() {
        let scorer = Scorer::new(Echo { width: 2, drop_last: false });
        let out = scorer.score(&batch(&[&[3.0, 0.0], &[1.0, 0.0], &[2.0, 0.0]])).unwrap();
        assert_eq!(out.as_slice(), &[Prediction::Value(3.0), Prediction::Value(1.0), Prediction::Value(2.0)]);
    }

    #[test]
    fn score_rejects_wrong_arity() {
        let scorer = Scorer::new(Echo { width: 4, drop_last: false });
        let err = scorer.score(&batch(&[&[1.0, 1.0, 1.0]])).unwrap_err();
        assert_eq!(err, ScoringError::ArityMismatch { expected: 4, got: 3 });
        assert_eq!(err.kind(), ErrorKind::ArityMismatch);
    }

    #[test]
    fn short_model_output_is_a_fault() {
        let scorer = Scorer::new(Echo { width: 1, drop_last: true });
        let err = scorer.score(&batch(&[&[1.0], &[2.0]])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ScoringFault);
    }

    #[test]
    fn overflowing_output_is_a_fault() {
        let scorer = Scorer::new(Echo { width: 2, drop_last: false });
        let err = scorer.score(&batch(&[&[1.0, 1.0], &[1e308, 1e308]])).unwrap_err();
        assert_eq!(err, ScoringError::Fault("model produced a non-finite value for instance 1".into()));
        assert_eq!(err.kind(), ErrorKind::ScoringFault);
    }

    #[test]
    fn load_missing_file() {
        let err = Scorer::load(Path::new("/definitely/not/here/model.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(_)));
    }

    #[test]
    fn load_unknown_extension() {
        let path = temp_artifact("pkl", "not a model");
        let err = Scorer::load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::UnrecognizedFormat { .. }));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn load_linear_and_verify_digest() {
        let body = r#"{"format":"linear","weights":[1.0,2.0],"bias":0.5}"#;
        let path = temp_artifact("json", body);
        let digest = hex::encode(Sha256::digest(body.as_bytes()));
        let scorer = Scorer::load_verified(&path, Some(&digest.to_uppercase())).unwrap();
        assert_eq!(scorer.arity(), 2);
        assert_eq!(scorer.info().format, "linear");
        assert_eq!(scorer.info().sha256.as_deref(), Some(digest.as_str()));
        let out = scorer.score(&batch(&[&[1.0, 1.0]])).unwrap();
        assert_eq!(out.as_slice(), &[Prediction::Value(3.5)]);

        let err = Scorer::load_verified(&path, Some("00ff")).unwrap_err();
        assert!(matches!(err, ArtifactError::DigestMismatch { .. }));
        assert!(err.to_string().contains(&path.display().to_string()));
        let _ = std::fs::remove_file(path);
    }
}
