//! Typed request and response payloads shared by the validator and the scorer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of model input. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Box<[f64]>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self { Self(values.into_boxed_slice()) }
    pub fn values(&self) -> &[f64] { &self.0 }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self { Self::new(values) }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("batch is empty")]
    Empty,
    #[error("instance {index} has {got} features, instance 0 has {expected}")]
    Ragged { index: usize, expected: usize, got: usize },
}

/// Non-empty, rectangular group of feature vectors scored together.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionBatch {
    rows: Vec<FeatureVector>,
    width: usize,
}

impl PredictionBatch {
    pub fn new(rows: Vec<FeatureVector>) -> Result<Self, ShapeError> {
        let width = rows.first().map(FeatureVector::len).ok_or(ShapeError::Empty)?;
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(ShapeError::Ragged { index, expected: width, got: row.len() });
        }
        Ok(Self { rows, width })
    }

    /// Shared length of every row.
    pub fn width(&self) -> usize { self.width }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }
    pub fn rows(&self) -> &[FeatureVector] { &self.rows }
}

/// A single model output, serialized as the bare JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prediction {
    Class(i64),
    Value(f64),
    Label(String),
}

/// Predictions in input order, one per row of the scored batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredictionResult(Vec<Prediction>);

impl PredictionResult {
    pub(crate) fn new(predictions: Vec<Prediction>) -> Self { Self(predictions) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn as_slice(&self) -> &[Prediction] { &self.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(widths: &[usize]) -> Vec<FeatureVector> {
        widths.iter().map(|w| FeatureVector::new(vec![1.0; *w])).collect()
    }

    #[test]
    fn batch_requires_rows() {
        assert_eq!(PredictionBatch::new(vec![]), Err(ShapeError::Empty));
    }

    #[test]
    fn batch_rejects_ragged_rows() {
        let err = PredictionBatch::new(rows(&[4, 4, 3])).unwrap_err();
        assert_eq!(err, ShapeError::Ragged { index: 2, expected: 4, got: 3 });
    }

    #[test]
    fn batch_keeps_order_and_width() {
        let batch = PredictionBatch::new(vec![vec![1.0, 2.0].into(), vec![3.0, 4.0].into()]).unwrap();
        assert_eq!(batch.width(), 2);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows()[1].values(), &[3.0, 4.0]);
    }

    #[test]
    fn prediction_serializes_as_bare_value() {
        let out = PredictionResult::new(vec![Prediction::Class(2), Prediction::Label("setosa".into()), Prediction::Value(0.5)]);
        assert_eq!(serde_json::to_string(&out).unwrap(), r#"[2,"setosa",0.5]"#);
    }

    #[test]
    fn prediction_deserializes_by_json_type() {
        let parsed: Vec<Prediction> = serde_json::from_str(r#"[1, 1.5, "virginica"]"#).unwrap();
        assert_eq!(parsed, vec![Prediction::Class(1), Prediction::Value(1.5), Prediction::Label("virginica".into())]);
    }
}
