//! ONNX models executed with tract. Label tensors pass through, class scores
//! reduce to an argmax id and single-column outputs stay as values.

use std::path::Path;
use tract_onnx::prelude::*;

use super::{ArtifactError, Model};
use crate::batch::{FeatureVector, Prediction};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

pub(crate) struct OnnxModel {
    plan: Plan,
    arity: usize,
}

impl OnnxModel {
    pub(crate) fn load(path: &Path) -> Result<Self, ArtifactError> {
        let invalid = |e: TractError| ArtifactError::Invalid { path: path.to_path_buf(), format: "onnx", reason: format!("{e:#}") };
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(invalid)?;
        // width of the last input axis; the leading axis is the batch
        let arity = plan
            .model()
            .input_fact(0)
            .ok()
            .and_then(|f| f.shape.iter().last().and_then(|d| d.to_usize().ok()))
            .filter(|w| *w > 0)
            .ok_or_else(|| ArtifactError::Invalid {
                path: path.to_path_buf(),
                format: "onnx",
                reason: "first input has no concrete feature axis".into(),
            })?;
        Ok(Self { plan, arity })
    }
}

impl Model for OnnxModel {
    fn format(&self) -> &'static str { "onnx" }
    fn arity(&self) -> usize { self.arity }

    fn predict(&self, rows: &[FeatureVector]) -> anyhow::Result<Vec<Prediction>> {
        let flat: Vec<f32> = rows.iter().flat_map(|r| r.values().iter().map(|v| *v as f32)).collect();
        let input = Tensor::from_shape(&[rows.len(), self.arity], &flat)?;
        let outputs = self.plan.run(tvec!(input.into()))?;
        let first = &outputs[0];
        // label tensors (e.g. sklearn converters) are returned as-is
        if let Ok(labels) = first.to_array_view::<i64>() {
            return Ok(labels.iter().map(|l| Prediction::Class(*l)).collect());
        }
        let scores = first.to_array_view::<f32>()?;
        Ok(reduce_scores(scores.shape(), scores.iter().copied()))
    }
}

/// Rank-2 scores become the argmax class per row; anything else is one
/// regression value per element.
fn reduce_scores(shape: &[usize], scores: impl Iterator<Item = f32>) -> Vec<Prediction> {
    let flat: Vec<f32> = scores.collect();
    match shape {
        [_, classes] if *classes > 1 => flat
            .chunks(*classes)
            .map(|row| {
                let idx = row
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                Prediction::Class(idx as i64)
            })
            .collect(),
        _ => flat.into_iter().map(|v| Prediction::Value(v as f64)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_scores_reduce_to_argmax() {
        let out = reduce_scores(&[2, 3], [0.1, 0.7, 0.2, 0.9, 0.05, 0.05].into_iter());
        assert_eq!(out, vec![Prediction::Class(1), Prediction::Class(0)]);
    }

    #[test]
    fn rank_one_scores_are_values() {
        let out = reduce_scores(&[3], [0.5, 1.5, -2.0].into_iter());
        assert_eq!(out, vec![Prediction::Value(0.5), Prediction::Value(1.5), Prediction::Value(-2.0)]);
    }

    #[test]
    fn single_column_scores_are_values() {
        let out = reduce_scores(&[2, 1], [0.25, 4.0].into_iter());
        assert_eq!(out, vec![Prediction::Value(0.25), Prediction::Value(4.0)]);
    }
}
