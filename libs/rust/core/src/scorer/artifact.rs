//! JSON model artifacts: decision trees and linear models.

use serde::Deserialize;
use std::path::Path;

use super::{ArtifactError, Model};
use crate::batch::{FeatureVector, Prediction};

#[derive(Debug, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
enum Artifact {
    DecisionTree(DecisionTree),
    Linear(LinearModel),
}

pub(crate) fn from_json(path: &Path, bytes: &[u8]) -> Result<Box<dyn Model>, ArtifactError> {
    let artifact: Artifact = serde_json::from_slice(bytes).map_err(|e| ArtifactError::UnrecognizedFormat {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    match artifact {
        Artifact::DecisionTree(tree) => {
            tree.validate().map_err(|reason| ArtifactError::Invalid { path: path.to_path_buf(), format: "decision_tree", reason })?;
            Ok(Box::new(tree))
        }
        Artifact::Linear(linear) => {
            linear.validate().map_err(|reason| ArtifactError::Invalid { path: path.to_path_buf(), format: "linear", reason })?;
            Ok(Box::new(linear))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TreeNode {
    Split { feature: usize, threshold: f64, left: usize, right: usize },
    Leaf { value: Prediction },
}

/// Binary tree stored as a flat node table rooted at index 0. A row goes left
/// when `x[feature] <= threshold`.
#[derive(Debug, Deserialize)]
pub(crate) struct DecisionTree {
    n_features: usize,
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    // children must sit after their parent, so every walk terminates
    fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 { return Err("n_features must be positive".into()); }
        if self.nodes.is_empty() { return Err("tree has no nodes".into()); }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { feature, threshold, left, right } = node {
                if *feature >= self.n_features {
                    return Err(format!("node {i} splits on feature {feature}, tree has {}", self.n_features));
                }
                if !threshold.is_finite() { return Err(format!("node {i} has a non-finite threshold")); }
                for child in [*left, *right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!("node {i} has invalid child index {child}"));
                    }
                }
            }
        }
        Ok(())
    }

    fn walk(&self, x: &[f64]) -> Prediction {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split { feature, threshold, left, right } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => return value.clone(),
            }
        }
    }
}

impl Model for DecisionTree {
    fn format(&self) -> &'static str { "decision_tree" }
    fn arity(&self) -> usize { self.n_features }
    fn predict(&self, rows: &[FeatureVector]) -> anyhow::Result<Vec<Prediction>> {
        Ok(rows.iter().map(|r| self.walk(r.values())).collect())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinearModel {
    weights: Vec<f64>,
    #[serde(default)]
    bias: f64,
}

impl LinearModel {
    fn validate(&self) -> Result<(), String> {
        if self.weights.is_empty() { return Err("weights must not be empty".into()); }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err("weights and bias must be finite".into());
        }
        Ok(())
    }
}

impl Model for LinearModel {
    fn format(&self) -> &'static str { "linear" }
    fn arity(&self) -> usize { self.weights.len() }
    fn predict(&self, rows: &[FeatureVector]) -> anyhow::Result<Vec<Prediction>> {
        Ok(rows
            .iter()
            .map(|r| Prediction::Value(r.values().iter().zip(&self.weights).map(|(x, w)| x * w).sum::<f64>() + self.bias))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IRIS: &str = r#"{
        "format": "decision_tree",
        "n_features": 4,
        "nodes": [
            {"feature": 2, "threshold": 2.45, "left": 1, "right": 2},
            {"value": "setosa"},
            {"feature": 3, "threshold": 1.75, "left": 3, "right": 4},
            {"value": "versicolor"},
            {"value": "virginica"}
        ]
    }"#;

    fn load(body: &str) -> Result<Box<dyn Model>, ArtifactError> {
        from_json(Path::new("model.json"), body.as_bytes())
    }

    fn rows(data: &[[f64; 4]]) -> Vec<FeatureVector> {
        data.iter().map(|r| FeatureVector::new(r.to_vec())).collect()
    }

    #[test]
    fn iris_tree_routes_rows() {
        let model = load(IRIS).unwrap();
        assert_eq!(model.arity(), 4);
        let out = model.predict(&rows(&[[5.1, 3.5, 1.4, 0.2], [6.0, 2.7, 5.1, 1.6], [6.3, 3.3, 6.0, 2.5]])).unwrap();
        assert_eq!(out, vec![
            Prediction::Label("setosa".into()),
            Prediction::Label("versicolor".into()),
            Prediction::Label("virginica".into()),
        ]);
    }

    #[test]
    fn tree_child_must_follow_parent() {
        let body = r#"{"format":"decision_tree","n_features":1,"nodes":[{"feature":0,"threshold":1.0,"left":0,"right":1},{"value":1}]}"#;
        assert!(matches!(load(body), Err(ArtifactError::Invalid { format: "decision_tree", .. })));
    }

    #[test]
    fn tree_feature_out_of_range() {
        let body = r#"{"format":"decision_tree","n_features":2,"nodes":[{"feature":5,"threshold":1.0,"left":1,"right":2},{"value":0},{"value":1}]}"#;
        assert!(matches!(load(body), Err(ArtifactError::Invalid { .. })));
    }

    #[test]
    fn unknown_format_tag() {
        let body = r#"{"format":"random_forest","trees":[]}"#;
        assert!(matches!(load(body), Err(ArtifactError::UnrecognizedFormat { .. })));
    }

    #[test]
    fn linear_requires_weights() {
        assert!(matches!(load(r#"{"format":"linear","weights":[]}"#), Err(ArtifactError::Invalid { format: "linear", .. })));
    }

    #[test]
    fn invalid_artifact_names_its_path() {
        let err = load(r#"{"format":"decision_tree","n_features":1,"nodes":[]}"#).err().unwrap();
        assert_eq!(err.to_string(), "invalid decision_tree artifact model.json: tree has no nodes");
    }
}
