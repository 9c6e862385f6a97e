//! Parses `/predict` bodies into a [`PredictionBatch`].
//!
//! Only the shape of the request is checked here. Whether the row width fits
//! the loaded model is the scorer's call and surfaces as a different error.

use serde_json::Value;
use thiserror::Error;

use crate::batch::{FeatureVector, PredictionBatch, ShapeError};
use crate::error::ErrorKind;

const INSTANCES: &str = "instances";
const PARAMETERS: &str = "parameters";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("request body is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),
    #[error("{0}")]
    Shape(String),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::MalformedJson(_) => ErrorKind::MalformedJson,
            ValidationError::MissingField(_) => ErrorKind::MissingField,
            ValidationError::Shape(_) => ErrorKind::ShapeError,
        }
    }
}

impl From<ShapeError> for ValidationError {
    fn from(e: ShapeError) -> Self {
        match e {
            ShapeError::Empty => ValidationError::Shape("`instances` must contain at least one instance".into()),
            ShapeError::Ragged { .. } => ValidationError::Shape(e.to_string()),
        }
    }
}

/// Turns a raw request body into a validated batch. Pure; never consults the model.
pub fn parse(raw: &[u8]) -> Result<PredictionBatch, ValidationError> {
    let body: Value = serde_json::from_slice(raw).map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
    let obj = body.as_object().ok_or(ValidationError::MissingField(INSTANCES))?;
    let instances = obj.get(INSTANCES).ok_or(ValidationError::MissingField(INSTANCES))?;
    if let Some(params) = obj.get(PARAMETERS) {
        if !params.is_object() {
            return Err(ValidationError::Shape("`parameters` must be an object".into()));
        }
    }
    let rows = instances
        .as_array()
        .ok_or_else(|| ValidationError::Shape("`instances` must be an array of arrays".into()))?;
    let vectors = rows.iter().enumerate().map(|(i, row)| to_vector(i, row)).collect::<Result<Vec<_>, _>>()?;
    Ok(PredictionBatch::new(vectors)?)
}

fn to_vector(index: usize, row: &Value) -> Result<FeatureVector, ValidationError> {
    let cells = row
        .as_array()
        .ok_or_else(|| ValidationError::Shape(format!("instance {index} is not an array")))?;
    let values = cells
        .iter()
        .enumerate()
        .map(|(j, v)| v.as_f64().ok_or_else(|| ValidationError::Shape(format!("instance {index} feature {j} is not a number"))))
        .collect::<Result<Vec<f64>, _>>()?;
    Ok(FeatureVector::new(values))
}
