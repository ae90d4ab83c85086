//! A small MLP policy loaded from JSON.
//!
//! The file holds `{"layers": [...]}` where each layer is one of
//! `{"type": "linear", "weight": [[..]], "bias": [..]}` (weight indexed
//! `[input][output]`), `{"type": "relu"}` or
//! `{"type": "layernorm", "weight": [..], "bias": [..]}`.

use super::{MoveScorer, ScorerError};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, instrument};
use ultimate_tictactoe::encoding::{MOVE_DIM, STATE_DIM};

const LAYER_NORM_EPS: f32 = 1e-5;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Layer {
    Linear { weight: Vec<Vec<f32>>, bias: Vec<f32> },
    Relu,
    Layernorm { weight: Vec<f32>, bias: Vec<f32> },
}

#[derive(Debug, Clone, Deserialize)]
struct RawModel {
    layers: Vec<Layer>,
}

/// A feed-forward policy network mapping 101 inputs to 81 scores.
#[derive(Debug, Clone)]
pub struct PolicyModel {
    layers: Vec<Layer>,
}

impl PolicyModel {
    /// Parses and shape-checks a model.
    ///
    /// # Errors
    ///
    /// Returns [`ScorerError::Json`] for malformed JSON and
    /// [`ScorerError::Shape`] when layer sizes do not chain from 101
    /// inputs to 81 outputs.
    #[instrument(skip(json), fields(bytes = json.len()))]
    pub fn from_json(json: &str) -> Result<Self, ScorerError> {
        let raw: RawModel = serde_json::from_str(json)?;
        let mut width = STATE_DIM;
        for (i, layer) in raw.layers.iter().enumerate() {
            width = match layer {
                Layer::Linear { weight, bias } => {
                    if weight.len() != width {
                        return Err(shape(i, format!("{} weight rows for width {}", weight.len(), width)));
                    }
                    if let Some(row) = weight.iter().find(|row| row.len() != bias.len()) {
                        return Err(shape(i, format!("weight row of {} for {} outputs", row.len(), bias.len())));
                    }
                    bias.len()
                }
                Layer::Relu => width,
                Layer::Layernorm { weight, bias } => {
                    if weight.len() != width || bias.len() != width {
                        return Err(shape(i, format!("layernorm of {}/{} for width {}", weight.len(), bias.len(), width)));
                    }
                    width
                }
            };
        }
        if width != MOVE_DIM {
            return Err(ScorerError::Shape {
                detail: format!("model outputs {} scores, expected {}", width, MOVE_DIM),
            });
        }
        info!(layers = raw.layers.len(), "Policy model loaded");
        Ok(Self { layers: raw.layers })
    }

    /// Reads and parses a model file.
    ///
    /// # Errors
    ///
    /// Returns [`ScorerError`] when the file is unreadable or invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScorerError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Runs the network.
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut x = input.to_vec();
        for layer in &self.layers {
            x = match layer {
                Layer::Linear { weight, bias } => bias
                    .iter()
                    .enumerate()
                    .map(|(j, b)| b + x.iter().zip(weight).map(|(v, row)| v * row[j]).sum::<f32>())
                    .collect(),
                Layer::Relu => x.into_iter().map(|v| v.max(0.0)).collect(),
                Layer::Layernorm { weight, bias } => {
                    let n = x.len() as f32;
                    let mean = x.iter().sum::<f32>() / n;
                    let variance = x.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
                    let std = (variance + LAYER_NORM_EPS).sqrt();
                    x.iter()
                        .zip(weight.iter().zip(bias))
                        .map(|(v, (w, b))| (v - mean) / std * w + b)
                        .collect()
                }
            };
        }
        x
    }
}

fn shape(layer: usize, detail: String) -> ScorerError {
    debug!(layer, %detail, "Layer shape mismatch");
    ScorerError::Shape {
        detail: format!("layer {}: {}", layer, detail),
    }
}

impl MoveScorer for PolicyModel {
    fn score(&self, encoded: &[f32; STATE_DIM]) -> Result<Vec<f32>, ScorerError> {
        Ok(self.forward(encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A single linear layer scoring cell `target` by input `source`.
    fn shaped_model(source: usize, target: usize) -> serde_json::Value {
        let mut weight = vec![vec![0.0f32; MOVE_DIM]; STATE_DIM];
        weight[source][target] = 2.0;
        let mut bias = vec![0.0f32; MOVE_DIM];
        bias[0] = 0.5;
        json!({ "layers": [{ "type": "linear", "weight": weight, "bias": bias }] })
    }

    #[test]
    fn test_linear_uses_input_major_weights() {
        let model = PolicyModel::from_json(&shaped_model(90, 40).to_string()).unwrap();
        let mut input = [0.0; STATE_DIM];
        input[90] = 1.5;
        let out = model.forward(&input);
        assert_eq!(out.len(), MOVE_DIM);
        assert_eq!(out[40], 3.0);
        assert_eq!(out[0], 0.5);
    }

    #[test]
    fn test_relu_and_layernorm() {
        let mut value = shaped_model(0, 0);
        value["layers"]
            .as_array_mut()
            .unwrap()
            .extend([
                json!({ "type": "relu" }),
                json!({ "type": "layernorm", "weight": vec![1.0; MOVE_DIM], "bias": vec![0.0; MOVE_DIM] }),
            ]);
        let model = PolicyModel::from_json(&value.to_string()).unwrap();
        let out = model.forward(&[0.0; STATE_DIM]);
        let mean = out.iter().sum::<f32>() / MOVE_DIM as f32;
        assert!(mean.abs() < 1e-4);
        // Only index 0 carries the bias, so it ranks first.
        assert!(out[0] > out[1]);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let bad = json!({ "layers": [{ "type": "linear", "weight": [[1.0]], "bias": [0.0] }] });
        assert!(matches!(
            PolicyModel::from_json(&bad.to_string()),
            Err(ScorerError::Shape { .. })
        ));
        let empty = json!({ "layers": [] });
        assert!(matches!(
            PolicyModel::from_json(&empty.to_string()),
            Err(ScorerError::Shape { .. })
        ));
        assert!(matches!(
            PolicyModel::from_json("{"),
            Err(ScorerError::Json(_))
        ));
    }
}
