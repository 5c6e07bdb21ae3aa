use crate::error::{Error, Result};
use ndarray::{Array1, Array3, Axis};

pub const DEFAULT_LAYER_NORM_EPS: f32 = 1e-6;

/// Layer normalisation over the embedding (last) axis.
#[derive(Clone, Debug)]
pub struct LayerNorm {
    weight: Array1<f32>,
    bias: Array1<f32>,
    eps: f32,
}

impl LayerNorm {
    /// Unit scale, zero shift.
    pub fn new(dim: usize, eps: f32) -> Self {
        Self {
            weight: Array1::ones(dim),
            bias: Array1::zeros(dim),
            eps,
        }
    }

    pub fn with_params(weight: Array1<f32>, bias: Array1<f32>, eps: f32) -> Result<Self> {
        if weight.len() != bias.len() {
            return Err(Error::InvalidWeights {
                found: vec![weight.len(), bias.len()],
                reason: "layer norm weight and bias must have equal length",
            });
        }
        Ok(Self { weight, bias, eps })
    }

    pub fn dim(&self) -> usize {
        self.weight.len()
    }

    pub fn eps(&self) -> f32 {
        self.eps
    }

    /// Normalise every `[.., .., D]` lane in place.
    pub fn apply(&self, x: &mut Array3<f32>) {
        let d = x.len_of(Axis(2));
        if d == 0 {
            return;
        }
        for mut lane in x.lanes_mut(Axis(2)) {
            let mean = lane.sum() / d as f32;
            let var = lane.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / d as f32;
            let inv = 1.0 / (var + self.eps).sqrt();
            for ((v, g), b) in lane.iter_mut().zip(&self.weight).zip(&self.bias) {
                *v = (*v - mean) * inv * g + b;
            }
        }
    }
}
