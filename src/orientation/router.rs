//! Landscape routing around a prediction head.
//!
//! Heads are written for one canonical landscape frame `(H, W)` with
//! `W >= H`. Portrait samples are run through the same head in the
//! transposed frame `(W, H)` and their spatial outputs are transposed back,
//! so the caller always receives maps laid out in the landscape frame and in
//! original batch order.
use super::shape::{landscape_dims, ImageShape, OrientationSplit};
use crate::error::{Error, Result};
use crate::tensor::{gather_rows, scatter_rows};
use log::debug;
use ndarray::{Array3, ArrayD, IxDyn};
use std::collections::{BTreeMap, BTreeSet};

/// Output name that marks a head result as orientation independent.
pub const POSE_KEY: &str = "pose";

/// Named head outputs; every array carries the batch on axis 0.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadOutput {
    outputs: BTreeMap<String, ArrayD<f32>>,
}

impl HeadOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArrayD<f32>) -> Option<ArrayD<f32>> {
        self.outputs.insert(name.into(), value)
    }

    pub fn with(mut self, name: impl Into<String>, value: ArrayD<f32>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.outputs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArrayD<f32>)> {
        self.outputs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, ArrayD<f32>> {
        self.outputs
    }
}

impl FromIterator<(String, ArrayD<f32>)> for HeadOutput {
    fn from_iter<I: IntoIterator<Item = (String, ArrayD<f32>)>>(iter: I) -> Self {
        Self {
            outputs: iter.into_iter().collect(),
        }
    }
}

/// A network head evaluated on decoder tokens.
///
/// `tokens` holds one `[B, N, D]` array per decoder layer the head consumes;
/// `shape` is the `(H, W)` pixel frame in which the tokens were produced.
pub trait PredictionHead {
    fn predict(&self, tokens: &[Array3<f32>], shape: (usize, usize)) -> Result<HeadOutput>;
}

impl<F> PredictionHead for F
where
    F: Fn(&[Array3<f32>], (usize, usize)) -> Result<HeadOutput>,
{
    fn predict(&self, tokens: &[Array3<f32>], shape: (usize, usize)) -> Result<HeadOutput> {
        self(tokens, shape)
    }
}

/// Swap axes 1 and 2 of every output, unless the outputs contain a pose.
pub fn transposed(out: HeadOutput) -> Result<HeadOutput> {
    if out.contains(POSE_KEY) {
        return Ok(out);
    }
    out.outputs
        .into_iter()
        .map(|(name, mut value)| {
            if value.ndim() < 3 {
                return Err(Error::NotSpatial {
                    name,
                    ndim: value.ndim(),
                });
            }
            value.swap_axes(1, 2);
            Ok((name, value))
        })
        .collect()
}

/// Runs a [`PredictionHead`] in the orientation each sample actually has.
pub struct LandscapeRouter<H> {
    head: H,
    activate: bool,
}

impl<H: PredictionHead> LandscapeRouter<H> {
    /// With `activate == false` the router is a passthrough that requires a
    /// batch of identical true shapes.
    pub fn new(head: H, activate: bool) -> Self {
        Self { head, activate }
    }

    pub fn head(&self) -> &H {
        &self.head
    }

    pub fn is_active(&self) -> bool {
        self.activate
    }

    pub fn predict(
        &self,
        tokens: &[Array3<f32>],
        true_shape: &[ImageShape],
    ) -> Result<HeadOutput> {
        if true_shape.is_empty() {
            return Err(Error::EmptyBatch);
        }
        for t in tokens {
            let batch = t.len_of(ndarray::Axis(0));
            if batch != true_shape.len() {
                return Err(Error::TrueShapeMismatch {
                    batch,
                    found: true_shape.len(),
                });
            }
        }
        if self.activate {
            self.predict_routed(tokens, true_shape)
        } else {
            self.predict_uniform(tokens, true_shape)
        }
    }

    fn predict_uniform(
        &self,
        tokens: &[Array3<f32>],
        true_shape: &[ImageShape],
    ) -> Result<HeadOutput> {
        let first = true_shape[0];
        if true_shape.iter().any(|s| *s != first) {
            return Err(Error::HeterogeneousShapes);
        }
        self.head.predict(tokens, (first.height, first.width))
    }

    fn predict_routed(
        &self,
        tokens: &[Array3<f32>],
        true_shape: &[ImageShape],
    ) -> Result<HeadOutput> {
        let (h, w) = landscape_dims(true_shape).ok_or(Error::EmptyBatch)?;
        let split = OrientationSplit::new(true_shape);

        if split.all_landscape() {
            debug!("router: {} landscape samples", split.landscape.len());
            return self.head.predict(tokens, (h, w));
        }
        if split.all_portrait() {
            debug!("router: {} portrait samples", split.portrait.len());
            return transposed(self.head.predict(tokens, (w, h))?);
        }

        debug!(
            "router: mixed batch, {} landscape / {} portrait",
            split.landscape.len(),
            split.portrait.len()
        );
        let land_tokens = select_tokens(tokens, &split.landscape)?;
        let port_tokens = select_tokens(tokens, &split.portrait)?;
        let land = self.head.predict(&land_tokens, (h, w))?;
        let port = transposed(self.head.predict(&port_tokens, (w, h))?)?;
        recompose(true_shape.len(), &split, land, port)
    }
}

fn select_tokens(tokens: &[Array3<f32>], indices: &[usize]) -> Result<Vec<Array3<f32>>> {
    tokens.iter().map(|t| gather_rows(t, indices)).collect()
}

/// Stitch the landscape and portrait sub-results into `[batch, ...]` arrays.
fn recompose(
    batch: usize,
    split: &OrientationSplit,
    land: HeadOutput,
    port: HeadOutput,
) -> Result<HeadOutput> {
    let names: BTreeSet<String> = land.keys().chain(port.keys()).map(str::to_owned).collect();
    let mut result = HeadOutput::new();
    for name in names {
        let l = land
            .get(&name)
            .ok_or_else(|| Error::MissingOutput(name.clone()))?;
        let p = port
            .get(&name)
            .ok_or_else(|| Error::MissingOutput(name.clone()))?;
        if l.shape()[1..] != p.shape()[1..] {
            return Err(Error::OutputShapeMismatch {
                name,
                expected: l.shape()[1..].to_vec(),
                found: p.shape()[1..].to_vec(),
            });
        }
        let mut dims = l.shape().to_vec();
        dims[0] = batch;
        let mut full = ArrayD::<f32>::zeros(IxDyn(&dims));
        scatter_rows(&mut full, &split.landscape, l)?;
        scatter_rows(&mut full, &split.portrait, p)?;
        result.insert(name, full);
    }
    Ok(result)
}
