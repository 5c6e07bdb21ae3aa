//! Per-sample true shapes and the landscape/portrait partition of a batch.
use serde::{Deserialize, Serialize};

/// Actual `(height, width)` of one sample, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageShape {
    pub height: usize,
    pub width: usize,
}

impl ImageShape {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::of(self.width, self.height)
    }

    pub fn transposed(&self) -> Self {
        Self {
            height: self.width,
            width: self.height,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// `width >= height`; squares count as landscape.
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn of(width: usize, height: usize) -> Self {
        if width >= height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Batch indices grouped by orientation, each list in batch order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrientationSplit {
    pub landscape: Vec<usize>,
    pub portrait: Vec<usize>,
}

impl OrientationSplit {
    pub fn new(shapes: &[ImageShape]) -> Self {
        let mut split = Self::default();
        for (i, shape) in shapes.iter().enumerate() {
            match shape.orientation() {
                Orientation::Landscape => split.landscape.push(i),
                Orientation::Portrait => split.portrait.push(i),
            }
        }
        split
    }

    pub fn len(&self) -> usize {
        self.landscape.len() + self.portrait.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all_landscape(&self) -> bool {
        self.portrait.is_empty()
    }

    pub fn all_portrait(&self) -> bool {
        self.landscape.is_empty()
    }

    pub fn is_mixed(&self) -> bool {
        !self.landscape.is_empty() && !self.portrait.is_empty()
    }
}

/// `(H, W)` of the canonical landscape frame: smallest and largest dimension
/// over every sample in the batch.
pub fn landscape_dims(shapes: &[ImageShape]) -> Option<(usize, usize)> {
    let min = shapes.iter().map(|s| s.height.min(s.width)).min()?;
    let max = shapes.iter().map(|s| s.height.max(s.width)).max()?;
    Some((min, max))
}
