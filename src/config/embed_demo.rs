use crate::embed::PatchEmbedConfig;
use crate::orientation::ImageShape;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EmbedDemoConfig {
    pub embed: PatchEmbedConfig,
    /// True `(height, width)` of each synthetic sample.
    pub true_shapes: Vec<ImageShape>,
    /// Route portrait samples through the transposed frame.
    pub route: bool,
}

impl Default for EmbedDemoConfig {
    fn default() -> Self {
        Self {
            embed: PatchEmbedConfig {
                img_size: [384, 512],
                embed_dim: 64,
                ..Default::default()
            },
            true_shapes: vec![
                ImageShape::new(384, 512),
                ImageShape::new(512, 384),
                ImageShape::new(384, 512),
            ],
            route: true,
        }
    }
}

pub fn load_config(path: &Path) -> Result<EmbedDemoConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
