use crate::camera::Intrinsics;
use crate::cropping::PrepareOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
pub struct CropToolConfig {
    pub input: PathBuf,
    /// 3x3 camera matrix, row-major, OpenCV pixel convention.
    pub intrinsics: Intrinsics,
    #[serde(default)]
    pub depth: Option<DepthInputConfig>,
    #[serde(default)]
    pub prepare: PrepareOptions,
    pub output: CropOutputConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DepthInputConfig {
    pub path: PathBuf,
    /// Metres per stored 16-bit unit.
    #[serde(default = "default_depth_scale")]
    pub scale: f32,
}

fn default_depth_scale() -> f32 {
    0.001
}

#[derive(Clone, Debug, Deserialize)]
pub struct CropOutputConfig {
    pub image: PathBuf,
    #[serde(default)]
    pub depth: Option<PathBuf>,
    pub summary_json: PathBuf,
}

pub fn load_config(path: &Path) -> Result<CropToolConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Resolution;

    #[test]
    fn minimal_config_fills_defaults() {
        let json = r#"{
            "input": "view.jpg",
            "intrinsics": [[500.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]],
            "depth": { "path": "depth.png" },
            "prepare": { "resolution": { "width": 224, "height": 224 } },
            "output": { "image": "out.png", "summary_json": "out.json" }
        }"#;
        let config: CropToolConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.intrinsics.principal_point(), [320.0, 240.0]);
        assert_eq!(config.prepare.resolution, Resolution::new(224, 224));
        assert_eq!(config.prepare.portrait_ratio, 1.1);
        assert_eq!(config.depth.unwrap().scale, 0.001);
        assert!(config.output.depth.is_none());
    }
}
