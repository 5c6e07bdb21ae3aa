use landscape_vit_prep::camera::{CropBox, Intrinsics, Resolution};
use landscape_vit_prep::config::crop::load_config;
use landscape_vit_prep::cropping::{prepare_view, View};
use landscape_vit_prep::image::io::{
    load_depth_png, load_image, save_depth_png, save_image, write_json_file,
};
use landscape_vit_prep::orientation::Orientation;
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let image = load_image(&config.input).map_err(|e| e.to_string())?;
    let mut view = View::new(image, config.intrinsics);
    if let Some(depth) = &config.depth {
        let depth = load_depth_png(&depth.path, depth.scale).map_err(|e| e.to_string())?;
        view = view.with_depth(depth);
    }

    let prepared = prepare_view(view, &config.prepare).map_err(|e| e.to_string())?;
    let image = prepared
        .images
        .clone()
        .into_single()
        .ok_or("Expected a single prepared image")?;
    save_image(&image, &config.output.image).map_err(|e| e.to_string())?;

    if let (Some(depth), Some(path)) = (&prepared.depth, &config.output.depth) {
        let scale = config.depth.as_ref().map_or(0.001, |d| d.scale);
        save_depth_png(depth, path, scale).map_err(|e| e.to_string())?;
        println!("Saved depth to {}", path.display());
    }

    let summary = CropSummary {
        input_intrinsics: config.intrinsics,
        intrinsics: prepared.intrinsics,
        resolution: prepared.resolution,
        orientation: prepared.orientation,
        centre_crop: prepared.centre_crop,
        final_crop: prepared.final_crop,
        scale: prepared.scale,
    };
    write_json_file(&config.output.summary_json, &summary).map_err(|e| e.to_string())?;

    println!(
        "Saved {}x{} {:?} view to {}",
        prepared.resolution.width,
        prepared.resolution.height,
        prepared.orientation,
        config.output.image.display()
    );
    println!("Saved summary to {}", config.output.summary_json.display());
    Ok(())
}

fn usage() -> String {
    "Usage: crop_view <config.json>".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CropSummary {
    input_intrinsics: Intrinsics,
    intrinsics: Intrinsics,
    resolution: Resolution,
    orientation: Orientation,
    centre_crop: Option<CropBox>,
    final_crop: CropBox,
    scale: f64,
}
