use landscape_vit_prep::config::embed_demo::{load_config, EmbedDemoConfig};
use landscape_vit_prep::orientation::landscape_dims;
use landscape_vit_prep::prelude::*;
use landscape_vit_prep::{Error, Result};
use ndarray::{Array3, Array4, ArrayD, Axis, IxDyn};
use std::env;
use std::path::Path;

/// Per-pixel map from the mean token activation of the last decoder layer.
struct MeanTokenHead {
    patch: usize,
}

impl PredictionHead for MeanTokenHead {
    fn predict(&self, tokens: &[Array3<f32>], (h, w): (usize, usize)) -> Result<HeadOutput> {
        let last = tokens.last().ok_or(Error::EmptyBatch)?;
        let (b, n, _) = last.dim();
        let gw = w / self.patch;
        let means = last.mean_axis(Axis(2)).ok_or(Error::EmptyBatch)?;
        let map = ArrayD::from_shape_fn(IxDyn(&[b, h, w]), |idx| {
            let t = (idx[1] / self.patch) * gw + idx[2] / self.patch;
            if t < n {
                means[[idx[0], t]]
            } else {
                0.0
            }
        });
        Ok(HeadOutput::new().with("mean_activation", map))
    }
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> std::result::Result<(), String> {
    let config = match env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => EmbedDemoConfig::default(),
    };
    demo(&config).map_err(|e| e.to_string())
}

fn demo(config: &EmbedDemoConfig) -> Result<()> {
    let embed_cfg = &config.embed;
    let shapes = &config.true_shapes;
    let (h, w) = landscape_dims(shapes).ok_or(Error::EmptyBatch)?;
    let c = embed_cfg.in_chans;

    // Portrait samples are stored transposed inside the landscape batch.
    let batch = Array4::from_shape_fn((shapes.len(), c, h, w), |(i, ch, y, x)| {
        let (yy, xx) = if shapes[i].height > shapes[i].width {
            (x, y)
        } else {
            (y, x)
        };
        ((ch + 1) * (yy + 2 * xx)) as f32 / (h + 2 * w) as f32
    });

    let proj = PatchProjection::from_fn(
        c,
        embed_cfg.embed_dim,
        embed_cfg.patch_size,
        |d, ch, ky, kx| ((d * 7 + ch * 3 + ky + kx) % 5) as f32 * 1e-2,
    )?;
    let embed = ManyArPatchEmbed::new(embed_cfg.clone(), proj)?;
    let (tokens, pos) = embed.forward(batch.view(), shapes)?;
    println!("tokens={:?} positions={:?}", tokens.dim(), pos.dim());

    let router = LandscapeRouter::new(
        MeanTokenHead {
            patch: embed_cfg.patch_size,
        },
        config.route,
    );
    let out = router.predict(&[tokens], shapes)?;
    for (name, value) in out.iter() {
        println!("{name}: shape={:?}", value.shape());
    }
    Ok(())
}
