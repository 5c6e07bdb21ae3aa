mod common;

use common::synthetic_image::coded_chw;
use approx::assert_abs_diff_eq;
use landscape_vit_prep::embed::{
    LayerNorm, ManyArPatchEmbed, PatchEmbed, PatchEmbedConfig, PatchProjection,
    DEFAULT_LAYER_NORM_EPS,
};
use landscape_vit_prep::orientation::{HeadOutput, ImageShape, LandscapeRouter, PredictionHead};
use landscape_vit_prep::Result;
use ndarray::{s, Array1, Array3, Array4, ArrayD, Axis, IxDyn};

const C: usize = 2;
const P: usize = 2;

fn config(img_size: [usize; 2]) -> PatchEmbedConfig {
    PatchEmbedConfig {
        img_size,
        patch_size: P,
        in_chans: C,
        embed_dim: C * P * P,
        norm_eps: None,
    }
}

// token component `c*p*p + ky*p + kx` is pixel (ky, kx) of channel c
fn unfold_projection() -> PatchProjection {
    PatchProjection::from_fn(C, C * P * P, P, |d, c, ky, kx| {
        if d == c * P * P + ky * P + kx {
            1.0
        } else {
            0.0
        }
    })
    .unwrap()
}

/// Rebuilds channel 0 from unfolded tokens in the frame the head is given.
struct UnpatchifyHead;

impl PredictionHead for UnpatchifyHead {
    fn predict(&self, tokens: &[Array3<f32>], (h, w): (usize, usize)) -> Result<HeadOutput> {
        let t = &tokens[0];
        let b = t.len_of(Axis(0));
        let gw = w / P;
        let map = ArrayD::from_shape_fn(IxDyn(&[b, h, w]), |idx| {
            let (i, y, x) = (idx[0], idx[1], idx[2]);
            t[[i, (y / P) * gw + x / P, (y % P) * P + x % P]]
        });
        Ok(HeadOutput::new().with("channel0", map))
    }
}

/// Landscape batch tensor; portrait samples are stored transposed.
fn landscape_batch(samples: &[Array3<f32>], h: usize, w: usize) -> Array4<f32> {
    let mut batch = Array4::<f32>::zeros((samples.len(), C, h, w));
    for (i, sample) in samples.iter().enumerate() {
        let (_, sh, _) = sample.dim();
        let mut view = sample.view();
        if sh != h {
            view.swap_axes(1, 2);
        }
        batch.slice_mut(s![i, .., .., ..]).assign(&view);
    }
    batch
}

#[test]
fn portrait_sample_matches_embedding_in_true_orientation() {
    let portrait = coded_chw(C, 8, 4);
    let batch = landscape_batch(&[portrait.clone()], 4, 8);

    let many = ManyArPatchEmbed::new(config([4, 8]), unfold_projection()).unwrap();
    let (tokens, pos) = many
        .forward(batch.view(), &[ImageShape::new(8, 4)])
        .unwrap();

    let fixed = PatchEmbed::new(config([8, 4]), unfold_projection()).unwrap();
    let reference = portrait.insert_axis(Axis(0));
    let (ref_tokens, ref_pos) = fixed.forward(reference.view()).unwrap();

    assert_eq!(tokens, ref_tokens);
    assert_eq!(pos, ref_pos);
}

#[test]
fn mixed_batch_embeds_each_sample_in_its_own_orientation() {
    let landscape = coded_chw(C, 4, 8);
    let portrait = coded_chw(C, 8, 4).mapv(|v| v + 0.5);
    let batch = landscape_batch(&[portrait.clone(), landscape.clone()], 4, 8);
    let shapes = [ImageShape::new(8, 4), ImageShape::new(4, 8)];

    let many = ManyArPatchEmbed::new(config([4, 8]), unfold_projection()).unwrap();
    let (tokens, pos) = many.forward(batch.view(), &shapes).unwrap();

    let land_ref = PatchEmbed::new(config([4, 8]), unfold_projection())
        .unwrap()
        .forward(landscape.insert_axis(Axis(0)).view())
        .unwrap();
    let port_ref = PatchEmbed::new(config([8, 4]), unfold_projection())
        .unwrap()
        .forward(portrait.insert_axis(Axis(0)).view())
        .unwrap();

    assert_eq!(tokens.index_axis(Axis(0), 0), port_ref.0.index_axis(Axis(0), 0));
    assert_eq!(tokens.index_axis(Axis(0), 1), land_ref.0.index_axis(Axis(0), 0));
    assert_eq!(pos.index_axis(Axis(0), 0), port_ref.1.index_axis(Axis(0), 0));
    assert_eq!(pos.index_axis(Axis(0), 1), land_ref.1.index_axis(Axis(0), 0));
}

#[test]
fn routed_outputs_line_up_with_the_landscape_batch() {
    let samples = vec![
        coded_chw(C, 4, 8),
        coded_chw(C, 8, 4).mapv(|v| -v),
        coded_chw(C, 8, 4).mapv(|v| v * 2.0),
        coded_chw(C, 4, 8).mapv(|v| v + 7.0),
    ];
    let shapes: Vec<ImageShape> = samples
        .iter()
        .map(|s| ImageShape::new(s.dim().1, s.dim().2))
        .collect();
    let batch = landscape_batch(&samples, 4, 8);

    let many = ManyArPatchEmbed::new(config([4, 8]), unfold_projection()).unwrap();
    let (tokens, _) = many.forward(batch.view(), &shapes).unwrap();

    let router = LandscapeRouter::new(UnpatchifyHead, true);
    let out = router.predict(&[tokens], &shapes).unwrap();
    let rebuilt = out.get("channel0").unwrap();

    assert_eq!(rebuilt.shape(), &[4, 4, 8]);
    let expected = batch.index_axis(Axis(1), 0).into_dyn();
    assert_eq!(rebuilt, &expected);
}

#[test]
fn all_portrait_batch_takes_the_transposed_path() {
    let samples = vec![coded_chw(C, 8, 4), coded_chw(C, 8, 4).mapv(|v| v + 1.0)];
    let shapes = vec![ImageShape::new(8, 4); 2];
    let batch = landscape_batch(&samples, 4, 8);

    let many = ManyArPatchEmbed::new(config([4, 8]), unfold_projection()).unwrap();
    let (tokens, _) = many.forward(batch.view(), &shapes).unwrap();
    let out = LandscapeRouter::new(UnpatchifyHead, true)
        .predict(&[tokens], &shapes)
        .unwrap();
    let expected = batch.index_axis(Axis(1), 0).into_dyn();
    assert_eq!(out.get("channel0").unwrap(), &expected);
}

#[test]
fn layer_norm_standardises_tokens_of_both_orientations() {
    let samples = vec![
        coded_chw(C, 4, 8),
        coded_chw(C, 8, 4).mapv(|v| v * 0.5 + 3.0),
    ];
    let shapes = [ImageShape::new(4, 8), ImageShape::new(8, 4)];
    let batch = landscape_batch(&samples, 4, 8);

    let dim = C * P * P;
    let gamma = Array1::from_shape_fn(dim, |k| 0.5 + 0.25 * k as f32);
    let beta = Array1::from_shape_fn(dim, |k| k as f32 - 2.0);
    let norm =
        LayerNorm::with_params(gamma.clone(), beta.clone(), DEFAULT_LAYER_NORM_EPS).unwrap();

    let plain = ManyArPatchEmbed::new(config([4, 8]), unfold_projection()).unwrap();
    let normed = ManyArPatchEmbed::from_embed(
        PatchEmbed::new(config([4, 8]).with_layer_norm(), unfold_projection())
            .unwrap()
            .with_norm(norm.clone())
            .unwrap(),
    );
    let (raw, _) = plain.forward(batch.view(), &shapes).unwrap();
    let (tokens, _) = normed.forward(batch.view(), &shapes).unwrap();

    let mut expected = raw.clone();
    norm.apply(&mut expected);
    assert_eq!(tokens, expected);

    for lane in tokens.lanes(Axis(2)) {
        let unit: Vec<f32> = lane
            .iter()
            .zip(gamma.iter().zip(&beta))
            .map(|(v, (g, b))| (v - b) / g)
            .collect();
        let mean = unit.iter().sum::<f32>() / dim as f32;
        let var = unit.iter().map(|u| (u - mean) * (u - mean)).sum::<f32>() / dim as f32;
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(var, 1.0, epsilon = 1e-3);
    }
}

#[test]
fn norm_of_the_wrong_width_is_rejected() {
    let embed = PatchEmbed::new(config([4, 8]).with_layer_norm(), unfold_projection()).unwrap();
    let norm = LayerNorm::new(C * P * P + 1, DEFAULT_LAYER_NORM_EPS);
    assert!(embed.with_norm(norm).is_err());
}
