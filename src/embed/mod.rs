//! Patch embedding layers and their building blocks.
mod norm;
mod patch_embed;
mod position;
mod projection;

pub use norm::{LayerNorm, DEFAULT_LAYER_NORM_EPS};
pub use patch_embed::{ManyArPatchEmbed, PatchEmbed, PatchEmbedConfig};
pub use position::PositionGetter;
pub use projection::PatchProjection;
