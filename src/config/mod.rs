//! JSON configuration for the command-line tools.
pub mod crop;
pub mod embed_demo;
