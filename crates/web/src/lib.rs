//! Web build helpers for deploid
//!
//! - Framework presets (build command and output directory per framework)
//! - Running the configured build and checking its output
//! - Bundle size report over the output directory

pub mod build;
pub mod bundle;
pub mod presets;

pub use build::build_web;
pub use bundle::{analyze, BundleFile, BundleReport};
pub use presets::{preset, FrameworkPreset};
