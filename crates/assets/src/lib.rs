//! Icon generation for deploid
//!
//! One square source (SVG preferred, PNG/JPEG/GIF/WebP accepted) is rendered
//! to every launcher, PWA and favicon size by the `assets` step. The iOS
//! crate reuses [`IconSource`] and [`remove_alpha_channel`] for its icon set.

#![warn(missing_docs)]

mod alpha;
mod detect;
mod error;
mod render;
pub mod sizes;
mod step;

pub use alpha::remove_alpha_channel;
pub use detect::{detect_format, SourceFormat};
pub use error::{AssetError, Result};
pub use render::{write_png, IconSource};
pub use sizes::IconTarget;
pub use step::{generate, AssetsStep};
