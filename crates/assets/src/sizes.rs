//! Output size sets
//!
//! Paths are relative to the asset output directory.

use std::path::PathBuf;

/// One square PNG to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconTarget {
    /// Path relative to the output directory
    pub path: PathBuf,
    /// Edge length in pixels
    pub size: u32,
}

impl IconTarget {
    /// Create a target
    pub fn new(path: impl Into<PathBuf>, size: u32) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// Android launcher densities and their edge lengths
pub const ANDROID_DENSITIES: [(&str, u32); 5] = [
    ("mdpi", 48),
    ("hdpi", 72),
    ("xhdpi", 96),
    ("xxhdpi", 144),
    ("xxxhdpi", 192),
];

/// PWA manifest icon sizes
pub const PWA_SIZES: [u32; 8] = [72, 96, 128, 144, 152, 192, 384, 512];

/// Favicon sizes
pub const FAVICON_SIZES: [u32; 3] = [16, 32, 48];

/// `android/mipmap-<density>/ic_launcher.png`
pub fn android_launcher() -> Vec<IconTarget> {
    ANDROID_DENSITIES
        .iter()
        .map(|(density, size)| {
            IconTarget::new(format!("android/mipmap-{}/ic_launcher.png", density), *size)
        })
        .collect()
}

/// `pwa/icon-<size>.png`
pub fn pwa() -> Vec<IconTarget> {
    PWA_SIZES
        .iter()
        .map(|size| IconTarget::new(format!("pwa/icon-{}.png", size), *size))
        .collect()
}

/// `favicon/favicon-<size>.png`
pub fn favicons() -> Vec<IconTarget> {
    FAVICON_SIZES
        .iter()
        .map(|size| IconTarget::new(format!("favicon/favicon-{}.png", size), *size))
        .collect()
}

/// Every target the `assets` step writes
pub fn all() -> Vec<IconTarget> {
    let mut targets = android_launcher();
    targets.extend(pwa());
    targets.extend(favicons());
    targets
}
