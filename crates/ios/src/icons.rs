//! `ios-assets`: the `AppIcon.appiconset` asset catalog entry
//!
//! Icons are rendered from the same source as the Android launcher icons.
//! The App Store marketing icon must be opaque, so its alpha channel is
//! flattened onto white.

use crate::project::IosProject;
use async_trait::async_trait;
use deploid_assets::{remove_alpha_channel, write_png, IconSource};
use deploid_core::{Context, Result, Step};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;

const MARKETING_SIZE: u32 = 1024;
const MARKETING_BACKGROUND: [u8; 3] = [255, 255, 255];

/// One slot of the icon set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppIconSlot {
    pub idiom: &'static str,
    /// Edge length in points
    pub points: f32,
    pub scale: u32,
}

impl AppIconSlot {
    const fn new(idiom: &'static str, points: f32, scale: u32) -> Self {
        Self {
            idiom,
            points,
            scale,
        }
    }

    pub fn pixels(&self) -> u32 {
        (self.points * self.scale as f32).round() as u32
    }

    fn points_label(&self) -> String {
        if self.points.fract() == 0.0 {
            format!("{}", self.points as u32)
        } else {
            format!("{}", self.points)
        }
    }

    /// `AppIcon-83.5@2x.png`; slots with the same size and scale share a file
    pub fn filename(&self) -> String {
        format!("AppIcon-{}@{}x.png", self.points_label(), self.scale)
    }

    fn entry(&self) -> ImageEntry {
        let label = self.points_label();
        ImageEntry {
            filename: self.filename(),
            idiom: self.idiom,
            scale: format!("{}x", self.scale),
            size: format!("{}x{}", label, label),
        }
    }
}

/// iPhone, iPad and App Store slots
pub const APP_ICON_SLOTS: [AppIconSlot; 18] = [
    AppIconSlot::new("iphone", 20.0, 2),
    AppIconSlot::new("iphone", 20.0, 3),
    AppIconSlot::new("iphone", 29.0, 2),
    AppIconSlot::new("iphone", 29.0, 3),
    AppIconSlot::new("iphone", 40.0, 2),
    AppIconSlot::new("iphone", 40.0, 3),
    AppIconSlot::new("iphone", 60.0, 2),
    AppIconSlot::new("iphone", 60.0, 3),
    AppIconSlot::new("ipad", 20.0, 1),
    AppIconSlot::new("ipad", 20.0, 2),
    AppIconSlot::new("ipad", 29.0, 1),
    AppIconSlot::new("ipad", 29.0, 2),
    AppIconSlot::new("ipad", 40.0, 1),
    AppIconSlot::new("ipad", 40.0, 2),
    AppIconSlot::new("ipad", 76.0, 1),
    AppIconSlot::new("ipad", 76.0, 2),
    AppIconSlot::new("ipad", 83.5, 2),
    AppIconSlot::new("ios-marketing", 1024.0, 1),
];

#[derive(Debug, Serialize)]
struct Contents {
    images: Vec<ImageEntry>,
    info: Info,
}

#[derive(Debug, Serialize)]
struct ImageEntry {
    filename: String,
    idiom: &'static str,
    scale: String,
    size: String,
}

#[derive(Debug, Serialize)]
struct Info {
    author: &'static str,
    version: u32,
}

/// `Contents.json` for the icon set
pub fn contents_json() -> Result<String> {
    let contents = Contents {
        images: APP_ICON_SLOTS.iter().map(AppIconSlot::entry).collect(),
        info: Info {
            author: "deploid",
            version: 1,
        },
    };
    let mut text = serde_json::to_string_pretty(&contents)?;
    text.push('\n');
    Ok(text)
}

#[derive(Debug, Clone, Default)]
pub struct IosAssetsStep;

#[async_trait]
impl Step for IosAssetsStep {
    fn name(&self) -> &str {
        "ios-assets"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        let settings = ctx.config.assets.clone().unwrap_or_default();
        let source_path = ctx.path(&settings.source);
        ctx.logger.file_check("icon source", &source_path);
        if !source_path.is_file() {
            return ctx.missing_input(&source_path, "Icon source");
        }
        let source = IconSource::open(&source_path)?;

        let icon_set = IosProject::for_context(ctx).app_icon_set();
        fs::create_dir_all(&icon_set)?;

        let mut written = BTreeSet::new();
        for slot in &APP_ICON_SLOTS {
            let filename = slot.filename();
            if !written.insert(filename.clone()) {
                continue;
            }
            let mut icon = source.render_square(slot.pixels())?;
            if slot.pixels() == MARKETING_SIZE {
                icon = remove_alpha_channel(&icon, MARKETING_BACKGROUND);
            }
            write_png(&icon, &icon_set.join(&filename))?;
            tracing::debug!(file = %filename, "ios icon written");
        }
        fs::write(icon_set.join("Contents.json"), contents_json()?)?;

        ctx.logger.success(format!(
            "Wrote {} iOS icons to {}",
            written.len(),
            icon_set.display()
        ));
        Ok(())
    }
}
