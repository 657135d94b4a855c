//! Rasterizing an icon source onto square canvases.

use crate::{detect_format, AssetError, Result, SourceFormat};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};
use std::fs;
use std::path::Path;

/// A decoded icon source, ready to render at any size
pub enum IconSource {
    /// Parsed SVG document, rendered fresh for every size
    Vector(Box<usvg::Tree>),
    /// Decoded raster image, resampled for every size
    Raster(DynamicImage),
}

impl IconSource {
    /// Read and decode a source file
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Decode a source from memory
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match detect_format(data)? {
            SourceFormat::Svg => {
                let tree = usvg::Tree::from_data(data, &usvg::Options::default())
                    .map_err(|e| AssetError::Svg(e.to_string()))?;
                Ok(IconSource::Vector(Box::new(tree)))
            }
            SourceFormat::Raster(format) => Ok(IconSource::Raster(image::load_from_memory_with_format(
                data, format,
            )?)),
        }
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            IconSource::Vector(tree) => {
                format!("svg {}x{}", tree.size().width(), tree.size().height())
            }
            IconSource::Raster(img) => format!("raster {}x{}", img.width(), img.height()),
        }
    }

    /// Render onto a transparent `size`×`size` canvas, centred, aspect kept
    pub fn render_square(&self, size: u32) -> Result<DynamicImage> {
        if size == 0 {
            return Err(AssetError::InvalidData("icon size must be positive".into()));
        }
        match self {
            IconSource::Vector(tree) => rasterize(tree, size),
            IconSource::Raster(img) => Ok(fit_square(img, size)),
        }
    }
}

fn rasterize(tree: &usvg::Tree, size: u32) -> Result<DynamicImage> {
    let mut pixmap = tiny_skia::Pixmap::new(size, size)
        .ok_or_else(|| AssetError::InvalidData(format!("cannot allocate a {0}x{0} canvas", size)))?;

    let view = tree.size();
    let edge = size as f32;
    let scale = edge / view.width().max(view.height());
    let dx = (edge - view.width() * scale) / 2.0;
    let dy = (edge - view.height() * scale) / 2.0;
    let transform = tiny_skia::Transform::from_scale(scale, scale).post_translate(dx, dy);
    resvg::render(tree, transform, &mut pixmap.as_mut());

    // tiny-skia stores premultiplied RGBA
    let mut out = RgbaImage::new(size, size);
    for (dst, px) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = px.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(DynamicImage::ImageRgba8(out))
}

fn fit_square(img: &DynamicImage, size: u32) -> DynamicImage {
    let resized = img.resize(size, size, FilterType::Lanczos3).to_rgba8();
    if resized.width() == size && resized.height() == size {
        return DynamicImage::ImageRgba8(resized);
    }

    let mut canvas = RgbaImage::new(size, size);
    let x = (size - resized.width()) / 2;
    let y = (size - resized.height()) / 2;
    image::imageops::overlay(&mut canvas, &resized, i64::from(x), i64::from(y));
    DynamicImage::ImageRgba8(canvas)
}

/// Encode as PNG, creating parent directories
pub fn write_png(img: &DynamicImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
