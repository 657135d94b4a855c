//! Recognising the icon source format from its first bytes

use crate::{AssetError, Result};
use std::fmt;

/// Formats accepted as an icon source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Rendered with resvg at every target size
    Svg,
    /// Decoded once with `image`, then resampled
    Raster(image::ImageFormat),
}

impl SourceFormat {
    /// Whether every size is rendered from vectors
    pub fn is_vector(&self) -> bool {
        matches!(self, SourceFormat::Svg)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Svg => f.write_str("svg"),
            SourceFormat::Raster(format) => {
                let ext = format.extensions_str().first().copied().unwrap_or("raster");
                f.write_str(ext)
            }
        }
    }
}

/// Magic numbers of the raster formats the `image` features enable
const SIGNATURES: &[(&[u8], image::ImageFormat)] = &[
    (&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], image::ImageFormat::Png),
    (&[0xFF, 0xD8, 0xFF], image::ImageFormat::Jpeg),
    (b"GIF87a", image::ImageFormat::Gif),
    (b"GIF89a", image::ImageFormat::Gif),
];

/// SVG is recognised this far into the file at most
const SVG_SNIFF_LEN: usize = 1024;

/// Work out the source format
///
/// ```
/// use deploid_assets::{detect_format, SourceFormat};
///
/// let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#;
/// assert_eq!(detect_format(svg).unwrap(), SourceFormat::Svg);
/// ```
pub fn detect_format(data: &[u8]) -> Result<SourceFormat> {
    if data.len() < 4 {
        return Err(AssetError::InvalidData(format!(
            "{} bytes is too short for an image",
            data.len()
        )));
    }

    if let Some((_, format)) = SIGNATURES.iter().find(|(magic, _)| data.starts_with(magic)) {
        return Ok(SourceFormat::Raster(*format));
    }
    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Ok(SourceFormat::Raster(image::ImageFormat::WebP));
    }
    if is_svg(data) {
        return Ok(SourceFormat::Svg);
    }
    Err(AssetError::UnknownFormat)
}

/// Markup that mentions an `<svg` element early on, BOM and prolog allowed
fn is_svg(data: &[u8]) -> bool {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let head = String::from_utf8_lossy(&data[..data.len().min(SVG_SNIFF_LEN)]).to_ascii_lowercase();
    head.trim_start().starts_with('<') && head.contains("<svg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    #[test]
    fn test_raster_signatures() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];
        assert_eq!(detect_format(&png).unwrap(), SourceFormat::Raster(ImageFormat::Png));

        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        assert_eq!(detect_format(&jpeg).unwrap(), SourceFormat::Raster(ImageFormat::Jpeg));

        let webp = b"RIFF\x00\x00\x00\x00WEBPVP8 ";
        assert_eq!(detect_format(webp).unwrap(), SourceFormat::Raster(ImageFormat::WebP));
        assert_eq!(SourceFormat::Raster(ImageFormat::Png).to_string(), "png");
    }

    #[test]
    fn test_svg_with_prolog_and_uppercase() {
        let data = b"\n<?xml version=\"1.0\"?>\n<!-- logo -->\n<SVG width=\"10\" height=\"10\"></SVG>";
        let format = detect_format(data).unwrap();
        assert_eq!(format, SourceFormat::Svg);
        assert!(format.is_vector());
    }

    #[test]
    fn test_plain_text_is_unknown() {
        assert!(matches!(detect_format(b"hello world"), Err(AssetError::UnknownFormat)));
        assert!(matches!(detect_format(&[0x00, 0x00]), Err(AssetError::InvalidData(_))));
    }
}
