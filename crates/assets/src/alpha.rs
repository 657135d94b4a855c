//! Flattening transparency onto a solid background

use image::{DynamicImage, Rgb, RgbImage};

/// Composite over a solid background and drop the alpha channel
///
/// App Store marketing icons must be fully opaque RGB.
pub fn remove_alpha_channel(img: &DynamicImage, background_color: [u8; 3]) -> DynamicImage {
    let rgba = img.to_rgba8();
    let mut output = RgbImage::new(rgba.width(), rgba.height());

    for (src, dst) in rgba.pixels().zip(output.pixels_mut()) {
        let [r, g, b, a] = src.0;
        let alpha = f32::from(a) / 255.0;
        let blend = |channel: u8, bg: u8| {
            (f32::from(channel) * alpha + f32::from(bg) * (1.0 - alpha)).round() as u8
        };
        *dst = Rgb([
            blend(r, background_color[0]),
            blend(g, background_color[1]),
            blend(b, background_color[2]),
        ]);
    }

    DynamicImage::ImageRgb8(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_remove_alpha_white_background() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 255, 0, 128]));
        img.put_pixel(1, 0, Rgba([0, 0, 255, 0]));
        img.put_pixel(1, 1, Rgba([255, 255, 0, 255]));

        let result = remove_alpha_channel(&DynamicImage::ImageRgba8(img), [255, 255, 255]);
        assert!(!result.color().has_alpha());

        let rgb = result.to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(1, 1), &Rgb([255, 255, 0]));

        let half = rgb.get_pixel(0, 1);
        assert_eq!(half[1], 255);
        assert!(half[0] > 120 && half[0] < 135);
    }
}
