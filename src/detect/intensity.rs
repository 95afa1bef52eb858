//! Single-channel intensity conversion shared by both detectors

use image::{GrayImage, Luma, RgbImage};

/// Calculate luminance (ITU-R BT.601 weights)
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64).round() as u8
}

/// Convert an RGB page to a grayscale intensity image
pub fn to_intensity(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let p = image.get_pixel(x, y);
        Luma([luminance(p.0[0], p.0[1], p.0[2])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_luminance_extremes() {
        assert_eq!(luminance(255, 255, 255), 255);
        assert_eq!(luminance(0, 0, 0), 0);
        let gray = luminance(128, 128, 128);
        assert!((gray as i32 - 128).abs() < 2);
    }

    #[test]
    fn test_luminance_weights_green_heaviest() {
        assert!(luminance(0, 255, 0) > luminance(255, 0, 0));
        assert!(luminance(255, 0, 0) > luminance(0, 0, 255));
    }

    #[test]
    fn test_to_intensity_dimensions() {
        let image = RgbImage::from_pixel(7, 3, Rgb([10, 20, 30]));
        let gray = to_intensity(&image);
        assert_eq!(gray.dimensions(), (7, 3));
        assert_eq!(gray.get_pixel(6, 2).0[0], luminance(10, 20, 30));
    }
}
