use glance_types::CaptureImage;
use image::{DynamicImage, GrayImage, RgbaImage};
use unicode_normalization::UnicodeNormalization;

/// Single-channel copy of a capture; tesseract reads grayscale more reliably
pub fn to_grayscale(image: &CaptureImage) -> Option<GrayImage> {
    let rgba = RgbaImage::from_raw(image.width(), image.height(), image.pixels().to_vec())?;
    Some(DynamicImage::ImageRgba8(rgba).to_luma8())
}

/// Clean raw OCR output: NFC, no trailing whitespace, no runs of blank lines
pub fn normalize_text(raw: &str) -> String {
    let text: String = raw.nfc().collect();

    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() && lines.last().is_none_or(|prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grayscale_dimensions() {
        let image = CaptureImage::from_rgba(vec![200; 4 * 6 * 3], 6, 3).unwrap();
        let gray = to_grayscale(&image).unwrap();
        assert_eq!(gray.dimensions(), (6, 3));
    }

    #[test]
    fn test_grayscale_luma() {
        // pure white stays white, pure black stays black
        let mut pixels = vec![255, 255, 255, 255];
        pixels.extend([0, 0, 0, 255]);
        let image = CaptureImage::from_rgba(pixels, 2, 1).unwrap();
        let gray = to_grayscale(&image).unwrap();
        assert_eq!(gray.get_pixel(0, 0).0, [255]);
        assert_eq!(gray.get_pixel(1, 0).0, [0]);
    }

    #[test]
    fn test_normalize_whitespace_only_is_empty() {
        assert_eq!(normalize_text("  \n\x0c\n  "), "");
    }

    #[test]
    fn test_normalize_collapses_blank_lines() {
        assert_eq!(
            normalize_text("\n\nHello   \n\n\n\nworld \n\n"),
            "Hello\n\nworld"
        );
    }

    #[test]
    fn test_normalize_composes() {
        // e + combining acute
        assert_eq!(normalize_text("cafe\u{301}"), "caf\u{e9}");
    }
}
