use image::{DynamicImage, GrayImage, ImageBuffer, ImageReader, Luma, RgbImage};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// BT.601 luma weights in 14-bit fixed point; they sum to `1 << 14`.
const LUMA_WEIGHTS: [u32; 3] = [4899, 9617, 1868];

/// Separable 5-tap Gaussian, weights sum to 16.
const GAUSSIAN_5: [u32; 5] = [1, 4, 6, 4, 1];

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Invalid image format or corrupted file: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Load an image file, binarize it, and return PNG bytes ready for OCR.
///
/// The format is sniffed from the file contents; uploads often carry a
/// misleading extension.
pub fn prepare_for_ocr(path: &Path) -> Result<Vec<u8>, PreprocessError> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    encode_as_png(binarize(&img))
}

/// Process raw image bytes (JPEG / PNG / WEBP / …) and return binarized PNG bytes.
pub fn prepare_for_ocr_from_bytes(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_as_png(binarize(&img))
}

/// Grayscale → 5×5 Gaussian blur → Otsu threshold.
///
/// A histogram with no two-class split thresholds at 0, so a blank page of
/// any non-black shade comes out white.
pub fn binarize(img: &DynamicImage) -> DynamicImage {
    let blurred = gaussian_blur_5x5(&grayscale(&img.to_rgb8()));
    let level = otsu_level(&blurred).unwrap_or(0);
    DynamicImage::ImageLuma8(threshold(&blurred, level))
}

/// `0.299 R + 0.587 G + 0.114 B`, rounded.
fn grayscale(rgb: &RgbImage) -> GrayImage {
    ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
        let p = rgb.get_pixel(x, y);
        let sum: u32 = LUMA_WEIGHTS.iter().zip(p.0).map(|(w, c)| w * c as u32).sum();
        Luma([((sum + (1 << 13)) >> 14) as u8])
    })
}

// ── Blur ──────────────────────────────────────────────────────────────────────

fn gaussian_blur_5x5(gray: &GrayImage) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray.clone();
    }

    // Horizontal pass keeps the unnormalized sums (max 255 * 16).
    let horizontal: Vec<u32> = (0..h)
        .flat_map(|y| {
            (0..w).map(move |x| {
                GAUSSIAN_5
                    .iter()
                    .enumerate()
                    .map(|(k, weight)| {
                        let sx = reflect_101(x as i64 + k as i64 - 2, w as i64) as u32;
                        weight * gray.get_pixel(sx, y)[0] as u32
                    })
                    .sum::<u32>()
            })
        })
        .collect();

    ImageBuffer::from_fn(w, h, |x, y| {
        let sum: u32 = GAUSSIAN_5
            .iter()
            .enumerate()
            .map(|(k, weight)| {
                let sy = reflect_101(y as i64 + k as i64 - 2, h as i64);
                weight * horizontal[sy * w as usize + x as usize]
            })
            .sum();
        // 16 * 16 = 256, round to nearest.
        Luma([((sum + 128) >> 8) as u8])
    })
}

/// Border index mirrored around the edge pixel without repeating it
/// (`gfedcb|abcdefgh|gfedcba`).
fn reflect_101(i: i64, len: i64) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let i = i.rem_euclid(period);
    (if i >= len { period - i } else { i }) as usize
}

// ── Threshold ─────────────────────────────────────────────────────────────────

/// Otsu's level: the cutoff that maximizes between-class variance.
/// Returns `None` when every pixel falls into a single class.
pub fn otsu_level(gray: &GrayImage) -> Option<u8> {
    let mut hist = [0u64; 256];
    for p in gray.pixels() {
        hist[p[0] as usize] += 1;
    }

    let total: f64 = hist.iter().sum::<u64>() as f64;
    let sum_all: f64 = hist.iter().enumerate().map(|(i, &n)| i as f64 * n as f64).sum();

    let mut weight_bg = 0.0f64;
    let mut sum_bg = 0.0f64;
    let mut best: Option<(u8, f64)> = None;

    for (level, &count) in hist.iter().enumerate() {
        weight_bg += count as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }
        sum_bg += level as f64 * count as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let between = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
        if best.map_or(true, |(_, b)| between > b) {
            best = Some((level as u8, between));
        }
    }

    best.map(|(level, _)| level)
}

/// Pixels strictly above `level` become white, the rest black.
fn threshold(gray: &GrayImage, level: u8) -> GrayImage {
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([if gray.get_pixel(x, y)[0] > level { 255 } else { 0 }])
    })
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_gray(width: u32, height: u32, value: u8) -> GrayImage {
        ImageBuffer::from_fn(width, height, |_, _| Luma([value]))
    }

    /// Dark "ink" block on a light page.
    fn ink_on_paper(width: u32, height: u32) -> GrayImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            let ink = x >= width / 4 && x < width * 3 / 4 && y >= height / 4 && y < height * 3 / 4;
            Luma([if ink { 30 } else { 220 }])
        })
    }

    #[test]
    fn reflect_101_mirrors_without_repeating_edge() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(-3, 1), 0);
    }

    #[test]
    fn blur_preserves_uniform_image() {
        let blurred = gaussian_blur_5x5(&solid_gray(7, 4, 128));
        assert!(blurred.pixels().all(|p| p[0] == 128));
    }

    #[test]
    fn blur_softens_single_bright_pixel() {
        let mut img = solid_gray(9, 9, 0);
        img.put_pixel(4, 4, Luma([255]));
        let blurred = gaussian_blur_5x5(&img);
        // Center weight is 36/256.
        assert_eq!(blurred.get_pixel(4, 4)[0], 36);
        assert!(blurred.get_pixel(5, 4)[0] > 0);
        assert_eq!(blurred.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn otsu_separates_two_populations() {
        let level = otsu_level(&ink_on_paper(40, 40)).unwrap();
        assert!((30..220).contains(&level), "level was {level}");
    }

    #[test]
    fn otsu_none_for_uniform_image() {
        assert_eq!(otsu_level(&solid_gray(8, 8, 90)), None);
    }

    #[test]
    fn binarize_yields_only_black_and_white() {
        let img = DynamicImage::ImageLuma8(ink_on_paper(32, 32));
        let out = binarize(&img).to_luma8();
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(out.get_pixel(16, 16)[0], 0);
        assert_eq!(out.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn uniform_image_thresholds_at_zero() {
        let bright = binarize(&DynamicImage::ImageLuma8(solid_gray(6, 6, 200))).to_luma8();
        assert!(bright.pixels().all(|p| p[0] == 255));
        let gray = binarize(&DynamicImage::ImageLuma8(solid_gray(6, 6, 100))).to_luma8();
        assert!(gray.pixels().all(|p| p[0] == 255));
        let black = binarize(&DynamicImage::ImageLuma8(solid_gray(6, 6, 0))).to_luma8();
        assert!(black.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn grayscale_uses_bt601_weights() {
        let img: RgbImage = ImageBuffer::from_fn(4, 1, |x, _| {
            image::Rgb(match x {
                0 => [255, 0, 0],
                1 => [0, 255, 0],
                2 => [0, 0, 255],
                _ => [77, 77, 77],
            })
        });
        let gray = grayscale(&img);
        let values: Vec<u8> = gray.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![76, 150, 29, 77]);
    }

    #[test]
    fn prepare_from_bytes_produces_png_header() {
        let img = DynamicImage::ImageLuma8(ink_on_paper(8, 8));
        let mut png_bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
            .unwrap();
        let result = prepare_for_ocr_from_bytes(&png_bytes).unwrap();
        // PNG magic bytes: 0x89 0x50 0x4E 0x47
        assert_eq!(&result[..4], b"\x89PNG");
    }

    #[test]
    fn corrupt_bytes_report_invalid_image() {
        let err = prepare_for_ocr_from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PreprocessError::Load(_)));
        assert!(err.to_string().contains("Invalid image format or corrupted file"));
    }

    #[test]
    fn prepare_for_ocr_ignores_misleading_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.txt");
        DynamicImage::ImageLuma8(ink_on_paper(8, 8))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        assert!(prepare_for_ocr(&path).is_ok());
    }
}
