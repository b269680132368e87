use image::{DynamicImage, ImageBuffer, ImageReader, Rgb, RgbImage};
use std::path::Path;
use tract_onnx::prelude::tract_ndarray::Array4;

use crate::ClassifyError;

/// Side length the classifier was trained on.
pub const INPUT_SIZE: u32 = 128;

/// NHWC shape of one input batch.
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3];

/// Decode an image file into the classifier's input tensor.
pub fn load_tensor(path: &Path) -> Result<Array4<f32>, ClassifyError> {
    let img = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| ClassifyError::InvalidImage(e.to_string()))?
        .decode()
        .map_err(|e| ClassifyError::InvalidImage(e.to_string()))?;
    Ok(to_input_tensor(&img))
}

/// RGB → 128×128 (aspect ratio not preserved) → `[0, 1]` floats → batch of one.
pub fn to_input_tensor(img: &DynamicImage) -> Array4<f32> {
    let rgb = resize_bilinear(&img.to_rgb8(), INPUT_SIZE, INPUT_SIZE);
    let [n, h, w, c] = INPUT_SHAPE;
    Array4::from_shape_fn((n, h, w, c), |(_, y, x, ch)| {
        rgb.get_pixel(x as u32, y as u32)[ch] as f32 / 255.0
    })
}

// ── Resize ────────────────────────────────────────────────────────────────────

/// Two-tap bilinear resize sampling at pixel centres, matching the resize the
/// model's training data went through. Unlike a filtered resize it never
/// widens the kernel when shrinking, so only the 2×2 nearest source pixels
/// contribute to each output pixel.
pub fn resize_bilinear(src: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 {
        return ImageBuffer::new(width, height);
    }
    let xs: Vec<Tap> = (0..width).map(|d| Tap::new(d, sw, width)).collect();
    let ys: Vec<Tap> = (0..height).map(|d| Tap::new(d, sh, height)).collect();

    ImageBuffer::from_fn(width, height, |x, y| {
        let (tx, ty) = (&xs[x as usize], &ys[y as usize]);
        let p00 = src.get_pixel(tx.lo, ty.lo);
        let p10 = src.get_pixel(tx.hi, ty.lo);
        let p01 = src.get_pixel(tx.lo, ty.hi);
        let p11 = src.get_pixel(tx.hi, ty.hi);
        Rgb(std::array::from_fn(|c| {
            let top = p00[c] as f32 * (1.0 - tx.frac) + p10[c] as f32 * tx.frac;
            let bottom = p01[c] as f32 * (1.0 - tx.frac) + p11[c] as f32 * tx.frac;
            (top * (1.0 - ty.frac) + bottom * ty.frac).round().clamp(0.0, 255.0) as u8
        }))
    })
}

/// Source neighbours and weight for one output coordinate.
struct Tap {
    lo: u32,
    hi: u32,
    frac: f32,
}

impl Tap {
    fn new(dst: u32, src_len: u32, dst_len: u32) -> Self {
        let scale = src_len as f32 / dst_len as f32;
        let pos = (dst as f32 + 0.5) * scale - 0.5;
        let floor = pos.floor();
        let last = src_len - 1;
        // Clamped edges carry no blend weight.
        if floor < 0.0 {
            Tap { lo: 0, hi: 0, frac: 0.0 }
        } else if floor as u32 >= last {
            Tap { lo: last, hi: last, frac: 0.0 }
        } else {
            let lo = floor as u32;
            Tap { lo, hi: lo + 1, frac: pos - floor }
        }
    }
}
