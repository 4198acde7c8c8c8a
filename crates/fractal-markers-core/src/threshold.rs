//! Adaptive mean thresholding for border extraction.

use crate::{GrayImage, GrayImageView};

/// Inverse adaptive-mean binarization.
///
/// A pixel becomes foreground (255) when it is darker than the mean of the
/// `window x window` neighbourhood around it minus `c`. The window is clamped
/// at the image borders. `window` must be odd and >= 3.
pub fn adaptive_threshold_mean_inv(src: &GrayImageView<'_>, window: usize, c: f32) -> GrayImage {
    debug_assert!(window >= 3 && window % 2 == 1);
    let w = src.width;
    let h = src.height;
    let mut out = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    // Summed-area table with a leading zero row/column.
    let iw = w + 1;
    let mut integral = vec![0u64; iw * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += src.data[y * w + x] as u64;
            integral[(y + 1) * iw + (x + 1)] = integral[y * iw + (x + 1)] + row_sum;
        }
    }

    let r = (window / 2) as i32;
    for y in 0..h as i32 {
        let y0 = (y - r).max(0) as usize;
        let y1 = ((y + r).min(h as i32 - 1) + 1) as usize;
        for x in 0..w as i32 {
            let x0 = (x - r).max(0) as usize;
            let x1 = ((x + r).min(w as i32 - 1) + 1) as usize;

            let sum = integral[y1 * iw + x1] + integral[y0 * iw + x0]
                - integral[y1 * iw + x0]
                - integral[y0 * iw + x1];
            let count = ((y1 - y0) * (x1 - x0)) as f32;
            let mean = sum as f32 / count;

            let v = src.data[y as usize * w + x as usize] as f32;
            out.data[y as usize * w + x as usize] = if v > mean - c { 0 } else { 255 };
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_image_has_no_foreground() {
        let data = vec![180u8; 20 * 20];
        let src = GrayImageView {
            width: 20,
            height: 20,
            data: &data,
        };
        let bin = adaptive_threshold_mean_inv(&src, 5, 7.0);
        assert!(bin.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn dark_stripe_on_light_field_is_foreground() {
        let w = 32;
        let h = 16;
        let mut data = vec![220u8; w * h];
        for y in 0..h {
            data[y * w + 15] = 10;
            data[y * w + 16] = 10;
        }
        let src = GrayImageView {
            width: w,
            height: h,
            data: &data,
        };
        let bin = adaptive_threshold_mean_inv(&src, 5, 7.0);
        assert!(bin.data[8 * w + 15] == 255 && bin.data[8 * w + 16] == 255);
        assert_eq!(bin.data[8 * w + 2], 0);
    }
}
