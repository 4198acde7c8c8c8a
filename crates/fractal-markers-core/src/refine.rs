//! Iterative gradient-based corner refinement.
//!
//! Classic subpixel scheme: inside a small window the image gradient at every
//! point should be orthogonal to the vector from the true corner to that
//! point. Accumulating the weighted normal equations and solving the 2x2
//! system moves the estimate; a few iterations converge to subpixel accuracy.

use crate::{sample_bilinear, GrayImageView};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RefineParams {
    /// Half window size; the full search window is `(2w+1) x (2w+1)`.
    pub half_window: usize,
    pub max_iter: usize,
    pub epsilon: f32,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            half_window: 4,
            max_iter: 12,
            epsilon: 0.005,
        }
    }
}

/// Refine every corner in place.
pub fn refine_corners(img: &GrayImageView<'_>, corners: &mut [Point2<f32>], params: RefineParams) {
    let win = params.half_window.max(1);
    let full = 2 * win + 1;

    // Gaussian-ish separable weight mask over the window.
    let mut mask = vec![0.0f32; full * full];
    for i in 0..full {
        let fy = (i as f32 - win as f32) / win as f32;
        let vy = (-fy * fy).exp();
        for j in 0..full {
            let fx = (j as f32 - win as f32) / win as f32;
            mask[i * full + j] = vy * (-fx * fx).exp();
        }
    }

    // Sampled patch with a one-pixel apron for central differences.
    let patch_w = full + 2;
    let mut patch = vec![0.0f32; patch_w * patch_w];

    for corner in corners.iter_mut() {
        let initial = *corner;
        let mut current = initial;
        let eps_sq = params.epsilon * params.epsilon;

        for _ in 0..params.max_iter {
            for i in 0..patch_w {
                for j in 0..patch_w {
                    let sx = current.x + (j as f32 - (patch_w as f32 - 1.0) * 0.5);
                    let sy = current.y + (i as f32 - (patch_w as f32 - 1.0) * 0.5);
                    patch[i * patch_w + j] = sample_bilinear(img, sx, sy);
                }
            }

            let mut a = 0.0f64;
            let mut b = 0.0f64;
            let mut c = 0.0f64;
            let mut bb1 = 0.0f64;
            let mut bb2 = 0.0f64;

            for i in 0..full {
                for j in 0..full {
                    let m = mask[i * full + j] as f64;
                    let pi = i + 1;
                    let pj = j + 1;
                    let gx = (patch[pi * patch_w + pj + 1] - patch[pi * patch_w + pj - 1]) as f64;
                    let gy =
                        (patch[(pi + 1) * patch_w + pj] - patch[(pi - 1) * patch_w + pj]) as f64;

                    let gxx = gx * gx * m;
                    let gxy = gx * gy * m;
                    let gyy = gy * gy * m;
                    let px = j as f64 - win as f64;
                    let py = i as f64 - win as f64;

                    a += gxx;
                    b += gxy;
                    c += gyy;
                    bb1 += gxx * px + gxy * py;
                    bb2 += gxy * px + gyy * py;
                }
            }

            let det = a * c - b * b;
            if det.abs() <= f64::EPSILON * f64::EPSILON {
                break;
            }
            let inv = 1.0 / det;
            let next = Point2::new(
                current.x + ((c * bb1 - b * bb2) * inv) as f32,
                current.y + ((a * bb2 - b * bb1) * inv) as f32,
            );

            let step_sq = (next.x - current.x).powi(2) + (next.y - current.y).powi(2);
            current = next;
            if step_sq <= eps_sq {
                break;
            }
        }

        // Reject runaway estimates; keep the original corner instead.
        if (current.x - initial.x).abs() > win as f32 || (current.y - initial.y).abs() > win as f32 {
            current = initial;
        }
        *corner = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GrayImage;

    // Checkerboard corner at a known subpixel position, rendered by area
    // coverage so the edge falls between pixels.
    fn corner_image(cx: f32, cy: f32, size: usize) -> GrayImage {
        let mut img = GrayImage::new(size, size);
        for y in 0..size {
            for x in 0..size {
                let mut acc = 0.0f32;
                const N: usize = 4;
                for sy in 0..N {
                    for sx in 0..N {
                        let px = x as f32 + (sx as f32 + 0.5) / N as f32 - 0.5;
                        let py = y as f32 + (sy as f32 + 0.5) / N as f32 - 0.5;
                        let dark = (px < cx) ^ (py < cy);
                        if !dark {
                            acc += 1.0;
                        }
                    }
                }
                img.data[y * size + x] = (acc / (N * N) as f32 * 255.0) as u8;
            }
        }
        img
    }

    #[test]
    fn converges_to_checkerboard_saddle() {
        let truth = Point2::new(15.3f32, 14.7f32);
        let img = corner_image(truth.x, truth.y, 30);
        let mut corners = [Point2::new(14.0f32, 16.0)];
        refine_corners(&img.view(), &mut corners, RefineParams::default());
        let d = ((corners[0].x - truth.x).powi(2) + (corners[0].y - truth.y).powi(2)).sqrt();
        assert!(d < 0.25, "refined {:?}, truth {:?}", corners[0], truth);
    }

    #[test]
    fn flat_patch_leaves_corner_unchanged() {
        let img = GrayImage {
            width: 20,
            height: 20,
            data: vec![128u8; 400],
        };
        let mut corners = [Point2::new(10.0f32, 10.0)];
        refine_corners(&img.view(), &mut corners, RefineParams::default());
        assert_eq!(corners[0], Point2::new(10.0, 10.0));
    }
}
