//! FAST segment-test corner detection (Rosten & Drummond).
//!
//! A pixel is a corner when at least `min_arc` contiguous samples on the
//! radius-3 Bresenham circle are all brighter or all darker than the centre
//! by more than the threshold. The wrap-around run test doubles the 16-bit
//! classification mask and AND-shifts it.

use crate::GrayImageView;
use serde::{Deserialize, Serialize};

/// A detected corner keypoint with its response and (optional) class label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub response: f32,
    /// Local-topology class assigned after detection; -1 when unset.
    pub class_id: i32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FastParams {
    /// Intensity difference threshold for the segment test.
    pub threshold: u8,
    /// Minimum contiguous arc length, usually 9 (FAST-9/16).
    pub min_arc: usize,
    /// Suppress non-maximal corners in a 3x3 neighbourhood.
    pub nonmax_suppression: bool,
}

impl Default for FastParams {
    fn default() -> Self {
        Self {
            threshold: 10,
            min_arc: 9,
            nonmax_suppression: true,
        }
    }
}

// Radius-3 Bresenham circle, clockwise from 12 o'clock.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

#[inline]
fn has_arc(mask: u16, min_arc: usize) -> bool {
    let mut acc = (mask as u32) | ((mask as u32) << 16);
    for _ in 1..min_arc {
        acc &= acc >> 1;
    }
    acc != 0
}

/// Detect FAST corners over the full image (minus the 3-pixel rim).
pub fn detect_fast(img: &GrayImageView<'_>, params: &FastParams) -> Vec<Keypoint> {
    let w = img.width;
    let h = img.height;
    if w <= 6 || h <= 6 {
        return Vec::new();
    }

    let t = params.threshold as i16;
    let mut scores = vec![0.0f32; w * h];
    let mut raw = Vec::new();

    for y in 3..h - 3 {
        for x in 3..w - 3 {
            let center = img.data[y * w + x] as i16;

            // Cardinal pre-test: a valid arc of >= 9 must cover at least
            // two of the four compass samples.
            let p0 = img.data[(y - 3) * w + x] as i16;
            let p4 = img.data[y * w + x + 3] as i16;
            let p8 = img.data[(y + 3) * w + x] as i16;
            let p12 = img.data[y * w + x - 3] as i16;
            let brighter = (p0 > center + t) as u8
                + (p4 > center + t) as u8
                + (p8 > center + t) as u8
                + (p12 > center + t) as u8;
            let darker = (p0 < center - t) as u8
                + (p4 < center - t) as u8
                + (p8 < center - t) as u8
                + (p12 < center - t) as u8;
            if brighter < 2 && darker < 2 {
                continue;
            }

            let mut bright_mask = 0u16;
            let mut dark_mask = 0u16;
            let mut diffs = [0i16; 16];
            for (i, &(dx, dy)) in CIRCLE.iter().enumerate() {
                let v = img.data[(y as i32 + dy) as usize * w + (x as i32 + dx) as usize] as i16;
                let d = v - center;
                diffs[i] = d;
                if d > t {
                    bright_mask |= 1 << i;
                } else if d < -t {
                    dark_mask |= 1 << i;
                }
            }

            let bright_ok =
                bright_mask.count_ones() as usize >= params.min_arc && has_arc(bright_mask, params.min_arc);
            let dark_ok =
                dark_mask.count_ones() as usize >= params.min_arc && has_arc(dark_mask, params.min_arc);
            if !bright_ok && !dark_ok {
                continue;
            }

            let mut score = 0.0f32;
            for i in 0..16 {
                let qualifies = (bright_ok && bright_mask & (1 << i) != 0)
                    || (dark_ok && dark_mask & (1 << i) != 0);
                if qualifies {
                    score += (diffs[i].unsigned_abs() as i32 - t as i32) as f32;
                }
            }

            scores[y * w + x] = score;
            raw.push((x, y, score));
        }
    }

    if !params.nonmax_suppression {
        return raw
            .into_iter()
            .map(|(x, y, score)| Keypoint {
                x: x as f32,
                y: y as f32,
                response: score,
                class_id: -1,
            })
            .collect();
    }

    let mut out = Vec::with_capacity(raw.len());
    for (x, y, score) in raw {
        let mut is_max = true;
        'nms: for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nb = scores[(y as i32 + dy) as usize * w + (x as i32 + dx) as usize];
                if nb > score {
                    is_max = false;
                    break 'nms;
                }
            }
        }
        if is_max {
            out.push(Keypoint {
                x: x as f32,
                y: y as f32,
                response: score,
                class_id: -1,
            });
        }
    }
    out
}
