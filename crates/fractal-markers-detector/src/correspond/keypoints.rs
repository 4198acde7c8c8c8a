//! FAST keypoint filtering and local-topology classification.

use fractal_markers_core::{count_equal_value_regions, GrayImageView, Keypoint};

use crate::detector::DetectorParams;

/// Keep only strong, well-separated keypoints.
///
/// Responses below a relative band over the observed range are dropped, and
/// of any two survivors closer than the merge radius only the stronger one
/// is kept.
pub(crate) fn kfilter(kpoints: &mut Vec<Keypoint>, params: &DetectorParams) {
    if kpoints.is_empty() {
        return;
    }

    let mut min_resp = f32::INFINITY;
    let mut max_resp = f32::NEG_INFINITY;
    for kp in kpoints.iter() {
        min_resp = min_resp.min(kp.response);
        max_resp = max_resp.max(kp.response);
    }
    let threshold = min_resp + params.response_band_rel * (max_resp - min_resp);
    kpoints.retain(|kp| kp.response >= threshold);

    let mut alive = vec![true; kpoints.len()];
    for i in 0..kpoints.len() {
        if !alive[i] {
            continue;
        }
        for j in i + 1..kpoints.len() {
            if !alive[j] {
                continue;
            }
            let d_sq = (kpoints[i].x - kpoints[j].x).powi(2)
                + (kpoints[i].y - kpoints[j].y).powi(2);
            if d_sq < params.keypoint_merge_dist_sq {
                if kpoints[j].response > kpoints[i].response {
                    alive[i] = false;
                    break;
                }
                alive[j] = false;
            }
        }
    }
    let mut idx = 0;
    kpoints.retain(|_| {
        let keep = alive[idx];
        idx += 1;
        keep
    });
}

/// Classify each keypoint by the topology of its local patch.
///
/// The patch is binarized at the mid-range level and its 4-connected regions
/// are counted: two regions make a corner (light- or dark-dominant by pixel
/// majority), more make a saddle. Flat patches and patches that do not fit
/// inside the image default to class 0 and unset respectively.
pub(crate) fn assign_class(
    gray: &GrayImageView<'_>,
    kpoints: &mut [Keypoint],
    params: &DetectorParams,
) {
    let w = params.class_window_half as i32;
    let full = (2 * w + 1) as usize;
    let mut patch = vec![0u8; full * full];

    for kp in kpoints.iter_mut() {
        let cx = (kp.x + 0.5) as i32;
        let cy = (kp.y + 0.5) as i32;
        let x0 = cx - w;
        let y0 = cy - w;
        if x0 < 0
            || y0 < 0
            || x0 + full as i32 > gray.width as i32
            || y0 + full as i32 > gray.height as i32
        {
            continue;
        }

        let mut min_v = 255u8;
        let mut max_v = 0u8;
        for dy in 0..full {
            for dx in 0..full {
                let v = gray.data[(y0 as usize + dy) * gray.width + x0 as usize + dx];
                min_v = min_v.min(v);
                max_v = max_v.max(v);
            }
        }

        if max_v - min_v < params.class_contrast_min {
            kp.class_id = 0;
            continue;
        }

        let threshold = (min_v as f64 + max_v as f64) / 2.0;
        let mut foreground = 0usize;
        for dy in 0..full {
            for dx in 0..full {
                let v = gray.data[(y0 as usize + dy) * gray.width + x0 as usize + dx];
                let lit = v as f64 > threshold;
                foreground += lit as usize;
                patch[dy * full + dx] = if lit { 255 } else { 0 };
            }
        }

        let regions = count_equal_value_regions(&patch, full, full);
        kp.class_id = match regions {
            2 => {
                if foreground > full * full - foreground {
                    0
                } else {
                    1
                }
            }
            n if n > 2 => 2,
            _ => 0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractal_markers_core::GrayImage;

    fn kp(x: f32, y: f32, response: f32) -> Keypoint {
        Keypoint {
            x,
            y,
            response,
            class_id: -1,
        }
    }

    #[test]
    fn kfilter_drops_low_band_and_near_duplicates() {
        let params = DetectorParams::default();
        let mut kps = vec![
            kp(10.0, 10.0, 100.0),
            kp(12.0, 10.0, 90.0),  // within 10 px of the first, weaker
            kp(50.0, 50.0, 80.0),
            kp(90.0, 90.0, 5.0),   // below the 20% band
        ];
        kfilter(&mut kps, &params);

        assert_eq!(kps.len(), 2);
        assert!(kps.iter().any(|k| k.x == 10.0 && k.response == 100.0));
        assert!(kps.iter().any(|k| k.x == 50.0));

        // No surviving pair closer than the merge radius, nothing under the
        // response band.
        let min = kps.iter().map(|k| k.response).fold(f32::INFINITY, f32::min);
        assert!(min >= 5.0 + 0.20 * (100.0 - 5.0));
        for i in 0..kps.len() {
            for j in i + 1..kps.len() {
                let d_sq =
                    (kps[i].x - kps[j].x).powi(2) + (kps[i].y - kps[j].y).powi(2);
                assert!(d_sq >= params.keypoint_merge_dist_sq);
            }
        }
    }

    #[test]
    fn kfilter_keeps_the_stronger_of_a_close_pair() {
        let params = DetectorParams::default();
        let mut kps = vec![kp(10.0, 10.0, 50.0), kp(13.0, 10.0, 120.0)];
        kfilter(&mut kps, &params);
        assert_eq!(kps.len(), 1);
        assert_eq!(kps[0].response, 120.0);
    }

    fn quadrant_image(light: [bool; 4]) -> GrayImage {
        // 2x2 blocks of 16x16 px; quadrant order TL, TR, BL, BR.
        let mut img = GrayImage::new(32, 32);
        for y in 0..32 {
            for x in 0..32 {
                let q = (y / 16) * 2 + x / 16;
                img.data[y * 32 + x] = if light[q] { 230 } else { 20 };
            }
        }
        img
    }

    #[test]
    fn classifies_light_dark_and_saddle_corners() {
        let params = DetectorParams::default();

        // One dark quadrant in a light field.
        let img = quadrant_image([true, true, true, false]);
        let mut kps = vec![kp(16.0, 16.0, 1.0)];
        assign_class(&img.view(), &mut kps, &params);
        assert_eq!(kps[0].class_id, 0);

        // One light quadrant in a dark field.
        let img = quadrant_image([false, false, false, true]);
        let mut kps = vec![kp(16.0, 16.0, 1.0)];
        assign_class(&img.view(), &mut kps, &params);
        assert_eq!(kps[0].class_id, 1);

        // Checkerboard saddle.
        let img = quadrant_image([true, false, false, true]);
        let mut kps = vec![kp(16.0, 16.0, 1.0)];
        assign_class(&img.view(), &mut kps, &params);
        assert_eq!(kps[0].class_id, 2);
    }

    #[test]
    fn flat_patch_defaults_to_class_zero() {
        let img = GrayImage {
            width: 32,
            height: 32,
            data: vec![128u8; 32 * 32],
        };
        let mut kps = vec![kp(16.0, 16.0, 1.0)];
        assign_class(&img.view(), &mut kps, &DetectorParams::default());
        assert_eq!(kps[0].class_id, 0);
    }

    #[test]
    fn out_of_bounds_patch_is_left_unset() {
        let img = GrayImage::new(32, 32);
        let mut kps = vec![kp(1.0, 1.0, 1.0)];
        assign_class(&img.view(), &mut kps, &DetectorParams::default());
        assert_eq!(kps[0].class_id, -1);
    }
}
