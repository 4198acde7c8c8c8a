//! Homography-driven matching of catalogue keypoints to image keypoints.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use fractal_markers_catalog::FractalMarkerSet;
use fractal_markers_core::{detect_fast, estimate_homography, refine_corners, GrayImageView};
use kiddo::{KdTree, SquaredEuclidean};
use log::debug;
use nalgebra::{Point2, Point3};

use super::keypoints::{assign_class, kfilter};
use crate::detector::{Detection, DetectorParams};

/// Build `(p3d, p2d)` correspondence lists from the primary detections.
///
/// A global object-to-image homography is estimated from the detected
/// external corners, every catalogue keypoint is projected through it and
/// matched against classified FAST keypoints. Markers projecting too small
/// for their inner corners to resolve fall back to their detected external
/// corners.
pub(crate) fn build_correspondences(
    gray: &GrayImageView<'_>,
    detections: &[Detection],
    set: &FractalMarkerSet,
    params: &DetectorParams,
) -> (Vec<Point3<f32>>, Vec<Point2<f32>>) {
    let mut obj = Vec::with_capacity(detections.len() * 4);
    let mut img = Vec::with_capacity(detections.len() * 4);
    for det in detections {
        let Some(marker) = set.marker(det.id) else {
            continue;
        };
        img.extend_from_slice(&det.corners);
        obj.extend(marker.keypoints.iter().take(4).map(|kp| kp.position));
    }

    let Some(h) = estimate_homography(&obj, &img) else {
        debug!("global homography estimation failed; skipping extended matching");
        return (Vec::new(), Vec::new());
    };

    let mut kpoints = detect_fast(gray, &params.fast);
    kfilter(&mut kpoints, params);
    assign_class(gray, &mut kpoints, params);
    debug!("classified keypoints: {}", kpoints.len());

    let coords: Vec<[f32; 2]> = kpoints.iter().map(|kp| [kp.x, kp.y]).collect();
    let tree: Option<KdTree<f32, 2>> = (!coords.is_empty()).then(|| (&coords).into());

    let mut p3d: Vec<Point3<f32>> = Vec::new();
    let mut p2d: Vec<Point2<f32>> = Vec::new();
    // FAST keypoint index -> (output slot, accepted projection distance).
    let mut claims: HashMap<usize, (usize, f32)> = HashMap::new();

    for marker in set.markers() {
        let projected: Vec<Point2<f32>> = marker
            .keypoints
            .iter()
            .map(|kp| h.apply(kp.position))
            .collect();

        if !separation_ok(&projected, params.min_projected_sep_sq) {
            // Too small for inner corners; keep at least the external ones
            // when this marker was detected directly.
            if let Some(det) = detections.iter().find(|d| d.id == marker.id) {
                for (kp, &corner) in marker.keypoints.iter().take(4).zip(det.corners.iter()) {
                    p3d.push(Point3::new(kp.position.x, kp.position.y, 0.0));
                    p2d.push(corner);
                }
            }
            continue;
        }

        let Some(tree) = tree.as_ref() else {
            continue;
        };

        for (idx, p) in projected.iter().enumerate() {
            if !(p.x > 0.0 && p.x < gray.width as f32 && p.y > 0.0 && p.y < gray.height as f32) {
                continue;
            }

            let nn = tree.nearest_one::<SquaredEuclidean>(&[p.x, p.y]);
            if nn.distance > params.search_radius_sq {
                continue;
            }
            let kp_idx = nn.item as usize;
            let observed = &kpoints[kp_idx];
            if observed.class_id != marker.keypoints[idx].class.index()
                || nn.distance > params.max_match_dist_sq
                || nn.distance == 0.0
            {
                continue;
            }

            let real_dist =
                ((observed.x - p.x).powi(2) + (observed.y - p.y).powi(2)).sqrt();
            let model = marker.keypoints[idx].position;

            match claims.entry(kp_idx) {
                Entry::Occupied(mut entry) => {
                    // The same image keypoint can be claimed once; keep the
                    // projection it sits closest to.
                    let (slot, best) = entry.get_mut();
                    if real_dist < *best {
                        p3d[*slot] = Point3::new(model.x, model.y, 0.0);
                        p2d[*slot] = Point2::new(observed.x, observed.y);
                        *best = real_dist;
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert((p2d.len(), real_dist));
                    p3d.push(Point3::new(model.x, model.y, 0.0));
                    p2d.push(Point2::new(observed.x, observed.y));
                }
            }
        }
    }

    if !p2d.is_empty() {
        refine_corners(gray, &mut p2d, params.refine);
    }
    (p3d, p2d)
}

fn separation_ok(projected: &[Point2<f32>], min_sep_sq: f32) -> bool {
    for i in 0..projected.len().saturating_sub(1) {
        for j in i + 1..projected.len() {
            let d_sq = (projected[i].x - projected[j].x).powi(2)
                + (projected[i].y - projected[j].y).powi(2);
            if d_sq < min_sep_sq {
                return false;
            }
        }
    }
    true
}
