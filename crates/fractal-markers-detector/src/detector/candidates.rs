//! Candidate quad extraction from the thresholded image.

use fractal_markers_core::{
    adaptive_threshold_mean_inv, approx_polygon, find_contours, is_convex, GrayImageView,
};
use nalgebra::Point2;

use super::DetectorParams;

/// Threshold the image, trace contours and keep 4-vertex convex polygons,
/// all wound the same way.
pub(crate) fn find_candidate_quads(
    gray: &GrayImageView<'_>,
    params: &DetectorParams,
) -> Vec<[Point2<f32>; 4]> {
    let window = params.adaptive_window(gray.width);
    let bin = adaptive_threshold_mean_inv(gray, window, params.adaptive_threshold_c);
    let contours = find_contours(&bin.view());

    let mut quads = Vec::new();
    for contour in &contours {
        if contour.points.len() < params.min_contour_len {
            continue;
        }
        let eps = contour.points.len() as f64 * params.polygon_tolerance_rel;
        let poly = approx_polygon(&contour.points, eps);
        if poly.len() != 4 || !is_convex(&poly) {
            continue;
        }

        let mut quad = [
            Point2::new(poly[0].x as f32, poly[0].y as f32),
            Point2::new(poly[1].x as f32, poly[1].y as f32),
            Point2::new(poly[2].x as f32, poly[2].y as f32),
            Point2::new(poly[3].x as f32, poly[3].y as f32),
        ];
        sort_winding(&mut quad);
        quads.push(quad);
    }
    quads
}

/// Normalize the winding so every quad turns the same way: when the third
/// vertex lies on the negative side of the first edge, swap v1 and v3.
fn sort_winding(quad: &mut [Point2<f32>; 4]) {
    let dx1 = (quad[1].x - quad[0].x) as f64;
    let dy1 = (quad[1].y - quad[0].y) as f64;
    let dx2 = (quad[2].x - quad[0].x) as f64;
    let dy2 = (quad[2].y - quad[0].y) as f64;
    if dx1 * dy2 - dy1 * dx2 < 0.0 {
        quad.swap(1, 3);
    }
}
