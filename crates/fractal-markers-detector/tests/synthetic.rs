//! End-to-end scenarios on synthetic renderings of FRACTAL_4L_6.

use fractal_markers_catalog::FractalMarkerSet;
use fractal_markers_core::GrayImage;
use fractal_markers_detector::FractalDetector;
use nalgebra::Point2;

/// Continuous sample of the fractal marker pattern at a point of the
/// marker-set plane; `None` outside the external marker.
fn pattern_value(set: &FractalMarkerSet, id: i32, px: f32, py: f32) -> Option<u8> {
    let m = set.marker(id).expect("marker id");
    let half = m.side_length() / 2.0;
    if px.abs() > half || py.abs() > half {
        return None;
    }
    let s = m.side_bits();
    let bit = m.bit_size();
    let col = (((px + half) / bit).floor() as i32).clamp(0, s as i32 + 1) as usize;
    let row = (((half - py) / bit).floor() as i32).clamp(0, s as i32 + 1) as usize;
    if col == 0 || row == 0 || col == s + 1 || row == s + 1 {
        return Some(0);
    }
    let (r, c) = (row - 1, col - 1);
    if m.mask.get(r, c) != 0 {
        return Some(if m.bits.get(r, c) != 0 { 255 } else { 0 });
    }
    for &child in &m.children {
        let ch = set.marker(child).expect("child id");
        let ch_half = ch.side_length() / 2.0;
        if px.abs() <= ch_half && py.abs() <= ch_half {
            if let Some(v) = pattern_value(set, child, px, py) {
                return Some(v);
            }
        }
    }
    Some(255)
}

/// Render the external marker into a square region `[x0, x0+len)²` of a
/// white canvas, 2x2 supersampled so edges are antialiased.
fn render(set: &FractalMarkerSet, w: usize, h: usize, x0: f32, y0: f32, len: f32) -> GrayImage {
    const SS: usize = 2;
    let root_side = set.external().side_length();
    let mut img = GrayImage::new(w, h);
    for i in 0..h {
        for j in 0..w {
            let mut acc = 0.0f32;
            for si in 0..SS {
                for sj in 0..SS {
                    let px = j as f32 + (sj as f32 + 0.5) / SS as f32;
                    let py = i as f32 + (si as f32 + 0.5) / SS as f32;
                    let mx = (px - x0) / len * root_side - root_side / 2.0;
                    let my = root_side / 2.0 - (py - y0) / len * root_side;
                    acc += pattern_value(set, set.external_id(), mx, my).unwrap_or(255) as f32;
                }
            }
            img.data[i * w + j] = (acc / (SS * SS) as f32 + 0.5).min(255.0) as u8;
        }
    }
    img
}

fn rot90_cw(img: &GrayImage) -> GrayImage {
    let (w, h) = (img.width, img.height);
    let mut out = GrayImage::new(h, w);
    for y in 0..w {
        for x in 0..h {
            out.data[y * h + x] = img.data[(h - 1 - x) * w + y];
        }
    }
    out
}

fn detector() -> FractalDetector {
    FractalDetector::new("FRACTAL_4L_6", None).expect("builtin config")
}

#[test]
fn upright_marker_detects_root_with_subpixel_corners() {
    let det = detector();
    let img = render(det.marker_set(), 512, 512, 36.0, 36.0, 440.0);
    let detections = det.detect(&img.view());

    let root = detections
        .iter()
        .find(|d| d.id == det.marker_set().external_id())
        .expect("external marker detected");

    let expected = [
        Point2::new(35.5f32, 35.5),
        Point2::new(475.5, 35.5),
        Point2::new(475.5, 475.5),
        Point2::new(35.5, 475.5),
    ];
    for (got, want) in root.corners.iter().zip(&expected) {
        let err = ((got.x - want.x).powi(2) + (got.y - want.y).powi(2)).sqrt();
        assert!(err <= 0.5, "corner {got:?} vs {want:?} (err {err:.3})");
    }
}

#[test]
fn upright_marker_yields_rich_correspondences() {
    let det = detector();
    let img = render(det.marker_set(), 512, 512, 36.0, 36.0, 440.0);
    let (detections, p3d, p2d) = det.detect_with_correspondences(&img.view());

    assert!(!detections.is_empty());
    assert_eq!(p3d.len(), p2d.len());
    assert!(
        p2d.len() > 4,
        "expected inner-corner matches, got {}",
        p2d.len()
    );

    // Every matched image point is claimed exactly once.
    let mut seen: Vec<(u32, u32)> = p2d.iter().map(|p| (p.x.to_bits(), p.y.to_bits())).collect();
    seen.sort_unstable();
    let before = seen.len();
    seen.dedup();
    assert_eq!(seen.len(), before, "duplicate p2d entries");
}

#[test]
fn rotated_markers_keep_canonical_corner_order() {
    let det = detector();
    let mut img = render(det.marker_set(), 512, 512, 36.0, 36.0, 440.0);

    // Model top-left corner position, tracked through image rotations:
    // a point (x, y) moves to (H - 1 - y, x) under a 90° clockwise turn.
    let mut top_left = Point2::new(35.5f32, 35.5);

    for quarter in 0..4 {
        let detections = det.detect(&img.view());
        let root = detections
            .iter()
            .find(|d| d.id == det.marker_set().external_id())
            .unwrap_or_else(|| panic!("root missing after {quarter} rotations"));

        let got = root.corners[0];
        let err = ((got.x - top_left.x).powi(2) + (got.y - top_left.y).powi(2)).sqrt();
        assert!(
            err <= 1.0,
            "rotation {quarter}: corner0 {got:?} vs {top_left:?}"
        );

        img = rot90_cw(&img);
        top_left = Point2::new(512.0 - 1.0 - top_left.y, top_left.x);
    }
}

#[test]
fn tiny_marker_falls_back_to_external_corners() {
    let det = detector();
    // 55 px across: projected inner keypoints sit well under the
    // separation gate.
    let img = render(det.marker_set(), 160, 160, 50.0, 50.0, 55.0);
    let (detections, p3d, p2d) = det.detect_with_correspondences(&img.view());

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].id, det.marker_set().external_id());
    assert_eq!(p2d.len(), 4, "external corners only");
    assert_eq!(p3d.len(), 4);

    // The 3-d side matches the catalogue's external corners.
    let root = det.marker_set().external();
    for (p, c) in p3d.iter().zip(&root.external_corners) {
        assert!((p.x - c.x).abs() < 1e-6 && (p.y - c.y).abs() < 1e-6 && p.z == 0.0);
    }
}

#[test]
fn occluded_child_region_does_not_break_the_root() {
    let det = detector();
    let mut img = render(det.marker_set(), 512, 512, 36.0, 36.0, 440.0);
    // Black out the nested-marker region in the middle.
    for y in 190..330 {
        for x in 190..330 {
            img.data[y * 512 + x] = 0;
        }
    }

    let (detections, _p3d, p2d) = det.detect_with_correspondences(&img.view());

    assert!(
        detections.iter().any(|d| d.id == det.marker_set().external_id()),
        "root must survive the occlusion"
    );
    assert!(!p2d.is_empty());
    // Nothing matches deep inside the blacked-out area.
    for p in &p2d {
        let inside = p.x > 215.0 && p.x < 305.0 && p.y > 215.0 && p.y < 305.0;
        assert!(!inside, "correspondence {p:?} inside the occluded region");
    }
}

#[test]
fn noise_image_yields_empty_results() {
    let det = detector();
    let mut img = GrayImage::new(256, 256);
    let mut state = 0x2545_f491_4f6c_dd1du64;
    for v in img.data.iter_mut() {
        // xorshift64*
        state ^= state >> 12;
        state ^= state << 25;
        state ^= state >> 27;
        *v = (state.wrapping_mul(0x2545_f491_4f6c_dd1d) >> 56) as u8;
    }

    let (detections, p3d, p2d) = det.detect_with_correspondences(&img.view());
    assert!(detections.is_empty());
    assert!(p3d.is_empty() && p2d.is_empty());
}

#[test]
fn detection_is_deterministic() {
    let det = detector();
    let img = render(det.marker_set(), 512, 512, 36.0, 36.0, 440.0);

    let a = det.detect(&img.view());
    let b = det.detect(&img.view());
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.id, y.id);
        assert_eq!(x.corners, y.corners);
    }
}

#[test]
fn metric_catalogue_emits_metric_p3d() {
    let det = FractalDetector::new("FRACTAL_4L_6", Some(0.85)).expect("builtin config");
    let img = render(det.marker_set(), 160, 160, 50.0, 50.0, 55.0);
    let (_detections, p3d, _p2d) = det.detect_with_correspondences(&img.view());

    assert_eq!(p3d.len(), 4);
    // External corners at +/- 0.425 m.
    for p in &p3d {
        assert!((p.x.abs() - 0.425).abs() < 1e-4);
        assert!((p.y.abs() - 0.425).abs() < 1e-4);
    }
}
