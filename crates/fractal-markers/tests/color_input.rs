//! Color-image entry point behaves exactly like the grayscale path.

use fractal_markers::detect::{detect_fractal, gray_view};
use fractal_markers::{FractalDetector, FractalMarkerSet};
use image::DynamicImage;

/// Paint a marker (and recursively its children) into an integer pixel
/// square of a white canvas. Cell edges land on integer positions as long
/// as `len` divides evenly, which the test geometry ensures.
fn draw_marker(set: &FractalMarkerSet, id: i32, img: &mut image::GrayImage, x0: i32, y0: i32, len: i32) {
    let m = set.marker(id).expect("marker id");
    let s = m.side_bits() as i32;
    let cells = s + 2;

    for row in 0..cells {
        for col in 0..cells {
            let border = row == 0 || col == 0 || row == cells - 1 || col == cells - 1;
            let value = if border {
                0
            } else if m.mask.get((row - 1) as usize, (col - 1) as usize) != 0 {
                if m.bits.get((row - 1) as usize, (col - 1) as usize) != 0 {
                    255
                } else {
                    0
                }
            } else {
                continue; // child territory, painted below
            };

            let px0 = x0 + col * len / cells;
            let px1 = x0 + (col + 1) * len / cells;
            let py0 = y0 + row * len / cells;
            let py1 = y0 + (row + 1) * len / cells;
            for y in py0..py1 {
                for x in px0..px1 {
                    img.put_pixel(x as u32, y as u32, image::Luma([value]));
                }
            }
        }
    }

    for &child in &m.children {
        let ch = set.marker(child).expect("child id");
        let child_len =
            (len as f32 * ch.side_length() / m.side_length()).round() as i32;
        let offset = (len - child_len) / 2;
        draw_marker(set, child, img, x0 + offset, y0 + offset, child_len);
    }
}

fn marker_scene() -> image::GrayImage {
    let set = FractalMarkerSet::from_config("FRACTAL_2L_6").expect("builtin config");
    let mut img = image::GrayImage::from_pixel(512, 512, image::Luma([255]));
    draw_marker(&set, set.external_id(), &mut img, 76, 76, 360);
    img
}

#[test]
fn color_and_gray_inputs_agree() {
    let gray = marker_scene();

    let mut rgb = image::RgbImage::new(512, 512);
    for (g, p) in gray.pixels().zip(rgb.pixels_mut()) {
        let v = g.0[0];
        p.0 = [v, v, v];
    }

    let from_color = detect_fractal(&DynamicImage::ImageRgb8(rgb), "FRACTAL_2L_6", None)
        .expect("detection on color input");

    let detector = FractalDetector::new("FRACTAL_2L_6", None).expect("builtin config");
    let from_gray = detector.detect(&gray_view(&gray));

    assert!(!from_color.is_empty());
    assert!(from_color.iter().any(|d| d.id == 0), "root marker expected");
    assert_eq!(from_color.len(), from_gray.len());
    for (a, b) in from_color.iter().zip(&from_gray) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.corners, b.corners);
    }
}
