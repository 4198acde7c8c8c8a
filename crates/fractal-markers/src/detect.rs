//! `image`-crate integration: conversion, one-shot helpers and drawing.

use image::DynamicImage;
use nalgebra::{Point2, Point3};

use crate::core::GrayImageView;
use crate::{CatalogError, Detection, FractalDetector};

/// Errors produced by the high-level helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("unsupported image format: input must be 8-bit with 1 or 3 channels")]
    ImageFormat,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Borrow an `image::GrayImage` as the detector's view type.
pub fn gray_view(img: &image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Convert a 1- or 3-channel image to grayscale.
///
/// Uses the standard luma weights (0.299 red, 0.587 green, 0.114 blue);
/// other pixel layouts are rejected rather than silently reinterpreted.
pub fn to_gray(img: &DynamicImage) -> Result<image::GrayImage, DetectError> {
    match img {
        DynamicImage::ImageLuma8(gray) => Ok(gray.clone()),
        DynamicImage::ImageRgb8(rgb) => {
            let mut out = image::GrayImage::new(rgb.width(), rgb.height());
            for (src, dst) in rgb.pixels().zip(out.pixels_mut()) {
                let [r, g, b] = src.0;
                let luma =
                    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
                dst.0 = [(luma + 0.5) as u8];
            }
            Ok(out)
        }
        _ => Err(DetectError::ImageFormat),
    }
}

/// One-shot detection on a decoded image.
pub fn detect_fractal(
    img: &DynamicImage,
    config: &str,
    marker_size: Option<f32>,
) -> Result<Vec<Detection>, DetectError> {
    let gray = to_gray(img)?;
    let detector = FractalDetector::new(config, marker_size)?;
    Ok(detector.detect(&gray_view(&gray)))
}

/// One-shot detection plus the 2d/3d correspondence lists.
pub fn detect_fractal_correspondences(
    img: &DynamicImage,
    config: &str,
    marker_size: Option<f32>,
) -> Result<(Vec<Detection>, Vec<Point3<f32>>, Vec<Point2<f32>>), DetectError> {
    let gray = to_gray(img)?;
    let detector = FractalDetector::new(config, marker_size)?;
    Ok(detector.detect_with_correspondences(&gray_view(&gray)))
}

/// Draw a detection outline onto an RGB canvas.
///
/// Line width scales with the image width; the first corner gets a filled
/// square cue so the marker orientation is visible.
pub fn draw_detection(canvas: &mut image::RgbImage, det: &Detection, color: [u8; 3]) {
    let width = ((canvas.width() as f32 / 500.0).round() as i32).clamp(1, 5);
    for i in 0..4 {
        let a = det.corners[i];
        let b = det.corners[(i + 1) % 4];
        draw_line(canvas, a, b, color, width);
    }
    let cue = 2 * width;
    fill_rect(canvas, det.corners[0], cue, color);
}

fn draw_line(
    canvas: &mut image::RgbImage,
    a: Point2<f32>,
    b: Point2<f32>,
    color: [u8; 3],
    width: i32,
) {
    let steps = ((b.x - a.x).abs().max((b.y - a.y).abs()).ceil() as usize).max(1);
    for s in 0..=steps {
        let t = s as f32 / steps as f32;
        let x = a.x + t * (b.x - a.x);
        let y = a.y + t * (b.y - a.y);
        fill_rect(canvas, Point2::new(x, y), width / 2, color);
    }
}

fn fill_rect(canvas: &mut image::RgbImage, center: Point2<f32>, half: i32, color: [u8; 3]) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let cx = center.x.round() as i32;
    let cy = center.y.round() as i32;
    for y in cy - half..=cy + half {
        for x in cx - half..=cx + half {
            if x >= 0 && y >= 0 && x < w && y < h {
                canvas.put_pixel(x as u32, y as u32, image::Rgb(color));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_conversion_matches_luma_weights() {
        let mut rgb = image::RgbImage::new(2, 1);
        rgb.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        rgb.put_pixel(1, 0, image::Rgb([0, 0, 255]));
        let gray = to_gray(&DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!(gray.get_pixel(0, 0).0[0], 76); // 0.299 * 255
        assert_eq!(gray.get_pixel(1, 0).0[0], 29); // 0.114 * 255
    }

    #[test]
    fn unsupported_layouts_are_rejected() {
        let rgba = image::RgbaImage::new(4, 4);
        let err = to_gray(&DynamicImage::ImageRgba8(rgba)).unwrap_err();
        assert!(matches!(err, DetectError::ImageFormat));
    }

    #[test]
    fn unknown_config_propagates() {
        let gray = image::GrayImage::new(16, 16);
        let err = detect_fractal(&DynamicImage::ImageLuma8(gray), "FRACTAL_1L_6", None)
            .unwrap_err();
        assert!(matches!(err, DetectError::Catalog(CatalogError::UnknownConfig(_))));
    }
}
