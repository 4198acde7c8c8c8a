//! Image primitives for fractal marker detection.
//!
//! This crate is self-contained and operates on borrowed grayscale buffers.
//! It provides the pieces the detector pipeline is built from: sampling,
//! thresholding, border following, polygon approximation, homographies,
//! corner refinement and FAST keypoints.

mod contour;
mod fast;
mod homography;
mod image;
mod labeling;
pub mod logger;
mod polygon;
mod refine;
mod threshold;

pub use contour::{find_contours, Contour};
pub use fast::{detect_fast, FastParams, Keypoint};
pub use homography::{estimate_homography, homography_from_4pt, Homography};
pub use image::{sample_bilinear, sample_subpixel, GrayImage, GrayImageView};
pub use labeling::count_equal_value_regions;
pub use polygon::{approx_polygon, is_convex};
pub use refine::{refine_corners, RefineParams};
pub use threshold::adaptive_threshold_mean_inv;
