//! Fractal marker detection.
//!
//! Detects nested square fiducial markers in grayscale images and, on
//! request, builds 2d/3d point correspondences over the internal marker
//! corners, ready for pose estimation.
//!
//! ```no_run
//! use fractal_markers_core::GrayImageView;
//! use fractal_markers_detector::FractalDetector;
//!
//! let detector = FractalDetector::new("FRACTAL_4L_6", None).expect("builtin config");
//! let pixels = vec![0u8; 640 * 480];
//! let view = GrayImageView { width: 640, height: 480, data: &pixels };
//!
//! for det in detector.detect(&view) {
//!     println!("marker {} at {:?}", det.id, det.corners[0]);
//! }
//! ```

mod correspond;
mod detector;

pub use detector::{Detection, DetectorParams, FractalDetector};
