//! High-level facade for the `fractal-markers-*` workspace.
//!
//! Fractal markers are square fiducials whose interior nests progressively
//! smaller markers. At long range only the outer marker is legible; up
//! close the nested levels contribute extra corner correspondences, which
//! makes the family robust to occlusion and distance changes.
//!
//! ```no_run
//! use fractal_markers::FractalDetector;
//! use fractal_markers_core::GrayImageView;
//!
//! let detector = FractalDetector::new("FRACTAL_4L_6", Some(0.85)).expect("builtin config");
//! let pixels = vec![0u8; 1280 * 720];
//! let view = GrayImageView { width: 1280, height: 720, data: &pixels };
//!
//! let (detections, p3d, p2d) = detector.detect_with_correspondences(&view);
//! println!("{} markers, {} correspondences", detections.len(), p2d.len());
//! // p3d / p2d are ready for a PnP solver.
//! ```

pub use fractal_markers_catalog as catalog;
pub use fractal_markers_core as core;
pub use fractal_markers_detector as detector;

pub use fractal_markers_catalog::{
    CatalogError, CornerClass, FractalMarker, FractalMarkerSet, Unit,
};
pub use fractal_markers_detector::{Detection, DetectorParams, FractalDetector};

#[cfg(feature = "image")]
pub mod detect;
