use fractal_markers_core::{FastParams, RefineParams};
use serde::{Deserialize, Serialize};

/// Configuration for the detection pipeline.
///
/// The defaults are the values the pipeline was tuned with. Every constant
/// is exposed because most of them scale poorly across image resolutions and
/// deserve per-deployment tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Adaptive threshold window at the reference width (15 px at 1920
    /// columns); the actual window scales with the image and is forced odd,
    /// never below 3.
    pub adaptive_window_ref: f32,
    /// Subtractive constant of the adaptive threshold.
    pub adaptive_threshold_c: f32,
    /// Contours with fewer chain points than this are ignored.
    pub min_contour_len: usize,
    /// Polygon approximation tolerance, relative to the chain length.
    pub polygon_tolerance_rel: f64,
    /// Corner refinement used for both detections and correspondences.
    pub refine: RefineParams,
    /// FAST keypoint detection for the correspondence stage.
    pub fast: FastParams,
    /// Keypoints with response below `min + band * (max - min)` are dropped.
    pub response_band_rel: f32,
    /// Keypoints closer than this (squared pixels) merge into the stronger
    /// one.
    pub keypoint_merge_dist_sq: f32,
    /// Half window of the classification patch.
    pub class_window_half: usize,
    /// Patches with less min-max contrast than this are labelled flat.
    pub class_contrast_min: u8,
    /// Radius (squared pixels) of the nearest-neighbour search around each
    /// projected keypoint.
    pub search_radius_sq: f32,
    /// Upper bound (squared pixels) for accepting a projected-to-observed
    /// pairing.
    pub max_match_dist_sq: f32,
    /// Markers whose projected keypoints come closer than this (squared
    /// pixels) are considered too small to match inner corners.
    pub min_projected_sep_sq: f32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            adaptive_window_ref: 15.0 / 1920.0,
            adaptive_threshold_c: 7.0,
            min_contour_len: 120,
            polygon_tolerance_rel: 0.05,
            refine: RefineParams::default(),
            fast: FastParams::default(),
            response_band_rel: 0.20,
            keypoint_merge_dist_sq: 100.0,
            class_window_half: 5,
            class_contrast_min: 25,
            search_radius_sq: 400.0,
            max_match_dist_sq: 320.0,
            min_projected_sep_sq: 150.0,
        }
    }
}

impl DetectorParams {
    /// Adaptive threshold window for an image of the given width.
    pub(crate) fn adaptive_window(&self, cols: usize) -> usize {
        let mut w = ((self.adaptive_window_ref * cols as f32).round() as usize).max(3);
        if w % 2 == 0 {
            w += 1;
        }
        w
    }
}
