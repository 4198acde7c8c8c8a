use fractal_markers_catalog::{CatalogError, FractalMarkerSet};
use fractal_markers_core::{refine_corners, GrayImageView};
use log::debug;
use nalgebra::{Point2, Point3};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::candidates::find_candidate_quads;
use super::identify::{identify_code, perimeter, sample_code};
use super::{Detection, DetectorParams};
use crate::correspond::build_correspondences;

/// Fractal marker detector.
///
/// Holds one immutable marker set plus the pipeline parameters; a detector
/// can be shared across threads and invoked concurrently.
#[derive(Clone, Debug)]
pub struct FractalDetector {
    set: FractalMarkerSet,
    params: DetectorParams,
}

impl FractalDetector {
    /// Create a detector for a predefined configuration.
    ///
    /// When `marker_size` is given (side length of the external marker in
    /// meters), all catalogue coordinates are rescaled so the emitted 3-d
    /// points are metric.
    pub fn new(config: &str, marker_size: Option<f32>) -> Result<Self, CatalogError> {
        let mut set = FractalMarkerSet::from_config(config)?;
        if let Some(size) = marker_size {
            set.convert_to_meters(size)?;
        }
        Ok(Self {
            set,
            params: DetectorParams::default(),
        })
    }

    pub fn with_params(mut self, params: DetectorParams) -> Self {
        self.params = params;
        self
    }

    #[inline]
    pub fn marker_set(&self) -> &FractalMarkerSet {
        &self.set
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Detect fractal markers and return their refined external corners.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, gray), fields(w = gray.width, h = gray.height))
    )]
    pub fn detect(&self, gray: &GrayImageView<'_>) -> Vec<Detection> {
        let quads = find_candidate_quads(gray, &self.params);
        debug!("candidate quads: {}", quads.len());

        let mut accepted: Vec<(i32, [Point2<f32>; 4])> = Vec::new();
        for quad in &quads {
            for (bit_count, ids) in self.set.bits_by_count() {
                let cells = (bit_count as f64).sqrt() as usize + 2;
                let Some(code) = sample_code(gray, quad, cells) else {
                    continue;
                };
                let Some((id, nrot)) = identify_code(&code, ids, &self.set) else {
                    continue;
                };
                // Undo the observed rotation so corner 0 is the catalogue
                // top-left.
                let mut corners = *quad;
                corners.rotate_left((4 - nrot) % 4);
                accepted.push((id, corners));
            }
        }

        // One detection per id, largest perimeter wins.
        accepted.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| perimeter(&b.1).cmp(&perimeter(&a.1)))
        });
        accepted.dedup_by_key(|(id, _)| *id);
        debug!("identified markers: {}", accepted.len());

        if accepted.is_empty() {
            return Vec::new();
        }

        // Joint subpixel refinement over all corners.
        let mut corners: Vec<Point2<f32>> = accepted
            .iter()
            .flat_map(|(_, quad)| quad.iter().copied())
            .collect();
        refine_corners(gray, &mut corners, self.params.refine);

        accepted
            .iter()
            .enumerate()
            .map(|(i, &(id, _))| Detection {
                id,
                corners: [
                    corners[i * 4],
                    corners[i * 4 + 1],
                    corners[i * 4 + 2],
                    corners[i * 4 + 3],
                ],
            })
            .collect()
    }

    /// Detect markers and build the extended 2d/3d correspondence lists.
    ///
    /// The two returned vectors are parallel: `p3d[i]` is the catalogue
    /// position matching image point `p2d[i]`. Every marker detected
    /// directly contributes at least its four external corners.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, gray), fields(w = gray.width, h = gray.height))
    )]
    pub fn detect_with_correspondences(
        &self,
        gray: &GrayImageView<'_>,
    ) -> (Vec<Detection>, Vec<Point3<f32>>, Vec<Point2<f32>>) {
        let detections = self.detect(gray);
        if detections.is_empty() {
            return (detections, Vec::new(), Vec::new());
        }

        let (p3d, p2d) = build_correspondences(gray, &detections, &self.set, &self.params);
        debug!("correspondences: {}", p2d.len());
        (detections, p3d, p2d)
    }
}
