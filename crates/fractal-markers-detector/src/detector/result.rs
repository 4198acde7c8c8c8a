use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One detected fractal marker.
///
/// Corners are subpixel-refined image positions, ordered so that
/// `corners[0]` corresponds to the catalogue marker's top-left external
/// corner regardless of the marker's rotation in the image.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Detection {
    pub id: i32,
    pub corners: [Point2<f32>; 4],
}
