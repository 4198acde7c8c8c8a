//! Extended 2d/3d correspondence building on top of primary detections.

mod keypoints;
mod matching;

pub(crate) use matching::build_correspondences;
