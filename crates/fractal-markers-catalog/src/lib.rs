//! Fractal marker catalogues.
//!
//! A fractal marker is a square bordered code whose interior nests smaller
//! markers recursively at known relative poses. This crate holds the typed
//! representation of such a hierarchy ([`FractalMarker`],
//! [`FractalMarkerSet`]), the four embedded predefined configurations, and
//! the decoder that turns a configuration blob into a ready-to-use set.
//!
//! ```
//! use fractal_markers_catalog::FractalMarkerSet;
//!
//! let set = FractalMarkerSet::from_config("FRACTAL_4L_6").expect("builtin config");
//! assert_eq!(set.len(), 4);
//! let root = set.external();
//! assert!(root.keypoints.len() > 4);
//! ```

pub mod builtins;
mod decode;
mod error;
mod marker;
mod set;

pub use error::CatalogError;
pub use marker::{BitGrid, CornerClass, FractalMarker, ModelKeypoint};
pub use set::{FractalMarkerSet, Unit};
