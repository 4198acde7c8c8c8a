//! A single marker of a fractal hierarchy.

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Local topology of a corner keypoint.
///
/// The numeric values are shared between the catalogue (computed from the
/// bit pattern) and the runtime classifier (computed from image patches), so
/// model and image keypoints can be matched by class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CornerClass {
    /// Light-dominant corner: a single dark quadrant in a light field.
    LightCorner = 0,
    /// Dark-dominant corner: a single light quadrant in a dark field.
    DarkCorner = 1,
    /// Checkerboard saddle: two regions meeting diagonally.
    Saddle = 2,
}

impl CornerClass {
    #[inline]
    pub fn index(self) -> i32 {
        self as i32
    }
}

/// A catalogue keypoint: position in the marker-set plane (z = 0) plus its
/// corner class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelKeypoint {
    pub position: Point2<f32>,
    pub class: CornerClass,
}

/// Square cell matrix backing marker bits, masks and sampled codes.
///
/// Cells are compared for zero/non-zero only, so 0/1 bit matrices and 0/255
/// sampled matrices interoperate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitGrid {
    side: usize,
    cells: Vec<u8>,
}

impl BitGrid {
    pub fn filled(side: usize, value: u8) -> Self {
        Self {
            side,
            cells: vec![value; side * side],
        }
    }

    pub fn from_cells(side: usize, cells: Vec<u8>) -> Self {
        assert_eq!(cells.len(), side * side);
        Self { side, cells }
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.side + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.cells[row * self.side + col] = value;
    }

    /// Rotate a quarter turn clockwise: `out[r][c] = in[side-1-c][r]`.
    pub fn rotated_cw(&self) -> Self {
        let n = self.side;
        let mut out = Self::filled(n, 0);
        for r in 0..n {
            for c in 0..n {
                out.cells[r * n + c] = self.cells[(n - 1 - c) * n + r];
            }
        }
        out
    }
}

/// One marker of a fractal set: its inner code, the mask hiding nested
/// children, and its corner geometry in the set's coordinate frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FractalMarker {
    pub id: i32,
    /// Inner code cells (no border), 1 = light.
    pub bits: BitGrid,
    /// 1 where the cell belongs to this marker, 0 where a child covers it.
    pub mask: BitGrid,
    /// Outer corners, clockwise from top-left, z = 0. The frame is centred
    /// on the marker with the y axis pointing up.
    pub external_corners: [Point3<f32>; 4],
    /// All corner keypoints; the first four are the external corners.
    pub keypoints: Vec<ModelKeypoint>,
    /// Ids of directly nested markers.
    pub children: Vec<i32>,
}

impl FractalMarker {
    /// Side length of the inner code in cells.
    #[inline]
    pub fn side_bits(&self) -> usize {
        self.bits.side()
    }

    /// Physical side length, border included, in the set's current unit.
    pub fn side_length(&self) -> f32 {
        let a = &self.external_corners[0];
        let b = &self.external_corners[1];
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2) + (a.z - b.z).powi(2)).sqrt()
    }

    /// Size of one code cell (the border counts as one extra cell per side).
    #[inline]
    pub fn bit_size(&self) -> f32 {
        self.side_length() / (self.side_bits() + 2) as f32
    }
}
