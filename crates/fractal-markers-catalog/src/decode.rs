//! Binary catalogue decoding.
//!
//! The wire format is little-endian with no padding:
//!
//! ```text
//! i32  unit tag (-1 none, 0 pixels, 1 meters, 2 normalized)
//! i32  marker count
//! i32  external marker id
//! per marker:
//!   i32        id
//!   i32        bit count (side², side in cells)
//!   4 x 3 f32  external corners (x, y, z), clockwise from top-left
//!   u8 x bits  inner code cells, row-major
//!   i32        child count
//!   i32 x n    child ids
//! ```
//!
//! Decoding runs in three passes: read the records, carve each child's
//! rectangle out of its parent's mask, then extract the inner keypoints from
//! the masked bit pattern.

use std::collections::BTreeMap;

use nalgebra::{Point2, Point3};

use crate::{
    builtins, BitGrid, CatalogError, CornerClass, FractalMarker, FractalMarkerSet, ModelKeypoint,
    Unit,
};

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], CatalogError> {
        if self.buf.len() - self.pos < n {
            return Err(CatalogError::MalformedBlob(what));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_i32(&mut self, what: &'static str) -> Result<i32, CatalogError> {
        let b = self.take(4, what)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_f32(&mut self, what: &'static str) -> Result<f32, CatalogError> {
        let b = self.take(4, what)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

impl FractalMarkerSet {
    /// Build the named predefined configuration.
    pub fn from_config(name: &str) -> Result<Self, CatalogError> {
        let blob = builtins::builtin_config(name)
            .ok_or_else(|| CatalogError::UnknownConfig(name.to_string()))?;
        Self::decode(blob)
    }

    /// Decode a marker-set blob.
    pub fn decode(bytes: &[u8]) -> Result<Self, CatalogError> {
        let mut r = Reader::new(bytes);

        let unit = Unit::from_wire(r.read_i32("truncated header")?)
            .ok_or(CatalogError::MalformedBlob("unrecognized unit tag"))?;
        let count = r.read_i32("truncated header")?;
        if count <= 0 {
            return Err(CatalogError::MalformedBlob("non-positive marker count"));
        }
        let external_id = r.read_i32("truncated header")?;

        let mut markers = Vec::with_capacity(count as usize);
        for _ in 0..count {
            markers.push(read_marker(&mut r)?);
        }
        if r.remaining() != 0 {
            return Err(CatalogError::MalformedBlob("trailing bytes after last marker"));
        }

        carve_child_masks(&mut markers)?;
        for m in &mut markers {
            extract_inner_keypoints(m);
        }

        Self::assemble(markers, external_id, unit)
    }
}

fn read_marker(r: &mut Reader<'_>) -> Result<FractalMarker, CatalogError> {
    let id = r.read_i32("truncated marker record")?;

    let bit_count = r.read_i32("truncated marker record")?;
    if bit_count <= 0 {
        return Err(CatalogError::MalformedBlob("non-positive bit count"));
    }
    let side = (bit_count as f64).sqrt() as usize;
    if side * side != bit_count as usize {
        return Err(CatalogError::MalformedBlob("bit count is not a square"));
    }

    let mut corners = [Point3::origin(); 4];
    for c in &mut corners {
        let x = r.read_f32("truncated corner data")?;
        let y = r.read_f32("truncated corner data")?;
        let z = r.read_f32("truncated corner data")?;
        *c = Point3::new(x, y, z);
    }

    let cells = r.take(bit_count as usize, "truncated bit matrix")?.to_vec();
    let bits = BitGrid::from_cells(side, cells);

    let child_count = r.read_i32("truncated child list")?;
    if child_count < 0 {
        return Err(CatalogError::MalformedBlob("negative child count"));
    }
    let mut children = Vec::with_capacity(child_count as usize);
    for _ in 0..child_count {
        children.push(r.read_i32("truncated child list")?);
    }

    // External corners double as the first four keypoints, class 0 by
    // convention.
    let keypoints = corners
        .iter()
        .map(|c| ModelKeypoint {
            position: Point2::new(c.x, c.y),
            class: CornerClass::LightCorner,
        })
        .collect();

    Ok(FractalMarker {
        id,
        mask: BitGrid::filled(side, 1),
        bits,
        external_corners: corners,
        keypoints,
        children,
    })
}

/// Zero the mask cells of every parent where a child marker is nested.
fn carve_child_masks(markers: &mut [FractalMarker]) -> Result<(), CatalogError> {
    let geometry: BTreeMap<i32, (f32, Point3<f32>)> = markers
        .iter()
        .map(|m| (m.id, (m.side_length(), m.external_corners[0])))
        .collect();

    for parent in markers.iter_mut() {
        let side = parent.side_bits();
        let bit = parent.bit_size();
        for child_id in parent.children.clone() {
            let &(child_len, child_tl) = geometry
                .get(&child_id)
                .ok_or(CatalogError::MalformedBlob("child id not present in the set"))?;

            let sub = (child_len / bit).round() as i64;
            let half = side as f32 / 2.0;
            let x_min = (child_tl.x / bit + half).round() as i64;
            let y_min = (-child_tl.y / bit + half).round() as i64;

            if x_min < 0 || y_min < 0 || x_min + sub > side as i64 || y_min + sub > side as i64 {
                return Err(CatalogError::MalformedBlob(
                    "child rectangle outside the parent grid",
                ));
            }
            for y in y_min..y_min + sub {
                for x in x_min..x_min + sub {
                    parent.mask.set(y as usize, x as usize, 0);
                }
            }
        }
    }
    Ok(())
}

/// Scan the masked bit pattern for interior corner keypoints.
///
/// The marker matrix is taken with child regions forced light, padded with
/// the one-cell dark border, and every 2x2 window is classified by its sum:
/// one light cell is a dark-dominant corner, three light cells a
/// light-dominant one, and a diagonal pair a saddle.
fn extract_inner_keypoints(marker: &mut FractalMarker) {
    let side = marker.side_bits();
    let padded = side + 2;
    let bit = marker.bit_size();

    let mut grid = BitGrid::filled(padded, 0);
    for y in 0..side {
        for x in 0..side {
            let v = if marker.mask.get(y, x) != 0 {
                marker.bits.get(y, x)
            } else {
                1
            };
            grid.set(y + 1, x + 1, v);
        }
    }

    let half = side as f32 / 2.0;
    for y in 0..padded - 1 {
        for x in 0..padded - 1 {
            let tl = grid.get(y, x);
            let tr = grid.get(y, x + 1);
            let bl = grid.get(y + 1, x);
            let br = grid.get(y + 1, x + 1);

            let class = match tl + tr + bl + br {
                1 => CornerClass::DarkCorner,
                3 => CornerClass::LightCorner,
                2 if tl == br && tr == bl => CornerClass::Saddle,
                _ => continue,
            };
            marker.keypoints.push(ModelKeypoint {
                position: Point2::new((x as f32 - half) * bit, -(y as f32 - half) * bit),
                class,
            });
        }
    }
}
