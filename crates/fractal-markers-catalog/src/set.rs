//! The marker-set container: markers by id plus detection indices.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CatalogError, FractalMarker};

/// Unit of the corner and keypoint coordinates of a set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    None,
    Pixels,
    Meters,
    Normalized,
}

impl Unit {
    pub(crate) fn from_wire(v: i32) -> Option<Self> {
        match v {
            -1 => Some(Unit::None),
            0 => Some(Unit::Pixels),
            1 => Some(Unit::Meters),
            2 => Some(Unit::Normalized),
            _ => None,
        }
    }
}

/// An immutable catalogue of nested markers.
///
/// Built once by the blob decoder, optionally rescaled to meters, and then
/// shared read-only by detectors. Markers are stored in a flat vector in id
/// order; the hierarchy is a forest expressed through `children` ids.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FractalMarkerSet {
    markers: Vec<FractalMarker>,
    index: BTreeMap<i32, usize>,
    /// Marker ids grouped by their bit count (side²), the detector's
    /// shortlist per sampled grid size.
    bits_by_count: BTreeMap<usize, Vec<i32>>,
    external_id: i32,
    unit: Unit,
}

impl FractalMarkerSet {
    pub(crate) fn assemble(
        markers: Vec<FractalMarker>,
        external_id: i32,
        unit: Unit,
    ) -> Result<Self, CatalogError> {
        let mut index = BTreeMap::new();
        let mut bits_by_count: BTreeMap<usize, Vec<i32>> = BTreeMap::new();
        for (i, m) in markers.iter().enumerate() {
            if index.insert(m.id, i).is_some() {
                return Err(CatalogError::MalformedBlob("duplicate marker id"));
            }
            bits_by_count
                .entry(m.side_bits() * m.side_bits())
                .or_default()
                .push(m.id);
        }
        if !index.contains_key(&external_id) {
            return Err(CatalogError::MalformedBlob(
                "external marker id not present in the set",
            ));
        }
        for m in &markers {
            for child in &m.children {
                if !index.contains_key(child) {
                    return Err(CatalogError::MalformedBlob("child id not present in the set"));
                }
            }
        }
        Ok(Self {
            markers,
            index,
            bits_by_count,
            external_id,
            unit,
        })
    }

    #[inline]
    pub fn unit(&self) -> Unit {
        self.unit
    }

    #[inline]
    pub fn external_id(&self) -> i32 {
        self.external_id
    }

    /// The outermost marker of the hierarchy.
    pub fn external(&self) -> &FractalMarker {
        &self.markers[self.index[&self.external_id]]
    }

    pub fn marker(&self, id: i32) -> Option<&FractalMarker> {
        self.index.get(&id).map(|&i| &self.markers[i])
    }

    /// Markers in ascending id order.
    pub fn markers(&self) -> impl Iterator<Item = &FractalMarker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// `(bit_count, ids)` groups in ascending bit-count order.
    pub fn bits_by_count(&self) -> impl Iterator<Item = (usize, &[i32])> {
        self.bits_by_count.iter().map(|(&n, ids)| (n, ids.as_slice()))
    }

    /// Rescale all coordinates so the external marker's side equals `size`
    /// meters. Only pixel or normalized sets can be converted.
    pub fn convert_to_meters(&mut self, size: f32) -> Result<(), CatalogError> {
        if !matches!(self.unit, Unit::Pixels | Unit::Normalized) {
            return Err(CatalogError::UnitError(self.unit));
        }
        let scale = size / self.external().side_length();
        for m in &mut self.markers {
            for c in &mut m.external_corners {
                c.coords *= scale;
            }
            for kp in &mut m.keypoints {
                kp.position.coords *= scale;
            }
        }
        self.unit = Unit::Meters;
        Ok(())
    }
}
