//! Bit sampling and rotation-matched identification of candidate quads.

use fractal_markers_catalog::{BitGrid, FractalMarkerSet};
use fractal_markers_core::{homography_from_4pt, sample_subpixel, GrayImageView};
use nalgebra::Point2;

/// Sample a `cells x cells` code matrix across the quad.
///
/// Cell centres of the unit square are mapped into the image through the
/// quad homography and read with the half-cell-anchored subpixel sampler,
/// then binarized against the matrix's own mean.
pub(crate) fn sample_code(
    gray: &GrayImageView<'_>,
    quad: &[Point2<f32>; 4],
    cells: usize,
) -> Option<BitGrid> {
    let unit = [
        Point2::new(0.0f32, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(1.0, 1.0),
        Point2::new(0.0, 1.0),
    ];
    let h = homography_from_4pt(&unit, quad)?;

    let mut grid = BitGrid::filled(cells, 0);
    let mut sum = 0u32;
    for r in 0..cells {
        for c in 0..cells {
            let p = h.apply(Point2::new(
                (c as f32 + 0.5) / cells as f32,
                (r as f32 + 0.5) / cells as f32,
            ));
            let v = (sample_subpixel(gray, p.x, p.y) + 0.5) as u8;
            grid.set(r, c, v);
            sum += v as u32;
        }
    }

    let mean = sum as f64 / (cells * cells) as f64;
    let mut out = BitGrid::filled(cells, 0);
    for r in 0..cells {
        for c in 0..cells {
            if grid.get(r, c) as f64 > mean {
                out.set(r, c, 255);
            }
        }
    }
    Some(out)
}

/// Match a sampled code against the shortlist, trying all four rotations.
///
/// Returns `(marker id, rotation count)` where the rotation count is how
/// many clockwise quarter turns brought the observed code into catalogue
/// orientation. Cells masked off by a nested child are ignored.
pub(crate) fn identify_code(
    code: &BitGrid,
    shortlist: &[i32],
    set: &FractalMarkerSet,
) -> Option<(i32, usize)> {
    let n = code.side();
    if n < 3 {
        return None;
    }

    // The whole border ring must be dark.
    for i in 0..n {
        if code.get(0, i) != 0
            || code.get(n - 1, i) != 0
            || code.get(i, 0) != 0
            || code.get(i, n - 1) != 0
        {
            return None;
        }
    }

    let mut inner = BitGrid::filled(n - 2, 0);
    for r in 0..n - 2 {
        for c in 0..n - 2 {
            inner.set(r, c, code.get(r + 1, c + 1));
        }
    }

    for nrot in 0..4 {
        for &id in shortlist {
            let Some(marker) = set.marker(id) else {
                continue;
            };
            if marker.side_bits() == inner.side()
                && matches_under_mask(&inner, &marker.bits, &marker.mask)
            {
                return Some((id, nrot));
            }
        }
        inner = inner.rotated_cw();
    }
    None
}

fn matches_under_mask(observed: &BitGrid, bits: &BitGrid, mask: &BitGrid) -> bool {
    let n = bits.side();
    for r in 0..n {
        for c in 0..n {
            if mask.get(r, c) == 0 {
                continue;
            }
            if (observed.get(r, c) != 0) != (bits.get(r, c) != 0) {
                return false;
            }
        }
    }
    true
}

/// Integer perimeter of a quad, used to rank duplicate detections.
pub(crate) fn perimeter(quad: &[Point2<f32>; 4]) -> i32 {
    let mut sum = 0i32;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        sum += ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt() as i32;
    }
    sum
}
