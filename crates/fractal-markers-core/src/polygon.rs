//! Closed-polygon approximation and convexity testing.

use nalgebra::Point2;

fn dist_sq(a: Point2<i32>, b: Point2<i32>) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    dx * dx + dy * dy
}

// Perpendicular distance from `p` to the segment line a-b; falls back to the
// point distance when the segment is degenerate.
fn line_dist(p: Point2<i32>, a: Point2<i32>, b: Point2<i32>) -> f64 {
    let len_sq = dist_sq(a, b);
    if len_sq < 1e-12 {
        return dist_sq(p, a).sqrt();
    }
    let cross = ((b.x - a.x) as f64 * (p.y - a.y) as f64
        - (b.y - a.y) as f64 * (p.x - a.x) as f64)
        .abs();
    cross / len_sq.sqrt()
}

fn simplify_chain(pts: &[Point2<i32>], eps: f64, out: &mut Vec<Point2<i32>>) {
    // Iterative Douglas-Peucker over index ranges; endpoints of every kept
    // range are emitted by the caller.
    let mut stack = vec![(0usize, pts.len() - 1)];
    let mut keep = vec![false; pts.len()];
    keep[0] = true;
    keep[pts.len() - 1] = true;

    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        let mut best = lo;
        let mut best_d = -1.0;
        for i in lo + 1..hi {
            let d = line_dist(pts[i], pts[lo], pts[hi]);
            if d > best_d {
                best_d = d;
                best = i;
            }
        }
        if best_d > eps {
            keep[best] = true;
            stack.push((lo, best));
            stack.push((best, hi));
        }
    }

    for (i, &k) in keep.iter().enumerate() {
        if k {
            out.push(pts[i]);
        }
    }
}

/// Douglas-Peucker simplification of a closed pixel chain.
///
/// The chain is split at the vertex farthest from its first point and the
/// two halves are simplified independently, matching the usual treatment of
/// closed curves.
pub fn approx_polygon(contour: &[Point2<i32>], eps: f64) -> Vec<Point2<i32>> {
    if contour.len() < 3 {
        return contour.to_vec();
    }

    let mut far = 0;
    let mut far_d = -1.0;
    for (i, &p) in contour.iter().enumerate() {
        let d = dist_sq(contour[0], p);
        if d > far_d {
            far_d = d;
            far = i;
        }
    }
    if far == 0 {
        return vec![contour[0]];
    }

    let mut half_a = Vec::new();
    simplify_chain(&contour[..=far], eps, &mut half_a);

    let mut wrapped: Vec<Point2<i32>> = contour[far..].to_vec();
    wrapped.push(contour[0]);
    let mut half_b = Vec::new();
    simplify_chain(&wrapped, eps, &mut half_b);

    // Joint endpoints appear in both halves; drop the duplicates.
    half_a.pop();
    half_b.pop();
    half_a.extend(half_b);
    half_a
}

/// True when the closed polygon turns consistently in one direction.
pub fn is_convex(poly: &[Point2<i32>]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0i64;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        let c = poly[(i + 2) % n];
        let cross = (b.x - a.x) as i64 * (c.y - b.y) as i64
            - (b.y - a.y) as i64 * (c.x - b.x) as i64;
        if cross != 0 {
            if sign == 0 {
                sign = cross.signum();
            } else if sign != cross.signum() {
                return false;
            }
        }
    }
    true
}
