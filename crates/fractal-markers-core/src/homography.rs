use nalgebra::{DMatrix, Matrix3, Point2, SMatrix, SVector, Vector3};

/// Plane-projective transform `p_img ~ H * p_obj`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

// Hartley normalization: translate to centroid, scale so the mean distance
// from it is sqrt(2). Keeps the linear systems below well conditioned.
fn normalizing_transform(pts: &[Point2<f32>]) -> Matrix3<f64> {
    let n = pts.len() as f64;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for p in pts {
        cx += p.x as f64;
        cy += p.y as f64;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0;
    for p in pts {
        let dx = p.x as f64 - cx;
        let dy = p.y as f64 - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;

    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn apply_3x3(t: &Matrix3<f64>, p: Point2<f32>) -> Point2<f64> {
    let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
    Point2::new(v[0], v[1])
}

fn denormalize(hn: Matrix3<f64>, t_obj: Matrix3<f64>, t_img: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let h = t_img.try_inverse()? * hn * t_obj;
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

/// Exact homography from 4 correspondences: `img ~ H * obj`.
///
/// Corner order must be consistent between `obj` and `img`.
pub fn homography_from_4pt(obj: &[Point2<f32>; 4], img: &[Point2<f32>; 4]) -> Option<Homography> {
    let t_obj = normalizing_transform(obj);
    let t_img = normalizing_transform(img);

    // Unknowns [h11 .. h32] with h33 = 1. Each correspondence (x,y)->(u,v):
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let s = apply_3x3(&t_obj, obj[k]);
        let d = apply_3x3(&t_img, img[k]);
        let (x, y, u, v) = (s.x, s.y, d.x, d.y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    let hn = Matrix3::new(x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7], 1.0);
    denormalize(hn, t_obj, t_img).map(Homography::new)
}

/// Least-squares DLT over `n >= 4` correspondences: `img ~ H * obj`.
///
/// With exactly 4 points this falls back to the direct solver.
pub fn estimate_homography(obj: &[Point2<f32>], img: &[Point2<f32>]) -> Option<Homography> {
    if obj.len() != img.len() || obj.len() < 4 {
        return None;
    }
    if obj.len() == 4 {
        let o: &[Point2<f32>; 4] = obj.try_into().ok()?;
        let i: &[Point2<f32>; 4] = img.try_into().ok()?;
        return homography_from_4pt(o, i);
    }

    let t_obj = normalizing_transform(obj);
    let t_img = normalizing_transform(img);

    // Stack two rows per correspondence into A (2N x 9) and solve Ah = 0.
    let n = obj.len();
    let mut a = DMatrix::<f64>::zeros(2 * n, 9);

    for k in 0..n {
        let s = apply_3x3(&t_obj, obj[k]);
        let d = apply_3x3(&t_img, img[k]);
        let (x, y, u, v) = (s.x, s.y, d.x, d.y);

        a[(2 * k, 0)] = -x;
        a[(2 * k, 1)] = -y;
        a[(2 * k, 2)] = -1.0;
        a[(2 * k, 6)] = u * x;
        a[(2 * k, 7)] = u * y;
        a[(2 * k, 8)] = u;

        a[(2 * k + 1, 3)] = -x;
        a[(2 * k + 1, 4)] = -y;
        a[(2 * k + 1, 5)] = -1.0;
        a[(2 * k + 1, 6)] = v * x;
        a[(2 * k + 1, 7)] = v * y;
        a[(2 * k + 1, 8)] = v;
    }

    // h is the right singular vector with the smallest singular value.
    let svd = a.svd(true, true);
    let vt = svd.v_t?;
    let last = vt.nrows().checked_sub(1)?;
    let h = vt.row(last);

    let hn = Matrix3::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);
    denormalize(hn, t_obj, t_img).map(Homography::new)
}
