//! Border following on binary images (Suzuki & Abe).
//!
//! Extracts every border of the foreground regions, outer borders and hole
//! borders alike, as full 8-connected pixel chains. No hierarchy is kept;
//! the caller filters the flat list.

use nalgebra::Point2;

/// One traced border.
#[derive(Clone, Debug)]
pub struct Contour {
    pub points: Vec<Point2<i32>>,
    /// True when this border encloses a hole rather than a component.
    pub is_hole: bool,
}

// Clockwise 8-neighbourhood in image coordinates (y grows downward),
// starting east.
const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

fn direction_of(from: (i32, i32), to: (i32, i32)) -> usize {
    let d = (to.0 - from.0, to.1 - from.1);
    NEIGHBORS
        .iter()
        .position(|&n| n == d)
        .expect("adjacent pixel")
}

struct LabelMap {
    width: i32,
    height: i32,
    cells: Vec<i32>,
}

impl LabelMap {
    #[inline]
    fn get(&self, x: i32, y: i32) -> i32 {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return 0;
        }
        self.cells[(y * self.width + x) as usize]
    }

    #[inline]
    fn set(&mut self, x: i32, y: i32, v: i32) {
        self.cells[(y * self.width + x) as usize] = v;
    }
}

/// Trace all borders of the foreground (non-zero) pixels of `bin`.
pub fn find_contours(bin: &crate::GrayImageView<'_>) -> Vec<Contour> {
    let width = bin.width as i32;
    let height = bin.height as i32;
    let mut f = LabelMap {
        width,
        height,
        cells: bin.data.iter().map(|&v| (v != 0) as i32).collect(),
    };

    let mut contours = Vec::new();
    let mut nbd = 1i32;

    for y in 0..height {
        for x in 0..width {
            let fij = f.get(x, y);
            if fij == 0 {
                continue;
            }

            let (from, is_hole) = if fij == 1 && f.get(x - 1, y) == 0 {
                ((x - 1, y), false)
            } else if fij >= 1 && f.get(x + 1, y) == 0 {
                ((x + 1, y), true)
            } else {
                continue;
            };

            nbd += 1;
            let points = follow_border(&mut f, (x, y), from, nbd);
            contours.push(Contour { points, is_hole });
        }
    }

    contours
}

fn follow_border(
    f: &mut LabelMap,
    start: (i32, i32),
    from: (i32, i32),
    nbd: i32,
) -> Vec<Point2<i32>> {
    let mut points = Vec::new();

    // Clockwise scan from the entry pixel for the first foreground neighbour.
    let from_dir = direction_of(start, from);
    let mut first = None;
    for k in 0..8 {
        let dir = (from_dir + k) % 8;
        let (dx, dy) = NEIGHBORS[dir];
        if f.get(start.0 + dx, start.1 + dy) != 0 {
            first = Some((start.0 + dx, start.1 + dy));
            break;
        }
    }
    let Some(p1) = first else {
        // Isolated pixel.
        f.set(start.0, start.1, -nbd);
        points.push(Point2::new(start.0, start.1));
        return points;
    };

    let mut p2 = p1;
    let mut p3 = start;

    loop {
        // Counter-clockwise scan around p3, starting just after p2.
        let back_dir = direction_of(p3, p2);
        let mut p4 = None;
        let mut east_was_zero = false;
        for k in 1..=8 {
            let dir = (back_dir + 8 - (k % 8)) % 8;
            let (dx, dy) = NEIGHBORS[dir];
            let (nx, ny) = (p3.0 + dx, p3.1 + dy);
            if f.get(nx, ny) != 0 {
                p4 = Some((nx, ny));
                break;
            }
            if dir == 0 {
                east_was_zero = true;
            }
        }
        let p4 = p4.expect("border pixel has a foreground neighbour");

        if east_was_zero {
            f.set(p3.0, p3.1, -nbd);
        } else if f.get(p3.0, p3.1) == 1 {
            f.set(p3.0, p3.1, nbd);
        }
        points.push(Point2::new(p3.0, p3.1));

        if p4 == start && p3 == p1 {
            break;
        }
        p2 = p3;
        p3 = p4;
    }

    points
}
