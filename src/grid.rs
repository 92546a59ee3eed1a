use glam::DVec2;
use itertools::iproduct;
use rayon::prelude::*;

#[derive(Clone, Copy, Debug)]
pub struct Grid {
    pub columns: usize,
    pub rows: usize,
    /// in pixels, on every side
    pub margin: f64,
    pub size: DVec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub column: usize,
    pub row: usize,
    /// [0, 1] corner to corner
    pub uv: DVec2,
    pub position: DVec2,
    /// distance to the next cell center
    pub size: DVec2,
}

fn uv_axis(i: usize, count: usize) -> f64 {
    if count <= 1 {
        0.5
    } else {
        i as f64 / (count - 1) as f64
    }
}

impl Grid {
    pub fn new(columns: usize, rows: usize, margin: f64, size: DVec2) -> Self {
        Self {
            columns,
            rows,
            margin,
            size,
        }
    }

    pub fn square(count: usize, margin: f64, size: DVec2) -> Self {
        Grid::new(count, count, margin, size)
    }

    fn inner(&self) -> DVec2 {
        (self.size - DVec2::splat(2. * self.margin)).max(DVec2::ZERO)
    }

    pub fn cell_size(&self) -> DVec2 {
        let div = DVec2::new(
            self.columns.saturating_sub(1).max(1) as f64,
            self.rows.saturating_sub(1).max(1) as f64,
        );
        self.inner() / div
    }

    pub fn cell(&self, column: usize, row: usize) -> Cell {
        let uv = DVec2::new(uv_axis(column, self.columns), uv_axis(row, self.rows));
        Cell {
            column,
            row,
            uv,
            position: DVec2::splat(self.margin) + uv * self.inner(),
            size: self.cell_size(),
        }
    }

    /// row-major
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        iproduct!(0..self.rows, 0..self.columns).map(move |(row, column)| self.cell(column, row))
    }

    pub fn len(&self) -> usize {
        self.columns * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Row-major lattice of samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Field<T> {
    pub width: usize,
    pub height: usize,
    pub data: Vec<T>,
}

impl<T> Field<T> {
    pub fn from_fn<F: FnMut(usize, usize) -> T>(width: usize, height: usize, mut f: F) -> Self {
        let data = iproduct!(0..height, 0..width).map(|(y, x)| f(x, y)).collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn par_from_fn<F>(width: usize, height: usize, f: F) -> Self
    where
        T: Send,
        F: Fn(usize, usize) -> T + Sync,
    {
        let data = (0..width * height)
            .into_par_iter()
            .map(|idx| f(idx % width, idx / width))
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    fn idx(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.idx(x, y).map(|idx| &self.data[idx])
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) -> bool {
        match self.idx(x, y) {
            Some(idx) => {
                self.data[idx] = value;
                true
            }
            None => false,
        }
    }

    pub fn map<U, F: Fn(&T) -> U>(&self, f: F) -> Field<U> {
        Field {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }
}

pub type Segment = (DVec2, DVec2);

/// Isoline of `field` at `threshold`. Sample (x, y) sits at `origin + (x, y) * spacing`.
pub fn marching_squares(
    field: &Field<f64>,
    threshold: f64,
    origin: DVec2,
    spacing: DVec2,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    if field.width < 2 || field.height < 2 {
        return segments;
    }

    let at = |x: usize, y: usize| field.data[y * field.width + x];
    let pos = |x: f64, y: f64| origin + DVec2::new(x, y) * spacing;
    // crossing between two samples of value a and b
    let cross = |a: f64, b: f64| {
        let d = b - a;
        if d.abs() < f64::EPSILON {
            0.5
        } else {
            ((threshold - a) / d).clamp(0., 1.)
        }
    };

    for (y, x) in iproduct!(0..field.height - 1, 0..field.width - 1) {
        let tl = at(x, y);
        let tr = at(x + 1, y);
        let br = at(x + 1, y + 1);
        let bl = at(x, y + 1);

        let case = ((tl > threshold) as u8) << 3
            | ((tr > threshold) as u8) << 2
            | ((br > threshold) as u8) << 1
            | (bl > threshold) as u8;

        if case == 0 || case == 15 {
            continue;
        }

        let (fx, fy) = (x as f64, y as f64);
        let top = pos(fx + cross(tl, tr), fy);
        let right = pos(fx + 1., fy + cross(tr, br));
        let bottom = pos(fx + cross(bl, br), fy + 1.);
        let left = pos(fx, fy + cross(tl, bl));
        let center_inside = (tl + tr + br + bl) / 4. > threshold;

        match case {
            1 | 14 => segments.push((left, bottom)),
            2 | 13 => segments.push((bottom, right)),
            3 | 12 => segments.push((left, right)),
            4 | 11 => segments.push((top, right)),
            6 | 9 => segments.push((top, bottom)),
            7 | 8 => segments.push((left, top)),
            5 => {
                if center_inside {
                    segments.push((left, top));
                    segments.push((bottom, right));
                } else {
                    segments.push((top, right));
                    segments.push((left, bottom));
                }
            }
            10 => {
                if center_inside {
                    segments.push((top, right));
                    segments.push((left, bottom));
                } else {
                    segments.push((left, top));
                    segments.push((bottom, right));
                }
            }
            _ => unreachable!("case is a 4 bit value"),
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn grid_uv_spans_corners() {
        let grid = Grid::square(3, 10., DVec2::splat(120.));
        let cells: Vec<Cell> = grid.cells().collect();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0].uv, DVec2::ZERO);
        assert_eq!(cells[8].uv, DVec2::ONE);
        assert_eq!(cells[0].position, DVec2::splat(10.));
        assert_eq!(cells[8].position, DVec2::splat(110.));
        assert_eq!(cells[1].column, 1);
        assert_eq!(cells[1].row, 0);
        assert_eq!(grid.cell_size(), DVec2::splat(50.));
    }

    #[test]
    fn single_cell_is_centered() {
        let grid = Grid::new(1, 1, 0., DVec2::new(100., 50.));
        let cell = grid.cell(0, 0);
        assert_eq!(cell.uv, DVec2::splat(0.5));
        assert_eq!(cell.position, DVec2::new(50., 25.));
    }

    #[test]
    fn field_access() {
        let mut field = Field::from_fn(3, 2, |x, y| x + 10 * y);
        assert_eq!(field.get(2, 1), Some(&12));
        assert_eq!(field.get(3, 0), None);
        assert!(field.set(0, 0, 99));
        assert!(!field.set(0, 2, 1));
        assert_eq!(field.map(|v| v * 2).get(0, 0), Some(&198));

        let par = Field::par_from_fn(3, 2, |x, y| x + 10 * y);
        assert_eq!(par, Field::from_fn(3, 2, |x, y| x + 10 * y));
    }

    #[test]
    fn single_peak_gives_closed_diamond() {
        let field = Field::from_fn(3, 3, |x, y| if (x, y) == (1, 1) { 1. } else { 0. });
        let segments = marching_squares(&field, 0.5, DVec2::ZERO, DVec2::ONE);
        assert_eq!(segments.len(), 4);

        // every end point is shared by exactly two segments
        let points: Vec<DVec2> = segments.iter().flat_map(|(a, b)| [*a, *b]).collect();
        for p in &points {
            assert_eq!(points.iter().filter(|q| close(*p, **q)).count(), 2);
        }
        assert!(points.iter().any(|p| close(*p, DVec2::new(0.5, 1.))));
        assert!(points.iter().any(|p| close(*p, DVec2::new(1., 1.5))));
    }

    #[test]
    fn crossing_is_interpolated_and_scaled() {
        let field = Field::from_fn(2, 2, |x, _| x as f64);
        let segments = marching_squares(&field, 0.25, DVec2::new(10., 10.), DVec2::splat(4.));
        assert_eq!(segments.len(), 1);
        let (a, b) = segments[0];
        assert!(close(a, DVec2::new(11., 10.)));
        assert!(close(b, DVec2::new(11., 14.)));
    }

    #[test]
    fn saddle_uses_center_average() {
        // tl and br high
        let high = Field::from_fn(2, 2, |x, y| if x == y { 1. } else { 0.2 });
        let low = Field::from_fn(2, 2, |x, y| if x == y { 0.6 } else { 0. });

        let a = marching_squares(&high, 0.5, DVec2::ZERO, DVec2::ONE);
        let b = marching_squares(&low, 0.5, DVec2::ZERO, DVec2::ONE);
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn flat_field_has_no_contour() {
        let field = Field::from_fn(4, 4, |_, _| 1.);
        assert!(marching_squares(&field, 0.5, DVec2::ZERO, DVec2::ONE).is_empty());
        let tiny = Field::from_fn(1, 4, |_, _| 1.);
        assert!(marching_squares(&tiny, 0.5, DVec2::ZERO, DVec2::ONE).is_empty());
    }
}
