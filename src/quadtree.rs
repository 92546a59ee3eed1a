use glam::DVec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub center: DVec2,
    pub half_size: DVec2,
}

impl Aabb {
    pub fn new(center: DVec2, half_size: DVec2) -> Self {
        Self { center, half_size }
    }

    pub fn from_min_max(min: DVec2, max: DVec2) -> Self {
        Aabb::new(min.midpoint(max), (max - min) / 2.)
    }

    pub fn min(&self) -> DVec2 {
        self.center - self.half_size
    }

    pub fn max(&self) -> DVec2 {
        self.center + self.half_size
    }

    pub fn size(&self) -> DVec2 {
        self.half_size * 2.
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.min().cmple(other.min()).all() && self.max().cmpge(other.max()).all()
    }

    /// min edge inclusive, max edge exclusive, so that siblings never share a point
    pub fn contains_point(&self, p: DVec2) -> bool {
        self.min().cmple(p).all() && p.cmplt(self.max()).all()
    }

    pub fn intersects(&self, other: &Self) -> bool {
        let d = (self.center - other.center).abs();
        d.cmple(self.half_size + other.half_size).all()
    }

    pub fn intersects_circle(&self, center: DVec2, r: f64) -> bool {
        let closest = center.clamp(self.min(), self.max());
        closest.distance_squared(center) <= r * r
    }

    pub fn union(&self, other: &Self) -> Self {
        Aabb::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    pub fn sub_aabb(&self, dir: Direction) -> Aabb {
        let half_size = self.half_size / 2.;
        let center = match dir {
            Direction::TopRight => self.center + DVec2::new(half_size.x, half_size.y),
            Direction::TopLeft => self.center + DVec2::new(-half_size.x, half_size.y),
            Direction::BottomLeft => self.center + DVec2::new(-half_size.x, -half_size.y),
            Direction::BottomRight => self.center + DVec2::new(half_size.x, -half_size.y),
        };
        Aabb::new(center, half_size)
    }

    /// The four quadrants, in `Direction::ALL` order.
    pub fn split(&self) -> [Aabb; 4] {
        Direction::ALL.map(|dir| self.sub_aabb(dir))
    }

    /// Two halves across the longest side, at `ratio` of its length.
    pub fn split_longest(&self, ratio: f64) -> [Aabb; 2] {
        let (min, max) = (self.min(), self.max());
        if self.half_size.x >= self.half_size.y {
            let x = min.x + (max.x - min.x) * ratio;
            [
                Aabb::from_min_max(min, DVec2::new(x, max.y)),
                Aabb::from_min_max(DVec2::new(x, min.y), max),
            ]
        } else {
            let y = min.y + (max.y - min.y) * ratio;
            [
                Aabb::from_min_max(min, DVec2::new(max.x, y)),
                Aabb::from_min_max(DVec2::new(min.x, y), max),
            ]
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub enum Direction {
    TopRight,
    TopLeft,
    BottomLeft,
    BottomRight,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::BottomLeft,
        Direction::BottomRight,
        Direction::TopLeft,
        Direction::TopRight,
    ];
}

/// Point quadtree. Each node keeps up to `capacity` points before splitting.
#[derive(Clone, Debug)]
pub struct Quadtree<T> {
    pub aabb: Aabb,
    capacity: usize,
    max_depth: usize,
    points: Vec<(DVec2, T)>,
    children: Option<Box<[Quadtree<T>; 4]>>,
}

impl<T: Clone> Quadtree<T> {
    pub fn new(aabb: Aabb, capacity: usize) -> Self {
        Self::with_depth(aabb, capacity.max(1), 16)
    }

    fn with_depth(aabb: Aabb, capacity: usize, max_depth: usize) -> Self {
        Self {
            aabb,
            capacity,
            max_depth,
            points: Vec::new(),
            children: None,
        }
    }

    /// false when the point is outside the tree bounds
    pub fn insert(&mut self, p: DVec2, payload: T) -> bool {
        if !self.aabb.contains_point(p) {
            return false;
        }

        if let Some(children) = self.children.as_mut() {
            if let Some(child) = children.iter_mut().find(|c| c.aabb.contains_point(p)) {
                return child.insert(p, payload);
            }
            // rounding at the quadrant edges, keep it here
            self.points.push((p, payload));
            return true;
        }

        self.points.push((p, payload));
        if self.points.len() > self.capacity && self.max_depth > 0 {
            self.subdivide();
        }
        true
    }

    fn subdivide(&mut self) {
        let mut children = Box::new(
            self.aabb
                .split()
                .map(|aabb| Quadtree::with_depth(aabb, self.capacity, self.max_depth - 1)),
        );

        let mut kept = Vec::new();
        for (p, payload) in self.points.drain(..) {
            match children.iter_mut().find(|c| c.aabb.contains_point(p)) {
                Some(child) => {
                    child.insert(p, payload);
                }
                None => kept.push((p, payload)),
            }
        }
        self.points = kept;
        self.children = Some(children);
    }

    pub fn len(&self) -> usize {
        self.points.len()
            + self
                .children
                .as_ref()
                .map_or(0, |children| children.iter().map(|c| c.len()).sum())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn query_radius(&self, center: DVec2, r: f64) -> Vec<(DVec2, T)> {
        let mut found = Vec::new();
        self.query_radius_into(center, r, &mut found);
        found
    }

    fn query_radius_into(&self, center: DVec2, r: f64, found: &mut Vec<(DVec2, T)>) {
        if !self.aabb.intersects_circle(center, r) {
            return;
        }

        let r2 = r * r;
        found.extend(
            self.points
                .iter()
                .filter(|(p, _)| p.distance_squared(center) <= r2)
                .cloned(),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query_radius_into(center, r, found);
            }
        }
    }

    pub fn query_aabb(&self, range: &Aabb) -> Vec<(DVec2, T)> {
        let mut found = Vec::new();
        self.query_aabb_into(range, &mut found);
        found
    }

    fn query_aabb_into(&self, range: &Aabb, found: &mut Vec<(DVec2, T)>) {
        if !self.aabb.intersects(range) {
            return;
        }

        found.extend(
            self.points
                .iter()
                .filter(|(p, _)| range.min().cmple(*p).all() && p.cmple(range.max()).all())
                .cloned(),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query_aabb_into(range, found);
            }
        }
    }

    /// Bounds of every leaf node, for drawing the tree layout.
    pub fn leaves(&self) -> Vec<Aabb> {
        match &self.children {
            None => vec![self.aabb],
            Some(children) => children.iter().flat_map(|c| c.leaves()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Aabb {
        Aabb::new(DVec2::new(50., 50.), DVec2::new(50., 50.))
    }

    #[test]
    fn aabb_relations() {
        let a = bounds();
        let inner = Aabb::new(DVec2::new(20., 20.), DVec2::splat(5.));
        assert!(a.contains(&inner));
        assert!(!inner.contains(&a));
        assert!(a.intersects(&inner));
        assert!(a.contains_point(DVec2::ZERO));
        assert!(!a.contains_point(DVec2::new(100., 50.)));
        assert!(a.intersects_circle(DVec2::new(105., 50.), 6.));
        assert!(!a.intersects_circle(DVec2::new(110., 110.), 6.));

        let u = inner.union(&Aabb::new(DVec2::new(80., 80.), DVec2::splat(5.)));
        assert_eq!(u.min(), DVec2::splat(15.));
        assert_eq!(u.max(), DVec2::splat(85.));
    }

    #[test]
    fn split_longest_side() {
        let wide = Aabb::from_min_max(DVec2::ZERO, DVec2::new(10., 4.));
        let [left, right] = wide.split_longest(0.3);
        assert_eq!(left.max().x, 3.);
        assert_eq!(right.min().x, 3.);
        assert_eq!(left.size().y, 4.);
    }

    #[test]
    fn insert_rejects_outside_points() {
        let mut tree = Quadtree::new(bounds(), 4);
        assert!(tree.insert(DVec2::new(10., 10.), 1));
        assert!(!tree.insert(DVec2::new(-1., 10.), 2));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn subdivides_and_queries_match_brute_force() {
        let mut tree = Quadtree::new(bounds(), 4);
        let mut points = Vec::new();
        for i in 0..20 {
            for j in 0..20 {
                let p = DVec2::new(i as f64 * 5. + 1., j as f64 * 5. + 1.);
                points.push(p);
                assert!(tree.insert(p, points.len() - 1));
            }
        }
        assert_eq!(tree.len(), 400);
        assert!(tree.leaves().len() > 4);

        let center = DVec2::new(40., 60.);
        let mut found: Vec<usize> = tree
            .query_radius(center, 12.)
            .into_iter()
            .map(|(_, idx)| idx)
            .collect();
        found.sort();
        let expected: Vec<usize> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.distance(center) <= 12.)
            .map(|(idx, _)| idx)
            .collect();
        assert_eq!(found, expected);

        let range = Aabb::from_min_max(DVec2::new(0., 0.), DVec2::new(10., 10.));
        assert_eq!(tree.query_aabb(&range).len(), 4);
    }

    #[test]
    fn duplicate_points_stop_at_max_depth() {
        let mut tree = Quadtree::new(bounds(), 1);
        for i in 0..50 {
            assert!(tree.insert(DVec2::new(33., 33.), i));
        }
        assert_eq!(tree.query_radius(DVec2::new(33., 33.), 0.5).len(), 50);
    }
}
