use std::f64::consts::{FRAC_PI_2, PI};

use glam::DVec2;
use itertools::Itertools;

use crate::quadtree::Aabb;

pub fn regular_polygon(center: DVec2, radius: f64, sides: usize, rotation: f64) -> Vec<DVec2> {
    (0..sides)
        .map(|i| {
            let angle = rotation + i as f64 / sides as f64 * 2. * PI;
            center + DVec2::from_angle(angle) * radius
        })
        .collect()
}

/// Shoelace formula. Positive when the points wind counter-clockwise in a y-up frame.
pub fn polygon_area(points: &[DVec2]) -> f64 {
    if points.len() < 3 {
        return 0.;
    }
    points
        .iter()
        .circular_tuple_windows()
        .map(|(a, b)| a.perp_dot(*b))
        .sum::<f64>()
        / 2.
}

pub fn centroid(points: &[DVec2]) -> Option<DVec2> {
    if points.is_empty() {
        return None;
    }

    let area = polygon_area(points);
    if area.abs() < f64::EPSILON {
        // degenerate, fall back to the vertex average
        return Some(points.iter().sum::<DVec2>() / points.len() as f64);
    }

    let c = points
        .iter()
        .circular_tuple_windows()
        .map(|(a, b)| (*a + *b) * a.perp_dot(*b))
        .sum::<DVec2>();
    Some(c / (6. * area))
}

/// even-odd rule
pub fn point_in_polygon(p: DVec2, points: &[DVec2]) -> bool {
    let mut inside = false;
    for (a, b) in points.iter().circular_tuple_windows() {
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

pub fn bounds(points: &[DVec2]) -> Option<Aabb> {
    if points.is_empty() {
        return None;
    }
    let mut min = DVec2::INFINITY;
    let mut max = DVec2::NEG_INFINITY;
    for p in points {
        min = min.min(*p);
        max = max.max(*p);
    }
    Some(Aabb::from_min_max(min, max))
}

/// Intersection point of segments [a, b] and [c, d].
pub fn segment_intersection(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> Option<DVec2> {
    let r = b - a;
    let s = d - c;

    let denom = r.perp_dot(s);
    // parallel
    if denom.abs() < f64::EPSILON {
        return None;
    }

    let diff = c - a;
    let t = diff.perp_dot(s) / denom;
    let u = diff.perp_dot(r) / denom;

    if (0. ..=1.).contains(&t) && (0. ..=1.).contains(&u) {
        Some(a + t * r)
    } else {
        None
    }
}

/// Sutherland-Hodgman against a single half-plane. Keeps the side `normal` points to.
pub fn clip_polygon(points: &[DVec2], line_point: DVec2, normal: DVec2) -> Vec<DVec2> {
    let side = |p: DVec2| (p - line_point).dot(normal);
    let mut clipped = Vec::with_capacity(points.len() + 1);

    for (a, b) in points.iter().copied().circular_tuple_windows() {
        let (da, db) = (side(a), side(b));
        if da >= 0. {
            clipped.push(a);
        }
        if (da >= 0.) != (db >= 0.) {
            let t = da / (da - db);
            clipped.push(a.lerp(b, t));
        }
    }

    clipped
}

/// Corner cutting. Open curves keep their end points.
pub fn chaikin(points: &[DVec2], iterations: usize, closed: bool) -> Vec<DVec2> {
    let mut current = points.to_vec();

    for _ in 0..iterations {
        if current.len() < 3 {
            break;
        }

        let mut next = Vec::with_capacity(current.len() * 2);
        if closed {
            for (a, b) in current.iter().copied().circular_tuple_windows() {
                next.push(a.lerp(b, 0.25));
                next.push(a.lerp(b, 0.75));
            }
        } else {
            next.push(current[0]);
            for (a, b) in current.iter().copied().tuple_windows() {
                next.push(a.lerp(b, 0.25));
                next.push(a.lerp(b, 0.75));
            }
            next.push(current[current.len() - 1]);
        }
        current = next;
    }

    current
}

#[derive(Clone, Debug)]
pub struct Bezier {
    control_points: Vec<DVec2>,
}

impl Bezier {
    pub fn new(control_points: &[DVec2]) -> Self {
        Self {
            control_points: control_points.to_vec(),
        }
    }

    pub fn new_quadratic(a: DVec2, b: DVec2, c: DVec2) -> Self {
        Self {
            control_points: vec![a, b, c],
        }
    }

    pub fn new_cubic(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> Self {
        Self {
            control_points: vec![a, b, c, d],
        }
    }

    /// de Casteljau
    pub fn at(&self, t: f64) -> DVec2 {
        let mut points = self.control_points.clone();
        if points.is_empty() {
            return DVec2::ZERO;
        }

        while points.len() > 1 {
            points = points
                .iter()
                .tuple_windows()
                .map(|(a, b)| a.lerp(*b, t))
                .collect();
        }

        points[0]
    }

    /// `resolution + 1` points, end points included
    pub fn flatten(&self, resolution: usize) -> Vec<DVec2> {
        let resolution = resolution.max(1);
        (0..=resolution)
            .map(|i| self.at(i as f64 / resolution as f64))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: DVec2,
    pub r: f64,
}

impl Circle {
    pub fn new(center: DVec2, r: f64) -> Self {
        Circle { center, r }
    }
}

/// The bridge between two circles: two cubic curves p1 -> p3 and p4 -> p2.
/// The chords p3-p4 and p2-p1 lie inside the circles.
#[derive(Clone, Copy, Debug)]
pub struct Metaball {
    pub p1: DVec2,
    pub p2: DVec2,
    pub p3: DVec2,
    pub p4: DVec2,
    pub h1: DVec2,
    pub h2: DVec2,
    pub h3: DVec2,
    pub h4: DVec2,
}

impl Metaball {
    pub fn to_polygon(&self, resolution: usize) -> Vec<DVec2> {
        let mut points = Bezier::new_cubic(self.p1, self.h1, self.h3, self.p3).flatten(resolution);
        points.extend(Bezier::new_cubic(self.p4, self.h4, self.h2, self.p2).flatten(resolution));
        points
    }
}

/// Connector between two circles, `v` controls the spread (0.5 is a good
/// default) and `handle_size` the curvature (around 2.4).
pub fn metaball(
    c1: &Circle,
    c2: &Circle,
    v: f64,
    handle_size: f64,
    max_distance: f64,
) -> Option<Metaball> {
    let (r1, r2) = (c1.r, c2.r);
    let d = c1.center.distance(c2.center);

    if r1 <= 0. || r2 <= 0. || d > max_distance || d <= (r1 - r2).abs() {
        return None;
    }

    let (u1, u2) = if d < r1 + r2 {
        (
            ((r1 * r1 + d * d - r2 * r2) / (2. * r1 * d)).clamp(-1., 1.).acos(),
            ((r2 * r2 + d * d - r1 * r1) / (2. * r2 * d)).clamp(-1., 1.).acos(),
        )
    } else {
        (0., 0.)
    };

    let angle_between = (c2.center - c1.center).to_angle();
    let max_spread = ((r1 - r2) / d).clamp(-1., 1.).acos();

    let angle1 = angle_between + u1 + (max_spread - u1) * v;
    let angle2 = angle_between - u1 - (max_spread - u1) * v;
    let angle3 = angle_between + PI - u2 - (PI - u2 - max_spread) * v;
    let angle4 = angle_between - PI + u2 + (PI - u2 - max_spread) * v;

    let p1 = c1.center + DVec2::from_angle(angle1) * r1;
    let p2 = c1.center + DVec2::from_angle(angle2) * r1;
    let p3 = c2.center + DVec2::from_angle(angle3) * r2;
    let p4 = c2.center + DVec2::from_angle(angle4) * r2;

    let total_radius = r1 + r2;
    let d2_base = (v * handle_size).min(p1.distance(p3) / total_radius);
    // shrink the handles when the circles overlap a lot
    let d2 = d2_base * (d * 2. / total_radius).min(1.);

    let hr1 = r1 * d2;
    let hr2 = r2 * d2;

    Some(Metaball {
        p1,
        p2,
        p3,
        p4,
        h1: p1 + DVec2::from_angle(angle1 - FRAC_PI_2) * hr1,
        h2: p2 + DVec2::from_angle(angle2 + FRAC_PI_2) * hr1,
        h3: p3 + DVec2::from_angle(angle3 + FRAC_PI_2) * hr2,
        h4: p4 + DVec2::from_angle(angle4 - FRAC_PI_2) * hr2,
    })
}
