//! A small 2d canvas over [`RawImage`].
//!
//! Paths are flattened to polylines in device space as they are built, so the
//! transform in effect when a point is added is the one that applies to it.
//! Painting first accumulates a coverage mask and then blends every covered
//! pixel exactly once, which keeps self-overlapping strokes at a uniform alpha.

use std::f64::consts::TAU;

use glam::{DVec2, IVec2};

use crate::{
    Color,
    geometry::Bezier,
    img::{Blending, RawImage},
    matrix::Transform,
};

/// vertical samples per pixel row when filling
const FILL_SUBSAMPLES: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Composite {
    SourceOver,
    /// additive, `lighter` in canvas terms
    Lighter,
}

#[derive(Clone, Copy, Debug)]
struct State {
    fill_style: Color,
    stroke_style: Color,
    line_width: f64,
    global_alpha: f32,
    composite: Composite,
    transform: Transform,
}

impl Default for State {
    fn default() -> Self {
        Self {
            fill_style: Color::ZERO,
            stroke_style: Color::ZERO,
            line_width: 1.,
            global_alpha: 1.,
            composite: Composite::SourceOver,
            transform: Transform::IDENTITY,
        }
    }
}

#[derive(Clone, Debug)]
struct SubPath {
    points: Vec<DVec2>,
    closed: bool,
}

pub struct Canvas {
    image: RawImage,
    state: State,
    stack: Vec<State>,
    path: Vec<SubPath>,
    mask: Vec<f32>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let image = RawImage::new(width as i32, height as i32);
        let mask = vec![0.; image.data.len()];
        Self {
            image,
            state: State::default(),
            stack: Vec::new(),
            path: Vec::new(),
            mask,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width as u32
    }

    pub fn height(&self) -> u32 {
        self.image.height as u32
    }

    pub fn size(&self) -> DVec2 {
        DVec2::new(self.image.width as f64, self.image.height as f64)
    }

    pub fn image(&self) -> &RawImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RawImage {
        &mut self.image
    }

    // state

    pub fn set_fill_style(&mut self, color: Color) {
        self.state.fill_style = color;
    }

    pub fn set_stroke_style(&mut self, color: Color) {
        self.state.stroke_style = color;
    }

    pub fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0. {
            self.state.line_width = width;
        }
    }

    pub fn line_width(&self) -> f64 {
        self.state.line_width
    }

    pub fn set_global_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() {
            self.state.global_alpha = alpha.clamp(0., 1.);
        }
    }

    pub fn set_composite(&mut self, composite: Composite) {
        self.state.composite = composite;
    }

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    /// no-op on an empty stack
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    /// Default state, empty stack and path. Pixels are kept.
    pub fn reset(&mut self) {
        self.state = State::default();
        self.stack.clear();
        self.path.clear();
    }

    // transform

    pub fn translate(&mut self, offset: DVec2) {
        self.state.transform.translate(offset);
    }

    pub fn rotate(&mut self, angle: f64) {
        self.state.transform.rotate(angle);
    }

    pub fn scale(&mut self, scale: DVec2) {
        self.state.transform.scale(scale);
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.state.transform = transform;
    }

    pub fn reset_transform(&mut self) {
        self.state.transform = Transform::IDENTITY;
    }

    pub fn transform(&self) -> Transform {
        self.state.transform
    }

    // path

    pub fn begin_path(&mut self) {
        self.path.clear();
    }

    pub fn move_to(&mut self, p: DVec2) {
        let p = self.state.transform.apply(p);
        self.path.push(SubPath {
            points: vec![p],
            closed: false,
        });
    }

    pub fn line_to(&mut self, p: DVec2) {
        let p = self.state.transform.apply(p);
        self.push_device_point(p);
    }

    fn push_device_point(&mut self, p: DVec2) {
        match self.path.last_mut() {
            Some(sub) if !sub.closed => sub.points.push(p),
            Some(sub) => {
                // after close_path a new subpath starts where the last one started
                let start = sub.points[0];
                self.path.push(SubPath {
                    points: vec![start, p],
                    closed: false,
                });
            }
            None => self.path.push(SubPath {
                points: vec![p],
                closed: false,
            }),
        }
    }

    fn current_device_point(&self) -> Option<DVec2> {
        self.path.last().map(|sub| {
            if sub.closed {
                sub.points[0]
            } else {
                sub.points[sub.points.len() - 1]
            }
        })
    }

    pub fn close_path(&mut self) {
        if let Some(sub) = self.path.last_mut() {
            sub.closed = true;
        }
    }

    /// Without a current point the subpath starts at the first control point.
    fn curve_to(&mut self, control: &[DVec2]) {
        let Some(first) = control.first() else {
            return;
        };
        if self.current_device_point().is_none() {
            self.move_to(*first);
        }
        let Some(start) = self.current_device_point() else {
            return;
        };

        let mut points = vec![start];
        points.extend(control.iter().map(|p| self.state.transform.apply(*p)));

        let length: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
        let resolution = ((length / 4.).ceil() as usize).clamp(4, 128);

        for p in Bezier::new(&points).flatten(resolution).into_iter().skip(1) {
            self.push_device_point(p);
        }
    }

    pub fn quadratic_curve_to(&mut self, control: DVec2, p: DVec2) {
        self.curve_to(&[control, p]);
    }

    pub fn bezier_curve_to(&mut self, c1: DVec2, c2: DVec2, p: DVec2) {
        self.curve_to(&[c1, c2, p]);
    }

    /// Canvas arc: angles in radians, clockwise on screen unless `counter_clockwise`.
    pub fn arc(&mut self, center: DVec2, r: f64, start: f64, end: f64, counter_clockwise: bool) {
        let sweep = if counter_clockwise {
            let s = start - end;
            if s >= TAU { -TAU } else { -s.rem_euclid(TAU) }
        } else {
            let s = end - start;
            if s >= TAU { TAU } else { s.rem_euclid(TAU) }
        };

        let device_r = r.abs() * self.state.transform.scale_factor();
        let steps = ((sweep.abs() * device_r / 2.).ceil() as usize).clamp(8, 512);

        let first = center + DVec2::from_angle(start) * r;
        if self.current_device_point().is_some() {
            self.line_to(first);
        } else {
            self.move_to(first);
        }

        for i in 1..=steps {
            let angle = start + sweep * i as f64 / steps as f64;
            self.line_to(center + DVec2::from_angle(angle) * r);
        }
    }

    pub fn rect(&mut self, pos: DVec2, size: DVec2) {
        self.move_to(pos);
        self.line_to(pos + DVec2::new(size.x, 0.));
        self.line_to(pos + size);
        self.line_to(pos + DVec2::new(0., size.y));
        self.close_path();
    }

    // painting

    fn blending(&self, alpha: f32) -> (f32, Blending) {
        let alpha = alpha * self.state.global_alpha;
        match self.state.composite {
            Composite::SourceOver => (1., Blending::Over(alpha)),
            Composite::Lighter => (alpha, Blending::Add),
        }
    }

    fn blend_coverage(&mut self, idx: usize, color: Color, coverage: f32) {
        let (scale, blending) = self.blending(coverage.min(1.));
        self.image.blend_idx(idx, color * scale, blending);
    }

    /// Nonzero fill of every subpath, each implicitly closed.
    pub fn fill(&mut self) {
        let (w, h) = (self.image.width, self.image.height);
        if w <= 0 || h <= 0 {
            return;
        }

        let mut edges: Vec<(DVec2, DVec2)> = Vec::new();
        for sub in &self.path {
            let n = sub.points.len();
            if n < 2 {
                continue;
            }
            for i in 0..n {
                let a = sub.points[i];
                let b = sub.points[(i + 1) % n];
                if a.y != b.y && a.is_finite() && b.is_finite() {
                    edges.push((a, b));
                }
            }
        }
        if edges.is_empty() {
            return;
        }

        let (min_y, max_y) = edges.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, (a, b)| {
            (acc.0.min(a.y.min(b.y)), acc.1.max(a.y.max(b.y)))
        });
        let row_start = (min_y.floor() as i32).max(0);
        let row_end = (max_y.ceil() as i32).min(h);

        let color = self.state.fill_style;
        let mut row = vec![0f32; w as usize];
        let mut crossings: Vec<(f64, i32)> = Vec::new();
        let weight = 1. / FILL_SUBSAMPLES as f32;

        for y in row_start..row_end {
            row.iter_mut().for_each(|c| *c = 0.);
            let mut touched = false;

            for s in 0..FILL_SUBSAMPLES {
                let sample_y = y as f64 + (s as f64 + 0.5) / FILL_SUBSAMPLES as f64;

                crossings.clear();
                for (a, b) in &edges {
                    let (lo, hi) = if a.y < b.y { (a, b) } else { (b, a) };
                    if sample_y < lo.y || sample_y >= hi.y {
                        continue;
                    }
                    let x = a.x + (sample_y - a.y) * (b.x - a.x) / (b.y - a.y);
                    let dir = if b.y > a.y { 1 } else { -1 };
                    crossings.push((x, dir));
                }
                crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut winding = 0;
                for pair in crossings.windows(2) {
                    winding += pair[0].1;
                    if winding != 0 {
                        touched |= add_span(&mut row, pair[0].0, pair[1].0, weight);
                    }
                }
            }

            if !touched {
                continue;
            }
            for (x, coverage) in row.iter().enumerate() {
                if *coverage > 0. {
                    let idx = (y * w) as usize + x;
                    self.blend_coverage(idx, color, *coverage);
                }
            }
        }
    }

    /// Round joins and caps, `line_width` scaled by the current transform.
    pub fn stroke(&mut self) {
        let (w, h) = (self.image.width, self.image.height);
        if w <= 0 || h <= 0 {
            return;
        }

        let half_width = self.state.line_width * self.state.transform.scale_factor() / 2.;
        let reach = half_width + 1.;

        let mut min = IVec2::new(w, h);
        let mut max = IVec2::new(-1, -1);

        let segments: Vec<(DVec2, DVec2)> = self
            .path
            .iter()
            .flat_map(|sub| {
                let n = sub.points.len();
                let count = if sub.closed && n > 2 { n } else { n.saturating_sub(1) };
                (0..count).map(move |i| (sub.points[i], sub.points[(i + 1) % n]))
            })
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .collect();

        for (a, b) in segments {
            let lo = (a.min(b) - DVec2::splat(reach)).floor().as_ivec2().max(IVec2::ZERO);
            let hi = (a.max(b) + DVec2::splat(reach))
                .ceil()
                .as_ivec2()
                .min(IVec2::new(w - 1, h - 1));
            if lo.x > hi.x || lo.y > hi.y {
                continue;
            }
            min = min.min(lo);
            max = max.max(hi);

            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                    let d = distance_to_segment(p, a, b);
                    let coverage = (half_width + 0.5 - d).clamp(0., 1.) as f32;
                    let idx = (y * w + x) as usize;
                    if coverage > self.mask[idx] {
                        self.mask[idx] = coverage;
                    }
                }
            }
        }

        if min.x > max.x || min.y > max.y {
            return;
        }

        let color = self.state.stroke_style;
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                let idx = (y * w + x) as usize;
                let coverage = self.mask[idx];
                if coverage > 0. {
                    self.mask[idx] = 0.;
                    self.blend_coverage(idx, color, coverage);
                }
            }
        }
    }

    // shortcuts

    /// Fills the whole image, ignoring transform, alpha and composite.
    pub fn clear(&mut self, color: Color) {
        self.image.fill(color);
    }

    pub fn fill_rect(&mut self, pos: DVec2, size: DVec2) {
        self.begin_path();
        self.rect(pos, size);
        self.fill();
    }

    pub fn fill_circle(&mut self, center: DVec2, r: f64) {
        self.begin_path();
        self.arc(center, r, 0., TAU, false);
        self.fill();
    }

    pub fn stroke_circle(&mut self, center: DVec2, r: f64) {
        self.begin_path();
        self.arc(center, r, 0., TAU, false);
        self.close_path();
        self.stroke();
    }

    pub fn polyline(&mut self, points: &[DVec2], closed: bool) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.begin_path();
        self.move_to(*first);
        for p in rest {
            self.line_to(*p);
        }
        if closed {
            self.close_path();
        }
        self.stroke();
    }

    pub fn polygon(&mut self, points: &[DVec2]) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.begin_path();
        self.move_to(*first);
        for p in rest {
            self.line_to(*p);
        }
        self.close_path();
        self.fill();
    }

    /// dot of radius `r` in the fill style
    pub fn point(&mut self, p: DVec2, r: f64) {
        self.fill_circle(p, r);
    }

    /// One device pixel, ignoring the transform. Alpha and composite apply.
    pub fn plot(&mut self, pixel: IVec2, color: Color) {
        let (scale, blending) = self.blending(1.);
        let _ = self.image.draw_pixel(pixel, color * scale, blending);
    }
}

/// Adds `weight` times the horizontal coverage of [x0, x1) to `row`.
fn add_span(row: &mut [f32], x0: f64, x1: f64, weight: f32) -> bool {
    let width = row.len() as f64;
    let x0 = x0.max(0.);
    let x1 = x1.min(width);
    if x1 <= x0 {
        return false;
    }

    let ix0 = x0.floor() as usize;
    let ix1 = x1.floor() as usize;

    if ix0 == ix1 {
        row[ix0] += ((x1 - x0) as f32) * weight;
        return true;
    }

    row[ix0] += ((ix0 as f64 + 1. - x0) as f32) * weight;
    for c in &mut row[ix0 + 1..ix1] {
        *c += weight;
    }
    if ix1 < row.len() {
        row[ix1] += ((x1 - ix1 as f64) as f32) * weight;
    }
    true
}

pub fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 < f64::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0., 1.);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    fn px(canvas: &Canvas, x: i32, y: i32) -> Color {
        canvas.image().get(IVec2::new(x, y)).unwrap()
    }

    #[test]
    fn fill_rect_covers_exact_pixels() {
        let mut canvas = Canvas::new(10, 10);
        canvas.set_fill_style(Color::ONE);
        canvas.fill_rect(DVec2::new(2., 3.), DVec2::new(4., 2.));

        assert_eq!(px(&canvas, 2, 3), Color::ONE);
        assert_eq!(px(&canvas, 5, 4), Color::ONE);
        assert_eq!(px(&canvas, 6, 4), Color::ZERO);
        assert_eq!(px(&canvas, 2, 5), Color::ZERO);
        assert_eq!(px(&canvas, 1, 3), Color::ZERO);
    }

    #[test]
    fn half_pixel_edges_are_antialiased() {
        let mut canvas = Canvas::new(4, 4);
        canvas.set_fill_style(Color::ONE);
        canvas.fill_rect(DVec2::new(0.5, 0.), DVec2::new(2., 4.));
        assert!((px(&canvas, 0, 1).x - 0.5).abs() < 1e-6);
        assert_eq!(px(&canvas, 1, 1), Color::ONE);
        assert!((px(&canvas, 2, 1).x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn circle_area_matches() {
        let mut canvas = Canvas::new(100, 100);
        canvas.set_fill_style(Color::ONE);
        canvas.fill_circle(DVec2::splat(50.), 30.);

        let area: f32 = canvas.image().data.iter().map(|c| c.x).sum();
        let expected = (PI * 30. * 30.) as f32;
        assert!((area - expected).abs() / expected < 0.01, "area {}", area);
        assert_eq!(px(&canvas, 50, 50), Color::ONE);
        assert_eq!(px(&canvas, 5, 5), Color::ZERO);
    }

    #[test]
    fn nonzero_winding_fills_overlap_once() {
        let mut canvas = Canvas::new(10, 10);
        canvas.set_fill_style(Color::ONE);
        canvas.set_global_alpha(0.5);
        canvas.begin_path();
        canvas.rect(DVec2::ZERO, DVec2::splat(6.));
        canvas.rect(DVec2::splat(3.), DVec2::splat(6.));
        canvas.fill();

        // overlap blended once, not twice
        assert!((px(&canvas, 4, 4).x - 0.5).abs() < 1e-6);
        assert!((px(&canvas, 1, 1).x - 0.5).abs() < 1e-6);
        assert_eq!(px(&canvas, 8, 1), Color::ZERO);
    }

    #[test]
    fn stroke_is_uniform_at_joins() {
        let mut canvas = Canvas::new(20, 20);
        canvas.set_stroke_style(Color::ONE);
        canvas.set_global_alpha(0.5);
        canvas.set_line_width(3.);
        canvas.polyline(
            &[DVec2::new(2., 10.), DVec2::new(10., 10.), DVec2::new(10., 2.)],
            false,
        );

        assert!((px(&canvas, 10, 10).x - 0.5).abs() < 1e-6);
        assert!((px(&canvas, 5, 10).x - 0.5).abs() < 1e-6);
        assert_eq!(px(&canvas, 15, 15), Color::ZERO);
    }

    #[test]
    fn lighter_composite_accumulates() {
        let mut canvas = Canvas::new(4, 4);
        canvas.set_composite(Composite::Lighter);
        canvas.set_fill_style(Color::splat(0.25));
        canvas.fill_rect(DVec2::ZERO, DVec2::splat(4.));
        canvas.fill_rect(DVec2::ZERO, DVec2::splat(4.));
        assert_eq!(px(&canvas, 1, 1), Color::splat(0.5));
    }

    #[test]
    fn transform_applies_to_points_and_line_width() {
        let mut canvas = Canvas::new(20, 20);
        canvas.set_fill_style(Color::ONE);
        canvas.save();
        canvas.translate(DVec2::new(10., 10.));
        canvas.scale(DVec2::splat(2.));
        canvas.fill_rect(DVec2::ZERO, DVec2::splat(2.));
        canvas.restore();

        assert_eq!(px(&canvas, 13, 13), Color::ONE);
        assert_eq!(px(&canvas, 9, 9), Color::ZERO);
        assert_eq!(canvas.transform(), Transform::IDENTITY);

        // extra restore is harmless
        canvas.restore();
        assert_eq!(canvas.transform(), Transform::IDENTITY);
    }

    #[test]
    fn save_restore_styles() {
        let mut canvas = Canvas::new(2, 2);
        canvas.set_line_width(4.);
        canvas.save();
        canvas.set_line_width(9.);
        canvas.set_line_width(-1.);
        assert_eq!(canvas.line_width(), 9.);
        canvas.restore();
        assert_eq!(canvas.line_width(), 4.);
    }

    #[test]
    fn drawing_off_canvas_is_clipped() {
        let mut canvas = Canvas::new(8, 8);
        canvas.set_fill_style(Color::ONE);
        canvas.set_stroke_style(Color::ONE);
        canvas.fill_circle(DVec2::new(-50., -50.), 10.);
        canvas.polyline(&[DVec2::new(-10., 100.), DVec2::new(100., 100.)], false);
        canvas.fill_rect(DVec2::new(-4., -4.), DVec2::splat(6.));

        assert_eq!(px(&canvas, 0, 0), Color::ONE);
        assert_eq!(px(&canvas, 7, 7), Color::ZERO);
    }

    #[test]
    fn curves_end_on_target() {
        let mut canvas = Canvas::new(10, 10);
        canvas.begin_path();
        canvas.move_to(DVec2::ZERO);
        canvas.bezier_curve_to(DVec2::new(0., 5.), DVec2::new(5., 5.), DVec2::new(5., 0.));
        canvas.quadratic_curve_to(DVec2::new(7., 3.), DVec2::new(9., 0.));
        assert_eq!(canvas.current_device_point(), Some(DVec2::new(9., 0.)));
    }

    #[test]
    fn arc_sweep_direction() {
        let mut canvas = Canvas::new(10, 10);
        canvas.begin_path();
        canvas.arc(DVec2::ZERO, 1., 0., PI / 2., false);
        let end = canvas.current_device_point().unwrap();
        assert!((end - DVec2::Y).length() < 1e-9);

        canvas.begin_path();
        canvas.arc(DVec2::ZERO, 1., 0., PI / 2., true);
        let sub = &canvas.path[0];
        // counter clockwise goes the long way through -y
        assert!(sub.points.iter().any(|p| p.y < -0.9));
    }

    #[test]
    fn distance_to_degenerate_segment() {
        assert_eq!(distance_to_segment(DVec2::new(3., 4.), DVec2::ZERO, DVec2::ZERO), 5.);
        assert_eq!(distance_to_segment(DVec2::new(1., 2.), DVec2::ZERO, DVec2::new(4., 0.)), 2.);
    }

    #[test]
    fn plot_ignores_transform_but_not_composite() {
        let mut canvas = Canvas::new(4, 4);
        canvas.translate(DVec2::splat(2.));
        canvas.set_composite(Composite::Lighter);
        canvas.plot(IVec2::new(1, 1), Color::splat(0.25));
        canvas.plot(IVec2::new(1, 1), Color::splat(0.25));
        canvas.plot(IVec2::new(9, 1), Color::ONE);
        assert_eq!(px(&canvas, 1, 1), Color::splat(0.5));
        assert_eq!(px(&canvas, 3, 3), Color::ZERO);
    }

    #[test]
    fn reset_restores_defaults_and_keeps_pixels() {
        let mut canvas = Canvas::new(4, 4);
        canvas.set_fill_style(Color::ONE);
        canvas.fill_rect(DVec2::ZERO, DVec2::splat(4.));
        canvas.save();
        canvas.set_line_width(7.);
        canvas.set_global_alpha(0.1);
        canvas.translate(DVec2::splat(1.));
        canvas.begin_path();
        canvas.rect(DVec2::ZERO, DVec2::ONE);

        canvas.reset();
        assert_eq!(canvas.line_width(), 1.);
        assert_eq!(px(&canvas, 0, 0), Color::ONE);

        // empty path, default black fill at full alpha
        canvas.fill();
        assert_eq!(px(&canvas, 1, 1), Color::ONE);
        canvas.fill_rect(DVec2::ZERO, DVec2::ONE);
        assert_eq!(px(&canvas, 0, 0), Color::ZERO);
        assert_eq!(px(&canvas, 1, 1), Color::ONE);
    }

    #[test]
    fn curves_on_an_empty_path_start_at_the_control_point() {
        let mut canvas = Canvas::new(20, 20);
        canvas.begin_path();
        canvas.quadratic_curve_to(DVec2::new(2., 2.), DVec2::new(18., 18.));
        assert_eq!(canvas.current_device_point(), Some(DVec2::new(18., 18.)));
        canvas.set_stroke_style(Color::ONE);
        canvas.set_line_width(2.);
        canvas.stroke();
        assert_eq!(px(&canvas, 10, 10), Color::ONE);

        let mut canvas = Canvas::new(20, 20);
        canvas.begin_path();
        canvas.bezier_curve_to(DVec2::new(2., 10.), DVec2::new(10., 10.), DVec2::new(18., 10.));
        assert_eq!(canvas.path.len(), 1);
        assert!(canvas.path[0].points.len() > 2);
        assert_eq!(canvas.path[0].points[0], DVec2::new(2., 10.));
        canvas.set_stroke_style(Color::ONE);
        canvas.set_line_width(2.);
        canvas.stroke();
        assert_eq!(px(&canvas, 10, 9), Color::ONE);
    }
}
