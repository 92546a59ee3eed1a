use std::f64::consts::PI;

use glam::DVec2;

use crate::{
    Color, Result,
    clrs::Palette,
    geometry::{chaikin, regular_polygon},
    math::Random,
    matrix::rotate_around,
    quadtree::{Aabb, Quadtree},
    sketch::{Props, Settings, Sketch},
};

#[derive(Clone, Debug)]
pub struct Params {
    pub initial_nodes: usize,
    pub initial_radius: f64,
    /// edges longer than this are split in two
    pub max_edge: f64,
    /// neighbours closer than this are not pulled in
    pub rest_length: f64,
    /// larger than `max_edge`, so the loop keeps lengthening
    pub repulsion_radius: f64,
    pub attraction: f64,
    pub alignment: f64,
    pub repulsion: f64,
    /// per step, in pixels
    pub max_move: f64,
    pub max_nodes: usize,
    pub steps_per_frame: usize,
    pub line_width: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            initial_nodes: 24,
            initial_radius: 60.,
            max_edge: 8.,
            rest_length: 6.,
            repulsion_radius: 24.,
            attraction: 0.2,
            alignment: 0.1,
            repulsion: 0.8,
            max_move: 2.,
            max_nodes: 3000,
            steps_per_frame: 2,
            line_width: 2.,
        }
    }
}

pub struct Growth {
    params: Params,
    pub nodes: Vec<DVec2>,
    bounds: Aabb,
    palette: Palette,
}

impl Growth {
    pub fn new(params: Params, size: DVec2, palette: Palette, random: &mut Random) -> Self {
        let center = size / 2.;
        let nodes = regular_polygon(center, params.initial_radius, params.initial_nodes.max(3), 0.)
            .into_iter()
            .map(|p| p + random.inside_circle(params.initial_radius * 0.05))
            .collect();

        Self {
            params,
            nodes,
            bounds: Aabb::from_min_max(DVec2::ZERO, size),
            palette,
        }
    }

    fn build_tree(&self) -> Quadtree<usize> {
        let mut tree = Quadtree::new(self.bounds, 8);
        for (idx, p) in self.nodes.iter().enumerate() {
            tree.insert(*p, idx);
        }
        tree
    }

    fn force(&self, idx: usize, tree: &Quadtree<usize>) -> DVec2 {
        let n = self.nodes.len();
        let p = self.nodes[idx];
        let prev = self.nodes[(idx + n - 1) % n];
        let next = self.nodes[(idx + 1) % n];

        let mut force = DVec2::ZERO;

        // spring towards neighbours, only once stretched past the rest length
        for neighbour in [prev, next] {
            let d = p.distance(neighbour);
            if d > self.params.rest_length {
                force += (neighbour - p) / d * (d - self.params.rest_length) * self.params.attraction;
            }
        }

        force += (prev.midpoint(next) - p) * self.params.alignment;

        let r = self.params.repulsion_radius;
        let mut push = DVec2::ZERO;
        for (q, other) in tree.query_radius(p, r) {
            if other == idx {
                continue;
            }
            let d = p.distance(q);
            if d > 0. {
                push += (p - q) / d * (1. - d / r);
            }
        }
        force + push * self.params.repulsion
    }

    fn split_edges(&mut self) {
        let mut nodes = Vec::with_capacity(self.nodes.len() * 2);
        let n = self.nodes.len();
        for idx in 0..n {
            let a = self.nodes[idx];
            let b = self.nodes[(idx + 1) % n];
            nodes.push(a);
            if a.distance(b) > self.params.max_edge && nodes.len() + (n - idx) < self.params.max_nodes {
                nodes.push(a.midpoint(b));
            }
        }
        self.nodes = nodes;
    }

    pub fn step(&mut self) {
        let tree = self.build_tree();
        let forces: Vec<DVec2> = (0..self.nodes.len()).map(|i| self.force(i, &tree)).collect();

        let (min, max) = (self.bounds.min(), self.bounds.max() - DVec2::splat(1e-6));
        let max_move = self.params.max_move;
        for (p, f) in self.nodes.iter_mut().zip(forces) {
            *p = (*p + f.clamp_length_max(max_move)).clamp(min, max);
        }

        self.split_edges();
    }
}

impl Sketch for Growth {
    fn begin(&mut self, _props: &mut Props) {
        log::debug!("growth: starting with {} nodes", self.nodes.len());
    }

    fn render(&mut self, props: &mut Props) {
        if props.frame > 0 {
            for _ in 0..self.params.steps_per_frame {
                self.step();
            }
        }

        let ctx = &mut *props.context;
        ctx.clear(self.palette.background());

        let outline = chaikin(&self.nodes, 2, true);
        ctx.set_fill_style(self.palette.at(0.35));
        ctx.set_global_alpha(0.6);
        ctx.polygon(&outline);

        ctx.set_global_alpha(1.);
        ctx.set_stroke_style(self.palette.at(1.));
        ctx.set_line_width(self.params.line_width);
        ctx.polyline(&outline, true);

        if props.frame + 1 == props.total_frames {
            log::debug!("growth: {} nodes after {} frames", self.nodes.len(), props.total_frames);
        }
    }
}

pub fn settings() -> Settings {
    Settings {
        dimensions: [1080, 1080],
        animate: true,
        duration: Some(20.),
        fps: 30.,
        ..Settings::default()
    }
}

pub fn sketch(settings: &Settings, random: &mut Random) -> Result<Box<dyn Sketch>> {
    let size = DVec2::new(settings.width() as f64, settings.height() as f64);
    let scale = size.min_element() / 1080.;
    let hue = random.range(0., 360.) as f32;
    let mut colors = vec![Color::splat(0.02)];
    colors.extend(Palette::hsl_ramp(hue, 40., 4, 0.6, 0.55)?.colors());
    let palette = Palette::new(colors)?;

    let max_edge = (8. * scale).max(1.);
    let params = Params {
        initial_radius: 60. * scale,
        max_edge,
        rest_length: max_edge * 0.75,
        repulsion_radius: max_edge * 3.,
        max_move: (2. * scale).max(0.25),
        line_width: (2. * scale).max(1.),
        // keep the loop open on tiny canvases
        initial_nodes: if scale < 0.2 { 12 } else { 24 },
        ..Params::default()
    };
    // random start orientation
    let mut growth = Growth::new(params, size, palette, random);
    let angle = random.range(0., 2. * PI);
    let center = size / 2.;
    for p in growth.nodes.iter_mut() {
        *p = rotate_around(*p, center, angle);
    }
    Ok(Box::new(growth))
}
