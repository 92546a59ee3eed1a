use std::f64::consts::TAU;

use glam::DVec2;
use rayon::prelude::*;

use crate::{
    Color, Result,
    clrs::Palette,
    math::{Random, smoothstep},
    sketch::{Props, Settings, Sketch},
};

#[derive(Clone, Debug)]
pub struct Params {
    pub seeds: usize,
    /// drift radius, fraction of the shortest side
    pub drift: f64,
    /// d1 / d2 above which a pixel counts as border
    pub border: f64,
    pub dot_radius: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            seeds: 48,
            drift: 0.05,
            border: 0.92,
            dot_radius: 3.,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Seed {
    /// uv in [0, 1]
    pub base: DVec2,
    pub phase: f64,
    pub turns: f64,
    pub color: Color,
}

impl Seed {
    pub fn position(&self, size: DVec2, drift: f64, playhead: f64) -> DVec2 {
        let angle = self.phase + TAU * self.turns * playhead;
        self.base * size + DVec2::from_angle(angle) * drift * size.min_element()
    }
}

/// (index of the nearest site, distance to nearest, distance to second nearest)
pub fn nearest_two(p: DVec2, sites: &[DVec2]) -> Option<(usize, f64, f64)> {
    let mut best: Option<(usize, f64)> = None;
    let mut second = f64::INFINITY;
    for (idx, site) in sites.iter().enumerate() {
        let d = p.distance_squared(*site);
        match best {
            Some((_, bd)) if d >= bd => second = second.min(d),
            Some((_, bd)) => {
                second = bd;
                best = Some((idx, d));
            }
            None => best = Some((idx, d)),
        }
    }
    best.map(|(idx, d)| (idx, d.sqrt(), second.sqrt()))
}

pub struct Voronoi {
    params: Params,
    seeds: Vec<Seed>,
    edge: Color,
}

impl Voronoi {
    pub fn new(params: Params, palette: &Palette, random: &mut Random) -> Self {
        let seeds = (0..params.seeds.max(1))
            .map(|_| Seed {
                base: random.point_in_rect(DVec2::ZERO, DVec2::ONE),
                phase: random.range(0., TAU),
                turns: random.range_floor(1, 3) as f64 * random.sign(),
                color: palette.pick(random),
            })
            .collect();
        Self {
            params,
            seeds,
            edge: palette.background(),
        }
    }

    pub fn sites(&self, size: DVec2, playhead: f64) -> Vec<DVec2> {
        self.seeds
            .iter()
            .map(|s| s.position(size, self.params.drift, playhead))
            .collect()
    }

    pub fn shade(&self, p: DVec2, sites: &[DVec2]) -> Color {
        let Some((idx, d1, d2)) = nearest_two(p, sites) else {
            return self.edge;
        };
        if !d2.is_finite() || d2 <= 0. {
            return self.seeds[idx].color;
        }
        let ratio = d1 / d2;
        let edge = smoothstep(self.params.border, 1., ratio) as f32;
        self.seeds[idx].color.lerp(self.edge, edge)
    }
}

impl Sketch for Voronoi {
    fn render(&mut self, props: &mut Props) {
        let size = DVec2::new(props.width, props.height);
        let sites = self.sites(size, props.playhead);
        let width = props.width as usize;

        let chrono = std::time::Instant::now();
        let this = &*self;
        props
            .context
            .image_mut()
            .data
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.iter_mut().enumerate() {
                    let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                    *px = this.shade(p, &sites);
                }
            });
        log::trace!("voronoi: shading in {:?}", chrono.elapsed());

        let scale = size.min_element() / 1080.;
        let ctx = &mut *props.context;
        ctx.set_fill_style(self.edge);
        for site in &sites {
            ctx.point(*site, (self.params.dot_radius * scale).max(0.75));
        }
    }
}

pub fn settings() -> Settings {
    Settings {
        dimensions: [1080, 1080],
        animate: true,
        duration: Some(10.),
        fps: 30.,
        ..Settings::default()
    }
}

pub fn sketch(_settings: &Settings, random: &mut Random) -> Result<Box<dyn Sketch>> {
    let palette = Palette::random(random)?;
    Ok(Box::new(Voronoi::new(Params::default(), &palette, random)))
}
