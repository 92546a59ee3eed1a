use std::f64::consts::PI;

use glam::DVec2;

use crate::{
    Color, Result,
    clrs::Palette,
    geometry::{Circle, metaball, polygon_area},
    math::Random,
    sketch::{Props, Settings, Sketch},
};

#[derive(Clone, Debug)]
pub struct Params {
    pub count: usize,
    /// fractions of the shortest side
    pub min_radius: f64,
    pub max_radius: f64,
    pub orbit: f64,
    /// spread of the bridge, 0.5 is the classic look
    pub v: f64,
    pub handle_size: f64,
    /// bridges only form below this many summed radii
    pub reach: f64,
    pub resolution: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            count: 9,
            min_radius: 0.03,
            max_radius: 0.09,
            orbit: 0.32,
            v: 0.5,
            handle_size: 2.4,
            reach: 2.2,
            resolution: 24,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Orbiter {
    radius: f64,
    orbit: f64,
    phase: f64,
    /// whole turns per loop, never zero
    turns: i32,
    wobble: f64,
}

impl Orbiter {
    fn circle(&self, center: DVec2, scale: f64, playhead: f64) -> Circle {
        let angle = self.phase + 2. * PI * self.turns as f64 * playhead;
        let orbit = self.orbit * (1. + self.wobble * (2. * PI * playhead).sin());
        Circle::new(center + DVec2::from_angle(angle) * orbit * scale, self.radius * scale)
    }
}

pub struct Metaballs {
    params: Params,
    orbiters: Vec<Orbiter>,
    background: Color,
    color: Color,
}

impl Metaballs {
    pub fn new(params: Params, palette: &Palette, random: &mut Random) -> Self {
        let orbiters = (0..params.count)
            .map(|_| {
                let turns = random.range_floor(1, 3) as i32 * random.sign() as i32;
                Orbiter {
                    radius: random.range(params.min_radius, params.max_radius),
                    orbit: random.range(0.2, 1.) * params.orbit,
                    phase: random.range(0., 2. * PI),
                    turns,
                    wobble: random.range(0., 0.4),
                }
            })
            .collect();

        Self {
            params,
            orbiters,
            background: palette.background(),
            color: palette.pick(random),
        }
    }

    pub fn circles(&self, size: DVec2, playhead: f64) -> Vec<Circle> {
        let scale = size.min_element();
        self.orbiters
            .iter()
            .map(|o| o.circle(size / 2., scale, playhead))
            .collect()
    }

    /// Closed outlines of every bridge between two circles close enough.
    pub fn bridges(&self, circles: &[Circle]) -> Vec<Vec<DVec2>> {
        let mut bridges = Vec::new();
        for (i, a) in circles.iter().enumerate() {
            for b in &circles[i + 1..] {
                let max_distance = (a.r + b.r) * self.params.reach;
                if let Some(m) = metaball(a, b, self.params.v, self.params.handle_size, max_distance) {
                    let mut outline = m.to_polygon(self.params.resolution);
                    // same winding as the circles, or the nonzero fill cuts holes
                    if polygon_area(&outline) < 0. {
                        outline.reverse();
                    }
                    bridges.push(outline);
                }
            }
        }
        bridges
    }
}

impl Sketch for Metaballs {
    fn render(&mut self, props: &mut Props) {
        let size = DVec2::new(props.width, props.height);
        let circles = self.circles(size, props.playhead);
        let bridges = self.bridges(&circles);

        let ctx = &mut *props.context;
        ctx.clear(self.background);
        ctx.set_fill_style(self.color);

        // one path so overlapping shapes blend once
        ctx.begin_path();
        for c in &circles {
            ctx.move_to(c.center + DVec2::new(c.r, 0.));
            ctx.arc(c.center, c.r, 0., 2. * PI, false);
        }
        for bridge in &bridges {
            if let Some((first, rest)) = bridge.split_first() {
                ctx.move_to(*first);
                for p in rest {
                    ctx.line_to(*p);
                }
                ctx.close_path();
            }
        }
        ctx.fill();
    }
}

pub fn settings() -> Settings {
    Settings {
        dimensions: [1080, 1080],
        animate: true,
        duration: Some(6.),
        fps: 30.,
        ..Settings::default()
    }
}

pub fn sketch(_settings: &Settings, random: &mut Random) -> Result<Box<dyn Sketch>> {
    let palette = Palette::from_hex(&["#f2efe6", "#1d3557", "#e63946", "#457b9d", "#2a9d8f"])?;
    Ok(Box::new(Metaballs::new(Params::default(), &palette, random)))
}
