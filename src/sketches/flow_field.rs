use std::f64::consts::TAU;

use glam::DVec2;

use crate::{
    Color, Result,
    clrs::Palette,
    math::{Random, map_range},
    sketch::{Props, Settings, Sketch},
};

#[derive(Clone, Debug)]
pub struct Params {
    pub walkers: usize,
    pub steps: usize,
    /// pixels per step at 1080
    pub step_length: f64,
    pub frequency: f64,
    /// how many turns the noise range maps to
    pub turbulence: f64,
    pub min_width: f64,
    pub max_width: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            walkers: 900,
            steps: 120,
            step_length: 3.,
            frequency: 0.0025,
            turbulence: 1.5,
            min_width: 0.5,
            max_width: 4.,
        }
    }
}

pub struct Walker {
    pub start: DVec2,
    pub color: Color,
    pub width: f64,
}

pub struct FlowField {
    params: Params,
    random: Random,
    palette: Palette,
    walkers: Vec<Walker>,
}

impl FlowField {
    pub fn new(params: Params, palette: Palette, size: DVec2, random: &mut Random) -> Self {
        let scale = size.min_element() / 1080.;
        let walkers = (0..params.walkers)
            .map(|_| {
                // mostly thin lines, a few thick ones
                let w = random.value().powi(3);
                Walker {
                    start: random.point_in_rect(DVec2::ZERO, size),
                    color: palette.pick(random),
                    width: map_range(w, 0., 1., params.min_width, params.max_width, true) * scale,
                }
            })
            .collect();

        Self {
            params,
            random: random.fork(),
            palette,
            walkers,
        }
    }

    /// Field direction at `p`, in pixels of a 1080 wide canvas.
    pub fn angle(&self, p: DVec2, scale: f64) -> f64 {
        let p = p / scale;
        self.random.noise2d(p.x, p.y, self.params.frequency, 1.) * TAU * self.params.turbulence
    }

    /// Path of a walker until it leaves the canvas or runs out of steps.
    pub fn trace(&self, start: DVec2, size: DVec2) -> Vec<DVec2> {
        let scale = size.min_element() / 1080.;
        let step = self.params.step_length * scale;

        let mut points = vec![start];
        let mut p = start;
        for _ in 0..self.params.steps {
            p += DVec2::from_angle(self.angle(p, scale)) * step;
            if p.x < 0. || p.y < 0. || p.x >= size.x || p.y >= size.y {
                break;
            }
            points.push(p);
        }
        points
    }
}

impl Sketch for FlowField {
    fn render(&mut self, props: &mut Props) {
        let size = DVec2::new(props.width, props.height);
        let ctx = &mut *props.context;
        ctx.clear(self.palette.background());

        let mut segments = 0;
        for walker in &self.walkers {
            let points = self.trace(walker.start, size);
            if points.len() < 2 {
                continue;
            }
            segments += points.len() - 1;
            ctx.set_stroke_style(walker.color);
            ctx.set_line_width(walker.width.max(0.5));
            ctx.polyline(&points, false);
        }
        log::debug!("flow_field: {} walkers, {} segments", self.walkers.len(), segments);
    }
}

pub fn settings() -> Settings {
    Settings {
        dimensions: [1080, 1350],
        ..Settings::default()
    }
}

pub fn sketch(settings: &Settings, random: &mut Random) -> Result<Box<dyn Sketch>> {
    let size = DVec2::new(settings.width() as f64, settings.height() as f64);
    let palette = Palette::from_hex(&[
        "#f4f1de", "#e07a5f", "#3d405b", "#81b29a", "#f2cc8f", "#264653",
    ])?;
    let params = Params {
        frequency: random.range(0.0015, 0.004),
        turbulence: random.range(0.75, 2.),
        ..Params::default()
    };
    Ok(Box::new(FlowField::new(params, palette, size, random)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketches::{is_flat, render_small};

    fn field(size: DVec2) -> FlowField {
        let palette = Palette::from_hex(&["#000000", "#ffffff"]).unwrap();
        let params = Params {
            walkers: 10,
            ..Params::default()
        };
        FlowField::new(params, palette, size, &mut Random::new(21))
    }

    #[test]
    fn traces_stay_on_canvas_with_even_steps() {
        let size = DVec2::new(1080., 540.);
        let f = field(size);
        for walker in &f.walkers {
            let points = f.trace(walker.start, size);
            assert!(!points.is_empty() && points.len() <= Params::default().steps + 1);
            for p in &points {
                assert!(p.cmpge(DVec2::ZERO).all() && p.cmplt(size).all());
            }
            for w in points.windows(2) {
                assert!((w[0].distance(w[1]) - 3. * 0.5).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn walkers_get_foreground_colors_and_scaled_widths() {
        let f = field(DVec2::splat(540.));
        for walker in &f.walkers {
            assert_eq!(walker.color, Color::ONE);
            assert!((0.25..=2.).contains(&walker.width));
        }
    }

    #[test]
    fn renders_something() {
        assert!(!is_flat(&render_small("flow_field", 0)));
    }
}
