use std::f64::consts::PI;

use glam::DVec2;

use crate::{
    Result,
    clrs::Palette,
    grid::{Field, Segment, marching_squares},
    math::{NoiseLoop, Random, lerp},
    sketch::{Props, Settings, Sketch},
};

#[derive(Clone, Debug)]
pub struct Params {
    /// samples across the shortest side
    pub resolution: usize,
    pub levels: usize,
    pub frequency: f64,
    /// radius of the circle the field drifts along, in noise space
    pub drift: f64,
    pub margin: f64,
    pub line_width: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            resolution: 90,
            levels: 9,
            frequency: 2.5,
            drift: 0.6,
            margin: 0.08,
            line_width: 2.,
        }
    }
}

pub struct Isolines {
    params: Params,
    random: Random,
    /// slow breathing of the thresholds
    breathing: NoiseLoop,
    palette: Palette,
}

impl Isolines {
    pub fn new(params: Params, palette: Palette, random: &mut Random) -> Self {
        let random = random.fork();
        let breathing = random.noise_loop(1., 1., 0.15);
        Self {
            params,
            random,
            breathing,
            palette,
        }
    }

    /// Noise sampled on a `(columns + 1) x (rows + 1)` lattice over the unit square,
    /// translated along a circle so that playhead 0 and 1 match.
    pub fn field(&self, columns: usize, rows: usize, playhead: f64) -> Field<f64> {
        let offset = DVec2::from_angle(2. * PI * playhead) * self.params.drift;
        let freq = self.params.frequency;
        let random = &self.random;

        Field::par_from_fn(columns + 1, rows + 1, |x, y| {
            let u = x as f64 / columns.max(1) as f64;
            let v = y as f64 / rows.max(1) as f64;
            random.noise3d(u * freq + offset.x, v * freq + offset.y, 0.5, 1., 1.)
        })
    }

    pub fn thresholds(&self, playhead: f64) -> Vec<f64> {
        let shift = self.breathing.at(playhead, 0.);
        let levels = self.params.levels.max(1);
        (0..levels)
            .map(|i| lerp(-0.5, 0.5, (i as f64 + 0.5) / levels as f64) + shift)
            .collect()
    }
}

fn stroke_segments(props: &mut Props, segments: &[Segment]) {
    let ctx = &mut *props.context;
    ctx.begin_path();
    for (a, b) in segments {
        ctx.move_to(*a);
        ctx.line_to(*b);
    }
    ctx.stroke();
}

impl Sketch for Isolines {
    fn render(&mut self, props: &mut Props) {
        let size = DVec2::new(props.width, props.height);
        let margin = size.min_element() * self.params.margin;
        let inner = size - DVec2::splat(2. * margin);

        let cell = inner.min_element() / self.params.resolution.max(2) as f64;
        let columns = (inner.x / cell).round().max(1.) as usize;
        let rows = (inner.y / cell).round().max(1.) as usize;
        let spacing = inner / DVec2::new(columns as f64, rows as f64);

        let chrono = std::time::Instant::now();
        let field = self.field(columns, rows, props.playhead);
        log::trace!("isolines: field {}x{} in {:?}", columns + 1, rows + 1, chrono.elapsed());

        props.context.clear(self.palette.background());
        props.context.set_line_width(self.params.line_width * size.min_element() / 1080.);

        let thresholds = self.thresholds(props.playhead);
        let count = thresholds.len();
        for (i, threshold) in thresholds.into_iter().enumerate() {
            let segments = marching_squares(&field, threshold, DVec2::splat(margin), spacing);
            let t = if count > 1 { i as f64 / (count - 1) as f64 } else { 1. };
            props.context.set_stroke_style(self.palette.at(t));
            stroke_segments(props, &segments);
        }
    }
}

pub fn settings() -> Settings {
    Settings {
        dimensions: [1080, 1080],
        animate: true,
        duration: Some(8.),
        fps: 30.,
        ..Settings::default()
    }
}

pub fn sketch(_settings: &Settings, random: &mut Random) -> Result<Box<dyn Sketch>> {
    let palette = if random.chance(0.3) {
        Palette::inferno()?
    } else {
        Palette::random(random)?
    };
    Ok(Box::new(Isolines::new(Params::default(), palette, random)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketches::{is_flat, render_small};

    fn isolines() -> Isolines {
        let palette = Palette::inferno().unwrap();
        Isolines::new(Params::default(), palette, &mut Random::new(11))
    }

    #[test]
    fn field_loops_over_the_playhead() {
        let sketch = isolines();
        let start = sketch.field(20, 20, 0.);
        let end = sketch.field(20, 20, 1.);
        assert_eq!(start.data.len(), 21 * 21);
        for (a, b) in start.data.iter().zip(end.data.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
        assert_ne!(start, sketch.field(20, 20, 0.25));
    }

    #[test]
    fn thresholds_are_sorted_and_spread() {
        let sketch = isolines();
        let thresholds = sketch.thresholds(0.3);
        assert_eq!(thresholds.len(), 9);
        assert!(thresholds.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn noise_produces_contours() {
        let sketch = isolines();
        let field = sketch.field(40, 40, 0.);
        let total: usize = sketch
            .thresholds(0.)
            .into_iter()
            .map(|t| marching_squares(&field, t, DVec2::ZERO, DVec2::ONE).len())
            .sum();
        assert!(total > 0);
    }

    #[test]
    fn renders_something() {
        assert!(!is_flat(&render_small("isolines", 0)));
    }
}
