use glam::{DVec2, IVec2};
use rayon::prelude::*;

use crate::{
    Color, Result,
    clrs::Palette,
    canvas::Composite,
    img::ToneMappingMethod,
    math::Random,
    sketch::{Props, Settings, Sketch},
};

/// x' = sin(a y) + c cos(a x)
/// y' = sin(b x) + d cos(b y)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clifford {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

const PRESETS: [Clifford; 5] = [
    Clifford { a: -1.4, b: 1.6, c: 1.0, d: 0.7 },
    Clifford { a: 1.7, b: 1.7, c: 0.6, d: 1.2 },
    Clifford { a: 1.5, b: -1.8, c: 1.6, d: 0.9 },
    Clifford { a: -1.7, b: 1.3, c: -0.1, d: -1.2 },
    Clifford { a: -1.8, b: -2.0, c: -0.5, d: -0.9 },
];

impl Clifford {
    pub fn step(&self, p: DVec2) -> DVec2 {
        DVec2::new(
            (self.a * p.y).sin() + self.c * (self.a * p.x).cos(),
            (self.b * p.x).sin() + self.d * (self.b * p.y).cos(),
        )
    }

    /// Every orbit stays inside these bounds.
    pub fn extent(&self) -> DVec2 {
        DVec2::new(1. + self.c.abs(), 1. + self.d.abs())
    }
}

#[derive(Clone, Debug)]
pub struct Params {
    pub iterations: usize,
    /// independent orbits integrated in parallel
    pub chains: usize,
    /// iterations dropped before plotting
    pub warmup: usize,
    pub margin: f64,
    pub exposure: f32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            iterations: 4_000_000,
            chains: 8,
            warmup: 100,
            margin: 0.1,
            exposure: 1.5,
        }
    }
}

pub struct Attractor {
    params: Params,
    clifford: Clifford,
    starts: Vec<DVec2>,
    palette: Palette,
}

impl Attractor {
    pub fn new(params: Params, clifford: Clifford, palette: Palette, random: &mut Random) -> Self {
        let starts = (0..params.chains.max(1))
            .map(|_| random.inside_circle(0.5))
            .collect();
        Self {
            params,
            clifford,
            starts,
            palette,
        }
    }

    /// Hit count per pixel, row-major.
    pub fn density(&self, width: usize, height: usize) -> Vec<u32> {
        let extent = self.clifford.extent();
        let size = DVec2::new(width as f64, height as f64);
        let margin = size.min_element() * self.params.margin;
        // uniform scale keeps the aspect ratio of the attractor
        let scale = ((size - DVec2::splat(2. * margin)) / (extent * 2.)).min_element();
        let center = size / 2.;

        let per_chain = self.params.iterations / self.starts.len();
        let warmup = self.params.warmup;
        let clifford = self.clifford;

        self.starts
            .par_iter()
            .map(|start| {
                let mut hist = vec![0u32; width * height];
                let mut p = *start;
                for i in 0..per_chain + warmup {
                    p = clifford.step(p);
                    if i < warmup {
                        continue;
                    }
                    let px = (center + p * scale).floor();
                    if px.x >= 0. && px.y >= 0. && px.x < size.x && px.y < size.y {
                        hist[px.y as usize * width + px.x as usize] += 1;
                    }
                }
                hist
            })
            .reduce(
                || vec![0u32; width * height],
                |mut acc, hist| {
                    acc.iter_mut().zip(hist).for_each(|(a, h)| *a += h);
                    acc
                },
            )
    }
}

impl Sketch for Attractor {
    fn render(&mut self, props: &mut Props) {
        let (width, height) = (props.width as usize, props.height as usize);

        let chrono = std::time::Instant::now();
        let density = self.density(width, height);
        log::debug!(
            "attractor: {} iterations in {:?}",
            self.params.iterations,
            chrono.elapsed()
        );

        let max = density.iter().copied().max().unwrap_or(0);
        if max == 0 {
            log::warn!("attractor: empty density");
            return;
        }
        let log_max = (max as f32).ln_1p();

        let ctx = &mut *props.context;
        ctx.set_composite(Composite::Lighter);
        for (idx, count) in density.into_iter().enumerate() {
            if count == 0 {
                continue;
            }
            let t = count as f32 / max as f32;
            let v = (count as f32).ln_1p() / log_max;
            let color: Color = self.palette.at(v as f64) * v * self.params.exposure;
            let pixel = IVec2::new((idx % width) as i32, (idx / width) as i32);
            // dense areas blow out through the tone mapping
            ctx.plot(pixel, color * (1. + t));
        }
    }
}

pub fn settings() -> Settings {
    Settings {
        dimensions: [1080, 1080],
        tone_mapping: ToneMappingMethod::Reinhard,
        ..Settings::default()
    }
}

pub fn sketch(settings: &Settings, random: &mut Random) -> Result<Box<dyn Sketch>> {
    let preset = PRESETS[random.range_floor(0, PRESETS.len() as i64) as usize];
    let jitter = 0.03;
    let clifford = Clifford {
        a: preset.a + random.range(-jitter, jitter),
        b: preset.b + random.range(-jitter, jitter),
        c: preset.c + random.range(-jitter, jitter),
        d: preset.d + random.range(-jitter, jitter),
    };
    log::debug!("attractor: {:?}", clifford);

    // fewer samples for small canvases, the density is per pixel anyway
    let pixels = settings.width() as usize * settings.height() as usize;
    let params = Params {
        iterations: (pixels * 4).clamp(10_000, Params::default().iterations),
        ..Params::default()
    };
    Ok(Box::new(Attractor::new(params, clifford, Palette::inferno()?, random)))
}
