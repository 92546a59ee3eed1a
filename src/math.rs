use std::f64::consts::PI;

use glam::DVec2;
use noise_functions::{Noise, Perlin};
use rand::{
    Rng, SeedableRng,
    seq::{IndexedRandom, SliceRandom},
};
use rand_chacha::ChaCha20Rng;

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

pub fn inverse_lerp(a: f64, b: f64, v: f64) -> f64 {
    if (b - a).abs() < f64::EPSILON {
        return 0.;
    }
    (v - a) / (b - a)
}

pub fn clamp(v: f64, min: f64, max: f64) -> f64 {
    if min < max {
        v.clamp(min, max)
    } else {
        v.clamp(max, min)
    }
}

pub fn clamp01(v: f64) -> f64 {
    v.clamp(0., 1.)
}

pub fn map_range(v: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64, clamped: bool) -> f64 {
    if (in_max - in_min).abs() < f64::EPSILON {
        return out_min;
    }
    let out = (v - in_min) / (in_max - in_min) * (out_max - out_min) + out_min;
    if clamped {
        clamp(out, out_min, out_max)
    } else {
        out
    }
}

pub fn fract(v: f64) -> f64 {
    v - v.floor()
}

/// wraps `v` into `[min, max)`
pub fn wrap(v: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range.abs() < f64::EPSILON {
        return min;
    }
    // rem_euclid rounds up to `range` for tiny negative offsets
    let r = (v - min).rem_euclid(range);
    if r >= range { min } else { min + r }
}

pub fn ping_pong(t: f64, length: f64) -> f64 {
    if length.abs() < f64::EPSILON {
        return 0.;
    }
    let t = t.rem_euclid(length * 2.);
    length - (t - length).abs()
}

pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = clamp01(inverse_lerp(edge0, edge1, x));
    t * t * (3. - 2. * t)
}

/// frame rate independent exponential smoothing
pub fn damp(a: f64, b: f64, lambda: f64, dt: f64) -> f64 {
    lerp(a, b, 1. - (-lambda * dt).exp())
}

pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.
}

pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180. / PI
}

/// `n` evenly spaced values in [0, 1] (or [0, 1) when not inclusive)
pub fn linspace(n: usize, inclusive: bool) -> Vec<f64> {
    let div = if inclusive { n.saturating_sub(1) } else { n };
    (0..n)
        .map(|i| if div == 0 { 0. } else { i as f64 / div as f64 })
        .collect()
}

/// Linear interpolation through a list of keyframes, `t` in [0, 1].
pub fn lerp_frames(values: &[f64], t: f64) -> f64 {
    match values.len() {
        0 => 0.,
        1 => values[0],
        len => {
            let t = clamp01(t) * (len - 1) as f64;
            let idx = (t.floor() as usize).min(len - 2);
            lerp(values[idx], values[idx + 1], t - idx as f64)
        }
    }
}

/// Seeded random source shared by a sketch run.
pub struct Random {
    seed: u64,
    rng: ChaCha20Rng,
    noise_seed: i32,
}

impl Random {
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let noise_seed = rng.random::<i32>();
        Self {
            seed,
            rng,
            noise_seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Independent source seeded from this one, for state a sketch keeps across frames.
    pub fn fork(&mut self) -> Random {
        Random::new(self.rng.random::<u64>())
    }

    /// [0, 1)
    pub fn value(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        lerp(min, max, self.value())
    }

    pub fn range_floor(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        self.rng.random_range(min..max)
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.value() < probability
    }

    pub fn boolean(&mut self) -> bool {
        self.chance(0.5)
    }

    pub fn sign(&mut self) -> f64 {
        if self.boolean() { 1. } else { -1. }
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Box-Muller
    pub fn gaussian(&mut self, mean: f64, std: f64) -> f64 {
        let u1 = 1. - self.value();
        let u2 = self.value();
        let z = (-2. * u1.ln()).sqrt() * (2. * PI * u2).cos();
        mean + z * std
    }

    pub fn on_circle(&mut self, radius: f64) -> DVec2 {
        DVec2::from_angle(self.range(0., 2. * PI)) * radius
    }

    pub fn inside_circle(&mut self, radius: f64) -> DVec2 {
        self.on_circle(radius) * self.value().sqrt()
    }

    pub fn point_in_rect(&mut self, min: DVec2, max: DVec2) -> DVec2 {
        DVec2::new(self.range(min.x, max.x), self.range(min.y, max.y))
    }

    /// Index drawn proportionally to `weights`. `None` if no weight is positive.
    pub fn weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().filter(|w| **w > 0.).sum();
        if total <= 0. {
            return None;
        }

        let mut target = self.value() * total;
        for (idx, w) in weights.iter().enumerate() {
            if *w <= 0. {
                continue;
            }
            if target < *w {
                return Some(idx);
            }
            target -= *w;
        }
        weights.iter().rposition(|w| *w > 0.)
    }

    /// Perlin noise in [-amp, amp]
    pub fn noise2d(&self, x: f64, y: f64, frequency: f64, amplitude: f64) -> f64 {
        let p = [(x * frequency) as f32, (y * frequency) as f32];
        Perlin.add_seed(self.noise_seed).sample2(p) as f64 * amplitude
    }

    pub fn noise3d(&self, x: f64, y: f64, z: f64, frequency: f64, amplitude: f64) -> f64 {
        let p = [
            (x * frequency) as f32,
            (y * frequency) as f32,
            (z * frequency) as f32,
        ];
        Perlin.add_seed(self.noise_seed).sample3(p) as f64 * amplitude
    }

    pub fn noise_loop(&self, r: f64, zoom: f64, scale: f64) -> NoiseLoop {
        NoiseLoop::new(DVec2::ZERO, r, zoom, scale, self.noise_seed)
    }
}

/// Samples noise along a circle so that t in [0, 1] loops without a seam.
#[derive(Clone, Copy, Debug)]
pub struct NoiseLoop {
    center: DVec2,
    r: f64,
    zoom: f64,
    scale: f64,
    seed: i32,
}

impl NoiseLoop {
    pub fn new(center: DVec2, r: f64, zoom: f64, scale: f64, seed: i32) -> Self {
        Self {
            center,
            r,
            zoom,
            scale,
            seed,
        }
    }

    /// t: [0, 1], z offsets independent loops
    pub fn at(&self, t: f64, z: f64) -> f64 {
        let angle = 2. * PI * t;
        let p = self.center + DVec2::from_angle(angle) * self.r;
        let p = p.extend(z) * self.zoom;

        let val = Perlin.add_seed(self.seed).sample3(p.as_vec3().to_array());
        val as f64 * self.scale
    }
}
