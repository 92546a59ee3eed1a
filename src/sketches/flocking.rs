use glam::DVec2;

use crate::{
    Color, Result,
    clrs::{Palette, hex_to_color},
    geometry::regular_polygon,
    math::{Random, wrap},
    sketch::{Props, Settings, Sketch},
};

#[derive(Clone, Debug)]
pub struct Params {
    pub count: usize,
    /// neighbours further than this are ignored
    pub perception: f64,
    pub separation_distance: f64,
    pub max_speed: f64,
    pub max_force: f64,
    pub separation: f64,
    pub alignment: f64,
    pub cohesion: f64,
    /// triangle length, in pixels
    pub size: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            count: 180,
            perception: 50.,
            separation_distance: 24.,
            max_speed: 4.,
            max_force: 0.1,
            separation: 1.5,
            alignment: 1.,
            cohesion: 1.,
            size: 10.,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boid {
    pub position: DVec2,
    pub velocity: DVec2,
    pub color: Color,
}

pub struct Flock {
    params: Params,
    pub boids: Vec<Boid>,
    size: DVec2,
    palette: Palette,
}

impl Flock {
    pub fn new(params: Params, size: DVec2, palette: Palette, random: &mut Random) -> Self {
        let boids = (0..params.count)
            .map(|_| {
                let speed = random.range(0.5, 1.) * params.max_speed;
                Boid {
                    position: random.point_in_rect(DVec2::ZERO, size),
                    velocity: random.on_circle(speed),
                    color: palette.pick(random),
                }
            })
            .collect();

        Self {
            params,
            boids,
            size,
            palette,
        }
    }

    fn steer(&self, desired: DVec2, velocity: DVec2) -> DVec2 {
        let desired = desired.normalize_or_zero() * self.params.max_speed;
        (desired - velocity).clamp_length_max(self.params.max_force)
    }

    /// Shortest offset from `to` to `from` on the wrapping canvas.
    fn offset(&self, from: DVec2, to: DVec2) -> DVec2 {
        let d = from - to;
        let half = self.size / 2.;
        DVec2::new(wrap(d.x, -half.x, half.x), wrap(d.y, -half.y, half.y))
    }

    fn acceleration(&self, idx: usize) -> DVec2 {
        let boid = &self.boids[idx];
        let mut separation = DVec2::ZERO;
        let mut heading = DVec2::ZERO;
        let mut center = DVec2::ZERO;
        let mut neighbours = 0;

        for (other_idx, other) in self.boids.iter().enumerate() {
            if other_idx == idx {
                continue;
            }
            let away = self.offset(boid.position, other.position);
            let d = away.length();
            if d > self.params.perception {
                continue;
            }

            if d < self.params.separation_distance && d > 0. {
                // closer boids push harder
                separation += away / (d * d);
            }
            heading += other.velocity;
            // neighbour as seen across the edge
            center += boid.position - away;
            neighbours += 1;
        }

        if neighbours == 0 {
            return DVec2::ZERO;
        }

        let mut acc = DVec2::ZERO;
        if separation != DVec2::ZERO {
            acc += self.steer(separation, boid.velocity) * self.params.separation;
        }
        acc += self.steer(heading, boid.velocity) * self.params.alignment;
        let to_center = center / neighbours as f64 - boid.position;
        acc += self.steer(to_center, boid.velocity) * self.params.cohesion;
        acc
    }

    /// One simulation step, `dt` in frames.
    pub fn update(&mut self, dt: f64) {
        let accelerations: Vec<DVec2> = (0..self.boids.len()).map(|i| self.acceleration(i)).collect();

        let max_speed = self.params.max_speed;
        let size = self.size;
        for (boid, acc) in self.boids.iter_mut().zip(accelerations) {
            boid.velocity = (boid.velocity + acc * dt).clamp_length_max(max_speed);
            let p = boid.position + boid.velocity * dt;
            boid.position = DVec2::new(wrap(p.x, 0., size.x), wrap(p.y, 0., size.y));
        }
    }

    fn draw(&self, props: &mut Props) {
        let ctx = &mut *props.context;
        let triangle = regular_polygon(DVec2::ZERO, self.params.size / 2., 3, 0.);
        for boid in &self.boids {
            ctx.save();
            ctx.translate(boid.position);
            ctx.rotate(boid.velocity.to_angle());
            // stretch the nose along the heading
            ctx.scale(DVec2::new(1.4, 0.7));
            ctx.set_fill_style(boid.color);
            ctx.polygon(&triangle);
            ctx.restore();
        }
    }
}

impl Sketch for Flock {
    fn render(&mut self, props: &mut Props) {
        props.context.clear(self.palette.background());
        if props.frame > 0 {
            // velocities are tuned for 30 fps
            self.update(props.delta_time * 30.);
        }
        self.draw(props);
    }
}

pub fn settings() -> Settings {
    Settings {
        dimensions: [1080, 1080],
        animate: true,
        duration: Some(12.),
        fps: 30.,
        ..Settings::default()
    }
}

pub fn sketch(settings: &Settings, random: &mut Random) -> Result<Box<dyn Sketch>> {
    let mut colors = vec![hex_to_color("#0b0d17")?];
    colors.extend(Palette::hsl_ramp(random.range(0., 360.) as f32, 80., 4, 0.7, 0.6)?.colors());
    let palette = Palette::new(colors)?;
    let size = DVec2::new(settings.width() as f64, settings.height() as f64);
    let scale = size.min_element() / 1080.;
    let params = Params {
        perception: 50. * scale,
        separation_distance: 24. * scale,
        max_speed: 4. * scale,
        max_force: 0.1 * scale,
        size: (10. * scale).max(2.),
        ..Params::default()
    };
    Ok(Box::new(Flock::new(params, size, palette, random)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketches::{is_flat, render_small};

    fn flock(params: Params, boids: Vec<Boid>) -> Flock {
        let palette = Palette::new(vec![Color::ZERO, Color::ONE]).unwrap();
        let mut random = Random::new(0);
        let params = Params { count: 0, ..params };
        let mut flock = Flock::new(params, DVec2::splat(200.), palette, &mut random);
        flock.boids = boids;
        flock
    }

    fn boid(x: f64, y: f64, vx: f64, vy: f64) -> Boid {
        Boid {
            position: DVec2::new(x, y),
            velocity: DVec2::new(vx, vy),
            color: Color::ONE,
        }
    }

    #[test]
    fn close_boids_separate() {
        let params = Params {
            alignment: 0.,
            cohesion: 0.,
            ..Params::default()
        };
        let mut flock = flock(params, vec![boid(100., 100., 0., 0.), boid(105., 100., 0., 0.)]);
        let before = flock.boids[0].position.distance(flock.boids[1].position);
        for _ in 0..10 {
            flock.update(1.);
        }
        let after = flock.boids[0].position.distance(flock.boids[1].position);
        assert!(after > before);
    }

    #[test]
    fn headings_align() {
        let params = Params {
            separation: 0.,
            cohesion: 0.,
            ..Params::default()
        };
        let mut flock = flock(params, vec![boid(100., 100., 2., 0.), boid(130., 100., 0., 2.)]);
        let angle = |f: &Flock| f.boids[0].velocity.angle_to(f.boids[1].velocity).abs();
        let before = angle(&flock);
        for _ in 0..20 {
            flock.update(1.);
        }
        assert!(angle(&flock) < before);
    }

    #[test]
    fn neighbours_are_found_across_the_edges() {
        let params = Params {
            alignment: 0.,
            cohesion: 0.,
            ..Params::default()
        };
        let f = flock(params, vec![boid(5., 100., 0., 0.), boid(195., 100., 0., 0.)]);
        // 10 px apart through the left edge
        assert!(f.acceleration(0).x > 0.);
        assert!(f.acceleration(1).x < 0.);

        let params = Params {
            separation: 0.,
            alignment: 0.,
            ..Params::default()
        };
        let f = flock(params, vec![boid(100., 196., 0., 0.), boid(100., 30., 0., 0.)]);
        assert!(f.acceleration(0).y > 0.);
        assert!(f.acceleration(1).y < 0.);

        let f = flock(Params::default(), vec![boid(100., 100., 0., 0.), boid(100., 190., 0., 0.)]);
        assert_eq!(f.offset(DVec2::new(195., 0.), DVec2::new(5., 0.)), DVec2::new(-10., 0.));
        assert_eq!(f.acceleration(0), DVec2::ZERO);
    }

    #[test]
    fn speed_is_limited_and_positions_wrap() {
        let mut random = Random::new(4);
        let palette = Palette::new(vec![Color::ZERO, Color::ONE]).unwrap();
        let mut flock = Flock::new(Params::default(), DVec2::splat(300.), palette, &mut random);
        for _ in 0..50 {
            flock.update(1.);
        }
        for boid in &flock.boids {
            assert!(boid.velocity.length() <= Params::default().max_speed + 1e-9);
            assert!((0. ..300.).contains(&boid.position.x));
            assert!((0. ..300.).contains(&boid.position.y));
        }
    }

    #[test]
    fn renders_something() {
        let image = render_small("flocking", 3);
        assert!(!is_flat(&image));
    }
}
