use std::f64::consts::TAU;

use glam::DVec2;

use crate::{
    Color, Result,
    clrs::Palette,
    geometry::regular_polygon,
    grid::{Cell, Grid},
    math::{Random, lerp},
    sketch::{Props, Settings, Sketch},
};

#[derive(Clone, Debug)]
pub struct Params {
    pub count: usize,
    /// fraction of the shortest side
    pub margin: f64,
    pub frequency: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub line_width: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            count: 14,
            margin: 0.1,
            frequency: 1.8,
            min_scale: 0.2,
            max_scale: 0.95,
            line_width: 2.,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Tile {
    pub sides: usize,
    pub color: Color,
    /// whole turns per loop
    pub turns: f64,
    pub filled: bool,
}

/// Pose of one tile at a playhead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: DVec2,
    pub rotation: f64,
    pub radius: f64,
}

pub struct Tiles {
    params: Params,
    random: Random,
    palette: Palette,
    tiles: Vec<Tile>,
}

impl Tiles {
    pub fn new(params: Params, palette: Palette, random: &mut Random) -> Self {
        let tiles = (0..params.count * params.count)
            .map(|_| Tile {
                sides: random.range_floor(3, 7) as usize,
                color: palette.pick(random),
                turns: random.range_floor(0, 2) as f64 * random.sign(),
                filled: random.chance(0.6),
            })
            .collect();
        Self {
            params,
            random: random.fork(),
            palette,
            tiles,
        }
    }

    fn grid(&self, size: DVec2) -> Grid {
        Grid::square(self.params.count, size.min_element() * self.params.margin, size)
    }

    pub fn pose(&self, cell: &Cell, tile: &Tile, playhead: f64) -> Pose {
        let n = self.random.noise2d(cell.uv.x, cell.uv.y, self.params.frequency, 1.);
        // noise sets the phase, the playhead walks a full period
        let wave = (TAU * (playhead + n)).sin() * 0.5 + 0.5;
        let radius = lerp(self.params.min_scale, self.params.max_scale, wave)
            * cell.size.min_element()
            / 2.;
        Pose {
            position: cell.position,
            rotation: n * TAU + TAU * tile.turns * playhead,
            radius,
        }
    }
}

impl Sketch for Tiles {
    fn render(&mut self, props: &mut Props) {
        let size = DVec2::new(props.width, props.height);
        let grid = self.grid(size);
        let line_width = self.params.line_width * size.min_element() / 1080.;

        let ctx = &mut *props.context;
        ctx.clear(self.palette.background());
        ctx.set_line_width(line_width.max(0.75));

        for (cell, tile) in grid.cells().zip(&self.tiles) {
            let pose = self.pose(&cell, tile, props.playhead);
            // built at the origin, placed with the context transform
            let shape = regular_polygon(DVec2::ZERO, pose.radius, tile.sides, 0.);

            ctx.save();
            ctx.translate(pose.position);
            ctx.rotate(pose.rotation);
            if tile.filled {
                ctx.set_fill_style(tile.color);
                ctx.polygon(&shape);
            } else {
                ctx.set_stroke_style(tile.color);
                ctx.polyline(&shape, true);
            }
            ctx.restore();
        }
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
    let palette = Palette::random(random)?;
    Ok(Box::new(Tiles::new(Params::default(), palette, random)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketches::{is_flat, render_small};

    fn tiles() -> Tiles {
        let palette = Palette::new(vec![Color::ZERO, Color::ONE]).unwrap();
        Tiles::new(Params::default(), palette, &mut Random::new(6))
    }

    #[test]
    fn one_tile_per_cell() {
        let t = tiles();
        assert_eq!(t.tiles.len(), t.grid(DVec2::splat(500.)).len());
        assert!(t.tiles.iter().all(|tile| (3..7).contains(&tile.sides)));
    }

    #[test]
    fn poses_loop_and_fit_their_cell() {
        let t = tiles();
        let grid = t.grid(DVec2::splat(600.));
        for (cell, tile) in grid.cells().zip(&t.tiles) {
            let a = t.pose(&cell, tile, 0.);
            let b = t.pose(&cell, tile, 1.);
            assert!((a.radius - b.radius).abs() < 1e-9);
            let turn = (b.rotation - a.rotation) / TAU;
            assert!((turn - turn.round()).abs() < 1e-9);

            for playhead in [0.1, 0.5, 0.9] {
                let pose = t.pose(&cell, tile, playhead);
                assert!(pose.radius <= cell.size.min_element() / 2.);
                assert!(pose.radius > 0.);
            }
        }
    }

    #[test]
    fn renders_something() {
        assert!(!is_flat(&render_small("tiles", 5)));
    }
}
