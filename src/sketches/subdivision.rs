use glam::DVec2;

use crate::{
    Color, Result,
    clrs::Palette,
    math::Random,
    quadtree::Aabb,
    sketch::{Props, Settings, Sketch},
};

#[derive(Clone, Debug)]
pub struct Params {
    pub min_depth: usize,
    pub max_depth: usize,
    pub split_chance: f64,
    /// chance of a four way split instead of a cut across the longest side
    pub quad_chance: f64,
    /// no cell gets smaller than this, in pixels at 1080
    pub min_size: f64,
    pub gap: f64,
    pub margin: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            min_depth: 2,
            max_depth: 8,
            split_chance: 0.7,
            quad_chance: 0.25,
            min_size: 24.,
            gap: 6.,
            margin: 60.,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub aabb: Aabb,
    pub depth: usize,
    pub color: Color,
}

/// Recursively cuts `aabb`; leaves land in `cells`.
pub fn subdivide(
    aabb: Aabb,
    depth: usize,
    params: &Params,
    min_size: f64,
    palette: &Palette,
    random: &mut Random,
    cells: &mut Vec<Cell>,
) {
    let size = aabb.size();
    let can_split = depth < params.max_depth && size.max_element() >= 2. * min_size;
    let wants_split = depth < params.min_depth || random.chance(params.split_chance);

    if can_split && wants_split {
        if random.chance(params.quad_chance) && size.min_element() >= 2. * min_size {
            for child in aabb.split() {
                subdivide(child, depth + 1, params, min_size, palette, random, cells);
            }
            return;
        }

        let longest = size.max_element();
        // keep both halves above the minimum
        let lo = (min_size / longest).max(0.25);
        let ratio = if lo >= 0.5 { 0.5 } else { random.range(lo, 1. - lo) };
        for child in aabb.split_longest(ratio) {
            subdivide(child, depth + 1, params, min_size, palette, random, cells);
        }
        return;
    }

    cells.push(Cell {
        aabb,
        depth,
        color: palette.pick(random),
    });
}

pub struct Subdivision {
    params: Params,
    palette: Palette,
    random: Random,
}

impl Subdivision {
    pub fn new(params: Params, palette: Palette, random: &mut Random) -> Self {
        Self {
            params,
            palette,
            random: random.fork(),
        }
    }

    pub fn cells(&mut self, size: DVec2) -> Vec<Cell> {
        let scale = size.min_element() / 1080.;
        let margin = self.params.margin * scale;
        let root = Aabb::from_min_max(DVec2::splat(margin), size - DVec2::splat(margin));

        let mut cells = Vec::new();
        subdivide(
            root,
            0,
            &self.params,
            (self.params.min_size * scale).max(1.),
            &self.palette,
            &mut self.random,
            &mut cells,
        );
        cells
    }
}

impl Sketch for Subdivision {
    fn render(&mut self, props: &mut Props) {
        let size = DVec2::new(props.width, props.height);
        let cells = self.cells(size);
        log::debug!(
            "subdivision: {} cells, deepest {}",
            cells.len(),
            cells.iter().map(|c| c.depth).max().unwrap_or(0)
        );

        let gap = self.params.gap * size.min_element() / 1080.;
        let ctx = &mut *props.context;
        ctx.clear(self.palette.background());
        for cell in &cells {
            let min = cell.aabb.min() + DVec2::splat(gap / 2.);
            let inner = (cell.aabb.size() - DVec2::splat(gap)).max(DVec2::ZERO);
            ctx.set_fill_style(cell.color);
            ctx.fill_rect(min, inner);
        }
    }
}

pub fn settings() -> Settings {
    Settings {
        dimensions: [1080, 1080],
        ..Settings::default()
    }
}

pub fn sketch(_settings: &Settings, random: &mut Random) -> Result<Box<dyn Sketch>> {
    let palette = Palette::from_hex(&[
        "#fdfcf7", "#1d1d1b", "#d7263d", "#f46036", "#2e294e", "#1b998b", "#c5d86d",
    ])?;
    Ok(Box::new(Subdivision::new(Params::default(), palette, random)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketches::{is_flat, render_small};

    fn subdivision(seed: u64) -> Subdivision {
        let palette = Palette::from_hex(&["#ffffff", "#000000", "#ff0000"]).unwrap();
        Subdivision::new(Params::default(), palette, &mut Random::new(seed))
    }

    #[test]
    fn cells_tile_the_root() {
        for seed in 0..5 {
            let size = DVec2::splat(1080.);
            let cells = subdivision(seed).cells(size);
            let root = Aabb::from_min_max(DVec2::splat(60.), DVec2::splat(1020.));

            let area: f64 = cells.iter().map(|c| c.aabb.size().x * c.aabb.size().y).sum();
            assert!((area - 960. * 960.).abs() < 1e-3);
            for cell in &cells {
                assert!(cell.aabb.min().cmpge(root.min() - 1e-6).all());
                assert!(cell.aabb.max().cmple(root.max() + 1e-6).all());
            }
        }
    }

    #[test]
    fn depth_and_size_limits() {
        let params = Params::default();
        let cells = subdivision(3).cells(DVec2::splat(1080.));
        assert!(cells.len() >= 4);
        for cell in &cells {
            assert!(cell.depth >= params.min_depth);
            assert!(cell.depth <= params.max_depth);
            assert!(cell.aabb.size().min_element() >= params.min_size - 1e-9);
        }
    }

    #[test]
    fn cells_never_use_the_background() {
        let cells = subdivision(1).cells(DVec2::splat(500.));
        assert!(cells.iter().all(|c| c.color != Color::ONE));
    }

    #[test]
    fn renders_something() {
        assert!(!is_flat(&render_small("subdivision", 0)));
    }
}
