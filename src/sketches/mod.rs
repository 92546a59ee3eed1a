use crate::{
    Result, SketchError,
    sketch::{SketchEntry, Settings},
};

pub mod attractor;
pub mod flocking;
pub mod flow_field;
pub mod growth;
pub mod isolines;
pub mod metaballs;
pub mod subdivision;
pub mod tiles;
pub mod voronoi;

pub const SKETCHES: &[SketchEntry] = &[
    SketchEntry {
        name: "attractor",
        description: "clifford attractor density, accumulated additively",
        settings: attractor::settings,
        factory: attractor::sketch,
    },
    SketchEntry {
        name: "flocking",
        description: "boids with separation, alignment and cohesion",
        settings: flocking::settings,
        factory: flocking::sketch,
    },
    SketchEntry {
        name: "flow_field",
        description: "walkers following a noise angle field",
        settings: flow_field::settings,
        factory: flow_field::sketch,
    },
    SketchEntry {
        name: "growth",
        description: "differential growth of a closed loop",
        settings: growth::settings,
        factory: growth::sketch,
    },
    SketchEntry {
        name: "isolines",
        description: "marching squares contours of looping noise",
        settings: isolines::settings,
        factory: isolines::sketch,
    },
    SketchEntry {
        name: "metaballs",
        description: "orbiting circles bridged by metaball curves",
        settings: metaballs::settings,
        factory: metaballs::sketch,
    },
    SketchEntry {
        name: "subdivision",
        description: "recursive rectangle subdivision",
        settings: subdivision::settings,
        factory: subdivision::sketch,
    },
    SketchEntry {
        name: "tiles",
        description: "grid of rotating polygons",
        settings: tiles::settings,
        factory: tiles::sketch,
    },
    SketchEntry {
        name: "voronoi",
        description: "drifting voronoi cells",
        settings: voronoi::settings,
        factory: voronoi::sketch,
    },
];

pub fn find(name: &str) -> Result<&'static SketchEntry> {
    SKETCHES
        .iter()
        .find(|entry| entry.name == name)
        .ok_or_else(|| SketchError::UnknownSketch(name.to_string()))
}

/// Default settings of every registered sketch, by name.
pub fn all_settings() -> Vec<(&'static str, Settings)> {
    SKETCHES
        .iter()
        .map(|entry| (entry.name, (entry.settings)()))
        .collect()
}

/// Renders `frame` of a registered sketch at 64x64 with a fixed seed.
#[cfg(test)]
pub(crate) fn render_small(name: &str, frame: u32) -> crate::img::RawImage {
    let entry = find(name).unwrap();
    let settings = Settings {
        dimensions: [64, 64],
        seed: Some(7),
        ..(entry.settings)()
    };
    let mut runner = crate::sketch::Runner::new(entry, settings, std::env::temp_dir()).unwrap();
    for f in 0..frame {
        runner.render_frame(f).unwrap();
    }
    runner.render_frame(frame).unwrap().clone()
}

#[cfg(test)]
pub(crate) fn is_flat(image: &crate::img::RawImage) -> bool {
    image.data.iter().all(|c| *c == image.data[0])
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    #[test]
    fn names_are_unique_and_findable() {
        assert!(SKETCHES.iter().map(|e| e.name).all_unique());
        for entry in SKETCHES {
            assert_eq!(find(entry.name).unwrap().name, entry.name);
        }
        assert!(matches!(find("nope"), Err(SketchError::UnknownSketch(_))));
    }

    #[test]
    fn default_settings_are_valid() {
        for (name, settings) in all_settings() {
            assert!(settings.validate().is_ok(), "{}", name);
        }
    }
}
