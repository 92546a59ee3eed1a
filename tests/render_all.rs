use std::path::PathBuf;

use sketchbook::{
    config::AppConfig,
    sketch::{Runner, Settings},
    sketches::{SKETCHES, find},
};

fn out_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("sketchbook-it-{}-{}", name, std::process::id()))
}

fn tiny(settings: &Settings) -> Settings {
    let mut config = AppConfig::default();
    config.render.scale = 48. / settings.dimensions[0] as f64;
    config.render.seed = Some(1234);
    config.render.frames = Some(2);
    config.apply(settings)
}

#[test]
fn every_sketch_writes_non_blank_frames() {
    for entry in SKETCHES {
        let settings = tiny(&(entry.settings)());
        let expected = settings.total_frames() as usize;
        let dir = out_dir(entry.name);

        let mut runner = Runner::new(entry, settings, &dir).unwrap();
        let paths = runner.run().unwrap();
        assert_eq!(paths.len(), expected, "{}", entry.name);

        for (frame, path) in paths.iter().enumerate() {
            assert!(
                path.ends_with(format!("{0}/{0}_{1:04}.png", entry.name, frame)),
                "{}",
                path.display()
            );
            let image = image::open(path).unwrap().to_rgba8();
            assert_eq!(image.width(), 48, "{}", entry.name);
            let first = *image.get_pixel(0, 0);
            assert!(
                image.pixels().any(|p| *p != first),
                "{} frame {} is blank",
                entry.name,
                frame
            );
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}

#[test]
fn same_seed_same_frames() {
    for name in ["subdivision", "flow_field", "voronoi"] {
        let entry = find(name).unwrap();
        let settings = tiny(&(entry.settings)());

        let mut a = Runner::new(entry, settings.clone(), out_dir(name)).unwrap();
        let mut b = Runner::new(entry, settings, out_dir(name)).unwrap();
        assert_eq!(a.render_frame(0).unwrap().data, b.render_frame(0).unwrap().data, "{}", name);
    }
}

#[test]
fn unknown_sketch_is_an_error() {
    assert!(find("does-not-exist").is_err());
}
