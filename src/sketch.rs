use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    Color, Result, SketchError,
    canvas::Canvas,
    img::{RawImage, ToneMappingMethod},
    math::Random,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// width, height in pixels
    pub dimensions: [u32; 2],
    pub animate: bool,
    /// seconds
    pub duration: Option<f64>,
    pub fps: f64,
    /// takes precedence over `duration`
    pub total_frames: Option<u32>,
    pub seed: Option<u64>,
    /// file prefix, defaults to the sketch name
    pub name: Option<String>,
    pub tone_mapping: ToneMappingMethod,
    pub background: Color,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dimensions: [1080, 1080],
            animate: false,
            duration: None,
            fps: 30.,
            total_frames: None,
            seed: None,
            name: None,
            tone_mapping: ToneMappingMethod::Clamp,
            background: Color::ZERO,
        }
    }
}

impl Settings {
    pub fn width(&self) -> u32 {
        self.dimensions[0]
    }

    pub fn height(&self) -> u32 {
        self.dimensions[1]
    }

    pub fn validate(&self) -> Result<()> {
        let [w, h] = self.dimensions;
        if w == 0 || h == 0 {
            return Err(SketchError::InvalidSettings(format!(
                "dimensions must be positive, got {}x{}",
                w, h
            )));
        }
        if !self.fps.is_finite() || self.fps <= 0. {
            return Err(SketchError::InvalidSettings(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        if let Some(duration) = self.duration {
            if !duration.is_finite() || duration <= 0. {
                return Err(SketchError::InvalidSettings(format!(
                    "duration must be positive, got {}",
                    duration
                )));
            }
        }
        if self.total_frames == Some(0) {
            return Err(SketchError::InvalidSettings(
                "total_frames must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn total_frames(&self) -> u32 {
        if !self.animate {
            return 1;
        }
        if let Some(frames) = self.total_frames {
            return frames.max(1);
        }
        match self.duration {
            Some(duration) => ((duration * self.fps).round() as u32).max(1),
            // one second
            None => (self.fps.round() as u32).max(1),
        }
    }

    /// (playhead, time, delta_time)
    pub fn frame_props(&self, frame: u32) -> (f64, f64, f64) {
        let total = self.total_frames() as f64;
        let playhead = frame as f64 / total;
        let time = frame as f64 / self.fps;
        let delta_time = if frame == 0 { 0. } else { 1. / self.fps };
        (playhead, time, delta_time)
    }
}

/// What a sketch sees on every frame.
pub struct Props<'a> {
    pub context: &'a mut Canvas,
    pub width: f64,
    pub height: f64,
    /// [0, 1), loops
    pub playhead: f64,
    pub time: f64,
    pub delta_time: f64,
    pub frame: u32,
    pub total_frames: u32,
}

pub trait Sketch {
    /// Called once, before the first frame.
    fn begin(&mut self, _props: &mut Props) {}

    fn render(&mut self, props: &mut Props);
}

pub type SketchFactory = fn(&Settings, &mut Random) -> Result<Box<dyn Sketch>>;

#[derive(Clone, Copy)]
pub struct SketchEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub settings: fn() -> Settings,
    pub factory: SketchFactory,
}

fn build_props<'a>(settings: &Settings, canvas: &'a mut Canvas, frame: u32) -> Props<'a> {
    let (playhead, time, delta_time) = settings.frame_props(frame);
    Props {
        context: canvas,
        width: settings.width() as f64,
        height: settings.height() as f64,
        playhead,
        time,
        delta_time,
        frame,
        total_frames: settings.total_frames(),
    }
}

pub struct Runner {
    name: String,
    settings: Settings,
    output: PathBuf,
    canvas: Canvas,
    sketch: Box<dyn Sketch>,
    seed: u64,
    begun: bool,
}

impl Runner {
    pub fn new<P: AsRef<Path>>(entry: &SketchEntry, settings: Settings, output: P) -> Result<Self> {
        settings.validate()?;

        let seed = match settings.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                log::info!("{}: no seed given, using {}", entry.name, seed);
                seed
            }
        };
        let mut random = Random::new(seed);

        let canvas = Canvas::new(settings.width(), settings.height());
        let sketch = (entry.factory)(&settings, &mut random)?;
        let name = settings.name.clone().unwrap_or_else(|| entry.name.to_string());

        Ok(Self {
            name,
            settings,
            output: output.as_ref().to_path_buf(),
            canvas,
            sketch,
            seed,
            begun: false,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn frame_path(&self, frame: u32) -> PathBuf {
        self.output
            .join(&self.name)
            .join(format!("{}_{:04}.png", self.name, frame))
    }

    /// Renders `frame` in memory, running `begin` first if needed.
    /// Frames past the last one are rejected, so the playhead stays below 1.
    pub fn render_frame(&mut self, frame: u32) -> Result<&RawImage> {
        let total_frames = self.settings.total_frames();
        if frame >= total_frames {
            return Err(SketchError::InvalidSettings(format!(
                "frame {} out of range, {} has {} frame(s)",
                frame, self.name, total_frames
            )));
        }

        if !self.begun {
            let mut props = build_props(&self.settings, &mut self.canvas, 0);
            self.sketch.begin(&mut props);
            self.begun = true;
        }

        self.canvas.reset();
        self.canvas.clear(self.settings.background);

        let mut props = build_props(&self.settings, &mut self.canvas, frame);
        self.sketch.render(&mut props);

        Ok(self.canvas.image())
    }

    /// Renders every frame in order and writes them as png.
    pub fn run(&mut self) -> Result<Vec<PathBuf>> {
        let total_frames = self.settings.total_frames();
        let dir = self.output.join(&self.name);
        std::fs::create_dir_all(&dir)?;

        log::info!(
            "rendering {} ({}x{}, {} frames, seed {})",
            self.name,
            self.settings.width(),
            self.settings.height(),
            total_frames,
            self.seed
        );

        let total_chrono = std::time::Instant::now();
        let mut paths = Vec::with_capacity(total_frames as usize);
        for frame in 0..total_frames {
            let chrono = std::time::Instant::now();
            let tone_mapping = self.settings.tone_mapping;
            let path = self.frame_path(frame);

            self.render_frame(frame)?.save(&path, &tone_mapping)?;

            log::debug!(
                "frame {}/{}: {:?} -> {}",
                frame + 1,
                total_frames,
                chrono.elapsed(),
                path.display()
            );
            paths.push(path);
        }
        log::info!("total render time: {:?}", total_chrono.elapsed());

        Ok(paths)
    }
}
