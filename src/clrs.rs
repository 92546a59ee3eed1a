use colorgrad::{Gradient, GradientBuilder, LinearGradient};
use palette::{Hsl, IntoColor, Srgb};

use crate::{Color, Result, SketchError, math::Random};

pub fn hex_to_color(hex: &str) -> Result<Color> {
    let rgb: Srgb<u8> = hex
        .trim()
        .parse()
        .map_err(|e| SketchError::Palette(format!("{}: {}", hex, e)))?;
    let rgb: Srgb<f32> = rgb.into_format();
    Ok(Color::new(rgb.red, rgb.green, rgb.blue))
}

pub fn color_to_hex(color: Color) -> String {
    let rgb: Srgb<u8> = Srgb::new(
        color.x.clamp(0., 1.),
        color.y.clamp(0., 1.),
        color.z.clamp(0., 1.),
    )
    .into_format();
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}

/// hue in degrees, saturation and lightness in [0, 1]
pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> Color {
    let hsl: Hsl = Hsl::new(hue, saturation, lightness);
    let rgb: Srgb = hsl.into_color();
    Color::new(rgb.red, rgb.green, rgb.blue)
}

pub struct Palette {
    colors: Vec<Color>,
    gradient: LinearGradient,
}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Result<Self> {
        if colors.is_empty() {
            return Err(SketchError::Palette("empty palette".to_string()));
        }

        let mut stops: Vec<colorgrad::Color> = colors
            .iter()
            .map(|c| colorgrad::Color::new(c.x, c.y, c.z, 1.))
            .collect();
        if stops.len() == 1 {
            stops.push(stops[0].clone());
        }

        let gradient = GradientBuilder::new()
            .colors(&stops)
            .build::<LinearGradient>()
            .map_err(|e| SketchError::Palette(e.to_string()))?;

        Ok(Self { colors, gradient })
    }

    pub fn from_hex(hex: &[&str]) -> Result<Self> {
        let colors = hex.iter().map(|h| hex_to_color(h)).collect::<Result<Vec<_>>>()?;
        Palette::new(colors)
    }

    /// `count` colors walking `hue_spread` degrees from `hue`, dark to light.
    pub fn hsl_ramp(
        hue: f32,
        hue_spread: f32,
        count: usize,
        saturation: f32,
        lightness: f32,
    ) -> Result<Self> {
        let count = count.max(1);
        let colors = (0..count)
            .map(|i| {
                let t = if count == 1 {
                    0.5
                } else {
                    i as f32 / (count - 1) as f32
                };
                let l = (lightness * (0.5 + t)).clamp(0.05, 0.95);
                hsl(hue + hue_spread * t, saturation, l)
            })
            .collect();
        Palette::new(colors)
    }

    pub fn random(random: &mut Random) -> Result<Self> {
        let hue = random.range(0., 360.) as f32;
        let spread = random.range(30., 150.) as f32 * random.sign() as f32;
        let count = random.range_floor(4, 7) as usize;
        let saturation = random.range(0.45, 0.9) as f32;
        let lightness = random.range(0.4, 0.6) as f32;
        Palette::hsl_ramp(hue, spread, count, saturation, lightness)
    }

    /// 8 stops sampled from the inferno colormap
    pub fn inferno() -> Result<Self> {
        let colors = colorgrad::preset::inferno()
            .colors(8)
            .iter()
            .map(|c| Color::new(c.r, c.g, c.b))
            .collect();
        Palette::new(colors)
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// first color of the ramp
    pub fn background(&self) -> Color {
        self.colors[0]
    }

    /// Any color but the background, unless it is the only one.
    pub fn pick(&self, random: &mut Random) -> Color {
        let foreground = if self.colors.len() > 1 {
            &self.colors[1..]
        } else {
            &self.colors[..]
        };
        random.pick(foreground).copied().unwrap_or(self.colors[0])
    }

    /// t in [0, 1] across the gradient
    pub fn at(&self, t: f64) -> Color {
        let c = self.gradient.at(t.clamp(0., 1.) as f32);
        Color::new(c.r, c.g, c.b)
    }
}
