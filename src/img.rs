use std::path::Path;

use glam::{IVec2, Vec3};
use image::{ImageBuffer, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::{Color, Result};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ToneMappingMethod {
    /// plain [0, 1] clamp, what a 2d canvas does
    Clamp,
    Reinhard,
    Gamma { gamma: f32 },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Blending {
    Add,
    Replace,
    /// source-over with the given alpha
    Over(f32),
}

#[derive(Clone, Debug)]
pub struct RawImage {
    pub width: i32,
    pub height: i32,
    pub data: Vec<Color>,
}

impl RawImage {
    pub fn new(width: i32, height: i32) -> Self {
        let data = vec![Color::ZERO; width.max(0) as usize * height.max(0) as usize];
        Self {
            width,
            height,
            data,
        }
    }

    pub fn pixel_to_idx(&self, pixel: IVec2) -> Option<usize> {
        if pixel.x < 0 || pixel.x >= self.width || pixel.y < 0 || pixel.y >= self.height {
            return None;
        }

        Some((self.width * pixel.y + pixel.x) as usize)
    }

    pub fn idx_to_pixel(&self, idx: usize) -> Option<IVec2> {
        if idx >= self.data.len() {
            return None;
        }

        let y = idx as i32 / self.width;
        let x = idx as i32 % self.width;
        Some(IVec2::new(x, y))
    }

    pub fn get(&self, pixel: IVec2) -> Option<Color> {
        let idx = self.pixel_to_idx(pixel)?;
        Some(self.data[idx])
    }

    pub fn fill(&mut self, color: Color) {
        self.data.iter_mut().for_each(|px| *px = color);
    }

    pub fn draw_pixel(&mut self, pixel: IVec2, color: Color, blending: Blending) -> Option<()> {
        let idx = self.pixel_to_idx(pixel)?;
        self.blend_idx(idx, color, blending);
        Some(())
    }

    pub(crate) fn blend_idx(&mut self, idx: usize, color: Color, blending: Blending) {
        let dst = &mut self.data[idx];
        match blending {
            Blending::Add => *dst += color,
            Blending::Replace => *dst = color,
            Blending::Over(alpha) => {
                let alpha = alpha.clamp(0., 1.);
                *dst = dst.lerp(color, alpha);
            }
        }
    }

    pub fn max_value(&self) -> f32 {
        self.data
            .iter()
            .map(|c| c.max_element())
            .fold(0., f32::max)
    }

    pub fn convert_to_image(&self, tone_mapping_method: &ToneMappingMethod) -> RgbaImage {
        let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::new(self.width.max(0) as u32, self.height.max(0) as u32);

        fn tone_mapping_reinhard(v: f32) -> f32 {
            let v = v.max(0.);
            v / (1. + v)
        }

        fn to_u8(v: f32) -> u8 {
            (v.clamp(0., 1.) * 255.).round() as u8
        }

        let max = self.max_value();

        for (dst, src) in img.pixels_mut().zip(self.data.iter()) {
            let mapped = match *tone_mapping_method {
                ToneMappingMethod::Clamp => *src,
                ToneMappingMethod::Gamma { gamma } => {
                    if max > 0. {
                        (*src / max).max(Vec3::ZERO).powf(1. / gamma)
                    } else {
                        Vec3::ZERO
                    }
                }
                ToneMappingMethod::Reinhard => Vec3::new(
                    tone_mapping_reinhard(src.x),
                    tone_mapping_reinhard(src.y),
                    tone_mapping_reinhard(src.z),
                ),
            };

            dst[0] = to_u8(mapped.x);
            dst[1] = to_u8(mapped.y);
            dst[2] = to_u8(mapped.z);
            dst[3] = 255;
        }

        img
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, tone_mapping: &ToneMappingMethod) -> Result<()> {
        let image = self.convert_to_image(tone_mapping);
        image.save(path)?;
        Ok(())
    }
}
