//! Color sources for materials.
//!
//! A texture maps surface (u, v) coordinates to a color. Shapes
//! guarantee `uv` in [0, 1) through their parametrization, so no
//! wrapping happens here.

use std::path::Path;

use lumina_math::{Color, Vec2};

use crate::hdr_image::HdrImage;
use crate::pfm::PfmError;

/// A color field over the unit UV square.
pub trait Texture: Send + Sync {
    fn color(&self, uv: Vec2) -> Color;
}

/// A constant color.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformTexture {
    color: Color,
}

impl UniformTexture {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Texture for UniformTexture {
    fn color(&self, _uv: Vec2) -> Color {
        self.color
    }
}

/// A steps x steps checkerboard of two colors.
#[derive(Debug, Clone, Copy)]
pub struct CheckeredTexture {
    color1: Color,
    color2: Color,
    steps: u32,
}

impl CheckeredTexture {
    pub fn new(color1: Color, color2: Color, steps: u32) -> Self {
        Self {
            color1,
            color2,
            steps,
        }
    }
}

impl Default for CheckeredTexture {
    fn default() -> Self {
        Self::new(Color::ZERO, Color::ONE, 8)
    }
}

impl Texture for CheckeredTexture {
    fn color(&self, uv: Vec2) -> Color {
        let u = (uv.x * self.steps as f32).floor() as i32;
        let v = (uv.y * self.steps as f32).floor() as i32;
        if (u + v) % 2 == 0 {
            self.color1
        } else {
            self.color2
        }
    }
}

/// A texture backed by an HDR image, sampled nearest-neighbour.
#[derive(Debug, Clone)]
pub struct ImageTexture {
    image: HdrImage,
}

impl ImageTexture {
    pub fn new(image: HdrImage) -> Self {
        Self { image }
    }

    /// Load a PFM file, normalized to average luminance 1 and clamped
    /// so sampled values stay in [0, 1).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PfmError> {
        let mut image = HdrImage::from_pfm_file(path)?;
        image.normalize(1.0, None);
        image.clamp();
        Ok(Self::new(image))
    }
}

impl Texture for ImageTexture {
    fn color(&self, uv: Vec2) -> Color {
        let i = ((uv.x * self.image.width() as f32) as u32).min(self.image.width() - 1);
        let j = ((uv.y * self.image.height() as f32) as u32).min(self.image.height() - 1);
        self.image.get_pixel(i, j)
    }
}
