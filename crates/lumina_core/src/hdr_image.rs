//! High dynamic range image buffer.
//!
//! Pixels are stored row-major with row 0 at the top of the image.
//! Radiance values are unbounded floats; before LDR export the image is
//! normalized against its average luminosity and clamped into [0, 1].

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use lumina_math::{Color, ColorExt};
use thiserror::Error;

use crate::pfm::{self, PfmError};

/// Errors from image loading and saving.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pfm(#[from] PfmError),

    #[error("image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("unsupported output extension \"{0}\", use .pfm, .png, .jpg or .jpeg")]
    UnsupportedExtension(String),
}

/// A width x height buffer of floating-point RGB radiance values.
#[derive(Debug, Clone, PartialEq)]
pub struct HdrImage {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl HdrImage {
    /// Create a black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; (width * height) as usize],
        }
    }

    /// Read a PFM image from a file.
    pub fn from_pfm_file<P: AsRef<Path>>(path: P) -> Result<Self, PfmError> {
        let mut file = std::io::BufReader::new(File::open(path)?);
        pfm::read_pfm(&mut file)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Offset of pixel (i, j) in the row-major buffer.
    pub fn pixel_index(&self, i: u32, j: u32) -> usize {
        (i + self.width * j) as usize
    }

    pub fn valid_coordinates(&self, i: u32, j: u32) -> bool {
        i < self.width && j < self.height
    }

    fn check_coordinates(&self, i: u32, j: u32) {
        if !self.valid_coordinates(i, j) {
            panic!(
                "invalid image coordinates ({}, {}), image size is {} x {}",
                i, j, self.width, self.height
            );
        }
    }

    /// Get the pixel at (i, j). Panics if the coordinates are out of
    /// range.
    pub fn get_pixel(&self, i: u32, j: u32) -> Color {
        self.check_coordinates(i, j);
        self.pixels[self.pixel_index(i, j)]
    }

    /// Set the pixel at (i, j). Panics if the coordinates are out of
    /// range.
    pub fn set_pixel(&mut self, i: u32, j: u32, color: Color) {
        self.check_coordinates(i, j);
        let index = self.pixel_index(i, j);
        self.pixels[index] = color;
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Average luminosity of the image with the default log floor.
    pub fn average_luminosity(&self) -> f32 {
        self.average_luminosity_with(1e-10)
    }

    /// Logarithmic average of the pixel luminosities.
    ///
    /// `delta` keeps the logarithm finite on pure black pixels.
    pub fn average_luminosity_with(&self, delta: f32) -> f32 {
        let sum: f32 = self
            .pixels
            .iter()
            .map(|pixel| (pixel.luminosity() + delta).log10())
            .sum();
        10.0_f32.powf(sum / self.pixels.len() as f32)
    }

    /// Scale every pixel by `factor / luminosity`.
    ///
    /// When `luminosity` is absent or zero it is computed from the
    /// image itself.
    pub fn normalize(&mut self, factor: f32, luminosity: Option<f32>) {
        let luminosity = match luminosity {
            Some(l) if l != 0.0 => l,
            _ => self.average_luminosity(),
        };

        let scale = factor / luminosity;
        for pixel in &mut self.pixels {
            *pixel *= scale;
        }
    }

    /// Compress every channel into [0, 1) with `x / (1 + x)`.
    pub fn clamp(&mut self) {
        for pixel in &mut self.pixels {
            *pixel = *pixel / (Color::ONE + *pixel);
        }
    }

    /// Convert to 8-bit RGB with gamma correction.
    ///
    /// Pixels must already be normalized and clamped into [0, 1].
    pub fn to_ldr(&self, gamma: f32) -> Vec<u8> {
        let inv_gamma = 1.0 / gamma;
        let mut data = Vec::with_capacity(self.pixels.len() * 3);
        for pixel in &self.pixels {
            data.push((255.0 * pixel.x.powf(inv_gamma)) as u8);
            data.push((255.0 * pixel.y.powf(inv_gamma)) as u8);
            data.push((255.0 * pixel.z.powf(inv_gamma)) as u8);
        }
        data
    }

    /// Save the image, choosing the format from the file extension
    /// (.pfm, .png, .jpg, .jpeg).
    ///
    /// Gamma applies to the LDR formats only; PFM output keeps the raw
    /// radiance values.
    pub fn save<P: AsRef<Path>>(&self, path: P, gamma: f32) -> Result<(), ImageError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match extension.as_str() {
            "pfm" => {
                let mut file = BufWriter::new(File::create(path)?);
                pfm::write_pfm(self, &mut file)?;
                Ok(())
            }
            "png" | "jpg" | "jpeg" => {
                image::save_buffer(
                    path,
                    &self.to_ldr(gamma),
                    self.width,
                    self.height,
                    image::ColorType::Rgb8,
                )?;
                Ok(())
            }
            other => Err(ImageError::UnsupportedExtension(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_creation() {
        let image = HdrImage::new(7, 4);
        assert_eq!(image.width(), 7);
        assert_eq!(image.height(), 4);
        assert_eq!(image.get_pixel(3, 2), Color::ZERO);
    }

    #[test]
    fn test_coordinates() {
        let image = HdrImage::new(400, 300);

        assert!(image.valid_coordinates(0, 299));
        assert!(image.valid_coordinates(399, 0));
        assert!(!image.valid_coordinates(400, 0));
        assert!(!image.valid_coordinates(0, 300));
        assert!(!image.valid_coordinates(1080, 720));
    }

    #[test]
    fn test_pixel_index() {
        let image = HdrImage::new(400, 300);
        assert_eq!(image.pixel_index(1, 2), 801);
        assert_eq!(image.pixel_index(11, 203), 11 + 203 * 400);
    }

    #[test]
    #[should_panic(expected = "invalid image coordinates")]
    fn test_out_of_range_access_panics() {
        let image = HdrImage::new(4, 4);
        image.get_pixel(4, 0);
    }

    #[test]
    fn test_get_set_pixel() {
        let mut image = HdrImage::new(3, 2);
        let color = Color::new(1.0, 2.0, 3.0);
        image.set_pixel(2, 1, color);
        assert_eq!(image.get_pixel(2, 1), color);
    }

    #[test]
    fn test_average_luminosity() {
        let mut image = HdrImage::new(2, 1);

        // All-black image must not blow up thanks to the log floor
        let all_black = image.average_luminosity();
        assert!(all_black.is_finite());

        image.set_pixel(0, 0, Color::new(5.0, 10.0, 15.0)); // luminosity 10
        image.set_pixel(1, 0, Color::new(500.0, 1000.0, 1500.0)); // luminosity 1000
        assert!((image.average_luminosity_with(0.0) - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_normalize_with_explicit_luminosity() {
        let mut image = HdrImage::new(2, 1);
        image.set_pixel(0, 0, Color::new(5.0, 10.0, 15.0));
        image.set_pixel(1, 0, Color::new(500.0, 1000.0, 1500.0));

        image.normalize(1000.0, Some(100.0));
        assert!(image
            .get_pixel(0, 0)
            .abs_diff_eq(Color::new(0.5e2, 1.0e2, 1.5e2), 1e-3));
        assert!(image
            .get_pixel(1, 0)
            .abs_diff_eq(Color::new(0.5e4, 1.0e4, 1.5e4), 1e-1));
    }

    #[test]
    fn test_normalize_computes_luminosity_when_zero() {
        let mut image = HdrImage::new(2, 1);
        image.set_pixel(0, 0, Color::new(5.0, 10.0, 15.0));
        image.set_pixel(1, 0, Color::new(500.0, 1000.0, 1500.0));

        // Average luminosity is ~100 (log mean of 10 and 1000), so an
        // explicit zero behaves like the computed value
        let mut with_zero = image.clone();
        with_zero.normalize(1000.0, Some(0.0));
        image.normalize(1000.0, None);
        assert_eq!(image, with_zero);
        assert!(image
            .get_pixel(0, 0)
            .abs_diff_eq(Color::new(0.5e2, 1.0e2, 1.5e2), 1e-1));
    }

    #[test]
    fn test_clamp() {
        let mut image = HdrImage::new(2, 1);
        image.set_pixel(0, 0, Color::new(0.5, 10.0, 1000.0));
        image.set_pixel(1, 0, Color::new(0.0, 0.1, 0.2));

        image.clamp();
        for pixel in image.pixels() {
            assert!(pixel.x >= 0.0 && pixel.x <= 1.0);
            assert!(pixel.y >= 0.0 && pixel.y <= 1.0);
            assert!(pixel.z >= 0.0 && pixel.z <= 1.0);
        }
    }

    #[test]
    fn test_to_ldr() {
        let mut image = HdrImage::new(2, 1);
        image.set_pixel(0, 0, Color::new(1.0, 0.0, 0.25));
        image.set_pixel(1, 0, Color::new(0.5, 1.0, 0.0));

        let ldr = image.to_ldr(1.0);
        assert_eq!(ldr, vec![255, 0, 63, 127, 255, 0]);

        // gamma 2 maps 0.25 to sqrt(0.25) = 0.5
        let ldr2 = image.to_ldr(2.0);
        assert_eq!(ldr2[2], 127);
    }

    #[test]
    fn test_save_rejects_unknown_extension() {
        let image = HdrImage::new(2, 2);
        let result = image.save("out.bmp", 1.0);
        assert!(matches!(result, Err(ImageError::UnsupportedExtension(_))));
    }
}
