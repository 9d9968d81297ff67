/// Colors and the pixel sink the rasterizer writes into.
use std::path::Path;

use image::{imageops, Rgb, RgbImage};

use crate::error::FramebufferError;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);

    /// Opaque color.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Multiply each color channel by `intensity`, clamped to `0.0..=1.0`.
    /// The result is opaque.
    pub fn shade(self, intensity: f32) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self::new(
            (self.r as f32 * i) as u8,
            (self.g as f32 * i) as u8,
            (self.b as f32 * i) as u8,
        )
    }

    /// Relative luminance in `0.0..=1.0` (Rec. 709 weights).
    pub fn luminance(self) -> f32 {
        (0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32) / 255.0
    }
}

/// Write-only pixel target.
pub trait ImageSink {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Write a pixel. Coordinates outside the sink are ignored.
    fn set_pixel(&mut self, x: usize, y: usize, color: Color);
}

/// RGB framebuffer. Row 0 is the bottom scanline until
/// [`Framebuffer::flip_vertically`] is called.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    image: RgbImage,
}

impl Framebuffer {
    /// Black framebuffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            image: RgbImage::new(width as u32, height as u32),
        }
    }

    pub fn clear(&mut self, color: Color) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgb([color.r, color.g, color.b]);
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x < self.width() && y < self.height() {
            let Rgb([r, g, b]) = *self.image.get_pixel(x as u32, y as u32);
            Some(Color::new(r, g, b))
        } else {
            None
        }
    }

    /// Iterate over every pixel as `(x, y, color)`.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, Color)> + '_ {
        self.image
            .enumerate_pixels()
            .map(|(x, y, &Rgb([r, g, b]))| (x as usize, y as usize, Color::new(r, g, b)))
    }

    pub fn flip_vertically(&mut self) {
        imageops::flip_vertical_in_place(&mut self.image);
    }

    /// Encode to `path`; the format follows the file extension (`.tga`, `.png`).
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), FramebufferError> {
        let path = path.as_ref();
        self.image.save(path).map_err(|source| FramebufferError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }
}

impl ImageSink for Framebuffer {
    fn width(&self) -> usize {
        self.image.width() as usize
    }

    fn height(&self) -> usize {
        self.image.height() as usize
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width() && y < self.height() {
            self.image
                .put_pixel(x as u32, y as u32, Rgb([color.r, color.g, color.b]));
        }
    }
}
