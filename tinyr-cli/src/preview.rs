/// ASCII preview of a rendered frame for the terminal
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use tinyr_core::{Framebuffer, ImageSink};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: usize = 2;

/// Map a luminance in `0.0..=1.0` to a ramp character
pub fn ramp_char(luminance: f32) -> char {
    let index = (luminance.clamp(0.0, 1.0) * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
    LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)]
}

/// Downsampled character image of a framebuffer
pub struct AsciiPreview {
    width: usize,
    height: usize,
    char_buffer: Vec<char>,
}

impl AsciiPreview {
    /// Fit `framebuffer` into at most `max_cols x max_rows` cells, keeping
    /// its aspect ratio. Each cell shows the mean luminance of its block.
    /// Row 0 of the framebuffer is printed first.
    pub fn from_framebuffer(framebuffer: &Framebuffer, max_cols: usize, max_rows: usize) -> Self {
        let (fb_width, fb_height) = (framebuffer.width(), framebuffer.height());
        if fb_width == 0 || fb_height == 0 || max_cols == 0 || max_rows == 0 {
            return Self {
                width: 0,
                height: 0,
                char_buffer: Vec::new(),
            };
        }

        let mut width = max_cols.min(fb_width);
        let mut height = (width * fb_height / fb_width / CELL_ASPECT).max(1);
        if height > max_rows {
            height = max_rows;
            width = (height * CELL_ASPECT * fb_width / fb_height).clamp(1, max_cols);
        }

        let mut char_buffer = Vec::with_capacity(width * height);
        for row in 0..height {
            let y0 = row * fb_height / height;
            let y1 = ((row + 1) * fb_height / height).max(y0 + 1);
            for col in 0..width {
                let x0 = col * fb_width / width;
                let x1 = ((col + 1) * fb_width / width).max(x0 + 1);

                let mut sum = 0.0;
                let mut count = 0;
                for y in y0..y1 {
                    for x in x0..x1 {
                        if let Some(color) = framebuffer.get_pixel(x, y) {
                            sum += color.luminance();
                            count += 1;
                        }
                    }
                }
                let mean = if count > 0 { sum / count as f32 } else { 0.0 };
                char_buffer.push(ramp_char(mean));
            }
        }

        Self {
            width,
            height,
            char_buffer,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn row(&self, y: usize) -> String {
        self.char_buffer[y * self.width..(y + 1) * self.width]
            .iter()
            .collect()
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.char_buffer[y * self.width + x];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            writer.queue(Print('\n'))?;
        }
        writer.queue(ResetColor)?;
        writer.flush()
    }
}
