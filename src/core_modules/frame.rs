// THEORY:
// A `Frame` is one immutable full-screen capture: a packed, row-major RGB buffer
// plus its dimensions and the instant it was taken. Every consumer reads it
// through `&Frame`; nothing mutates pixels after construction, which is what lets
// the growth engine share a single frame across worker threads without locks.
//
// Captures arrive in several layouts (raw RGB, RGBA from capture APIs, decoded
// `image` buffers). They are normalised to RGB once, here, so the hot loops
// further down only ever see three bytes per pixel.

use crate::core_modules::pixel::pixel::{CHANNELS, Pixel};
use crate::core_modules::rectangle::Rectangle;
use crate::error::{Result, VisionError};
use image::{DynamicImage, RgbImage};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
    captured_at: Instant,
}

impl Frame {
    /// Wraps a packed RGB buffer. The buffer length must be `width * height * 3`.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(VisionError::MalformedFrame(format!(
                "{}x{} RGB frame needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            captured_at: Instant::now(),
        })
    }

    /// Converts a packed RGBA buffer, dropping alpha.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(VisionError::MalformedFrame(format!(
                "{}x{} RGBA frame needs {} bytes, got {}",
                width,
                height,
                expected,
                rgba.len()
            )));
        }
        let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for px in rgba.chunks_exact(4) {
            data.extend_from_slice(&px[..CHANNELS]);
        }
        Self::from_rgb(width, height, data)
    }

    pub fn from_image(image: &DynamicImage) -> Self {
        Self::from(image.to_rgb8())
    }

    /// A frame of a single color.
    pub fn filled(width: u32, height: u32, color: Pixel) -> Self {
        Self::from_fn(width, height, |_, _| color)
    }

    /// Builds a frame by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> Pixel,
    {
        let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                let p = f(x, y);
                data.extend_from_slice(&[p.red, p.green, p.blue]);
            }
        }
        Self {
            width,
            height,
            data,
            captured_at: Instant::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// The full frame as a rectangle anchored at the origin.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(0, 0, self.width, self.height)
    }

    /// Pixel at `(x, y)`. Callers stay inside `bounds()`; out-of-range access panics.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Pixel::from(&self.data[i..i + CHANNELS])
    }

    /// Raw bytes of the pixels `[x0, x1)` on row `y`.
    #[inline]
    pub fn row_span(&self, y: u32, x0: u32, x1: u32) -> &[u8] {
        let row = y as usize * self.width as usize;
        &self.data[(row + x0 as usize) * CHANNELS..(row + x1 as usize) * CHANNELS]
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
            captured_at: Instant::now(),
        }
    }
}
