use std::fmt;

use thiserror::Error;

/// A single pixel sample with normalized `[0, 1]` channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Opaque black, the colour buffers start out as.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Plain average of the colour channels, the brightness measure shared by
    /// the greyscale and lit-object kernels.
    pub fn brightness(&self) -> f32 {
        (self.r + self.g + self.b) / 3.0
    }

    /// Converts an 8-bit RGBA quad into normalized channels.
    pub fn from_rgba8(bytes: [u8; 4]) -> Self {
        Self {
            r: bytes[0] as f32 / 255.0,
            g: bytes[1] as f32 / 255.0,
            b: bytes[2] as f32 / 255.0,
            a: bytes[3] as f32 / 255.0,
        }
    }

    /// Quantizes the sample back to 8-bit RGBA, clamping out-of-range channels.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let quantize = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        ]
    }
}

/// Surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Failures raised by the 8-bit boundary conversions.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("byte slice holds {actual} bytes but {expected} are needed for {resolution}")]
    ByteLengthMismatch {
        resolution: Resolution,
        expected: usize,
        actual: usize,
    },
}

/// Dense row-major pixel storage for one video frame.
///
/// Buffers are allocated once and reused; every kernel dispatch rewrites the
/// whole pixel range, so stale content never leaks between frames. Index
/// `(x, y)` maps to `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    resolution: Resolution,
    pixels: Vec<Rgba>,
}

impl FrameBuffer {
    /// Allocates a buffer of opaque black pixels.
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            pixels: vec![Rgba::BLACK; resolution.pixel_count()],
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn width(&self) -> u32 {
        self.resolution.width
    }

    pub fn height(&self) -> u32 {
        self.resolution.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(
            x < self.resolution.width && y < self.resolution.height,
            "pixel ({x}, {y}) out of range for {}",
            self.resolution
        );
        y as usize * self.resolution.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Rgba {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: Rgba) {
        let index = self.index(x, y);
        self.pixels[index] = value;
    }

    pub fn fill(&mut self, value: Rgba) {
        self.pixels.fill(value);
    }

    /// Read-only view of the whole pixel range in row-major order.
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Mutable view of the whole pixel range, used by the executors to split
    /// the buffer into rows.
    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }

    /// Overwrites the buffer from packed 8-bit RGBA bytes.
    pub fn copy_from_rgba8(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        let expected = self.resolution.pixel_count() * 4;
        if bytes.len() != expected {
            return Err(BufferError::ByteLengthMismatch {
                resolution: self.resolution,
                expected,
                actual: bytes.len(),
            });
        }

        for (pixel, quad) in self.pixels.iter_mut().zip(bytes.chunks_exact(4)) {
            *pixel = Rgba::from_rgba8([quad[0], quad[1], quad[2], quad[3]]);
        }
        Ok(())
    }

    /// Quantizes the buffer to packed 8-bit RGBA bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            bytes.extend_from_slice(&pixel.to_rgba8());
        }
        bytes
    }
}
