//! Decoded video frames.
//!
//! A `Frame` is one decoded image sample from the live feed. Frames are owned
//! exclusively by whichever pipeline stage currently holds them and move by
//! value from stage to stage. Nothing in this crate clones or buffers frames
//! beyond the single pending slot in `pipeline`; a frame superseded before
//! inference starts is simply dropped.

use anyhow::{anyhow, Result};

use crate::Size;

/// Pixel layouts accepted from the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 24-bit RGB.
    Rgb8,
    /// Packed 32-bit BGRA (the previewer's native decode output).
    Bgra8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Bgra8 => 4,
        }
    }
}

/// One decoded frame from the video feed.
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    timestamp_micros: u64,
}

impl Frame {
    /// Wrap a decoded pixel buffer. The buffer length must match the stated
    /// dimensions exactly; a short or oversized buffer is a decoder bug we
    /// refuse to propagate into inference.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        timestamp_micros: u64,
    ) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(format.bytes_per_pixel()))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "frame buffer is {} bytes, expected {} for {}x{} {:?}",
                data.len(),
                expected,
                width,
                height,
                format
            ));
        }
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        Ok(Self {
            data,
            width,
            height,
            format,
            timestamp_micros,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Monotonic capture timestamp in microseconds.
    pub fn timestamp_micros(&self) -> u64 {
        self.timestamp_micros
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGB value at (x, y). Callers must pass in-bounds coordinates.
    pub(crate) fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * self.format.bytes_per_pixel();
        match self.format {
            PixelFormat::Rgb8 => [self.data[idx], self.data[idx + 1], self.data[idx + 2]],
            // BGRA: swap blue and red, drop alpha.
            PixelFormat::Bgra8 => [self.data[idx + 2], self.data[idx + 1], self.data[idx]],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer_length() {
        let err = Frame::new(vec![0u8; 10], 4, 4, PixelFormat::Rgb8, 0);
        assert!(err.is_err());
    }

    #[test]
    fn accepts_exact_buffer_length() {
        let frame = Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, PixelFormat::Rgb8, 42).unwrap();
        assert_eq!(frame.size(), Size::new(4, 4));
        assert_eq!(frame.timestamp_micros(), 42);
    }

    #[test]
    fn bgra_pixels_read_back_as_rgb() {
        // Single pixel: B=1, G=2, R=3, A=255.
        let frame = Frame::new(vec![1, 2, 3, 255], 1, 1, PixelFormat::Bgra8, 0).unwrap();
        assert_eq!(frame.rgb_at(0, 0), [3, 2, 1]);
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(Frame::new(vec![], 0, 4, PixelFormat::Rgb8, 0).is_err());
    }
}
