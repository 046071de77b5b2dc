//! Sample layout of raw pixel formats.

use crate::graph::PixelFormat;

/// Channel count and sample width of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLayout {
    pub channels: usize,
    pub bytes_per_sample: usize,
}

impl SampleLayout {
    const fn new(channels: usize, bytes_per_sample: usize) -> Self {
        Self {
            channels,
            bytes_per_sample,
        }
    }

    /// Buffer length a `rows x cols` raw image of this layout must have.
    ///
    /// `None` if the product overflows.
    pub fn expected_len(&self, rows: u32, cols: u32) -> Option<usize> {
        (rows as usize)
            .checked_mul(cols as usize)?
            .checked_mul(self.channels)?
            .checked_mul(self.bytes_per_sample)
    }
}

impl PixelFormat {
    /// Decode table for raw buffers. Unknown formats are read as 8-bit gray.
    pub fn layout(self) -> SampleLayout {
        match self {
            PixelFormat::Depth16 => SampleLayout::new(1, 2),
            PixelFormat::Rgb8 => SampleLayout::new(3, 1),
            PixelFormat::Rgba8 => SampleLayout::new(4, 1),
            PixelFormat::Gray8 => SampleLayout::new(1, 1),
            PixelFormat::Gray16 => SampleLayout::new(1, 2),
            PixelFormat::Unknown => SampleLayout::new(1, 1),
        }
    }
}
