use crate::error::{RelumeError, RelumeResult};

/// One raster frame: a dense `width x height` grid of 3-channel 8-bit
/// samples in blue-green-red order.
///
/// BGR is the working channel order of the whole pipeline; boundary code
/// decodes into it and encodes out of it, and must not silently reorder
/// channels. Dimensions are immutable for the lifetime of the frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBgr {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl FrameBgr {
    /// Wrap an owned `bgr24` buffer. The buffer length must be exactly
    /// `width * height * 3` and both dimensions must be non-zero.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> RelumeResult<Self> {
        if width == 0 || height == 0 {
            return Err(RelumeError::unsupported_frame(
                "frame width/height must be non-zero",
            ));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| RelumeError::unsupported_frame("frame buffer size overflow"))?;
        if data.len() != expected {
            return Err(RelumeError::unsupported_frame(format!(
                "frame buffer length {} does not match {}x{}x3",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Allocate a frame filled with a single BGR sample.
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> RelumeResult<Self> {
        let px = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| RelumeError::unsupported_frame("frame buffer size overflow"))?;
        let mut data = Vec::with_capacity(px * 3);
        for _ in 0..px {
            data.extend_from_slice(&bgr);
        }
        Self::from_raw(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total sample count (`width * height`), used for boundary guards.
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the frame, returning the raw `bgr24` buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Read one BGR sample. Callers must stay in bounds; this is a test and
    /// stage-internal helper, not a boundary API.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }
}
