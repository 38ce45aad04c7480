use std::fmt;
use std::str::FromStr;

use crate::error::{FrameError, Result};

/// Interleaved colour samples per pixel.
pub const RGB_CHANNELS: usize = 3;

/// Largest accepted frame, 256 MiB. An 8K RGB frame is about 100 MB.
pub const MAX_FRAME_SIZE: usize = 256 * 1024 * 1024;

/// Dimensions of the raw frames carried on the inbound stream.
///
/// Not negotiated on the wire: producer and consumer must agree on these out
/// of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
}

impl FrameGeometry {
    /// Geometry for interleaved 3-channel frames.
    pub fn rgb(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            channels: RGB_CHANNELS,
        }
    }

    /// Exact byte length of one frame.
    ///
    /// Fails for zero dimensions and for sizes above [`MAX_FRAME_SIZE`].
    pub fn frame_size(&self) -> Result<usize> {
        if self.width == 0 || self.height == 0 || self.channels == 0 {
            return Err(FrameError::InvalidGeometry(format!(
                "{self} has a zero dimension"
            )));
        }
        let size = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|px| px.checked_mul(self.channels))
            .ok_or_else(|| FrameError::InvalidGeometry(format!("{self} overflows usize")))?;
        if size > MAX_FRAME_SIZE {
            return Err(FrameError::InvalidGeometry(format!(
                "{self} is {size} bytes per frame (max {MAX_FRAME_SIZE})"
            )));
        }
        Ok(size)
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::rgb(640, 480)
    }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

/// Order of the three colour samples in each pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorOrder {
    #[default]
    Rgb,
    /// Blue first, as produced by OpenCV capture.
    Bgr,
}

impl FromStr for ColorOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(ColorOrder::Rgb),
            "bgr" => Ok(ColorOrder::Bgr),
            other => Err(format!("unknown colour order: {other} (expected rgb or bgr)")),
        }
    }
}

/// One raw frame read from the inbound stream.
///
/// `data` always holds exactly `geometry.frame_size()` bytes.
pub struct RawFrame {
    data: Vec<u8>,
    geometry: FrameGeometry,
    color_order: ColorOrder,
    index: u64,
}

impl RawFrame {
    pub(crate) fn new(
        data: Vec<u8>,
        geometry: FrameGeometry,
        color_order: ColorOrder,
        index: u64,
    ) -> Self {
        Self {
            data,
            geometry,
            color_order,
            index,
        }
    }

    /// Build a frame from an owned buffer, checking its length.
    pub fn from_bytes(
        data: Vec<u8>,
        geometry: FrameGeometry,
        color_order: ColorOrder,
        index: u64,
    ) -> Result<Self> {
        let expected = geometry.frame_size()?;
        if data.len() != expected {
            return Err(FrameError::FrameSizeMismatch {
                announced: data.len(),
                expected,
            });
        }
        Ok(Self::new(data, geometry, color_order, index))
    }

    /// Pixel bytes, interleaved, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn color_order(&self) -> ColorOrder {
        self.color_order
    }

    /// Zero-based position of this frame in the inbound stream.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Convert the frame to RGB order in place.
    pub fn into_rgb(mut self) -> Self {
        if self.color_order == ColorOrder::Bgr && self.geometry.channels == RGB_CHANNELS {
            for pixel in self.data.chunks_exact_mut(RGB_CHANNELS) {
                pixel.swap(0, 2);
            }
            self.color_order = ColorOrder::Rgb;
        }
        self
    }

    /// Consume the frame and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFrame")
            .field("index", &self.index)
            .field("geometry", &self.geometry)
            .field("color_order", &self.color_order)
            .field("len", &self.data.len())
            .finish()
    }
}
