use std::io::{ErrorKind, Read};

use tracing::trace;

use crate::codec::HEADER_SIZE;
use crate::error::{FrameError, Result};
use crate::frame::{ColorOrder, FrameGeometry, RawFrame};

/// How frames are delimited on the inbound stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InboundLayout {
    /// Back-to-back frames with no header. Frame size comes from configuration.
    #[default]
    Raw,
    /// Each frame is preceded by its byte length (4B LE), which must equal
    /// the configured frame size.
    SizePrefixed,
}

/// Reads fixed-size raw frames from any `Read` stream.
///
/// Short reads are accumulated until a whole frame is available. A stream
/// that ends cleanly between frames yields `Ok(None)`; one that ends inside a
/// frame yields `FrameError::TruncatedFrame`.
pub struct FrameReader<T> {
    inner: T,
    geometry: FrameGeometry,
    frame_size: usize,
    color_order: ColorOrder,
    layout: InboundLayout,
    next_index: u64,
}

impl<T: Read> FrameReader<T> {
    /// Create a reader for raw frames of the given geometry.
    pub fn new(inner: T, geometry: FrameGeometry) -> Result<Self> {
        let frame_size = geometry.frame_size()?;
        Ok(Self {
            inner,
            geometry,
            frame_size,
            color_order: ColorOrder::default(),
            layout: InboundLayout::default(),
            next_index: 0,
        })
    }

    /// Declare the colour order the producer writes.
    pub fn with_color_order(mut self, color_order: ColorOrder) -> Self {
        self.color_order = color_order;
        self
    }

    /// Select how frames are delimited.
    pub fn with_layout(mut self, layout: InboundLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Read the next frame (blocking).
    ///
    /// Returns `Ok(None)` when the stream ends before the first byte of a frame.
    pub fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        if self.layout == InboundLayout::SizePrefixed && !self.read_size_header()? {
            return Ok(None);
        }

        let mut data = Vec::new();
        data.try_reserve_exact(self.frame_size)
            .map_err(|_| FrameError::FrameAllocation {
                size: self.frame_size,
            })?;
        data.resize(self.frame_size, 0);
        let received = fill(&mut self.inner, &mut data)?;

        if received == 0 && self.layout == InboundLayout::Raw {
            trace!(frames = self.next_index, "inbound stream ended");
            return Ok(None);
        }
        if received < self.frame_size {
            return Err(FrameError::TruncatedFrame {
                expected: self.frame_size,
                received,
            });
        }

        let index = self.next_index;
        self.next_index += 1;
        trace!(index, size = self.frame_size, "read frame");
        Ok(Some(RawFrame::new(
            data,
            self.geometry,
            self.color_order,
            index,
        )))
    }

    /// Returns false on a clean end of stream before the header.
    fn read_size_header(&mut self) -> Result<bool> {
        let mut header = [0u8; HEADER_SIZE];
        let received = fill(&mut self.inner, &mut header)?;
        if received == 0 {
            trace!(frames = self.next_index, "inbound stream ended");
            return Ok(false);
        }
        if received < HEADER_SIZE {
            return Err(FrameError::TruncatedFrame {
                expected: HEADER_SIZE,
                received,
            });
        }

        let announced = u32::from_le_bytes(header) as usize;
        if announced != self.frame_size {
            return Err(FrameError::FrameSizeMismatch {
                announced,
                expected: self.frame_size,
            });
        }
        Ok(true)
    }

    /// Exact byte length of each frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Number of complete frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.next_index
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Read until `buf` is full or the stream ends. Returns bytes read.
pub(crate) fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(filled)
}
