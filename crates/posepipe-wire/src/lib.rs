//! Wire formats for the posepipe frame and landmark streams.
//!
//! Two unidirectional streams carry the data:
//! - Inbound: fixed-size raw frames, `width * height * 3` bytes each, no
//!   delimiters. Dimensions are agreed out of band.
//! - Outbound: one message per frame, a 4-byte little-endian payload length
//!   followed by the encoded landmark set.
//!
//! Readers and writers handle partial I/O internally; callers only ever see
//! whole frames and whole messages.

pub mod codec;
pub mod error;
pub mod frame;
pub mod frame_reader;
pub mod landmark;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{decode_message, encode_message, WireConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use frame::{ColorOrder, FrameGeometry, RawFrame, MAX_FRAME_SIZE, RGB_CHANNELS};
pub use frame_reader::{FrameReader, InboundLayout};
pub use landmark::{
    decode_landmarks, encode_landmarks, LandmarkPoint, LandmarkSet, MAX_LANDMARKS, POINT_SIZE,
};
pub use reader::MessageReader;
pub use writer::MessageWriter;

#[cfg(feature = "async")]
pub use async_codec::LandmarkCodec;
