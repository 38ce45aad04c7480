//! `tokio_util` codec for the landmark stream.
//!
//! Lets an async host consume landmark results with `FramedRead` (or produce
//! them with `FramedWrite`) using the same wire format as
//! [`crate::MessageWriter`] and [`crate::MessageReader`].

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_message, encode_message, peek_length, WireConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::landmark::{decode_landmarks, encode_landmarks, LandmarkSet};

/// Length-prefixed landmark codec.
#[derive(Debug, Clone, Default)]
pub struct LandmarkCodec {
    config: WireConfig,
}

impl LandmarkCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WireConfig) -> Self {
        Self { config }
    }
}

impl Decoder for LandmarkCodec {
    type Item = LandmarkSet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<LandmarkSet>> {
        match decode_message(src, self.config.max_payload_size)? {
            Some(payload) => decode_landmarks(&payload).map(Some),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<LandmarkSet>> {
        if let Some(set) = self.decode(src)? {
            return Ok(Some(set));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let expected = peek_length(src).map_or(HEADER_SIZE, |len| HEADER_SIZE + len);
        Err(FrameError::TruncatedMessage {
            expected,
            received: src.len(),
        })
    }
}

impl Encoder<&LandmarkSet> for LandmarkCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &LandmarkSet, dst: &mut BytesMut) -> Result<()> {
        let payload = encode_landmarks(item);
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }
        encode_message(&payload, dst)
    }
}

impl Encoder<LandmarkSet> for LandmarkCodec {
    type Error = FrameError;

    fn encode(&mut self, item: LandmarkSet, dst: &mut BytesMut) -> Result<()> {
        <Self as Encoder<&LandmarkSet>>::encode(self, &item, dst)
    }
}
