use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::codec::{decode_message, peek_length, WireConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::landmark::{decode_landmarks, LandmarkSet};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads length-prefixed messages from any `Read` stream.
///
/// This is the consumer side of [`crate::MessageWriter`]. Partial reads are
/// handled internally; callers always get whole payloads.
pub struct MessageReader<T> {
    inner: T,
    buf: BytesMut,
    config: WireConfig,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, WireConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, config: WireConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete payload (blocking).
    ///
    /// Returns `Ok(None)` when the stream ends on a message boundary, and
    /// `FrameError::TruncatedMessage` when it ends inside one.
    pub fn read_message(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(payload) = decode_message(&mut self.buf, self.config.max_payload_size)? {
                return Ok(Some(payload));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return self.end_of_stream();
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read and decode the next landmark set.
    pub fn read_landmarks(&mut self) -> Result<Option<LandmarkSet>> {
        match self.read_message()? {
            Some(payload) => decode_landmarks(&payload).map(Some),
            None => Ok(None),
        }
    }

    fn end_of_stream(&self) -> Result<Option<Bytes>> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        let expected = match peek_length(&self.buf) {
            Some(len) => HEADER_SIZE + len,
            None => HEADER_SIZE,
        };
        Err(FrameError::TruncatedMessage {
            expected,
            received: self.buf.len(),
        })
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

impl<T: Read> Iterator for MessageReader<T> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_message().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::encode_message;
    use crate::landmark::{LandmarkPoint, MAX_LANDMARKS};
    use crate::writer::MessageWriter;

    fn wire(payloads: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for payload in payloads {
            encode_message(payload, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn reads_exact_payloads() {
        let big = [0xABu8; 9000];
        let payloads: [&[u8]; 4] = [b"one", b"", &big, b"four"];
        let mut reader = MessageReader::new(Cursor::new(wire(&payloads)));

        for expected in payloads {
            let payload = reader.read_message().unwrap().unwrap();
            assert_eq!(payload.as_ref(), expected);
        }
        assert!(reader.read_message().unwrap().is_none());
    }

    #[test]
    fn empty_stream_is_clean_end() {
        let mut reader = MessageReader::new(Cursor::new(Vec::new()));
        assert!(reader.read_message().unwrap().is_none());
    }

    #[test]
    fn truncated_header() {
        let mut reader = MessageReader::new(Cursor::new(vec![0x10, 0x00]));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(
            err,
            FrameError::TruncatedMessage {
                expected: 4,
                received: 2
            }
        ));
    }

    #[test]
    fn truncated_payload() {
        let mut bytes = wire(&[b"complete".as_slice(), b"partial-payload".as_slice()]);
        bytes.truncate(bytes.len() - 3);
        let mut reader = MessageReader::new(Cursor::new(bytes));

        assert_eq!(reader.read_message().unwrap().unwrap().as_ref(), b"complete");
        assert!(matches!(
            reader.read_message().unwrap_err(),
            FrameError::TruncatedMessage {
                expected: 19,
                received: 16
            }
        ));
    }

    #[test]
    fn oversized_prefix_rejected() {
        let cfg = WireConfig {
            max_payload_size: 16,
        };
        let mut reader =
            MessageReader::with_config(Cursor::new(1024u32.to_le_bytes().to_vec()), cfg);
        assert!(matches!(
            reader.read_message().unwrap_err(),
            FrameError::PayloadTooLarge {
                size: 1024,
                max: 16
            }
        ));
    }

    #[test]
    fn iterator_yields_every_message() {
        let bytes = wire(&[b"a".as_slice(), b"bb".as_slice(), b"ccc".as_slice()]);
        let reader = MessageReader::new(Cursor::new(bytes));
        let lens: Vec<usize> = reader.map(|m| m.unwrap().len()).collect();
        assert_eq!(lens, vec![1, 2, 3]);
    }

    #[test]
    fn malformed_landmark_payload_surfaces() {
        let mut reader = MessageReader::new(Cursor::new(wire(&[&[0u8; 23]])));
        assert!(matches!(
            reader.read_landmarks().unwrap_err(),
            FrameError::MalformedPayload { len: 23, .. }
        ));
    }

    #[test]
    #[cfg(unix)]
    fn landmarks_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let sets: Vec<LandmarkSet> = (0..=MAX_LANDMARKS)
            .map(|n| {
                LandmarkSet::new(
                    (0..n)
                        .map(|i| LandmarkPoint::new(i as f64, n as f64, -(i as f64)))
                        .collect(),
                )
                .unwrap()
            })
            .collect();

        let expected = sets.clone();
        let writer_thread = std::thread::spawn(move || {
            let mut writer = MessageWriter::new(left);
            for set in &sets {
                writer.send_landmarks(set).unwrap();
            }
        });

        let mut reader = MessageReader::new(right);
        for set in &expected {
            assert_eq!(&reader.read_landmarks().unwrap().unwrap(), set);
        }
        writer_thread.join().unwrap();
        assert!(reader.read_landmarks().unwrap().is_none());
    }
}
