/// Errors that can occur while reading frames or reading/writing messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The inbound stream closed part-way through a raw frame.
    #[error("truncated frame: stream closed after {received} of {expected} bytes")]
    TruncatedFrame { expected: usize, received: usize },

    /// The outbound stream closed part-way through a length prefix or payload.
    #[error("truncated message: stream closed after {received} of {expected} bytes")]
    TruncatedMessage { expected: usize, received: usize },

    /// A size-prefixed frame announced a size other than the configured one.
    #[error("frame size mismatch (announced {announced} bytes, expected {expected})")]
    FrameSizeMismatch { announced: usize, expected: usize },

    /// A landmark payload does not decode to a valid landmark set.
    #[error("malformed landmark payload ({len} bytes): {reason}")]
    MalformedPayload { len: usize, reason: String },

    /// More landmarks than a single set may carry.
    #[error("too many landmarks ({count}, max {max})")]
    TooManyLandmarks { count: usize, max: usize },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Frame geometry is unusable (zero-sized or too large).
    #[error("invalid frame geometry: {0}")]
    InvalidGeometry(String),

    /// The frame buffer could not be allocated.
    #[error("cannot allocate a {size} byte frame buffer")]
    FrameAllocation { size: usize },

    /// An I/O error occurred while reading or writing.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer stopped accepting bytes.
    #[error("connection closed (write accepted no bytes)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
