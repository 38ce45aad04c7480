//! Frame-in, landmarks-out pose streaming over pipes.
//!
//! A producer writes fixed-size raw RGB (or BGR) frames into one pipe; the
//! pipeline runs a pose estimator on each frame and writes one
//! length-prefixed landmark set per frame into a second pipe.
//!
//! # Crate Structure
//!
//! - [`transport`]: pipe endpoints and FIFO creation
//! - [`wire`]: raw frame reader, landmark codec, length-prefixed messages
//! - [`pipeline`]: estimator trait and the pipeline state machine (behind
//!   the `pipeline` feature)

/// Re-export transport types.
pub mod transport {
    pub use posepipe_transport::*;
}

/// Re-export wire types.
pub mod wire {
    pub use posepipe_wire::*;
}

/// Re-export pipeline types (requires `pipeline` feature).
#[cfg(feature = "pipeline")]
pub mod pipeline {
    pub use posepipe_pipeline::*;
}
