//! Frame sources.
//!
//! The live deployment's frame source is the hardware video feed plus its
//! decoder, which are external collaborators. This module provides the
//! sources the crate ships for demos and tests:
//! - Synthetic `stub://` streams (paced, deterministic content)
//! - JPEG directories (feature: ingest-image)
//!
//! All sources produce owned [`Frame`](crate::Frame) instances with
//! monotonically increasing capture timestamps.

#[cfg(feature = "ingest-image")]
mod jpeg_dir;
mod synthetic;

#[cfg(feature = "ingest-image")]
pub use jpeg_dir::JpegDirSource;
pub use synthetic::{SyntheticConfig, SyntheticSource};

use anyhow::Result;

use crate::frame::Frame;

/// A producer of decoded frames, polled serially by the caller.
pub trait FrameSource {
    /// Produce the next frame, pacing to the source's frame rate.
    fn next_frame(&mut self) -> Result<Frame>;
}
