use thiserror::Error;

/// Errors produced by the rasterizer, the container encoders, and the
/// conversion pipeline.
///
/// Only [`Error::Decode`] is fatal for a whole run; every other variant is
/// scoped to a single size or a single platform branch and is surfaced
/// through that branch's [`ConversionResult`](crate::ConversionResult).
#[derive(Debug, Error)]
pub enum Error {
    /// The source image could not be decoded.
    #[error("failed to decode source image: {0}")]
    Decode(String),

    /// A single target size failed to rasterize or encode.
    #[error("failed to rasterize {size}x{size}: {reason}")]
    Raster {
        /// Edge length of the failed surface, in pixels.
        size: u32,
        /// Description of the underlying failure.
        reason: String,
    },

    /// A bitmap handed to an encoder failed a format sanity check.
    #[error("bitmap for {size}x{size} does not carry a PNG signature")]
    UnsupportedEntry {
        /// Edge length of the rejected bitmap, in pixels.
        size: u32,
    },

    /// An encoder was left with no usable entries.
    #[error("no usable entries to encode")]
    EmptyInput,

    /// A platform required a size the rasterizer did not produce.
    #[error("missing rasterized bitmap for required size {size}x{size}")]
    MissingSize {
        /// The absent edge length, in pixels.
        size: u32,
    },

    /// A structural self-check on encoder output failed. This indicates a
    /// bug in the encoder, never bad input.
    #[error("encoder invariant violated: {0}")]
    Invariant(String),

    /// The run was canceled before this branch completed.
    #[error("conversion canceled")]
    Canceled,
}
