// SPDX-FileCopyrightText: The mp3-stream-scan authors
// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

use crate::ReadPosition;

/// Error enriched with position information
#[derive(Debug, Error)]
#[error("{} at byte offset {} / 0x{:X}", .source, .position.byte_offset, .position.byte_offset)]
pub struct PositionalError {
    #[source]
    pub(crate) source: Error,

    pub(crate) position: ReadPosition,
}

impl PositionalError {
    /// The actual error
    #[must_use]
    pub const fn source(&self) -> &Error {
        &self.source
    }

    /// The last known position where this error occurred
    #[must_use]
    pub const fn position(&self) -> &ReadPosition {
        &self.position
    }
}

/// Error type
///
/// A buffer without MPEG audio is not an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Unexpected I/O error occurred
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// The audio data does not fit into memory
    #[error("audio data of {len} bytes is too large")]
    BufferTooLarge {
        /// Number of bytes after the offset hint
        len: u64,
    },
}
