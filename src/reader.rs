use std::io::{prelude::*, SeekFrom};

use log::debug;

use crate::{
    error::{Error, PositionalError},
    PositionalResult,
};

/// Position within a readable source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadPosition {
    pub(crate) byte_offset: u64,
}

impl ReadPosition {
    pub(crate) const fn new() -> Self {
        Self { byte_offset: 0 }
    }

    /// The byte offset within the source
    #[must_use]
    pub const fn byte_offset(&self) -> u64 {
        self.byte_offset
    }
}

pub(crate) struct Reader<'r, T> {
    reader: &'r mut T,
    position: ReadPosition,
}

impl<'r, T: Read + Seek> Reader<'r, T> {
    #[must_use]
    pub(crate) fn new(reader: &'r mut T) -> Self {
        Reader {
            reader,
            position: ReadPosition::new(),
        }
    }

    fn seek(&mut self, pos: SeekFrom) -> PositionalResult<u64> {
        match self.reader.seek(pos) {
            Ok(byte_offset) => {
                self.position.byte_offset = byte_offset;
                Ok(byte_offset)
            }
            Err(e) => Err(self.positional_error(e.into())),
        }
    }

    /// Total length of the source, restoring the current position afterwards
    fn stream_len(&mut self) -> PositionalResult<u64> {
        let byte_offset = self.seek(SeekFrom::Current(0))?;
        let len = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(byte_offset))?;
        Ok(len)
    }

    fn read_to_end(&mut self, buffer: &mut Vec<u8>) -> PositionalResult<usize> {
        match self.reader.read_to_end(buffer) {
            Ok(num_bytes_read) => {
                self.position.byte_offset += num_bytes_read as u64;
                Ok(num_bytes_read)
            }
            Err(e) => Err(self.positional_error(e.into())),
        }
    }

    /// Read all audio data, skipping the first `offset_hint` bytes
    ///
    /// The hint is ignored if it is not strictly less than the length
    /// of the source.
    pub(crate) fn read_audio_buffer(&mut self, offset_hint: u64) -> PositionalResult<Vec<u8>> {
        let len = self.stream_len()?;
        let offset = if offset_hint < len {
            offset_hint
        } else {
            if offset_hint > 0 {
                debug!("Ignoring offset hint {} beyond source length {}", offset_hint, len);
            }
            0
        };
        self.seek(SeekFrom::Start(offset))?;
        let capacity = usize::try_from(len - offset)
            .map_err(|_| self.positional_error(Error::BufferTooLarge { len: len - offset }))?;
        let mut buffer = Vec::with_capacity(capacity);
        self.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    #[must_use]
    pub(crate) fn positional_error(&self, source: Error) -> PositionalError {
        let Self { position, .. } = self;
        PositionalError {
            source,
            position: position.clone(),
        }
    }
}
