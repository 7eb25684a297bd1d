//! mp3-stream-scan
//!
//! Locate an MPEG-1 Layer III (MP3) stream in a byte buffer and summarize
//! it from the MPEG frame headers, without decoding any audio.
//!
//! The buffer is scanned in two phases:
//!
//! 1. Sync acquisition: Search the start of the buffer for a number of
//!    consecutive MPEG-1 Layer III frames. If none are found the buffer
//!    does not contain MPEG audio.
//! 2. Accounting: Walk all frames from the first match until the end of the
//!    buffer and sum up their durations.
//!
//! Note that the second phase accepts every valid MPEG audio frame header,
//! regardless of its version and layer. Frames of other versions or layers
//! that follow the initial MPEG-1 Layer III frames are counted, too.

#![warn(unsafe_code)]
#![cfg_attr(not(debug_assertions), deny(warnings))]
#![deny(rust_2018_idioms)]
#![deny(rust_2021_compatibility)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::all)]
#![deny(clippy::explicit_deref_methods)]
#![deny(clippy::explicit_into_iter_loop)]
#![deny(clippy::explicit_iter_loop)]
#![deny(clippy::must_use_candidate)]
#![cfg_attr(test, deny(warnings))]
#![cfg_attr(not(test), deny(clippy::panic_in_result_fn))]
#![cfg_attr(not(debug_assertions), deny(clippy::used_underscore_binding))]

use std::{
    fmt,
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
    time::Duration,
};

mod error;
mod frame;
mod reader;
mod scanner;

pub use self::frame::{Emphasis, FrameHeader, Layer, Mode, Version};

use self::{
    reader::Reader,
    scanner::{accumulate_frames, find_sync, start_offset, SyncPoint},
};

pub use self::{
    error::{Error, PositionalError},
    reader::ReadPosition,
    scanner::FrameChain,
};

/// Result type for [`PositionalError`]
pub type PositionalResult<T> = std::result::Result<T, PositionalError>;

/// Tuning of the sync acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Maximum number of bytes to search for the first frames
    ///
    /// Audio data might start far into a file, but searching through
    /// arbitrary data is wasteful and produces false positives.
    pub sync_search_limit: usize,

    /// Number of MPEG-1 Layer III frames needed to accept the buffer as MPEG audio
    pub min_sync_frames: u32,
}

impl ScanConfig {
    /// 500 KiB and 3 frames
    pub const DEFAULT: Self = Self {
        sync_search_limit: 500 * 1024,
        min_sync_frames: 3,
    };
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const MILLIS_PER_SECOND: f64 = 1000.0;

/// Properties of an MPEG audio stream
///
/// The result of scanning a byte buffer. Owns the buffer that has been scanned.
#[derive(Clone, PartialEq)]
pub struct AudioStreamSummary {
    buffer: Vec<u8>,
    first_frame: Option<SyncPoint>,
    duration_secs: f64,
    frame_count: u64,
}

impl fmt::Debug for AudioStreamSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioStreamSummary")
            .field("buffer_len", &self.buffer.len())
            .field("first_frame", &self.first_frame)
            .field("duration_secs", &self.duration_secs)
            .field("frame_count", &self.frame_count)
            .finish()
    }
}

impl AudioStreamSummary {
    /// Scan a buffer with the default [`ScanConfig`]
    ///
    /// The first `offset_hint` bytes are skipped, e.g. to bypass a leading
    /// ID3v2 tag. A hint that is not strictly less than the buffer length
    /// is ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use mp3_stream_scan::AudioStreamSummary;
    ///
    /// let summary = AudioStreamSummary::scan(vec![0; 1024], 0);
    /// assert!(!summary.has_mpeg_audio());
    /// ```
    #[must_use]
    pub fn scan(buffer: Vec<u8>, offset_hint: u64) -> Self {
        Self::scan_with_config(buffer, offset_hint, &ScanConfig::DEFAULT)
    }

    /// Scan a buffer
    #[must_use]
    pub fn scan_with_config(buffer: Vec<u8>, offset_hint: u64, config: &ScanConfig) -> Self {
        let start = start_offset(buffer.len(), offset_hint);
        let Some(first_frame) = find_sync(&buffer, start, config) else {
            return Self {
                buffer,
                first_frame: None,
                duration_secs: 0.0,
                frame_count: 0,
            };
        };
        let totals = accumulate_frames(FrameChain::new(&buffer, first_frame.offset));
        debug_assert!(totals.frame_count > 0);
        Self {
            buffer,
            first_frame: Some(first_frame),
            duration_secs: totals.duration_secs,
            frame_count: totals.frame_count,
        }
    }

    /// Read from a `source` that implements `Read` and `Seek`
    ///
    /// Only the data after `offset_hint` is read into memory and scanned.
    /// The hint is ignored if it is not strictly less than the length of
    /// the source.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::{path::Path, fs::File, io::BufReader};
    /// use mp3_stream_scan::AudioStreamSummary;
    ///
    /// let path = Path::new("test/source.mp3");
    /// let file = File::open(path).unwrap();
    /// let mut source = BufReader::new(file);
    /// let summary = AudioStreamSummary::read_from_source(&mut source, 0).unwrap();
    /// println!("MPEG audio: {:?}", summary);
    /// ```
    pub fn read_from_source(
        source: &mut (impl Read + Seek),
        offset_hint: u64,
    ) -> PositionalResult<Self> {
        let buffer = Reader::new(source).read_audio_buffer(offset_hint)?;
        Ok(Self::scan(buffer, 0))
    }

    /// Read from a file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::{path::Path, fs::File};
    /// use mp3_stream_scan::AudioStreamSummary;
    ///
    /// let path = Path::new("test/source.mp3");
    /// let file = File::open(path).unwrap();
    /// let summary = AudioStreamSummary::read_from_file(&file, 0).unwrap();
    /// println!("Duration: {} ms", summary.duration_ms());
    /// ```
    pub fn read_from_file(file: &File, offset_hint: u64) -> PositionalResult<Self> {
        let mut source = BufReader::new(file);
        Self::read_from_source(&mut source, offset_hint)
    }

    /// Read from a file path
    ///
    /// The file is closed on a separate thread while the data is scanned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use mp3_stream_scan::AudioStreamSummary;
    ///
    /// let path = Path::new("test/source.mp3");
    /// let summary = AudioStreamSummary::read_from_path(&path, 0).unwrap();
    /// println!("Frames: {}", summary.frame_count());
    /// ```
    pub fn read_from_path(path: impl AsRef<Path>, offset_hint: u64) -> PositionalResult<Self> {
        let file = File::open(path).map_err(|e| PositionalError {
            source: e.into(),
            position: ReadPosition::new(),
        })?;
        let buffer = {
            let mut source = BufReader::new(&file);
            Reader::new(&mut source).read_audio_buffer(offset_hint)?
        };
        let summary = std::thread::scope(|scope| {
            scope.spawn(move || drop(file));
            Self::scan(buffer, 0)
        });
        Ok(summary)
    }

    /// A valid MPEG audio stream has been found
    #[must_use]
    pub const fn has_mpeg_audio(&self) -> bool {
        self.first_frame.is_some()
    }

    /// Header of the first frame
    #[must_use]
    pub fn first_frame_header(&self) -> Option<&FrameHeader> {
        self.first_frame.as_ref().map(|first_frame| &first_frame.header)
    }

    /// Byte offset of the first frame in the buffer
    #[must_use]
    pub fn first_frame_offset(&self) -> Option<usize> {
        self.first_frame.map(|first_frame| first_frame.offset)
    }

    /// MPEG version of the first frame
    #[must_use]
    pub fn version(&self) -> Option<Version> {
        self.first_frame_header().and_then(FrameHeader::version)
    }

    /// MPEG layer of the first frame
    #[must_use]
    pub fn layer(&self) -> Option<Layer> {
        self.first_frame_header().and_then(FrameHeader::layer)
    }

    /// Channel mode of the first frame
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        self.first_frame_header().map(FrameHeader::mode)
    }

    /// Sample rate of the first frame in Hz
    #[must_use]
    pub fn sample_rate_hz(&self) -> Option<u32> {
        self.first_frame_header().map(FrameHeader::sample_rate_hz)
    }

    /// Number of channels of the first frame, either 1 or 2
    #[must_use]
    pub fn channel_count(&self) -> Option<u8> {
        self.first_frame_header().map(FrameHeader::channel_count)
    }

    /// Total number of frames
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Total duration in seconds, summed up frame by frame
    #[must_use]
    pub const fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Total duration rounded to the nearest millisecond
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        (self.duration_secs * MILLIS_PER_SECOND).round() as u64
    }

    /// Total duration
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs)
    }

    /// The scanned data
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Take back ownership of the scanned data
    #[must_use]
    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }
}
