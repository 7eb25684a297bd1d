use std::time::Duration;

pub(crate) const FRAME_HEADER_SIZE: usize = 4;

/// The first byte of every frame header has all 8 bits set
pub(crate) const FRAME_SYNC_LEAD_BYTE: u8 = 0xFF;

const FRAME_SYNC: u32 = 0b111_1111_1111;

const BITS_PER_BYTE: u32 = 8;

// MPEG uses decimal kilobits
const BITS_PER_KILOBIT: u32 = 1000;

/// Bit fields of the 32-bit frame header word
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    FrameSync,
    VersionIndex,
    LayerIndex,
    ProtectionBit,
    BitrateIndex,
    SamplingRateFreqIndex,
    PaddingBit,
    ChannelMode,
    ModeExtension,
    Copyright,
    Original,
    Emphasis,
}

impl Field {
    /// (shift, mask) of the field, counted from the least significant bit
    const fn layout(self) -> (u32, u32) {
        match self {
            Self::FrameSync => (21, 0b111_1111_1111),
            Self::VersionIndex => (19, 0b11),
            Self::LayerIndex => (17, 0b11),
            Self::ProtectionBit => (16, 0b1),
            Self::BitrateIndex => (12, 0b1111),
            Self::SamplingRateFreqIndex => (10, 0b11),
            Self::PaddingBit => (9, 0b1),
            Self::ChannelMode => (6, 0b11),
            Self::ModeExtension => (4, 0b11),
            Self::Copyright => (3, 0b1),
            Self::Original => (2, 0b1),
            Self::Emphasis => (0, 0b11),
        }
    }
}

const VERSION_INDEX_RESERVED: u32 = 0b01;
const LAYER_INDEX_RESERVED: u32 = 0b00;
const BITRATE_INDEX_FREE: u32 = 0b0000;
const BITRATE_INDEX_BAD: u32 = 0b1111;
const SAMPLING_RATE_FREQ_INDEX_RESERVED: u32 = 0b11;

/// MPEG Version
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Version {
    /// MPEG-1
    Mpeg1,

    /// MPEG-2
    Mpeg2,

    /// MPEG 2.5
    Mpeg25,
}

/// Indexed by `VersionIndex`
const VERSIONS: [Option<Version>; 4] = [
    Some(Version::Mpeg25),
    None, // reserved
    Some(Version::Mpeg2),
    Some(Version::Mpeg1),
];

/// MPEG Audio Layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Layer I
    Layer1,

    /// Layer II
    Layer2,

    /// Layer III
    Layer3,
}

/// Indexed by `LayerIndex`
const LAYERS: [Option<Layer>; 4] = [
    None, // reserved
    Some(Layer::Layer3),
    Some(Layer::Layer2),
    Some(Layer::Layer1),
];

/// Channel Mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Stereo
    Stereo,

    /// Joint Stereo
    JointStereo,

    /// Dual Channel
    DualChannel,

    /// Single channel (mono)
    Mono,
}

/// Indexed by `ChannelMode`
const MODES: [Mode; 4] = [Mode::Stereo, Mode::JointStereo, Mode::DualChannel, Mode::Mono];

/// De-emphasis that should be applied after decoding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Emphasis {
    /// None
    None,

    /// 50/15 ms
    FiftyFifteenMs,

    /// Reserved
    Reserved,

    /// CCITT J.17
    CcittJ17,
}

/// Indexed by `Emphasis`
const EMPHASES: [Emphasis; 4] = [
    Emphasis::None,
    Emphasis::FiftyFifteenMs,
    Emphasis::Reserved,
    Emphasis::CcittJ17,
];

// Indices: VersionIndex, SamplingRateFreqIndex (index 3 is reserved)
static SAMPLE_RATES_HZ: [[u32; 3]; 4] = [
    [11025, 12000, 8000],  // Mpeg25
    [0, 0, 0],             // reserved
    [22050, 24000, 16000], // Mpeg2
    [44100, 48000, 32000], // Mpeg1
];

// Indices: VersionIndex, LayerIndex
const SAMPLE_COUNTS: [[u32; 4]; 4] = [
    // reserved, Layer3, Layer2, Layer1
    [0, 576, 1152, 384],  // Mpeg25
    [0, 0, 0, 0],         // reserved
    [0, 576, 1152, 384],  // Mpeg2
    [0, 1152, 1152, 384], // Mpeg1
];

// Index: LayerIndex
const SLOT_SIZES: [u32; 4] = [
    0, // reserved
    1, // Layer3
    1, // Layer2
    4, // Layer1
];

// Indices: BitrateIndex, VersionIndex, LayerIndex
//
// Index 15 is not allowed and has no row.
static BIT_RATES_KBPS: [[[u32; 4]; 4]; 15] = [
    // Mpeg25 (-, L3, L2, L1)    reserved      Mpeg2 (-, L3, L2, L1)     Mpeg1 (-, L3, L2, L1)
    [[0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]], // free
    [[0, 8, 8, 32], [0, 0, 0, 0], [0, 8, 8, 32], [0, 32, 32, 32]],
    [[0, 16, 16, 48], [0, 0, 0, 0], [0, 16, 16, 48], [0, 40, 48, 64]],
    [[0, 24, 24, 56], [0, 0, 0, 0], [0, 24, 24, 56], [0, 48, 56, 96]],
    [[0, 32, 32, 64], [0, 0, 0, 0], [0, 32, 32, 64], [0, 56, 64, 128]],
    [[0, 40, 40, 80], [0, 0, 0, 0], [0, 40, 40, 80], [0, 64, 80, 160]],
    [[0, 48, 48, 96], [0, 0, 0, 0], [0, 48, 48, 96], [0, 80, 96, 192]],
    [[0, 56, 56, 112], [0, 0, 0, 0], [0, 56, 56, 112], [0, 96, 112, 224]],
    [[0, 64, 64, 128], [0, 0, 0, 0], [0, 64, 64, 128], [0, 112, 128, 256]],
    [[0, 80, 80, 144], [0, 0, 0, 0], [0, 80, 80, 144], [0, 128, 160, 288]],
    [[0, 96, 96, 160], [0, 0, 0, 0], [0, 96, 96, 160], [0, 160, 192, 320]],
    [[0, 112, 112, 176], [0, 0, 0, 0], [0, 112, 112, 176], [0, 192, 224, 352]],
    [[0, 128, 128, 192], [0, 0, 0, 0], [0, 128, 128, 192], [0, 224, 256, 384]],
    [[0, 144, 144, 224], [0, 0, 0, 0], [0, 144, 144, 224], [0, 256, 320, 416]],
    [[0, 160, 160, 256], [0, 0, 0, 0], [0, 160, 160, 256], [0, 320, 384, 448]],
];

/// A single MPEG audio frame header
///
/// Wraps the 32-bit header word exactly as it appears in the stream.
/// The field accessors return meaningless values unless the header
/// is valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    word: u32,
}

impl FrameHeader {
    /// Wrap a header word
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        Self { word }
    }

    /// Decode 4 bytes in stream (big-endian) order
    #[must_use]
    pub const fn from_bytes(bytes: [u8; FRAME_HEADER_SIZE]) -> Self {
        Self::from_word(u32::from_be_bytes(bytes))
    }

    /// Decode the first 4 bytes of `bytes`
    ///
    /// Returns `None` if fewer than 4 bytes are available.
    #[must_use]
    pub fn read(bytes: &[u8]) -> Option<Self> {
        let header_bytes = bytes.get(..FRAME_HEADER_SIZE)?;
        header_bytes.try_into().ok().map(Self::from_bytes)
    }

    /// The raw header word
    #[must_use]
    pub const fn word(&self) -> u32 {
        self.word
    }

    const fn extract(&self, field: Field) -> u32 {
        let (shift, mask) = field.layout();
        (self.word >> shift) & mask
    }

    const fn version_index(&self) -> usize {
        self.extract(Field::VersionIndex) as usize
    }

    const fn layer_index(&self) -> usize {
        self.extract(Field::LayerIndex) as usize
    }

    const fn bitrate_index(&self) -> usize {
        self.extract(Field::BitrateIndex) as usize
    }

    const fn sample_rate_index(&self) -> usize {
        self.extract(Field::SamplingRateFreqIndex) as usize
    }

    /// Checks the frame sync and rejects all reserved and unsupported indices
    ///
    /// The free bitrate (index 0) is rejected, because the frame size
    /// could not be calculated from the header.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.extract(Field::FrameSync) == FRAME_SYNC
            && self.extract(Field::VersionIndex) != VERSION_INDEX_RESERVED
            && self.extract(Field::LayerIndex) != LAYER_INDEX_RESERVED
            && self.extract(Field::BitrateIndex) != BITRATE_INDEX_FREE
            && self.extract(Field::BitrateIndex) != BITRATE_INDEX_BAD
            && self.extract(Field::SamplingRateFreqIndex) != SAMPLING_RATE_FREQ_INDEX_RESERVED
    }

    /// MPEG version or `None` if reserved
    #[must_use]
    pub const fn version(&self) -> Option<Version> {
        VERSIONS[self.version_index()]
    }

    /// MPEG layer or `None` if reserved
    #[must_use]
    pub const fn layer(&self) -> Option<Layer> {
        LAYERS[self.layer_index()]
    }

    /// Channel mode
    #[must_use]
    pub const fn mode(&self) -> Mode {
        MODES[self.extract(Field::ChannelMode) as usize]
    }

    /// Emphasis
    #[must_use]
    pub const fn emphasis(&self) -> Emphasis {
        EMPHASES[self.extract(Field::Emphasis) as usize]
    }

    /// Number of channels, i.e. 1 for mono and 2 otherwise
    #[must_use]
    pub const fn channel_count(&self) -> u8 {
        match self.mode() {
            Mode::Stereo | Mode::JointStereo | Mode::DualChannel => 2,
            Mode::Mono => 1,
        }
    }

    /// Bitrate in kbps or 0 for free and invalid bitrates
    #[must_use]
    pub fn bitrate_kbps(&self) -> u32 {
        BIT_RATES_KBPS
            .get(self.bitrate_index())
            .map_or(0, |by_version| {
                by_version[self.version_index()][self.layer_index()]
            })
    }

    /// Bitrate in bits/sec or 0 for free and invalid bitrates
    #[must_use]
    pub fn bitrate_bps(&self) -> u32 {
        self.bitrate_kbps() * BITS_PER_KILOBIT
    }

    /// Sample rate in Hz or 0 if reserved
    #[must_use]
    pub fn sample_rate_hz(&self) -> u32 {
        SAMPLE_RATES_HZ[self.version_index()]
            .get(self.sample_rate_index())
            .copied()
            .unwrap_or(0)
    }

    /// Number of samples per channel in this frame
    #[must_use]
    pub const fn sample_count(&self) -> u32 {
        SAMPLE_COUNTS[self.version_index()][self.layer_index()]
    }

    /// Size of a slot in bytes: 4 for Layer I, 1 for Layer II/III
    #[must_use]
    pub const fn slot_size(&self) -> u32 {
        SLOT_SIZES[self.layer_index()]
    }

    /// The total size of the frame in bytes, including this header
    ///
    /// This is the distance to the next frame header. The padding adds
    /// one slot, i.e. 4 bytes for Layer I. Returns `None` for invalid
    /// headers.
    #[must_use]
    pub fn frame_bytes(&self) -> Option<u32> {
        if !self.is_valid() {
            return None;
        }
        let slot_size = self.slot_size();
        let slots_per_bitrate_unit = self.sample_count() / BITS_PER_BYTE / slot_size;
        let slots =
            (slots_per_bitrate_unit * self.bitrate_bps()).checked_div(self.sample_rate_hz())?;
        let padding_bytes = if self.has_padding() { slot_size } else { 0 };
        Some(slots + padding_bytes)
    }

    /// Playback duration of this frame in seconds or `None` for invalid headers
    #[must_use]
    pub fn frame_duration_secs(&self) -> Option<f64> {
        if !self.is_valid() {
            return None;
        }
        Some(f64::from(self.sample_count()) / f64::from(self.sample_rate_hz()))
    }

    /// Playback duration of this frame or `None` for invalid headers
    ///
    /// Truncated to whole nanoseconds. Summing up these durations drifts
    /// from the sum of [`FrameHeader::frame_duration_secs`].
    #[must_use]
    pub fn frame_duration(&self) -> Option<Duration> {
        if !self.is_valid() {
            return None;
        }
        let nanos = u64::from(self.sample_count()) * 1_000_000_000
            / u64::from(self.sample_rate_hz());
        Some(Duration::from_nanos(nanos))
    }

    /// A 16-bit CRC follows the header
    #[must_use]
    pub const fn protected_by_crc(&self) -> bool {
        // The bit is cleared if protected
        self.extract(Field::ProtectionBit) == 0
    }

    /// The frame is padded with an extra slot
    #[must_use]
    pub const fn has_padding(&self) -> bool {
        self.extract(Field::PaddingBit) != 0
    }

    /// Intensity stereo, only meaningful for [`Mode::JointStereo`]
    #[must_use]
    pub const fn is_intensity_stereo_on(&self) -> bool {
        self.extract(Field::ModeExtension) & 0b01 != 0
    }

    /// MS stereo, only meaningful for [`Mode::JointStereo`]
    #[must_use]
    pub const fn is_ms_stereo_on(&self) -> bool {
        self.extract(Field::ModeExtension) & 0b10 != 0
    }

    /// Copyright flag
    #[must_use]
    pub const fn is_copyrighted(&self) -> bool {
        self.extract(Field::Copyright) != 0
    }

    /// Original media flag
    #[must_use]
    pub const fn is_original(&self) -> bool {
        self.extract(Field::Original) != 0
    }

    /// Valid MPEG-1 Layer III frame, i.e. what is commonly called MP3
    #[must_use]
    pub fn is_mpeg1_layer3(&self) -> bool {
        self.is_valid()
            && self.version() == Some(Version::Mpeg1)
            && self.layer() == Some(Layer::Layer3)
    }
}
