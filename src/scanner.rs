use log::{debug, trace};

use crate::{
    frame::{FrameHeader, FRAME_SYNC_LEAD_BYTE},
    ScanConfig,
};

/// Decode the header at `offset` if it starts with the sync lead byte
fn header_at(buffer: &[u8], offset: usize) -> Option<FrameHeader> {
    let bytes = buffer.get(offset..)?;
    if bytes.first() != Some(&FRAME_SYNC_LEAD_BYTE) {
        return None;
    }
    FrameHeader::read(bytes)
}

/// Start offset after applying the hint
///
/// A hint that is not strictly less than the buffer length is ignored.
pub(crate) fn start_offset(buffer_len: usize, offset_hint: u64) -> usize {
    match usize::try_from(offset_hint) {
        Ok(offset) if offset < buffer_len => offset,
        _ => {
            if offset_hint > 0 {
                debug!(
                    "Ignoring offset hint {} beyond buffer length {}",
                    offset_hint, buffer_len
                );
            }
            0
        }
    }
}

/// The first frame of a confirmed MPEG-1 Layer III stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SyncPoint {
    pub(crate) offset: usize,
    pub(crate) header: FrameHeader,
}

/// Search for consecutive MPEG-1 Layer III frames
///
/// Scans at most `config.sync_search_limit` bytes starting at `start`.
/// After each match the cursor jumps to where the next frame should
/// begin. If no header is found there the search continues byte by byte.
/// Returns the first match once `config.min_sync_frames` matches have been
/// counted.
pub(crate) fn find_sync(buffer: &[u8], start: usize, config: &ScanConfig) -> Option<SyncPoint> {
    let end = buffer
        .len()
        .min(start.saturating_add(config.sync_search_limit));
    let mut first_match = None;
    let mut match_count = 0u32;
    let mut cursor = start;
    while cursor < end {
        let Some(header) = header_at(buffer, cursor).filter(FrameHeader::is_mpeg1_layer3) else {
            cursor += 1;
            continue;
        };
        if first_match.is_none() {
            first_match = Some(SyncPoint {
                offset: cursor,
                header,
            });
        }
        match_count += 1;
        trace!("MPEG-1 Layer III frame #{} at offset {}", match_count, cursor);
        if match_count >= config.min_sync_frames {
            break;
        }
        let frame_bytes = header.frame_bytes().unwrap_or(1).max(1);
        cursor = cursor.saturating_add(frame_bytes as usize);
    }
    if match_count < config.min_sync_frames.max(1) {
        debug!(
            "No MPEG audio: found {} of {} required frames within {} bytes",
            match_count,
            config.min_sync_frames,
            end - start.min(end)
        );
        return None;
    }
    debug_assert!(first_match.is_some());
    if let Some(sync_point) = &first_match {
        debug!(
            "Found MPEG audio at offset {} after {} frames",
            sync_point.offset, match_count
        );
    }
    first_match
}

/// Iterator over all valid frames from a start offset until the end of the buffer
///
/// Yields the offset and header of each frame. Bytes that do not start a
/// valid header are skipped one at a time. Any MPEG version and layer is
/// accepted here, not only MPEG-1 Layer III.
#[derive(Debug, Clone)]
pub struct FrameChain<'b> {
    buffer: &'b [u8],
    cursor: usize,
}

impl<'b> FrameChain<'b> {
    /// Start walking the frames of `buffer` at `offset`
    #[must_use]
    pub const fn new(buffer: &'b [u8], offset: usize) -> Self {
        Self {
            buffer,
            cursor: offset,
        }
    }
}

impl Iterator for FrameChain<'_> {
    type Item = (usize, FrameHeader);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.buffer.len() {
            let offset = self.cursor;
            if let Some(header) = header_at(self.buffer, offset) {
                if let Some(frame_bytes) = header.frame_bytes() {
                    debug_assert!(frame_bytes > 0);
                    self.cursor = offset.saturating_add(frame_bytes as usize);
                    return Some((offset, header));
                }
            }
            self.cursor += 1;
        }
        None
    }
}

/// Totals of all frames in a [`FrameChain`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct FrameTotals {
    pub(crate) frame_count: u64,
    pub(crate) duration_secs: f64,
}

pub(crate) fn accumulate_frames(frames: FrameChain<'_>) -> FrameTotals {
    let totals = frames.fold(FrameTotals::default(), |mut totals, (_, header)| {
        totals.frame_count += 1;
        totals.duration_secs += header.frame_duration_secs().unwrap_or_default();
        totals
    });
    debug!(
        "Counted {} frames with a total duration of {:.3} s",
        totals.frame_count, totals.duration_secs
    );
    totals
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::frame::tests::header_word;

    /// 128 kbps, 44.1 kHz, stereo, no padding
    pub(crate) const MP3_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];
    pub(crate) const MP3_FRAME_BYTES: usize = 417;

    pub(crate) fn frame(header: [u8; 4]) -> Vec<u8> {
        let frame_bytes = FrameHeader::from_bytes(header).frame_bytes().unwrap() as usize;
        let mut frame = vec![0u8; frame_bytes];
        frame[..4].copy_from_slice(&header);
        frame
    }

    pub(crate) fn mp3_frames(count: usize) -> Vec<u8> {
        frame(MP3_HEADER).repeat(count)
    }

    /// Self-check of the frame chain
    ///
    /// Every valid header in the walked range must either start a frame
    /// or be covered by the previous frame.
    fn assert_no_missed_frames(buffer: &[u8], start: usize) {
        let frames: Vec<_> = FrameChain::new(buffer, start).collect();
        let mut covered_until = start;
        let mut frames_iter = frames.iter().peekable();
        for offset in start..buffer.len() {
            if let Some((frame_offset, header)) = frames_iter.peek() {
                if *frame_offset == offset {
                    covered_until = offset + header.frame_bytes().unwrap() as usize;
                    frames_iter.next();
                    continue;
                }
            }
            if offset >= covered_until {
                assert!(
                    !header_at(buffer, offset).is_some_and(|header| header.is_valid()),
                    "missed frame at offset {}",
                    offset
                );
            }
        }
    }

    #[test]
    fn start_offset_ignores_out_of_range_hint() {
        assert_eq!(0, start_offset(10, 0));
        assert_eq!(9, start_offset(10, 9));
        assert_eq!(0, start_offset(10, 10));
        assert_eq!(0, start_offset(10, u64::MAX));
        assert_eq!(0, start_offset(0, 0));
    }

    #[test]
    fn find_sync_after_garbage() {
        let mut buffer = vec![0x12; 100];
        buffer.extend(mp3_frames(3));
        let sync_point = find_sync(&buffer, 0, &ScanConfig::DEFAULT).unwrap();
        assert_eq!(100, sync_point.offset);
        assert_eq!(FrameHeader::from_bytes(MP3_HEADER), sync_point.header);
    }

    #[test]
    fn find_sync_requires_min_frames() {
        let buffer = mp3_frames(2);
        assert_eq!(None, find_sync(&buffer, 0, &ScanConfig::DEFAULT));
        let config = ScanConfig {
            min_sync_frames: 2,
            ..ScanConfig::DEFAULT
        };
        assert_eq!(0, find_sync(&buffer, 0, &config).unwrap().offset);
    }

    #[test]
    fn find_sync_recovers_from_spurious_match() {
        // A lone header that is not followed by another frame
        let mut buffer = MP3_HEADER.to_vec();
        buffer.resize(500, 0);
        buffer.extend(mp3_frames(3));
        // The jump after the lone header lands on zeros and the search
        // continues byte by byte. The first match is kept.
        let sync_point = find_sync(&buffer, 0, &ScanConfig::DEFAULT).unwrap();
        assert_eq!(0, sync_point.offset);
        assert_eq!(
            499,
            find_sync(&buffer[1..], 0, &ScanConfig::DEFAULT)
                .unwrap()
                .offset
        );
    }

    #[test]
    fn find_sync_ignores_other_versions_and_layers() {
        let mpeg2_layer3 = header_word(0b10, 0b01, 9, 0, false).to_be_bytes();
        let mpeg1_layer2 = header_word(0b11, 0b10, 9, 0, false).to_be_bytes();
        let mut buffer = frame(mpeg2_layer3).repeat(3);
        buffer.extend(frame(mpeg1_layer2).repeat(3));
        assert_eq!(None, find_sync(&buffer, 0, &ScanConfig::DEFAULT));
    }

    #[test]
    fn find_sync_respects_search_limit() {
        let mut buffer = vec![0; 1000];
        buffer.extend(mp3_frames(3));
        // All matching headers must start within the limit
        let config = ScanConfig {
            sync_search_limit: 1000 + 2 * MP3_FRAME_BYTES,
            ..ScanConfig::DEFAULT
        };
        assert_eq!(None, find_sync(&buffer, 0, &config));
        // The limit is relative to the start offset
        assert_eq!(1000, find_sync(&buffer, 1, &config).unwrap().offset);
    }

    #[test]
    fn find_sync_in_short_buffers() {
        assert_eq!(None, find_sync(&[], 0, &ScanConfig::DEFAULT));
        assert_eq!(None, find_sync(&MP3_HEADER, 0, &ScanConfig::DEFAULT));
        assert_eq!(None, find_sync(&MP3_HEADER[..3], 0, &ScanConfig::DEFAULT));
    }

    #[test]
    fn frame_chain_yields_offsets() {
        let buffer = mp3_frames(4);
        let offsets: Vec<_> = FrameChain::new(&buffer, 0)
            .map(|(offset, _)| offset)
            .collect();
        assert_eq!(
            vec![0, MP3_FRAME_BYTES, 2 * MP3_FRAME_BYTES, 3 * MP3_FRAME_BYTES],
            offsets
        );
        assert_no_missed_frames(&buffer, 0);
    }

    #[test]
    fn frame_chain_skips_junk_between_frames() {
        let mut buffer = mp3_frames(2);
        buffer.extend([0xFF, 0xFF, 0x00, 0xFF, 0xFB]);
        buffer.extend(mp3_frames(2));
        let frames: Vec<_> = FrameChain::new(&buffer, 0).collect();
        assert_eq!(4, frames.len());
        assert_eq!(2 * MP3_FRAME_BYTES + 5, frames[2].0);
        assert_no_missed_frames(&buffer, 0);
    }

    #[test]
    fn frame_chain_counts_any_valid_header() {
        let mpeg2_layer3 = header_word(0b10, 0b01, 9, 0, false).to_be_bytes();
        let mut buffer = mp3_frames(3);
        buffer.extend(frame(mpeg2_layer3).repeat(2));
        let totals = accumulate_frames(FrameChain::new(&buffer, 0));
        assert_eq!(5, totals.frame_count);
        let expected_secs = 3.0 * 1152.0 / 44100.0 + 2.0 * 576.0 / 22050.0;
        assert!((totals.duration_secs - expected_secs).abs() < 1e-9);
        assert_no_missed_frames(&buffer, 0);
    }

    #[test]
    fn frame_chain_advances_by_layer1_frame_bytes() {
        // 12 bytes per frame, 16 bytes if padded
        let layer1 = header_word(0b11, 0b11, 1, 2, false).to_be_bytes();
        let layer1_padded = header_word(0b11, 0b11, 1, 2, true).to_be_bytes();
        let mut buffer = mp3_frames(3);
        buffer.extend(frame(layer1).repeat(2));
        buffer.extend(frame(layer1_padded).repeat(2));
        let offsets: Vec<_> = FrameChain::new(&buffer, 0)
            .map(|(offset, _)| offset)
            .collect();
        let layer1_start = 3 * MP3_FRAME_BYTES;
        assert_eq!(
            vec![
                0,
                MP3_FRAME_BYTES,
                2 * MP3_FRAME_BYTES,
                layer1_start,
                layer1_start + 12,
                layer1_start + 24,
                layer1_start + 40,
            ],
            offsets
        );
        let totals = accumulate_frames(FrameChain::new(&buffer, 0));
        assert_eq!(7, totals.frame_count);
        let expected_secs = 3.0 * 1152.0 / 44100.0 + 4.0 * 384.0 / 32000.0;
        assert!((totals.duration_secs - expected_secs).abs() < 1e-9);
        assert_no_missed_frames(&buffer, 0);
    }

    #[test]
    fn frame_chain_counts_truncated_last_frame() {
        let mut buffer = mp3_frames(3);
        buffer.truncate(2 * MP3_FRAME_BYTES + 4);
        assert_eq!(3, FrameChain::new(&buffer, 0).count());
        buffer.truncate(2 * MP3_FRAME_BYTES + 3);
        assert_eq!(2, FrameChain::new(&buffer, 0).count());
    }
}
