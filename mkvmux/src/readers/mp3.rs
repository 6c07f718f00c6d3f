//! MP3 reader (§4.7 "MP3", §4.12 scenario 4): frame sync/resync over a
//! sliding window, ID3v1/v2 and TAG block skipping, and a 5-consecutive-
//! header trust threshold before packets are emitted.

use bytes::Bytes;

use crate::memory::MemoryBuffer;
use crate::packetizer::{Packetizer, RawFrame};
use crate::reader::{FileStatus, Reader, ReaderError, TrackInfo};

const REQUIRED_CONSECUTIVE_HEADERS: u32 = 5;

// MPEG-1 Layer III bitrates in kbps; index 0 is "free", 15 is reserved.
const MPEG1_LAYER3_BITRATES: [u32; 16] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0,
];
const SAMPLE_RATES_MPEG1: [u32; 3] = [44100, 48000, 32000];

#[derive(Debug, Clone, Copy)]
struct Mp3Header {
    frame_size: usize,
    sample_rate: u32,
    channels: u8,
}

fn parse_mp3_header(data: &[u8]) -> Option<Mp3Header> {
    if data.len() < 4 {
        return None;
    }
    if data[0] != 0xFF || (data[1] & 0xE0) != 0xE0 {
        return None;
    }

    let version = (data[1] >> 3) & 0x03; // 3 = MPEG-1
    let layer = (data[1] >> 1) & 0x03; // 1 = Layer III
    if version != 0x03 || layer != 0x01 {
        return None; // only MPEG-1 Layer III is modeled here.
    }

    let bitrate_index = (data[2] >> 4) & 0x0F;
    let sample_rate_index = (data[2] >> 2) & 0x03;
    let padding = (data[2] >> 1) & 0x01;
    let channel_mode = (data[3] >> 6) & 0x03;

    if bitrate_index == 0 || bitrate_index == 0x0F || sample_rate_index == 0x03 {
        return None;
    }

    let bitrate_kbps = MPEG1_LAYER3_BITRATES[bitrate_index as usize];
    let sample_rate = SAMPLE_RATES_MPEG1[sample_rate_index as usize];
    let frame_size = (144 * bitrate_kbps * 1000 / sample_rate) as usize + padding as usize;
    let channels = if channel_mode == 0x03 { 1 } else { 2 };

    if frame_size < 4 {
        return None;
    }

    Some(Mp3Header {
        frame_size,
        sample_rate,
        channels,
    })
}

fn skip_tag_blocks(data: &[u8], mut pos: usize) -> usize {
    if data[pos..].starts_with(b"ID3") && data.len() >= pos + 10 {
        let size = ((data[pos + 6] as u32 & 0x7F) << 21)
            | ((data[pos + 7] as u32 & 0x7F) << 14)
            | ((data[pos + 8] as u32 & 0x7F) << 7)
            | (data[pos + 9] as u32 & 0x7F);
        pos += 10 + size as usize;
    }
    if data[pos..].starts_with(b"TAG") {
        pos += 128;
    }
    pos
}

pub struct Mp3Reader {
    data: Bytes,
    pos: usize,
    sample_rate: u32,
    channels: u8,
    frames_read: u64,
    /// Accumulated timecode offset when appended as the tail of another
    /// MP3 source (§4.7 "Appending").
    base_timecode_ns: i64,
}

impl Mp3Reader {
    pub fn new(data: Bytes) -> Self {
        Mp3Reader {
            data,
            pos: 0,
            sample_rate: 0,
            channels: 0,
            frames_read: 0,
            base_timecode_ns: 0,
        }
    }

    pub fn set_base_timecode_ns(&mut self, ns: i64) {
        self.base_timecode_ns = ns;
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    fn find_sync(&self) -> Option<(usize, Mp3Header)> {
        let mut pos = skip_tag_blocks(&self.data, self.pos);
        while pos + 4 <= self.data.len() {
            if let Some(header) = parse_mp3_header(&self.data[pos..]) {
                // Require a consistent chain of REQUIRED_CONSECUTIVE_HEADERS
                // parseable frames before trusting the sync point.
                let mut verify_pos = pos;
                let mut ok = true;
                for _ in 0..REQUIRED_CONSECUTIVE_HEADERS {
                    match self.data.get(verify_pos..).and_then(parse_mp3_header) {
                        Some(h) => verify_pos += h.frame_size,
                        None => {
                            ok = verify_pos >= self.data.len();
                            break;
                        }
                    }
                }
                if ok {
                    return Some((pos, header));
                }
            }
            pos += 1;
        }
        None
    }

    fn duration_ns(&self, frame_size: usize, sample_rate: u32) -> i64 {
        let _ = frame_size;
        // MPEG-1 Layer III: 1152 samples/frame.
        if sample_rate == 0 {
            0
        } else {
            (1152i64 * 1_000_000_000) / sample_rate as i64
        }
    }
}

impl Reader for Mp3Reader {
    fn read_headers(&mut self) -> Result<Vec<TrackInfo>, ReaderError> {
        let (pos, header) = self
            .find_sync()
            .ok_or_else(|| ReaderError::Malformed("no MP3 sync found".to_string()))?;
        self.pos = pos;
        self.sample_rate = header.sample_rate;
        self.channels = header.channels;

        Ok(vec![TrackInfo {
            track_id: 1,
            codec_id: "A_MPEG/L3".to_string(),
            name: None,
            language: None,
        }])
    }

    fn identify(&self) -> Vec<String> {
        vec![format!(
            "Track ID 1: audio (A_MPEG/L3) [{}Hz, {}ch]",
            self.sample_rate, self.channels
        )]
    }

    fn read(&mut self, packetizer: &mut dyn Packetizer, force: bool) -> Result<FileStatus, ReaderError> {
        let _ = force;
        let Some(header) = self.data.get(self.pos..).and_then(parse_mp3_header) else {
            // Resync over stray bytes rather than aborting the file.
            match self.find_sync() {
                Some((pos, _)) => {
                    self.pos = pos;
                }
                None => return Ok(FileStatus::Done),
            }
            return Ok(FileStatus::MoreData);
        };

        let end = self.pos + header.frame_size;
        if end > self.data.len() {
            return Ok(FileStatus::Done);
        }

        let payload = MemoryBuffer::from_bytes(self.data.slice(self.pos..end));
        let duration = self.duration_ns(header.frame_size, header.sample_rate);
        let timecode_ns = self.base_timecode_ns + (self.frames_read as i64) * duration;

        let mut frame = RawFrame::new(payload, timecode_ns);
        frame.duration_ns = Some(duration);
        packetizer.process(frame)?;

        self.pos = end;
        self.frames_read += 1;

        if self.pos >= self.data.len() {
            Ok(FileStatus::Done)
        } else {
            Ok(FileStatus::MoreData)
        }
    }

    fn get_progress(&self) -> u8 {
        if self.data.is_empty() {
            100
        } else {
            ((self.pos * 100) / self.data.len()) as u8
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn mp3_frame(bitrate_index: u8, sample_rate_index: u8) -> Vec<u8> {
        let byte2 = (bitrate_index << 4) | (sample_rate_index << 2);
        let header = [0xFFu8, 0xFB, byte2, 0xC0];
        let h = parse_mp3_header(&header).unwrap();
        let mut frame = header.to_vec();
        frame.resize(h.frame_size, 0);
        frame
    }

    fn stream(frames: usize) -> Bytes {
        let mut data = Vec::new();
        for _ in 0..frames {
            data.extend_from_slice(&mp3_frame(9, 0)); // 128kbps/44100Hz
        }
        Bytes::from(data)
    }

    #[test]
    fn header_parses_frame_size_and_rate() {
        let frame = mp3_frame(9, 0);
        let header = parse_mp3_header(&frame).unwrap();
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.frame_size, 417);
    }

    #[test]
    fn reader_requires_five_consecutive_headers_before_trusting_sync() {
        let mut reader = Mp3Reader::new(stream(6));
        let tracks = reader.read_headers().unwrap();
        assert_eq!(tracks[0].codec_id, "A_MPEG/L3");
        assert_eq!(reader.pos, 0);
    }

    #[test]
    fn skips_leading_id3_tag() {
        let mut data = b"ID3".to_vec();
        data.extend_from_slice(&[0x03, 0x00, 0x00, 0, 0, 0, 10]);
        data.extend_from_slice(&[0u8; 10]);
        data.extend_from_slice(&stream(6));

        let mut reader = Mp3Reader::new(Bytes::from(data));
        reader.read_headers().unwrap();
        assert_eq!(&reader.data[reader.pos..reader.pos + 2], &[0xFF, 0xFB]);
    }
}
