//! IVF/VP8/VP9 reader (§4.7 "Dirac/VP8/VP9", §4.12 scenario 2, §6.6 IVF
//! container): 32-byte file header, then 12-byte frame headers prefixing
//! each raw VPx frame.

use bytes::Bytes;

use crate::memory::MemoryBuffer;
use crate::packetizer::{Packetizer, RawFrame};
use crate::reader::{FileStatus, Reader, ReaderError, TrackInfo};

const IVF_HEADER_LEN: usize = 32;
const FRAME_HEADER_LEN: usize = 12;

pub struct IvfHeader {
    pub codec_fourcc: [u8; 4],
    pub width: u16,
    pub height: u16,
    pub fps_num: u32,
    pub fps_den: u32,
    pub frame_count: u32,
}

fn parse_ivf_header(data: &[u8]) -> Option<IvfHeader> {
    if data.len() < IVF_HEADER_LEN || &data[0..4] != b"DKIF" {
        return None;
    }

    let header_size = u16::from_le_bytes([data[6], data[7]]) as usize;
    let codec_fourcc = [data[8], data[9], data[10], data[11]];
    let width = u16::from_le_bytes([data[12], data[13]]);
    let height = u16::from_le_bytes([data[14], data[15]]);
    let fps_num = u32::from_le_bytes([data[16], data[17], data[18], data[19]]);
    let fps_den = u32::from_le_bytes([data[20], data[21], data[22], data[23]]);
    let frame_count = u32::from_le_bytes([data[24], data[25], data[26], data[27]]);

    if header_size < IVF_HEADER_LEN {
        return None;
    }

    Some(IvfHeader {
        codec_fourcc,
        width,
        height,
        fps_num,
        fps_den,
        frame_count,
    })
}

pub struct IvfReader {
    data: Bytes,
    pos: usize,
    header: IvfHeader,
    last_timecode_ns: Option<i64>,
}

impl IvfReader {
    pub fn new(data: Bytes) -> Result<Self, ReaderError> {
        let header = parse_ivf_header(&data).ok_or_else(|| ReaderError::Malformed("bad IVF header".to_string()))?;
        Ok(IvfReader {
            data,
            pos: IVF_HEADER_LEN,
            header,
            last_timecode_ns: None,
        })
    }

    pub fn codec_id(&self) -> &'static str {
        match &self.header.codec_fourcc {
            b"VP80" => "V_VP8",
            b"VP90" => "V_VP9",
            _ => "V_VP8",
        }
    }

    pub fn width(&self) -> u64 {
        self.header.width as u64
    }

    pub fn height(&self) -> u64 {
        self.header.height as u64
    }

    /// Nanoseconds per `timestamp` unit (§6.6: timestamps are in
    /// frame-rate-denominator units).
    fn ns_per_unit(&self) -> f64 {
        if self.header.fps_num == 0 {
            0.0
        } else {
            1_000_000_000.0 * self.header.fps_den as f64 / self.header.fps_num as f64
        }
    }
}

/// Bit 0 of the first payload byte is 0 for a VP8/VP9 key frame.
fn is_keyframe(payload: &[u8]) -> bool {
    payload.first().map(|b| b & 0x01 == 0).unwrap_or(false)
}

impl Reader for IvfReader {
    fn read_headers(&mut self) -> Result<Vec<TrackInfo>, ReaderError> {
        Ok(vec![TrackInfo {
            track_id: 1,
            codec_id: self.codec_id().to_string(),
            name: None,
            language: None,
        }])
    }

    fn identify(&self) -> Vec<String> {
        vec![format!(
            "Track ID 1: video ({}) [{}x{}]",
            self.codec_id(),
            self.header.width,
            self.header.height
        )]
    }

    fn read(&mut self, packetizer: &mut dyn Packetizer, force: bool) -> Result<FileStatus, ReaderError> {
        let _ = force;
        if self.pos + FRAME_HEADER_LEN > self.data.len() {
            return Ok(FileStatus::Done);
        }

        let frame_size = u32::from_le_bytes([
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
        ]) as usize;
        let timestamp_units = u64::from_le_bytes([
            self.data[self.pos + 4],
            self.data[self.pos + 5],
            self.data[self.pos + 6],
            self.data[self.pos + 7],
            self.data[self.pos + 8],
            self.data[self.pos + 9],
            self.data[self.pos + 10],
            self.data[self.pos + 11],
        ]);

        let payload_start = self.pos + FRAME_HEADER_LEN;
        let payload_end = payload_start + frame_size;
        if payload_end > self.data.len() {
            return Ok(FileStatus::Done);
        }

        let payload_bytes = self.data.slice(payload_start..payload_end);
        let keyframe = is_keyframe(&payload_bytes);
        let timecode_ns = (timestamp_units as f64 * self.ns_per_unit()).round() as i64;

        let mut frame = RawFrame::new(MemoryBuffer::from_bytes(payload_bytes), timecode_ns);
        frame.keyframe = keyframe;
        // bref chaining (§4.7 "VPX": "bref=previous frame timecode for
        // non-keys") is the VPX packetizer's responsibility, since it is
        // the one tracking the previous frame's assigned timecode.
        packetizer.process(frame)?;

        self.pos = payload_end;
        self.last_timecode_ns = Some(timecode_ns);

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

    fn ivf_header(fourcc: &[u8; 4], width: u16, height: u16, fps_num: u32, fps_den: u32, frames: u32) -> Vec<u8> {
        let mut h = Vec::with_capacity(IVF_HEADER_LEN);
        h.extend_from_slice(b"DKIF");
        h.extend_from_slice(&0u16.to_le_bytes()); // version
        h.extend_from_slice(&32u16.to_le_bytes()); // header size
        h.extend_from_slice(fourcc);
        h.extend_from_slice(&width.to_le_bytes());
        h.extend_from_slice(&height.to_le_bytes());
        h.extend_from_slice(&fps_num.to_le_bytes());
        h.extend_from_slice(&fps_den.to_le_bytes());
        h.extend_from_slice(&frames.to_le_bytes());
        h.extend_from_slice(&0u32.to_le_bytes()); // unused
        h
    }

    fn ivf_frame(data: &[u8], timestamp: u64) -> Vec<u8> {
        let mut f = Vec::new();
        f.extend_from_slice(&(data.len() as u32).to_le_bytes());
        f.extend_from_slice(&timestamp.to_le_bytes());
        f.extend_from_slice(data);
        f
    }

    #[test]
    fn parses_header_fields() {
        let mut data = ivf_header(b"VP80", 640, 480, 30000, 1001, 60);
        data.extend_from_slice(&ivf_frame(&[0x10], 0));

        let reader = IvfReader::new(Bytes::from(data)).unwrap();
        assert_eq!(reader.codec_id(), "V_VP8");
        assert_eq!(reader.width(), 640);
        assert_eq!(reader.height(), 480);
    }

    #[test]
    fn frame_duration_matches_30000_1001_fps() {
        let mut data = ivf_header(b"VP80", 640, 480, 30000, 1001, 2);
        data.extend_from_slice(&ivf_frame(&[0x10], 0));
        data.extend_from_slice(&ivf_frame(&[0x11], 1001));

        let mut reader = IvfReader::new(Bytes::from(data)).unwrap();
        assert_eq!((1001f64 * reader.ns_per_unit()).round() as i64, 33_366_666);
    }

    #[test]
    fn keyframe_bit_is_zero_for_key_frames() {
        assert!(is_keyframe(&[0x10]));
        assert!(!is_keyframe(&[0x11]));
    }
}
