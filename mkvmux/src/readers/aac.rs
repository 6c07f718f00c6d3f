//! ADTS AAC reader (§4.7 "AAC"): strips each ADTS header, surfaces the
//! sampling rate/channel config as a synthesized AudioSpecificConfig,
//! and emits one frame per ADTS block.

use bytes::Bytes;

use crate::memory::MemoryBuffer;
use crate::packetizer::{Packetizer, RawFrame};
use crate::reader::{FileStatus, Reader, ReaderError, TrackInfo};

const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

const SAMPLES_PER_FRAME: u64 = 1024;

#[derive(Debug, Clone, Copy)]
struct AdtsHeader {
    frame_len: usize,
    header_len: usize,
    sample_rate_index: u8,
    channel_config: u8,
}

fn parse_adts_header(data: &[u8]) -> Option<AdtsHeader> {
    if data.len() < 7 {
        return None;
    }
    if data[0] != 0xFF || (data[1] & 0xF0) != 0xF0 {
        return None;
    }

    let protection_absent = data[1] & 0x01 != 0;
    let sample_rate_index = (data[2] >> 2) & 0x0F;
    let channel_config = ((data[2] & 0x01) << 2) | ((data[3] >> 6) & 0x03);
    let frame_len = (((data[3] as usize) & 0x03) << 11) | ((data[4] as usize) << 3) | ((data[5] as usize) >> 5);

    if sample_rate_index as usize >= SAMPLE_RATES.len() || frame_len < 7 {
        return None;
    }

    Some(AdtsHeader {
        frame_len,
        header_len: if protection_absent { 7 } else { 9 },
        sample_rate_index,
        channel_config,
    })
}

/// Synthesizes a 2-byte AudioSpecificConfig (object type 2 = AAC-LC)
/// from the ADTS sampling-frequency index and channel configuration.
fn synth_audio_specific_config(sample_rate_index: u8, channel_config: u8) -> [u8; 2] {
    let object_type = 2u8;
    let b0 = (object_type << 3) | (sample_rate_index >> 1);
    let b1 = ((sample_rate_index & 0x01) << 7) | (channel_config << 3);
    [b0, b1]
}

pub struct AacReader {
    data: Bytes,
    pos: usize,
    sample_rate: u32,
    channels: u8,
    frames_read: u64,
}

impl AacReader {
    pub fn new(data: Bytes) -> Self {
        AacReader {
            data,
            pos: 0,
            sample_rate: 0,
            channels: 0,
            frames_read: 0,
        }
    }

    pub fn codec_private(&self) -> Vec<u8> {
        let index = SAMPLE_RATES
            .iter()
            .position(|r| *r == self.sample_rate)
            .unwrap_or(4) as u8;
        synth_audio_specific_config(index, self.channels).to_vec()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn default_duration_ns(&self) -> u64 {
        if self.sample_rate == 0 {
            0
        } else {
            (SAMPLES_PER_FRAME * 1_000_000_000) / self.sample_rate as u64
        }
    }
}

impl Reader for AacReader {
    fn read_headers(&mut self) -> Result<Vec<TrackInfo>, ReaderError> {
        let header = parse_adts_header(&self.data[self.pos..])
            .ok_or_else(|| ReaderError::Malformed("no ADTS sync found".to_string()))?;

        self.sample_rate = SAMPLE_RATES[header.sample_rate_index as usize];
        self.channels = header.channel_config;

        Ok(vec![TrackInfo {
            track_id: 1,
            codec_id: "A_AAC".to_string(),
            name: None,
            language: None,
        }])
    }

    fn identify(&self) -> Vec<String> {
        vec![format!(
            "Track ID 1: audio (A_AAC) [{}Hz, {}ch]",
            self.sample_rate, self.channels
        )]
    }

    fn read(&mut self, packetizer: &mut dyn Packetizer, force: bool) -> Result<FileStatus, ReaderError> {
        let Some(header) = parse_adts_header(&self.data[self.pos..]) else {
            let _ = force;
            return Ok(FileStatus::Done);
        };

        let payload_start = self.pos + header.header_len;
        let payload_end = self.pos + header.frame_len;
        if payload_end > self.data.len() {
            return Ok(FileStatus::Done);
        }

        let payload = MemoryBuffer::from_bytes(self.data.slice(payload_start..payload_end));
        let timecode_ns = (self.frames_read * self.default_duration_ns() as u64) as i64;

        let mut frame = RawFrame::new(payload, timecode_ns);
        frame.duration_ns = Some(self.default_duration_ns() as i64);
        packetizer.process(frame)?;

        self.pos = payload_end;
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

    fn sample_adts(frame_len: usize) -> Vec<u8> {
        let mut header = vec![0xFFu8, 0xF1, 0x4C, 0x80, 0x00, 0x1F, 0xFC];
        header[3] = (header[3] & 0xFC) | (((frame_len >> 11) & 0x03) as u8);
        header[4] = ((frame_len >> 3) & 0xFF) as u8;
        header[5] = (header[5] & 0x1F) | (((frame_len & 0x07) as u8) << 5);
        let mut frame = header;
        frame.resize(frame_len, 0xAB);
        frame
    }

    fn sample_stream(frames: usize) -> Bytes {
        let mut data = Vec::new();
        for _ in 0..frames {
            data.extend_from_slice(&sample_adts(20));
        }
        Bytes::from(data)
    }

    #[test]
    fn parses_sampling_rate_and_channels_from_header() {
        let mut reader = AacReader::new(sample_stream(1));
        let tracks = reader.read_headers().unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(reader.sample_rate(), 48000);
        assert_eq!(reader.channels(), 1);
    }

    #[test]
    fn codec_private_is_two_bytes() {
        let mut reader = AacReader::new(sample_stream(1));
        reader.read_headers().unwrap();
        assert_eq!(reader.codec_private().len(), 2);
    }

    #[test]
    fn default_duration_matches_1024_samples_at_48khz() {
        let mut reader = AacReader::new(sample_stream(1));
        reader.read_headers().unwrap();
        assert_eq!(reader.default_duration_ns(), 21_333_333);
    }
}
