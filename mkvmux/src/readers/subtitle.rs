//! Raw text subtitle reader (§4.7 "Subtitles (text)"): splits on blank
//! lines into cues, normalizes line endings, and leaves duration
//! assignment up to the packetizer (durations are mandatory there).

use bytes::Bytes;

use crate::memory::MemoryBuffer;
use crate::packetizer::{Packetizer, RawFrame};
use crate::reader::{FileStatus, Reader, ReaderError, TrackInfo};

/// Strips CR, trims trailing blank lines, and converts remaining
/// newlines to CRLF (§4.7).
fn normalize_cue(raw: &str) -> String {
    let without_cr: String = raw.chars().filter(|c| *c != '\r').collect();
    let trimmed = without_cr.trim_end_matches('\n');
    trimmed.replace('\n', "\r\n")
}

pub struct SubtitleReader {
    cues: Vec<(i64, i64, String)>,
    next: usize,
}

impl SubtitleReader {
    /// `text` is a sequence of blank-line-separated cues, each cue's
    /// first line `start_ms,end_ms` followed by the cue body. This is a
    /// minimal synthetic format standing in for a pre-parsed cue list
    /// (the core consumes cues, not any particular subtitle syntax).
    pub fn new(data: Bytes) -> Result<Self, ReaderError> {
        let text = std::str::from_utf8(&data)
            .map_err(|_| ReaderError::Malformed("subtitle input is not valid UTF-8".to_string()))?;

        let mut cues = Vec::new();
        for block in text.split("\n\n") {
            let block = block.trim();
            if block.is_empty() {
                continue;
            }
            let mut lines = block.lines();
            let timing = lines.next().ok_or_else(|| ReaderError::Malformed("empty cue".to_string()))?;
            let (start, end) = timing
                .split_once(',')
                .ok_or_else(|| ReaderError::Malformed(format!("bad cue timing: {timing}")))?;
            let start_ms: i64 = start
                .trim()
                .parse()
                .map_err(|_| ReaderError::Malformed(format!("bad start time: {start}")))?;
            let end_ms: i64 = end
                .trim()
                .parse()
                .map_err(|_| ReaderError::Malformed(format!("bad end time: {end}")))?;
            let body: String = lines.collect::<Vec<_>>().join("\n");
            cues.push((start_ms * 1_000_000, end_ms * 1_000_000, body));
        }

        Ok(SubtitleReader { cues, next: 0 })
    }
}

impl Reader for SubtitleReader {
    fn read_headers(&mut self) -> Result<Vec<TrackInfo>, ReaderError> {
        Ok(vec![TrackInfo {
            track_id: 1,
            codec_id: "S_TEXT/UTF8".to_string(),
            name: None,
            language: None,
        }])
    }

    fn identify(&self) -> Vec<String> {
        vec![format!("Track ID 1: subtitles (S_TEXT/UTF8), {} cues", self.cues.len())]
    }

    fn read(&mut self, packetizer: &mut dyn Packetizer, force: bool) -> Result<FileStatus, ReaderError> {
        let _ = force;
        let Some((start_ns, end_ns, body)) = self.cues.get(self.next).cloned() else {
            return Ok(FileStatus::Done);
        };

        let normalized = normalize_cue(&body);
        self.next += 1;

        // Zero-width cues are dropped with a warning rather than emitted
        // (§4.7 "zero-width entries are dropped with a warning").
        if end_ns <= start_ns || normalized.is_empty() {
            log::warn!("dropping zero-width or empty subtitle cue at {start_ns}ns");
            return Ok(if self.next >= self.cues.len() {
                FileStatus::Done
            } else {
                FileStatus::MoreData
            });
        }

        let mut frame = RawFrame::new(MemoryBuffer::from_bytes(Bytes::from(normalized.into_bytes())), start_ns);
        frame.duration_ns = Some(end_ns - start_ns);
        packetizer.process(frame)?;

        if self.next >= self.cues.len() {
            Ok(FileStatus::Done)
        } else {
            Ok(FileStatus::MoreData)
        }
    }

    fn get_progress(&self) -> u8 {
        if self.cues.is_empty() {
            100
        } else {
            ((self.next * 100) / self.cues.len()) as u8
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_cues_and_converts_newlines_to_crlf() {
        let text = "0,1000\nline one\nline two\n\n1000,2000\nsecond cue\n";
        let mut reader = SubtitleReader::new(Bytes::from(text)).unwrap();
        assert_eq!(reader.cues.len(), 2);
        assert_eq!(reader.cues[0].0, 0);
        assert_eq!(reader.cues[0].1, 1_000_000_000);
        assert_eq!(normalize_cue(&reader.cues[0].2), "line one\r\nline two");
    }

    #[test]
    fn zero_width_cue_is_skipped() {
        let text = "0,0\nempty\n";
        let mut reader = SubtitleReader::new(Bytes::from(text)).unwrap();
        assert_eq!(reader.cues.len(), 1);
        assert_eq!(reader.cues[0].0, reader.cues[0].1);
    }
}
