//! Text subtitle packetizer (§4.7 "Subtitles (text)"): durations are
//! mandatory on every packet, since Matroska players rely on
//! `BlockDuration` rather than inter-cue spacing for subtitle timing.

use crate::ebml::Master;
use crate::packet::Packet;
use crate::packetizer::{ConnectResult, Packetizer, PacketizerBase, PacketizerError, RawFrame};
use crate::track::{TrackEntryBuilder, TrackIdAllocator, TrackType};

pub struct SubtitlePacketizer {
    base: PacketizerBase,
}

impl SubtitlePacketizer {
    pub fn new(codec_id: impl Into<String>) -> Self {
        let builder = TrackEntryBuilder::new(TrackType::Subtitle, codec_id);
        SubtitlePacketizer {
            base: PacketizerBase::new(builder),
        }
    }
}

impl Packetizer for SubtitlePacketizer {
    fn set_headers(&mut self, allocator: &mut TrackIdAllocator) -> Result<(), PacketizerError> {
        self.base.set_headers(allocator)
    }

    fn track_entry(&self) -> Option<&Master> {
        self.base.track_entry()
    }

    fn track_number(&self) -> Option<u64> {
        self.base.track_number()
    }

    fn track_uid(&self) -> Option<u64> {
        self.base.track_uid()
    }

    fn take_track_entry(&mut self) -> Option<Master> {
        self.base.take_track_entry()
    }

    fn process(&mut self, frame: RawFrame) -> Result<(), PacketizerError> {
        let duration = frame
            .duration_ns
            .ok_or_else(|| PacketizerError::BadFrame("subtitle cue missing a mandatory duration".to_string()))?;

        let packet = self.base.push_packet(frame.data, frame.timecode_ns);
        packet.duration = Some(duration);
        packet.duration_mandatory = true;
        Ok(())
    }

    fn take_packets(&mut self) -> Vec<Packet> {
        self.base.take_packets()
    }

    fn flush(&mut self) -> Result<(), PacketizerError> {
        Ok(())
    }

    fn can_connect_to(&self, codec_id: &str, _codec_private: Option<&[u8]>) -> ConnectResult {
        if codec_id.starts_with("S_TEXT") {
            ConnectResult::Yes
        } else {
            ConnectResult::NoFormat
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::MemoryBuffer;

    #[test]
    fn rejects_a_cue_with_no_duration() {
        let mut ptzr = SubtitlePacketizer::new("S_TEXT/UTF8");
        let mut allocator = TrackIdAllocator::new();
        ptzr.set_headers(&mut allocator).unwrap();

        let frame = RawFrame::new(MemoryBuffer::alloc(4), 0);
        assert!(ptzr.process(frame).is_err());
    }

    #[test]
    fn accepted_cue_carries_a_mandatory_duration() {
        let mut ptzr = SubtitlePacketizer::new("S_TEXT/UTF8");
        let mut allocator = TrackIdAllocator::new();
        ptzr.set_headers(&mut allocator).unwrap();

        let mut frame = RawFrame::new(MemoryBuffer::alloc(4), 0);
        frame.duration_ns = Some(1_000_000_000);
        ptzr.process(frame).unwrap();

        let packets = ptzr.take_packets();
        assert!(packets[0].duration_mandatory);
    }
}
