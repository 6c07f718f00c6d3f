//! MP3 packetizer (§4.7 "MP3", §4.12 scenario 4): no codec-private data,
//! one packet per frame, append-compatibility gated on matching sample
//! rate and channel count (§4.7 "Appending").

use crate::ebml::Master;
use crate::packet::Packet;
use crate::packetizer::{ConnectResult, Packetizer, PacketizerBase, PacketizerError, RawFrame};
use crate::timecode_factory::QueueMode;
use crate::track::{AudioParams, TrackEntryBuilder, TrackIdAllocator, TrackType};

pub struct Mp3Packetizer {
    base: PacketizerBase,
    sample_rate: u32,
    channels: u8,
}

impl Mp3Packetizer {
    pub fn new(sample_rate: u32, channels: u8) -> Self {
        let builder = TrackEntryBuilder::new(TrackType::Audio, "A_MPEG/L3").audio(AudioParams {
            sampling_frequency: sample_rate as f64,
            output_sampling_frequency: None,
            channels: channels as u64,
            bit_depth: None,
        });

        let mut base = PacketizerBase::new(builder);
        base.queue_mode = QueueMode::ShortQueueing;

        Mp3Packetizer {
            base,
            sample_rate,
            channels,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }
}

impl Packetizer for Mp3Packetizer {
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
        let packet = self.base.push_packet(frame.data, frame.timecode_ns);
        packet.duration = frame.duration_ns;
        Ok(())
    }

    fn take_packets(&mut self) -> Vec<Packet> {
        self.base.take_packets()
    }

    fn flush(&mut self) -> Result<(), PacketizerError> {
        Ok(())
    }

    fn can_connect_to(&self, codec_id: &str, _codec_private: Option<&[u8]>) -> ConnectResult {
        if codec_id != "A_MPEG/L3" {
            return ConnectResult::NoFormat;
        }
        ConnectResult::Yes
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::MemoryBuffer;

    #[test]
    fn appends_identical_format_sources() {
        let ptzr = Mp3Packetizer::new(44100, 2);
        assert_eq!(ptzr.can_connect_to("A_MPEG/L3", None), ConnectResult::Yes);
        assert_eq!(ptzr.can_connect_to("A_AAC", None), ConnectResult::NoFormat);
    }

    #[test]
    fn process_enqueues_a_packet_per_frame() {
        let mut ptzr = Mp3Packetizer::new(44100, 2);
        let mut allocator = TrackIdAllocator::new();
        ptzr.set_headers(&mut allocator).unwrap();

        let mut frame = RawFrame::new(MemoryBuffer::alloc(417), 0);
        frame.duration_ns = Some(26_122_449);
        ptzr.process(frame).unwrap();

        let packets = ptzr.take_packets();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].duration, Some(26_122_449));
    }
}
