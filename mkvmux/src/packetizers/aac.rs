//! AAC packetizer (§4.7 "AAC", §4.12 scenario 1): SHORT_QUEUEING — the
//! reader already knows each frame's duration, so no look-ahead is
//! needed before emitting a packet.

use crate::ebml::Master;
use crate::memory::MemoryBuffer;
use crate::packet::Packet;
use crate::packetizer::{ConnectResult, Packetizer, PacketizerBase, PacketizerError, RawFrame};
use crate::timecode_factory::QueueMode;
use crate::track::{AudioParams, TrackEntryBuilder, TrackIdAllocator, TrackType};

pub struct AacPacketizer {
    base: PacketizerBase,
    sample_rate: u32,
    channels: u8,
    codec_private: Vec<u8>,
}

impl AacPacketizer {
    pub fn new(sample_rate: u32, channels: u8, codec_private: Vec<u8>, default_duration_ns: u64) -> Self {
        let builder = TrackEntryBuilder::new(TrackType::Audio, "A_AAC")
            .codec_private(codec_private.clone())
            .default_duration_ns(default_duration_ns)
            .audio(AudioParams {
                sampling_frequency: sample_rate as f64,
                output_sampling_frequency: None,
                channels: channels as u64,
                bit_depth: None,
            });

        let mut base = PacketizerBase::new(builder);
        base.queue_mode = QueueMode::ShortQueueing;

        AacPacketizer {
            base,
            sample_rate,
            channels,
            codec_private,
        }
    }
}

impl Packetizer for AacPacketizer {
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

    fn can_connect_to(&self, codec_id: &str, codec_private: Option<&[u8]>) -> ConnectResult {
        if codec_id != "A_AAC" {
            return ConnectResult::NoFormat;
        }
        match codec_private {
            Some(cp) if cp == self.codec_private.as_slice() => ConnectResult::Yes,
            Some(_) => ConnectResult::MaybeCodecPrivate,
            None => ConnectResult::NoParameters,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn emits_one_packet_per_frame_with_reader_supplied_duration() {
        let mut ptzr = AacPacketizer::new(48000, 1, vec![0x12, 0x08], 21_333_333);
        let mut allocator = TrackIdAllocator::new();
        ptzr.set_headers(&mut allocator).unwrap();

        for i in 0..3 {
            let mut frame = RawFrame::new(MemoryBuffer::alloc(10), i * 21_333_333);
            frame.duration_ns = Some(21_333_333);
            ptzr.process(frame).unwrap();
        }

        let packets = ptzr.take_packets();
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].duration, Some(21_333_333));
    }

    #[test]
    fn append_rejects_mismatched_codec_private() {
        let ptzr = AacPacketizer::new(48000, 1, vec![0x12, 0x08], 21_333_333);
        assert_eq!(
            ptzr.can_connect_to("A_AAC", Some(&[0x13, 0x08])),
            ConnectResult::MaybeCodecPrivate
        );
        assert_eq!(ptzr.can_connect_to("A_MPEG/L3", Some(&[0x12, 0x08])), ConnectResult::NoFormat);
    }
}
