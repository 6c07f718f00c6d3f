//! VP8/VP9 packetizer (§4.7 "Dirac/VP8/VP9", §4.12 scenario 2): tracks
//! the previous frame's assigned timecode so non-key frames can carry a
//! `bref`; all blocks are `SimpleBlock` since VPX never needs
//! `BlockGroup`-only metadata here (§8.2 scenario 2).

use crate::ebml::Master;
use crate::packet::Packet;
use crate::packetizer::{ConnectResult, ExternalTimecodes, Packetizer, PacketizerBase, PacketizerError, RawFrame};
use crate::timecode::Timecode;
use crate::track::{TrackEntryBuilder, TrackIdAllocator, TrackType, VideoParams};

pub struct VpxPacketizer {
    base: PacketizerBase,
    codec_id: &'static str,
    last_timecode_ns: Option<i64>,
}

impl VpxPacketizer {
    pub fn new(codec_id: &'static str, width: u64, height: u64) -> Self {
        let builder = TrackEntryBuilder::new(TrackType::Video, codec_id).video(VideoParams {
            pixel_width: width,
            pixel_height: height,
            display_width: None,
            display_height: None,
        });

        VpxPacketizer {
            base: PacketizerBase::new(builder),
            codec_id,
            last_timecode_ns: None,
        }
    }

    /// Installs an external timecode factory (§4.5/§6.4), overriding
    /// every subsequent frame's source timecode.
    pub fn set_external_timecodes(&mut self, factory: ExternalTimecodes) {
        self.base.external_timecodes = factory;
    }
}

impl Packetizer for VpxPacketizer {
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
        let keyframe = frame.keyframe;
        let timecode_ns = frame.timecode_ns;
        let duration_ns = frame.duration_ns;

        let packet = self.base.push_packet(frame.data, timecode_ns);
        packet.keyframe = keyframe;
        packet.duration = duration_ns;
        if !keyframe {
            if let Some(prev) = self.last_timecode_ns {
                packet.bref = Timecode::new(prev);
            }
        }

        self.last_timecode_ns = Some(timecode_ns);
        Ok(())
    }

    fn take_packets(&mut self) -> Vec<Packet> {
        self.base.take_packets()
    }

    fn flush(&mut self) -> Result<(), PacketizerError> {
        Ok(())
    }

    fn can_connect_to(&self, codec_id: &str, _codec_private: Option<&[u8]>) -> ConnectResult {
        if codec_id == self.codec_id {
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
    fn non_key_frames_reference_the_previous_timecode() {
        let mut ptzr = VpxPacketizer::new("V_VP8", 640, 480);
        let mut allocator = TrackIdAllocator::new();
        ptzr.set_headers(&mut allocator).unwrap();

        let mut key = RawFrame::new(MemoryBuffer::alloc(4), 0);
        key.keyframe = true;
        ptzr.process(key).unwrap();

        let mut delta = RawFrame::new(MemoryBuffer::alloc(4), 33_366_666);
        delta.keyframe = false;
        ptzr.process(delta).unwrap();

        let packets = ptzr.take_packets();
        assert!(!packets[0].has_references());
        assert_eq!(packets[1].bref, Timecode::new(0));
    }
}
