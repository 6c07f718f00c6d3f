//! Documented stubs (§4.12): codecs named in spec.md §4.7 whose
//! bitstream grammar this core does not re-derive. Each still has a
//! real `Packetizer` impl so `PacketizerRegistry`'s codec-id dispatch
//! stays total; every method returns
//! [`PacketizerError::Ebml`]-free, explicit unsupported-feature errors
//! (§7 "Unsupported feature ... the track is dropped with a warning").

use crate::ebml::Master;
use crate::packet::Packet;
use crate::packetizer::{ConnectResult, Packetizer, PacketizerError, RawFrame};
use crate::track::TrackIdAllocator;

/// Identifies which unimplemented codec family a [`StubPacketizer`]
/// stands in for, purely for diagnostic messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubCodec {
    Dirac,
    TrueHdAc3Mlp,
    Mpeg1Mpeg2Video,
    Mpeg4Part2,
    Pgs,
    Opus,
}

impl StubCodec {
    fn name(self) -> &'static str {
        match self {
            StubCodec::Dirac => "Dirac",
            StubCodec::TrueHdAc3Mlp => "TrueHD/AC-3/MLP",
            StubCodec::Mpeg1Mpeg2Video => "MPEG-1/2 video",
            StubCodec::Mpeg4Part2 => "MPEG-4 Part 2",
            StubCodec::Pgs => "PGS",
            StubCodec::Opus => "Opus",
        }
    }
}

pub struct StubPacketizer {
    codec: StubCodec,
}

impl StubPacketizer {
    pub fn new(codec: StubCodec) -> Self {
        StubPacketizer { codec }
    }
}

impl Packetizer for StubPacketizer {
    fn set_headers(&mut self, _allocator: &mut TrackIdAllocator) -> Result<(), PacketizerError> {
        Err(PacketizerError::BadFrame(format!(
            "{} is recognized but not implemented by this core; track dropped",
            self.codec.name()
        )))
    }

    fn track_entry(&self) -> Option<&Master> {
        None
    }

    fn track_number(&self) -> Option<u64> {
        None
    }

    fn track_uid(&self) -> Option<u64> {
        None
    }

    fn take_track_entry(&mut self) -> Option<Master> {
        None
    }

    fn process(&mut self, _frame: RawFrame) -> Result<(), PacketizerError> {
        Err(PacketizerError::BadFrame(format!("{} packetizer is a stub", self.codec.name())))
    }

    fn take_packets(&mut self) -> Vec<Packet> {
        Vec::new()
    }

    fn flush(&mut self) -> Result<(), PacketizerError> {
        Ok(())
    }

    fn can_connect_to(&self, _codec_id: &str, _codec_private: Option<&[u8]>) -> ConnectResult {
        ConnectResult::NoFormat
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_headers_reports_unsupported_rather_than_panicking() {
        let mut ptzr = StubPacketizer::new(StubCodec::Opus);
        let mut allocator = TrackIdAllocator::new();
        assert!(ptzr.set_headers(&mut allocator).is_err());
    }
}
