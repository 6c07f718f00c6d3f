//! Packet (§3 "Packet"): the pipeline currency passed from a reader's
//! packetizer to the cluster helper.

use crate::memory::MemoryBuffer;
use crate::timecode::Timecode;

/// Reference block timecode, or the "none" sentinel (§3: "`bref`/`fref`
/// ... or sentinel 'none'").
pub type RefTimecode = Timecode;

pub fn no_ref() -> RefTimecode {
    Timecode::invalid()
}

/// Extension data riding alongside a packet for codec- or
/// lacing-specific bookkeeping (§3 "Packets carry per-extension data").
#[derive(Debug, Clone, Default)]
pub struct PacketExtensions {
    /// Per-frame timecodes within a laced block, used when deciding
    /// whether same-size/fixed-size lacing applies.
    pub lace_timecodes_ns: Vec<i64>,
    /// BlockAdditions payloads (id, data), carried verbatim.
    pub data_adds: Vec<(u64, Vec<u8>)>,
}

#[derive(Debug, Clone)]
pub struct Packet {
    /// The track UID of the packetizer that produced this packet.
    pub packetizer_uid: u64,
    pub payload: MemoryBuffer,
    /// Monotonically increasing across the packetizer's lifetime.
    pub packet_number: u64,
    /// Raw, source-derived timecode in nanoseconds.
    pub timecode: i64,
    /// Timecode after AV-sync displacement and timecode-factory
    /// normalization; what the cluster helper actually schedules by.
    pub assigned_timecode: i64,
    pub duration: Option<i64>,
    /// Whether `duration` must be written even if it equals the track's
    /// `DefaultDuration` (§3 "duration_mandatory").
    pub duration_mandatory: bool,
    pub bref: RefTimecode,
    pub fref: RefTimecode,
    pub keyframe: bool,
    pub discardable: bool,
    /// Optional codec-state blob: presence forces a `BlockGroup` with a
    /// `CodecState` child instead of a bare `SimpleBlock`.
    pub codec_state: Option<Vec<u8>>,
    /// Forces a cluster boundary after this packet is admitted (§4.9).
    pub gap_following: bool,
    pub extensions: PacketExtensions,
}

impl Packet {
    pub fn new(packetizer_uid: u64, packet_number: u64, payload: MemoryBuffer, timecode: i64) -> Self {
        Packet {
            packetizer_uid,
            payload,
            packet_number,
            timecode,
            assigned_timecode: timecode,
            duration: None,
            duration_mandatory: false,
            bref: no_ref(),
            fref: no_ref(),
            keyframe: true,
            discardable: false,
            codec_state: None,
            gap_following: false,
            extensions: PacketExtensions::default(),
        }
    }

    /// Whether this packet carries at least one valid backward or
    /// forward reference, meaning it cannot be a `SimpleBlock` keyframe
    /// and needs a `BlockGroup` with `ReferenceBlock` children.
    pub fn has_references(&self) -> bool {
        self.bref.is_valid() || self.fref.is_valid()
    }

    /// Whether this packet needs a `BlockGroup` rather than a bare
    /// `SimpleBlock` (§4.9: references, codec state, or BlockAdditions).
    pub fn needs_block_group(&self) -> bool {
        self.has_references() || self.codec_state.is_some() || !self.extensions.data_adds.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_packet() -> Packet {
        Packet::new(1, 0, MemoryBuffer::alloc(4), 0)
    }

    #[test]
    fn fresh_packet_has_no_references() {
        let packet = sample_packet();
        assert!(!packet.has_references());
        assert!(!packet.needs_block_group());
    }

    #[test]
    fn packet_with_bref_needs_block_group() {
        let mut packet = sample_packet();
        packet.bref = Timecode::new(-40_000_000);
        assert!(packet.has_references());
        assert!(packet.needs_block_group());
    }

    #[test]
    fn packet_with_codec_state_needs_block_group() {
        let mut packet = sample_packet();
        packet.codec_state = Some(vec![1, 2, 3]);
        assert!(packet.needs_block_group());
    }
}
