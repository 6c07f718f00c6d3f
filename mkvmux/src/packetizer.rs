//! Packetizer contract (§4.7): wraps a reader's raw frames into
//! [`Packet`]s with assigned timecodes, and owns the lazy `TrackEntry`
//! build. Concrete packetizers (`packetizers/`) embed a
//! [`PacketizerBase`] and drive it with their own frame-to-packet logic
//! (duration synthesis, bref/fref chaining, lacing decisions).

use thiserror::Error;

use crate::ebml::{EbmlError, Master};
use crate::memory::MemoryBuffer;
use crate::packet::{no_ref, Packet};
use crate::timecode_factory::{QueueMode, V1Factory, V2Factory, V3Factory};
use crate::track::{TrackEntryBuilder, TrackIdAllocator};

#[derive(Debug, Error)]
pub enum PacketizerError {
    #[error(transparent)]
    Ebml(#[from] EbmlError),
    #[error("raw frame rejected: {0}")]
    BadFrame(String),
}

/// Outcome of an append-compatibility probe (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectResult {
    Yes,
    NoFormat,
    NoParameters,
    MaybeCodecPrivate,
}

/// A raw, reader-timestamped frame not yet wrapped as a [`Packet`].
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: MemoryBuffer,
    pub timecode_ns: i64,
    pub duration_ns: Option<i64>,
    pub keyframe: bool,
    pub discardable: bool,
    pub codec_state: Option<Vec<u8>>,
}

impl RawFrame {
    pub fn new(data: MemoryBuffer, timecode_ns: i64) -> Self {
        RawFrame {
            data,
            timecode_ns,
            duration_ns: None,
            keyframe: true,
            discardable: false,
            codec_state: None,
        }
    }
}

/// External per-track timecode factory, if one was supplied (§4.5/§6.4).
pub enum ExternalTimecodes {
    None,
    V1(V1Factory),
    V2(V2Factory),
    V3(V3Factory),
}

/// Every concrete packetizer (§4.7): produces packets from raw frames
/// and exposes its (lazily built) `TrackEntry`.
pub trait Packetizer {
    /// Builds and caches the `TrackEntry`, assigning track number/UID
    /// from `allocator` on first call; subsequent calls return the
    /// cached result.
    fn set_headers(&mut self, allocator: &mut TrackIdAllocator) -> Result<(), PacketizerError>;

    fn track_entry(&self) -> Option<&Master>;
    fn track_number(&self) -> Option<u64>;
    fn track_uid(&self) -> Option<u64>;

    /// Takes ownership of the built `TrackEntry`, for the one time the
    /// control plane assembles the output `Tracks` master. Returns
    /// `None` if `set_headers` hasn't run or this was already taken.
    fn take_track_entry(&mut self) -> Option<Master>;

    /// Hands a raw frame to the packetizer; zero or more packets may
    /// become available via [`take_packets`](Self::take_packets)
    /// afterwards (full-queueing packetizers may buffer one frame
    /// before they can compute a duration).
    fn process(&mut self, frame: RawFrame) -> Result<(), PacketizerError>;

    /// Drains packets that are ready to hand to the cluster helper.
    fn take_packets(&mut self) -> Vec<Packet>;

    /// Flushes any buffered frame (end-of-stream for this source).
    fn flush(&mut self) -> Result<(), PacketizerError>;

    /// Whether a new source may be appended to continue this track
    /// (§4.7 "append compatibility").
    fn can_connect_to(&self, codec_id: &str, codec_private: Option<&[u8]>) -> ConnectResult;
}

/// Shared bookkeeping every concrete packetizer embeds: the lazy
/// `TrackEntry` cache, packet numbering, AV-sync displacement, and the
/// optional external timecode factory.
pub struct PacketizerBase {
    builder: Option<TrackEntryBuilder>,
    track_entry: Option<(Master, u64, u64)>,
    queue: Vec<Packet>,
    next_packet_number: u64,
    pub queue_mode: QueueMode,
    pub external_timecodes: ExternalTimecodes,
    /// Added to every source timecode before scaling by `linear_factor`
    /// (§4.5 AV-sync displacement).
    pub displacement_ns: i64,
    pub linear_factor: f64,
    warned_negative_clamp: bool,
    next_frame_index: usize,
}

impl PacketizerBase {
    pub fn new(builder: TrackEntryBuilder) -> Self {
        PacketizerBase {
            builder: Some(builder),
            track_entry: None,
            queue: Vec::new(),
            next_packet_number: 0,
            queue_mode: QueueMode::None,
            external_timecodes: ExternalTimecodes::None,
            displacement_ns: 0,
            linear_factor: 1.0,
            warned_negative_clamp: false,
            next_frame_index: 0,
        }
    }

    pub fn set_headers(&mut self, allocator: &mut TrackIdAllocator) -> Result<(), PacketizerError> {
        if self.track_entry.is_some() {
            return Ok(());
        }
        let builder = self
            .builder
            .take()
            .expect("set_headers called twice without a cached TrackEntry");
        self.track_entry = Some(builder.build(allocator)?);
        Ok(())
    }

    pub fn track_entry(&self) -> Option<&Master> {
        self.track_entry.as_ref().map(|(m, _, _)| m)
    }

    pub fn track_number(&self) -> Option<u64> {
        self.track_entry.as_ref().map(|(_, n, _)| *n)
    }

    pub fn track_uid(&self) -> Option<u64> {
        self.track_entry.as_ref().map(|(_, _, u)| *u)
    }

    pub fn take_track_entry(&mut self) -> Option<Master> {
        self.track_entry.take().map(|(m, _, _)| m)
    }

    /// Applies AV-sync displacement and the linear correction factor,
    /// clamping a negative result to zero exactly once per packetizer
    /// (§7 "Negative timecodes after displacement are clamped to zero
    /// with a one-time warning"). An installed [`ExternalTimecodes`]
    /// factory (§4.5/§6.4) overrides `source_ns` entirely, looked up by
    /// this track's sequential frame index; displacement/linear_factor
    /// still apply to the factory's value, matching how AV-sync
    /// offsets stack with external timecode files.
    pub fn assign_timecode(&mut self, source_ns: i64) -> (i64, bool) {
        let frame_index = self.next_frame_index;
        self.next_frame_index += 1;

        let base_ns = match &self.external_timecodes {
            ExternalTimecodes::None => source_ns,
            ExternalTimecodes::V1(f) => f.get_next(frame_index as u64),
            ExternalTimecodes::V2(f) => f.get_timecode(frame_index).unwrap_or(source_ns),
            ExternalTimecodes::V3(f) => f.get_timecode_ns(frame_index),
        };

        let displaced = (base_ns as f64 * self.linear_factor) as i64 + self.displacement_ns;
        if displaced < 0 {
            let warn_now = !self.warned_negative_clamp;
            self.warned_negative_clamp = true;
            (0, warn_now)
        } else {
            (displaced, false)
        }
    }

    /// Builds a fresh [`Packet`] with the next sequential packet number
    /// and queues it for [`Packetizer::take_packets`].
    pub fn push_packet(&mut self, data: MemoryBuffer, timecode_ns: i64) -> &mut Packet {
        let (assigned, _warned) = self.assign_timecode(timecode_ns);
        let number = self.next_packet_number;
        self.next_packet_number += 1;

        let mut packet = Packet::new(
            self.track_uid().unwrap_or(0),
            number,
            data,
            timecode_ns,
        );
        packet.assigned_timecode = assigned;
        packet.bref = no_ref();
        packet.fref = no_ref();
        self.queue.push(packet);
        self.queue.last_mut().unwrap()
    }

    pub fn take_packets(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.queue)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::track::TrackType;

    fn base() -> PacketizerBase {
        PacketizerBase::new(TrackEntryBuilder::new(TrackType::Audio, "A_AAC"))
    }

    #[test]
    fn set_headers_is_idempotent() {
        let mut base = base();
        let mut allocator = TrackIdAllocator::new();
        base.set_headers(&mut allocator).unwrap();
        let number = base.track_number();
        base.set_headers(&mut allocator).unwrap();
        assert_eq!(base.track_number(), number);
    }

    #[test]
    fn displacement_clamps_negative_timecodes_once() {
        let mut base = base();
        base.displacement_ns = -1_000;

        let (tc, warned) = base.assign_timecode(500);
        assert_eq!(tc, 0);
        assert!(warned);

        let (_, warned_again) = base.assign_timecode(500);
        assert!(!warned_again);
    }

    #[test]
    fn push_packet_assigns_sequential_numbers() {
        let mut base = base();
        let mut allocator = TrackIdAllocator::new();
        base.set_headers(&mut allocator).unwrap();

        base.push_packet(MemoryBuffer::alloc(4), 0);
        base.push_packet(MemoryBuffer::alloc(4), 40_000_000);

        let packets = base.take_packets();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].packet_number, 0);
        assert_eq!(packets[1].packet_number, 1);
    }
}
