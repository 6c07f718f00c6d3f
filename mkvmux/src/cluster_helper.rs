//! Cluster helper (§4.9 "the heart of muxing"): per-packet admission,
//! block assembly, lacing, cue emission, cluster flush and splitting.

use thiserror::Error;

use crate::ebml::varint::write_size;
use crate::ebml::{Element, EbmlError, Master};
use crate::lacing::{lace, LacingError};
use crate::matroska_ids::{
    BLOCK_DURATION_ID, BLOCK_GROUP_CONTEXT, BLOCK_GROUP_ID, BLOCK_ID, CLUSTER_CONTEXT, CLUSTER_ID,
    CODEC_STATE_ID, REFERENCE_BLOCK_ID, REFERENCE_PRIORITY_ID, SIMPLE_BLOCK_ID, TIMECODE_ID,
};
use crate::packet::Packet;
use crate::timecode::round_div;

const MAX_BLOCK_DELTA: i64 = 32_767;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error(transparent)]
    Ebml(#[from] EbmlError),
    #[error(transparent)]
    Lacing(#[from] LacingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueStrategy {
    None,
    IFrames,
    All,
    Sparse,
}

#[derive(Debug, Clone)]
pub struct CuePoint {
    pub timecode_scaled: i64,
    pub track_number: u64,
    pub cluster_position: u64,
    pub block_index: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
pub struct ClusterHelperConfig {
    pub timecode_scale: u64,
    pub max_blocks_per_cluster: usize,
    pub max_cluster_bytes: u64,
    pub max_ns_per_cluster: i64,
    pub use_simple_block: bool,
    pub has_video_track: bool,
}

impl Default for ClusterHelperConfig {
    fn default() -> Self {
        ClusterHelperConfig {
            timecode_scale: 1_000_000,
            max_blocks_per_cluster: 65_535,
            max_cluster_bytes: 1_500_000,
            max_ns_per_cluster: 5_000_000_000,
            use_simple_block: true,
            has_video_track: false,
        }
    }
}

struct PendingBlock {
    track_number: u64,
    timecode_scaled: i64,
    frames: Vec<Vec<u8>>,
    keyframe: bool,
    discardable: bool,
    duration_scaled: Option<i64>,
    duration_mandatory: bool,
    default_duration_scaled: Option<i64>,
    bref_scaled: Option<i64>,
    fref_scaled: Option<i64>,
    codec_state: Option<Vec<u8>>,
    reference_priority: Option<u64>,
}

impl PendingBlock {
    fn needs_block_group(&self) -> bool {
        self.bref_scaled.is_some()
            || self.fref_scaled.is_some()
            || self.codec_state.is_some()
            || (self.duration_mandatory
                && self.duration_scaled.is_some()
                && self.duration_scaled != self.default_duration_scaled)
    }
}

/// Drains one packetizer's queue in timecode order and renders finished
/// Matroska clusters, splitting and indexing as configured.
pub struct ClusterHelper {
    config: ClusterHelperConfig,
    pending: Vec<PendingBlock>,
    cluster_min_tc: Option<i64>,
    cluster_max_tc: Option<i64>,
    cluster_first_tc: Option<i64>,
    previous_cluster_tc: i64,
    cumulative_offset: i64,
    previous_split_point_scaled: i64,
    cluster_bytes_estimate: u64,
    rendered_clusters: Vec<Vec<u8>>,
    cues: Vec<CuePoint>,
    last_cue_tc_by_track: std::collections::HashMap<u64, i64>,
    split_points_scaled: Vec<i64>,
    next_split_point: usize,
    file_bytes_written: u64,
    split_threshold_bytes: Option<u64>,
    first_timecode_in_file: Option<i64>,
    split_duration_threshold: Option<i64>,
    warned_negative_timecode: bool,
}

impl ClusterHelper {
    pub fn new(config: ClusterHelperConfig) -> Self {
        ClusterHelper {
            config,
            pending: Vec::new(),
            cluster_min_tc: None,
            cluster_max_tc: None,
            cluster_first_tc: None,
            previous_cluster_tc: 0,
            cumulative_offset: 0,
            previous_split_point_scaled: 0,
            cluster_bytes_estimate: 0,
            rendered_clusters: Vec::new(),
            cues: Vec::new(),
            last_cue_tc_by_track: std::collections::HashMap::new(),
            split_points_scaled: Vec::new(),
            next_split_point: 0,
            file_bytes_written: 0,
            split_threshold_bytes: None,
            first_timecode_in_file: None,
            split_duration_threshold: None,
            warned_negative_timecode: false,
        }
    }

    pub fn set_split_by_size(&mut self, threshold_bytes: u64) {
        self.split_threshold_bytes = Some(threshold_bytes);
    }

    pub fn set_split_by_duration(&mut self, threshold_ns: i64) {
        self.split_duration_threshold = Some(threshold_ns);
    }

    pub fn set_split_points(&mut self, mut points_ns: Vec<i64>) {
        points_ns.sort_unstable();
        self.split_points_scaled = points_ns
            .into_iter()
            .map(|p| p / self.config.timecode_scale as i64)
            .collect();
        self.next_split_point = 0;
    }

    pub fn rendered_clusters(&self) -> &[Vec<u8>] {
        &self.rendered_clusters
    }

    pub fn cues(&self) -> &[CuePoint] {
        &self.cues
    }

    /// Whether admitting `packet` should split the output file (§4.9
    /// "Split conditions"), checked only for packets with no backward
    /// reference.
    pub fn wants_split(&mut self, assigned_timecode_scaled: i64) -> bool {
        if let Some(threshold) = self.split_threshold_bytes {
            if self.file_bytes_written + self.cluster_bytes_estimate >= threshold {
                return true;
            }
        }

        if let (Some(threshold), Some(first)) = (self.split_duration_threshold, self.first_timecode_in_file) {
            if (assigned_timecode_scaled - first) * self.config.timecode_scale as i64 >= threshold {
                return true;
            }
        }

        if let Some(&next_point) = self.split_points_scaled.get(self.next_split_point) {
            if assigned_timecode_scaled >= next_point {
                self.next_split_point += 1;
                return true;
            }
        }

        false
    }

    /// `add_packet` (§4.9 pseudocode): scales timecodes, decides cluster
    /// boundaries, and enqueues the packet as a pending block.
    pub fn add_packet(
        &mut self,
        packet: &Packet,
        track_number: u64,
        default_duration_ns: Option<i64>,
        cue_strategy: CueStrategy,
    ) -> Result<(), ClusterError> {
        let scale = self.config.timecode_scale as i64;
        let raw_scaled = round_div(packet.assigned_timecode, scale);
        let mut at_scaled = raw_scaled - self.cumulative_offset;
        if at_scaled < 0 {
            if !self.warned_negative_timecode {
                tracing::warn!(timecode_scaled = at_scaled, "negative timecode after displacement, clamping to zero");
                self.warned_negative_timecode = true;
            }
            at_scaled = 0;
        }
        let duration_scaled = packet.duration.map(|d| round_div(d, scale));
        // bref/fref always point within the current file (a split never
        // lands mid reference chain), so rebase them the same way as
        // `at_scaled` to keep the stored reference delta offset-free.
        let bref_scaled = packet.bref.ns().map(|ns| round_div(ns, scale) - self.cumulative_offset);
        let fref_scaled = packet.fref.ns().map(|ns| round_div(ns, scale) - self.cumulative_offset);
        let default_duration_scaled = default_duration_ns.map(|d| round_div(d, scale));

        if self.first_timecode_in_file.is_none() {
            // Kept in the same (un-rebased) space as `wants_split`'s
            // caller, which computes its timecode straight from the raw
            // `assigned_timecode` with no knowledge of `cumulative_offset`.
            self.first_timecode_in_file = Some(raw_scaled);
        }

        let cluster_min = self.cluster_min_tc.unwrap_or(at_scaled).min(at_scaled);
        let cluster_max = self.cluster_max_tc.unwrap_or(at_scaled).max(at_scaled);
        let delay = cluster_max.max(at_scaled) - cluster_min.min(at_scaled);

        let cluster_non_empty = !self.pending.is_empty();
        let crosses_max_duration = self
            .cluster_first_tc
            .map(|first| (at_scaled - first) * scale >= self.config.max_ns_per_cluster)
            .unwrap_or(false);

        if (delay > MAX_BLOCK_DELTA && cluster_non_empty)
            || (packet.gap_following && cluster_non_empty)
            || crosses_max_duration
        {
            self.render_cluster()?;
        }

        let block = PendingBlock {
            track_number,
            timecode_scaled: at_scaled,
            frames: vec![packet.payload.as_slice().to_vec()],
            keyframe: packet.keyframe,
            discardable: packet.discardable,
            duration_scaled,
            duration_mandatory: packet.duration_mandatory,
            default_duration_scaled,
            bref_scaled,
            fref_scaled,
            codec_state: packet.codec_state.clone(),
            reference_priority: None,
        };

        self.maybe_emit_cue(&block, cue_strategy);

        self.cluster_min_tc = Some(cluster_min);
        self.cluster_max_tc = Some(cluster_max);
        self.cluster_first_tc.get_or_insert(at_scaled);
        // Block header (vint track number + i16 delta + flags byte) plus
        // payload; an estimate, not an exact render size, but enough to
        // bound the open cluster's size (§4.9 "cluster too full").
        self.cluster_bytes_estimate += packet.payload.len() as u64 + 4;
        self.pending.push(block);

        if self.pending.len() >= self.config.max_blocks_per_cluster
            || self.cluster_bytes_estimate >= self.config.max_cluster_bytes
        {
            self.render_cluster()?;
        }

        Ok(())
    }

    fn maybe_emit_cue(&mut self, block: &PendingBlock, strategy: CueStrategy) {
        let should_cue = match strategy {
            CueStrategy::None => false,
            CueStrategy::IFrames => block.bref_scaled.is_none() && block.fref_scaled.is_none(),
            CueStrategy::All => true,
            CueStrategy::Sparse => {
                if self.config.has_video_track {
                    false
                } else {
                    let last = self.last_cue_tc_by_track.get(&block.track_number).copied();
                    let two_seconds_scaled = 2_000_000_000 / self.config.timecode_scale as i64;
                    last.map(|l| block.timecode_scaled - l >= two_seconds_scaled).unwrap_or(true)
                }
            }
        } || block.codec_state.is_some();

        if should_cue {
            self.last_cue_tc_by_track.insert(block.track_number, block.timecode_scaled);
            self.cues.push(CuePoint {
                timecode_scaled: block.timecode_scaled,
                track_number: block.track_number,
                cluster_position: self.rendered_clusters.len() as u64,
                block_index: Some(self.pending.len() as u64),
            });
        }
    }

    /// Renders the accumulated pending blocks into one Cluster master,
    /// appends the bytes to `rendered_clusters`, and resets state for
    /// the next cluster (§4.9 "Cluster flush").
    pub fn render_cluster(&mut self) -> Result<(), ClusterError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        // `cluster_min_tc` is already rebased by `cumulative_offset` (each
        // block's `timecode_scaled` was rebased in `add_packet`), so the
        // cluster's own Timecode element needs no further adjustment.
        let cluster_tc = self.cluster_min_tc.unwrap();

        let mut cluster = Master::with_id(CLUSTER_ID, &CLUSTER_CONTEXT);
        cluster.find_first_mut(TIMECODE_ID).unwrap().set_uint(cluster_tc.max(0) as u64);

        for block in self.pending.drain(..) {
            let delta = block.timecode_scaled - cluster_tc;
            debug_assert!(delta.abs() <= MAX_BLOCK_DELTA, "cluster boundary guarantee violated");

            if self.config.use_simple_block && !block.needs_block_group() {
                let payload = render_simple_block(&block, delta as i16);
                let mut elem = CLUSTER_CONTEXT.spec_for(SIMPLE_BLOCK_ID).unwrap().instantiate();
                elem.set_binary(payload);
                cluster.push(elem);
            } else {
                let mut group = Master::with_id(BLOCK_GROUP_ID, &BLOCK_GROUP_CONTEXT);
                let block_payload = render_block_body(&block, delta as i16);
                group.find_first_mut(BLOCK_ID).unwrap().set_binary(block_payload);

                if let Some(duration) = block.duration_scaled {
                    if block.duration_mandatory || Some(duration) != block.default_duration_scaled {
                        let mut dur_elem = BLOCK_GROUP_CONTEXT.spec_for(BLOCK_DURATION_ID).unwrap().instantiate();
                        dur_elem.set_uint(duration.max(0) as u64);
                        group.push(dur_elem);
                    }
                }

                if let Some(priority) = block.reference_priority {
                    let mut pri_elem = BLOCK_GROUP_CONTEXT.spec_for(REFERENCE_PRIORITY_ID).unwrap().instantiate();
                    pri_elem.set_uint(priority);
                    group.push(pri_elem);
                }

                if let Some(bref) = block.bref_scaled {
                    let mut ref_elem = BLOCK_GROUP_CONTEXT.spec_for(REFERENCE_BLOCK_ID).unwrap().instantiate();
                    ref_elem.set_int(bref - block.timecode_scaled);
                    group.push(ref_elem);
                }

                if let Some(fref) = block.fref_scaled {
                    let mut ref_elem = BLOCK_GROUP_CONTEXT.spec_for(REFERENCE_BLOCK_ID).unwrap().instantiate();
                    ref_elem.set_int(fref - block.timecode_scaled);
                    group.push(ref_elem);
                }

                if let Some(state) = block.codec_state {
                    let mut state_elem = BLOCK_GROUP_CONTEXT.spec_for(CODEC_STATE_ID).unwrap().instantiate();
                    state_elem.set_binary(state);
                    group.push(state_elem);
                }

                cluster.push(Element::Master(group));
            }
        }

        let mut out = Vec::new();
        Element::Master(cluster).render(false, true, &mut out)?;

        self.file_bytes_written += out.len() as u64;
        self.rendered_clusters.push(out);

        self.previous_cluster_tc = cluster_tc;
        self.cluster_min_tc = None;
        self.cluster_max_tc = None;
        self.cluster_first_tc = None;
        self.cluster_bytes_estimate = 0;

        Ok(())
    }

    /// Flushes any remaining pending blocks, e.g. on reader completion.
    pub fn finish(&mut self) -> Result<(), ClusterError> {
        self.render_cluster()
    }

    /// Called on a confirmed split: resets per-file accounting and, if
    /// `no_linking` is false, rebases the next file's block timecodes by
    /// the duration elapsed since the previous split point (not by the
    /// absolute `end_timecode_scaled` itself, which would double-count
    /// on every split after the first).
    pub fn on_split(&mut self, end_timecode_scaled: i64, no_linking: bool) {
        self.file_bytes_written = 0;
        self.first_timecode_in_file = None;
        self.next_split_point = self.next_split_point.max(0);

        if !no_linking {
            self.cumulative_offset += end_timecode_scaled - self.previous_split_point_scaled;
            self.previous_split_point_scaled = end_timecode_scaled;
        }
    }
}

/// Block header: vint track number, i16 BE relative timecode, 1 flags
/// byte (§6.1 "Block header").
fn block_header(track_number: u64, delta: i16, keyframe: bool, discardable: bool, simple: bool) -> Vec<u8> {
    let mut out = Vec::new();
    write_size(track_number, None, &mut out).expect("track number fits in a size vint");
    out.extend_from_slice(&delta.to_be_bytes());

    let mut flags = 0u8;
    if simple && keyframe {
        flags |= 0x80;
    }
    if discardable {
        flags |= 0x01;
    }

    out.push(flags);
    out
}

fn render_simple_block(block: &PendingBlock, delta: i16) -> Vec<u8> {
    let mut out = block_header(block.track_number, delta, block.keyframe, block.discardable, true);

    if block.frames.len() > 1 {
        let refs: Vec<&[u8]> = block.frames.iter().map(|f| f.as_slice()).collect();
        let laced = lace(&refs).expect("frame list is non-empty");
        out[out.len() - 1] |= 0x02; // Xiph lacing bits (SPEC_FULL §4.4).
        out.extend_from_slice(&laced);
    } else {
        out.extend_from_slice(&block.frames[0]);
    }

    out
}

fn render_block_body(block: &PendingBlock, delta: i16) -> Vec<u8> {
    let mut out = block_header(block.track_number, delta, false, block.discardable, false);

    if block.frames.len() > 1 {
        let refs: Vec<&[u8]> = block.frames.iter().map(|f| f.as_slice()).collect();
        let laced = lace(&refs).expect("frame list is non-empty");
        out[out.len() - 1] |= 0x02; // Xiph lacing bits (SPEC_FULL §4.4).
        out.extend_from_slice(&laced);
    } else {
        out.extend_from_slice(&block.frames[0]);
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::MemoryBuffer;
    use crate::packet::Packet;

    fn packet_at(ns: i64, keyframe: bool) -> Packet {
        let mut p = Packet::new(1, 0, MemoryBuffer::from_bytes(bytes::Bytes::from_static(b"frame")), ns);
        p.assigned_timecode = ns;
        p.keyframe = keyframe;
        p
    }

    #[test]
    fn add_packet_renders_a_cluster_on_finish() {
        let mut helper = ClusterHelper::new(ClusterHelperConfig::default());
        helper.add_packet(&packet_at(0, true), 1, Some(40_000_000), CueStrategy::IFrames).unwrap();
        helper.add_packet(&packet_at(40_000_000, true), 1, Some(40_000_000), CueStrategy::IFrames).unwrap();
        helper.finish().unwrap();

        assert_eq!(helper.rendered_clusters().len(), 1);
        assert!(!helper.rendered_clusters()[0].is_empty());
    }

    #[test]
    fn gap_following_forces_a_new_cluster() {
        let mut helper = ClusterHelper::new(ClusterHelperConfig::default());
        let mut first = packet_at(0, true);
        first.gap_following = true;
        helper.add_packet(&first, 1, None, CueStrategy::None).unwrap();
        helper.add_packet(&packet_at(1_000_000, true), 1, None, CueStrategy::None).unwrap();
        helper.finish().unwrap();

        assert_eq!(helper.rendered_clusters().len(), 2);
    }

    #[test]
    fn iframes_strategy_cues_only_keyframes() {
        let mut helper = ClusterHelper::new(ClusterHelperConfig::default());
        helper.add_packet(&packet_at(0, true), 1, None, CueStrategy::IFrames).unwrap();
        helper.add_packet(&packet_at(40_000_000, false), 1, None, CueStrategy::IFrames).unwrap();

        assert_eq!(helper.cues().len(), 1);
    }

    #[test]
    fn split_points_are_consumed_in_order() {
        let mut helper = ClusterHelper::new(ClusterHelperConfig::default());
        helper.set_split_points(vec![60_000_000_000]);

        assert!(!helper.wants_split(0));
        assert!(helper.wants_split(60_000));
        assert!(!helper.wants_split(60_001));
    }
}
