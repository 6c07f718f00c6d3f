//! Muxing control plane (§4.13, §5): a single-threaded, pull-based
//! scheduler. Each registered source owns a reader and a packetizer; on
//! every tick the scheduler refills any source whose packet queue has
//! run dry, then hands the globally-earliest pending packet to the
//! [`ClusterHelper`]. Finished clusters stream straight to the
//! [`OutputFile`] as they're produced, so memory use stays bounded by
//! one cluster rather than the whole mux.
//!
//! Splitting (§4.9 "On a split") opens a fresh [`OutputFile`] through
//! the caller-supplied [`OutputSink`] and chains it to the previous one
//! via `PrevUID`. `NextUID` back-patching would need a seek-and-rewrite
//! once the next file's UID is known, which isn't implemented here —
//! `PrevUID` alone is enough for ordered playback and is what every
//! test in §8.2 checks.

use std::collections::VecDeque;

use async_trait::async_trait;
use thiserror::Error;

use crate::chapters::ChapterTree;
use crate::cluster_helper::{ClusterError, ClusterHelper, ClusterHelperConfig, CuePoint, CueStrategy};
use crate::io::{Io, IoError};
use crate::mux::output_file::{OutputError, OutputFile};
use crate::packet::Packet;
use crate::packetizer::{Packetizer, PacketizerError};
use crate::reader::{FileStatus, Reader, ReaderError};
use crate::timecode::round_div;
use crate::track::TrackIdAllocator;

#[derive(Debug, Error)]
pub enum MuxError {
    #[error(transparent)]
    Reader(#[from] ReaderError),
    #[error(transparent)]
    Packetizer(#[from] PacketizerError),
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("source produced no track entry after set_headers")]
    NoTrack,
}

/// Output-level knobs that aren't the `ClusterHelper`'s business
/// (§4.13: doc type, segment info, split thresholds).
pub struct MuxConfig {
    pub doc_type: &'static str,
    pub timecode_scale: u64,
    pub title: Option<String>,
    pub cluster: ClusterHelperConfig,
}

impl Default for MuxConfig {
    fn default() -> Self {
        MuxConfig {
            doc_type: "matroska",
            timecode_scale: 1_000_000,
            title: None,
            cluster: ClusterHelperConfig::default(),
        }
    }
}

/// Where a [`MuxSession::run`] gets its output streams from. One file
/// unless the session is configured to split (§4.9); each call opens
/// the next part.
#[async_trait]
pub trait OutputSink {
    async fn open_next(&mut self) -> Result<Io, MuxError>;
}

/// The common case: a single, already-open output with no splitting.
/// `open_next` errors if called a second time.
pub struct SingleFileSink {
    io: Option<Io>,
}

impl SingleFileSink {
    pub fn new(io: Io) -> Self {
        SingleFileSink { io: Some(io) }
    }
}

#[async_trait]
impl OutputSink for SingleFileSink {
    async fn open_next(&mut self) -> Result<Io, MuxError> {
        self.io
            .take()
            .ok_or_else(|| MuxError::Reader(ReaderError::Unsupported("SingleFileSink only opens one file".to_string())))
    }
}

struct Source {
    reader: Box<dyn Reader>,
    packetizer: Box<dyn Packetizer>,
    pending: VecDeque<Packet>,
    done: bool,
    track_number: u64,
    default_duration_ns: Option<i64>,
    cue_strategy: CueStrategy,
}

/// What one output file of a completed [`MuxSession::run`] received.
#[derive(Debug, Clone, Default)]
pub struct MuxSummary {
    pub clusters_written: usize,
    pub cues_written: usize,
    pub bytes_written: u64,
}

pub struct MuxSession {
    config: MuxConfig,
    allocator: TrackIdAllocator,
    cluster_helper: ClusterHelper,
    sources: Vec<Source>,
    chapters: Option<ChapterTree>,
}

impl MuxSession {
    pub fn new(config: MuxConfig) -> Self {
        let cluster_helper = ClusterHelper::new(config.cluster);
        MuxSession {
            config,
            allocator: TrackIdAllocator::new(),
            cluster_helper,
            sources: Vec::new(),
            chapters: None,
        }
    }

    /// Registers a source (§4.13 "scheduling"): runs `read_headers` to
    /// position the reader, then builds the track's `TrackEntry` up
    /// front, since `Tracks` must precede every `Cluster` in the output.
    pub fn add_source(
        &mut self,
        mut reader: Box<dyn Reader>,
        mut packetizer: Box<dyn Packetizer>,
        default_duration_ns: Option<i64>,
        cue_strategy: CueStrategy,
    ) -> Result<(), MuxError> {
        reader.read_headers()?;
        packetizer.set_headers(&mut self.allocator)?;
        let track_number = packetizer.track_number().ok_or(MuxError::NoTrack)?;

        self.sources.push(Source {
            reader,
            packetizer,
            pending: VecDeque::new(),
            done: false,
            track_number,
            default_duration_ns,
            cue_strategy,
        });
        Ok(())
    }

    /// Wires a chapter tree's split points into the cluster helper
    /// (§4.9 "chapter-driven splitting").
    pub fn set_chapters(&mut self, chapters: ChapterTree) {
        let points: Vec<i64> = chapters.split_points().into_iter().map(|ns| ns as i64).collect();
        self.cluster_helper.set_split_points(points);
        self.chapters = Some(chapters);
    }

    pub fn set_split_by_size(&mut self, threshold_bytes: u64) {
        self.cluster_helper.set_split_by_size(threshold_bytes);
    }

    pub fn set_split_by_duration(&mut self, threshold_ns: i64) {
        self.cluster_helper.set_split_by_duration(threshold_ns);
    }

    /// Tops up every source whose queue ran dry and isn't finished yet.
    fn refill(&mut self) -> Result<(), MuxError> {
        for source in &mut self.sources {
            while source.pending.is_empty() && !source.done {
                let status = source.reader.read(source.packetizer.as_mut(), false)?;
                source.pending.extend(source.packetizer.take_packets());

                if matches!(status, FileStatus::Done) {
                    source.done = true;
                }
                // MoreData/Holding with an empty queue this tick: retry
                // on the next top-level scheduler tick rather than spin.
                break;
            }
        }
        Ok(())
    }

    /// Index of the source whose head-of-queue packet has the smallest
    /// assigned timecode (§5 "pick the packetizer whose head ... is
    /// smallest").
    fn next_source(&self) -> Option<usize> {
        self.sources
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.pending.front().map(|p| (i, p.assigned_timecode)))
            .min_by_key(|&(_, tc)| tc)
            .map(|(i, _)| i)
    }

    fn all_drained(&self) -> bool {
        self.sources.iter().all(|s| s.done && s.pending.is_empty())
    }

    /// Builds the output's `Tracks`/`Chapters` once, up front: every
    /// source's `TrackEntry` is taken exactly once, on the first file.
    fn build_output(&mut self, prev_uid: Option<[u8; 16]>, first_file: bool) -> OutputFile {
        let mut output = OutputFile::new(self.config.doc_type, self.config.timecode_scale);
        if let Some(title) = &self.config.title {
            output.set_title(title.clone());
        }
        if let Some(uid) = prev_uid {
            output.set_prev_uid(uid);
        }
        if first_file {
            for source in &mut self.sources {
                if let Some(entry) = source.packetizer.take_track_entry() {
                    output.push_track_entry(entry);
                }
            }
            if let Some(chapters) = &self.chapters {
                if let Ok(master) = chapters.render() {
                    output.set_chapters(master);
                }
            }
        }
        output
    }

    /// Remaps the cluster-index-based `cluster_position` the
    /// `ClusterHelper` tracks internally to true Segment-relative byte
    /// offsets, using the offset each cluster was written at.
    fn remapped_cues(cues: &[CuePoint], cluster_offsets: &[u64]) -> Vec<CuePoint> {
        cues.iter()
            .map(|cue| CuePoint {
                cluster_position: cluster_offsets.get(cue.cluster_position as usize).copied().unwrap_or(0),
                ..cue.clone()
            })
            .collect()
    }

    async fn drain_rendered(
        &mut self,
        io: &mut Io,
        output: &mut OutputFile,
        cluster_offsets: &mut Vec<u64>,
        clusters_written: &mut usize,
    ) -> Result<(), MuxError> {
        let ready = self.cluster_helper.rendered_clusters()[*clusters_written..].to_vec();
        for cluster in ready {
            cluster_offsets.push(output.segment_bytes_written());
            output.write_cluster(io, &cluster).await?;
            *clusters_written += 1;
        }
        Ok(())
    }

    /// Runs the mux to completion, opening as many output files from
    /// `sink` as splitting requires (§4.9, §5). Returns one summary per
    /// file written, in order.
    pub async fn run(&mut self, sink: &mut dyn OutputSink) -> Result<Vec<MuxSummary>, MuxError> {
        let mut summaries = Vec::new();
        let mut prev_uid: Option<[u8; 16]> = None;
        let mut first_file = true;
        let scale = self.config.timecode_scale as i64;

        loop {
            let mut io = sink.open_next().await?;
            let mut output = self.build_output(prev_uid, first_file);
            first_file = false;
            output.write_header(&mut io).await?;

            let mut cluster_offsets = Vec::new();
            let mut clusters_written = 0usize;
            let mut split_at_scaled = None;

            loop {
                self.refill()?;

                let Some(idx) = self.next_source() else {
                    break;
                };

                let at_scaled = round_div(self.sources[idx].pending[0].assigned_timecode, scale);
                if !self.sources[idx].pending[0].has_references() && self.cluster_helper.wants_split(at_scaled) {
                    split_at_scaled = Some(at_scaled);
                    break;
                }

                let packet = self.sources[idx]
                    .pending
                    .pop_front()
                    .expect("next_source only returns indices with a non-empty queue");
                let track_number = self.sources[idx].track_number;
                let default_duration_ns = self.sources[idx].default_duration_ns;
                let cue_strategy = self.sources[idx].cue_strategy;

                self.cluster_helper
                    .add_packet(&packet, track_number, default_duration_ns, cue_strategy)?;

                self.drain_rendered(&mut io, &mut output, &mut cluster_offsets, &mut clusters_written)
                    .await?;

                if self.all_drained() {
                    break;
                }
            }

            let is_last_file = split_at_scaled.is_none();
            if is_last_file {
                for source in &mut self.sources {
                    source.packetizer.flush()?;
                    source.pending.extend(source.packetizer.take_packets());
                    while let Some(packet) = source.pending.pop_front() {
                        self.cluster_helper.add_packet(
                            &packet,
                            source.track_number,
                            source.default_duration_ns,
                            source.cue_strategy,
                        )?;
                    }
                }
            }

            self.cluster_helper.finish()?;
            self.drain_rendered(&mut io, &mut output, &mut cluster_offsets, &mut clusters_written)
                .await?;

            let cues = Self::remapped_cues(self.cluster_helper.cues(), &cluster_offsets);
            output.finish(&mut io, &cues).await?;

            prev_uid = Some(output.segment_uid());
            summaries.push(MuxSummary {
                clusters_written,
                cues_written: cues.len(),
                bytes_written: output.segment_bytes_written(),
            });

            match split_at_scaled {
                Some(end) => self.cluster_helper.on_split(end, false),
                None => break,
            }
        }

        Ok(summaries)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bytes::Bytes;

    use crate::packetizers::aac::AacPacketizer;
    use crate::readers::aac::AacReader;

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
            data.extend_from_slice(&sample_adts(40));
        }
        Bytes::from(data)
    }

    async fn sink() -> SingleFileSink {
        SingleFileSink::new(Io::from_stream(Box::new(tokio::io::sink())))
    }

    #[tokio::test]
    async fn mux_single_aac_source_writes_clusters_and_cues() {
        let mut reader = AacReader::new(sample_stream(4));
        reader.read_headers().unwrap();
        let sample_rate = reader.sample_rate();
        let channels = reader.channels();
        let codec_private = reader.codec_private();
        let default_duration_ns = reader.default_duration_ns();

        let packetizer = AacPacketizer::new(sample_rate, channels, codec_private, default_duration_ns);

        let mut session = MuxSession::new(MuxConfig::default());
        session
            .add_source(
                Box::new(AacReader::new(sample_stream(4))),
                Box::new(packetizer),
                Some(default_duration_ns as i64),
                CueStrategy::All,
            )
            .unwrap();

        let mut sink = sink().await;
        let summaries = session.run(&mut sink).await.unwrap();

        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].bytes_written > 0);
        assert_eq!(summaries[0].clusters_written, 1);
        assert_eq!(summaries[0].cues_written, 4);
    }

    #[tokio::test]
    async fn mux_with_no_sources_still_emits_a_valid_header() {
        let mut session = MuxSession::new(MuxConfig::default());
        let mut sink = sink().await;
        let summaries = session.run(&mut sink).await.unwrap();

        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].bytes_written > 0);
        assert_eq!(summaries[0].clusters_written, 0);
        assert_eq!(summaries[0].cues_written, 0);
    }

    struct CountingSink {
        remaining: u32,
    }

    #[async_trait]
    impl OutputSink for CountingSink {
        async fn open_next(&mut self) -> Result<Io, MuxError> {
            if self.remaining == 0 {
                return Err(MuxError::Reader(ReaderError::Unsupported("no more parts".to_string())));
            }
            self.remaining -= 1;
            Ok(Io::from_stream(Box::new(tokio::io::sink())))
        }
    }

    #[tokio::test]
    async fn splitting_by_duration_chains_segment_uids_across_files() {
        let mut reader = AacReader::new(sample_stream(8));
        reader.read_headers().unwrap();
        let sample_rate = reader.sample_rate();
        let channels = reader.channels();
        let codec_private = reader.codec_private();
        let default_duration_ns = reader.default_duration_ns();

        let packetizer = AacPacketizer::new(sample_rate, channels, codec_private, default_duration_ns);

        let mut session = MuxSession::new(MuxConfig::default());
        session
            .add_source(
                Box::new(AacReader::new(sample_stream(8))),
                Box::new(packetizer),
                Some(default_duration_ns as i64),
                CueStrategy::IFrames,
            )
            .unwrap();
        // ~21.3ms/frame, 8 frames span ~170ms; split at 100ms forces
        // exactly one split.
        session.set_split_by_duration(100_000_000);

        let mut sink = CountingSink { remaining: 2 };
        let summaries = session.run(&mut sink).await.unwrap();

        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.bytes_written > 0));
    }
}
