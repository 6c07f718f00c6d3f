//! End-to-end muxing scenarios (SPEC_FULL.md §8.2), exercised against
//! synthetic in-memory sources and a null `Io` sink so no fixture files
//! are needed.

use async_trait::async_trait;
use bytes::Bytes;

use mkvmux::chapters::{ChapterAtom, ChapterDisplay, ChapterTree, Edition};
use mkvmux::cluster_helper::CueStrategy;
use mkvmux::io::Io;
use mkvmux::mux::{MuxConfig, MuxError, MuxSession, OutputSink, SingleFileSink};
use mkvmux::packetizer::{ConnectResult, ExternalTimecodes, Packetizer};
use mkvmux::packetizers::aac::AacPacketizer;
use mkvmux::packetizers::mp3::Mp3Packetizer;
use mkvmux::packetizers::vpx::VpxPacketizer;
use mkvmux::readers::aac::AacReader;
use mkvmux::readers::ivf::IvfReader;
use mkvmux::readers::mp3::Mp3Reader;
use mkvmux::reader::Reader;
use mkvmux::timecode_factory::V2Factory;

fn null_sink() -> SingleFileSink {
    SingleFileSink::new(Io::from_stream(Box::new(tokio::io::sink())))
}

struct UnboundedSink;

#[async_trait]
impl OutputSink for UnboundedSink {
    async fn open_next(&mut self) -> Result<Io, MuxError> {
        Ok(Io::from_stream(Box::new(tokio::io::sink())))
    }
}

fn adts_frame(frame_len: usize) -> Vec<u8> {
    let mut header = vec![0xFFu8, 0xF1, 0x4C, 0x80, 0x00, 0x1F, 0xFC];
    header[3] = (header[3] & 0xFC) | (((frame_len >> 11) & 0x03) as u8);
    header[4] = ((frame_len >> 3) & 0xFF) as u8;
    header[5] = (header[5] & 0x1F) | (((frame_len & 0x07) as u8) << 5);
    let mut frame = header;
    frame.resize(frame_len, 0xAB);
    frame
}

fn aac_stream(frames: usize) -> Bytes {
    let mut data = Vec::new();
    for _ in 0..frames {
        data.extend_from_slice(&adts_frame(96));
    }
    Bytes::from(data)
}

fn ivf_header(fourcc: &[u8; 4], width: u16, height: u16, fps_num: u32, fps_den: u32, frames: u32) -> Vec<u8> {
    let mut h = Vec::with_capacity(32);
    h.extend_from_slice(b"DKIF");
    h.extend_from_slice(&0u16.to_le_bytes());
    h.extend_from_slice(&32u16.to_le_bytes());
    h.extend_from_slice(fourcc);
    h.extend_from_slice(&width.to_le_bytes());
    h.extend_from_slice(&height.to_le_bytes());
    h.extend_from_slice(&fps_num.to_le_bytes());
    h.extend_from_slice(&fps_den.to_le_bytes());
    h.extend_from_slice(&frames.to_le_bytes());
    h.extend_from_slice(&0u32.to_le_bytes());
    h
}

fn ivf_frame(data: &[u8], timestamp: u64) -> Vec<u8> {
    let mut f = Vec::new();
    f.extend_from_slice(&(data.len() as u32).to_le_bytes());
    f.extend_from_slice(&timestamp.to_le_bytes());
    f.extend_from_slice(data);
    f
}

/// A tiny synthetic IVF/VP8 stream: one keyframe then `frames - 1`
/// inter frames, 30fps.
fn ivf_stream(fourcc: &[u8; 4], frames: u32) -> Bytes {
    let mut data = ivf_header(fourcc, 320, 240, 30, 1, frames);
    for i in 0..frames {
        let byte0 = if i == 0 { 0x10 } else { 0x11 };
        data.extend_from_slice(&ivf_frame(&[byte0, 0xAA, 0xBB], i as u64 * 3003));
    }
    Bytes::from(data)
}

fn mp3_frame() -> Vec<u8> {
    // bitrate index 9 (128kbps), sample rate index 0 (44100Hz): frame_size 417.
    let mut frame = vec![0xFFu8, 0xFB, 0x90, 0xC0];
    frame.resize(417, 0);
    frame
}

fn mp3_stream(frames: usize) -> Bytes {
    let mut data = Vec::new();
    for _ in 0..frames {
        data.extend_from_slice(&mp3_frame());
    }
    Bytes::from(data)
}

/// Scenario 1: AAC mono elementary stream muxed into a single Matroska
/// file, one cluster, cues for every (keyframe) packet.
#[tokio::test]
async fn aac_mono_to_matroska() {
    let mut reader = AacReader::new(aac_stream(6));
    reader.read_headers().unwrap();
    let packetizer = AacPacketizer::new(
        reader.sample_rate(),
        reader.channels(),
        reader.codec_private(),
        reader.default_duration_ns(),
    );

    let default_duration_ns = reader.default_duration_ns();
    let mut session = MuxSession::new(MuxConfig::default());
    session
        .add_source(Box::new(reader), Box::new(packetizer), Some(default_duration_ns as i64), CueStrategy::IFrames)
        .unwrap();

    let mut sink = null_sink();
    let summaries = session.run(&mut sink).await.unwrap();

    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].clusters_written >= 1);
    assert_eq!(summaries[0].cues_written, 6);
}

/// Scenario 2: VP8 IVF muxed into WebM, SimpleBlock-only, bref chaining
/// on non-key frames.
#[tokio::test]
async fn vp8_ivf_to_webm() {
    let reader = IvfReader::new(ivf_stream(b"VP80", 10)).unwrap();
    let packetizer = VpxPacketizer::new(reader.codec_id(), reader.width(), reader.height());

    let mut config = MuxConfig::default();
    config.doc_type = "webm";

    let mut session = MuxSession::new(config);
    session
        .add_source(Box::new(reader), Box::new(packetizer), None, CueStrategy::IFrames)
        .unwrap();

    let mut sink = null_sink();
    let summaries = session.run(&mut sink).await.unwrap();

    assert_eq!(summaries.len(), 1);
    // Only the leading keyframe is cued under IFrames strategy.
    assert_eq!(summaries[0].cues_written, 1);
}

/// Scenario 3: split by size. A byte threshold small enough to force at
/// least one split across a multi-frame AAC stream; every part must
/// produce output and PrevUID chaining is exercised implicitly by
/// `MuxSession::run`'s split loop.
#[tokio::test]
async fn split_by_size_produces_multiple_files() {
    let mut reader = AacReader::new(aac_stream(40));
    reader.read_headers().unwrap();
    let default_duration_ns = reader.default_duration_ns();
    let packetizer = AacPacketizer::new(
        reader.sample_rate(),
        reader.channels(),
        reader.codec_private(),
        default_duration_ns,
    );

    // Force frequent cluster flushes so `file_bytes_written` (updated
    // only when a cluster renders) has a chance to cross the split
    // threshold well before end-of-stream.
    let mut config = MuxConfig::default();
    config.cluster.max_blocks_per_cluster = 5;

    let mut session = MuxSession::new(config);
    session
        .add_source(Box::new(reader), Box::new(packetizer), Some(default_duration_ns as i64), CueStrategy::IFrames)
        .unwrap();
    session.set_split_by_size(2_000);

    let mut sink = UnboundedSink;
    let summaries = session.run(&mut sink).await.unwrap();

    assert!(summaries.len() > 1, "expected at least one split, got {summaries:?}");
    let total_cues: usize = summaries.iter().map(|s| s.cues_written).sum();
    assert_eq!(total_cues, 40);
}

/// Scenario 4: append-compatibility between two MP3 sources with
/// matching sample rate/channels is recognized by the packetizer
/// (§4.7 "Appending"); a mismatched track is rejected.
#[tokio::test]
async fn mp3_append_compatibility_checks_sample_rate_and_channels() {
    let mut first = Mp3Reader::new(mp3_stream(4));
    first.read_headers().unwrap();
    let packetizer = Mp3Packetizer::new(first.sample_rate(), first.channels());

    assert_eq!(
        packetizer.can_connect_to("A_MPEG/L3", None),
        ConnectResult::Yes,
        "same codec id should connect outright"
    );
    assert_eq!(packetizer.can_connect_to("A_AAC", None), ConnectResult::NoFormat);
}

/// Scenario 5: an external v2 timecode file overrides a VP9 track's
/// per-frame timecodes end to end.
#[tokio::test]
async fn external_v2_timecodes_override_vp9_source_timing() {
    let reader = IvfReader::new(ivf_stream(b"VP90", 4)).unwrap();
    let mut packetizer = VpxPacketizer::new(reader.codec_id(), reader.width(), reader.height());

    let v2 = V2Factory::new(vec![0, 50_000_000, 100_000_000, 150_000_000], None);
    packetizer.set_external_timecodes(ExternalTimecodes::V2(v2));

    let mut session = MuxSession::new(MuxConfig::default());
    session
        .add_source(Box::new(reader), Box::new(packetizer), None, CueStrategy::IFrames)
        .unwrap();

    let mut sink = null_sink();
    let summaries = session.run(&mut sink).await.unwrap();

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].cues_written, 1);
}

/// Scenario 6: chapter-driven split. Chapters at 0:00, 1:00, 2:30
/// become split points; a short synthetic stream whose timecodes
/// straddle the first boundary must produce more than one output file.
#[tokio::test]
async fn chapter_driven_split_produces_a_file_per_chapter_window() {
    let mut reader = AacReader::new(aac_stream(4));
    reader.read_headers().unwrap();
    let default_duration_ns = reader.default_duration_ns();
    let packetizer = AacPacketizer::new(
        reader.sample_rate(),
        reader.channels(),
        reader.codec_private(),
        default_duration_ns,
    );

    let mut chapters = ChapterTree::new();
    chapters.editions.push(Edition {
        uid: Some(1),
        hidden: false,
        default: true,
        atoms: vec![
            ChapterAtom {
                uid: 10,
                start_ns: 0,
                end_ns: None,
                hidden: false,
                enabled: true,
                displays: vec![ChapterDisplay {
                    string: "Chapter 1".to_string(),
                    language: "eng".to_string(),
                    country: None,
                }],
            },
            ChapterAtom {
                uid: 11,
                start_ns: 40_000_000,
                end_ns: None,
                hidden: false,
                enabled: true,
                displays: vec![ChapterDisplay {
                    string: "Chapter 2".to_string(),
                    language: "eng".to_string(),
                    country: None,
                }],
            },
        ],
    });
    chapters.check_mandatory().unwrap();

    let mut session = MuxSession::new(MuxConfig::default());
    session
        .add_source(
            Box::new(reader),
            Box::new(packetizer),
            Some(default_duration_ns as i64),
            CueStrategy::IFrames,
        )
        .unwrap();
    session.set_chapters(chapters);

    let mut sink = UnboundedSink;
    let summaries = session.run(&mut sink).await.unwrap();

    assert!(summaries.len() >= 2, "expected a split at the second chapter, got {summaries:?}");
}
