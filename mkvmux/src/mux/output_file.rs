//! Output file assembly (§4.13, §6.3): EBML header, an unknown-size
//! Segment streamed cluster-by-cluster, and the trailing Cues.
//!
//! The Segment is written with EBML's "unknown size" marker rather than
//! buffered and back-patched: this core writes forward-only through
//! [`crate::io::Io`], so the final Segment size can't be known until the
//! last Cue is appended, and an unknown-size master is legal as long as
//! it's the last (here: only) element at its level — EOF terminates it.

use rand::RngCore;
use thiserror::Error;

use crate::cluster_helper::CuePoint;
use crate::ebml::varint::{encoded_id_len, write_id, write_size, UNKNOWN_SIZE};
use crate::ebml::{EbmlError, Element, Master};
use crate::io::{Io, IoError};
use crate::matroska_ids::{
    CUES_CONTEXT, CUES_ID, CUE_BLOCK_NUMBER_ID, CUE_CLUSTER_POSITION_ID, CUE_POINT_CONTEXT, CUE_POINT_ID,
    CUE_TIME_ID, CUE_TRACK_ID, CUE_TRACK_POSITIONS_CONTEXT, CUE_TRACK_POSITIONS_ID, DOC_TYPE_ID,
    DOC_TYPE_READ_VERSION_ID, DOC_TYPE_VERSION_ID, DURATION_ID, EBML_HEADER_CONTEXT, EBML_HEADER_ID,
    INFO_CONTEXT, INFO_ID, MUXING_APP_ID, NEXT_UID_ID, PREV_UID_ID, SEGMENT_ID, SEGMENT_UID_ID,
    TIMECODE_SCALE_ID, TITLE_ID, TRACKS_CONTEXT, TRACKS_ID, WRITING_APP_ID,
};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error(transparent)]
    Ebml(#[from] EbmlError),
    #[error(transparent)]
    Io(#[from] IoError),
}

/// A 128-bit Segment UID (§4.9 "On a split"), carried through `PrevUID`/
/// `NextUID` to link consecutive files of a split.
pub fn random_segment_uid() -> [u8; 16] {
    let mut uid = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut uid);
    uid
}

pub struct OutputFile {
    doc_type: &'static str,
    segment_uid: [u8; 16],
    prev_uid: Option<[u8; 16]>,
    next_uid: Option<[u8; 16]>,
    timecode_scale: u64,
    duration_ns: Option<i64>,
    title: Option<String>,
    muxing_app: String,
    writing_app: String,
    track_entries: Vec<Master>,
    chapters: Option<Master>,
    bytes_written: u64,
}

impl OutputFile {
    pub fn new(doc_type: &'static str, timecode_scale: u64) -> Self {
        OutputFile {
            doc_type,
            segment_uid: random_segment_uid(),
            prev_uid: None,
            next_uid: None,
            timecode_scale,
            duration_ns: None,
            title: None,
            muxing_app: format!("mkvmux {}", env!("CARGO_PKG_VERSION")),
            writing_app: format!("mkvmux {}", env!("CARGO_PKG_VERSION")),
            track_entries: Vec::new(),
            chapters: None,
            bytes_written: 0,
        }
    }

    pub fn segment_uid(&self) -> [u8; 16] {
        self.segment_uid
    }

    pub fn set_prev_uid(&mut self, uid: [u8; 16]) {
        self.prev_uid = Some(uid);
    }

    pub fn set_next_uid(&mut self, uid: [u8; 16]) {
        self.next_uid = Some(uid);
    }

    pub fn set_duration_ns(&mut self, ns: i64) {
        self.duration_ns = Some(ns);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn push_track_entry(&mut self, entry: Master) {
        self.track_entries.push(entry);
    }

    pub fn set_chapters(&mut self, chapters: Master) {
        self.chapters = Some(chapters);
    }

    /// Bytes written so far, counted from the first byte after the EBML
    /// header (i.e. Segment data start) — the reference frame
    /// `CueClusterPosition` and the §4.9 split-by-size threshold use.
    pub fn segment_bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Writes the EBML header, the Segment ID and unknown-size marker,
    /// Info, Tracks and (if set) Chapters. Must run before any cluster.
    pub async fn write_header(&mut self, io: &mut Io) -> Result<(), OutputError> {
        let mut header = Master::with_id(EBML_HEADER_ID, &EBML_HEADER_CONTEXT);
        header.find_first_mut(DOC_TYPE_ID).unwrap().set_str(self.doc_type);
        if self.doc_type == "webm" {
            header.find_first_mut(DOC_TYPE_VERSION_ID).unwrap().set_uint(2);
            header.find_first_mut(DOC_TYPE_READ_VERSION_ID).unwrap().set_uint(2);
        }

        let mut out = Vec::new();
        Element::Master(header).render(true, true, &mut out)?;

        write_id(SEGMENT_ID, encoded_id_len(SEGMENT_ID), &mut out);
        write_size(UNKNOWN_SIZE, None, &mut out).expect("unknown size marker always fits");

        let segment_start = out.len();

        Element::Master(self.render_info()).render(true, true, &mut out)?;

        let mut tracks = Master::with_id(TRACKS_ID, &TRACKS_CONTEXT);
        for entry in self.track_entries.drain(..) {
            tracks.push(Element::Master(entry));
        }
        Element::Master(tracks).render(true, true, &mut out)?;

        if let Some(chapters) = self.chapters.take() {
            Element::Master(chapters).render(true, true, &mut out)?;
        }

        self.bytes_written += (out.len() - segment_start) as u64;
        io.write(&out).await?;
        Ok(())
    }

    fn render_info(&self) -> Master {
        let mut info = Master::with_id(INFO_ID, &INFO_CONTEXT);
        info.find_first_mut(TIMECODE_SCALE_ID).unwrap().set_uint(self.timecode_scale);

        let mut uid_elem = INFO_CONTEXT.spec_for(SEGMENT_UID_ID).unwrap().instantiate();
        uid_elem.set_binary(self.segment_uid.to_vec());
        info.push(uid_elem);

        if let Some(prev) = self.prev_uid {
            let mut elem = INFO_CONTEXT.spec_for(PREV_UID_ID).unwrap().instantiate();
            elem.set_binary(prev.to_vec());
            info.push(elem);
        }

        if let Some(next) = self.next_uid {
            let mut elem = INFO_CONTEXT.spec_for(NEXT_UID_ID).unwrap().instantiate();
            elem.set_binary(next.to_vec());
            info.push(elem);
        }

        if let Some(duration_ns) = self.duration_ns {
            let mut elem = INFO_CONTEXT.spec_for(DURATION_ID).unwrap().instantiate();
            elem.set_float(duration_ns as f64 / self.timecode_scale as f64);
            info.push(elem);
        }

        if let Some(title) = &self.title {
            let mut elem = INFO_CONTEXT.spec_for(TITLE_ID).unwrap().instantiate();
            elem.set_str(title.clone());
            info.push(elem);
        }

        info.find_first_mut(MUXING_APP_ID).unwrap().set_str(self.muxing_app.clone());
        info.find_first_mut(WRITING_APP_ID).unwrap().set_str(self.writing_app.clone());

        info
    }

    /// Streams one already-rendered Cluster (from
    /// `ClusterHelper::rendered_clusters`) straight to `io`.
    pub async fn write_cluster(&mut self, io: &mut Io, cluster_bytes: &[u8]) -> Result<(), OutputError> {
        io.write(cluster_bytes).await?;
        self.bytes_written += cluster_bytes.len() as u64;
        Ok(())
    }

    /// Writes the trailing Cues (§4.9 "cue strategy"). `cues` must carry
    /// true Segment-relative byte offsets in `cluster_position` (the
    /// session remaps `ClusterHelper`'s cluster-index form before
    /// calling this). A no-op for an empty cue list.
    pub async fn finish(&mut self, io: &mut Io, cues: &[CuePoint]) -> Result<(), OutputError> {
        if cues.is_empty() {
            return Ok(());
        }

        let mut cues_master = Master::with_id(CUES_ID, &CUES_CONTEXT);

        for cue in cues {
            let mut point = Master::with_id(CUE_POINT_ID, &CUE_POINT_CONTEXT);
            point.find_first_mut(CUE_TIME_ID).unwrap().set_uint(cue.timecode_scaled.max(0) as u64);

            let mut positions = CUE_POINT_CONTEXT.spec_for(CUE_TRACK_POSITIONS_ID).unwrap().instantiate();
            if let Some(positions_master) = positions.as_master_mut() {
                positions_master.find_first_mut(CUE_TRACK_ID).unwrap().set_uint(cue.track_number);
                positions_master
                    .find_first_mut(CUE_CLUSTER_POSITION_ID)
                    .unwrap()
                    .set_uint(cue.cluster_position);

                if let Some(block_index) = cue.block_index {
                    let mut elem = CUE_TRACK_POSITIONS_CONTEXT.spec_for(CUE_BLOCK_NUMBER_ID).unwrap().instantiate();
                    elem.set_uint(block_index);
                    positions_master.push(elem);
                }
            }
            point.push(positions);
            cues_master.push(Element::Master(point));
        }

        let mut out = Vec::new();
        Element::Master(cues_master).render(true, true, &mut out)?;
        self.bytes_written += out.len() as u64;
        io.write(&out).await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::track::{TrackEntryBuilder, TrackIdAllocator, TrackType};

    #[tokio::test]
    async fn write_header_emits_ebml_and_segment_markers() {
        let mut allocator = TrackIdAllocator::new();
        let (entry, _, _) = TrackEntryBuilder::new(TrackType::Subtitle, "S_TEXT/UTF8")
            .build(&mut allocator)
            .unwrap();

        let mut file = OutputFile::new("matroska", 1_000_000);
        file.push_track_entry(entry);

        let mut io = Io::from_stream(Box::new(tokio::io::sink()));
        file.write_header(&mut io).await.unwrap();

        assert!(file.segment_bytes_written() > 0);
    }
}
