//! Reader contract (§4.6): the external-collaborator interface every
//! elementary-stream reader implements. Concrete readers live under
//! `readers/`.

use thiserror::Error;

use crate::packetizer::{Packetizer, PacketizerError};

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("malformed input: {0}")]
    Malformed(String),
    #[error(transparent)]
    Packetizer(#[from] PacketizerError),
    #[error("unsupported feature: {0}")]
    Unsupported(String),
}

/// Result of one `read()` call (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// More packets may still be produced.
    MoreData,
    /// The reader has no more data to emit.
    Done,
    /// Backpressure: an appended source has not yet drained.
    Holding,
}

/// A track surfaced by `read_headers()`, prior to packetizer creation.
#[derive(Debug, Clone)]
pub struct TrackInfo {
    pub track_id: u64,
    pub codec_id: String,
    pub name: Option<String>,
    pub language: Option<String>,
}

/// Every elementary-stream reader (§4.6). `probe` is a free function per
/// concrete reader (static signature sniff) rather than a trait method,
/// since it must run before any reader instance exists; see `probe.rs`.
pub trait Reader {
    /// Populates in-memory track/attachment/chapter state from the
    /// input. Must leave the reader positioned where `read()` resumes.
    fn read_headers(&mut self) -> Result<Vec<TrackInfo>, ReaderError>;

    /// Prints (returns, here) a human-readable identification summary
    /// per track, for `mkvidentify`-style output.
    fn identify(&self) -> Vec<String>;

    /// Emits zero or more packets into `packetizer`. `force` requests a
    /// best-effort flush of any buffered frame even if more data might
    /// still arrive (used when upstream signals end-of-file).
    fn read(&mut self, packetizer: &mut dyn Packetizer, force: bool) -> Result<FileStatus, ReaderError>;

    /// Progress estimate in the 0..=100 range.
    fn get_progress(&self) -> u8;
}
