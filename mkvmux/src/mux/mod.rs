//! Muxing control plane and output assembly (§4.13, §5).

pub mod output_file;
pub mod session;

pub use output_file::{random_segment_uid, OutputError, OutputFile};
pub use session::{MuxConfig, MuxError, MuxSession, MuxSummary, OutputSink, SingleFileSink};
