//! `mkvmux-cli`: a friendlier front door over the `mkvmux` library with
//! three subcommands — `mux`, `identify`, `split` — instead of the
//! single-shot `-i`/`-o` surface of the plain `mkvmux` binary.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

use mkvmux::cluster_helper::CueStrategy;
use mkvmux::io::Io;
use mkvmux::mux::{MuxConfig, MuxError, MuxSession, OutputSink, SingleFileSink};
use mkvmux::packetizer::Packetizer;
use mkvmux::packetizers::aac::AacPacketizer;
use mkvmux::packetizers::mp3::Mp3Packetizer;
use mkvmux::packetizers::subtitle::SubtitlePacketizer;
use mkvmux::packetizers::vpx::VpxPacketizer;
use mkvmux::probe::{identify_format, InputFormat};
use mkvmux::reader::Reader;
use mkvmux::readers::aac::AacReader;
use mkvmux::readers::ivf::IvfReader;
use mkvmux::readers::mp3::Mp3Reader;
use mkvmux::readers::subtitle::SubtitleReader;

struct Source {
    reader: Box<dyn Reader>,
    packetizer: Box<dyn Packetizer>,
    default_duration_ns: Option<i64>,
}

fn build_source(data: Bytes) -> anyhow::Result<Source> {
    let format = identify_format(&data).context("could not identify input format")?;

    let source = match format {
        InputFormat::Aac => {
            let mut reader = AacReader::new(data);
            reader.read_headers()?;
            let packetizer = AacPacketizer::new(
                reader.sample_rate(),
                reader.channels(),
                reader.codec_private(),
                reader.default_duration_ns(),
            );
            Source {
                default_duration_ns: Some(reader.default_duration_ns() as i64),
                reader: Box::new(reader),
                packetizer: Box::new(packetizer),
            }
        }
        InputFormat::Ivf => {
            let reader = IvfReader::new(data)?;
            let packetizer = VpxPacketizer::new(reader.codec_id(), reader.width(), reader.height());
            Source {
                default_duration_ns: None,
                reader: Box::new(reader),
                packetizer: Box::new(packetizer),
            }
        }
        InputFormat::Mp3 => {
            let mut reader = Mp3Reader::new(data);
            reader.read_headers()?;
            let packetizer = Mp3Packetizer::new(reader.sample_rate(), reader.channels());
            Source {
                default_duration_ns: None,
                reader: Box::new(reader),
                packetizer: Box::new(packetizer),
            }
        }
        InputFormat::Subtitle => {
            let reader = SubtitleReader::new(data)?;
            let packetizer = SubtitlePacketizer::new("S_TEXT/UTF8");
            Source {
                default_duration_ns: None,
                reader: Box::new(reader),
                packetizer: Box::new(packetizer),
            }
        }
    };

    Ok(source)
}

async fn build_session(inputs: &[OsString], title: Option<String>) -> anyhow::Result<MuxSession> {
    let mut config = MuxConfig::default();
    config.title = title;
    let mut session = MuxSession::new(config);

    for path in inputs {
        let data = Bytes::from(std::fs::read(path).with_context(|| format!("reading {path:?}"))?);
        let source = build_source(data)?;
        session.add_source(source.reader, source.packetizer, source.default_duration_ns, CueStrategy::IFrames)?;
    }

    Ok(session)
}

/// Output naming under splitting (§6.3): `<stem>-<NNN>.<ext>`, 1-based,
/// 3-digit zero-padded. Each part gets its own fresh file from this
/// sink; there's no un-numbered first file once splitting is active.
struct NumberedFileSink {
    stem: PathBuf,
    ext: String,
    next_part: u32,
}

impl NumberedFileSink {
    fn new(output: &Path) -> Self {
        let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("mkv").to_string();
        let stem = output.with_extension("");
        NumberedFileSink { stem, ext, next_part: 1 }
    }

    fn next_path(&mut self) -> PathBuf {
        let part = self.next_part;
        self.next_part += 1;
        let stem_name = self.stem.file_name().and_then(|n| n.to_str()).unwrap_or("out").to_string();
        self.stem.with_file_name(format!("{stem_name}-{part:03}.{}", self.ext))
    }
}

#[async_trait]
impl OutputSink for NumberedFileSink {
    async fn open_next(&mut self) -> Result<Io, MuxError> {
        let path = self.next_path();
        eprintln!("opening {path:?}");
        Ok(Io::create_file(&path).await?)
    }
}

async fn cmd_mux(parser: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut inputs = Vec::new();
    let mut output = None;
    let mut title = None;

    use lexopt::Arg::*;
    while let Some(arg) = parser.next().context("failed parsing arguments")? {
        match arg {
            Short('i') | Long("input") => inputs.push(parser.value()?),
            Short('o') | Long("output") => output = Some(parser.value()?),
            Long("title") => title = Some(parser.value()?.to_string_lossy().into_owned()),
            _ => return Err(arg.unexpected()).context("failed parsing arguments")?,
        }
    }

    let output = output.context("missing required -o <output>")?;
    let mut session = build_session(&inputs, title).await?;

    let io = Io::create_file(&output).await?;
    let mut sink = SingleFileSink::new(io);
    let summaries = session.run(&mut sink).await?;

    for summary in &summaries {
        eprintln!(
            "wrote {} clusters, {} cues, {} bytes to {output:?}",
            summary.clusters_written, summary.cues_written, summary.bytes_written
        );
    }

    Ok(())
}

async fn cmd_split(parser: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut inputs = Vec::new();
    let mut output = None;
    let mut title = None;
    let mut split_size = None;
    let mut split_duration_secs = None;

    use lexopt::Arg::*;
    while let Some(arg) = parser.next().context("failed parsing arguments")? {
        match arg {
            Short('i') | Long("input") => inputs.push(parser.value()?),
            Short('o') | Long("output") => output = Some(parser.value()?),
            Long("title") => title = Some(parser.value()?.to_string_lossy().into_owned()),
            Long("split-size") => split_size = Some(parser.value()?.to_string_lossy().parse::<u64>()?),
            Long("split-duration") => split_duration_secs = Some(parser.value()?.to_string_lossy().parse::<f64>()?),
            _ => return Err(arg.unexpected()).context("failed parsing arguments")?,
        }
    }

    let output = output.context("missing required -o <output>")?;
    if split_size.is_none() && split_duration_secs.is_none() {
        anyhow::bail!("split requires --split-size <bytes> or --split-duration <seconds>");
    }

    let mut session = build_session(&inputs, title).await?;
    if let Some(bytes) = split_size {
        session.set_split_by_size(bytes);
    }
    if let Some(secs) = split_duration_secs {
        session.set_split_by_duration((secs * 1_000_000_000.0) as i64);
    }

    let mut sink = NumberedFileSink::new(Path::new(&output));
    let summaries = session.run(&mut sink).await?;

    eprintln!("wrote {} file(s)", summaries.len());
    for (i, summary) in summaries.iter().enumerate() {
        eprintln!(
            "  part {}: {} clusters, {} cues, {} bytes",
            i + 1,
            summary.clusters_written,
            summary.cues_written,
            summary.bytes_written
        );
    }

    Ok(())
}

fn cmd_identify(parser: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut inputs = Vec::new();

    use lexopt::Arg::*;
    while let Some(arg) = parser.next().context("failed parsing arguments")? {
        match arg {
            Value(path) => inputs.push(path),
            Short('i') | Long("input") => inputs.push(parser.value()?),
            _ => return Err(arg.unexpected()).context("failed parsing arguments")?,
        }
    }

    if inputs.is_empty() {
        anyhow::bail!("usage: mkvmux-cli identify <file> [<file> ...]");
    }

    for path in &inputs {
        println!("{path:?}:");
        let data = Bytes::from(std::fs::read(path).with_context(|| format!("reading {path:?}"))?);
        let format = identify_format(&data).with_context(|| format!("{path:?}: could not identify format"));
        let lines = match format {
            Ok(format) => {
                let mut reader: Box<dyn Reader> = match format {
                    InputFormat::Aac => Box::new(AacReader::new(data)),
                    InputFormat::Ivf => Box::new(IvfReader::new(data)?),
                    InputFormat::Mp3 => Box::new(Mp3Reader::new(data)),
                    InputFormat::Subtitle => Box::new(SubtitleReader::new(data)?),
                };
                reader.read_headers()?;
                Ok(reader.identify())
            }
            Err(e) => Err(e),
        };
        match lines {
            Ok(lines) => {
                for line in lines {
                    println!("  {line}");
                }
            }
            Err(e) => eprintln!("  failed to identify: {e:?}"),
        }
    }

    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let mut parser = lexopt::Parser::from_env();

    let subcommand = match parser.next().context("failed parsing arguments")? {
        Some(lexopt::Arg::Value(v)) => v.to_string_lossy().into_owned(),
        _ => anyhow::bail!("usage: mkvmux-cli <mux|identify|split> [args]"),
    };

    match subcommand.as_str() {
        "mux" => cmd_mux(&mut parser).await,
        "split" => cmd_split(&mut parser).await,
        "identify" => cmd_identify(&mut parser),
        other => anyhow::bail!("unknown subcommand {other:?}, expected mux|identify|split"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}
