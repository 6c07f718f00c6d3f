//! Thin `mkvmux` CLI (§2): `-i <file>` once per input, `-o <file>` for
//! the output; everything else is defaults. `mkvmux-cli` is the
//! friendlier multi-subcommand wrapper over the same library calls.

use anyhow::Context;
use bytes::Bytes;

use mkvmux::cluster_helper::CueStrategy;
use mkvmux::io::Io;
use mkvmux::mux::{MuxConfig, MuxSession, SingleFileSink};
use mkvmux::packetizer::Packetizer;
use mkvmux::probe::{identify_format, InputFormat};
use mkvmux::packetizers::aac::AacPacketizer;
use mkvmux::packetizers::mp3::Mp3Packetizer;
use mkvmux::packetizers::subtitle::SubtitlePacketizer;
use mkvmux::packetizers::vpx::VpxPacketizer;
use mkvmux::readers::aac::AacReader;
use mkvmux::readers::ivf::IvfReader;
use mkvmux::readers::mp3::Mp3Reader;
use mkvmux::readers::subtitle::SubtitleReader;
use mkvmux::reader::Reader;

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

async fn run() -> anyhow::Result<()> {
    let mut parser = lexopt::Parser::from_env();

    let mut inputs = Vec::new();
    let mut output = None;

    use lexopt::Arg::*;

    while let Some(arg) = parser.next().context("failed parsing arguments")? {
        match arg {
            Short('i') => {
                inputs.push(parser.value()?);
            }
            Short('o') => {
                output = Some(parser.value()?);
            }
            _ => return Err(arg.unexpected()).context("failed parsing arguments")?,
        }
    }

    let output = output.context("missing required -o <output>")?;

    let mut session = MuxSession::new(MuxConfig::default());
    for path in &inputs {
        let data = Bytes::from(std::fs::read(path).with_context(|| format!("reading {path:?}"))?);
        let source = build_source(data)?;
        session.add_source(source.reader, source.packetizer, source.default_duration_ns, CueStrategy::IFrames)?;
    }

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

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}
