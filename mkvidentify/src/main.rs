//! `mkvidentify`: probes one or more elementary streams and prints each
//! track's identification line, grounded in §4.6 `Reader::identify`.
//! No muxing, no output file — just the sniff-then-describe half of
//! `mkvmux`'s pipeline, standalone.

use anyhow::Context;
use bytes::Bytes;

use mkvmux::probe::{identify_format, InputFormat};
use mkvmux::reader::Reader;
use mkvmux::readers::aac::AacReader;
use mkvmux::readers::ivf::IvfReader;
use mkvmux::readers::mp3::Mp3Reader;
use mkvmux::readers::subtitle::SubtitleReader;

fn identify_one(path: &std::ffi::OsStr) -> anyhow::Result<Vec<String>> {
    let data = Bytes::from(std::fs::read(path).with_context(|| format!("reading {path:?}"))?);
    let format = identify_format(&data).with_context(|| format!("{path:?}: could not identify format"))?;

    let mut reader: Box<dyn Reader> = match format {
        InputFormat::Aac => Box::new(AacReader::new(data)),
        InputFormat::Ivf => Box::new(IvfReader::new(data)?),
        InputFormat::Mp3 => Box::new(Mp3Reader::new(data)),
        InputFormat::Subtitle => Box::new(SubtitleReader::new(data)?),
    };

    reader.read_headers()?;
    Ok(reader.identify())
}

fn run() -> anyhow::Result<()> {
    let mut parser = lexopt::Parser::from_env();
    let mut inputs = Vec::new();

    use lexopt::Arg::*;

    while let Some(arg) = parser.next().context("failed parsing arguments")? {
        match arg {
            Value(path) => inputs.push(path),
            Short('i') => inputs.push(parser.value()?),
            _ => return Err(arg.unexpected()).context("failed parsing arguments")?,
        }
    }

    if inputs.is_empty() {
        anyhow::bail!("usage: mkvidentify <file> [<file> ...]");
    }

    for path in &inputs {
        println!("{path:?}:");
        match identify_one(path) {
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

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}
