//! Signature sniffing (§4.6 `probe`, §6.2, §6.6): constant-bounded,
//! read-only checks run before a reader is instantiated.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProbeResult {
    No,
    Maybe,
    Yes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Aac,
    Ivf,
    Mp3,
    Subtitle,
}

/// Matroska/WebM container probe (§6.2): EBML ID, then a DocType of
/// "matroska" or "webm" within the header. Used by `mkvmux` itself only
/// when re-muxing an existing Matroska file is added later; kept here
/// since it shares the sniffing idiom with the elementary-stream probes.
pub fn probe_matroska(data: &[u8]) -> ProbeResult {
    let data = strip_bom(data);
    if data.len() < 4 || data[0..4] != [0x1A, 0x45, 0xDF, 0xA3] {
        return ProbeResult::No;
    }

    let text = String::from_utf8_lossy(data);
    if text.contains("matroska") || text.contains("webm") {
        ProbeResult::Yes
    } else {
        ProbeResult::Maybe
    }
}

fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// ADTS sync: 12 ones, then the MPEG version bit. No version/layer
/// validation here since §4.7 does that in the reader proper.
pub fn probe_aac(data: &[u8]) -> ProbeResult {
    if data.len() < 7 {
        return ProbeResult::Maybe;
    }
    if data[0] == 0xFF && (data[1] & 0xF0) == 0xF0 {
        ProbeResult::Yes
    } else {
        ProbeResult::No
    }
}

/// IVF signature (§6.6): `DKIF` magic.
pub fn probe_ivf(data: &[u8]) -> ProbeResult {
    if data.len() < 4 {
        return ProbeResult::Maybe;
    }
    if &data[0..4] == b"DKIF" {
        ProbeResult::Yes
    } else {
        ProbeResult::No
    }
}

/// MP3 frame sync: 11 set bits, then a valid (non-reserved) MPEG
/// version/layer combination in the next nibble.
pub fn probe_mp3(data: &[u8]) -> ProbeResult {
    if data.len() < 4 {
        return ProbeResult::Maybe;
    }
    if data[0] != 0xFF || (data[1] & 0xE0) != 0xE0 {
        return ProbeResult::No;
    }
    let version = (data[1] >> 3) & 0x03;
    let layer = (data[1] >> 1) & 0x03;
    if version == 0x01 || layer == 0x00 {
        return ProbeResult::No;
    }
    ProbeResult::Yes
}

/// Raw text subtitles have no magic; anything that decodes as UTF-8 and
/// contains at least one newline is a `Maybe`.
pub fn probe_subtitle(data: &[u8]) -> ProbeResult {
    if std::str::from_utf8(data).is_ok() && data.contains(&b'\n') {
        ProbeResult::Maybe
    } else {
        ProbeResult::No
    }
}

/// Runs every elementary-stream probe and keeps the strongest match,
/// ties broken by declaration order (§4.6: "signature sniff").
pub fn identify_format(data: &[u8]) -> Option<InputFormat> {
    let candidates = [
        (InputFormat::Ivf, probe_ivf(data)),
        (InputFormat::Aac, probe_aac(data)),
        (InputFormat::Mp3, probe_mp3(data)),
        (InputFormat::Subtitle, probe_subtitle(data)),
    ];

    candidates
        .into_iter()
        .filter(|(_, r)| *r != ProbeResult::No)
        .max_by_key(|(_, r)| *r)
        .map(|(fmt, _)| fmt)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ivf_signature_wins_over_aac_false_positive() {
        let mut data = b"DKIF".to_vec();
        data.extend_from_slice(&[0u8; 28]);
        assert_eq!(probe_ivf(&data), ProbeResult::Yes);
        assert_eq!(identify_format(&data), Some(InputFormat::Ivf));
    }

    #[test]
    fn aac_adts_sync_detected() {
        let data = [0xFF, 0xF1, 0x4C, 0x80, 0x1F, 0xFC, 0x00];
        assert_eq!(probe_aac(&data), ProbeResult::Yes);
    }

    #[test]
    fn mp3_rejects_reserved_layer() {
        let data = [0xFF, 0xE2, 0x00, 0x00];
        assert_eq!(probe_mp3(&data), ProbeResult::No);
    }

    #[test]
    fn matroska_header_detected() {
        let mut data = vec![0x1A, 0x45, 0xDF, 0xA3];
        data.extend_from_slice(b"matroska");
        assert_eq!(probe_matroska(&data), ProbeResult::Yes);
    }
}
