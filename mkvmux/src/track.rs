//! Track entry construction (§3 "Track entry", §4.7 "Build the
//! TrackEntry lazily at `set_headers()` time"): a builder wrapping a
//! [`Master`] driven by [`matroska_ids::TRACK_ENTRY_CONTEXT`].

use rand::Rng;

use crate::content_encoding::ContentEncodingChain;
use crate::ebml::{Element, EbmlError, Master};
use crate::matroska_ids::{
    AUDIO_CONTEXT, AUDIO_ID, BIT_DEPTH_ID, CHANNELS_ID, CODEC_DELAY_ID, CODEC_ID_ID, CODEC_NAME_ID,
    CODEC_PRIVATE_ID, CONTENT_COMPRESSION_ID, CONTENT_COMP_ALGO_ID, CONTENT_COMP_SETTINGS_ID,
    CONTENT_ENCODING_ID, CONTENT_ENCODING_ORDER_ID, CONTENT_ENCODING_SCOPE_ID, CONTENT_ENCODING_TYPE_ID,
    CONTENT_ENCODINGS_CONTEXT, CONTENT_ENCODINGS_ID, CONTENT_ENCODING_CONTEXT, DEFAULT_DURATION_ID,
    DISPLAY_HEIGHT_ID, DISPLAY_WIDTH_ID, FLAG_LACING_ID, LANGUAGE_ID, MAX_CACHE_ID, MIN_CACHE_ID, NAME_ID,
    OUTPUT_SAMPLING_FREQUENCY_ID, PIXEL_HEIGHT_ID, PIXEL_WIDTH_ID, SAMPLING_FREQUENCY_ID, SEEK_PRE_ROLL_ID,
    TRACK_ENTRY_CONTEXT, TRACK_ENTRY_ID, TRACK_NUMBER_ID, TRACK_TYPE_ID, TRACK_UID_ID, VIDEO_ID,
};

/// TrackType values (Matroska spec, carried as domain knowledge since
/// the distilled spec names the set without enumerating the codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Video,
    Audio,
    Complex,
    Logo,
    Subtitle,
    Button,
    Control,
}

impl TrackType {
    fn code(self) -> u64 {
        match self {
            TrackType::Video => 1,
            TrackType::Audio => 2,
            TrackType::Complex => 3,
            TrackType::Logo => 0x10,
            TrackType::Subtitle => 0x11,
            TrackType::Button => 0x12,
            TrackType::Control => 0x20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VideoParams {
    pub pixel_width: u64,
    pub pixel_height: u64,
    pub display_width: Option<u64>,
    pub display_height: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AudioParams {
    pub sampling_frequency: f64,
    pub output_sampling_frequency: Option<f64>,
    pub channels: u64,
    pub bit_depth: Option<u64>,
}

/// Allocates unique (per-file) track numbers and random track UIDs
/// (§4.7: "assign track number (unique, from the global allocator), UID
/// (random unique)").
#[derive(Default)]
pub struct TrackIdAllocator {
    next_number: u64,
    used_uids: Vec<u64>,
}

impl TrackIdAllocator {
    pub fn new() -> Self {
        TrackIdAllocator {
            next_number: 1,
            used_uids: Vec::new(),
        }
    }

    pub fn next_track_number(&mut self) -> u64 {
        let n = self.next_number;
        self.next_number += 1;
        n
    }

    pub fn next_track_uid(&mut self) -> u64 {
        let mut rng = rand::thread_rng();
        loop {
            let candidate: u64 = rng.gen_range(1..=u64::MAX);
            if !self.used_uids.contains(&candidate) {
                self.used_uids.push(candidate);
                return candidate;
            }
        }
    }
}

pub struct TrackEntryBuilder {
    track_type: TrackType,
    codec_id: String,
    codec_private: Option<Vec<u8>>,
    codec_name: Option<String>,
    name: Option<String>,
    language: Option<String>,
    default_duration_ns: Option<u64>,
    min_cache: Option<u64>,
    max_cache: Option<u64>,
    lacing: bool,
    codec_delay_ns: Option<u64>,
    seek_pre_roll_ns: Option<u64>,
    video: Option<VideoParams>,
    audio: Option<AudioParams>,
    content_encodings: ContentEncodingChain,
}

impl TrackEntryBuilder {
    pub fn new(track_type: TrackType, codec_id: impl Into<String>) -> Self {
        TrackEntryBuilder {
            track_type,
            codec_id: codec_id.into(),
            codec_private: None,
            codec_name: None,
            name: None,
            language: None,
            default_duration_ns: None,
            min_cache: None,
            max_cache: None,
            lacing: true,
            codec_delay_ns: None,
            seek_pre_roll_ns: None,
            video: None,
            audio: None,
            content_encodings: ContentEncodingChain::default(),
        }
    }

    pub fn codec_private(mut self, data: Vec<u8>) -> Self {
        self.codec_private = Some(data);
        self
    }

    pub fn codec_name(mut self, name: impl Into<String>) -> Self {
        self.codec_name = Some(name.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn default_duration_ns(mut self, ns: u64) -> Self {
        self.default_duration_ns = Some(ns);
        self
    }

    pub fn lacing(mut self, enabled: bool) -> Self {
        self.lacing = enabled;
        self
    }

    pub fn min_cache(mut self, frames: u64) -> Self {
        self.min_cache = Some(frames);
        self
    }

    pub fn max_cache(mut self, frames: u64) -> Self {
        self.max_cache = Some(frames);
        self
    }

    pub fn codec_delay_ns(mut self, ns: u64) -> Self {
        self.codec_delay_ns = Some(ns);
        self
    }

    pub fn seek_pre_roll_ns(mut self, ns: u64) -> Self {
        self.seek_pre_roll_ns = Some(ns);
        self
    }

    pub fn video(mut self, params: VideoParams) -> Self {
        self.video = Some(params);
        self
    }

    pub fn audio(mut self, params: AudioParams) -> Self {
        self.audio = Some(params);
        self
    }

    pub fn content_encodings(mut self, chain: ContentEncodingChain) -> Self {
        self.content_encodings = chain;
        self
    }

    /// Builds the `TrackEntry` master, assigning TrackNumber/TrackUID
    /// from `allocator`.
    pub fn build(self, allocator: &mut TrackIdAllocator) -> Result<(Master, u64, u64), EbmlError> {
        let track_number = allocator.next_track_number();
        let track_uid = allocator.next_track_uid();

        let mut entry = Master::with_id(TRACK_ENTRY_ID, &TRACK_ENTRY_CONTEXT);

        // Only TrackNumber/TrackUID/TrackType/CodecID are mandatory+unique
        // and thus auto-instantiated by `Master::with_id`; everything
        // else (including FlagLacing and Language, which merely carry
        // defaults) must be pushed explicitly.
        entry.find_first_mut(TRACK_NUMBER_ID).unwrap().set_uint(track_number);
        entry.find_first_mut(TRACK_UID_ID).unwrap().set_uint(track_uid);
        entry.find_first_mut(TRACK_TYPE_ID).unwrap().set_uint(self.track_type.code());
        entry
            .find_first_mut(CODEC_ID_ID)
            .unwrap()
            .set_str(self.codec_id.clone());

        let mut lacing_elem = TRACK_ENTRY_CONTEXT.spec_for(FLAG_LACING_ID).unwrap().instantiate();
        lacing_elem.set_uint(self.lacing as u64);
        entry.push(lacing_elem);

        if let Some(data) = self.codec_private {
            let mut elem = TRACK_ENTRY_CONTEXT.spec_for(CODEC_PRIVATE_ID).unwrap().instantiate();
            elem.set_binary(data);
            entry.push(elem);
        }

        if let Some(name) = self.codec_name {
            let mut elem = TRACK_ENTRY_CONTEXT.spec_for(CODEC_NAME_ID).unwrap().instantiate();
            elem.set_str(name);
            entry.push(elem);
        }

        if let Some(name) = self.name {
            let mut elem = TRACK_ENTRY_CONTEXT.spec_for(NAME_ID).unwrap().instantiate();
            elem.set_str(name);
            entry.push(elem);
        }

        if let Some(lang) = self.language {
            let mut elem = TRACK_ENTRY_CONTEXT.spec_for(LANGUAGE_ID).unwrap().instantiate();
            elem.set_str(lang);
            entry.push(elem);
        }

        if let Some(ns) = self.default_duration_ns {
            let mut elem = TRACK_ENTRY_CONTEXT.spec_for(DEFAULT_DURATION_ID).unwrap().instantiate();
            elem.set_uint(ns);
            entry.push(elem);
        }

        if let Some(min) = self.min_cache {
            let mut elem = TRACK_ENTRY_CONTEXT.spec_for(MIN_CACHE_ID).unwrap().instantiate();
            elem.set_uint(min);
            entry.push(elem);
        }

        if let Some(max) = self.max_cache {
            let mut elem = TRACK_ENTRY_CONTEXT.spec_for(MAX_CACHE_ID).unwrap().instantiate();
            elem.set_uint(max);
            entry.push(elem);
        }

        if let Some(ns) = self.codec_delay_ns {
            let mut elem = TRACK_ENTRY_CONTEXT.spec_for(CODEC_DELAY_ID).unwrap().instantiate();
            elem.set_uint(ns);
            entry.push(elem);
        }

        if let Some(ns) = self.seek_pre_roll_ns {
            let mut elem = TRACK_ENTRY_CONTEXT.spec_for(SEEK_PRE_ROLL_ID).unwrap().instantiate();
            elem.set_uint(ns);
            entry.push(elem);
        }

        if let Some(video) = self.video {
            let mut video_master = Master::with_id(VIDEO_ID, &crate::matroska_ids::VIDEO_CONTEXT);
            video_master
                .find_first_mut(PIXEL_WIDTH_ID)
                .unwrap()
                .set_uint(video.pixel_width);
            video_master
                .find_first_mut(PIXEL_HEIGHT_ID)
                .unwrap()
                .set_uint(video.pixel_height);

            if let Some(w) = video.display_width {
                let mut elem = crate::matroska_ids::VIDEO_CONTEXT
                    .spec_for(DISPLAY_WIDTH_ID)
                    .unwrap()
                    .instantiate();
                elem.set_uint(w);
                video_master.push(elem);
            }

            if let Some(h) = video.display_height {
                let mut elem = crate::matroska_ids::VIDEO_CONTEXT
                    .spec_for(DISPLAY_HEIGHT_ID)
                    .unwrap()
                    .instantiate();
                elem.set_uint(h);
                video_master.push(elem);
            }

            entry.push(Element::Master(video_master));
        }

        if let Some(audio) = self.audio {
            let mut audio_master = Master::with_id(AUDIO_ID, &AUDIO_CONTEXT);
            audio_master
                .find_first_mut(SAMPLING_FREQUENCY_ID)
                .unwrap()
                .set_float(audio.sampling_frequency);
            audio_master
                .find_first_mut(CHANNELS_ID)
                .unwrap()
                .set_uint(audio.channels);

            if let Some(freq) = audio.output_sampling_frequency {
                let mut elem = AUDIO_CONTEXT
                    .spec_for(OUTPUT_SAMPLING_FREQUENCY_ID)
                    .unwrap()
                    .instantiate();
                elem.set_float(freq);
                audio_master.push(elem);
            }

            if let Some(depth) = audio.bit_depth {
                let mut elem = AUDIO_CONTEXT.spec_for(BIT_DEPTH_ID).unwrap().instantiate();
                elem.set_uint(depth);
                audio_master.push(elem);
            }

            entry.push(Element::Master(audio_master));
        }

        if !self.content_encodings.is_empty() {
            entry.push(Element::Master(render_content_encodings(&self.content_encodings)));
        }

        Ok((entry, track_number, track_uid))
    }
}

fn render_content_encodings(chain: &ContentEncodingChain) -> Master {
    let mut encodings = Master::with_id(CONTENT_ENCODINGS_ID, &CONTENT_ENCODINGS_CONTEXT);

    for encoding in chain.encodings() {
        // None of ContentEncoding{Order,Scope,Type} are mandatory+unique,
        // so `Master::with_id` leaves them absent; push them explicitly.
        let mut encoding_master = Master::with_id(CONTENT_ENCODING_ID, &CONTENT_ENCODING_CONTEXT);

        let mut order_elem = CONTENT_ENCODING_CONTEXT.spec_for(CONTENT_ENCODING_ORDER_ID).unwrap().instantiate();
        order_elem.set_uint(encoding.order);
        encoding_master.push(order_elem);

        let mut scope_elem = CONTENT_ENCODING_CONTEXT.spec_for(CONTENT_ENCODING_SCOPE_ID).unwrap().instantiate();
        scope_elem.set_uint(1);
        encoding_master.push(scope_elem);

        let mut type_elem = CONTENT_ENCODING_CONTEXT.spec_for(CONTENT_ENCODING_TYPE_ID).unwrap().instantiate();
        type_elem.set_uint(0);
        encoding_master.push(type_elem);

        let mut compression = Master::with_id(CONTENT_COMPRESSION_ID, &crate::matroska_ids::CONTENT_COMPRESSION_CONTEXT);
        let algo_code = match encoding.algo {
            crate::content_encoding::CompressionAlgo::Zlib => 0,
            crate::content_encoding::CompressionAlgo::Bzlib => 2,
            crate::content_encoding::CompressionAlgo::Lzo1x => 3,
            crate::content_encoding::CompressionAlgo::HeaderRemoval => 3,
        };

        let mut algo_elem = crate::matroska_ids::CONTENT_COMPRESSION_CONTEXT
            .spec_for(CONTENT_COMP_ALGO_ID)
            .unwrap()
            .instantiate();
        algo_elem.set_uint(algo_code);
        compression.push(algo_elem);

        if !encoding.settings.is_empty() {
            let mut settings = crate::matroska_ids::CONTENT_COMPRESSION_CONTEXT
                .spec_for(CONTENT_COMP_SETTINGS_ID)
                .unwrap()
                .instantiate();
            settings.set_binary(encoding.settings.clone());
            compression.push(settings);
        }

        encoding_master.push(Element::Master(compression));
        encodings.push(Element::Master(encoding_master));
    }

    encodings
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allocator_assigns_sequential_numbers_and_unique_uids() {
        let mut allocator = TrackIdAllocator::new();
        assert_eq!(allocator.next_track_number(), 1);
        assert_eq!(allocator.next_track_number(), 2);

        let a = allocator.next_track_uid();
        let b = allocator.next_track_uid();
        assert_ne!(a, b);
    }

    #[test]
    fn builds_an_audio_track_entry() {
        let mut allocator = TrackIdAllocator::new();
        let (entry, number, uid) = TrackEntryBuilder::new(TrackType::Audio, "A_AAC")
            .audio(AudioParams {
                sampling_frequency: 44100.0,
                output_sampling_frequency: None,
                channels: 2,
                bit_depth: None,
            })
            .build(&mut allocator)
            .unwrap();

        assert_eq!(number, 1);
        assert!(uid > 0);
        assert_eq!(entry.find_first(TRACK_TYPE_ID).unwrap().as_uint(), Some(2));
        assert_eq!(entry.find_first(CODEC_ID_ID).unwrap().as_str(), Some("A_AAC"));

        let audio = entry.find_first(AUDIO_ID).unwrap().as_master().unwrap();
        assert_eq!(audio.find_first(CHANNELS_ID).unwrap().as_uint(), Some(2));
    }

    #[test]
    fn builds_a_video_track_entry_with_display_dimensions() {
        let mut allocator = TrackIdAllocator::new();
        let (entry, _, _) = TrackEntryBuilder::new(TrackType::Video, "V_VP9")
            .video(VideoParams {
                pixel_width: 1920,
                pixel_height: 1080,
                display_width: Some(1920),
                display_height: Some(1080),
            })
            .build(&mut allocator)
            .unwrap();

        let video = entry.find_first(VIDEO_ID).unwrap().as_master().unwrap();
        assert_eq!(video.find_first(PIXEL_WIDTH_ID).unwrap().as_uint(), Some(1920));
        assert_eq!(video.find_first(DISPLAY_WIDTH_ID).unwrap().as_uint(), Some(1920));
    }

    #[test]
    fn check_mandatory_passes_on_built_track_entry() {
        let mut allocator = TrackIdAllocator::new();
        let (entry, _, _) = TrackEntryBuilder::new(TrackType::Subtitle, "S_TEXT/UTF8")
            .build(&mut allocator)
            .unwrap();

        assert!(entry.check_mandatory().is_ok());
    }
}
