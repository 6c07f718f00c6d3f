//! Matroska/WebM element IDs and semantic contexts (§6.1): the
//! process-wide, immutable contexts [`ebml::Master`] is built against.

use crate::ebml::{ChildSpec, DefaultValue, ElementId, ElementKind, SemanticContext};

macro_rules! spec {
    ($id:expr, $name:expr, $kind:expr, $mandatory:expr, $unique:expr) => {
        ChildSpec {
            id: $id,
            name: $name,
            kind: $kind,
            mandatory: $mandatory,
            unique: $unique,
            default: DefaultValue::None,
            default_size: None,
            nested: None,
        }
    };
}

macro_rules! spec_default {
    ($id:expr, $name:expr, $kind:expr, $mandatory:expr, $unique:expr, $default:expr) => {
        ChildSpec {
            id: $id,
            name: $name,
            kind: $kind,
            mandatory: $mandatory,
            unique: $unique,
            default: $default,
            default_size: None,
            nested: None,
        }
    };
}

macro_rules! spec_master {
    ($id:expr, $name:expr, $mandatory:expr, $unique:expr, $nested:expr) => {
        ChildSpec {
            id: $id,
            name: $name,
            kind: ElementKind::Master,
            mandatory: $mandatory,
            unique: $unique,
            default: DefaultValue::None,
            default_size: None,
            nested: Some($nested),
        }
    };
}

// EBML header.
pub const EBML_HEADER_ID: ElementId = 0x1A45DFA3;
pub const EBML_VERSION_ID: ElementId = 0x4286;
pub const EBML_READ_VERSION_ID: ElementId = 0x42F7;
pub const EBML_MAX_ID_LENGTH_ID: ElementId = 0x42F2;
pub const EBML_MAX_SIZE_LENGTH_ID: ElementId = 0x42F3;
pub const DOC_TYPE_ID: ElementId = 0x4282;
pub const DOC_TYPE_VERSION_ID: ElementId = 0x4287;
pub const DOC_TYPE_READ_VERSION_ID: ElementId = 0x4285;

pub static EBML_HEADER_CONTEXT: SemanticContext = SemanticContext {
    name: "EBML",
    children: &[
        spec_default!(EBML_VERSION_ID, "EBMLVersion", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(1)),
        spec_default!(EBML_READ_VERSION_ID, "EBMLReadVersion", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(1)),
        spec_default!(EBML_MAX_ID_LENGTH_ID, "EBMLMaxIDLength", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(4)),
        spec_default!(EBML_MAX_SIZE_LENGTH_ID, "EBMLMaxSizeLength", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(8)),
        spec!(DOC_TYPE_ID, "DocType", ElementKind::Ascii, true, true),
        spec_default!(DOC_TYPE_VERSION_ID, "DocTypeVersion", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(1)),
        spec_default!(DOC_TYPE_READ_VERSION_ID, "DocTypeReadVersion", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(1)),
    ],
};

// Segment / SeekHead / Info.
pub const SEGMENT_ID: ElementId = 0x18538067;
pub const SEEK_HEAD_ID: ElementId = 0x114D9B74;
pub const SEEK_ID: ElementId = 0x4DBB;
pub const SEEK_ELEMENT_ID_ID: ElementId = 0x53AB;
pub const SEEK_POSITION_ID: ElementId = 0x53AC;

pub const INFO_ID: ElementId = 0x1549A966;
pub const TIMECODE_SCALE_ID: ElementId = 0x2AD7B1;
pub const DURATION_ID: ElementId = 0x4489;
pub const DATE_UTC_ID: ElementId = 0x4461;
pub const TITLE_ID: ElementId = 0x7BA9;
pub const MUXING_APP_ID: ElementId = 0x4D80;
pub const WRITING_APP_ID: ElementId = 0x5741;
pub const SEGMENT_UID_ID: ElementId = 0x73A4;
pub const PREV_UID_ID: ElementId = 0x3CB923;
pub const NEXT_UID_ID: ElementId = 0x3EB923;

pub static SEEK_CONTEXT: SemanticContext = SemanticContext {
    name: "Seek",
    children: &[
        spec!(SEEK_ELEMENT_ID_ID, "SeekID", ElementKind::Binary, true, true),
        spec!(SEEK_POSITION_ID, "SeekPosition", ElementKind::UnsignedInt, true, true),
    ],
};

pub static SEEK_HEAD_CONTEXT: SemanticContext = SemanticContext {
    name: "SeekHead",
    children: &[spec_master!(SEEK_ID, "Seek", false, false, &SEEK_CONTEXT)],
};

pub static INFO_CONTEXT: SemanticContext = SemanticContext {
    name: "Info",
    children: &[
        spec!(SEGMENT_UID_ID, "SegmentUID", ElementKind::Binary, false, true),
        spec!(PREV_UID_ID, "PrevUID", ElementKind::Binary, false, true),
        spec!(NEXT_UID_ID, "NextUID", ElementKind::Binary, false, true),
        spec_default!(TIMECODE_SCALE_ID, "TimecodeScale", ElementKind::UnsignedInt, true, true, DefaultValue::UInt(1_000_000)),
        spec!(DURATION_ID, "Duration", ElementKind::Float(8), false, true),
        spec!(DATE_UTC_ID, "DateUTC", ElementKind::Date, false, true),
        spec!(TITLE_ID, "Title", ElementKind::Utf8, false, true),
        spec!(MUXING_APP_ID, "MuxingApp", ElementKind::Utf8, true, true),
        spec!(WRITING_APP_ID, "WritingApp", ElementKind::Utf8, true, true),
    ],
};

// Tracks.
pub const TRACKS_ID: ElementId = 0x1654AE6B;
pub const TRACK_ENTRY_ID: ElementId = 0xAE;
pub const TRACK_NUMBER_ID: ElementId = 0xD7;
pub const TRACK_UID_ID: ElementId = 0x73C5;
pub const TRACK_TYPE_ID: ElementId = 0x83;
pub const FLAG_ENABLED_ID: ElementId = 0xB9;
pub const FLAG_DEFAULT_ID: ElementId = 0x88;
pub const FLAG_FORCED_ID: ElementId = 0x55AA;
pub const FLAG_LACING_ID: ElementId = 0x9C;
pub const MIN_CACHE_ID: ElementId = 0x6DE7;
pub const MAX_CACHE_ID: ElementId = 0x6DF8;
pub const DEFAULT_DURATION_ID: ElementId = 0x23E383;
pub const MAX_BLOCK_ADDITION_ID_ID: ElementId = 0x55EE;
pub const NAME_ID: ElementId = 0x536E;
pub const LANGUAGE_ID: ElementId = 0x22B59C;
pub const CODEC_ID_ID: ElementId = 0x86;
pub const CODEC_PRIVATE_ID: ElementId = 0x63A2;
pub const CODEC_NAME_ID: ElementId = 0x258688;
pub const CODEC_DELAY_ID: ElementId = 0x56AA;
pub const SEEK_PRE_ROLL_ID: ElementId = 0x56BB;

pub const VIDEO_ID: ElementId = 0xE0;
pub const PIXEL_WIDTH_ID: ElementId = 0xB0;
pub const PIXEL_HEIGHT_ID: ElementId = 0xBA;
pub const DISPLAY_WIDTH_ID: ElementId = 0x54B0;
pub const DISPLAY_HEIGHT_ID: ElementId = 0x54BA;
pub const DISPLAY_UNIT_ID: ElementId = 0x54B2;
pub const FLAG_INTERLACED_ID: ElementId = 0x9A;

pub const AUDIO_ID: ElementId = 0xE1;
pub const SAMPLING_FREQUENCY_ID: ElementId = 0xB5;
pub const OUTPUT_SAMPLING_FREQUENCY_ID: ElementId = 0x78B5;
pub const CHANNELS_ID: ElementId = 0x9F;
pub const BIT_DEPTH_ID: ElementId = 0x6264;

pub const CONTENT_ENCODINGS_ID: ElementId = 0x6D80;
pub const CONTENT_ENCODING_ID: ElementId = 0x6240;
pub const CONTENT_ENCODING_ORDER_ID: ElementId = 0x5031;
pub const CONTENT_ENCODING_SCOPE_ID: ElementId = 0x5032;
pub const CONTENT_ENCODING_TYPE_ID: ElementId = 0x5033;
pub const CONTENT_COMPRESSION_ID: ElementId = 0x5034;
pub const CONTENT_COMP_ALGO_ID: ElementId = 0x4254;
pub const CONTENT_COMP_SETTINGS_ID: ElementId = 0x4255;
pub const CONTENT_ENCRYPTION_ID: ElementId = 0x5035;

pub static VIDEO_CONTEXT: SemanticContext = SemanticContext {
    name: "Video",
    children: &[
        spec_default!(FLAG_INTERLACED_ID, "FlagInterlaced", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(0)),
        spec!(PIXEL_WIDTH_ID, "PixelWidth", ElementKind::UnsignedInt, true, true),
        spec!(PIXEL_HEIGHT_ID, "PixelHeight", ElementKind::UnsignedInt, true, true),
        spec!(DISPLAY_WIDTH_ID, "DisplayWidth", ElementKind::UnsignedInt, false, true),
        spec!(DISPLAY_HEIGHT_ID, "DisplayHeight", ElementKind::UnsignedInt, false, true),
        spec_default!(DISPLAY_UNIT_ID, "DisplayUnit", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(0)),
    ],
};

pub static AUDIO_CONTEXT: SemanticContext = SemanticContext {
    name: "Audio",
    children: &[
        spec_default!(SAMPLING_FREQUENCY_ID, "SamplingFrequency", ElementKind::Float(8), true, true, DefaultValue::Float(8000.0)),
        spec!(OUTPUT_SAMPLING_FREQUENCY_ID, "OutputSamplingFrequency", ElementKind::Float(8), false, true),
        spec_default!(CHANNELS_ID, "Channels", ElementKind::UnsignedInt, true, true, DefaultValue::UInt(1)),
        spec!(BIT_DEPTH_ID, "BitDepth", ElementKind::UnsignedInt, false, true),
    ],
};

pub static CONTENT_COMPRESSION_CONTEXT: SemanticContext = SemanticContext {
    name: "ContentCompression",
    children: &[
        spec_default!(CONTENT_COMP_ALGO_ID, "ContentCompAlgo", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(0)),
        spec!(CONTENT_COMP_SETTINGS_ID, "ContentCompSettings", ElementKind::Binary, false, true),
    ],
};

pub static CONTENT_ENCRYPTION_CONTEXT: SemanticContext = SemanticContext {
    name: "ContentEncryption",
    children: &[],
};

pub static CONTENT_ENCODING_CONTEXT: SemanticContext = SemanticContext {
    name: "ContentEncoding",
    children: &[
        spec_default!(CONTENT_ENCODING_ORDER_ID, "ContentEncodingOrder", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(0)),
        spec_default!(CONTENT_ENCODING_SCOPE_ID, "ContentEncodingScope", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(1)),
        spec_default!(CONTENT_ENCODING_TYPE_ID, "ContentEncodingType", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(0)),
        spec_master!(CONTENT_COMPRESSION_ID, "ContentCompression", false, true, &CONTENT_COMPRESSION_CONTEXT),
        spec_master!(CONTENT_ENCRYPTION_ID, "ContentEncryption", false, true, &CONTENT_ENCRYPTION_CONTEXT),
    ],
};

pub static CONTENT_ENCODINGS_CONTEXT: SemanticContext = SemanticContext {
    name: "ContentEncodings",
    children: &[spec_master!(CONTENT_ENCODING_ID, "ContentEncoding", true, false, &CONTENT_ENCODING_CONTEXT)],
};

pub static TRACK_ENTRY_CONTEXT: SemanticContext = SemanticContext {
    name: "TrackEntry",
    children: &[
        spec!(TRACK_NUMBER_ID, "TrackNumber", ElementKind::UnsignedInt, true, true),
        spec!(TRACK_UID_ID, "TrackUID", ElementKind::UnsignedInt, true, true),
        spec!(TRACK_TYPE_ID, "TrackType", ElementKind::UnsignedInt, true, true),
        spec_default!(FLAG_ENABLED_ID, "FlagEnabled", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(1)),
        spec_default!(FLAG_DEFAULT_ID, "FlagDefault", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(1)),
        spec_default!(FLAG_FORCED_ID, "FlagForced", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(0)),
        spec_default!(FLAG_LACING_ID, "FlagLacing", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(1)),
        spec_default!(MIN_CACHE_ID, "MinCache", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(0)),
        spec!(MAX_CACHE_ID, "MaxCache", ElementKind::UnsignedInt, false, true),
        spec!(DEFAULT_DURATION_ID, "DefaultDuration", ElementKind::UnsignedInt, false, true),
        spec!(MAX_BLOCK_ADDITION_ID_ID, "MaxBlockAdditionID", ElementKind::UnsignedInt, false, true),
        spec!(NAME_ID, "Name", ElementKind::Utf8, false, true),
        spec_default!(LANGUAGE_ID, "Language", ElementKind::Ascii, false, true, DefaultValue::Str("eng")),
        spec!(CODEC_ID_ID, "CodecID", ElementKind::Ascii, true, true),
        spec!(CODEC_PRIVATE_ID, "CodecPrivate", ElementKind::Binary, false, true),
        spec!(CODEC_NAME_ID, "CodecName", ElementKind::Utf8, false, true),
        spec!(CODEC_DELAY_ID, "CodecDelay", ElementKind::UnsignedInt, false, true),
        spec!(SEEK_PRE_ROLL_ID, "SeekPreRoll", ElementKind::UnsignedInt, false, true),
        spec_master!(VIDEO_ID, "Video", false, true, &VIDEO_CONTEXT),
        spec_master!(AUDIO_ID, "Audio", false, true, &AUDIO_CONTEXT),
        spec_master!(CONTENT_ENCODINGS_ID, "ContentEncodings", false, true, &CONTENT_ENCODINGS_CONTEXT),
    ],
};

pub static TRACKS_CONTEXT: SemanticContext = SemanticContext {
    name: "Tracks",
    children: &[spec_master!(TRACK_ENTRY_ID, "TrackEntry", true, false, &TRACK_ENTRY_CONTEXT)],
};

// Cluster.
pub const CLUSTER_ID: ElementId = 0x1F43B675;
pub const TIMECODE_ID: ElementId = 0xE7;
pub const SIMPLE_BLOCK_ID: ElementId = 0xA3;
pub const BLOCK_GROUP_ID: ElementId = 0xA0;
pub const BLOCK_ID: ElementId = 0xA1;
pub const BLOCK_DURATION_ID: ElementId = 0x9B;
pub const REFERENCE_BLOCK_ID: ElementId = 0xFB;
pub const REFERENCE_PRIORITY_ID: ElementId = 0xFA;
pub const CODEC_STATE_ID: ElementId = 0xA4;
pub const BLOCK_ADDITIONS_ID: ElementId = 0x75A1;
pub const SILENT_TRACKS_ID: ElementId = 0x5854;
pub const SILENT_TRACK_NUMBER_ID: ElementId = 0x58D7;
pub const POSITION_ID: ElementId = 0xA7;
pub const PREV_SIZE_ID: ElementId = 0xAB;

pub static SILENT_TRACKS_CONTEXT: SemanticContext = SemanticContext {
    name: "SilentTracks",
    children: &[spec!(SILENT_TRACK_NUMBER_ID, "SilentTrackNumber", ElementKind::UnsignedInt, false, false)],
};

pub static BLOCK_GROUP_CONTEXT: SemanticContext = SemanticContext {
    name: "BlockGroup",
    children: &[
        spec!(BLOCK_ID, "Block", ElementKind::Binary, true, true),
        spec!(BLOCK_DURATION_ID, "BlockDuration", ElementKind::UnsignedInt, false, true),
        spec!(REFERENCE_PRIORITY_ID, "ReferencePriority", ElementKind::UnsignedInt, false, true),
        spec!(REFERENCE_BLOCK_ID, "ReferenceBlock", ElementKind::SignedInt, false, false),
        spec!(CODEC_STATE_ID, "CodecState", ElementKind::Binary, false, true),
        spec!(BLOCK_ADDITIONS_ID, "BlockAdditions", ElementKind::Binary, false, true),
    ],
};

pub static CLUSTER_CONTEXT: SemanticContext = SemanticContext {
    name: "Cluster",
    children: &[
        spec!(TIMECODE_ID, "Timecode", ElementKind::UnsignedInt, true, true),
        spec!(POSITION_ID, "Position", ElementKind::UnsignedInt, false, true),
        spec!(PREV_SIZE_ID, "PrevSize", ElementKind::UnsignedInt, false, true),
        spec!(SIMPLE_BLOCK_ID, "SimpleBlock", ElementKind::Binary, false, false),
        spec_master!(BLOCK_GROUP_ID, "BlockGroup", false, false, &BLOCK_GROUP_CONTEXT),
        spec_master!(SILENT_TRACKS_ID, "SilentTracks", false, true, &SILENT_TRACKS_CONTEXT),
    ],
};

// Cues.
pub const CUES_ID: ElementId = 0x1C53BB6B;
pub const CUE_POINT_ID: ElementId = 0xBB;
pub const CUE_TIME_ID: ElementId = 0xB3;
pub const CUE_TRACK_POSITIONS_ID: ElementId = 0xB7;
pub const CUE_TRACK_ID: ElementId = 0xF7;
pub const CUE_CLUSTER_POSITION_ID: ElementId = 0xF1;
pub const CUE_BLOCK_NUMBER_ID: ElementId = 0x5378;

pub static CUE_TRACK_POSITIONS_CONTEXT: SemanticContext = SemanticContext {
    name: "CueTrackPositions",
    children: &[
        spec!(CUE_TRACK_ID, "CueTrack", ElementKind::UnsignedInt, true, true),
        spec!(CUE_CLUSTER_POSITION_ID, "CueClusterPosition", ElementKind::UnsignedInt, true, true),
        spec!(CUE_BLOCK_NUMBER_ID, "CueBlockNumber", ElementKind::UnsignedInt, false, true),
    ],
};

pub static CUE_POINT_CONTEXT: SemanticContext = SemanticContext {
    name: "CuePoint",
    children: &[
        spec!(CUE_TIME_ID, "CueTime", ElementKind::UnsignedInt, true, true),
        spec_master!(CUE_TRACK_POSITIONS_ID, "CueTrackPositions", true, false, &CUE_TRACK_POSITIONS_CONTEXT),
    ],
};

pub static CUES_CONTEXT: SemanticContext = SemanticContext {
    name: "Cues",
    children: &[spec_master!(CUE_POINT_ID, "CuePoint", true, false, &CUE_POINT_CONTEXT)],
};

// Chapters.
pub const CHAPTERS_ID: ElementId = 0x1043A770;
pub const EDITION_ENTRY_ID: ElementId = 0x45B9;
pub const EDITION_UID_ID: ElementId = 0x45BC;
pub const EDITION_FLAG_HIDDEN_ID: ElementId = 0x45BD;
pub const EDITION_FLAG_DEFAULT_ID: ElementId = 0x45DB;
pub const CHAPTER_ATOM_ID: ElementId = 0xB6;
pub const CHAPTER_UID_ID: ElementId = 0x73C4;
pub const CHAPTER_TIME_START_ID: ElementId = 0x91;
pub const CHAPTER_TIME_END_ID: ElementId = 0x92;
pub const CHAPTER_FLAG_HIDDEN_ID: ElementId = 0x98;
pub const CHAPTER_FLAG_ENABLED_ID: ElementId = 0x4598;
pub const CHAPTER_DISPLAY_ID: ElementId = 0x80;
pub const CHAPTER_STRING_ID: ElementId = 0x85;
pub const CHAPTER_LANGUAGE_ID: ElementId = 0x437C;
pub const CHAPTER_COUNTRY_ID: ElementId = 0x437E;

pub static CHAPTER_DISPLAY_CONTEXT: SemanticContext = SemanticContext {
    name: "ChapterDisplay",
    children: &[
        spec!(CHAPTER_STRING_ID, "ChapterString", ElementKind::Utf8, true, true),
        spec_default!(CHAPTER_LANGUAGE_ID, "ChapterLanguage", ElementKind::Ascii, true, false, DefaultValue::Str("eng")),
        spec!(CHAPTER_COUNTRY_ID, "ChapterCountry", ElementKind::Ascii, false, false),
    ],
};

pub static CHAPTER_ATOM_CONTEXT: SemanticContext = SemanticContext {
    name: "ChapterAtom",
    children: &[
        spec!(CHAPTER_UID_ID, "ChapterUID", ElementKind::UnsignedInt, true, true),
        spec!(CHAPTER_TIME_START_ID, "ChapterTimeStart", ElementKind::UnsignedInt, true, true),
        spec!(CHAPTER_TIME_END_ID, "ChapterTimeEnd", ElementKind::UnsignedInt, false, true),
        spec_default!(CHAPTER_FLAG_HIDDEN_ID, "ChapterFlagHidden", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(0)),
        spec_default!(CHAPTER_FLAG_ENABLED_ID, "ChapterFlagEnabled", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(1)),
        spec_master!(CHAPTER_DISPLAY_ID, "ChapterDisplay", true, false, &CHAPTER_DISPLAY_CONTEXT),
    ],
};

pub static EDITION_ENTRY_CONTEXT: SemanticContext = SemanticContext {
    name: "EditionEntry",
    children: &[
        spec!(EDITION_UID_ID, "EditionUID", ElementKind::UnsignedInt, false, true),
        spec_default!(EDITION_FLAG_HIDDEN_ID, "EditionFlagHidden", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(0)),
        spec_default!(EDITION_FLAG_DEFAULT_ID, "EditionFlagDefault", ElementKind::UnsignedInt, false, true, DefaultValue::UInt(0)),
        spec_master!(CHAPTER_ATOM_ID, "ChapterAtom", true, false, &CHAPTER_ATOM_CONTEXT),
    ],
};

pub static CHAPTERS_CONTEXT: SemanticContext = SemanticContext {
    name: "Chapters",
    children: &[spec_master!(EDITION_ENTRY_ID, "EditionEntry", true, false, &EDITION_ENTRY_CONTEXT)],
};

// Attachments.
pub const ATTACHMENTS_ID: ElementId = 0x1941A469;
pub const ATTACHED_FILE_ID: ElementId = 0x61A7;
pub const FILE_DESCRIPTION_ID: ElementId = 0x467E;
pub const FILE_NAME_ID: ElementId = 0x466E;
pub const FILE_MIME_TYPE_ID: ElementId = 0x4660;
pub const FILE_DATA_ID: ElementId = 0x465C;
pub const FILE_UID_ID: ElementId = 0x46AE;

pub static ATTACHED_FILE_CONTEXT: SemanticContext = SemanticContext {
    name: "AttachedFile",
    children: &[
        spec!(FILE_DESCRIPTION_ID, "FileDescription", ElementKind::Utf8, false, true),
        spec!(FILE_NAME_ID, "FileName", ElementKind::Utf8, true, true),
        spec!(FILE_MIME_TYPE_ID, "FileMimeType", ElementKind::Ascii, true, true),
        spec!(FILE_DATA_ID, "FileData", ElementKind::Binary, true, true),
        spec!(FILE_UID_ID, "FileUID", ElementKind::UnsignedInt, true, true),
    ],
};

pub static ATTACHMENTS_CONTEXT: SemanticContext = SemanticContext {
    name: "Attachments",
    children: &[spec_master!(ATTACHED_FILE_ID, "AttachedFile", true, false, &ATTACHED_FILE_CONTEXT)],
};

// Tags (minimal: enough to carry simple name/value pairs through,
// nothing in §8.2's scenarios exercises them further).
pub const TAGS_ID: ElementId = 0x1254C367;
pub const TAG_ID: ElementId = 0x7373;

pub static TAG_CONTEXT: SemanticContext = SemanticContext {
    name: "Tag",
    children: &[],
};

pub static TAGS_CONTEXT: SemanticContext = SemanticContext {
    name: "Tags",
    children: &[spec_master!(TAG_ID, "Tag", true, false, &TAG_CONTEXT)],
};

pub static SEGMENT_CONTEXT: SemanticContext = SemanticContext {
    name: "Segment",
    children: &[
        spec_master!(SEEK_HEAD_ID, "SeekHead", false, false, &SEEK_HEAD_CONTEXT),
        spec_master!(INFO_ID, "Info", true, true, &INFO_CONTEXT),
        spec_master!(TRACKS_ID, "Tracks", true, true, &TRACKS_CONTEXT),
        spec_master!(CHAPTERS_ID, "Chapters", false, true, &CHAPTERS_CONTEXT),
        spec_master!(ATTACHMENTS_ID, "Attachments", false, true, &ATTACHMENTS_CONTEXT),
        spec_master!(TAGS_ID, "Tags", false, true, &TAGS_CONTEXT),
        spec_master!(CLUSTER_ID, "Cluster", true, false, &CLUSTER_CONTEXT),
        spec_master!(CUES_ID, "Cues", false, true, &CUES_CONTEXT),
    ],
};
