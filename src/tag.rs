//! Concrete FLV record layouts: the file header, the size field bracketing
//! every tag, the 11-byte tag header, and the audio/video sub-headers with
//! their published enumeration labels.

use crate::cursor::StreamCursor;
use crate::error::{Error, Result};
use crate::field::{FieldValue, Labels};
use crate::record::{Record, RecordDescriptor, ScalarField, no_variants, read_record};
use std::convert::Infallible;
use std::io::Read;
use std::sync::LazyLock;

const VERSION: &str = "Version";
const TYPE_FLAGS: &str = "TypeFlags";
const DATA_OFFSET: &str = "DataOffset";
const PREVIOUS_TAG_SIZE: &str = "PreviousTagSize";
const RESERVED: &str = "Reserved";
const FILTER: &str = "Filter";
const TAG_TYPE: &str = "TagType";
const DATA_SIZE: &str = "DataSize";
const TIMESTAMP: &str = "Timestamp";
const TIMESTAMP_EXTENDED: &str = "TimestampExtended";
const STREAM_ID: &str = "StreamID";
const SOUND_FORMAT: &str = "SoundFormat";
const SOUND_RATE: &str = "SoundRate";
const SOUND_SIZE: &str = "SoundSize";
const SOUND_TYPE: &str = "SoundType";
const AAC_PACKET_TYPE: &str = "AACPacketType";
const FRAME_TYPE: &str = "FrameType";
const CODEC_ID: &str = "CodecID";

/// SoundFormat value that carries an extra packet type byte.
const SOUND_FORMAT_AAC: u32 = 10;

const TYPE_FLAGS_LABELS: Labels = &[
    (1, "Audio: No, Video: Yes"),
    (4, "Audio: Yes, Video: No"),
    (5, "Audio: Yes, Video: Yes"),
];

const FILTER_LABELS: Labels = &[
    (0, "0 = No pre-processing required"),
    (1, "1 = Pre-processing"),
];

const TAG_TYPE_LABELS: Labels = &[(8, "8 = audio"), (9, "9 = video"), (18, "18 = script data")];

const SOUND_FORMAT_LABELS: Labels = &[
    (0, "Linear PCM, platform endian"),
    (1, "ADPCM"),
    (2, "MP3"),
    (3, "Linear PCM, little endian"),
    (4, "Nellymoser 16 kHz mono"),
    (5, "Nellymoser 8 kHz mono"),
    (6, "Nellymoser"),
    (7, "G.711 A-law logarithmic PCM"),
    (8, "G.711 mu-law logarithmic PCM"),
    (9, "reserved"),
    (10, "AAC"),
    (11, "Speex"),
    (14, "MP3 8 kHz"),
    (15, "Device-specific sound"),
];

const SOUND_RATE_LABELS: Labels = &[(0, "5.5kHz"), (1, "11kHz"), (2, "22kHz"), (3, "44kHz")];

const SOUND_SIZE_LABELS: Labels = &[(0, "8-bit samples"), (1, "16-bit samples")];

const SOUND_TYPE_LABELS: Labels = &[(0, "Mono sound"), (1, "Stereo sound")];

const AAC_PACKET_TYPE_LABELS: Labels = &[(0, "AAC sequence header"), (1, "AAC raw")];

const FRAME_TYPE_LABELS: Labels = &[
    (1, "key frame (for AVC, a seekable frame)"),
    (2, "inter frame (for AVC, a non-seekable frame)"),
    (3, "disposable inter frame (H.263 only)"),
    (4, "generated key frame (reserved for server use only)"),
    (5, "video info/command frame"),
];

const CODEC_ID_LABELS: Labels = &[
    (2, "Sorenson H.263"),
    (3, "Screen video"),
    (4, "On2 VP6"),
    (5, "On2 VP6 with alpha channel"),
    (6, "Screen video version 2"),
    (7, "AVC"),
];

static FILE_HEADER_LAYOUT: LazyLock<RecordDescriptor> = LazyLock::new(|| {
    RecordDescriptor::build("FlvHeader")
        .fixed(VERSION, 1)
        .fixed_labeled(TYPE_FLAGS, 1, TYPE_FLAGS_LABELS)
        .fixed(DATA_OFFSET, 4)
        .finish()
        .expect("Failed to build FLV header layout")
});

static PREVIOUS_TAG_SIZE_LAYOUT: LazyLock<RecordDescriptor> = LazyLock::new(|| {
    RecordDescriptor::build("PreviousTagSize")
        .fixed(PREVIOUS_TAG_SIZE, 4)
        .finish()
        .expect("Failed to build previous tag size layout")
});

static TAG_HEADER_LAYOUT: LazyLock<RecordDescriptor> = LazyLock::new(|| {
    RecordDescriptor::build("FlvTag")
        .bits(RESERVED, 0, 2)
        .bits_labeled(FILTER, 2, 1, FILTER_LABELS)
        .bits_labeled(TAG_TYPE, 3, 5, TAG_TYPE_LABELS)
        .fixed(DATA_SIZE, 3)
        .fixed(TIMESTAMP, 3)
        .fixed(TIMESTAMP_EXTENDED, 1)
        .fixed(STREAM_ID, 3)
        .finish()
        .expect("Failed to build tag header layout")
});

static AUDIO_HEADER_LAYOUT: LazyLock<RecordDescriptor> = LazyLock::new(|| {
    RecordDescriptor::build("AudioTagHeader")
        .bits_labeled(SOUND_FORMAT, 0, 4, SOUND_FORMAT_LABELS)
        .bits_labeled(SOUND_RATE, 4, 2, SOUND_RATE_LABELS)
        .bits_labeled(SOUND_SIZE, 6, 1, SOUND_SIZE_LABELS)
        .bits_labeled(SOUND_TYPE, 7, 1, SOUND_TYPE_LABELS)
        .variant(AAC_PACKET_TYPE)
        .finish()
        .expect("Failed to build audio header layout")
});

static VIDEO_HEADER_LAYOUT: LazyLock<RecordDescriptor> = LazyLock::new(|| {
    RecordDescriptor::build("VideoTagHeader")
        .bits_labeled(FRAME_TYPE, 0, 4, FRAME_TYPE_LABELS)
        .bits_labeled(CODEC_ID, 4, 4, CODEC_ID_LABELS)
        .finish()
        .expect("Failed to build video header layout")
});

/// Parsed FLV file header.
#[derive(Debug)]
pub struct FileHeader {
    version: u8,
    flags: u8,
    data_offset: u32,
    record: Record<Infallible>,
}

impl FileHeader {
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn data_offset(&self) -> u32 {
        self.data_offset
    }

    pub fn has_audio(&self) -> bool {
        (self.flags & 0x04) != 0
    }

    pub fn has_video(&self) -> bool {
        (self.flags & 0x01) != 0
    }

    pub fn record(&self) -> &Record<Infallible> {
        &self.record
    }
}

/// The 4-byte size field bracketing every tag.
#[derive(Debug)]
pub struct PreviousTagSize {
    size: u32,
    record: Record<Infallible>,
}

impl PreviousTagSize {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn record(&self) -> &Record<Infallible> {
        &self.record
    }
}

/// Parsed 11-byte tag header.
#[derive(Debug)]
pub struct TagHeader {
    tag_type: u8,
    data_size: u32,
    timestamp: u32,
    timestamp_ext: u8,
    stream_id: u32,
    filter: u8,
    record: Record<Infallible>,
}

impl TagHeader {
    pub fn tag_type(&self) -> u8 {
        self.tag_type
    }

    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn timestamp_ext(&self) -> u8 {
        self.timestamp_ext
    }

    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }

    pub fn filter(&self) -> u8 {
        self.filter
    }

    pub fn is_audio(&self) -> bool {
        self.tag_type == 0x08
    }

    pub fn is_video(&self) -> bool {
        self.tag_type == 0x09
    }

    pub fn is_script_data(&self) -> bool {
        self.tag_type == 0x12
    }

    pub fn record(&self) -> &Record<Infallible> {
        &self.record
    }
}

/// Leading byte of an audio payload, plus the packet type byte AAC adds.
#[derive(Debug)]
pub struct AudioTagHeader {
    sound_format: u8,
    aac_packet_type: Option<u8>,
    record: Record<Option<ScalarField>>,
}

impl AudioTagHeader {
    pub fn sound_format(&self) -> u8 {
        self.sound_format
    }

    pub fn is_aac(&self) -> bool {
        u32::from(self.sound_format) == SOUND_FORMAT_AAC
    }

    pub fn aac_packet_type(&self) -> Option<u8> {
        self.aac_packet_type
    }

    /// Header bytes consumed from the payload: 1, or 2 for AAC.
    pub fn consumed(&self) -> u64 {
        self.record.consumed()
    }

    pub fn record(&self) -> &Record<Option<ScalarField>> {
        &self.record
    }
}

/// Leading byte of a video payload.
#[derive(Debug)]
pub struct VideoTagHeader {
    frame_type: u8,
    codec_id: u8,
    record: Record<Infallible>,
}

impl VideoTagHeader {
    pub fn frame_type(&self) -> u8 {
        self.frame_type
    }

    pub fn codec_id(&self) -> u8 {
        self.codec_id
    }

    pub fn consumed(&self) -> u64 {
        self.record.consumed()
    }

    pub fn record(&self) -> &Record<Infallible> {
        &self.record
    }
}

/// Validates the signature and decodes the rest of the 9-byte file header.
pub fn parse_header<R: Read>(cursor: &mut StreamCursor<R>) -> Result<FileHeader> {
    let mut signature = [0u8; 3];
    cursor.read_into(&mut signature)?;
    if &signature != b"FLV" {
        return Err(Error::Signature { found: signature });
    }
    let record = read_record(cursor, &FILE_HEADER_LAYOUT, no_variants)?;
    Ok(FileHeader {
        version: record.uint(VERSION)? as u8,
        flags: record.uint(TYPE_FLAGS)? as u8,
        data_offset: record.uint(DATA_OFFSET)?,
        record,
    })
}

pub fn parse_previous_tag_size<R: Read>(cursor: &mut StreamCursor<R>) -> Result<PreviousTagSize> {
    let record = read_record(cursor, &PREVIOUS_TAG_SIZE_LAYOUT, no_variants)?;
    Ok(PreviousTagSize {
        size: record.uint(PREVIOUS_TAG_SIZE)?,
        record,
    })
}

pub fn parse_tag_header<R: Read>(cursor: &mut StreamCursor<R>) -> Result<TagHeader> {
    let record = read_record(cursor, &TAG_HEADER_LAYOUT, no_variants)?;
    Ok(TagHeader {
        tag_type: record.uint(TAG_TYPE)? as u8,
        data_size: record.uint(DATA_SIZE)?,
        timestamp: record.uint(TIMESTAMP)?,
        timestamp_ext: record.uint(TIMESTAMP_EXTENDED)? as u8,
        stream_id: record.uint(STREAM_ID)?,
        filter: record.uint(FILTER)? as u8,
        record,
    })
}

/// Decodes the audio sub-header. AAC streams carry one extra byte naming
/// the packet kind, resolved off the already-decoded sound format.
pub fn parse_audio_header<R: Read>(cursor: &mut StreamCursor<R>) -> Result<AudioTagHeader> {
    let record = read_record(cursor, &AUDIO_HEADER_LAYOUT, |_, prior, cursor| {
        if prior.uint(SOUND_FORMAT)? != SOUND_FORMAT_AAC {
            return Ok((None, 0));
        }
        let value = cursor.read_u8()?;
        let scalar = ScalarField::new(
            FieldValue::Uint(u32::from(value)),
            Some(AAC_PACKET_TYPE_LABELS),
        );
        Ok((Some(scalar), 1))
    })?;
    let sound_format = record.uint(SOUND_FORMAT)? as u8;
    let aac_packet_type = match record.variant(AAC_PACKET_TYPE) {
        Some(Some(scalar)) => Some(scalar.value().as_u32() as u8),
        _ => None,
    };
    Ok(AudioTagHeader {
        sound_format,
        aac_packet_type,
        record,
    })
}

pub fn parse_video_header<R: Read>(cursor: &mut StreamCursor<R>) -> Result<VideoTagHeader> {
    let record = read_record(cursor, &VIDEO_HEADER_LAYOUT, no_variants)?;
    Ok(VideoTagHeader {
        frame_type: record.uint(FRAME_TYPE)? as u8,
        codec_id: record.uint(CODEC_ID)? as u8,
        record,
    })
}
