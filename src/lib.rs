pub mod config;
pub mod cursor;
pub mod dump;
pub mod error;
pub mod field;
pub mod record;
pub mod script;
pub mod tag;
pub mod walker;

use anyhow::Context;
use std::fs::File;
use std::io::{self, BufReader};
use tracing::info;

//
// Re-export
//
pub use config::Config;
pub use cursor::StreamCursor;
pub use dump::{DumpVariant, DumpWriter};
pub use error::{Error, Result};
pub use field::{BitField, FieldValue, FixedInt, Labels, label_for};
pub use record::{
    FieldSlot, FieldSpec, Record, RecordBuilder, RecordDescriptor, ScalarField, no_variants,
    read_record,
};
pub use script::{
    EcmaArray, ScriptString, ScriptTagBody, ScriptValue, parse_script_data_value,
    parse_script_tag_body,
};
pub use tag::{
    AudioTagHeader, FileHeader, PreviousTagSize, TagHeader, VideoTagHeader, parse_audio_header,
    parse_header, parse_previous_tag_size, parse_tag_header, parse_video_header,
};
pub use walker::{TagWalker, WalkSummary};

// Define constants for commonly used lengths
pub const FLV_HEADER_LENGTH: usize = 9;
pub const FLV_TAG_HEADER_LENGTH: usize = 11;
pub const PREVIOUS_TAG_SIZE_LENGTH: usize = 4;

/// Dumps the configured FLV file to stdout, tag by tag.
pub fn run(config: Config) -> anyhow::Result<WalkSummary> {
    let input = File::open(&config.input)
        .with_context(|| format!("Failed to open {}", config.input.display()))?;
    info!(input = %config.input.display(), "dumping FLV stream");

    let walker = TagWalker::new(BufReader::new(input), io::stdout().lock());
    let summary = walker.walk()?;
    Ok(summary)
}
