use crate::cursor::StreamCursor;
use crate::dump::DumpWriter;
use crate::error::{Error, Result};
use crate::script::parse_script_tag_body;
use crate::tag::{
    parse_audio_header, parse_header, parse_previous_tag_size, parse_tag_header, parse_video_header,
};
use std::io::{Read, Write};
use tracing::{debug, info, warn};

/// Totals reported after a complete walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    pub tags: u64,
}

/// Sequentially dumps every tag of one FLV stream.
pub struct TagWalker<R, W> {
    cursor: StreamCursor<R>,
    dump: DumpWriter<W>,
}

impl<R: Read, W: Write> TagWalker<R, W> {
    pub fn new(input: R, output: W) -> Self {
        TagWalker {
            cursor: StreamCursor::new(input),
            dump: DumpWriter::new(output),
        }
    }

    /// Walks the stream to its end, dumping as it goes.
    ///
    /// A stream ending with nothing read at a tag boundary is a finished
    /// dump. Running dry anywhere inside a tag is truncation and comes back
    /// as [`Error::Incomplete`].
    pub fn walk(mut self) -> Result<WalkSummary> {
        let header = parse_header(&mut self.cursor)?;
        debug!(
            version = header.version(),
            has_audio = header.has_audio(),
            has_video = header.has_video(),
            "parsed stream header"
        );
        self.dump.section(header.record())?;

        let mut tags = 0u64;
        loop {
            let boundary = self.cursor.position();
            let previous_tag_size = match parse_previous_tag_size(&mut self.cursor) {
                Ok(size) => size,
                Err(err) if clean_eof(&err, boundary) => break,
                Err(err) => return Err(err),
            };
            self.dump.section(previous_tag_size.record())?;
            self.dump.position(self.cursor.position())?;

            let tag_start = self.cursor.position();
            let tag_header = match parse_tag_header(&mut self.cursor) {
                Ok(tag_header) => tag_header,
                Err(err) if clean_eof(&err, tag_start) => break,
                Err(err) => return Err(err),
            };
            debug!(
                position = tag_start,
                tag_type = tag_header.tag_type(),
                data_size = tag_header.data_size(),
                timestamp = tag_header.timestamp(),
                "parsed tag header"
            );
            self.dump.section(tag_header.record())?;

            let data_size = u64::from(tag_header.data_size());
            let consumed = if data_size == 0 {
                // nothing declared, so not even a sub-header byte to read
                0
            } else if tag_header.is_audio() {
                let audio = parse_audio_header(&mut self.cursor)?;
                self.dump.section(audio.record())?;
                audio.consumed()
            } else if tag_header.is_video() {
                let video = parse_video_header(&mut self.cursor)?;
                self.dump.section(video.record())?;
                video.consumed()
            } else if tag_header.is_script_data() {
                let body = parse_script_tag_body(&mut self.cursor)?;
                self.dump.title("ScriptData")?;
                self.dump.script(&body)?;
                body.consumed()
            } else {
                0
            };

            if consumed > data_size {
                warn!(consumed, data_size, "tag header overran its declared payload");
            }
            self.cursor.skip(data_size.saturating_sub(consumed))?;
            tags += 1;
        }

        self.dump.title("Over")?;
        let summary = WalkSummary { tags };
        info!(tags = summary.tags, "dump finished");
        Ok(summary)
    }
}

/// True when the stream ended with nothing read at a tag boundary.
fn clean_eof(err: &Error, boundary: u64) -> bool {
    matches!(err, Error::Incomplete { offset, have: 0, .. } if *offset == boundary)
}
