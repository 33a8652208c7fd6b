//! Script-data decoding. A script value is a 1-byte type tag followed by the
//! shape the tag selects, which for strings and ECMA arrays means recursing
//! back into this module through the same variant machinery the audio header
//! uses for its AAC byte.

use crate::cursor::StreamCursor;
use crate::error::Result;
use crate::field::Labels;
use crate::record::{RecordDescriptor, read_record};
use bytes::Bytes;
use std::borrow::Cow;
use std::io::Read;
use std::sync::LazyLock;
use tracing::warn;

const TYPE: &str = "Type";
const SCRIPT_DATA_VALUE: &str = "ScriptDataValue";
const STRING_LENGTH: &str = "StringLength";
const STRING_DATA: &str = "StringData";
const ECMA_ARRAY_LENGTH: &str = "ECMAArrayLength";
const VARIABLES: &str = "Variables";

/// Type tag closing an ECMA array's variable list.
const OBJECT_END_MARKER: u8 = 9;

const SCRIPT_TYPE_LABELS: Labels = &[
    (0, "0 = Number"),
    (1, "1 = Boolean"),
    (2, "2 = String"),
    (3, "3 = Object"),
    (4, "4 = MovieClip (reserved, not supported)"),
    (5, "5 = Null"),
    (6, "6 = Undefined"),
    (7, "7 = Reference"),
    (8, "8 = ECMA array"),
    (9, "9 = Object end marker"),
    (10, "10 = Strict array"),
    (11, "11 = Date"),
    (12, "12 = Long string"),
];

static SCRIPT_VALUE_LAYOUT: LazyLock<RecordDescriptor> = LazyLock::new(|| {
    RecordDescriptor::build("ScriptDataValue")
        .fixed_labeled(TYPE, 1, SCRIPT_TYPE_LABELS)
        .variant(SCRIPT_DATA_VALUE)
        .finish()
        .expect("Failed to build script value layout")
});

static SCRIPT_STRING_LAYOUT: LazyLock<RecordDescriptor> = LazyLock::new(|| {
    RecordDescriptor::build("ScriptDataString")
        .fixed(STRING_LENGTH, 2)
        .variant(STRING_DATA)
        .finish()
        .expect("Failed to build script string layout")
});

static ECMA_ARRAY_LAYOUT: LazyLock<RecordDescriptor> = LazyLock::new(|| {
    RecordDescriptor::build("ScriptDataECMAArray")
        .fixed(ECMA_ARRAY_LENGTH, 4)
        .variant(VARIABLES)
        .finish()
        .expect("Failed to build ECMA array layout")
});

/// A decoded script-data value tree.
#[derive(Debug, Clone)]
pub enum ScriptValue {
    Number(f64),
    Boolean(u8),
    Str(ScriptString),
    EcmaArray(EcmaArray),
    /// Type tags with no decoder, rendered as a placeholder.
    Unresolved(u8),
}

/// Length-prefixed string payload.
#[derive(Debug, Clone)]
pub struct ScriptString {
    length: u16,
    data: Bytes,
}

impl ScriptString {
    fn new(length: u16, data: Bytes) -> Self {
        ScriptString { length, data }
    }

    fn empty() -> Self {
        ScriptString {
            length: 0,
            data: Bytes::new(),
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Bytes the string occupied on the wire: the length prefix plus payload.
    pub fn consumed(&self) -> u64 {
        2 + self.data.len() as u64
    }
}

/// Counted name/value map. The declared count is advisory, the list runs to
/// its end marker.
#[derive(Debug, Clone)]
pub struct EcmaArray {
    count: u32,
    entries: Vec<(ScriptString, ScriptValue)>,
    consumed: u64,
}

impl EcmaArray {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn entries(&self) -> &[(ScriptString, ScriptValue)] {
        &self.entries
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }
}

/// A script tag's payload: a name (almost always "onMetaData") and a value.
#[derive(Debug, Clone)]
pub struct ScriptTagBody {
    name: ScriptValue,
    value: ScriptValue,
    consumed: u64,
}

impl ScriptTagBody {
    pub fn name(&self) -> &ScriptValue {
        &self.name
    }

    pub fn value(&self) -> &ScriptValue {
        &self.value
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }
}

/// Reads one script value: the type tag plus the shape it selects.
/// Returns the value and the bytes consumed, tag included.
pub fn parse_script_data_value<R: Read>(
    cursor: &mut StreamCursor<R>,
) -> Result<(ScriptValue, u64)> {
    let record = read_record(cursor, &SCRIPT_VALUE_LAYOUT, |_, prior, cursor| {
        let type_tag = prior.uint(TYPE)? as u8;
        resolve_value(type_tag, cursor)
    })?;
    let consumed = record.consumed();
    let value = record.into_variant(SCRIPT_DATA_VALUE)?;
    Ok((value, consumed))
}

/// Reads the name/value pair making up a script tag's payload.
pub fn parse_script_tag_body<R: Read>(cursor: &mut StreamCursor<R>) -> Result<ScriptTagBody> {
    let (name, name_consumed) = parse_script_data_value(cursor)?;
    if !matches!(name, ScriptValue::Str(_)) {
        warn!("script tag name is not a string");
    }
    let (value, value_consumed) = parse_script_data_value(cursor)?;
    Ok(ScriptTagBody {
        name,
        value,
        consumed: name_consumed + value_consumed,
    })
}

fn resolve_value<R: Read>(type_tag: u8, cursor: &mut StreamCursor<R>) -> Result<(ScriptValue, u64)> {
    match type_tag {
        0 => Ok((ScriptValue::Number(cursor.read_f64()?), 8)),
        1 => Ok((ScriptValue::Boolean(cursor.read_u8()?), 1)),
        2 => {
            let string = parse_script_string(cursor)?;
            let consumed = string.consumed();
            Ok((ScriptValue::Str(string), consumed))
        }
        8 => {
            let array = parse_ecma_array(cursor)?;
            let consumed = array.consumed();
            Ok((ScriptValue::EcmaArray(array), consumed))
        }
        other => Ok((ScriptValue::Unresolved(other), 0)),
    }
}

fn parse_script_string<R: Read>(cursor: &mut StreamCursor<R>) -> Result<ScriptString> {
    let record = read_record(cursor, &SCRIPT_STRING_LAYOUT, |_, prior, cursor| {
        let length = prior.uint(STRING_LENGTH)?;
        let data = cursor.read_bytes(length as usize)?;
        Ok((data, u64::from(length)))
    })?;
    let length = record.uint(STRING_LENGTH)? as u16;
    let data = record.into_variant(STRING_DATA)?;
    Ok(ScriptString::new(length, data))
}

fn parse_ecma_array<R: Read>(cursor: &mut StreamCursor<R>) -> Result<EcmaArray> {
    let record = read_record(cursor, &ECMA_ARRAY_LAYOUT, |_, _, cursor| {
        read_variables(cursor)
    })?;
    let count = record.uint(ECMA_ARRAY_LENGTH)?;
    let consumed = record.consumed();
    let entries = record.into_variant(VARIABLES)?;
    Ok(EcmaArray {
        count,
        entries,
        consumed,
    })
}

/// Reads name/value pairs until the object-end marker. Real encoders get the
/// declared count wrong, so it never bounds this loop.
fn read_variables<R: Read>(
    cursor: &mut StreamCursor<R>,
) -> Result<(Vec<(ScriptString, ScriptValue)>, u64)> {
    let mut entries = Vec::new();
    let mut consumed = 0u64;
    loop {
        let length = cursor.read_u16()?;
        consumed += 2;
        if length == 0 {
            let marker = cursor.read_u8()?;
            consumed += 1;
            if marker == OBJECT_END_MARKER {
                break;
            }
            // empty name, the byte just read is the value's type tag
            let (value, value_consumed) = resolve_value(marker, cursor)?;
            consumed += value_consumed;
            entries.push((ScriptString::empty(), value));
            continue;
        }
        let data = cursor.read_bytes(usize::from(length))?;
        consumed += u64::from(length);
        let name = ScriptString::new(length, data);
        let (value, value_consumed) = parse_script_data_value(cursor)?;
        consumed += value_consumed;
        entries.push((name, value));
    }
    Ok((entries, consumed))
}
