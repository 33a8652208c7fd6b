//! Classic aligned dump output: 80-column dash rules around each section,
//! a 20-column name gutter, values labeled where the format defines names
//! for them.

use crate::record::{FieldSlot, Record, ScalarField};
use crate::script::{ScriptTagBody, ScriptValue};
use std::convert::Infallible;
use std::fmt::Display;
use std::io::{self, Write};

const TITLE_WIDTH: usize = 80;
const TITLE_FILLCHAR: char = '-';
const TAG_LEFT_LENGTH: usize = 20;

/// Variant payloads that know how they appear in a record dump.
pub trait DumpVariant {
    /// The value column text, or `None` to leave the field out.
    fn rendered(&self) -> Option<String>;
}

impl DumpVariant for Infallible {
    fn rendered(&self) -> Option<String> {
        match *self {}
    }
}

impl DumpVariant for Option<ScalarField> {
    fn rendered(&self) -> Option<String> {
        self.as_ref().map(scalar_text)
    }
}

pub struct DumpWriter<W> {
    out: W,
}

impl<W: Write> DumpWriter<W> {
    pub fn new(out: W) -> Self {
        DumpWriter { out }
    }

    /// Centered section rule, dash filled to 80 columns.
    pub fn title(&mut self, title: &str) -> io::Result<()> {
        let padded = (TITLE_WIDTH + title.len()) / 2;
        let mut line = String::with_capacity(TITLE_WIDTH.max(title.len()));
        for _ in 0..padded.saturating_sub(title.len()) {
            line.push(TITLE_FILLCHAR);
        }
        line.push_str(title);
        while line.len() < TITLE_WIDTH {
            line.push(TITLE_FILLCHAR);
        }
        writeln!(self.out, "{line}")
    }

    /// One `name value` line, name column padded to 20.
    pub fn kv(&mut self, name: &str, value: impl Display) -> io::Result<()> {
        writeln!(self.out, "{name:<width$}{value}", width = TAG_LEFT_LENGTH)
    }

    /// The record's fields in declared order, variants included when present.
    pub fn record<V: DumpVariant>(&mut self, record: &Record<V>) -> io::Result<()> {
        for (name, slot) in record.fields() {
            match slot {
                FieldSlot::Scalar(scalar) => self.kv(name, scalar_text(scalar))?,
                FieldSlot::Variant(variant) => {
                    if let Some(text) = variant.rendered() {
                        self.kv(name, text)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Section rule named after the record, then its fields.
    pub fn section<V: DumpVariant>(&mut self, record: &Record<V>) -> io::Result<()> {
        self.title(record.name())?;
        self.record(record)
    }

    pub fn position(&mut self, position: u64) -> io::Result<()> {
        self.kv("Position", position)
    }

    /// The script tag's name/value pair, arrays indented one level per depth.
    pub fn script(&mut self, body: &ScriptTagBody) -> io::Result<()> {
        let name = inline_text(body.name());
        self.value_lines(&name, body.value(), 0)
    }

    fn value_lines(&mut self, name: &str, value: &ScriptValue, depth: usize) -> io::Result<()> {
        let indent = "  ".repeat(depth);
        self.kv(&format!("{indent}{name}"), inline_text(value))?;
        if let ScriptValue::EcmaArray(array) = value {
            for (key, entry) in array.entries() {
                self.value_lines(&key.text(), entry, depth + 1)?;
            }
        }
        Ok(())
    }
}

fn scalar_text(scalar: &ScalarField) -> String {
    match scalar.label() {
        Some(label) => label.to_string(),
        None => scalar.value().as_u32().to_string(),
    }
}

fn inline_text(value: &ScriptValue) -> String {
    match value {
        ScriptValue::Number(number) => number.to_string(),
        ScriptValue::Boolean(byte) => byte.to_string(),
        ScriptValue::Str(string) => string.text().into_owned(),
        ScriptValue::EcmaArray(array) => format!("ECMA array, length {}", array.count()),
        ScriptValue::Unresolved(_) => "...".to_string(),
    }
}
