//! The descriptor-driven record engine.
//!
//! A [`RecordDescriptor`] is an ordered list of named fields: whole-byte
//! big-endian integers, sub-byte bit fields, and variant placeholders whose
//! concrete shape depends on values decoded earlier in the same record.
//! [`read_record`] walks one descriptor over a [`StreamCursor`], keeping
//! byte and bit offsets in lockstep with the declarations.
//!
//! # Bit packing
//! Bit fields sharing a byte must be declared contiguously and must fill the
//! byte completely before the next whole-byte field. The engine reads the
//! shared byte once, hands each declared slice of it out in order, and
//! refuses layouts that leave gaps or partial bytes behind.
//!
//! # Variant fields
//! A variant field is resolved exactly once, in declared order, by a closure
//! the caller supplies per record type. The resolver sees the fields decoded
//! so far and the live cursor, and reports the bytes it consumed so the
//! record's total stays accurate.

use crate::cursor::StreamCursor;
use crate::error::{Error, Result};
use crate::field::{BitField, FieldValue, FixedInt, Labels, label_for};
use std::convert::Infallible;
use std::io::Read;

/// One field slot in a record layout.
#[derive(Debug, Clone, Copy)]
pub enum FieldSpec {
    /// Whole-byte big-endian integer.
    Fixed(FixedInt),
    /// Sub-byte integer sharing its byte with adjacent bit fields.
    Bits(BitField),
    /// Shape selected at read time by previously decoded fields.
    Variant,
}

/// Named, ordered field layout. Field order is wire order and display order.
#[derive(Debug)]
pub struct RecordDescriptor {
    name: &'static str,
    fields: Vec<(&'static str, FieldSpec)>,
}

impl RecordDescriptor {
    pub fn build(name: &'static str) -> RecordBuilder {
        RecordBuilder {
            name,
            fields: Vec::new(),
            failed: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[(&'static str, FieldSpec)] {
        &self.fields
    }
}

/// Collects field declarations and reports the first invalid one.
pub struct RecordBuilder {
    name: &'static str,
    fields: Vec<(&'static str, FieldSpec)>,
    failed: Option<Error>,
}

impl RecordBuilder {
    pub fn fixed(self, name: &'static str, width: u8) -> Self {
        let spec = FixedInt::new(width).map(FieldSpec::Fixed);
        self.push(name, spec)
    }

    pub fn fixed_labeled(self, name: &'static str, width: u8, labels: Labels) -> Self {
        let spec = FixedInt::labeled(width, labels).map(FieldSpec::Fixed);
        self.push(name, spec)
    }

    pub fn bits(self, name: &'static str, offset: u8, width: u8) -> Self {
        let spec = BitField::new(offset, width).map(FieldSpec::Bits);
        self.push(name, spec)
    }

    pub fn bits_labeled(self, name: &'static str, offset: u8, width: u8, labels: Labels) -> Self {
        let spec = BitField::labeled(offset, width, labels).map(FieldSpec::Bits);
        self.push(name, spec)
    }

    pub fn variant(self, name: &'static str) -> Self {
        self.push(name, Ok(FieldSpec::Variant))
    }

    pub fn finish(self) -> Result<RecordDescriptor> {
        match self.failed {
            Some(err) => Err(err),
            None => Ok(RecordDescriptor {
                name: self.name,
                fields: self.fields,
            }),
        }
    }

    fn push(mut self, name: &'static str, spec: Result<FieldSpec>) -> Self {
        if self.failed.is_some() {
            return self;
        }
        match spec {
            Ok(spec) => self.fields.push((name, spec)),
            Err(err) => self.failed = Some(err),
        }
        self
    }
}

/// A decoded scalar with its display label resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarField {
    value: FieldValue,
    label: Option<&'static str>,
}

impl ScalarField {
    pub fn new(value: FieldValue, labels: Option<Labels>) -> Self {
        let label = label_for(labels, value.as_u32());
        ScalarField { value, label }
    }

    pub fn value(&self) -> FieldValue {
        self.value
    }

    pub fn label(&self) -> Option<&'static str> {
        self.label
    }
}

/// A resolved slot: an engine-decoded scalar or a caller-resolved variant.
#[derive(Debug)]
pub enum FieldSlot<V> {
    Scalar(ScalarField),
    Variant(V),
}

/// A fully decoded record: ordered named slots plus total bytes consumed.
#[derive(Debug)]
pub struct Record<V> {
    name: &'static str,
    fields: Vec<(&'static str, FieldSlot<V>)>,
    consumed: u64,
}

impl<V> Record<V> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Total bytes this record consumed from the stream, variant fields
    /// included.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldSlot<V>)> {
        self.fields.iter().map(|(name, slot)| (*name, slot))
    }

    pub fn scalar(&self, field: &'static str) -> Option<ScalarField> {
        self.fields.iter().find_map(|(name, slot)| match slot {
            FieldSlot::Scalar(scalar) if *name == field => Some(*scalar),
            _ => None,
        })
    }

    pub fn uint(&self, field: &'static str) -> Result<u32> {
        self.scalar(field)
            .map(|scalar| scalar.value().as_u32())
            .ok_or(Error::MissingField {
                record: self.name,
                field,
            })
    }

    pub fn variant(&self, field: &'static str) -> Option<&V> {
        self.fields.iter().find_map(|(name, slot)| match slot {
            FieldSlot::Variant(value) if *name == field => Some(value),
            _ => None,
        })
    }

    pub fn into_variant(self, field: &'static str) -> Result<V> {
        let record = self.name;
        for (name, slot) in self.fields {
            if name == field {
                if let FieldSlot::Variant(value) = slot {
                    return Ok(value);
                }
            }
        }
        Err(Error::MissingField { record, field })
    }
}

/// Resolver for descriptors that declare no variant fields.
pub fn no_variants<R: Read>(
    field: &'static str,
    _prior: &Record<Infallible>,
    _cursor: &mut StreamCursor<R>,
) -> Result<(Infallible, u64)> {
    Err(Error::UnknownVariant { field })
}

/// Decodes one record from the cursor, advancing it monotonically.
///
/// `resolve` is called once per variant field with the field's name, the
/// record decoded so far, and the cursor positioned at the variant's first
/// byte. It returns the resolved value and the byte count it consumed.
pub fn read_record<R, V, F>(
    cursor: &mut StreamCursor<R>,
    descriptor: &RecordDescriptor,
    mut resolve: F,
) -> Result<Record<V>>
where
    R: Read,
    F: FnMut(&'static str, &Record<V>, &mut StreamCursor<R>) -> Result<(V, u64)>,
{
    let mut record = Record {
        name: descriptor.name(),
        fields: Vec::with_capacity(descriptor.fields().len()),
        consumed: 0,
    };
    // the shared byte currently being sliced up, and how many of its bits
    // have been handed out
    let mut shared: Option<(u8, u8)> = None;

    for &(name, spec) in descriptor.fields() {
        match spec {
            FieldSpec::Bits(bit_field) => {
                let (byte, filled) = match shared {
                    Some(state) => state,
                    None => {
                        let byte = cursor.read_u8()?;
                        record.consumed += 1;
                        (byte, 0)
                    }
                };
                if bit_field.offset() != filled {
                    return Err(Error::BitFieldGap {
                        record: record.name,
                        field: name,
                        expected: filled,
                        found: bit_field.offset(),
                    });
                }
                let value = bit_field.decode(byte);
                record.fields.push((
                    name,
                    FieldSlot::Scalar(ScalarField::new(
                        FieldValue::Bits(value),
                        bit_field.labels(),
                    )),
                ));
                let filled = filled + bit_field.width();
                shared = if filled == 8 {
                    None
                } else {
                    Some((byte, filled))
                };
            }
            FieldSpec::Fixed(fixed) => {
                if let Some((_, filled)) = shared {
                    return Err(Error::PartialByte {
                        record: record.name,
                        field: name,
                        filled,
                    });
                }
                let value = cursor.read_uint(usize::from(fixed.width()))? as u32;
                record.consumed += u64::from(fixed.width());
                record.fields.push((
                    name,
                    FieldSlot::Scalar(ScalarField::new(FieldValue::Uint(value), fixed.labels())),
                ));
            }
            FieldSpec::Variant => {
                if let Some((_, filled)) = shared {
                    return Err(Error::PartialByte {
                        record: record.name,
                        field: name,
                        filled,
                    });
                }
                let (value, consumed) = resolve(name, &record, cursor)?;
                record.fields.push((name, FieldSlot::Variant(value)));
                record.consumed += consumed;
            }
        }
    }

    if let Some((_, filled)) = shared {
        let field = record
            .fields
            .last()
            .map(|(name, _)| *name)
            .unwrap_or(record.name);
        return Err(Error::PartialByte {
            record: record.name,
            field,
            filled,
        });
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn cursor(bytes: &[u8]) -> StreamCursor<Cursor<Vec<u8>>> {
        StreamCursor::new(Cursor::new(bytes.to_vec()))
    }

    #[test]
    fn test_reads_fixed_fields_in_order() {
        let layout = RecordDescriptor::build("Pair")
            .fixed("First", 2)
            .fixed("Second", 1)
            .finish()
            .unwrap();
        let record: Record<Infallible> =
            read_record(&mut cursor(&[0x01, 0x02, 0x03]), &layout, no_variants).unwrap();
        assert_eq!(record.uint("First").unwrap(), 0x0102);
        assert_eq!(record.uint("Second").unwrap(), 3);
        assert_eq!(record.consumed(), 3);

        let names: Vec<_> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["First", "Second"]);
    }

    #[test]
    fn test_shared_byte_bit_fields() {
        let layout = RecordDescriptor::build("Packed")
            .bits("Reserved", 0, 2)
            .bits("Filter", 2, 1)
            .bits("TagType", 3, 5)
            .finish()
            .unwrap();
        let record: Record<Infallible> =
            read_record(&mut cursor(&[0b0001_1000]), &layout, no_variants).unwrap();
        assert_eq!(record.uint("Reserved").unwrap(), 0);
        assert_eq!(record.uint("Filter").unwrap(), 0);
        assert_eq!(record.uint("TagType").unwrap(), 8);
        assert_eq!(record.consumed(), 1);
    }

    #[test]
    fn test_two_packed_bytes_in_one_record() {
        let layout = RecordDescriptor::build("TwoBytes")
            .bits("A", 0, 4)
            .bits("B", 4, 4)
            .bits("C", 0, 8)
            .finish()
            .unwrap();
        let record: Record<Infallible> =
            read_record(&mut cursor(&[0x12, 0xFF]), &layout, no_variants).unwrap();
        assert_eq!(record.uint("A").unwrap(), 1);
        assert_eq!(record.uint("B").unwrap(), 2);
        assert_eq!(record.uint("C").unwrap(), 0xFF);
        assert_eq!(record.consumed(), 2);
    }

    #[test]
    fn test_bit_field_gap_detected() {
        let layout = RecordDescriptor::build("Gappy")
            .bits("High", 0, 2)
            .bits("Low", 3, 5)
            .finish()
            .unwrap();
        let err = read_record::<_, Infallible, _>(&mut cursor(&[0xFF]), &layout, no_variants)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::BitFieldGap {
                record: "Gappy",
                field: "Low",
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn test_partial_byte_before_fixed_field() {
        let layout = RecordDescriptor::build("Mixed")
            .bits("Nibble", 0, 4)
            .fixed("Byte", 1)
            .finish()
            .unwrap();
        let err = read_record::<_, Infallible, _>(&mut cursor(&[0xFF, 0x01]), &layout, no_variants)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PartialByte {
                record: "Mixed",
                field: "Byte",
                filled: 4
            }
        ));
    }

    #[test]
    fn test_partial_byte_at_record_end() {
        let layout = RecordDescriptor::build("Short")
            .bits("Nibble", 0, 4)
            .finish()
            .unwrap();
        let err = read_record::<_, Infallible, _>(&mut cursor(&[0xFF]), &layout, no_variants)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PartialByte {
                record: "Short",
                field: "Nibble",
                filled: 4
            }
        ));
    }

    #[test]
    fn test_variant_resolver_sees_prior_fields() {
        let layout = RecordDescriptor::build("Sized")
            .fixed("Length", 1)
            .variant("Payload")
            .finish()
            .unwrap();
        let record = read_record(
            &mut cursor(&[0x03, b'a', b'b', b'c']),
            &layout,
            |_, prior, cursor| {
                let length = prior.uint("Length")?;
                let payload = cursor.read_bytes(length as usize)?;
                Ok((payload, u64::from(length)))
            },
        )
        .unwrap();
        assert_eq!(record.consumed(), 4);
        assert_eq!(&record.variant("Payload").unwrap()[..], b"abc");
        assert_eq!(&record.into_variant("Payload").unwrap()[..], b"abc");
    }

    #[test]
    fn test_missing_field_lookup() {
        let layout = RecordDescriptor::build("One")
            .fixed("Only", 1)
            .finish()
            .unwrap();
        let record: Record<Infallible> =
            read_record(&mut cursor(&[0x01]), &layout, no_variants).unwrap();
        assert!(matches!(
            record.uint("Other"),
            Err(Error::MissingField {
                record: "One",
                field: "Other"
            })
        ));
    }

    #[test]
    fn test_truncated_fixed_field() {
        let layout = RecordDescriptor::build("Wide")
            .fixed("Word", 2)
            .finish()
            .unwrap();
        let err =
            read_record::<_, Infallible, _>(&mut cursor(&[0x01]), &layout, no_variants).unwrap_err();
        assert!(matches!(err, Error::Incomplete { have: 1, need: 2, .. }));
    }

    #[test]
    fn test_no_variants_rejects_variant_fields() {
        let layout = RecordDescriptor::build("Odd")
            .variant("Mystery")
            .finish()
            .unwrap();
        let err =
            read_record::<_, Infallible, _>(&mut cursor(&[]), &layout, no_variants).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant { field: "Mystery" }));
    }

    #[test]
    fn test_builder_reports_first_invalid_field() {
        let err = RecordDescriptor::build("Broken")
            .fixed("Ok", 1)
            .fixed("Bad", 9)
            .bits("AlsoBad", 8, 1)
            .finish()
            .unwrap_err();
        assert!(matches!(err, Error::FixedWidth { width: 9 }));
    }
}
