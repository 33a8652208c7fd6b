use crate::error::{Error, Result};

/// Value to display label pairs for a field's enumerated values.
pub type Labels = &'static [(u32, &'static str)];

/// A decoded field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    /// Whole-byte unsigned integer, 1 to 4 bytes big-endian.
    Uint(u32),
    /// Sub-byte unsigned integer, 1 to 8 bits.
    Bits(u8),
}

impl FieldValue {
    pub fn as_u32(self) -> u32 {
        match self {
            FieldValue::Uint(value) => value,
            FieldValue::Bits(value) => u32::from(value),
        }
    }
}

/// Big-endian unsigned integer field of 1 to 4 whole bytes, zero-extended.
#[derive(Debug, Clone, Copy)]
pub struct FixedInt {
    width: u8,
    labels: Option<Labels>,
}

impl FixedInt {
    pub fn new(width: u8) -> Result<Self> {
        if !(1..=4).contains(&width) {
            return Err(Error::FixedWidth { width });
        }
        Ok(FixedInt {
            width,
            labels: None,
        })
    }

    pub fn labeled(width: u8, labels: Labels) -> Result<Self> {
        Ok(FixedInt {
            labels: Some(labels),
            ..FixedInt::new(width)?
        })
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn labels(&self) -> Option<Labels> {
        self.labels
    }
}

/// Unsigned integer field of 1 to 8 bits inside a single byte, `offset`
/// counted from the most significant bit.
#[derive(Debug, Clone, Copy)]
pub struct BitField {
    offset: u8,
    width: u8,
    labels: Option<Labels>,
}

impl BitField {
    pub fn new(offset: u8, width: u8) -> Result<Self> {
        if offset > 7 || width == 0 || width > 8 - offset {
            return Err(Error::BitSpan { offset, width });
        }
        Ok(BitField {
            offset,
            width,
            labels: None,
        })
    }

    pub fn labeled(offset: u8, width: u8, labels: Labels) -> Result<Self> {
        Ok(BitField {
            labels: Some(labels),
            ..BitField::new(offset, width)?
        })
    }

    pub fn offset(&self) -> u8 {
        self.offset
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn labels(&self) -> Option<Labels> {
        self.labels
    }

    /// Extracts this field's bits from the byte it shares with its siblings.
    pub fn decode(&self, byte: u8) -> u8 {
        let shift = 8 - self.offset - self.width;
        // 16-bit intermediate so a full-byte field does not overflow the mask
        let mask = ((1u16 << self.width) - 1) as u8;
        (byte >> shift) & mask
    }
}

/// Looks up the display label for a decoded value.
pub fn label_for(labels: Option<Labels>, value: u32) -> Option<&'static str> {
    labels.and_then(|table| {
        table
            .iter()
            .find(|(candidate, _)| *candidate == value)
            .map(|(_, label)| *label)
    })
}
