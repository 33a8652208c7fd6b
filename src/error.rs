use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Decoding errors, each carrying the values that tripped it
#[derive(Debug, Error)]
pub enum Error {
    #[error("Not an FLV stream, signature {found:02X?}")]
    Signature { found: [u8; 3] },

    #[error("Fixed field width {width} outside 1-4 bytes")]
    FixedWidth { width: u8 },

    #[error("Bit field at offset {offset} with width {width} does not fit one byte")]
    BitSpan { offset: u8, width: u8 },

    #[error("{record}.{field} starts at bit {found}, previous field ended at bit {expected}")]
    BitFieldGap {
        record: &'static str,
        field: &'static str,
        expected: u8,
        found: u8,
    },

    #[error("{record}.{field} leaves a shared byte {filled}/8 filled")]
    PartialByte {
        record: &'static str,
        field: &'static str,
        filled: u8,
    },

    #[error("{record} has no field {field}")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("No resolver for variant field {field}")]
    UnknownVariant { field: &'static str },

    #[error("Stream ended at offset {offset}, needed {need} bytes, got {have}")]
    Incomplete { offset: u64, need: u64, have: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
