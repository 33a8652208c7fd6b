//! Forward-only byte source with absolute position tracking. Every read is
//! exact: a short read surfaces as [`Error::Incomplete`] with the offset the
//! read started at, so callers can tell a clean end of stream from a field
//! cut off halfway.

use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use std::io::{self, Read};

pub struct StreamCursor<R> {
    inner: R,
    position: u64,
}

impl<R: Read> StreamCursor<R> {
    pub fn new(inner: R) -> Self {
        StreamCursor { inner, position: 0 }
    }

    /// Absolute offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Fills `buf` exactly, or reports how far the stream fell short.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let start = self.position;
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(Error::Incomplete {
                        offset: start,
                        need: buf.len() as u64,
                        have: filled as u64,
                    });
                }
                Ok(n) => {
                    filled += n;
                    self.position += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_into(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read_uint(2)? as u16)
    }

    /// Big-endian unsigned read of `nbytes` (1 to 8) bytes, zero-extended.
    pub fn read_uint(&mut self, nbytes: usize) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_into(&mut buf[..nbytes])?;
        Ok(BigEndian::read_uint(&buf[..nbytes], nbytes))
    }

    /// Big-endian IEEE-754 double.
    pub fn read_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_into(&mut buf)?;
        Ok(BigEndian::read_f64(&buf))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; len];
        self.read_into(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Discards exactly `n` bytes.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let start = self.position;
        let copied = io::copy(&mut self.inner.by_ref().take(n), &mut io::sink())?;
        self.position += copied;
        if copied < n {
            return Err(Error::Incomplete {
                offset: start,
                need: n,
                have: copied,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_position_tracks_reads() {
        let mut cursor = StreamCursor::new(Cursor::new([1u8, 2, 3, 4, 5]));
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.read_u8().unwrap(), 1);
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.read_uint(3).unwrap(), 0x020304);
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_read_uint_zero_extends() {
        let mut cursor = StreamCursor::new(Cursor::new([0xFF, 0xFF, 0xFF]));
        assert_eq!(cursor.read_uint(3).unwrap(), 0x00FF_FFFF);
    }

    #[test]
    fn test_read_uint_width_maximums() {
        for (nbytes, max) in [
            (1, 0xFFu64),
            (2, 0xFFFF),
            (3, 0x00FF_FFFF),
            (4, 0xFFFF_FFFF),
        ] {
            let mut cursor = StreamCursor::new(Cursor::new(vec![0xFFu8; nbytes]));
            assert_eq!(cursor.read_uint(nbytes).unwrap(), max);
        }
    }

    #[test]
    fn test_read_u16_big_endian() {
        let mut cursor = StreamCursor::new(Cursor::new([0x01, 0x02]));
        assert_eq!(cursor.read_u16().unwrap(), 0x0102);
    }

    #[test]
    fn test_read_f64_big_endian() {
        let mut cursor = StreamCursor::new(Cursor::new(99.5f64.to_be_bytes()));
        assert_eq!(cursor.read_f64().unwrap(), 99.5);
    }

    #[test]
    fn test_read_into_reports_shortfall() {
        let mut cursor = StreamCursor::new(Cursor::new([1u8, 2, 3]));
        let mut buf = [0u8; 5];
        let err = cursor.read_into(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            Error::Incomplete {
                offset: 0,
                need: 5,
                have: 3
            }
        ));
    }

    #[test]
    fn test_shortfall_offset_is_read_start() {
        let mut cursor = StreamCursor::new(Cursor::new([1u8, 2, 3]));
        cursor.read_u8().unwrap();
        let err = cursor.read_uint(4).unwrap_err();
        assert!(matches!(
            err,
            Error::Incomplete {
                offset: 1,
                need: 4,
                have: 2
            }
        ));
    }

    #[test]
    fn test_skip_advances_position() {
        let mut cursor = StreamCursor::new(Cursor::new([0u8; 16]));
        cursor.skip(10).unwrap();
        assert_eq!(cursor.position(), 10);
        assert_eq!(cursor.read_u8().unwrap(), 0);
    }

    #[test]
    fn test_skip_past_end() {
        let mut cursor = StreamCursor::new(Cursor::new([0u8; 4]));
        let err = cursor.skip(10).unwrap_err();
        assert!(matches!(
            err,
            Error::Incomplete {
                offset: 0,
                need: 10,
                have: 4
            }
        ));
    }

    #[test]
    fn test_read_bytes_returns_payload() {
        let mut cursor = StreamCursor::new(Cursor::new(b"abcdef".to_vec()));
        let bytes = cursor.read_bytes(3).unwrap();
        assert_eq!(&bytes[..], b"abc");
        assert_eq!(cursor.position(), 3);
    }
}
