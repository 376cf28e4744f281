use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Record delimiter on the wire.
pub const DELIMITER: u8 = b'\n';

/// Suggested record length bound for callers that want one: 1 MiB.
pub const DEFAULT_MAX_LINE: usize = 1024 * 1024;

/// One line of the stream, delimiter excluded.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Record(Bytes);

impl Record {
    /// Create a new record.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// The record as UTF-8 text.
    pub fn to_str(&self) -> std::result::Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl AsRef<[u8]> for Record {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&'static [u8]> for Record {
    fn from(bytes: &'static [u8]) -> Self {
        Self(Bytes::from_static(bytes))
    }
}

/// Encode a record into the wire format: payload followed by `\n`.
pub fn encode_line(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.contains(&DELIMITER) {
        return Err(FrameError::EmbeddedDelimiter);
    }
    dst.reserve(payload.len() + 1);
    dst.put_slice(payload);
    dst.put_u8(DELIMITER);
    Ok(())
}

/// Decode the first complete record from a buffer.
///
/// Returns `None` if the buffer holds no delimiter yet. `scanned` remembers how
/// many leading bytes are already known to be delimiter-free so repeated calls
/// on a growing buffer never rescan them; it is reset once a record is split off.
pub fn decode_line(src: &mut BytesMut, scanned: &mut usize) -> Option<Record> {
    let start = (*scanned).min(src.len());
    match src[start..].iter().position(|&b| b == DELIMITER) {
        Some(offset) => {
            let line = src.split_to(start + offset).freeze();
            src.advance(1);
            *scanned = 0;
            Some(Record(line))
        }
        None => {
            *scanned = src.len();
            None
        }
    }
}

/// Configuration for the line framer.
///
/// The default places no bound on record length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineConfig {
    /// Maximum record length in bytes. `None` disables the check.
    pub max_line_length: Option<usize>,
}

impl LineConfig {
    /// Reject records longer than `max` bytes.
    pub fn bounded(max: usize) -> Self {
        Self {
            max_line_length: Some(max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_line() {
        let mut buf = BytesMut::from(&b"12\n"[..]);
        let mut scanned = 0;

        let record = decode_line(&mut buf, &mut scanned).unwrap();
        assert_eq!(record.as_bytes(), b"12");
        assert!(buf.is_empty());
        assert_eq!(scanned, 0);
    }

    #[test]
    fn test_decode_splits_at_first_delimiter() {
        let mut buf = BytesMut::from(&b"1\n22\n3"[..]);
        let mut scanned = 0;

        assert_eq!(decode_line(&mut buf, &mut scanned).unwrap().as_bytes(), b"1");
        assert_eq!(decode_line(&mut buf, &mut scanned).unwrap().as_bytes(), b"22");
        assert!(decode_line(&mut buf, &mut scanned).is_none());
        assert_eq!(buf.as_ref(), b"3");
        assert_eq!(scanned, 1);
    }

    #[test]
    fn test_decode_incomplete_line_remembers_scan_position() {
        let mut buf = BytesMut::from(&b"123"[..]);
        let mut scanned = 0;

        assert!(decode_line(&mut buf, &mut scanned).is_none());
        assert_eq!(scanned, 3);

        buf.extend_from_slice(b"4\n");
        let record = decode_line(&mut buf, &mut scanned).unwrap();
        assert_eq!(record.as_bytes(), b"1234");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_leading_delimiter_is_empty_record() {
        let mut buf = BytesMut::from(&b"\n5\n"[..]);
        let mut scanned = 0;

        let first = decode_line(&mut buf, &mut scanned).unwrap();
        assert!(first.is_empty());
        assert_eq!(decode_line(&mut buf, &mut scanned).unwrap().as_bytes(), b"5");
    }

    #[test]
    fn test_encode_appends_delimiter() {
        let mut buf = BytesMut::new();
        encode_line(b"-17", &mut buf).unwrap();
        encode_line(b"", &mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"-17\n\n");
    }

    #[test]
    fn test_encode_rejects_embedded_delimiter() {
        let mut buf = BytesMut::new();
        let result = encode_line(b"1\n2", &mut buf);
        assert!(matches!(result, Err(FrameError::EmbeddedDelimiter)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_record_text_access() {
        let record = Record::from(&b"42"[..]);
        assert_eq!(record.to_str().unwrap(), "42");
        assert_eq!(record.len(), 2);
        assert_eq!(format!("{record:?}"), "Record(\"42\")");

        let binary = Record::new(vec![0xff_u8, 0xfe]);
        assert!(binary.to_str().is_err());
    }
}
