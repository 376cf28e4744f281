use numstream_frame::Record;

use crate::error::DecodeError;

/// Decode one record as a base-10 signed integer.
///
/// Surrounding ASCII whitespace is ignored, so `\r\n` line endings decode the
/// same as `\n`. Anything else that is not an `i64` literal is rejected.
pub fn decode_value(record: &Record) -> Result<i64, DecodeError> {
    let text = record.to_str().map_err(|_| DecodeError::NotUtf8 {
        record: String::from_utf8_lossy(record.as_bytes()).into_owned(),
    })?;

    text.trim_matches(|c: char| c.is_ascii_whitespace())
        .parse::<i64>()
        .map_err(|source| DecodeError::InvalidInteger {
            record: text.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &'static [u8]) -> Result<i64, DecodeError> {
        decode_value(&Record::from(text))
    }

    #[test]
    fn decodes_signed_integers() {
        assert_eq!(decode(b"12").unwrap(), 12);
        assert_eq!(decode(b"-7").unwrap(), -7);
        assert_eq!(decode(b"0").unwrap(), 0);
        assert_eq!(decode(b"4294967295").unwrap(), 4_294_967_295);
    }

    #[test]
    fn tolerates_carriage_return_and_padding() {
        assert_eq!(decode(b"42\r").unwrap(), 42);
        assert_eq!(decode(b" 5 ").unwrap(), 5);
    }

    #[test]
    fn decode_then_format_reproduces_text() {
        for text in ["0", "1", "-1", "987654321", "9223372036854775807", "-9223372036854775808"] {
            let value = decode_value(&Record::new(text.to_string())).unwrap();
            assert_eq!(value.to_string(), text);
        }
    }

    #[test]
    fn rejects_malformed_records() {
        assert!(matches!(
            decode(b"12x"),
            Err(DecodeError::InvalidInteger { ref record, .. }) if record == "12x"
        ));
        assert!(matches!(decode(b""), Err(DecodeError::InvalidInteger { .. })));
        assert!(matches!(decode(b"1 2"), Err(DecodeError::InvalidInteger { .. })));
        assert!(matches!(
            decode(b"9223372036854775808"),
            Err(DecodeError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn rejects_non_utf8() {
        let err = decode(b"\xff1").unwrap_err();
        assert!(matches!(err, DecodeError::NotUtf8 { .. }));
    }
}
