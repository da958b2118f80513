use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::align::{padded_blob_len, padded_string_len};
use crate::error::{CodecError, Result};
use crate::tags;
use crate::timetag::TimeTag;

/// Size of the big-endian length prefix in front of a blob.
pub const BLOB_LEN_SIZE: usize = 4;

/// One typed OSC argument.
///
/// The variant set is closed: exactly the OSC 1.1 required types.
/// `Bool`, `Nil` and `Impulse` have no payload on the wire; their type
/// tag is the value.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Int(i32),
    Float(f32),
    String(String),
    Blob(Bytes),
    Time(TimeTag),
    Bool(bool),
    Nil,
    Impulse,
}

impl Argument {
    /// The one-character type tag announcing this argument.
    pub fn type_tag(&self) -> char {
        match self {
            Argument::Int(_) => tags::INT32,
            Argument::Float(_) => tags::FLOAT32,
            Argument::String(_) => tags::STRING,
            Argument::Blob(_) => tags::BLOB,
            Argument::Time(_) => tags::TIME_TAG,
            Argument::Bool(true) => tags::TRUE,
            Argument::Bool(false) => tags::FALSE,
            Argument::Nil => tags::NIL,
            Argument::Impulse => tags::IMPULSE,
        }
    }

    /// Exact number of payload bytes this argument occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        match self {
            Argument::Int(_) | Argument::Float(_) => 4,
            Argument::String(s) => padded_string_len(s.len()),
            Argument::Blob(b) => BLOB_LEN_SIZE + padded_blob_len(b.len()),
            Argument::Time(_) => crate::timetag::TIME_TAG_SIZE,
            Argument::Bool(_) | Argument::Nil | Argument::Impulse => 0,
        }
    }

    /// Check that the argument has a valid wire representation.
    pub fn validate(&self) -> Result<()> {
        match self {
            Argument::String(s) => check_osc_str(s),
            Argument::Blob(b) if b.len() > i32::MAX as usize => {
                Err(CodecError::ValueTypeMismatch(format!(
                    "blob of {} bytes exceeds the int32 length prefix",
                    b.len()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Append the payload bytes of this argument.
    ///
    /// Validates first, so nothing is written on error.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        self.validate()?;
        self.write_to(dst);
        Ok(())
    }

    /// Append the payload bytes. Callers must have validated the argument.
    pub(crate) fn write_to(&self, dst: &mut BytesMut) {
        match self {
            Argument::Int(v) => dst.put_i32(*v),
            Argument::Float(v) => dst.put_f32(*v),
            Argument::String(s) => write_padded_str(s, dst),
            Argument::Blob(b) => {
                dst.put_i32(b.len() as i32);
                dst.put_slice(b);
                dst.put_bytes(0, padded_blob_len(b.len()) - b.len());
            }
            Argument::Time(t) => t.encode(dst),
            Argument::Bool(_) | Argument::Nil | Argument::Impulse => {}
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.type_tag();
        match self {
            Argument::Int(v) => write!(f, "{tag}:{v}"),
            Argument::Float(v) => write!(f, "{tag}:{v}"),
            Argument::String(s) => write!(f, "{tag}:{s}"),
            Argument::Blob(b) => write!(f, "{tag}:<{} bytes>", b.len()),
            Argument::Time(t) => write!(f, "{tag}:{t}"),
            Argument::Bool(v) => write!(f, "{tag}:{v}"),
            Argument::Nil => write!(f, "{tag}:nil"),
            Argument::Impulse => write!(f, "{tag}:impulse"),
        }
    }
}

impl From<i32> for Argument {
    fn from(v: i32) -> Self {
        Argument::Int(v)
    }
}

impl From<f32> for Argument {
    fn from(v: f32) -> Self {
        Argument::Float(v)
    }
}

impl From<&str> for Argument {
    fn from(v: &str) -> Self {
        Argument::String(v.to_string())
    }
}

impl From<String> for Argument {
    fn from(v: String) -> Self {
        Argument::String(v)
    }
}

impl From<bool> for Argument {
    fn from(v: bool) -> Self {
        Argument::Bool(v)
    }
}

impl From<TimeTag> for Argument {
    fn from(v: TimeTag) -> Self {
        Argument::Time(v)
    }
}

impl From<Bytes> for Argument {
    fn from(v: Bytes) -> Self {
        Argument::Blob(v)
    }
}

impl From<Vec<u8>> for Argument {
    fn from(v: Vec<u8>) -> Self {
        Argument::Blob(Bytes::from(v))
    }
}

// ---------------------------------------------------------------------------
// Per-tag decoders
// ---------------------------------------------------------------------------

fn take_fixed<const N: usize>(src: &[u8], tag: char) -> Result<([u8; N], &[u8])> {
    if src.len() < N {
        return Err(CodecError::MalformedArgument {
            tag,
            needed: N,
            available: src.len(),
        });
    }
    let (head, rest) = src.split_at(N);
    let mut out = [0u8; N];
    out.copy_from_slice(head);
    Ok((out, rest))
}

/// Decode an `i` argument.
pub fn decode_int(src: &[u8]) -> Result<(Argument, &[u8])> {
    let (raw, rest) = take_fixed::<4>(src, tags::INT32)?;
    Ok((Argument::Int(i32::from_be_bytes(raw)), rest))
}

/// Decode an `f` argument.
pub fn decode_float(src: &[u8]) -> Result<(Argument, &[u8])> {
    let (raw, rest) = take_fixed::<4>(src, tags::FLOAT32)?;
    Ok((Argument::Float(f32::from_be_bytes(raw)), rest))
}

/// Decode an `s` argument.
pub fn decode_string(src: &[u8]) -> Result<(Argument, &[u8])> {
    let (s, rest) = read_padded_str(src)?;
    Ok((Argument::String(s.to_string()), rest))
}

/// Decode a `b` argument.
pub fn decode_blob(src: &[u8]) -> Result<(Argument, &[u8])> {
    let (raw, rest) = take_fixed::<BLOB_LEN_SIZE>(src, tags::BLOB)?;
    let declared = i32::from_be_bytes(raw);
    if declared < 0 {
        return Err(CodecError::MalformedBlob {
            declared: i64::from(declared),
            available: rest.len(),
        });
    }

    let len = declared as usize;
    let padded = padded_blob_len(len);
    if padded > rest.len() {
        return Err(CodecError::MalformedBlob {
            declared: i64::from(declared),
            available: rest.len(),
        });
    }

    let data = Bytes::copy_from_slice(&rest[..len]);
    Ok((Argument::Blob(data), &rest[padded..]))
}

/// Decode a `t` argument.
pub fn decode_time_tag(src: &[u8]) -> Result<(Argument, &[u8])> {
    let (tag, rest) = TimeTag::decode(src)?;
    Ok((Argument::Time(tag), rest))
}

pub fn decode_true(src: &[u8]) -> Result<(Argument, &[u8])> {
    Ok((Argument::Bool(true), src))
}

pub fn decode_false(src: &[u8]) -> Result<(Argument, &[u8])> {
    Ok((Argument::Bool(false), src))
}

pub fn decode_nil(src: &[u8]) -> Result<(Argument, &[u8])> {
    Ok((Argument::Nil, src))
}

pub fn decode_impulse(src: &[u8]) -> Result<(Argument, &[u8])> {
    Ok((Argument::Impulse, src))
}

// ---------------------------------------------------------------------------
// Padded strings
// ---------------------------------------------------------------------------

/// Reject strings that cannot survive a NUL-terminated round trip.
pub(crate) fn check_osc_str(s: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(CodecError::ValueTypeMismatch(format!(
            "string {s:?} contains an interior NUL"
        )));
    }
    Ok(())
}

/// Write `s`, a NUL terminator, and zero padding to the next 4-byte boundary.
pub(crate) fn write_padded_str(s: &str, dst: &mut BytesMut) {
    let padded = padded_string_len(s.len());
    dst.reserve(padded);
    dst.put_slice(s.as_bytes());
    dst.put_bytes(0, padded - s.len());
}

/// Read a NUL-terminated, padded string from the front of `src`.
pub(crate) fn read_padded_str(src: &[u8]) -> Result<(&str, &[u8])> {
    let nul = src.iter().position(|&b| b == 0).ok_or_else(|| {
        CodecError::MalformedString(format!("no terminator in {} bytes", src.len()))
    })?;

    let padded = padded_string_len(nul);
    if padded > src.len() {
        return Err(CodecError::MalformedString(format!(
            "padding needs {padded} bytes, {} remaining",
            src.len()
        )));
    }

    let s = std::str::from_utf8(&src[..nul])
        .map_err(|err| CodecError::MalformedString(err.to_string()))?;
    Ok((s, &src[padded..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(arg: &Argument) -> BytesMut {
        let mut buf = BytesMut::new();
        arg.encode(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_int_and_float_are_big_endian() {
        assert_eq!(encoded(&Argument::Int(1)).as_ref(), &[0, 0, 0, 1]);
        assert_eq!(encoded(&Argument::Int(-1)).as_ref(), &[0xFF; 4]);
        assert_eq!(
            encoded(&Argument::Float(1.0)).as_ref(),
            &[0x3F, 0x80, 0x00, 0x00]
        );
    }

    #[test]
    fn test_four_char_string_rounds_up_to_eight() {
        let buf = encoded(&Argument::from("abcd"));
        assert_eq!(buf.as_ref(), b"abcd\0\0\0\0");
    }

    #[test]
    fn test_empty_string_is_one_word() {
        let buf = encoded(&Argument::from(""));
        assert_eq!(buf.as_ref(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_four_byte_blob_has_no_padding() {
        let buf = encoded(&Argument::from(vec![1u8, 2, 3, 4]));
        assert_eq!(buf.as_ref(), &[0, 0, 0, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn test_odd_blob_is_zero_padded() {
        let buf = encoded(&Argument::from(vec![9u8, 9, 9, 9, 9]));
        assert_eq!(buf.as_ref(), &[0, 0, 0, 5, 9, 9, 9, 9, 9, 0, 0, 0]);

        let (arg, rest) = decode_blob(&buf).unwrap();
        assert_eq!(arg, Argument::Blob(Bytes::from_static(&[9, 9, 9, 9, 9])));
        assert!(rest.is_empty());
    }

    #[test]
    fn test_payloadless_variants_encode_nothing() {
        for arg in [
            Argument::Bool(true),
            Argument::Bool(false),
            Argument::Nil,
            Argument::Impulse,
        ] {
            assert!(encoded(&arg).is_empty());
            assert_eq!(arg.encoded_len(), 0);
        }
    }

    #[test]
    fn test_encoded_len_matches_output() {
        let args = [
            Argument::Int(7),
            Argument::Float(0.5),
            Argument::from("hello"),
            Argument::from(vec![1u8, 2, 3]),
            Argument::Time(TimeTag::IMMEDIATELY),
        ];
        for arg in &args {
            let buf = encoded(arg);
            assert_eq!(buf.len(), arg.encoded_len(), "{arg}");
            assert_eq!(buf.len() % 4, 0);
        }
    }

    #[test]
    fn test_truncated_fixed_size_args() {
        assert!(matches!(
            decode_int(&[0, 0, 1]),
            Err(CodecError::MalformedArgument { tag: 'i', .. })
        ));
        assert!(matches!(
            decode_float(&[]),
            Err(CodecError::MalformedArgument { tag: 'f', .. })
        ));
        assert!(matches!(
            decode_time_tag(&[0; 4]),
            Err(CodecError::MalformedArgument { tag: 't', .. })
        ));
    }

    #[test]
    fn test_string_without_terminator() {
        assert!(matches!(
            decode_string(b"abcd"),
            Err(CodecError::MalformedString(_))
        ));
    }

    #[test]
    fn test_string_with_truncated_padding() {
        assert!(matches!(
            decode_string(b"abcd\0"),
            Err(CodecError::MalformedString(_))
        ));
    }

    #[test]
    fn test_string_decode_leaves_remainder() {
        let (arg, rest) = decode_string(b"hi\0\0tail").unwrap();
        assert_eq!(arg, Argument::from("hi"));
        assert_eq!(rest, b"tail");
    }

    #[test]
    fn test_blob_length_exceeds_buffer() {
        let result = decode_blob(&[0, 0, 0, 16, 1, 2, 3, 4]);
        assert!(matches!(
            result,
            Err(CodecError::MalformedBlob {
                declared: 16,
                available: 4
            })
        ));
    }

    #[test]
    fn test_negative_blob_length() {
        assert!(matches!(
            decode_blob(&[0xFF, 0xFF, 0xFF, 0xFF]),
            Err(CodecError::MalformedBlob { declared: -1, .. })
        ));
    }

    #[test]
    fn test_interior_nul_is_rejected_before_writing() {
        let mut buf = BytesMut::new();
        let result = Argument::from("a\0b").encode(&mut buf);
        assert!(matches!(result, Err(CodecError::ValueTypeMismatch(_))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_display_uses_tag_prefix() {
        assert_eq!(Argument::Int(1).to_string(), "i:1");
        assert_eq!(Argument::from("bar").to_string(), "s:bar");
        assert_eq!(Argument::from(vec![0u8; 3]).to_string(), "b:<3 bytes>");
        assert_eq!(Argument::Bool(false).to_string(), "F:false");
        assert_eq!(Argument::Impulse.to_string(), "I:impulse");
    }
}
