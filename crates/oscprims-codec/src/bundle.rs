use std::fmt;

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::error::{CodecError, Result};
use crate::message::Message;
use crate::packet::Packet;
use crate::registry::TypeRegistry;
use crate::timetag::{TimeTag, TIME_TAG_SIZE};

/// Bundle marker: `"#bundle"` plus NUL, already 4-byte aligned.
pub const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";

/// Marker (8) + time tag (8) = 16 bytes.
pub const BUNDLE_HEADER_SIZE: usize = BUNDLE_TAG.len() + TIME_TAG_SIZE;

/// Size of the big-endian length prefix in front of each element.
pub const ELEMENT_LEN_SIZE: usize = 4;

/// A time-tagged, ordered collection of messages and nested bundles.
///
/// Wire format:
/// ```text
/// ┌──────────────┬────────────┬───────────┬───────────┬─────┐
/// │ "#bundle\0"  │ Time tag   │ Len (4B)  │ Element   │ ... │
/// │ (8B)         │ (8B)       │ BE u32    │ (Len B)   │     │
/// └──────────────┴────────────┴───────────┴───────────┴─────┘
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    /// When the receiver should apply the contents.
    pub time_tag: TimeTag,
    /// Messages and nested bundles, in wire order.
    pub content: Vec<Packet>,
}

impl Bundle {
    /// Create an empty bundle.
    pub fn new(time_tag: TimeTag) -> Self {
        Self {
            time_tag,
            content: Vec::new(),
        }
    }

    /// Create a bundle with the given elements.
    pub fn with_content(time_tag: TimeTag, content: impl IntoIterator<Item = Packet>) -> Self {
        Self {
            time_tag,
            content: content.into_iter().collect(),
        }
    }

    /// Append one element.
    pub fn element(mut self, element: impl Into<Packet>) -> Self {
        self.content.push(element.into());
        self
    }

    /// Exact wire size of this bundle, including nested elements.
    pub fn encoded_len(&self) -> usize {
        BUNDLE_HEADER_SIZE
            + self
                .content
                .iter()
                .map(|element| ELEMENT_LEN_SIZE + element.encoded_len())
                .sum::<usize>()
    }

    /// Check that every element can be encoded.
    pub fn validate(&self) -> Result<()> {
        for element in &self.content {
            element.validate()?;
            let len = element.encoded_len();
            if len > u32::MAX as usize {
                return Err(CodecError::ValueTypeMismatch(format!(
                    "bundle element of {len} bytes exceeds the u32 length prefix"
                )));
            }
        }
        Ok(())
    }

    /// Append the wire form of this bundle.
    ///
    /// Validates the whole tree first, so nothing is written on error.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        self.validate()?;
        self.write_to(dst);
        Ok(())
    }

    pub(crate) fn write_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_slice(BUNDLE_TAG);
        self.time_tag.encode(dst);
        for element in &self.content {
            dst.put_u32(element.encoded_len() as u32);
            element.write_to(dst);
        }
    }

    /// Decode a bundle occupying all of `src`.
    ///
    /// `max_depth` bounds how many bundles may be nested, counting this one.
    pub fn decode(src: &[u8], registry: &TypeRegistry, max_depth: usize) -> Result<Self> {
        Self::decode_at_depth(src, registry, 1, max_depth)
    }

    fn decode_at_depth(
        src: &[u8],
        registry: &TypeRegistry,
        depth: usize,
        max_depth: usize,
    ) -> Result<Self> {
        if depth > max_depth {
            return Err(CodecError::NestingTooDeep { max: max_depth });
        }
        if !src.starts_with(BUNDLE_TAG) {
            return Err(CodecError::MalformedBundle(
                "missing \"#bundle\" marker".to_string(),
            ));
        }
        if src.len() < BUNDLE_HEADER_SIZE {
            return Err(CodecError::MalformedBundle(format!(
                "header needs {BUNDLE_HEADER_SIZE} bytes, got {}",
                src.len()
            )));
        }

        let (time_tag, mut rest) = TimeTag::decode(&src[BUNDLE_TAG.len()..])?;
        let mut bundle = Bundle::new(time_tag);

        while !rest.is_empty() {
            if rest.len() < ELEMENT_LEN_SIZE {
                return Err(CodecError::MalformedBundle(format!(
                    "truncated element length prefix ({} bytes)",
                    rest.len()
                )));
            }
            let (prefix, after) = rest.split_at(ELEMENT_LEN_SIZE);
            let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
            if len > after.len() {
                return Err(CodecError::MalformedBundle(format!(
                    "element length {len} exceeds remaining {} bytes",
                    after.len()
                )));
            }

            let (element, next) = after.split_at(len);
            bundle
                .content
                .push(decode_element(element, registry, depth, max_depth)?);
            rest = next;
        }

        trace!(
            time_tag = %bundle.time_tag,
            elements = bundle.content.len(),
            depth,
            "decoded OSC bundle"
        );
        Ok(bundle)
    }
}

fn decode_element(
    element: &[u8],
    registry: &TypeRegistry,
    depth: usize,
    max_depth: usize,
) -> Result<Packet> {
    match element.first() {
        Some(b'/') => {
            let (message, rest) = Message::decode(element, registry)?;
            if !rest.is_empty() {
                return Err(CodecError::MalformedBundle(format!(
                    "{} unconsumed bytes after element {}",
                    rest.len(),
                    message.address
                )));
            }
            Ok(Packet::Message(message))
        }
        Some(b'#') => {
            Bundle::decode_at_depth(element, registry, depth + 1, max_depth).map(Packet::Bundle)
        }
        Some(other) => Err(CodecError::MalformedBundle(format!(
            "element starts with {:?}, expected '/' or '#'",
            char::from(*other)
        ))),
        None => Err(CodecError::MalformedBundle("empty element".to_string())),
    }
}

impl fmt::Display for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#bundle {} [", self.time_tag)?;
        for (i, element) in self.content.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{element}")?;
        }
        write!(f, "]")
    }
}
