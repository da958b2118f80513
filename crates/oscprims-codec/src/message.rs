use std::fmt;

use bytes::BytesMut;
use tracing::trace;

use crate::align::padded_string_len;
use crate::argument::{check_osc_str, read_padded_str, write_padded_str, Argument};
use crate::error::{CodecError, Result};
use crate::registry::TypeRegistry;
use crate::tags::TYPE_TAG_PREFIX;

/// An OSC message: address pattern plus ordered arguments.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬──────────────────┬──────────────────────┐
/// │ Address          │ Type tags        │ Arguments            │
/// │ "/foo\0" + pad   │ ",is\0" + pad    │ each arg's payload   │
/// └──────────────────┴──────────────────┴──────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Address pattern, always starting with `/`.
    pub address: String,
    /// Arguments in wire order.
    pub args: Vec<Argument>,
}

impl Message {
    /// Create a message with no arguments.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    /// Create a message with the given arguments.
    pub fn with_args(address: impl Into<String>, args: impl IntoIterator<Item = Argument>) -> Self {
        Self {
            address: address.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<Argument>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The type tag string, e.g. `",is"`.
    pub fn type_tags(&self) -> String {
        let mut tags = String::with_capacity(self.args.len() + 1);
        tags.push(TYPE_TAG_PREFIX);
        tags.extend(self.args.iter().map(Argument::type_tag));
        tags
    }

    /// Exact wire size of this message.
    pub fn encoded_len(&self) -> usize {
        padded_string_len(self.address.len())
            + padded_string_len(self.args.len() + 1)
            + self.args.iter().map(Argument::encoded_len).sum::<usize>()
    }

    /// Check that the whole message can be encoded.
    pub fn validate(&self) -> Result<()> {
        if !self.address.starts_with('/') {
            return Err(CodecError::InvalidAddress(self.address.clone()));
        }
        check_osc_str(&self.address)?;
        self.args.iter().try_for_each(Argument::validate)
    }

    /// Append the wire form of this message.
    ///
    /// Validates everything first, so nothing is written on error.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        self.validate()?;
        self.write_to(dst);
        Ok(())
    }

    pub(crate) fn write_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        write_padded_str(&self.address, dst);
        write_padded_str(&self.type_tags(), dst);
        for arg in &self.args {
            arg.write_to(dst);
        }
    }

    /// Decode a message from the front of `src`.
    ///
    /// Returns the message and whatever bytes follow it.
    pub fn decode<'a>(src: &'a [u8], registry: &TypeRegistry) -> Result<(Self, &'a [u8])> {
        let (address, rest) = read_padded_str(src)?;
        if !address.starts_with('/') {
            return Err(CodecError::MalformedMessage(format!(
                "address {address:?} does not start with '/'"
            )));
        }
        let (type_tags, mut rest) = read_padded_str(rest)?;

        let tags = type_tags.strip_prefix(TYPE_TAG_PREFIX).ok_or_else(|| {
            CodecError::MalformedMessage(format!(
                "type tag string {type_tags:?} for {address} does not start with ','"
            ))
        })?;

        let mut args = Vec::with_capacity(tags.len());
        for tag in tags.chars() {
            let (arg, next) = registry.decode_argument(tag, rest)?;
            args.push(arg);
            rest = next;
        }

        trace!(address, tags, remaining = rest.len(), "decoded OSC message");
        Ok((
            Self {
                address: address.to_string(),
                args,
            },
            rest,
        ))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.address, self.type_tags())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
