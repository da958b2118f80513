use std::collections::HashMap;
use std::sync::OnceLock;

use crate::argument::{
    decode_blob, decode_false, decode_float, decode_impulse, decode_int, decode_nil, decode_string,
    decode_time_tag, decode_true, Argument,
};
use crate::error::{CodecError, Result};
use crate::tags;
use crate::timetag::TimeTag;

/// Decodes one argument from the front of a buffer, returning the remainder.
pub type DecodeFn = fn(&[u8]) -> Result<(Argument, &[u8])>;

/// Kind of a native value handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Int,
    Float,
    Str,
    Bytes,
    Bool,
    Time,
    Nil,
}

/// An untyped application value waiting to become an [`Argument`].
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Bool(bool),
    Time(TimeTag),
    Nil,
}

impl NativeValue {
    pub fn kind(&self) -> NativeKind {
        match self {
            NativeValue::Int(_) => NativeKind::Int,
            NativeValue::Float(_) => NativeKind::Float,
            NativeValue::Str(_) => NativeKind::Str,
            NativeValue::Bytes(_) => NativeKind::Bytes,
            NativeValue::Bool(_) => NativeKind::Bool,
            NativeValue::Time(_) => NativeKind::Time,
            NativeValue::Nil => NativeKind::Nil,
        }
    }
}

/// Immutable tag → decoder and native kind → default tag tables.
///
/// Build one with [`TypeRegistry::standard`] (or start from
/// [`TypeRegistry::empty`] and the `with_*` builders), then share it by
/// reference. Nothing mutates a registry once it is handed to the codec.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    decoders: HashMap<char, DecodeFn>,
    defaults: HashMap<NativeKind, char>,
}

impl TypeRegistry {
    /// A registry that knows no tags at all.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
            defaults: HashMap::new(),
        }
    }

    /// The OSC 1.1 required tag set with int/float/string defaults.
    pub fn standard() -> Self {
        let decoders: [(char, DecodeFn); 9] = [
            (tags::INT32, decode_int),
            (tags::FLOAT32, decode_float),
            (tags::STRING, decode_string),
            (tags::BLOB, decode_blob),
            (tags::TRUE, decode_true),
            (tags::FALSE, decode_false),
            (tags::NIL, decode_nil),
            (tags::IMPULSE, decode_impulse),
            (tags::TIME_TAG, decode_time_tag),
        ];

        let mut registry = Self::empty();
        for (tag, decode) in decoders {
            registry = registry.with_decoder(tag, decode);
        }

        registry
            .with_default(NativeKind::Int, tags::INT32)
            .with_default(NativeKind::Float, tags::FLOAT32)
            .with_default(NativeKind::Str, tags::STRING)
    }

    /// Process-wide standard registry, built on first use.
    pub fn shared() -> &'static TypeRegistry {
        static SHARED: OnceLock<TypeRegistry> = OnceLock::new();
        SHARED.get_or_init(TypeRegistry::standard)
    }

    /// Add or replace the decoder for `tag`.
    pub fn with_decoder(mut self, tag: char, decode: DecodeFn) -> Self {
        self.decoders.insert(tag, decode);
        self
    }

    /// Add or replace the default tag used for untagged values of `kind`.
    pub fn with_default(mut self, kind: NativeKind, tag: char) -> Self {
        self.defaults.insert(kind, tag);
        self
    }

    pub fn knows(&self, tag: char) -> bool {
        self.decoders.contains_key(&tag)
    }

    /// Look up the decoder for `tag`.
    pub fn decoder(&self, tag: char) -> Result<DecodeFn> {
        self.decoders
            .get(&tag)
            .copied()
            .ok_or(CodecError::UnknownTypeTag(tag))
    }

    /// Default tag for untagged values of `kind`, if any.
    pub fn default_tag(&self, kind: NativeKind) -> Option<char> {
        self.defaults.get(&kind).copied()
    }

    /// Decode one argument announced by `tag` from the front of `src`.
    pub fn decode_argument<'a>(&self, tag: char, src: &'a [u8]) -> Result<(Argument, &'a [u8])> {
        let decode = self.decoder(tag)?;
        decode(src)
    }

    /// Build an argument from a native value.
    ///
    /// With an explicit `tag` the value is coerced where the conversion is
    /// exact. Without one, the value's kind picks a default tag; blobs,
    /// booleans, time tags and nil have no default and must be tagged.
    pub fn create_argument(&self, value: NativeValue, tag: Option<char>) -> Result<Argument> {
        let tag = match tag {
            Some(tag) => {
                if !self.knows(tag) {
                    return Err(CodecError::UnknownTypeTag(tag));
                }
                tag
            }
            None => self.default_tag(value.kind()).ok_or_else(|| {
                CodecError::ValueTypeMismatch(format!(
                    "{:?} values need an explicit type tag",
                    value.kind()
                ))
            })?,
        };
        coerce(value, tag)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn mismatch(value: &NativeValue, tag: char) -> CodecError {
    CodecError::ValueTypeMismatch(format!(
        "{value:?} cannot be encoded as '{tag}' ({})",
        tags::tag_name(tag)
    ))
}

const TWO_POW_63: f32 = 9_223_372_036_854_775_808.0;

fn coerce(value: NativeValue, tag: char) -> Result<Argument> {
    let arg = match (tag, &value) {
        (tags::INT32, NativeValue::Int(v)) => i32::try_from(*v).ok().map(Argument::Int),
        (tags::INT32, NativeValue::Float(v)) => {
            let in_range = *v >= f64::from(i32::MIN) && *v <= f64::from(i32::MAX);
            (v.fract() == 0.0 && in_range).then(|| Argument::Int(*v as i32))
        }
        (tags::INT32, NativeValue::Str(s)) => s.trim().parse::<i32>().ok().map(Argument::Int),

        (tags::FLOAT32, NativeValue::Int(v)) => {
            // `as i64` saturates, so 2^63 would compare equal to i64::MAX.
            let f = *v as f32;
            (f < TWO_POW_63 && f as i64 == *v).then_some(Argument::Float(f))
        }
        (tags::FLOAT32, NativeValue::Float(v)) => {
            let f = *v as f32;
            (f.is_finite() || !v.is_finite()).then_some(Argument::Float(f))
        }
        (tags::FLOAT32, NativeValue::Str(s)) => s.trim().parse::<f32>().ok().map(Argument::Float),

        (tags::STRING, NativeValue::Str(s)) => Some(Argument::String(s.clone())),
        (tags::STRING, NativeValue::Int(v)) => Some(Argument::String(v.to_string())),
        (tags::STRING, NativeValue::Float(v)) => Some(Argument::String(v.to_string())),

        (tags::BLOB, NativeValue::Bytes(b)) => Some(Argument::from(b.clone())),
        (tags::BLOB, NativeValue::Str(s)) => Some(Argument::from(s.clone().into_bytes())),

        (tags::TIME_TAG, NativeValue::Time(t)) => Some(Argument::Time(*t)),
        (tags::TRUE, NativeValue::Bool(true)) => Some(Argument::Bool(true)),
        (tags::FALSE, NativeValue::Bool(false)) => Some(Argument::Bool(false)),
        (tags::NIL, NativeValue::Nil) => Some(Argument::Nil),
        (tags::IMPULSE, NativeValue::Nil) => Some(Argument::Impulse),
        _ => None,
    };

    let arg = arg.ok_or_else(|| mismatch(&value, tag))?;
    arg.validate()?;
    Ok(arg)
}
