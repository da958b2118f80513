/// Errors that can occur during OSC encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A padded string has no NUL terminator, is truncated, or is not UTF-8.
    #[error("malformed string: {0}")]
    MalformedString(String),

    /// Too few bytes remain for a fixed-size argument.
    #[error("malformed argument '{tag}': need {needed} bytes, {available} remaining")]
    MalformedArgument {
        tag: char,
        needed: usize,
        available: usize,
    },

    /// A blob's declared length does not fit in the remaining buffer.
    #[error("malformed blob: declared {declared} bytes, {available} remaining")]
    MalformedBlob { declared: i64, available: usize },

    /// The type tag has no decoder in the registry.
    #[error("unknown type tag '{0}'")]
    UnknownTypeTag(char),

    /// The address lacks its leading '/' or the type tag string its ','.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The bundle marker, header, or an element length prefix is invalid.
    #[error("malformed bundle: {0}")]
    MalformedBundle(String),

    /// A value cannot be represented under its declared or inferred tag.
    #[error("value type mismatch: {0}")]
    ValueTypeMismatch(String),

    /// The address pattern does not start with '/'.
    #[error("invalid address pattern {0:?} (must start with '/')")]
    InvalidAddress(String),

    /// The packet exceeds the configured maximum size.
    #[error("packet too large ({size} bytes, max {max})")]
    PacketTooLarge { size: usize, max: usize },

    /// Bundles are nested deeper than the configured limit.
    #[error("bundle nesting exceeds max depth {max}")]
    NestingTooDeep { max: usize },

    /// An I/O error surfaced through a `tokio_util` codec.
    #[cfg(feature = "async")]
    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
