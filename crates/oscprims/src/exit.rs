use std::fmt;
use std::io;

use oscprims_codec::CodecError;

// Process exit codes. 60 and 64 follow sysexits-style data/usage semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Values typed on the command line that cannot be encoded are usage errors.
pub fn encode_error(context: &str, err: CodecError) -> CliError {
    match err {
        CodecError::ValueTypeMismatch(_)
        | CodecError::InvalidAddress(_)
        | CodecError::MalformedString(_)
        | CodecError::UnknownTypeTag(_) => CliError::new(USAGE, format!("{context}: {err}")),
        CodecError::PacketTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

/// Every decode failure means the input bytes are not a valid packet.
pub fn decode_error(context: &str, err: CodecError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failures_are_data_invalid() {
        let err = decode_error("decode failed", CodecError::UnknownTypeTag('x'));
        assert_eq!(err.code, DATA_INVALID);
        assert_eq!(err.message, "decode failed: unknown type tag 'x'");
    }

    #[test]
    fn encode_mismatch_is_usage() {
        let err = encode_error("encode failed", CodecError::InvalidAddress("foo".into()));
        assert_eq!(err.code, USAGE);

        let err = encode_error(
            "encode failed",
            CodecError::PacketTooLarge { size: 10, max: 8 },
        );
        assert_eq!(err.code, DATA_INVALID);
    }
}
