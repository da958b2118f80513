//! OSC 1.1 required type tags.
//!
//! Every argument on the wire is announced by one character in the
//! message's type tag string.

/// 32-bit big-endian two's complement integer.
pub const INT32: char = 'i';

/// 32-bit big-endian IEEE 754 float.
pub const FLOAT32: char = 'f';

/// NUL-terminated, 4-byte padded string.
pub const STRING: char = 's';

/// Length-prefixed, 4-byte padded byte blob.
pub const BLOB: char = 'b';

/// Boolean true (no payload).
pub const TRUE: char = 'T';

/// Boolean false (no payload).
pub const FALSE: char = 'F';

/// Null (no payload).
pub const NIL: char = 'N';

/// Impulse, aka "bang" (no payload).
pub const IMPULSE: char = 'I';

/// 64-bit NTP time tag.
pub const TIME_TAG: char = 't';

/// Every tag an OSC 1.1 implementation must understand.
pub const REQUIRED: [char; 9] = [
    INT32, FLOAT32, STRING, BLOB, TRUE, FALSE, NIL, IMPULSE, TIME_TAG,
];

/// Leading character of every type tag string.
pub const TYPE_TAG_PREFIX: char = ',';

/// Returns a human-readable name for a type tag.
pub fn tag_name(tag: char) -> &'static str {
    match tag {
        INT32 => "int32",
        FLOAT32 => "float32",
        STRING => "string",
        BLOB => "blob",
        TRUE => "true",
        FALSE => "false",
        NIL => "nil",
        IMPULSE => "impulse",
        TIME_TAG => "timetag",
        _ => "unknown",
    }
}

/// Returns true if the tag carries no payload bytes.
pub fn is_payloadless(tag: char) -> bool {
    matches!(tag, TRUE | FALSE | NIL | IMPULSE)
}
