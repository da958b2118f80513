//! OSC 1.1 wire-format codec.
//!
//! Converts typed messages and bundles to and from the bytes of one
//! datagram. Everything is 4-byte aligned:
//! - Strings are NUL-terminated and zero padded (always at least one NUL)
//! - Blobs carry a 4-byte big-endian length and are zero padded
//! - Bundles prefix each nested element with its 4-byte big-endian length
//!
//! No sockets, no buffering across datagrams. The transport owns both.

pub mod align;
pub mod argument;
pub mod bundle;
pub mod error;
pub mod message;
pub mod packet;
pub mod registry;
pub mod tags;
pub mod timetag;

pub use align::{padded_blob_len, padded_string_len};
pub use argument::Argument;
pub use bundle::{Bundle, BUNDLE_TAG};
pub use error::{CodecError, Result};
pub use message::Message;
pub use packet::{
    decode_packet, encode_packet, CodecConfig, OscCodec, Packet, DEFAULT_MAX_NESTING_DEPTH,
    DEFAULT_MAX_PACKET_SIZE,
};
pub use registry::{DecodeFn, NativeKind, NativeValue, TypeRegistry};
pub use timetag::{TimeTag, NTP_UNIX_OFFSET};
