use std::fmt;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::bundle::{Bundle, BUNDLE_TAG};
use crate::error::{CodecError, Result};
use crate::message::Message;
use crate::registry::TypeRegistry;

/// Default maximum packet size: the largest UDP payload over IPv4.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 65_507;

/// Default maximum number of nested bundles.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;

/// The contents of one datagram: a message or a bundle.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Message(Message),
    Bundle(Bundle),
}

impl Packet {
    pub fn is_bundle(&self) -> bool {
        matches!(self, Packet::Bundle(_))
    }

    /// Exact wire size of this packet.
    pub fn encoded_len(&self) -> usize {
        match self {
            Packet::Message(m) => m.encoded_len(),
            Packet::Bundle(b) => b.encoded_len(),
        }
    }

    /// Check that the packet can be encoded.
    pub fn validate(&self) -> Result<()> {
        match self {
            Packet::Message(m) => m.validate(),
            Packet::Bundle(b) => b.validate(),
        }
    }

    /// Append the wire form of this packet.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        self.validate()?;
        self.write_to(dst);
        Ok(())
    }

    pub(crate) fn write_to(&self, dst: &mut BytesMut) {
        match self {
            Packet::Message(m) => m.write_to(dst),
            Packet::Bundle(b) => b.write_to(dst),
        }
    }
}

impl From<Message> for Packet {
    fn from(message: Message) -> Self {
        Packet::Message(message)
    }
}

impl From<Bundle> for Packet {
    fn from(bundle: Bundle) -> Self {
        Packet::Bundle(bundle)
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packet::Message(m) => fmt::Display::fmt(m, f),
            Packet::Bundle(b) => fmt::Display::fmt(b, f),
        }
    }
}

/// Limits applied by [`OscCodec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum packet size in bytes, both directions. Default: 65 507.
    pub max_packet_size: usize,
    /// Maximum bundle nesting depth. Default: 32.
    pub max_nesting_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Packet encoder/decoder bound to a type registry and limits.
///
/// Holds only a shared reference to an immutable registry, so one codec can
/// be copied freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct OscCodec<'r> {
    registry: &'r TypeRegistry,
    config: CodecConfig,
}

impl OscCodec<'static> {
    /// Codec over the shared standard registry with default limits.
    pub fn new() -> Self {
        Self::with_registry(TypeRegistry::shared())
    }
}

impl Default for OscCodec<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> OscCodec<'r> {
    /// Codec over an explicit registry with default limits.
    pub fn with_registry(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            config: CodecConfig::default(),
        }
    }

    /// Replace the codec limits.
    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode one datagram.
    ///
    /// A buffer starting with `#` must be a bundle; anything else is
    /// decoded as a message. Bytes after a top-level message are ignored.
    pub fn decode_packet(&self, src: &[u8]) -> Result<Packet> {
        if src.len() > self.config.max_packet_size {
            return Err(CodecError::PacketTooLarge {
                size: src.len(),
                max: self.config.max_packet_size,
            });
        }

        if src.first() == Some(&BUNDLE_TAG[0]) {
            return Bundle::decode(src, self.registry, self.config.max_nesting_depth)
                .map(Packet::Bundle);
        }

        let (message, rest) = Message::decode(src, self.registry)?;
        if !rest.is_empty() {
            debug!(
                address = %message.address,
                trailing = rest.len(),
                "ignoring trailing bytes after OSC message"
            );
        }
        Ok(Packet::Message(message))
    }

    /// Append the wire form of `packet` to `dst`.
    ///
    /// Nothing is written if the packet is invalid or too large.
    pub fn encode_packet(&self, packet: &Packet, dst: &mut BytesMut) -> Result<()> {
        packet.validate()?;
        let size = packet.encoded_len();
        if size > self.config.max_packet_size {
            return Err(CodecError::PacketTooLarge {
                size,
                max: self.config.max_packet_size,
            });
        }
        packet.write_to(dst);
        Ok(())
    }

    /// Encode `packet` into a fresh buffer.
    pub fn encode_to_bytes(&self, packet: &Packet) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(packet.encoded_len());
        self.encode_packet(packet, &mut buf)?;
        Ok(buf.freeze())
    }
}

/// Decode one datagram with the shared registry and default limits.
pub fn decode_packet(src: &[u8]) -> Result<Packet> {
    OscCodec::new().decode_packet(src)
}

/// Encode a packet with the shared registry and default limits.
pub fn encode_packet(packet: &Packet) -> Result<Bytes> {
    OscCodec::new().encode_to_bytes(packet)
}

#[cfg(feature = "async")]
mod framed {
    use bytes::BytesMut;
    use tokio_util::codec::{Decoder, Encoder};

    use super::{OscCodec, Packet};
    use crate::error::CodecError;

    /// Each call consumes the whole buffer as one datagram, which is how
    /// `tokio_util::udp::UdpFramed` hands them over.
    impl Decoder for OscCodec<'_> {
        type Item = Packet;
        type Error = CodecError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, CodecError> {
            if src.is_empty() {
                return Ok(None);
            }
            let datagram = src.split();
            self.decode_packet(&datagram).map(Some)
        }
    }

    impl Encoder<Packet> for OscCodec<'_> {
        type Error = CodecError;

        fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), CodecError> {
            self.encode_packet(&item, dst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::Argument;
    use crate::timetag::TimeTag;

    #[test]
    fn test_message_packet_roundtrip() {
        let packet = Packet::from(Message::new("/foo").arg(1).arg("bar"));
        let bytes = encode_packet(&packet).unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(decode_packet(&bytes).unwrap(), packet);
    }

    #[test]
    fn test_bundle_packet_roundtrip() {
        let packet = Packet::from(
            Bundle::new(TimeTag::IMMEDIATELY)
                .element(Bundle::new(TimeTag::new(1, 2)).element(Message::new("/deep").arg(true)))
                .element(Message::new("/flat").arg(Argument::Nil)),
        );
        let bytes = encode_packet(&packet).unwrap();
        assert_eq!(bytes.len() % 4, 0);

        let decoded = decode_packet(&bytes).unwrap();
        assert!(decoded.is_bundle());
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_misspelled_bundle_marker_is_not_a_message() {
        assert!(matches!(
            decode_packet(b"#bundlx\0,\0\0\0"),
            Err(CodecError::MalformedBundle(_))
        ));
    }

    #[test]
    fn test_address_without_slash_is_rejected() {
        assert!(matches!(
            decode_packet(b"foo\0,i\0\0\0\0\0\x01"),
            Err(CodecError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_after_message_are_ignored() {
        let mut buf = BytesMut::new();
        Message::new("/a").encode(&mut buf).unwrap();
        buf.extend_from_slice(&[0, 0, 0, 0]);
        let packet = decode_packet(&buf).unwrap();
        assert_eq!(packet, Packet::from(Message::new("/a")));
    }

    #[test]
    fn test_decode_rejects_oversized_input() {
        let codec = OscCodec::new().with_config(CodecConfig {
            max_packet_size: 8,
            ..CodecConfig::default()
        });
        let bytes = encode_packet(&Message::new("/long/address").into()).unwrap();
        assert!(matches!(
            codec.decode_packet(&bytes),
            Err(CodecError::PacketTooLarge { max: 8, .. })
        ));
    }

    #[test]
    fn test_encode_rejects_oversized_output() {
        let codec = OscCodec::new().with_config(CodecConfig {
            max_packet_size: 16,
            ..CodecConfig::default()
        });
        let mut buf = BytesMut::new();
        let packet = Packet::from(Message::new("/x").arg(vec![0u8; 64]));
        assert!(matches!(
            codec.encode_packet(&packet, &mut buf),
            Err(CodecError::PacketTooLarge { max: 16, .. })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_codec_uses_injected_registry() {
        let registry = TypeRegistry::empty();
        let codec = OscCodec::with_registry(&registry);
        let bytes = encode_packet(&Message::new("/x").arg(1).into()).unwrap();
        assert!(matches!(
            codec.decode_packet(&bytes),
            Err(CodecError::UnknownTypeTag('i'))
        ));
    }

    #[test]
    fn test_nesting_depth_from_config() {
        let mut bundle = Bundle::new(TimeTag::IMMEDIATELY);
        for _ in 0..4 {
            bundle = Bundle::new(TimeTag::IMMEDIATELY).element(bundle);
        }
        let bytes = encode_packet(&bundle.into()).unwrap();

        let shallow = OscCodec::new().with_config(CodecConfig {
            max_nesting_depth: 2,
            ..CodecConfig::default()
        });
        assert!(matches!(
            shallow.decode_packet(&bytes),
            Err(CodecError::NestingTooDeep { max: 2 })
        ));
        assert!(decode_packet(&bytes).is_ok());
    }

    #[test]
    fn test_empty_datagram_is_malformed() {
        assert!(matches!(
            decode_packet(&[]),
            Err(CodecError::MalformedString(_))
        ));
    }

    #[test]
    fn test_display() {
        let packet = Packet::from(
            Bundle::new(TimeTag::IMMEDIATELY)
                .element(Message::new("/a").arg(1))
                .element(Message::new("/b")),
        );
        assert_eq!(packet.to_string(), "#bundle immediately [/a ,i i:1; /b ,]");
    }
}
