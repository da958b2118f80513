//! Open Sound Control packets without the plumbing.
//!
//! oscprims encodes and decodes OSC 1.1 messages and bundles: 4-byte
//! alignment, type tag dispatch, NTP time tags and recursive bundles.
//! Sockets stay with the caller; hand in one datagram, get one packet.
//!
//! # Crate Structure
//!
//! - [`codec`]: wire-format codec (messages, bundles, arguments, registry)

/// Re-export codec types.
pub mod codec {
    pub use oscprims_codec::*;
}

pub use oscprims_codec::{
    decode_packet, encode_packet, Argument, Bundle, CodecError, Message, Packet, TimeTag,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_roundtrips_a_bundle() {
        let packet = Packet::from(
            Bundle::new(TimeTag::IMMEDIATELY)
                .element(Message::new("/mixer/fader").arg(0.75f32))
                .element(Bundle::new(TimeTag::new(1, 0)).element(Message::new("/go"))),
        );

        let bytes = encode_packet(&packet).unwrap();
        assert_eq!(bytes.len() % 4, 0);
        assert_eq!(decode_packet(&bytes).unwrap(), packet);
    }

    #[test]
    fn codec_module_exposes_registry() {
        assert!(codec::TypeRegistry::shared().knows('t'));
        assert!(matches!(
            decode_packet(b"nope"),
            Err(CodecError::MalformedString(_))
        ));
    }
}
