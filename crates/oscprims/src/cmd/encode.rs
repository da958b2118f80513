use oscprims_codec::{
    tags, Bundle, CodecConfig, Message, NativeValue, OscCodec, Packet, TimeTag, TypeRegistry,
};
use tracing::debug;

use crate::cmd::EncodeArgs;
use crate::exit::{encode_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{parse_hex, print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat, config: CodecConfig) -> CliResult<i32> {
    let registry = TypeRegistry::shared();
    let values = native_values(&args)?;

    let mut message = Message::new(args.address.as_str());
    for (value, tag) in values {
        let arg = registry
            .create_argument(value, tag)
            .map_err(|err| encode_error("invalid argument", err))?;
        message = message.arg(arg);
    }

    let packet = match &args.bundle {
        Some(time) => Packet::from(Bundle::new(parse_time_tag(time)?).element(message)),
        None => Packet::from(message),
    };

    let codec = OscCodec::with_registry(registry).with_config(config);
    let bytes = codec
        .encode_to_bytes(&packet)
        .map_err(|err| encode_error("encode failed", err))?;

    debug!(
        address = %args.address,
        size = bytes.len(),
        bundle = packet.is_bundle(),
        "encoded OSC packet"
    );
    print_encoded(&bytes, &packet, format);
    Ok(SUCCESS)
}

/// Pair each command-line value with its explicit tag, if `--types` was given.
fn native_values(args: &EncodeArgs) -> CliResult<Vec<(NativeValue, Option<char>)>> {
    let Some(types) = &args.types else {
        return Ok(args.values.iter().map(|v| (infer_value(v), None)).collect());
    };

    let type_tags = types.strip_prefix(tags::TYPE_TAG_PREFIX).unwrap_or(types);
    let mut values = args.values.iter();
    let mut out = Vec::with_capacity(type_tags.len());

    for tag in type_tags.chars() {
        let native = match tag {
            tags::TRUE => NativeValue::Bool(true),
            tags::FALSE => NativeValue::Bool(false),
            _ if tags::is_payloadless(tag) => NativeValue::Nil,
            _ => {
                let raw = values.next().ok_or_else(|| {
                    CliError::new(USAGE, format!("type '{tag}' has no matching value"))
                })?;
                typed_value(tag, raw)?
            }
        };
        out.push((native, Some(tag)));
    }

    let extra = values.count();
    if extra > 0 {
        return Err(CliError::new(
            USAGE,
            format!("{extra} value(s) have no type tag in {types:?}"),
        ));
    }
    Ok(out)
}

fn typed_value(tag: char, raw: &str) -> CliResult<NativeValue> {
    match tag {
        tags::BLOB => parse_hex(raw)
            .map(NativeValue::Bytes)
            .map_err(|err| CliError::new(USAGE, format!("blob value {raw:?}: {err}"))),
        tags::TIME_TAG => parse_time_tag(raw).map(NativeValue::Time),
        _ => Ok(NativeValue::Str(raw.to_string())),
    }
}

/// Untagged values: integer, then float, then string.
fn infer_value(raw: &str) -> NativeValue {
    if let Ok(v) = raw.parse::<i64>() {
        return NativeValue::Int(v);
    }
    // "inf" and "nan" parse as floats but are far more likely meant as text.
    if raw.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(v) = raw.parse::<f64>() {
            return NativeValue::Float(v);
        }
    }
    NativeValue::Str(raw.to_string())
}

fn parse_time_tag(input: &str) -> CliResult<TimeTag> {
    let input = input.trim();
    match input {
        "immediately" => return Ok(TimeTag::IMMEDIATELY),
        "now" => return Ok(TimeTag::now()),
        _ => {}
    }

    let bits = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => input.parse::<u64>(),
    };

    bits.map(TimeTag::from_bits).map_err(|_| {
        CliError::new(
            USAGE,
            format!("invalid time tag {input:?} (expected immediately, now, or 64-bit bits)"),
        )
    })
}
