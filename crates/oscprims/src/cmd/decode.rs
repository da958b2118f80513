use std::fs;

use oscprims_codec::{CodecConfig, OscCodec};
use tracing::{debug, warn};

use crate::cmd::DecodeArgs;
use crate::exit::{decode_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{parse_hex, print_packet, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat, config: CodecConfig) -> CliResult<i32> {
    let bytes = read_input(&args)?;
    if bytes.len() % 4 != 0 {
        warn!(size = bytes.len(), "packet size is not a multiple of 4");
    }

    let packet = OscCodec::new()
        .with_config(config)
        .decode_packet(&bytes)
        .map_err(|err| decode_error("decode failed", err))?;

    debug!(
        size = bytes.len(),
        bundle = packet.is_bundle(),
        "decoded OSC packet"
    );
    print_packet(&packet, bytes.len(), format);
    Ok(SUCCESS)
}

fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    if let Some(hex) = &args.hex {
        return parse_hex(hex).map_err(|err| CliError::new(USAGE, format!("invalid hex: {err}")));
    }
    Err(CliError::new(USAGE, "provide packet HEX or --file"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_input_is_parsed() {
        let args = DecodeArgs {
            hex: Some("2f 78 00 00 2c 00 00 00".to_string()),
            file: None,
        };
        assert_eq!(read_input(&args).unwrap(), b"/x\0\0,\0\0\0");
    }

    #[test]
    fn missing_input_is_usage_error() {
        let args = DecodeArgs {
            hex: None,
            file: None,
        };
        assert_eq!(read_input(&args).unwrap_err().code, USAGE);
    }
}
