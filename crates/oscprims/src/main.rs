mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use oscprims_codec::{CodecConfig, DEFAULT_MAX_NESTING_DEPTH, DEFAULT_MAX_PACKET_SIZE};

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "oscprims",
    version,
    about = "Open Sound Control packet codec CLI"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). RUST_LOG overrides this when set.
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Largest packet accepted or produced, in bytes.
    #[arg(
        long,
        value_name = "BYTES",
        env = "OSCPRIMS_MAX_PACKET_SIZE",
        default_value_t = DEFAULT_MAX_PACKET_SIZE,
        global = true
    )]
    max_packet_size: usize,

    /// Deepest bundle nesting accepted when decoding.
    #[arg(
        long,
        value_name = "DEPTH",
        env = "OSCPRIMS_MAX_DEPTH",
        default_value_t = DEFAULT_MAX_NESTING_DEPTH,
        global = true
    )]
    max_depth: usize,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn codec_config(&self) -> CodecConfig {
        CodecConfig {
            max_packet_size: self.max_packet_size,
            max_nesting_depth: self.max_depth,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let config = cli.codec_config();
    let result = cmd::run(cli.command, format, config);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "oscprims",
            "encode",
            "--types",
            ",if",
            "/synth/freq",
            "-3",
            "440.0",
        ])
        .expect("encode args should parse");

        match cli.command {
            Command::Encode(args) => {
                assert_eq!(args.address, "/synth/freq");
                assert_eq!(args.values, ["-3", "440.0"]);
                assert_eq!(args.types.as_deref(), Some(",if"));
            }
            other => panic!("expected encode, got {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_decode_inputs() {
        let err = Cli::try_parse_from([
            "oscprims",
            "decode",
            "2f780000",
            "--file",
            "/tmp/packet.bin",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn decode_requires_some_input() {
        let err = Cli::try_parse_from(["oscprims", "decode"]).expect_err("missing input");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_limits_feed_codec_config() {
        let cli = Cli::try_parse_from([
            "oscprims",
            "--max-depth",
            "4",
            "--max-packet-size",
            "1024",
            "decode",
            "2f780000",
        ])
        .expect("limits should parse");

        assert_eq!(
            cli.codec_config(),
            CodecConfig {
                max_packet_size: 1024,
                max_nesting_depth: 4,
            }
        );
    }
}
