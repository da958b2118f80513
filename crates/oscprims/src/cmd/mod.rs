use clap::{Args, Subcommand};
use oscprims_codec::CodecConfig;
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod envinfo;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a message (optionally wrapped in a bundle) to wire bytes.
    Encode(EncodeArgs),
    /// Decode wire bytes and print the packet.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat, config: CodecConfig) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format, config),
        Command::Decode(args) => decode::run(args, format, config),
        Command::Version(args) => version::run(args),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Address pattern, e.g. /synth/freq.
    pub address: String,
    /// Argument values. Inferred as int, then float, then string unless --types is given.
    #[arg(allow_negative_numbers = true)]
    pub values: Vec<String>,
    /// Type tags, one per argument (e.g. ",ifsT" or "ifsT"). T, F, N and I take no value.
    #[arg(long, short = 't')]
    pub types: Option<String>,
    /// Wrap the message in a bundle with this time tag: immediately, now, or raw 64-bit bits.
    #[arg(long, value_name = "TIME")]
    pub bundle: Option<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Packet bytes as hex (whitespace allowed).
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read raw packet bytes from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}
