use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use oscprims_codec::{Argument, Packet, TimeTag};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

// ---------------------------------------------------------------------------
// JSON shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct TimeTagOutput {
    seconds: u32,
    fraction: u32,
    immediately: bool,
}

impl From<TimeTag> for TimeTagOutput {
    fn from(tag: TimeTag) -> Self {
        Self {
            seconds: tag.seconds,
            fraction: tag.fraction,
            immediately: tag.is_immediately(),
        }
    }
}

#[derive(Serialize)]
struct ArgumentOutput {
    tag: char,
    value: Value,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PacketOutput {
    Message {
        address: String,
        type_tags: String,
        args: Vec<ArgumentOutput>,
    },
    Bundle {
        time_tag: TimeTagOutput,
        elements: Vec<PacketOutput>,
    },
}

impl From<&Packet> for PacketOutput {
    fn from(packet: &Packet) -> Self {
        match packet {
            Packet::Message(m) => PacketOutput::Message {
                address: m.address.clone(),
                type_tags: m.type_tags(),
                args: m.args.iter().map(argument_output).collect(),
            },
            Packet::Bundle(b) => PacketOutput::Bundle {
                time_tag: b.time_tag.into(),
                elements: b.content.iter().map(PacketOutput::from).collect(),
            },
        }
    }
}

fn argument_output(arg: &Argument) -> ArgumentOutput {
    let value = match arg {
        Argument::Int(v) => Value::from(*v),
        Argument::Float(v) => Value::from(*v),
        Argument::String(s) => Value::from(s.as_str()),
        Argument::Blob(b) => Value::from(to_hex(b)),
        Argument::Time(t) => Value::from(t.to_bits()),
        Argument::Bool(v) => Value::from(*v),
        Argument::Nil | Argument::Impulse => Value::Null,
    };
    ArgumentOutput {
        tag: arg.type_tag(),
        value,
    }
}

#[derive(Serialize)]
struct DecodedOutput<'a> {
    schema_id: &'a str,
    size: usize,
    packet: PacketOutput,
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    schema_id: &'a str,
    size: usize,
    hex: String,
    packet: PacketOutput,
}

// ---------------------------------------------------------------------------
// Printers
// ---------------------------------------------------------------------------

/// Print a packet decoded from `size` input bytes.
pub fn print_packet(packet: &Packet, size: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = DecodedOutput {
                schema_id: "urn:oscprims:cli:v1:packet-decoded",
                size,
                packet: packet.into(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PATH", "ADDRESS", "TAGS", "ARGS"]);
            for row in packet_rows(packet, "0") {
                table.add_row(row);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => print!("{}", render_tree(packet)),
        OutputFormat::Raw => println!("{packet}"),
    }
}

/// Print the wire bytes produced for `packet`.
pub fn print_encoded(bytes: &[u8], packet: &Packet, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                schema_id: "urn:oscprims:cli:v1:packet-encoded",
                size: bytes.len(),
                hex: to_hex(bytes),
                packet: packet.into(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OFFSET", "HEX", "ASCII"]);
            for (i, word) in bytes.chunks(4).enumerate() {
                table.add_row(vec![
                    format!("{:04}", i * 4),
                    to_hex_spaced(word),
                    ascii_preview(word),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", to_hex(bytes)),
        OutputFormat::Raw => print_raw(bytes),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn packet_rows(packet: &Packet, path: &str) -> Vec<Vec<String>> {
    match packet {
        Packet::Message(m) => vec![vec![
            path.to_string(),
            m.address.clone(),
            m.type_tags(),
            m.args
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" "),
        ]],
        Packet::Bundle(b) => {
            let mut rows = vec![vec![
                path.to_string(),
                "#bundle".to_string(),
                String::new(),
                b.time_tag.to_string(),
            ]];
            for (i, element) in b.content.iter().enumerate() {
                rows.extend(packet_rows(element, &format!("{path}.{i}")));
            }
            rows
        }
    }
}

/// Indented, one element per line.
pub fn render_tree(packet: &Packet) -> String {
    fn walk(packet: &Packet, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match packet {
            Packet::Message(m) => {
                out.push_str(&format!("{indent}{m}\n"));
            }
            Packet::Bundle(b) => {
                out.push_str(&format!(
                    "{indent}#bundle {} ({} elements)\n",
                    b.time_tag,
                    b.content.len()
                ));
                for element in &b.content {
                    walk(element, depth + 1, out);
                }
            }
        }
    }

    let mut out = String::new();
    walk(packet, 0, &mut out);
    out
}

// ---------------------------------------------------------------------------
// Hex
// ---------------------------------------------------------------------------

pub fn to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

fn to_hex_spaced(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn ascii_preview(data: &[u8]) -> String {
    data.iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                char::from(b)
            } else {
                '.'
            }
        })
        .collect()
}

/// Parse hex text, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, String> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = body.bytes().filter(|b| !b.is_ascii_whitespace()).collect();

    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let hi = hex_value(pair[0])?;
            let lo = hex_value(pair[1])?;
            Ok((hi << 4) | lo)
        })
        .collect()
}

fn hex_value(digit: u8) -> Result<u8, String> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        other => Err(format!("invalid hex digit {:?}", char::from(other))),
    }
}
