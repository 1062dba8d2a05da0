use std::fmt::Write as _;
use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tagwire_codec::{encoded_len, VariantCodec};
use tagwire_value::Variant;

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

#[derive(Serialize)]
struct ValueOutput<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    wire_size: usize,
    value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    peer: Option<&'a str>,
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    wire_size: usize,
    hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a str>,
}

/// Print one decoded value. Raw re-emits its wire encoding.
pub fn print_value(value: &Variant, peer: Option<&str>, format: OutputFormat) {
    let kind = value.variant_type().name();
    let wire_size = encoded_len(value);

    match format {
        OutputFormat::Json => {
            let out = ValueOutput {
                kind,
                wire_size,
                value: value.to_json(),
                peer,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut header = vec!["TYPE", "SIZE"];
            let mut row = vec![kind.to_string(), wire_size.to_string()];
            if let Some(peer) = peer {
                header.push("PEER");
                row.push(peer.to_string());
            }
            header.push("VALUE");
            row.push(value.to_string());

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header)
                .add_row(row);
            println!("{table}");
        }
        OutputFormat::Pretty => match peer {
            Some(peer) => println!("type={kind} size={wire_size} peer={peer} value={value}"),
            None => println!("type={kind} size={wire_size} value={value}"),
        },
        OutputFormat::Raw => {
            let mut codec = VariantCodec::new();
            if codec.push_value(value).is_ok() {
                print_raw(codec.byte_buffer().as_slice());
            }
        }
    }
}

/// Print the result of encoding `value` to `wire`.
pub fn print_encoded(value: &Variant, wire: &[u8], output: Option<&str>, format: OutputFormat) {
    let kind = value.variant_type().name();

    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                kind,
                wire_size: wire.len(),
                hex: hex(wire),
                output,
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
                .set_header(vec!["TYPE", "SIZE", "HEX"])
                .add_row(vec![kind.to_string(), wire.len().to_string(), hex(wire)]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("type={kind} size={} hex={}", wire.len(), hex(wire));
        }
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Space-separated uppercase hex, e.g. `49 2A 00 00 00`.
pub fn hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02X}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_formats_bytes() {
        assert_eq!(hex(&[0x49, 0x2A, 0x00, 0x00, 0x00]), "49 2A 00 00 00");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn value_output_omits_missing_peer() {
        let out = ValueOutput {
            kind: "Integer",
            wire_size: 5,
            value: serde_json::json!(42),
            peer: None,
        };
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(json, r#"{"type":"Integer","wire_size":5,"value":42}"#);
    }
}
