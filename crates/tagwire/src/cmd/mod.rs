use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use tagwire_codec::{CodecConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAYLOAD};
use tagwire_value::Variant;

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a JSON document into wire bytes.
    Encode(EncodeArgs),
    /// Decode every value in a wire-format byte stream.
    Decode(DecodeArgs),
    /// Connect to a listener and send a single value.
    Send(SendArgs),
    /// Accept connections and print received values.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the value to encode or send comes from.
#[derive(Args, Debug)]
pub struct ValueArgs {
    /// JSON document to convert.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub json: Option<String>,
    /// Plain string value.
    #[arg(long, conflicts_with_all = ["json", "file"])]
    pub data: Option<String>,
    /// Read a JSON document from file.
    #[arg(long, conflicts_with_all = ["json", "data"])]
    pub file: Option<PathBuf>,
}

/// Decoder limits.
#[derive(Args, Debug)]
pub struct LimitArgs {
    /// Maximum container nesting depth.
    #[arg(long, env = "TAGWIRE_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
    /// Maximum string length or container count.
    #[arg(long, env = "TAGWIRE_MAX_PAYLOAD", default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_payload: usize,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub value: ValueArgs,
    /// Write wire bytes to this file instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Read wire bytes from file (stdin otherwise).
    #[arg(long)]
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Address to connect to (host:port).
    pub addr: String,
    #[command(flatten)]
    pub value: ValueArgs,
    /// Connect and write timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind (host:port).
    pub addr: String,
    /// Exit after receiving N values.
    #[arg(long)]
    pub count: Option<usize>,
    /// Give up if no value arrives within this long (e.g. 10s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

impl ValueArgs {
    /// Resolve the flags into a value. No flags yields Null.
    pub fn resolve(&self) -> CliResult<Variant> {
        if let Some(json) = &self.json {
            return parse_json(json, "--json");
        }
        if let Some(data) = &self.data {
            return Ok(Variant::from(data.as_str()));
        }
        if let Some(path) = &self.file {
            let text = fs::read_to_string(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
            return parse_json(&text, &path.display().to_string());
        }
        Ok(Variant::Null)
    }
}

fn parse_json(text: &str, source: &str) -> CliResult<Variant> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|err| CliError::new(USAGE, format!("{source} is not valid JSON: {err}")))?;
    Ok(Variant::from_json(&json))
}

impl LimitArgs {
    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig {
            max_depth: self.max_depth,
            max_payload_size: self.max_payload,
            ..CodecConfig::default()
        }
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn resolve_prefers_given_source() {
        let args = ValueArgs {
            json: Some(r#"{"b":1,"a":[true,null]}"#.into()),
            data: None,
            file: None,
        };
        let value = args.resolve().unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map[&b"b"[..]], Variant::Integer(1));
        assert_eq!(
            map[&b"a"[..]],
            Variant::list([Variant::Boolean(true), Variant::Null])
        );

        let args = ValueArgs {
            json: None,
            data: Some("plain".into()),
            file: None,
        };
        assert_eq!(args.resolve().unwrap(), Variant::from("plain"));
    }

    #[test]
    fn resolve_without_source_is_null() {
        let args = ValueArgs {
            json: None,
            data: None,
            file: None,
        };
        assert_eq!(args.resolve().unwrap(), Variant::Null);
    }

    #[test]
    fn resolve_rejects_bad_json() {
        let args = ValueArgs {
            json: Some("{nope".into()),
            data: None,
            file: None,
        };
        assert_eq!(args.resolve().unwrap_err().code, USAGE);
    }

    #[test]
    fn limits_build_config() {
        let limits = LimitArgs {
            max_depth: 3,
            max_payload: 10,
        };
        let config = limits.codec_config();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.max_payload_size, 10);
    }
}
