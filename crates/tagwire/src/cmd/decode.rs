use std::fs;
use std::io::{self, Read};

use tagwire_codec::VariantCodec;
use tracing::debug;

use crate::cmd::DecodeArgs;
use crate::exit::{codec_error, io_error, CliResult, SUCCESS};
use crate::output::{print_value, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = match &args.file {
        Some(path) => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .map_err(|err| io_error("failed reading stdin", err))?;
            buf
        }
    };

    let mut codec = VariantCodec::with_config(args.limits.codec_config());
    codec.extend_from_slice(&input);

    let mut decoded = 0usize;
    while codec.available() > 0 {
        // The cursor stays on the failing value, so it reports the offset.
        let value = codec.pop_value().map_err(|err| {
            codec_error(&format!("decode failed at offset {}", codec.position()), err)
        })?;
        print_value(&value, None, format);
        decoded += 1;
    }

    debug!(values = decoded, bytes = input.len(), "decoded input");
    Ok(SUCCESS)
}
