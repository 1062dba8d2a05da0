use std::fs;

use tagwire_codec::VariantCodec;
use tracing::debug;

use crate::cmd::EncodeArgs;
use crate::exit::{codec_error, io_error, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let value = args.value.resolve()?;

    let mut codec = VariantCodec::new();
    codec
        .push_value(&value)
        .map_err(|err| codec_error("encode failed", err))?;
    let wire = codec.byte_buffer().as_slice();

    match &args.output {
        Some(path) => {
            fs::write(path, wire).map_err(|err| {
                io_error(&format!("failed writing {}", path.display()), err)
            })?;
            debug!(path = %path.display(), size = wire.len(), "wrote encoded value");

            // Raw bytes already went to the file.
            if !matches!(format, OutputFormat::Raw) {
                let output = path.display().to_string();
                print_encoded(&value, wire, Some(&output), format);
            }
        }
        None => print_encoded(&value, wire, None, format),
    }

    Ok(SUCCESS)
}
