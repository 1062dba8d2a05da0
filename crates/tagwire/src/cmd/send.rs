use tagwire_codec::{CodecConfig, VariantWriter};
use tagwire_transport::{Direction, TransportRuntime};
use tracing::{debug, info};

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{codec_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_value, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let value = args.value.resolve()?;

    let runtime = TransportRuntime::initialize()
        .map_err(|err| transport_error("socket runtime startup failed", err))?;
    let conn = runtime
        .connect_timeout(args.addr.as_str(), timeout)
        .map_err(|err| transport_error("connect failed", err))?;
    let peer = conn.peer_addr().map(|addr| addr.to_string());

    let config = CodecConfig {
        write_timeout: Some(timeout),
        ..CodecConfig::default()
    };
    let mut writer = VariantWriter::with_config_tcp(conn, config)
        .map_err(|err| codec_error("connect failed", err))?;
    writer
        .send(&value)
        .map_err(|err| codec_error("send failed", err))?;

    if let Err(err) = writer.get_ref().shutdown(Direction::Write) {
        debug!(error = %err, "shutdown after send failed");
    }
    info!(addr = %args.addr, kind = %value.variant_type(), "value sent");

    if !matches!(format, OutputFormat::Raw) {
        print_value(&value, peer.as_deref(), format);
    }

    Ok(SUCCESS)
}
