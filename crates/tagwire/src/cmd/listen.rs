use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tagwire_codec::{CodecConfig, CodecError, VariantReader};
use tagwire_queue::{BlockingQueue, QueueError};
use tagwire_transport::{Connection, TcpTransport, TransportError, TransportRuntime};
use tagwire_value::Variant;
use tracing::{debug, warn};

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{queue_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_value, OutputFormat};

/// How often the acceptor checks whether listening has stopped.
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// What the network threads hand to the printing thread.
#[derive(Debug)]
enum Event {
    Value { peer: String, value: Variant },
    AcceptFailed(TransportError),
}

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    // Zero means wait indefinitely.
    let timeout = match &args.timeout {
        Some(input) => parse_duration(input)?,
        None => Duration::ZERO,
    };
    let config = args.limits.codec_config();

    let runtime = TransportRuntime::initialize()
        .map_err(|err| transport_error("socket runtime startup failed", err))?;
    let listener = runtime
        .bind(args.addr.as_str())
        .map_err(|err| transport_error("bind failed", err))?;

    let queue = Arc::new(BlockingQueue::new());
    install_ctrlc_handler(Arc::clone(&queue))?;
    let acceptor = spawn_acceptor(listener, config, Arc::clone(&queue));

    let result = print_events(&queue, timeout, args.count, format);
    queue.close();
    if acceptor.join().is_err() {
        warn!("acceptor thread panicked");
    }
    result
}

fn print_events(
    queue: &BlockingQueue<Event>,
    timeout: Duration,
    count: Option<usize>,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut printed = 0usize;
    loop {
        match queue.dequeue_timeout(timeout) {
            Ok(Event::Value { peer, value }) => {
                print_value(&value, Some(&peer), format);
                printed = printed.saturating_add(1);

                if let Some(count) = count {
                    if printed >= count {
                        return Ok(SUCCESS);
                    }
                }
            }
            Ok(Event::AcceptFailed(err)) => return Err(transport_error("accept failed", err)),
            Err(QueueError::Closed) => {
                debug!(printed, "listen interrupted");
                return Ok(SUCCESS);
            }
            Err(err) => return Err(queue_error("no value received", err)),
        }
    }
}

/// Accept connections until the queue is closed.
fn spawn_acceptor(
    listener: TcpTransport,
    config: CodecConfig,
    queue: Arc<BlockingQueue<Event>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while !queue.is_closed() {
            match listener.accept_timeout(ACCEPT_POLL) {
                Ok(Some(conn)) => spawn_reader(conn, config.clone(), Arc::clone(&queue)),
                Ok(None) => {}
                Err(err) => {
                    let _ = queue.enqueue(Event::AcceptFailed(err));
                    return;
                }
            }
        }
        debug!(addr = %listener.local_addr(), "acceptor stopped");
    })
}

fn spawn_reader(conn: Connection, config: CodecConfig, queue: Arc<BlockingQueue<Event>>) {
    let peer = conn
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    thread::spawn(move || {
        let mut reader = VariantReader::with_config(conn, config);
        loop {
            match reader.read_value() {
                Ok(value) => {
                    let event = Event::Value {
                        peer: peer.clone(),
                        value,
                    };
                    if queue.enqueue(event).is_err() {
                        return;
                    }
                }
                Err(CodecError::ConnectionClosed) => {
                    debug!(%peer, "peer disconnected");
                    return;
                }
                Err(err) => {
                    warn!(%peer, error = %err, "dropping connection");
                    return;
                }
            }
        }
    });
}

fn install_ctrlc_handler(queue: Arc<BlockingQueue<Event>>) -> CliResult<()> {
    ctrlc::set_handler(move || queue.close())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn acceptor_stops_once_queue_closes() {
        let runtime = TransportRuntime::initialize().unwrap();
        let listener = runtime.bind("127.0.0.1:0").unwrap();
        let queue = Arc::new(BlockingQueue::new());
        let acceptor = spawn_acceptor(listener, CodecConfig::default(), Arc::clone(&queue));

        queue.close();
        let started = Instant::now();
        while !acceptor.is_finished() {
            assert!(
                started.elapsed() < ACCEPT_POLL * 10,
                "acceptor still running after close"
            );
            thread::sleep(Duration::from_millis(10));
        }
        acceptor.join().unwrap();
    }

    #[test]
    fn acceptor_forwards_values_from_peers() {
        let runtime = TransportRuntime::initialize().unwrap();
        let listener = runtime.bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr();
        let queue = Arc::new(BlockingQueue::new());
        let acceptor = spawn_acceptor(listener, CodecConfig::default(), Arc::clone(&queue));

        let conn = runtime.connect(addr).unwrap();
        let mut writer = tagwire_codec::VariantWriter::new(conn);
        writer.send(&Variant::Integer(5)).unwrap();

        match queue.dequeue_timeout(Duration::from_secs(5)).unwrap() {
            Event::Value { value, .. } => assert_eq!(value, Variant::Integer(5)),
            other => panic!("unexpected event: {other:?}"),
        }

        queue.close();
        acceptor.join().unwrap();
    }
}
