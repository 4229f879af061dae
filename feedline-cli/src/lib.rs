//! Process entry for feedline.
//!
//! Wires the engine to a TCP gateway connection, a JSON-file record store
//! and a `tracing` backed log sink, then runs one session until it ends.

pub mod args;
pub mod logging;
pub mod store;
pub mod tcp;

use std::sync::Arc;

use feedline::{Client, FeedlineError, LoopExit};

pub use args::Args;
pub use logging::TracingLog;
pub use store::JsonFileStore;
pub use tcp::TcpTransport;

/// Build a client from `args`.
///
/// # Errors
/// `InvalidArg` if the resulting configuration is unusable.
pub fn client(args: &Args) -> Result<Client, FeedlineError> {
    wire(args).map(|(client, _)| client)
}

fn wire(args: &Args) -> Result<(Client, Arc<TcpTransport>), FeedlineError> {
    let cfg = args.session_config();
    let transport = Arc::new(TcpTransport::new(cfg.inbound_capacity, cfg.max_frame_len));
    let client = Client::builder()
        .transport(transport.clone())
        .store(Arc::new(JsonFileStore::new(&args.securities, &args.quotes)))
        .log(Arc::new(TracingLog::new()))
        .connection(args.connection())
        .config(cfg)
        .build()?;
    Ok((client, transport))
}

/// A lost connection whose reader stopped on a bad frame is a protocol
/// violation.
#[must_use]
pub fn classify(exit: LoopExit, reader_error: Option<FeedlineError>) -> LoopExit {
    match (exit, reader_error) {
        (LoopExit::ConnectionLost, Some(e)) if e.is_protocol_violation() => {
            LoopExit::ProtocolViolation(e)
        }
        (exit, _) => exit,
    }
}

/// Run one session; Ctrl-C requests an orderly shutdown.
///
/// # Errors
/// Configuration errors and a failed connect.
pub async fn run(args: &Args) -> Result<LoopExit, FeedlineError> {
    let (mut client, transport) = wire(args)?;
    let stop = client.shutdown_trigger();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; shutting down");
            stop.trigger();
        }
    });

    let outcome = client
        .run()
        .await
        .map(|exit| classify(exit, transport.reader_error()));
    interrupt.abort();
    client.disconnect().await;
    outcome
}

/// Process exit status for a session outcome: success only on interrupt.
#[must_use]
pub fn exit_code(outcome: &Result<LoopExit, FeedlineError>) -> u8 {
    match outcome {
        Ok(exit) if exit.is_interrupted() => 0,
        _ => 1,
    }
}
