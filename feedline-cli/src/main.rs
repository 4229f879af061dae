use std::process::ExitCode;

use clap::Parser;
use feedline_cli::{Args, exit_code, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _guard = match logging::init(args.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("feedline: logging setup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        host = %args.host,
        port = args.port,
        client_id = args.client_id,
        realtime = args.real,
        historical = args.hist,
        "starting"
    );
    let outcome = run(&args).await;
    match &outcome {
        Ok(exit) if exit.is_interrupted() => tracing::info!("stopped"),
        Ok(exit) => tracing::error!("session ended: {exit}"),
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("feedline: {e}");
        }
    }
    ExitCode::from(exit_code(&outcome))
}
