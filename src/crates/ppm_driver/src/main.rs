//! `ppm-driver`: plugin process spawned by the object server.
//!
//! Protocol traffic uses stdin/stdout, so all logging goes to stderr.

use std::io;
use std::process::ExitCode;
use std::thread;

use ppm_driver::{Driver, DriverConfig, StopSignal};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let stop = StopSignal::new();
    watch_for_interrupt(stop.clone());

    let config = DriverConfig::from_env();
    info!(?config, "starting driver");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let driver = match Driver::new(stdin.lock(), stdout.lock(), config) {
        Ok(driver) => driver,
        Err(err) => {
            error!(%err, "failed to start driver");
            return ExitCode::from(err.exit_code());
        }
    };

    match driver.with_stop_signal(stop).run() {
        Ok(reason) => {
            info!(?reason, "exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "driver failed");
            ExitCode::from(err.exit_code())
        }
    }
}

/// Trigger `stop` on the first Ctrl+C; exit outright on the second.
fn watch_for_interrupt(stop: StopSignal) {
    let spawned = thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    warn!(%err, "interrupt handling unavailable");
                    return;
                }
            };

            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                warn!("interrupt received; stopping at the next request boundary");
                stop.trigger();

                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("second interrupt received; exiting");
                    std::process::exit(0);
                }
            });
        });

    if let Err(err) = spawned {
        warn!(%err, "failed to spawn interrupt watcher");
    }
}
