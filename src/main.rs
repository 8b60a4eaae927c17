//! cl-logger - write leveled log lines to a rotating latest.log
//!
//! Usage:
//!   cl-logger write [-l LEVEL] MSG...   Log each message
//!   cl-logger rotate                    Archive the current latest.log
//!   cl-logger stream [--every-ms N]     Emit heartbeat lines until Ctrl-C
//!   cl-logger < file                    Log each stdin line at INFO

mod cli;

use anyhow::{Context, Result};
use cl_logger::logging::init_tracing;
use cl_logger::{LogManager, RotateOutcome};
use clap::Parser;
use cli::{Cli, Command};
use std::io::BufRead;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.to_config().context("Failed to load configuration")?;
    let logger = LogManager::new(config).context("Failed to start logger")?;

    if cli.events {
        logger.subscribe(|event| {
            if let Ok(json) = serde_json::to_string(event) {
                eprintln!("{}", json);
            }
        });
    }

    match cli.command {
        Some(Command::Write { level, messages }) => {
            logger.log_all(cli::write_level(&level), messages);
        }
        Some(Command::Rotate) => report_rotation(&logger.rotate()),
        Some(Command::Stream { every_ms, count }) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_stream(&logger, Duration::from_millis(every_ms.max(1)), count));
        }
        None => {
            for line in std::io::stdin().lock().lines() {
                let line = line.context("Failed to read stdin")?;
                logger.info(line);
            }
        }
    }

    // Final dump and rotation happen here, before the process exits
    drop(logger);
    Ok(())
}

fn report_rotation(outcome: &RotateOutcome) {
    match outcome {
        RotateOutcome::Rotated { archive } => eprintln!("Archived to {}", archive.display()),
        RotateOutcome::NothingToRotate => eprintln!("Nothing to rotate"),
        RotateOutcome::Abandoned { attempts } => {
            eprintln!("Rotation abandoned after {} attempts", attempts)
        }
    }
}

async fn run_stream(logger: &LogManager, every: Duration, count: Option<u64>) {
    let mut ticker = tokio::time::interval(every);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut emitted = 0u64;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                logger.info("Stream interrupted");
                break;
            }
            _ = ticker.tick() => {
                emitted += 1;
                logger.info(format!("heartbeat {}", emitted));
                if count.is_some_and(|limit| emitted >= limit) {
                    break;
                }
            }
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        if let (Ok(mut sigterm), Ok(mut sigint)) = (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
            return;
        }
    }

    let _ = tokio::signal::ctrl_c().await;
}
