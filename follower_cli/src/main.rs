//! Line follower CLI: config loading, logging setup, and subcommand
//! dispatch. All decision logic lives in `follower_core`.

mod cli;
mod error_fmt;
mod follow;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, exit_code_for_stop, format_error_json, humanize};
use follower_core::command::Command;

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
            }
            exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn run() -> eyre::Result<i32> {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    color_eyre::install()?;

    let raw = std::fs::read_to_string(&cli.config)
        .wrap_err_with(|| format!("read config {:?}", cli.config))?;
    let cfg = follower_config::load_toml(&raw)
        .wrap_err_with(|| format!("parse config {:?}", cli.config))?;

    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;
    cfg.validate().wrap_err("invalid configuration")?;

    match cli.cmd {
        Commands::Follow {
            scenario,
            tick_rate_hz,
            max_ticks,
            direct,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || {
                flag.store(true, Ordering::SeqCst);
            })
            .wrap_err("install Ctrl-C handler")?;

            let summary = match scenario {
                Some(path) => {
                    let rows = follower_config::load_scenario_csv(&path)?;
                    follow::run_scenario(&cfg, rows, tick_rate_hz, max_ticks, &shutdown)?
                }
                None => follow::run_live(&cfg, tick_rate_hz, max_ticks, direct, &shutdown)?,
            };

            let stop_reason = summary.last.as_ref().and_then(|d| {
                if !d.is_terminal() {
                    return None;
                }
                match d.command {
                    Command::Stop { reason } => Some(reason),
                    _ => None,
                }
            });

            if cli.json {
                let obj = json!({
                    "ticks": summary.ticks,
                    "last_rule": summary.last.as_ref().map(|d| d.rule.name()),
                    "stop_reason": stop_reason.map(|r| format!("{r:?}")),
                });
                println!("{obj}");
            } else {
                match stop_reason {
                    Some(reason) => {
                        println!(
                            "Follow stopped after {} ticks: {reason:?}",
                            summary.ticks
                        );
                    }
                    None => println!("Follow complete after {} ticks.", summary.ticks),
                }
            }
            Ok(stop_reason.map_or(0, exit_code_for_stop))
        }
        Commands::CheckConfig => {
            tracing::debug!(?cfg, "effective config");
            if cli.json {
                println!("{}", json!({ "status": "ok" }));
            } else {
                println!("Config OK");
            }
            Ok(0)
        }
        Commands::SelfCheck => {
            follow::self_check(&cfg)?;
            if cli.json {
                println!("{}", json!({ "status": "ok" }));
            } else {
                println!("Self-check passed");
            }
            Ok(0)
        }
    }
}

/// Console logging per CLI flags, plus an optional JSON file sink from
/// the config's [logging] table.
fn init_tracing(
    json: bool,
    level: &str,
    logging: &follower_config::Logging,
) -> eyre::Result<()> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_deref().unwrap_or(level)));

    let console_pretty = (!json).then(|| fmt::layer().with_target(false));
    let console_json = json.then(|| fmt::layer().json().with_writer(std::io::stderr));

    let file_layer = match &logging.file {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {path:?}"))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                None | Some("never") => tracing_appender::rolling::never(dir, name),
                Some(other) => {
                    eyre::bail!("logging.rotation must be never|daily|hourly, got {other:?}")
                }
            };
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_writer(non_blocking))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_pretty)
        .with(console_json)
        .with(file_layer)
        .init();
    Ok(())
}
