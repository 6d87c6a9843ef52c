//! Main entry point for the monitoring checks binary

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use core_lib::{AppConfig, AppError};
#[cfg(unix)]
use std::ffi::CStr;
use std::io::Write;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Layer, Layered};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).map_err(AppError::from);
    let debug = cli.debug || config.as_ref().map(AppConfig::debug_logging).unwrap_or(false);
    init_tracing(debug);

    match run(&cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: core_lib::Result<AppConfig>) -> Result<()> {
    let config = config.map_err(|e| anyhow::anyhow!("Not able to read configuration: {}", e))?;
    info!("Configuration loaded successfully");

    let report = core_lib::run_system_checks(&config)?;
    let output = report.to_json(cli.pretty)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;

    Ok(())
}

/// Logs go to syslog, and to stderr as well on debug runs. When syslog
/// can't be opened everything goes to stderr. stdout is reserved for the
/// report.
fn init_tracing(debug: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if debug { "debug" } else { "info" };

        format!(
            "{}={},core_lib={}",
            env!("CARGO_CRATE_NAME").replace('-', "_"),
            level,
            level
        )
        .into()
    });

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut layers = Vec::new();
    let syslog = syslog_layer(is_json, debug);
    let syslog_ready = syslog.is_some();
    layers.extend(syslog);

    if log_to_stderr(debug, syslog_ready) {
        layers.push(format_layer(std::io::stderr, true, is_json, debug));
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .init();

    if !syslog_ready {
        warn!("Wasn't able to initialize syslog, logging to stderr");
    }
}

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

fn log_to_stderr(debug: bool, syslog_ready: bool) -> bool {
    debug || !syslog_ready
}

fn format_layer<W>(writer: W, ansi: bool, json: bool, debug: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_file(debug)
        .with_line_number(debug);

    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

#[cfg(unix)]
fn syslog_layer(json: bool, debug: bool) -> Option<BoxedLayer> {
    let identity = CStr::from_bytes_with_nul(b"openshift-monitoring-cli\0").ok()?;
    let (options, facility) = Default::default();
    let syslog = syslog_tracing::Syslog::new(identity, options, facility)?;

    Some(format_layer(syslog, false, json, debug))
}

#[cfg(not(unix))]
fn syslog_layer(_json: bool, _debug: bool) -> Option<BoxedLayer> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_only_for_debug_or_without_syslog() {
        assert!(!log_to_stderr(false, true));
        assert!(log_to_stderr(true, true));
        assert!(log_to_stderr(false, false));
        assert!(log_to_stderr(true, false));
    }
}
