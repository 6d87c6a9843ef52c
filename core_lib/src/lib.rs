//! Core library for the OpenShift monitoring checks: role based check plans,
//! severity classification, orchestration and the JSON report.

pub mod checks;
pub mod config;
pub mod error;
pub mod probes;

pub use checks::{Category, CheckPlan, CheckPlanEntry, Event, Orchestrator, Probe, Report, Role, Severity};
pub use config::AppConfig;
pub use error::{AppError, Result};
pub use probes::{ProbeFailure, ProbeResult, ProbeSet, ProbeSettings, SystemProbes};

/// Runs the checks for the configured node against the local system.
///
/// The plan is built, and the configuration thereby validated, before the
/// probe set is set up.
pub fn run_system_checks(config: &AppConfig) -> Result<Report> {
    let plan = CheckPlan::for_config(config)?;

    let probes = SystemProbes::new(ProbeSettings::from(&config.probes))?;
    Ok(Orchestrator::new(probes).execute(&plan))
}
