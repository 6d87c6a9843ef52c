//! Runs a role's check plan and collects the report

use crate::checks::classifier;
use crate::checks::event::{Event, Severity};
use crate::checks::plan::CheckPlan;
use crate::checks::report::Report;
use crate::config::AppConfig;
use crate::error::Result;
use crate::probes::ProbeSet;
use tracing::{debug, info};

pub struct Orchestrator<P> {
    probes: P,
}

impl<P: ProbeSet> Orchestrator<P> {
    pub fn new(probes: P) -> Self {
        Self { probes }
    }

    /// Validates the configuration for the configured role, then runs every
    /// planned probe. Configuration errors return before any probe runs.
    pub fn run(&self, config: &AppConfig) -> Result<Report> {
        let plan = CheckPlan::for_config(config)?;
        Ok(self.execute(&plan))
    }

    /// Runs the plan in order. A run without failures reports a single
    /// healthy event.
    pub fn execute(&self, plan: &CheckPlan) -> Report {
        info!("Running {} checks for OpenShift ({} probes)", plan.role(), plan.len());

        let mut events = Vec::new();
        let mut tier = None;

        for entry in plan {
            if tier != Some(entry.severity) {
                tier = Some(entry.severity);
                debug!(
                    "Running {} checks for {}",
                    match entry.severity {
                        Severity::Major => "major",
                        Severity::Minor => "minor",
                    },
                    plan.role()
                );
            }

            if let Some(event) = classifier::evaluate(&self.probes, entry) {
                events.push(event);
            }
        }

        if events.is_empty() {
            events.push(Event::healthy());
        }

        let report = Report::assemble(events);
        info!(
            "Checks completed - {} major, {} minor",
            report.major_count(),
            report.minor_count()
        );

        report
    }

    pub fn probes(&self) -> &P {
        &self.probes
    }
}
