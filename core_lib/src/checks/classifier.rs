//! Turns probe outcomes into severity-tagged events

use crate::checks::event::Event;
use crate::checks::plan::CheckPlanEntry;
use crate::probes::ProbeSet;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error};

/// Runs `entry`'s probe once. A failure, or a probe that panics, yields an
/// event tagged with the entry's severity; success yields nothing.
pub fn evaluate<P: ProbeSet + ?Sized>(probes: &P, entry: &CheckPlanEntry) -> Option<Event> {
    let name = entry.probe.name();
    let start = Instant::now();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| probes.probe(&entry.probe)));
    let elapsed = start.elapsed();

    let message = match outcome {
        Ok(Ok(())) => {
            debug!("Check '{}' passed in {:?}", name, elapsed);
            return None;
        }
        Ok(Err(failure)) => failure.to_string(),
        Err(payload) => format!("Check '{}' aborted: {}", name, panic_message(payload.as_ref())),
    };

    error!("{}: {}", entry.severity, message);
    debug!("Check '{}' failed in {:?}", name, elapsed);

    Some(Event::from_failure(entry.severity, message))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
