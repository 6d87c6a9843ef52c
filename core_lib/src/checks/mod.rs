pub mod classifier;
pub mod event;
pub mod orchestrator;
pub mod plan;
pub mod report;


pub use event::{Category, Event, Severity};
pub use orchestrator::Orchestrator;
pub use plan::{CheckPlan, CheckPlanEntry, Probe, Role};
pub use report::Report;
