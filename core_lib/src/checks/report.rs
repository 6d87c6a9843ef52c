//! Final report handed to the monitoring pipeline

use crate::checks::event::{Category, Event};
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const INTEGRATION_NAME: &str = "ch.sbb.openshift-integration";
pub const PROTOCOL_VERSION: &str = "1";
pub const INTEGRATION_VERSION: &str = "1.0.0";

/// Field order here is the wire order expected downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub name: String,
    pub protocol_version: String,
    pub integration_version: String,
    pub events: Vec<Event>,
}

impl Report {
    pub fn assemble(events: Vec<Event>) -> Self {
        Self {
            name: INTEGRATION_NAME.to_string(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            integration_version: INTEGRATION_VERSION.to_string(),
            events,
        }
    }

    /// Compact JSON, or tab indented when `pretty` is set.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        if !pretty {
            return Ok(serde_json::to_string(self)?);
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;

        String::from_utf8(buf).map_err(|e| anyhow::anyhow!("report is not valid UTF-8: {}", e).into())
    }

    pub fn major_count(&self) -> usize {
        self.count(Category::Major)
    }

    pub fn minor_count(&self) -> usize {
        self.count(Category::Minor)
    }

    /// True for a report holding only the healthy marker. An event list
    /// with nothing in it is not healthy; it was never finalized.
    pub fn is_healthy(&self) -> bool {
        !self.events.is_empty() && self.events.iter().all(|e| e.category() == Category::Healthy)
    }

    fn count(&self, category: Category) -> usize {
        self.events.iter().filter(|e| e.category() == category).count()
    }
}
