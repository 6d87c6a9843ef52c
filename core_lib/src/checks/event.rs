//! Events emitted into the monitoring report

use serde::{Deserialize, Serialize};

pub const HEALTHY_SUMMARY: &str = "system healthy";

/// Tier a plan entry is scheduled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Major,
    Minor,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Major => write!(f, "MAJOR"),
            Severity::Minor => write!(f, "MINOR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Major,
    Minor,
    Healthy,
}

impl From<Severity> for Category {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Major => Category::Major,
            Severity::Minor => Category::Minor,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Major => write!(f, "MAJOR"),
            Category::Minor => write!(f, "MINOR"),
            Category::Healthy => write!(f, "HEALTHY"),
        }
    }
}

/// One observed problem, or the single synthetic healthy marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    summary: String,
    category: Category,
}

impl Event {
    pub fn from_failure(severity: Severity, summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            category: severity.into(),
        }
    }

    pub fn healthy() -> Self {
        Self {
            summary: HEALTHY_SUMMARY.to_string(),
            category: Category::Healthy,
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serialization() {
        assert_eq!(serde_json::to_string(&Category::Major).unwrap(), "\"MAJOR\"");
        assert_eq!(serde_json::to_string(&Category::Minor).unwrap(), "\"MINOR\"");
        assert_eq!(serde_json::to_string(&Category::Healthy).unwrap(), "\"HEALTHY\"");
    }

    #[test]
    fn test_event_field_order() {
        let event = Event::from_failure(Severity::Minor, "ntpd is not running");
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"summary":"ntpd is not running","category":"MINOR"}"#
        );
    }

    #[test]
    fn test_healthy_event() {
        let event = Event::healthy();
        assert_eq!(event.category(), Category::Healthy);
        assert_eq!(event.summary(), HEALTHY_SUMMARY);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Major.to_string(), "MAJOR");
        assert_eq!(Severity::Minor.to_string(), "MINOR");
    }
}
