//! Bootstrap run reports.
//!
//! Records the outcome of a single provisioning run.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of ensuring a single collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionOutcome {
    /// The collection was created by this run.
    Created,
    /// The collection was already present on the server.
    AlreadyExists,
}

/// Per-collection record within a [`BootstrapReport`].
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    /// Database the collection belongs to.
    pub database: String,
    /// Collection name.
    pub collection: String,
    /// What happened to it.
    pub outcome: CollectionOutcome,
}

/// Summary of one bootstrap run.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    /// Unique identifier of the run.
    pub run_id: String,
    /// When the run started.
    pub timestamp: DateTime<Utc>,
    /// Total run duration in milliseconds.
    pub duration_ms: u64,
    /// Per-collection outcomes, in application order.
    pub items: Vec<CollectionReport>,
}

impl BootstrapReport {
    /// Creates an empty report for the given run.
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            timestamp: Utc::now(),
            duration_ms: 0,
            items: Vec::new(),
        }
    }

    /// Appends a per-collection outcome.
    pub fn record(&mut self, database: &str, collection: &str, outcome: CollectionOutcome) {
        self.items.push(CollectionReport {
            database: database.to_string(),
            collection: collection.to_string(),
            outcome,
        });
    }

    /// Number of collections created by this run.
    pub fn created(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.outcome == CollectionOutcome::Created)
            .count()
    }

    /// Number of collections that already existed.
    pub fn already_existed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.outcome == CollectionOutcome::AlreadyExists)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_tallies() {
        let mut report = BootstrapReport::new("run-1");
        report.record("interactives", "metadata", CollectionOutcome::Created);
        report.record("interactives", "visualisations", CollectionOutcome::Created);
        report.record("interactives-api", "interactives", CollectionOutcome::AlreadyExists);

        assert_eq!(report.created(), 2);
        assert_eq!(report.already_existed(), 1);
        assert_eq!(report.items.len(), 3);
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&CollectionOutcome::AlreadyExists).unwrap();
        assert_eq!(json, "\"already_exists\"");
    }
}
