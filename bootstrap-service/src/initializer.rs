//! MongoDB bootstrap initializer.
//!
//! Owns the client for one provisioning run and ensures the databases and
//! collections of a [`ProvisionPlan`] exist on the target server.

use std::time::{Duration, Instant};

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::report::{BootstrapReport, CollectionOutcome};
use common::models::spec::ProvisionPlan;
use mongodb::bson::doc;
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

/// Server error code returned when creating a collection that exists.
const NAMESPACE_EXISTS: i32 = 48;

/// Scoped MongoDB client for a single bootstrap run.
///
/// Acquired with [`Initializer::connect`] before the plan is applied and
/// released with [`Initializer::close`] on every exit path.
pub struct Initializer {
    client: Client,
}

impl Initializer {
    /// Connects to the MongoDB server described by the config.
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.connect_timeout_secs);

        let mut options = ClientOptions::parse(config.connection_uri())
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
        options.app_name = Some(config.service_name.clone());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client = Client::with_options(options)
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        Ok(Self { client })
    }

    /// Pings the server and returns the round-trip latency.
    pub async fn ping(&self) -> AppResult<Duration> {
        let start = Instant::now();
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
        Ok(start.elapsed())
    }

    /// Applies the plan: every collection of every spec ends up existing.
    ///
    /// Databases are created implicitly by the server on first write, so
    /// only collections are acted on. For each database the existing
    /// collection names are listed first and only the missing ones are
    /// created, making re-runs no-ops.
    pub async fn apply(&self, plan: &ProvisionPlan, run_id: &str) -> AppResult<BootstrapReport> {
        let start = Instant::now();
        let mut report = BootstrapReport::new(run_id);

        for spec in &plan.databases {
            let db = self.client.database(&spec.name);
            let existing = db
                .list_collection_names()
                .await
                .map_err(|e| {
                    AppError::DatabaseQuery(format!(
                        "failed to list collections of {}: {}",
                        spec.name, e
                    ))
                })?;
            let missing = missing_collections(&existing, &spec.collections);

            for collection in &spec.collections {
                let outcome = if missing.iter().any(|m| m == collection) {
                    self.create_collection(&db, collection).await?
                } else {
                    CollectionOutcome::AlreadyExists
                };

                match outcome {
                    CollectionOutcome::Created => {
                        tracing::info!(database = %spec.name, collection = %collection, "Collection created");
                    }
                    CollectionOutcome::AlreadyExists => {
                        tracing::info!(database = %spec.name, collection = %collection, "Collection already exists, skipping");
                    }
                }
                report.record(&spec.name, collection, outcome);
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Issues a single create call, tolerating a concurrent creation
    /// between the existence check and this call.
    async fn create_collection(
        &self,
        db: &Database,
        collection: &str,
    ) -> AppResult<CollectionOutcome> {
        match db.create_collection(collection).await {
            Ok(()) => Ok(CollectionOutcome::Created),
            Err(ref e) if is_namespace_exists(e) => Ok(CollectionOutcome::AlreadyExists),
            Err(e) => Err(AppError::DatabaseQuery(format!(
                "failed to create {}.{}: {}",
                db.name(),
                collection,
                e
            ))),
        }
    }

    /// Shuts the client down, draining its connections.
    pub async fn close(self) {
        self.client.shutdown().await;
    }
}

fn is_namespace_exists(err: &MongoError) -> bool {
    matches!(*err.kind, ErrorKind::Command(ref c) if c.code == NAMESPACE_EXISTS)
}

/// Returns the wanted collection names not present in `existing`,
/// preserving declaration order.
fn missing_collections<'a>(existing: &[String], wanted: &'a [String]) -> Vec<&'a str> {
    wanted
        .iter()
        .filter(|w| !existing.iter().any(|e| e == *w))
        .map(|w| w.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_missing_collections_preserves_order() {
        let existing = names(&["metadata"]);
        let wanted = names(&["visualisations", "metadata", "interactives"]);
        assert_eq!(
            missing_collections(&existing, &wanted),
            ["visualisations", "interactives"]
        );
    }

    #[test]
    fn test_missing_collections_empty_when_provisioned() {
        let existing = names(&["metadata", "visualisations"]);
        let wanted = names(&["metadata", "visualisations"]);
        assert!(missing_collections(&existing, &wanted).is_empty());
    }

    #[test]
    fn test_missing_collections_all_on_empty_server() {
        let existing: Vec<String> = Vec::new();
        let wanted = names(&["metadata"]);
        assert_eq!(missing_collections(&existing, &wanted), ["metadata"]);
    }
}
