//! Provision plan models.
//!
//! Contains the target state applied by the bootstrap initializer.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{AppError, AppResult};

/// A database and the collections it must contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DatabaseSpec {
    /// Target database name.
    #[validate(length(min = 1, message = "Database name must not be empty"))]
    pub name: String,
    /// Collections to ensure, in declaration order.
    #[serde(default)]
    pub collections: Vec<String>,
}

impl DatabaseSpec {
    /// Creates a new database spec.
    pub fn new(name: &str, collections: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            collections: collections.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Ordered list of database specs applied in a single bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvisionPlan {
    /// Database specs in application order.
    pub databases: Vec<DatabaseSpec>,
}

impl Default for ProvisionPlan {
    /// The compiled-in target state provisioned when no external plan is
    /// configured.
    fn default() -> Self {
        Self {
            databases: vec![
                DatabaseSpec::new("interactives", &["metadata", "visualisations"]),
                DatabaseSpec::new("interactives-api", &["interactives"]),
            ],
        }
    }
}

impl ProvisionPlan {
    /// Parses a plan from its JSON representation: an array of
    /// `{"name": ..., "collections": [...]}` objects.
    pub fn from_json_str(content: &str) -> AppResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| AppError::PlanFile(format!("invalid plan JSON: {}", e)))
    }

    /// Reads and parses a plan from a JSON file.
    pub fn from_json_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::PlanFile(format!("failed to read {}: {}", path, e)))?;
        Self::from_json_str(&content)
    }

    /// Collapses duplicate database entries and duplicate collection
    /// names, preserving first-declaration order.
    pub fn normalized(&self) -> Self {
        let mut databases: Vec<DatabaseSpec> = Vec::new();

        for spec in &self.databases {
            match databases.iter_mut().find(|d| d.name == spec.name) {
                Some(existing) => {
                    tracing::warn!(database = %spec.name, "Duplicate database spec merged");
                    for collection in &spec.collections {
                        if !existing.collections.contains(collection) {
                            existing.collections.push(collection.clone());
                        }
                    }
                }
                None => {
                    let mut merged = DatabaseSpec {
                        name: spec.name.clone(),
                        collections: Vec::new(),
                    };
                    for collection in &spec.collections {
                        if !merged.collections.contains(collection) {
                            merged.collections.push(collection.clone());
                        }
                    }
                    databases.push(merged);
                }
            }
        }

        Self { databases }
    }

    /// Validates every spec in the plan.
    ///
    /// An empty collections list is legal (the database is left alone);
    /// empty names are not.
    pub fn validate(&self) -> AppResult<()> {
        for spec in &self.databases {
            Validate::validate(spec).map_err(|e| AppError::Validation(e.to_string()))?;
            for collection in &spec.collections {
                if collection.trim().is_empty() {
                    return Err(AppError::Validation(format!(
                        "collection name must not be empty (database {})",
                        spec.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_targets() {
        let plan = ProvisionPlan::default();
        assert_eq!(plan.databases.len(), 2);
        assert_eq!(plan.databases[0].name, "interactives");
        assert_eq!(plan.databases[0].collections, ["metadata", "visualisations"]);
        assert_eq!(plan.databases[1].name, "interactives-api");
        assert_eq!(plan.databases[1].collections, ["interactives"]);
    }

    #[test]
    fn test_default_plan_is_valid() {
        assert!(ProvisionPlan::default().validate().is_ok());
    }

    #[test]
    fn test_normalized_merges_duplicate_databases() {
        let plan = ProvisionPlan {
            databases: vec![
                DatabaseSpec::new("interactives", &["metadata"]),
                DatabaseSpec::new("interactives", &["visualisations"]),
            ],
        };
        let normalized = plan.normalized();
        assert_eq!(normalized.databases.len(), 1);
        assert_eq!(
            normalized.databases[0].collections,
            ["metadata", "visualisations"]
        );
    }

    #[test]
    fn test_normalized_dedupes_collections() {
        let plan = ProvisionPlan {
            databases: vec![DatabaseSpec::new("interactives", &["metadata", "metadata"])],
        };
        let normalized = plan.normalized();
        assert_eq!(normalized.databases[0].collections, ["metadata"]);
    }

    #[test]
    fn test_normalized_preserves_declaration_order() {
        let plan = ProvisionPlan {
            databases: vec![
                DatabaseSpec::new("interactives-api", &["interactives"]),
                DatabaseSpec::new("interactives", &["visualisations", "metadata"]),
            ],
        };
        let normalized = plan.normalized();
        assert_eq!(normalized.databases[0].name, "interactives-api");
        assert_eq!(normalized.databases[1].name, "interactives");
        assert_eq!(
            normalized.databases[1].collections,
            ["visualisations", "metadata"]
        );
    }

    #[test]
    fn test_empty_collections_is_valid() {
        let plan = ProvisionPlan {
            databases: vec![DatabaseSpec::new("interactives", &[])],
        };
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_database_name() {
        let plan = ProvisionPlan {
            databases: vec![DatabaseSpec::new("", &["metadata"])],
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_collection_name() {
        let plan = ProvisionPlan {
            databases: vec![DatabaseSpec::new("interactives", &["metadata", " "])],
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_plan_from_json() {
        let plan = ProvisionPlan::from_json_str(
            r#"[{"name": "interactives-api", "collections": ["interactives"]}]"#,
        )
        .unwrap();
        assert_eq!(plan.databases.len(), 1);
        assert_eq!(plan.databases[0].name, "interactives-api");
        assert_eq!(plan.databases[0].collections, ["interactives"]);
    }

    #[test]
    fn test_plan_from_json_defaults_missing_collections() {
        let plan = ProvisionPlan::from_json_str(r#"[{"name": "interactives"}]"#).unwrap();
        assert!(plan.databases[0].collections.is_empty());
    }

    #[test]
    fn test_plan_from_invalid_json_is_rejected() {
        let result = ProvisionPlan::from_json_str("{not json");
        assert!(matches!(
            result,
            Err(crate::errors::AppError::PlanFile(_))
        ));
    }
}
