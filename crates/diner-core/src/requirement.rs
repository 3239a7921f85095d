//! Opaque requirement descriptors.
//!
//! The engine never interprets requirements; it hands them to a
//! [`RequirementsEvaluator`](crate::services::RequirementsEvaluator).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single authored requirement, e.g. `{ type: task_complete, task: t_01 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Requirement discriminant, meaningful only to the evaluator.
    #[serde(rename = "type")]
    pub kind: String,
    /// Remaining authored fields.
    #[serde(flatten, default)]
    pub params: Map<String, Value>,
}

impl Requirement {
    /// Creates a requirement with no parameters.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Map::new(),
        }
    }

    /// Adds a parameter, builder style.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_keeps_unknown_fields_as_params() {
        let yaml = "type: task_complete\ntask: t_01\ncount: 2\n";

        let requirement: Requirement = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(requirement.kind, "task_complete");
        assert_eq!(requirement.params.get("task"), Some(&Value::from("t_01")));
        assert_eq!(requirement.params.get("count"), Some(&Value::from(2)));
    }
}
