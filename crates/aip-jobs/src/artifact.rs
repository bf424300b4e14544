use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Model,
    Dataset,
    Other,
}

/// Reference to the output resource of a successful job (e.g. a trained model).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Full resource name, e.g. `projects/p/locations/l/models/123`.
    pub resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Artifact {
    #[must_use]
    pub fn model(resource_name: impl Into<String>) -> Self {
        Self { kind: ArtifactKind::Model, resource_name: resource_name.into(), display_name: None }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Last segment of the resource name.
    #[must_use]
    pub fn id(&self) -> &str {
        self.resource_name.rsplit('/').next().unwrap_or(&self.resource_name)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.resource_name.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_id_is_last_segment() {
        let model = Artifact::model("projects/my-project/locations/us-central1/models/12345");
        assert_eq!(model.id(), "12345");
        assert_eq!(model.kind, ArtifactKind::Model);
    }

    #[test]
    fn test_artifact_serializes_without_empty_display_name() {
        let json = serde_json::to_value(Artifact::model("models/1")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "model", "resource_name": "models/1"}));
    }
}
