//! Resource-name builders and parsers.
//!
//! Resource names follow `projects/{project}/locations/{location}/{collection}/{id}`.

pub const TRAINING_PIPELINES: &str = "trainingPipelines";
pub const DATA_LABELING_JOBS: &str = "dataLabelingJobs";
pub const DATASETS: &str = "datasets";
pub const MODELS: &str = "models";

#[must_use]
pub fn location_path(project: &str, location: &str) -> String {
    format!("projects/{project}/locations/{location}")
}

fn collection_path(project: &str, location: &str, collection: &str, id: &str) -> String {
    format!("{}/{collection}/{id}", location_path(project, location))
}

#[must_use]
pub fn training_pipeline_path(project: &str, location: &str, training_pipeline: &str) -> String {
    collection_path(project, location, TRAINING_PIPELINES, training_pipeline)
}

#[must_use]
pub fn data_labeling_job_path(project: &str, location: &str, data_labeling_job: &str) -> String {
    collection_path(project, location, DATA_LABELING_JOBS, data_labeling_job)
}

#[must_use]
pub fn dataset_path(project: &str, location: &str, dataset: &str) -> String {
    collection_path(project, location, DATASETS, dataset)
}

#[must_use]
pub fn model_path(project: &str, location: &str, model: &str) -> String {
    collection_path(project, location, MODELS, model)
}

/// Final path segment of a resource name (`.../trainingPipelines/123` -> `123`).
#[must_use]
pub fn resource_id(resource_name: &str) -> &str {
    resource_name.trim_end_matches('/').rsplit('/').next().unwrap_or(resource_name)
}

/// A parsed `projects/*/locations/*/{collection}/{id}` name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceName {
    pub project: String,
    pub location: String,
    pub collection: String,
    pub id: String,
}

impl ResourceName {
    /// Parses a full resource name. Returns `None` for any other shape.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split('/').collect();
        match parts.as_slice() {
            ["projects", project, "locations", location, collection, id]
                if [*project, *location, *collection, *id].iter().all(|p| !p.is_empty()) =>
            {
                Some(Self {
                    project: (*project).to_string(),
                    location: (*location).to_string(),
                    collection: (*collection).to_string(),
                    id: (*id).to_string(),
                })
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&collection_path(&self.project, &self.location, &self.collection, &self.id))
    }
}
