//! Request descriptions for training pipelines and data labeling jobs.
//!
//! These mirror the service's resource schema (camelCase on the wire) and are
//! validated here, before they reach the lifecycle wrapper.

use crate::error::{SampleError, SampleResult};
use crate::schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Tolerance used when checking that split fractions add up to at most 1.
const FRACTION_EPSILON: f64 = 1e-9;

/// Label attached to data labeling jobs created by the samples.
pub const ANNOTATION_SET_LABEL: &str = "aiplatform.googleapis.com/annotation_set_name";

/// Builds a display name that is unique per run, e.g. `temp_create_training_pipeline_<uuid>`.
#[must_use]
pub fn unique_display_name(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4())
}

fn require(value: &str, field: &str) -> SampleResult<()> {
    if value.trim().is_empty() {
        return Err(SampleError::InvalidRequest(format!("{field} is required")));
    }
    Ok(())
}

fn require_gcs_uri(value: &str, field: &str) -> SampleResult<()> {
    require(value, field)?;
    if !value.starts_with("gs://") {
        return Err(SampleError::InvalidRequest(format!("{field} must be a gs:// URI, got {value}")));
    }
    Ok(())
}

/// How a column is transformed before training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnTransformation {
    Auto { column_name: String },
    Numeric { column_name: String },
    Categorical { column_name: String },
    Text { column_name: String },
    Timestamp { column_name: String },
}

impl ColumnTransformation {
    #[must_use]
    pub fn auto(column_name: impl Into<String>) -> Self {
        Self::Auto { column_name: column_name.into() }
    }

    #[must_use]
    pub fn column_name(&self) -> &str {
        match self {
            Self::Auto { column_name }
            | Self::Numeric { column_name }
            | Self::Categorical { column_name }
            | Self::Text { column_name }
            | Self::Timestamp { column_name } => column_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FractionSplit {
    pub training_fraction: f64,
    pub validation_fraction: f64,
    pub test_fraction: f64,
}

impl FractionSplit {
    pub fn new(training_fraction: f64, validation_fraction: f64, test_fraction: f64) -> SampleResult<Self> {
        let split = Self { training_fraction, validation_fraction, test_fraction };
        split.validate()?;
        Ok(split)
    }

    pub fn validate(&self) -> SampleResult<()> {
        for (name, value) in [
            ("training_fraction", self.training_fraction),
            ("validation_fraction", self.validation_fraction),
            ("test_fraction", self.test_fraction),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(SampleError::InvalidRequest(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        let total = self.training_fraction + self.validation_fraction + self.test_fraction;
        if total > 1.0 + FRACTION_EPSILON {
            return Err(SampleError::InvalidRequest(format!("split fractions must sum to at most 1, got {total}")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredefinedSplit {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDataConfig {
    pub dataset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction_split: Option<FractionSplit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predefined_split: Option<PredefinedSplit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelToUpload {
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPipeline {
    pub display_name: String,
    pub training_task_definition: String,
    pub training_task_inputs: Value,
    pub model_to_upload: ModelToUpload,
    pub input_data_config: InputDataConfig,
}

/// Create request for a training pipeline under `parent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPipelineRequest {
    pub parent: String,
    pub training_pipeline: TrainingPipeline,
}

impl TrainingPipelineRequest {
    pub fn validate(&self) -> SampleResult<()> {
        let pipeline = &self.training_pipeline;
        require(&self.parent, "parent")?;
        require(&pipeline.display_name, "display_name")?;
        require_gcs_uri(&pipeline.training_task_definition, "training_task_definition")?;
        require(&pipeline.model_to_upload.display_name, "model_to_upload.display_name")?;
        require(&pipeline.input_data_config.dataset_id, "input_data_config.dataset_id")?;
        if let Some(split) = &pipeline.input_data_config.fraction_split {
            split.validate()?;
        }
        if let Some(split) = &pipeline.input_data_config.predefined_split {
            require(&split.key, "predefined_split.key")?;
        }
        if !pipeline.training_task_inputs.is_object() {
            return Err(SampleError::InvalidRequest("training_task_inputs must be a JSON object".to_string()));
        }
        Ok(())
    }
}

/// Data split options shared by AutoML training requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSplit {
    pub fraction: Option<FractionSplit>,
    pub predefined_split_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

/// Column and horizon settings for one forecasting run.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastingRunParams {
    pub target_column: String,
    pub time_column: String,
    pub time_series_identifier_column: String,
    pub forecast_window_end: i64,
    pub model_display_name: Option<String>,
    pub split: DataSplit,
    pub weight_column: Option<String>,
    pub static_columns: Vec<String>,
    pub time_variant_past_only_columns: Vec<String>,
    pub time_variant_past_and_future_columns: Vec<String>,
    pub period_unit: Option<String>,
    pub period_count: Option<i64>,
    pub forecast_window_start: Option<i64>,
    pub past_horizon: Option<i64>,
    pub budget_milli_node_hours: i64,
    pub export_evaluated_data_items_config: Option<Value>,
    pub quantiles: Option<Vec<f64>>,
    pub validation_options: Option<String>,
}

impl ForecastingRunParams {
    #[must_use]
    pub fn new(
        target_column: impl Into<String>,
        time_column: impl Into<String>,
        time_series_identifier_column: impl Into<String>,
        forecast_window_end: i64,
    ) -> Self {
        Self {
            target_column: target_column.into(),
            time_column: time_column.into(),
            time_series_identifier_column: time_series_identifier_column.into(),
            forecast_window_end,
            model_display_name: None,
            split: DataSplit::default(),
            weight_column: None,
            static_columns: Vec::new(),
            time_variant_past_only_columns: Vec::new(),
            time_variant_past_and_future_columns: Vec::new(),
            period_unit: None,
            period_count: None,
            forecast_window_start: None,
            past_horizon: None,
            budget_milli_node_hours: 1000,
            export_evaluated_data_items_config: None,
            quantiles: None,
            validation_options: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForecastingTaskInputs<'a> {
    target_column: &'a str,
    time_column: &'a str,
    time_series_identifier_column: &'a str,
    static_columns: &'a [String],
    time_variant_past_only_columns: &'a [String],
    time_variant_past_and_future_columns: &'a [String],
    forecast_window_end: i64,
    transformations: &'a [ColumnTransformation],
    train_budget_milli_node_hours: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight_column_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    forecast_window_start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    past_horizon: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    export_evaluated_data_items_config: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantiles: Option<&'a [f64]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_options: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    optimization_objective: Option<&'a str>,
}

/// AutoML forecasting training job definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastingTrainingJob {
    pub display_name: String,
    pub optimization_objective: Option<String>,
    pub column_transformations: Vec<ColumnTransformation>,
}

impl ForecastingTrainingJob {
    #[must_use]
    pub fn new(
        display_name: impl Into<String>,
        optimization_objective: Option<String>,
        column_transformations: Vec<ColumnTransformation>,
    ) -> Self {
        Self { display_name: display_name.into(), optimization_objective, column_transformations }
    }

    /// Builds the create request for running this job on `dataset_id`.
    ///
    /// The uploaded model is named after the job unless
    /// `params.model_display_name` is set.
    pub fn build_request(
        &self,
        parent: &str,
        dataset_id: &str,
        params: &ForecastingRunParams,
    ) -> SampleResult<TrainingPipelineRequest> {
        require(&params.target_column, "target_column")?;
        require(&params.time_column, "time_column")?;
        require(&params.time_series_identifier_column, "time_series_identifier_column")?;
        if self.column_transformations.is_empty() {
            return Err(SampleError::InvalidRequest("at least one column transformation is required".to_string()));
        }
        if params.forecast_window_end < 0 {
            return Err(SampleError::InvalidRequest("forecast_window_end must be >= 0".to_string()));
        }
        if params.budget_milli_node_hours <= 0 {
            return Err(SampleError::InvalidRequest("budget_milli_node_hours must be > 0".to_string()));
        }

        let inputs = ForecastingTaskInputs {
            target_column: &params.target_column,
            time_column: &params.time_column,
            time_series_identifier_column: &params.time_series_identifier_column,
            static_columns: &params.static_columns,
            time_variant_past_only_columns: &params.time_variant_past_only_columns,
            time_variant_past_and_future_columns: &params.time_variant_past_and_future_columns,
            forecast_window_end: params.forecast_window_end,
            transformations: &self.column_transformations,
            train_budget_milli_node_hours: params.budget_milli_node_hours,
            weight_column_name: params.weight_column.as_deref(),
            period: params
                .period_unit
                .as_ref()
                .map(|unit| Period { unit: unit.clone(), quantity: params.period_count }),
            forecast_window_start: params.forecast_window_start,
            past_horizon: params.past_horizon,
            export_evaluated_data_items_config: params.export_evaluated_data_items_config.as_ref(),
            quantiles: params.quantiles.as_deref(),
            validation_options: params.validation_options.as_deref(),
            optimization_objective: self.optimization_objective.as_deref(),
        };

        let request = TrainingPipelineRequest {
            parent: parent.to_string(),
            training_pipeline: TrainingPipeline {
                display_name: self.display_name.clone(),
                training_task_definition: schema::training_job::AUTOML_FORECASTING.to_string(),
                training_task_inputs: serde_json::to_value(&inputs)?,
                model_to_upload: ModelToUpload {
                    display_name: params.model_display_name.clone().unwrap_or_else(|| self.display_name.clone()),
                },
                input_data_config: InputDataConfig {
                    dataset_id: dataset_id.to_string(),
                    fraction_split: params.split.fraction.clone(),
                    predefined_split: params
                        .split
                        .predefined_split_column
                        .as_ref()
                        .map(|key| PredefinedSplit { key: key.clone() }),
                },
            },
        };
        request.validate()?;
        Ok(request)
    }
}

/// Builds an AutoML tables regression request.
pub fn tabular_regression_request(
    parent: &str,
    display_name: &str,
    dataset_id: &str,
    model_display_name: &str,
    target_column: &str,
    transformations: &[ColumnTransformation],
) -> SampleResult<TrainingPipelineRequest> {
    require(target_column, "target_column")?;
    if transformations.is_empty() {
        return Err(SampleError::InvalidRequest("at least one column transformation is required".to_string()));
    }

    let inputs = serde_json::json!({
        "transformations": transformations,
        "targetColumn": target_column,
        "predictionType": "regression",
        "trainBudgetMilliNodeHours": 8000,
        "disableEarlyStopping": false,
        "optimizationObjective": "minimize-rmse",
    });

    let request = TrainingPipelineRequest {
        parent: parent.to_string(),
        training_pipeline: TrainingPipeline {
            display_name: display_name.to_string(),
            training_task_definition: schema::training_job::AUTOML_TABLES.to_string(),
            training_task_inputs: inputs,
            model_to_upload: ModelToUpload { display_name: model_display_name.to_string() },
            input_data_config: InputDataConfig {
                dataset_id: dataset_id.to_string(),
                fraction_split: None,
                predefined_split: None,
            },
        },
    };
    request.validate()?;
    Ok(request)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLabelingJob {
    pub display_name: String,
    /// Full dataset resource names.
    pub datasets: Vec<String>,
    pub labeler_count: u32,
    pub instruction_uri: String,
    pub inputs_schema_uri: String,
    pub inputs: Value,
    #[serde(default)]
    pub annotation_labels: BTreeMap<String, String>,
}

impl DataLabelingJob {
    /// Image classification labeling job over a single dataset.
    #[must_use]
    pub fn image_classification(
        display_name: impl Into<String>,
        dataset_name: impl Into<String>,
        instruction_uri: impl Into<String>,
        annotation_spec: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            datasets: vec![dataset_name.into()],
            labeler_count: 1,
            instruction_uri: instruction_uri.into(),
            inputs_schema_uri: schema::data_labeling_inputs::IMAGE_CLASSIFICATION.to_string(),
            inputs: serde_json::json!({ "annotation_specs": [annotation_spec.into()] }),
            annotation_labels: BTreeMap::from([(ANNOTATION_SET_LABEL.to_string(), "my_test_saved_query".to_string())]),
        }
    }
}

/// Create request for a data labeling job under `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLabelingJobRequest {
    pub parent: String,
    pub data_labeling_job: DataLabelingJob,
}

impl DataLabelingJobRequest {
    pub fn validate(&self) -> SampleResult<()> {
        let job = &self.data_labeling_job;
        require(&self.parent, "parent")?;
        require(&job.display_name, "display_name")?;
        if job.datasets.is_empty() {
            return Err(SampleError::InvalidRequest("at least one dataset is required".to_string()));
        }
        for dataset in &job.datasets {
            require(dataset, "datasets[]")?;
        }
        if job.labeler_count == 0 {
            return Err(SampleError::InvalidRequest("labeler_count must be >= 1".to_string()));
        }
        require_gcs_uri(&job.instruction_uri, "instruction_uri")?;
        require_gcs_uri(&job.inputs_schema_uri, "inputs_schema_uri")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn iris_transformations() -> Vec<ColumnTransformation> {
        ["sepal_width", "sepal_length", "petal_length", "petal_width"]
            .into_iter()
            .map(ColumnTransformation::auto)
            .collect()
    }

    #[test]
    fn test_fraction_split_validation() {
        assert!(FractionSplit::new(0.6, 0.2, 0.2).is_ok());
        assert!(FractionSplit::new(0.8, 0.1, 0.0).is_ok());
        assert!(FractionSplit::new(0.7, 0.3, 0.2).is_err());
        assert!(FractionSplit::new(-0.1, 0.5, 0.5).is_err());
        assert!(FractionSplit::new(f64::NAN, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_transformation_serialization() {
        let json = serde_json::to_value(ColumnTransformation::auto("sepal_width")).unwrap();
        assert_eq!(json, json!({"auto": {"column_name": "sepal_width"}}));
        assert_eq!(ColumnTransformation::auto("x").column_name(), "x");
    }

    #[test]
    fn test_forecasting_request_task_inputs() {
        let job =
            ForecastingTrainingJob::new("test-display-name", Some("minimize-rmse".to_string()), iris_transformations());
        let mut params = ForecastingRunParams::new("target", "time", "time_series_identifier", 10);
        params.weight_column = Some("weight".to_string());
        params.period_unit = Some("day".to_string());
        params.model_display_name = Some("model-display-name".to_string());
        params.split = DataSplit {
            fraction: Some(FractionSplit::new(0.6, 0.2, 0.2).unwrap()),
            predefined_split_column: Some("split".to_string()),
        };

        let request = job.build_request("projects/p/locations/us-central1", "test-dataset-name", &params).unwrap();
        let pipeline = &request.training_pipeline;

        assert_eq!(pipeline.training_task_definition, schema::training_job::AUTOML_FORECASTING);
        assert_eq!(pipeline.model_to_upload.display_name, "model-display-name");
        assert_eq!(pipeline.input_data_config.predefined_split, Some(PredefinedSplit { key: "split".to_string() }));

        let inputs = &pipeline.training_task_inputs;
        assert_eq!(inputs["targetColumn"], "target");
        assert_eq!(inputs["timeSeriesIdentifierColumn"], "time_series_identifier");
        assert_eq!(inputs["forecastWindowEnd"], 10);
        assert_eq!(inputs["trainBudgetMilliNodeHours"], 1000);
        assert_eq!(inputs["weightColumnName"], "weight");
        assert_eq!(inputs["period"], json!({"unit": "day"}));
        assert_eq!(inputs["optimizationObjective"], "minimize-rmse");
        assert_eq!(inputs["staticColumns"], json!([]));
        assert_eq!(inputs["transformations"][0], json!({"auto": {"column_name": "sepal_width"}}));
        assert!(inputs.get("pastHorizon").is_none());
        assert!(inputs.get("quantiles").is_none());
    }

    #[test]
    fn test_forecasting_model_name_defaults_to_job_name() {
        let job = ForecastingTrainingJob::new("test-display-name", None, iris_transformations());
        let params = ForecastingRunParams::new("target", "time", "id", 10);

        let request = job.build_request("projects/p/locations/l", "ds", &params).unwrap();

        assert_eq!(request.training_pipeline.model_to_upload.display_name, "test-display-name");
        assert_eq!(request.training_pipeline.input_data_config.fraction_split, None);
        assert!(request.training_pipeline.training_task_inputs.get("optimizationObjective").is_none());
    }

    #[test]
    fn test_forecasting_request_rejects_missing_columns() {
        let job = ForecastingTrainingJob::new("name", None, iris_transformations());
        let params = ForecastingRunParams::new("", "time", "id", 10);
        let result = job.build_request("projects/p/locations/l", "ds", &params);
        assert!(matches!(result, Err(SampleError::InvalidRequest(_))));
    }

    #[test]
    fn test_forecasting_request_rejects_empty_transformations() {
        let job = ForecastingTrainingJob::new("name", None, Vec::new());
        let params = ForecastingRunParams::new("target", "time", "id", 10);
        let err = job.build_request("projects/p/locations/l", "ds", &params).unwrap_err();
        assert!(err.to_string().contains("column transformation"));
    }

    #[test]
    fn test_training_pipeline_request_wire_format() {
        let request = tabular_regression_request(
            "projects/p/locations/us-central1",
            "temp_create_training_pipeline_test",
            "3019804287640272896",
            "Temp Model",
            "FLOAT_5000unique_REQUIRED",
            &[ColumnTransformation::auto("STRING_5000unique_NULLABLE")],
        )
        .unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["parent"], "projects/p/locations/us-central1");
        assert_eq!(json["trainingPipeline"]["modelToUpload"]["displayName"], "Temp Model");
        assert_eq!(json["trainingPipeline"]["inputDataConfig"], json!({"datasetId": "3019804287640272896"}));
        assert_eq!(json["trainingPipeline"]["trainingTaskInputs"]["predictionType"], "regression");
    }

    #[test]
    fn test_data_labeling_request_validation() {
        let job = DataLabelingJob::image_classification(
            "temp_create_data_labeling_job_test",
            "projects/p/locations/us-central1/datasets/1905673553261363200",
            "gs://ucaip-sample-resources/images/datalabeling_instructions.pdf",
            "daisy",
        );
        let request =
            DataLabelingJobRequest { parent: "projects/p/locations/us-central1".to_string(), data_labeling_job: job };
        assert!(request.validate().is_ok());
        assert_eq!(request.data_labeling_job.inputs, json!({"annotation_specs": ["daisy"]}));

        let mut bad = request.clone();
        bad.data_labeling_job.instruction_uri = "https://example.com/instructions.pdf".to_string();
        assert!(bad.validate().is_err());

        let mut bad = request;
        bad.data_labeling_job.labeler_count = 0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_unique_display_name() {
        let a = unique_display_name("temp_create_data_labeling_job_test");
        let b = unique_display_name("temp_create_data_labeling_job_test");
        assert!(a.starts_with("temp_create_data_labeling_job_test_"));
        assert_ne!(a, b);
    }
}
