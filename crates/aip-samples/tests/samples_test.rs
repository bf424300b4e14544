//! End-to-end sample runs against a scripted service.

use aip_jobs::{Artifact, JobError, JobState, JobStatus, ScriptedJobService};
use aip_samples::paths::resource_id;
use aip_samples::samples::{
    cancel_data_labeling_job_sample, create_data_labeling_job_sample, create_training_pipeline_forecasting_sample,
    create_training_pipeline_tabular_regression_sample, delete_data_labeling_job_sample,
    delete_training_pipeline_sample,
};
use aip_samples::schema;
use aip_samples::{
    cancel_and_delete, extract_resource_name, unique_display_name, ClientConfig, ColumnTransformation,
    DataLabelingJobRequest, ForecastingRunParams, ForecastingTrainingJob, SampleError, TrainingPipelineRequest,
};
use std::sync::Arc;

const PROJECT: &str = "ucaip-sample-tests";
const PIPELINE: &str = "projects/ucaip-sample-tests/locations/us-central1/trainingPipelines/4242";
const LABELING_JOB: &str = "projects/ucaip-sample-tests/locations/us-central1/dataLabelingJobs/77";

fn config() -> ClientConfig {
    let mut config = ClientConfig::new(PROJECT);
    config.poll.interval_secs = Some(0);
    config.poll.teardown_interval_secs = Some(0);
    config.poll.teardown_max_attempts = Some(5);
    config
}

fn iris_transformations() -> Vec<ColumnTransformation> {
    ["sepal_width", "sepal_length", "petal_length", "petal_width"].into_iter().map(ColumnTransformation::auto).collect()
}

#[tokio::test]
async fn test_data_labeling_job_create_cancel_delete() {
    let service: Arc<ScriptedJobService<DataLabelingJobRequest>> =
        Arc::new(ScriptedJobService::new(LABELING_JOB).with_states([JobState::Pending, JobState::Running]));
    let config = config();
    let mut out = Vec::new();

    let display_name = unique_display_name("temp_create_data_labeling_job_test");
    let dataset = config.dataset_path("1905673553261363200").unwrap();
    let future = create_data_labeling_job_sample(
        Arc::clone(&service),
        &config,
        &display_name,
        &dataset,
        "gs://ucaip-sample-resources/images/datalabeling_instructions.pdf",
        schema::data_labeling_inputs::IMAGE_CLASSIFICATION,
        "projects/ucaip-sample-tests/locations/us-central1/datasets/1905673553261363200/annotationSpecs/2",
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(future.state(), JobState::Pending);
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains(&display_name));
    let name = extract_resource_name(&printed).unwrap();
    assert_eq!(name, LABELING_JOB);

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].parent, "projects/ucaip-sample-tests/locations/us-central1");
    assert_eq!(requests[0].data_labeling_job.datasets, vec![dataset]);

    let mut out = Vec::new();
    cancel_data_labeling_job_sample(service.as_ref(), &config, resource_id(name), &mut out).await.unwrap();
    assert_eq!(service.cancelled(), vec![LABELING_JOB.to_string()]);

    let policy = config.teardown_poll_policy();
    let state = aip_samples::wait_for_job_state(service.as_ref(), name, JobState::Cancelled, policy).await.unwrap();
    assert_eq!(state, JobState::Cancelled);

    delete_data_labeling_job_sample(service.as_ref(), &config, resource_id(name), &mut out).await.unwrap();
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("cancel_data_labeling_job_response"));
    assert!(printed.contains("delete_data_labeling_job_response"));
    assert_eq!(service.deleted(), vec![LABELING_JOB.to_string()]);
}

#[tokio::test]
async fn test_tabular_regression_waits_for_model_then_tears_down() {
    let model = Artifact::model("projects/ucaip-sample-tests/locations/us-central1/models/9");
    let service: Arc<ScriptedJobService<TrainingPipelineRequest>> = Arc::new(
        ScriptedJobService::new(PIPELINE)
            .with_statuses([JobStatus::new(JobState::Running), JobStatus::succeeded(model.clone())]),
    );
    let config = config();
    let mut out = Vec::new();

    let future = create_training_pipeline_tabular_regression_sample(
        Arc::clone(&service),
        &config,
        "temp_create_training_pipeline_tabular_regression_test",
        "2438839935709478912",
        "temp_model",
        "species",
        &iris_transformations(),
        &mut out,
    )
    .await
    .unwrap();

    assert!(!future.is_done());
    assert_eq!(future.wait().await.unwrap(), model);
    assert!(future.is_done());

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains(schema::training_job::AUTOML_TABLES));

    let request = &service.requests()[0];
    assert_eq!(request.training_pipeline.training_task_inputs["targetColumn"], "species");
    assert_eq!(request.training_pipeline.training_task_inputs["predictionType"], "regression");

    let mut out = Vec::new();
    delete_training_pipeline_sample(service.as_ref(), &config, resource_id(PIPELINE), &mut out).await.unwrap();
    assert!(String::from_utf8(out).unwrap().starts_with("Delete LRO: "));
    assert_eq!(service.deleted(), vec![PIPELINE.to_string()]);
}

#[tokio::test]
async fn test_forecasting_request_reaches_service() {
    let service: Arc<ScriptedJobService<TrainingPipelineRequest>> =
        Arc::new(ScriptedJobService::new(PIPELINE).with_states([JobState::Running]));
    let config = config();
    let mut out = Vec::new();

    let job = ForecastingTrainingJob::new(
        "temp_forecasting_test",
        Some("minimize-rmse".to_string()),
        vec![ColumnTransformation::auto("date"), ColumnTransformation::auto("sale_dollars")],
    );
    let mut params = ForecastingRunParams::new("sale_dollars", "date", "store_name", 10);
    params.period_unit = Some("day".to_string());
    params.period_count = Some(1);

    create_training_pipeline_forecasting_sample(Arc::clone(&service), &config, &job, "7601", &params, &mut out)
        .await
        .unwrap();

    let requests = service.requests();
    let pipeline = &requests[0].training_pipeline;
    assert_eq!(pipeline.training_task_definition, schema::training_job::AUTOML_FORECASTING);
    assert_eq!(pipeline.model_to_upload.display_name, "temp_forecasting_test");
    assert_eq!(pipeline.training_task_inputs["timeSeriesIdentifierColumn"], "store_name");
    assert_eq!(pipeline.training_task_inputs["period"]["unit"], "day");
    assert!(pipeline.training_task_inputs.get("pastHorizon").is_none());

    let state = cancel_and_delete(service.as_ref(), PIPELINE, config.teardown_poll_policy()).await.unwrap();
    assert_eq!(state, JobState::Cancelled);
}

#[tokio::test]
async fn test_invalid_request_never_reaches_service() {
    let service: Arc<ScriptedJobService<TrainingPipelineRequest>> = Arc::new(ScriptedJobService::new(PIPELINE));
    let config = config();
    let mut out = Vec::new();

    let err = create_training_pipeline_tabular_regression_sample(
        Arc::clone(&service),
        &config,
        "temp",
        "2438839935709478912",
        "temp_model",
        "species",
        &[],
        &mut out,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SampleError::InvalidRequest(_)));
    assert_eq!(service.create_calls(), 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_missing_project_is_reported() {
    let service: Arc<ScriptedJobService<TrainingPipelineRequest>> = Arc::new(ScriptedJobService::new(PIPELINE));
    let config = ClientConfig::default();
    let mut out = Vec::new();

    let err = delete_training_pipeline_sample(service.as_ref(), &config, "4242", &mut out).await.unwrap_err();

    assert!(matches!(err, SampleError::Config(_)));
    assert!(service.deleted().is_empty());
}

#[tokio::test]
async fn test_create_rejection_surfaces_as_job_error() {
    let service: Arc<ScriptedJobService<DataLabelingJobRequest>> =
        Arc::new(ScriptedJobService::new(LABELING_JOB).failing_creates(1));
    let config = config();
    let mut out = Vec::new();

    let err = create_data_labeling_job_sample(
        Arc::clone(&service),
        &config,
        "temp",
        "projects/ucaip-sample-tests/locations/us-central1/datasets/1",
        "gs://ucaip-sample-resources/images/datalabeling_instructions.pdf",
        schema::data_labeling_inputs::IMAGE_CLASSIFICATION,
        "spec",
        &mut out,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SampleError::Job(JobError::Service(_))));
    assert!(out.is_empty());
}
