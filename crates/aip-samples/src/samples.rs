//! Runnable samples: create, cancel and delete training pipelines and data
//! labeling jobs.
//!
//! Create samples submit in deferred mode, print the created resource and
//! hand back the [`ArtifactFuture`] so callers decide whether to wait.

use crate::config::ClientConfig;
use crate::error::SampleResult;
use crate::requests::{
    tabular_regression_request, ColumnTransformation, DataLabelingJob, DataLabelingJobRequest,
    ForecastingRunParams, ForecastingTrainingJob, TrainingPipelineRequest,
};
use aip_jobs::{ArtifactFuture, JobControl, JobHandle, JobOptions, JobService};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

fn print_response<W: Write>(
    out: &mut W,
    resource_name: &str,
    display_name: &str,
    extra: &[(&str, &str)],
) -> SampleResult<()> {
    writeln!(out, "response:")?;
    writeln!(out, " name: {resource_name}")?;
    writeln!(out, " display_name: {display_name}")?;
    for (key, value) in extra {
        writeln!(out, " {key}: {value}")?;
    }
    Ok(())
}

async fn submit_deferred<S>(
    service: Arc<S>,
    config: &ClientConfig,
    request: &S::Request,
) -> SampleResult<ArtifactFuture<S>>
where
    S: JobService,
{
    let options = JobOptions::default().with_poll_policy(config.job_poll_policy());
    let job = JobHandle::with_options(service, options);
    Ok(job.submit(request).await?)
}

/// Creates an AutoML tables regression training pipeline.
#[allow(clippy::too_many_arguments)]
pub async fn create_training_pipeline_tabular_regression_sample<S, W>(
    service: Arc<S>,
    config: &ClientConfig,
    display_name: &str,
    dataset_id: &str,
    model_display_name: &str,
    target_column: &str,
    transformations: &[ColumnTransformation],
    out: &mut W,
) -> SampleResult<ArtifactFuture<S>>
where
    S: JobService<Request = TrainingPipelineRequest>,
    W: Write,
{
    let request = tabular_regression_request(
        &config.location_path()?,
        display_name,
        dataset_id,
        model_display_name,
        target_column,
        transformations,
    )?;

    let future = submit_deferred(service, config, &request).await?;
    info!(resource_name = %future.resource_name(), "Created tabular regression training pipeline");

    print_response(
        out,
        future.resource_name(),
        display_name,
        &[("training_task_definition", request.training_pipeline.training_task_definition.as_str())],
    )?;
    Ok(future)
}

/// Creates an AutoML forecasting training pipeline.
pub async fn create_training_pipeline_forecasting_sample<S, W>(
    service: Arc<S>,
    config: &ClientConfig,
    job: &ForecastingTrainingJob,
    dataset_id: &str,
    params: &ForecastingRunParams,
    out: &mut W,
) -> SampleResult<ArtifactFuture<S>>
where
    S: JobService<Request = TrainingPipelineRequest>,
    W: Write,
{
    let request = job.build_request(&config.location_path()?, dataset_id, params)?;

    let future = submit_deferred(service, config, &request).await?;
    info!(resource_name = %future.resource_name(), "Created forecasting training pipeline");

    print_response(
        out,
        future.resource_name(),
        &job.display_name,
        &[("model_display_name", request.training_pipeline.model_to_upload.display_name.as_str())],
    )?;
    Ok(future)
}

/// Creates an image classification data labeling job over `dataset_name`.
#[allow(clippy::too_many_arguments)]
pub async fn create_data_labeling_job_sample<S, W>(
    service: Arc<S>,
    config: &ClientConfig,
    display_name: &str,
    dataset_name: &str,
    instruction_uri: &str,
    inputs_schema_uri: &str,
    annotation_spec: &str,
    out: &mut W,
) -> SampleResult<ArtifactFuture<S>>
where
    S: JobService<Request = DataLabelingJobRequest>,
    W: Write,
{
    let mut data_labeling_job =
        DataLabelingJob::image_classification(display_name, dataset_name, instruction_uri, annotation_spec);
    data_labeling_job.inputs_schema_uri = inputs_schema_uri.to_string();

    let request = DataLabelingJobRequest { parent: config.location_path()?, data_labeling_job };
    request.validate()?;

    let future = submit_deferred(service, config, &request).await?;
    info!(resource_name = %future.resource_name(), "Created data labeling job");

    print_response(out, future.resource_name(), display_name, &[("inputs_schema_uri", inputs_schema_uri)])?;
    Ok(future)
}

pub async fn cancel_training_pipeline_sample<C, W>(
    control: &C,
    config: &ClientConfig,
    training_pipeline_id: &str,
    out: &mut W,
) -> SampleResult<()>
where
    C: JobControl + ?Sized,
    W: Write,
{
    let name = config.training_pipeline_path(training_pipeline_id)?;
    control.cancel(&name).await?;
    writeln!(out, "cancel_training_pipeline_response: {name}")?;
    Ok(())
}

pub async fn delete_training_pipeline_sample<C, W>(
    control: &C,
    config: &ClientConfig,
    training_pipeline_id: &str,
    out: &mut W,
) -> SampleResult<()>
where
    C: JobControl + ?Sized,
    W: Write,
{
    let name = config.training_pipeline_path(training_pipeline_id)?;
    writeln!(out, "Delete LRO: {name}")?;
    control.delete(&name).await?;
    writeln!(out, "delete_training_pipeline_response: {name}")?;
    Ok(())
}

pub async fn cancel_data_labeling_job_sample<C, W>(
    control: &C,
    config: &ClientConfig,
    data_labeling_job_id: &str,
    out: &mut W,
) -> SampleResult<()>
where
    C: JobControl + ?Sized,
    W: Write,
{
    let name = config.data_labeling_job_path(data_labeling_job_id)?;
    control.cancel(&name).await?;
    writeln!(out, "cancel_data_labeling_job_response: {name}")?;
    Ok(())
}

pub async fn delete_data_labeling_job_sample<C, W>(
    control: &C,
    config: &ClientConfig,
    data_labeling_job_id: &str,
    out: &mut W,
) -> SampleResult<()>
where
    C: JobControl + ?Sized,
    W: Write,
{
    let name = config.data_labeling_job_path(data_labeling_job_id)?;
    writeln!(out, "Delete LRO: {name}")?;
    control.delete(&name).await?;
    writeln!(out, "delete_data_labeling_job_response: {name}")?;
    Ok(())
}
