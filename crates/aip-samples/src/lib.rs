//! AIP Samples
//!
//! Runnable samples built on `aip-jobs`:
//! - Client configuration with file discovery and env overrides (`config`)
//! - Resource paths and schema URIs (`paths`, `schema`)
//! - Validated create requests for training pipelines and labeling jobs (`requests`)
//! - Create/cancel/delete samples and post-test teardown (`samples`, `teardown`)

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod paths;
pub mod requests;
pub mod samples;
pub mod schema;
pub mod teardown;

pub use config::{ClientConfig, ConfigError, ConfigResult, LogFormat, PollSettings};
pub use error::{SampleError, SampleResult};
pub use logging::{build_filter, init_logging};
pub use output::extract_resource_name;
pub use paths::ResourceName;
pub use requests::{
    tabular_regression_request, unique_display_name, ColumnTransformation, DataLabelingJob, DataLabelingJobRequest,
    DataSplit, FractionSplit, ForecastingRunParams, ForecastingTrainingJob, TrainingPipelineRequest,
};
pub use teardown::{cancel_and_delete, wait_for_job_state};
