//! Well-known schema URIs published by the platform.

pub mod training_job {
    pub const AUTOML_FORECASTING: &str =
        "gs://google-cloud-aiplatform/schema/trainingjob/definition/automl_forecasting_1.0.0.yaml";
    pub const AUTOML_TABLES: &str = "gs://google-cloud-aiplatform/schema/trainingjob/definition/automl_tables_1.0.0.yaml";
}

pub mod dataset_metadata {
    pub const TIME_SERIES: &str = "gs://google-cloud-aiplatform/schema/dataset/metadata/time_series_1.0.0.yaml";
    pub const TABULAR: &str = "gs://google-cloud-aiplatform/schema/dataset/metadata/tabular_1.0.0.yaml";
    pub const IMAGE: &str = "gs://google-cloud-aiplatform/schema/dataset/metadata/image_1.0.0.yaml";
}

pub mod data_labeling_inputs {
    pub const IMAGE_CLASSIFICATION: &str =
        "gs://google-cloud-aiplatform/schema/datalabelingjob/inputs/image_classification.yaml";
}
