use thiserror::Error;

/// Failures surfaced by the step sync workflow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("health data is unavailable on this device")]
    HealthDataUnavailable,
    #[error("failed to read steps from the step source: {0}")]
    StepSource(String),
    #[error("failed to obtain auth token: {0}")]
    Auth(String),
    #[error("failed to fetch steps: {0}")]
    Fetch(String),
    #[error("failed to upload steps: {0}")]
    Upload(String),
    #[error("unknown error: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    NonFatal,
}

impl SyncError {
    pub fn severity(&self) -> Severity {
        match self {
            SyncError::HealthDataUnavailable => Severity::Fatal,
            _ => Severity::NonFatal,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            SyncError::HealthDataUnavailable => "This device doesn't have access to your health data.",
            SyncError::StepSource(_) => "There was an error fetching steps from the step source.",
            SyncError::Auth(_) => "There was an error signing in to the steps API.",
            SyncError::Fetch(_) => "There was an error fetching steps from the steps API.",
            SyncError::Upload(_) => "There was an error uploading steps.",
            SyncError::Unknown(_) => "An unknown error occurred.",
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io error: {0}")]
    IO(#[from] std::io::Error),
    #[error("store contents are not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for environment variable {name}")]
    Invalid { name: &'static str, value: String },
}
