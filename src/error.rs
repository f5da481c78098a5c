use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("frame capture failed: {0}")]
    CaptureFailure(String),

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("failed to start growth workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl VisionError {
    pub fn invalid_config<T>(msg: impl Into<String>) -> Result<T> {
        Err(VisionError::InvalidConfig(msg.into()))
    }

    pub fn capture_failure<T>(msg: impl Into<String>) -> Result<T> {
        Err(VisionError::CaptureFailure(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, VisionError>;
