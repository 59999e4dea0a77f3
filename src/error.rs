use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("a job queue already exists in this process")]
    InstanceExists,

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;
