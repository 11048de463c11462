use std::path::PathBuf;

/// Errors that stop a scheduler run.
///
/// A misbehaving scheduled process never produces one of these; its failure
/// is reported through its own metrics row instead.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Workload file {0} contains no commands")]
    EmptyWorkload(PathBuf),

    #[error("No process found for id: {0}")]
    UnknownProcess(usize),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
