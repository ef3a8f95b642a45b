use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Data format error in {path:?}: {message}")]
    DataFormat { path: PathBuf, message: String },
    #[error("Unexpected schemes not covered by any scheme group: {}", .0.join(", "))]
    Coverage(Vec<String>),
    #[error("Invalid report config: {0}")]
    InvalidConfig(String),
}

impl ReportError {
    pub fn data_format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ReportError::DataFormat {
            path: path.into(),
            message: message.into(),
        }
    }
}
