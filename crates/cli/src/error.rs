use thiserror::Error;

use crate::commands::error::{CheckError, ProjectStartupError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Project startup error: {0}")]
    ProjectStartup(#[from] ProjectStartupError),

    #[error("Configuration check failed: {0}")]
    Check(#[from] CheckError),

    #[error("{0}")]
    Path(String),
}

impl From<String> for CliError {
    fn from(err: String) -> Self {
        CliError::Path(err)
    }
}
