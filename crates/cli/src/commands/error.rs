use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectStartupError {
    #[error("Project not initialized: {0}")]
    NotInitialized(String),

    #[error("{0}")]
    Start(#[from] consent_relay_core::StartError),

    #[error("Could not listen for the shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Project not initialized: {0}")]
    NotInitialized(String),

    #[error("{0}")]
    Yaml(#[from] consent_relay_core::ReadYamlError),

    #[error("{0}")]
    SigningKey(#[from] consent_relay_core::WalletError),
}
