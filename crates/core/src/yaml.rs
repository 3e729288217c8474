use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::{env, fs::File, io::Read, path::Path};
use thiserror::Error;

use crate::shared::common_types::{ChainId, EvmAddress};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawSigningKey {
    pub private_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MnemonicSigningKey {
    pub phrase: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub index: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SigningKey {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub raw: Option<RawSigningKey>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mnemonic: Option<MnemonicSigningKey>,
}

impl SigningKey {
    pub fn validate(&self) -> Result<(), String> {
        match (&self.raw, &self.mnemonic) {
            (Some(_), Some(_)) => {
                Err("Only one of raw or mnemonic can be set on the signing key".to_string())
            }
            (None, None) => Err("Signing key needs either raw or mnemonic".to_string()),
            (Some(raw), None) if raw.private_key.trim().is_empty() => {
                Err("Raw private key cannot be empty".to_string())
            }
            (None, Some(mnemonic)) if mnemonic.phrase.trim().is_empty() => {
                Err("Mnemonic phrase cannot be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkSetupConfig {
    pub name: String,
    pub provider_urls: Vec<String>,
    /// Read from the node when not set.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chain_id: Option<ChainId>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    #[default]
    Memory,
    Postgres,
}

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const MAX_BATCH_SIZE: usize = 100;
pub const DEFAULT_VISIBILITY_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_visibility_timeout_seconds() -> u64 {
    DEFAULT_VISIBILITY_TIMEOUT_SECONDS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueueConfig {
    #[serde(default)]
    pub backend: QueueBackend,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_visibility_timeout_seconds")]
    pub visibility_timeout_seconds: u64,
    /// Deliveries after which a still failing message is dead-lettered.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// How often the worker is woken to retry messages whose lease expired.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            backend: QueueBackend::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            visibility_timeout_seconds: DEFAULT_VISIBILITY_TIMEOUT_SECONDS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(format!("queue batch_size must be between 1 and {}", MAX_BATCH_SIZE));
        }
        if self.visibility_timeout_seconds == 0 {
            return Err("queue visibility_timeout_seconds must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("queue max_attempts must be greater than 0".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("queue poll_interval_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SetupConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    pub signing_key: SigningKey,
    pub network: NetworkSetupConfig,
    /// Ledger contract every queued transaction is sent to unless a destination is given.
    pub contract_address: EvmAddress,
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Substitutes `${VAR}` references in YAML content with environment values.
fn substitute_env_variables(contents: &str) -> Result<String, ReadYamlError> {
    let re = Regex::new(r"\$\{([^}]+)\}")?;
    let mut missing: Vec<String> = Vec::new();

    let result = re.replace_all(contents, |caps: &Captures| {
        let var_name = &caps[1];
        match env::var(var_name) {
            Ok(val) => val,
            Err(_) => {
                missing.push(var_name.to_string());
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(ReadYamlError::EnvironmentVariableNotFound(missing.join(", ")));
    }

    Ok(result.into_owned())
}

#[derive(Error, Debug)]
pub enum ReadYamlError {
    #[error("Can not find yaml")]
    CanNotFindYaml,

    #[error("Can not read yaml")]
    CanNotReadYaml,

    #[error("Setup config is invalid yaml and does not match the struct - {0}")]
    SetupConfigInvalidYaml(String),

    #[error("Environment variable {0} not found")]
    EnvironmentVariableNotFound(String),

    #[error("Environment variable pattern is invalid: {0}")]
    InvalidEnvironmentPattern(#[from] regex::Error),

    #[error("Signing key yaml bad format: {0}")]
    SigningKeyYamlError(String),

    #[error("Network {0} provider urls not defined")]
    NetworkProviderUrlsNotDefined(String),

    #[error("Queue yaml bad format: {0}")]
    QueueYamlError(String),
}

/// Parses relay configuration from YAML text, substituting environment variables first
/// unless `raw_yaml` is set.
pub fn parse(contents: &str, raw_yaml: bool) -> Result<SetupConfig, ReadYamlError> {
    let substituted_contents =
        if raw_yaml { contents.to_string() } else { substitute_env_variables(contents)? };

    let config: SetupConfig = serde_yaml::from_str(&substituted_contents)
        .map_err(|e| ReadYamlError::SetupConfigInvalidYaml(e.to_string()))?;

    if config.network.provider_urls.is_empty() {
        return Err(ReadYamlError::NetworkProviderUrlsNotDefined(config.network.name.clone()));
    }

    config.signing_key.validate().map_err(ReadYamlError::SigningKeyYamlError)?;
    config.queue.validate().map_err(ReadYamlError::QueueYamlError)?;

    Ok(config)
}

/// Reads and parses the relay configuration YAML file.
pub fn read(file_path: &Path, raw_yaml: bool) -> Result<SetupConfig, ReadYamlError> {
    let mut file = File::open(file_path).map_err(|_| ReadYamlError::CanNotFindYaml)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|_| ReadYamlError::CanNotReadYaml)?;

    parse(&contents, raw_yaml)
}
