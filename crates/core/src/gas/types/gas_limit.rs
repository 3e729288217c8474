use std::{error::Error, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// Gas ceiling supplied by the caller at enqueue time. The relay never re-estimates it.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GasLimit(u64);

impl GasLimit {
    pub fn new(gas_limit: u64) -> Self {
        GasLimit(gas_limit)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl Display for GasLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct ParseGasLimitError;

impl Display for ParseGasLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid gas limit")
    }
}

impl Error for ParseGasLimitError {}

impl FromStr for GasLimit {
    type Err = ParseGasLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(GasLimit).map_err(|_| ParseGasLimitError)
    }
}

impl From<u64> for GasLimit {
    fn from(value: u64) -> Self {
        GasLimit(value)
    }
}
