use std::{error::Error, fmt::Display, str::FromStr};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Serialize, PartialEq, Eq, Hash, Deserialize)]
pub struct EvmAddress(Address);

impl EvmAddress {
    /// Returns the hexadecimal string representation of the address.
    ///
    /// # Returns
    /// * `String` - The address formatted as a checksummed hex string with 0x prefix
    pub fn hex(&self) -> String {
        format!("{:?}", self.0)
    }

    /// Creates a new EvmAddress wrapper around an Alloy Address.
    pub fn new(address: Address) -> Self {
        EvmAddress(address)
    }

    /// Consumes this EvmAddress and returns the inner Alloy Address.
    pub fn into_address(self) -> Address {
        self.0
    }

    pub fn zero() -> Self {
        Self(Address::ZERO)
    }
}

impl Display for EvmAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Debug)]
pub struct ParseEvmAddressError(String);

impl Display for ParseEvmAddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid EVM address: {}", self.0)
    }
}

impl Error for ParseEvmAddressError {}

impl FromStr for EvmAddress {
    type Err = ParseEvmAddressError;

    fn from_str(param: &str) -> Result<Self, Self::Err> {
        Address::from_str(param).map(EvmAddress).map_err(|e| ParseEvmAddressError(e.to_string()))
    }
}

impl From<EvmAddress> for Address {
    fn from(address: EvmAddress) -> Self {
        address.0
    }
}

impl From<Address> for EvmAddress {
    fn from(address: Address) -> Self {
        EvmAddress(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_parse_and_display_round_trip_is_checksummed() {
        let parsed: EvmAddress = "0x26988ba8250e009dcc5df543d78e2277e2aa900b".parse().unwrap();
        assert_eq!(
            parsed,
            EvmAddress::new(address!("26988BA8250E009DCC5DF543D78E2277E2AA900B"))
        );
        assert_eq!(parsed.hex(), parsed.to_string());
        assert!(parsed.hex().starts_with("0x"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("0x1234".parse::<EvmAddress>().is_err());
        assert!("not-an-address".parse::<EvmAddress>().is_err());
    }
}
