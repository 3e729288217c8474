mod evm_address;
pub use evm_address::{EvmAddress, ParseEvmAddressError};

mod chain_id;
pub use chain_id::ChainId;
