pub mod types;
pub use types::GasLimit;
