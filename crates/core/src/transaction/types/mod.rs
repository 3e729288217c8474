mod transaction_data;
pub use transaction_data::TransactionData;

mod transaction_hash;
pub use transaction_hash::TransactionHash;

mod transaction_nonce;
pub use transaction_nonce::TransactionNonce;

mod transaction_metadata;
pub use transaction_metadata::TransactionMetadata;

mod raw_transaction;
pub use raw_transaction::RawTransaction;

mod transaction_request;
pub use transaction_request::{TransactionRequest, TransactionRequestError};
