mod relay_worker;
pub use relay_worker::RelayWorker;

mod transaction_relay;
pub use transaction_relay::TransactionRelay;

mod types;
pub use types::{
    QueuedTransaction, RelayMessageError, RelaySetup, RelayState, RelayStatus,
    SendTransactionError,
};

mod start;
pub use start::start_transaction_relay;
