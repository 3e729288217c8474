mod relay_state;
pub use relay_state::{RelayState, RelayStatus};

mod relay_setup;
pub use relay_setup::RelaySetup;

mod queued_transaction;
pub use queued_transaction::QueuedTransaction;

mod relay_errors;
pub use relay_errors::{RelayMessageError, SendTransactionError};
