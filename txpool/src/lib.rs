//! admission of the transactions in the pool of unconfirmed transactions
//!
//! a transaction goes through the [`sanity`] checks, then the [`context`]
//! checks against the [`LedgerOracle`] and the transactions already in the
//! [`TxPool`], before it is admitted. When a block is committed the pool
//! drops what the block confirmed or invalidated.

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod ledger;
mod pool;
pub mod sanity;

pub use config::ChainParams;
pub use error::{ErrorCategory, TxError};
pub use events::TxPoolEvent;
pub use ledger::{LedgerOracle, References, RegisteredProducer};
pub use pool::{Snapshot, TxEntry, TxPool};
