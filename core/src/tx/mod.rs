mod payload;
mod transaction;
mod utxo;

pub use payload::*;
pub use transaction::*;
pub use utxo::*;
