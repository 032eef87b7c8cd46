pub mod block;
pub mod dpos;
pub mod error;
mod fixed64;
mod hash;
pub mod program;
pub mod signature;
pub mod tx;

pub use block::{Block, BlockHeader};
pub use fixed64::*;
pub use hash::*;
pub use signature::SignatureVerifier;

/// canonical CBOR encoding of a value
///
/// only the in memory writer is used, encoding cannot fail on it.
pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Vec<u8> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(value, &mut bytes)
        .expect("we should always be able to encode in memory");
    bytes
}
