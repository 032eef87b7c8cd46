use crate::tx::Transaction;
use crate::{encode, sha256d, Uint256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub version: u32,
    pub previous: Uint256,
    pub merkle_root: Uint256,
    pub timestamp: u32,
    pub height: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub fn hash(&self) -> Uint256 {
        sha256d(&encode(self))
    }
}

/// a committed block, as handed over by the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Arc<Transaction>>,
}

impl Block {
    #[inline]
    pub fn height(&self) -> u32 {
        self.header.height
    }

    #[inline]
    pub fn hash(&self) -> Uint256 {
        self.header.hash()
    }
}
