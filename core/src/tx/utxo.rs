use crate::{Fixed64, Uint168, Uint256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Points to particular output of some transaction.
/// We can have multiple pointers with different indexes for the same transaction.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct OutPoint {
    pub tx_id: Uint256,
    pub index: u16,
}

impl OutPoint {
    /// the out point a coinbase input refers to
    pub const COINBASE: Self = Self {
        tx_id: Uint256::ZERO,
        index: u16::MAX,
    };

    pub fn new(tx_id: Uint256, index: u16) -> Self {
        Self { tx_id, index }
    }

    /// the textual key of the reference, unique per spent output
    pub fn refer_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{hash}-{index}",
            hash = self.tx_id,
            index = self.index,
        )
    }
}

/// sequence number an input must carry to spend a time locked output
pub const SEQUENCE_LOCKED_INPUT: u32 = u32::MAX - 1;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub previous: OutPoint,
    pub sequence: u32,
}

impl Input {
    pub fn new(previous: OutPoint) -> Self {
        Self {
            previous,
            sequence: u32::MAX,
        }
    }

    #[inline]
    pub fn refer_key(&self) -> String {
        self.previous.refer_key()
    }
}

/// the vote categories an output can carry
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoteType {
    Delegate,
    CouncilMember,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct VoteContent {
    pub vote_type: VoteType,
    pub candidates: Vec<Vec<u8>>,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputPayload {
    #[default]
    Default,
    Vote {
        version: u8,
        contents: Vec<VoteContent>,
    },
}

/// list the details of an output
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub asset_id: Uint256,
    pub value: Fixed64,
    /// height before which the output cannot be spent, `0` when unlocked
    pub output_lock: u32,
    pub program_hash: Uint168,
    #[serde(default)]
    pub payload: OutputPayload,
}

impl Output {
    pub fn new(asset_id: Uint256, value: Fixed64, program_hash: Uint168) -> Self {
        Self {
            asset_id,
            value,
            output_lock: 0,
            program_hash,
            payload: OutputPayload::Default,
        }
    }
}
