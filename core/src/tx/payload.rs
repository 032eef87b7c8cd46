use crate::dpos::{DPosIllegalBlocks, DPosIllegalProposals, DPosIllegalVotes};
use crate::{Fixed64, Uint168, Uint256};
use serde::{Deserialize, Serialize};

/// the type tag of a transaction
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum TxType {
    CoinBase = 0x00,
    RegisterAsset = 0x01,
    TransferAsset = 0x02,
    Record = 0x03,
    SideChainPow = 0x05,
    WithdrawFromSideChain = 0x07,
    TransferCrossChainAsset = 0x08,
    RegisterProducer = 0x09,
    CancelProducer = 0x0a,
    UpdateProducer = 0x0b,
    IllegalProposalEvidence = 0x0d,
    IllegalVoteEvidence = 0x0e,
    IllegalBlockEvidence = 0x0f,
}

impl TxType {
    /// evidence transactions carry neither inputs, outputs nor fee
    #[inline]
    pub fn is_evidence(self) -> bool {
        matches!(
            self,
            Self::IllegalProposalEvidence | Self::IllegalVoteEvidence | Self::IllegalBlockEvidence
        )
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct CoinBase {
    pub coinbase_data: Vec<u8>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub name: String,
    pub description: String,
    pub precision: u8,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAsset {
    pub asset: Asset,
    pub amount: Fixed64,
    pub controller: Uint168,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub record_type: String,
    pub record_data: Vec<u8>,
}

/// length of the part of a [`SideChainPow`] covered by the arbitrator
/// signature: side block hash, side genesis hash and the height.
pub const SIDE_CHAIN_POW_SIGNED_LENGTH: usize = 32 + 32 + 4;

/// anchors the mining of a side chain block into the main chain
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct SideChainPow {
    pub side_block_hash: Uint256,
    pub side_genesis_hash: Uint256,
    pub block_height: u32,
    pub signed_data: Vec<u8>,
}

impl SideChainPow {
    /// the fixed length message the on duty arbitrator signs
    pub fn signed_prefix(&self) -> [u8; SIDE_CHAIN_POW_SIGNED_LENGTH] {
        let mut bytes = [0; SIDE_CHAIN_POW_SIGNED_LENGTH];
        bytes[..32].copy_from_slice(self.side_block_hash.as_bytes());
        bytes[32..64].copy_from_slice(self.side_genesis_hash.as_bytes());
        bytes[64..].copy_from_slice(&self.block_height.to_le_bytes());
        bytes
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawFromSideChain {
    pub block_height: u32,
    pub genesis_block_address: String,
    pub side_chain_transaction_hashes: Vec<Uint256>,
}

/// moves value from the main chain to a side chain
///
/// the three lists are index aligned: `output_indexes[i]` is the output
/// locking `cross_chain_amounts[i]` for `cross_chain_addresses[i]`.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct TransferCrossChainAsset {
    pub cross_chain_addresses: Vec<String>,
    pub output_indexes: Vec<u64>,
    pub cross_chain_amounts: Vec<Fixed64>,
}

/// register or update a block producer
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct ProducerInfo {
    pub public_key: Vec<u8>,
    pub nick_name: String,
    pub url: String,
    pub location: u64,
    pub net_address: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct CancelProducer {
    pub public_key: Vec<u8>,
}

/// the payload of a transaction, one case per transaction type
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Payload {
    CoinBase(CoinBase),
    RegisterAsset(RegisterAsset),
    TransferAsset,
    Record(Record),
    SideChainPow(SideChainPow),
    WithdrawFromSideChain(WithdrawFromSideChain),
    TransferCrossChainAsset(TransferCrossChainAsset),
    RegisterProducer(ProducerInfo),
    CancelProducer(CancelProducer),
    UpdateProducer(ProducerInfo),
    IllegalProposalEvidence(DPosIllegalProposals),
    IllegalVoteEvidence(DPosIllegalVotes),
    IllegalBlockEvidence(DPosIllegalBlocks),
}

impl Payload {
    /// the transaction type this payload belongs to
    pub fn tx_type(&self) -> TxType {
        match self {
            Self::CoinBase(_) => TxType::CoinBase,
            Self::RegisterAsset(_) => TxType::RegisterAsset,
            Self::TransferAsset => TxType::TransferAsset,
            Self::Record(_) => TxType::Record,
            Self::SideChainPow(_) => TxType::SideChainPow,
            Self::WithdrawFromSideChain(_) => TxType::WithdrawFromSideChain,
            Self::TransferCrossChainAsset(_) => TxType::TransferCrossChainAsset,
            Self::RegisterProducer(_) => TxType::RegisterProducer,
            Self::CancelProducer(_) => TxType::CancelProducer,
            Self::UpdateProducer(_) => TxType::UpdateProducer,
            Self::IllegalProposalEvidence(_) => TxType::IllegalProposalEvidence,
            Self::IllegalVoteEvidence(_) => TxType::IllegalVoteEvidence,
            Self::IllegalBlockEvidence(_) => TxType::IllegalBlockEvidence,
        }
    }
}
