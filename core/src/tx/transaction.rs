use crate::tx::{Input, Output, Payload, TxType};
use crate::{encode, sha256d, Uint256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// usage tags an attribute may carry
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[repr(u8)]
pub enum AttributeUsage {
    Nonce = 0x00,
    /// the data is a program hash that has to sign the transaction
    Script = 0x20,
    Memo = 0x81,
    Description = 0x90,
    DescriptionUrl = 0x91,
    Confirmations = 0x92,
}

impl TryFrom<u8> for AttributeUsage {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Nonce),
            0x20 => Ok(Self::Script),
            0x81 => Ok(Self::Memo),
            0x90 => Ok(Self::Description),
            0x91 => Ok(Self::DescriptionUrl),
            0x92 => Ok(Self::Confirmations),
            unknown => Err(unknown),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attribute {
    pub usage: u8,
    pub data: Vec<u8>,
}

impl Attribute {
    pub fn new(usage: AttributeUsage, data: Vec<u8>) -> Self {
        Self {
            usage: usage as u8,
            data,
        }
    }
}

/// signature verification code and its parameters (the signatures)
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Program {
    pub code: Vec<u8>,
    pub parameter: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("cannot decode transaction: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),
}

/// a transaction as defined in the blockchain
///
/// a transaction is never modified once it has been decoded, its
/// identity is the hash of its content without the programs.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub version: u8,
    pub tx_type: TxType,
    pub payload_version: u8,
    pub payload: Payload,
    pub attributes: Vec<Attribute>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub lock_time: u32,
    pub programs: Vec<Program>,
}

/// the content of a transaction the programs sign
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnsignedTransaction<'a> {
    version: u8,
    tx_type: TxType,
    payload_version: u8,
    payload: &'a Payload,
    attributes: &'a [Attribute],
    inputs: &'a [Input],
    outputs: &'a [Output],
    lock_time: u32,
}

impl Transaction {
    /// decode a transaction from its canonical encoding
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(ciborium::de::from_reader(bytes)?)
    }

    /// canonical encoding of the whole transaction
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(self)
    }

    #[inline]
    pub fn serialized_size(&self) -> usize {
        self.to_bytes().len()
    }

    /// encoding of the transaction without its programs, this is
    /// the message every program's signatures are checked against.
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        encode(&UnsignedTransaction {
            version: self.version,
            tx_type: self.tx_type,
            payload_version: self.payload_version,
            payload: &self.payload,
            attributes: &self.attributes,
            inputs: &self.inputs,
            outputs: &self.outputs,
            lock_time: self.lock_time,
        })
    }

    pub fn hash(&self) -> Uint256 {
        sha256d(&self.unsigned_bytes())
    }

    #[inline]
    pub fn is_coinbase(&self) -> bool {
        self.tx_type == TxType::CoinBase
    }

    #[inline]
    pub fn is_side_chain_pow(&self) -> bool {
        self.tx_type == TxType::SideChainPow
    }

    #[inline]
    pub fn is_withdraw_from_side_chain(&self) -> bool {
        self.tx_type == TxType::WithdrawFromSideChain
    }

    /// the side chain transaction hashes claimed by a withdraw
    /// transaction, empty for any other kind of transaction
    pub fn side_chain_transaction_hashes(&self) -> &[Uint256] {
        match &self.payload {
            Payload::WithdrawFromSideChain(payload) => &payload.side_chain_transaction_hashes,
            _ => &[],
        }
    }
}
