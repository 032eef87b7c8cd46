//! evidences of illegal behaviours of the DPoS producers
//!
//! the consensus engine detects the misbehaviour, it wraps the two
//! conflicting artifacts into an evidence transaction. Here we only check
//! that an evidence does prove a conflict.

use crate::block::BlockHeader;
use crate::signature::SignatureVerifier;
use crate::{encode, sha256d, Uint256};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvidenceError {
    #[error("proposal, vote and block of an evidence should match")]
    Mismatch,

    #[error("evidences should be at the same height")]
    DifferentHeight,

    #[error("evidences should be in the same view")]
    DifferentView,

    #[error("evidences can not be the same")]
    SameContent,

    #[error("evidences should have the same sponsor or signer")]
    DifferentProducer,

    #[error("block height does not match the evidences")]
    BlockHeight,

    #[error("evidences should share at least one signer")]
    NoCommonSigner,

    #[error("proposal signature is not valid")]
    InvalidProposal,

    #[error("vote signature is not valid")]
    InvalidVote,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct DPosProposal {
    pub sponsor: Vec<u8>,
    pub block_hash: Uint256,
    pub view_offset: u32,
    pub sign: Vec<u8>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnsignedProposal<'a> {
    sponsor: &'a [u8],
    block_hash: &'a Uint256,
    view_offset: u32,
}

impl DPosProposal {
    /// the message signed by the sponsor
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        encode(&UnsignedProposal {
            sponsor: &self.sponsor,
            block_hash: &self.block_hash,
            view_offset: self.view_offset,
        })
    }

    pub fn hash(&self) -> Uint256 {
        sha256d(&self.unsigned_bytes())
    }

    pub fn is_valid<V: SignatureVerifier + ?Sized>(&self, verifier: &V) -> bool {
        verifier.verify(&self.sponsor, &self.unsigned_bytes(), &self.sign)
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct DPosProposalVote {
    pub proposal_hash: Uint256,
    pub signer: Vec<u8>,
    pub accept: bool,
    pub sign: Vec<u8>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnsignedVote<'a> {
    proposal_hash: &'a Uint256,
    signer: &'a [u8],
    accept: bool,
}

impl DPosProposalVote {
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        encode(&UnsignedVote {
            proposal_hash: &self.proposal_hash,
            signer: &self.signer,
            accept: self.accept,
        })
    }

    pub fn hash(&self) -> Uint256 {
        sha256d(&self.unsigned_bytes())
    }

    pub fn is_valid<V: SignatureVerifier + ?Sized>(&self, verifier: &V) -> bool {
        verifier.verify(&self.signer, &self.unsigned_bytes(), &self.sign)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct ProposalEvidence {
    pub proposal: DPosProposal,
    pub block_header: BlockHeader,
}

impl ProposalEvidence {
    /// the proposal is about the block of the evidence
    pub fn is_match(&self) -> bool {
        self.proposal.block_hash == self.block_header.hash()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct VoteEvidence {
    pub proposal: DPosProposal,
    pub vote: DPosProposalVote,
    pub block_header: BlockHeader,
}

impl VoteEvidence {
    pub fn is_match(&self) -> bool {
        self.proposal.block_hash == self.block_header.hash()
            && self.vote.proposal_hash == self.proposal.hash()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct BlockEvidence {
    pub header: BlockHeader,
    /// public keys of the producers that confirmed the block
    pub signers: Vec<Vec<u8>>,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoinType {
    Ela,
    SideChain,
}

/// two different proposals of the same sponsor in the same view
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct DPosIllegalProposals {
    pub evidence: ProposalEvidence,
    pub compare_evidence: ProposalEvidence,
}

impl DPosIllegalProposals {
    pub fn check<V: SignatureVerifier + ?Sized>(&self, verifier: &V) -> Result<(), EvidenceError> {
        let (a, b) = (&self.evidence, &self.compare_evidence);

        if !a.is_match() || !b.is_match() {
            return Err(EvidenceError::Mismatch);
        }
        if a.block_header.height != b.block_header.height {
            return Err(EvidenceError::DifferentHeight);
        }
        if a.proposal.hash() == b.proposal.hash() {
            return Err(EvidenceError::SameContent);
        }
        if a.proposal.sponsor != b.proposal.sponsor {
            return Err(EvidenceError::DifferentProducer);
        }
        if a.proposal.view_offset != b.proposal.view_offset {
            return Err(EvidenceError::DifferentView);
        }
        if !a.proposal.is_valid(verifier) || !b.proposal.is_valid(verifier) {
            return Err(EvidenceError::InvalidProposal);
        }
        Ok(())
    }
}

/// two different votes of the same producer in the same view
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct DPosIllegalVotes {
    pub evidence: VoteEvidence,
    pub compare_evidence: VoteEvidence,
}

impl DPosIllegalVotes {
    pub fn check<V: SignatureVerifier + ?Sized>(&self, verifier: &V) -> Result<(), EvidenceError> {
        let (a, b) = (&self.evidence, &self.compare_evidence);

        if !a.is_match() || !b.is_match() {
            return Err(EvidenceError::Mismatch);
        }
        if a.block_header.height != b.block_header.height {
            return Err(EvidenceError::DifferentHeight);
        }
        if a.vote.hash() == b.vote.hash() {
            return Err(EvidenceError::SameContent);
        }
        if a.vote.signer != b.vote.signer {
            return Err(EvidenceError::DifferentProducer);
        }
        if a.proposal.view_offset != b.proposal.view_offset {
            return Err(EvidenceError::DifferentView);
        }
        // both sides of the evidence have to stand on their own
        if !a.proposal.is_valid(verifier) || !b.proposal.is_valid(verifier) {
            return Err(EvidenceError::InvalidProposal);
        }
        if !a.vote.is_valid(verifier) || !b.vote.is_valid(verifier) {
            return Err(EvidenceError::InvalidVote);
        }
        Ok(())
    }
}

/// two different blocks confirmed at the same height
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct DPosIllegalBlocks {
    pub coin_type: CoinType,
    pub block_height: u32,
    pub evidence: BlockEvidence,
    pub compare_evidence: BlockEvidence,
}

impl DPosIllegalBlocks {
    pub fn check(&self) -> Result<(), EvidenceError> {
        let (a, b) = (&self.evidence, &self.compare_evidence);

        if a.header.hash() == b.header.hash() {
            return Err(EvidenceError::SameContent);
        }
        if self.coin_type == CoinType::Ela
            && (a.header.height != self.block_height || b.header.height != self.block_height)
        {
            return Err(EvidenceError::BlockHeight);
        }
        if a.header.height != b.header.height {
            return Err(EvidenceError::DifferentHeight);
        }

        let signers: HashSet<&[u8]> = a.signers.iter().map(Vec::as_slice).collect();
        if !b.signers.iter().any(|signer| signers.contains(signer.as_slice())) {
            return Err(EvidenceError::NoCommonSigner);
        }
        Ok(())
    }
}
