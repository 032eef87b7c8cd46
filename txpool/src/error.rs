use ela_core::dpos::EvidenceError;
use ela_core::program::ProgramError;
use ela_core::tx::OutPoint;
use ela_core::{Fixed64, Uint168, Uint256};
use thiserror::Error;

/// the families of rejection a transaction can get
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ErrorCategory {
    /// the transaction is malformed on its own
    Structural,
    /// the transaction does not fit the outputs or sidechain claims it refers to
    Referential,
    /// accepting the transaction would break the ledger's safety
    ConsensusSafety,
    /// the transaction breaks a rule of the producers registry
    Policy,
}

/// reason a transaction is not admitted
///
/// none of these is retried, it is up to the submitter to decide
/// what to do with a rejected transaction.
#[derive(Debug, Error)]
pub enum TxError {
    #[error("invalid transaction size: {size} bytes (max {max})")]
    TransactionSize { size: usize, max: usize },

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("invalid output: {0}")]
    InvalidOutput(&'static str),

    #[error("the precision of the asset {asset} is incorrect")]
    AssetPrecision { asset: Uint256 },

    #[error("invalid attributes or programs: {0}")]
    AttributeProgram(&'static str),

    #[error("invalid transaction payload: {0}")]
    TransactionPayload(&'static str),

    #[error("sidechain transaction {0} is claimed twice in the transaction")]
    DuplicateSidechainHash(Uint256),

    #[error("cannot resolve the outputs referred by the transaction")]
    UnknownReferredTx(#[source] anyhow::Error),

    #[error("sidechain transaction {0} is already claimed by a transaction in the pool")]
    SidechainTxDuplicate(Uint256),

    #[error("sidechain transaction {0} is already confirmed")]
    SidechainTxConfirmed(Uint256),

    #[error("invalid cross chain transfer: {0}")]
    InvalidCrossChain(&'static str),

    #[error("UTXO locked: {0}")]
    UtxoLocked(&'static str),

    #[error("transaction fee not enough: inputs {inputs}, outputs {outputs}, minimum fee {min_fee}")]
    TransactionBalance {
        inputs: Fixed64,
        outputs: Fixed64,
        min_fee: Fixed64,
    },

    #[error("cannot use an output of the destruction address")]
    DestructionAddress,

    #[error("cannot spend coinbase output of {0} before it matures")]
    CoinbaseNotMature(Uint256),

    #[error("double spent UTXO input {0}")]
    DoubleSpend(OutPoint),

    #[error("transaction already exists")]
    TransactionDuplicate,

    #[error("transaction already in the pool")]
    AlreadyInPool,

    #[error("coinbase transactions cannot be added to the pool")]
    IneffectiveCoinbase,

    #[error("the signing programs do not match the program hashes of the transaction")]
    ProgramHashMismatch,

    #[error("program {hash} failed")]
    TransactionSignature {
        hash: Uint168,
        #[source]
        source: ProgramError,
    },

    #[error("sidechain proof of work is not signed by the on duty arbitrator")]
    SideChainPowConsensus,

    #[error("invalid evidence")]
    InvalidEvidence(#[from] EvidenceError),

    #[error("invalid producer: {0}")]
    InvalidProducer(&'static str),

    #[error("duplicated producer public key")]
    DuplicateProducerKey,

    #[error("duplicated producer nick name")]
    DuplicateNickName,

    #[error("producer public key unsigned")]
    ProducerUnsigned,

    #[error("producer is not registered")]
    UnknownProducer,

    #[error("rejected by the chain policy")]
    ChainPolicy(#[source] anyhow::Error),

    #[error("ledger failure")]
    Ledger(#[source] anyhow::Error),
}

impl TxError {
    pub fn category(&self) -> ErrorCategory {
        use TxError::*;

        match self {
            TransactionSize { .. }
            | InvalidInput(_)
            | InvalidOutput(_)
            | AssetPrecision { .. }
            | AttributeProgram(_)
            | TransactionPayload(_)
            | DuplicateSidechainHash(_) => ErrorCategory::Structural,

            UnknownReferredTx(_)
            | SidechainTxDuplicate(_)
            | SidechainTxConfirmed(_)
            | InvalidCrossChain(_)
            | UtxoLocked(_)
            | TransactionBalance { .. }
            | DestructionAddress
            | CoinbaseNotMature(_)
            | Ledger(_) => ErrorCategory::Referential,

            DoubleSpend(_)
            | TransactionDuplicate
            | AlreadyInPool
            | IneffectiveCoinbase
            | ProgramHashMismatch
            | TransactionSignature { .. }
            | SideChainPowConsensus
            | InvalidEvidence(_) => ErrorCategory::ConsensusSafety,

            InvalidProducer(_)
            | DuplicateProducerKey
            | DuplicateNickName
            | ProducerUnsigned
            | UnknownProducer
            | ChainPolicy(_) => ErrorCategory::Policy,
        }
    }
}
