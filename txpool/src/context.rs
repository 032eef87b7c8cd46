//! checks of a transaction against the confirmed chain and the
//! transactions already reserved in the pool

use crate::config::ChainParams;
use crate::error::TxError;
use crate::ledger::{LedgerOracle, References};
use ela_core::program::{program_hash, run_program, standard_program_hash};
use ela_core::tx::{
    AttributeUsage, CancelProducer, OutPoint, Payload, ProducerInfo, Program, SideChainPow,
    Transaction, TransferCrossChainAsset, WithdrawFromSideChain, SEQUENCE_LOCKED_INPUT,
};
use ela_core::{Fixed64, SignatureVerifier, Uint168, Uint256, PREFIX_CROSS_CHAIN};
use std::collections::{BTreeSet, HashMap, HashSet};

/// the outputs already spent by transactions of the pool
pub trait Reservations {
    /// hash of the pool transaction spending the given output, if any
    fn reserved_by(&self, previous: &OutPoint) -> Option<Uint256>;
}

/// no transaction reserves anything, for checking a transaction
/// outside of any pool
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReservations;

impl Reservations for NoReservations {
    fn reserved_by(&self, _previous: &OutPoint) -> Option<Uint256> {
        None
    }
}

/// what the context checks consult
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub params: &'a ChainParams,
    pub ledger: &'a dyn LedgerOracle,
    pub verifier: &'a dyn SignatureVerifier,
    pub reservations: &'a dyn Reservations,
}

/// check the transaction against the ledger
///
/// `height` is the height of the block the transaction would be included
/// in. On success returns the outputs referred by the inputs, they are
/// what the pool reserves for the transaction.
#[tracing::instrument(level = "trace", skip(context, tx), fields(tx_type = ?tx.tx_type))]
pub fn check_context(
    context: &Context<'_>,
    height: u32,
    tx: &Transaction,
) -> Result<References, TxError> {
    let hash = tx.hash();
    let ledger = context.ledger;

    if ledger.is_tx_hash_duplicate(&hash) {
        return Err(TxError::TransactionDuplicate);
    }

    if tx.is_coinbase() {
        let total = Fixed64::checked_sum(tx.outputs.iter().map(|output| output.value))
            .ok_or(TxError::InvalidOutput("coinbase reward overflow"))?;
        ledger
            .check_coinbase_miner_reward(height, tx, total)
            .map_err(TxError::ChainPolicy)?;
        return Ok(References::new());
    }

    match &tx.payload {
        Payload::IllegalProposalEvidence(evidence) => {
            evidence.check(context.verifier)?;
            return Ok(References::new());
        }
        Payload::IllegalVoteEvidence(evidence) => {
            evidence.check(context.verifier)?;
            return Ok(References::new());
        }
        Payload::IllegalBlockEvidence(evidence) => {
            evidence.check()?;
            return Ok(References::new());
        }
        Payload::SideChainPow(pow) => check_side_chain_pow(pow, context)?,
        Payload::RegisterProducer(info) => check_register_producer(tx, info, ledger)?,
        Payload::CancelProducer(cancel) => check_cancel_producer(tx, cancel, ledger)?,
        Payload::UpdateProducer(info) => check_update_producer(tx, info, ledger)?,
        _ => (),
    }

    for input in &tx.inputs {
        match context.reservations.reserved_by(&input.previous) {
            Some(holder) if holder != hash => return Err(TxError::DoubleSpend(input.previous)),
            _ => (),
        }
    }

    let references = ledger
        .tx_reference(tx)
        .map_err(TxError::UnknownReferredTx)?;

    match &tx.payload {
        Payload::WithdrawFromSideChain(withdraw) => {
            check_withdraw_from_side_chain(withdraw, &references, ledger)?
        }
        Payload::TransferCrossChainAsset(transfer) => {
            check_transfer_cross_chain_asset(tx, transfer, &references, context.params)?
        }
        _ => (),
    }

    check_utxo_lock(tx, &references)?;
    check_fee(tx, &references, context.params)?;
    check_destruction_address(&references, context.params)?;
    check_signature(tx, &references, context.verifier)?;
    check_coinbase_maturity(tx, ledger, context.params)?;
    check_output_policies(height, tx, &references, ledger)?;

    Ok(references)
}

/// the proof of work has to be signed by the arbitrator currently on duty
pub fn check_side_chain_pow(pow: &SideChainPow, context: &Context<'_>) -> Result<(), TxError> {
    let arbitrator = context.ledger.on_duty_arbitrator();
    check_side_chain_pow_signer(pow, &arbitrator, context.verifier)
}

pub(crate) fn check_side_chain_pow_signer(
    pow: &SideChainPow,
    arbitrator: &[u8],
    verifier: &dyn SignatureVerifier,
) -> Result<(), TxError> {
    if verifier.verify(arbitrator, &pow.signed_prefix(), &pow.signed_data) {
        Ok(())
    } else {
        Err(TxError::SideChainPowConsensus)
    }
}

/// program hashes of the programs that signed the transaction
fn signing_program_hashes(tx: &Transaction) -> impl Iterator<Item = Uint168> + '_ {
    tx.programs
        .iter()
        .filter_map(|program| program_hash(&program.code).ok())
}

/// the producer key has to sign the transaction that manages it
fn check_signed_by_key(tx: &Transaction, public_key: &[u8]) -> Result<(), TxError> {
    let hash = standard_program_hash(public_key)
        .ok_or(TxError::InvalidProducer("invalid public key"))?;
    if signing_program_hashes(tx).any(|signer| signer == hash) {
        Ok(())
    } else {
        Err(TxError::ProducerUnsigned)
    }
}

fn check_producer_info(info: &ProducerInfo) -> Result<(), TxError> {
    if info.nick_name.is_empty() {
        return Err(TxError::InvalidProducer("invalid nick name"));
    }
    if info.url.is_empty() {
        return Err(TxError::InvalidProducer("invalid url"));
    }
    if info.net_address.is_empty() {
        return Err(TxError::InvalidProducer("invalid net address"));
    }
    Ok(())
}

fn check_register_producer(
    tx: &Transaction,
    info: &ProducerInfo,
    ledger: &dyn LedgerOracle,
) -> Result<(), TxError> {
    if standard_program_hash(&info.public_key).is_none() {
        return Err(TxError::InvalidProducer("invalid public key"));
    }
    if info.nick_name.is_empty() {
        return Err(TxError::InvalidProducer("invalid nick name"));
    }
    for producer in ledger.registered_producers() {
        if producer.public_key == info.public_key {
            return Err(TxError::DuplicateProducerKey);
        }
        if producer.nick_name == info.nick_name {
            return Err(TxError::DuplicateNickName);
        }
    }
    check_signed_by_key(tx, &info.public_key)?;
    check_producer_info(info)
}

fn check_cancel_producer(
    tx: &Transaction,
    cancel: &CancelProducer,
    ledger: &dyn LedgerOracle,
) -> Result<(), TxError> {
    check_signed_by_key(tx, &cancel.public_key)?;
    if ledger
        .registered_producers()
        .iter()
        .any(|producer| producer.public_key == cancel.public_key)
    {
        Ok(())
    } else {
        Err(TxError::UnknownProducer)
    }
}

fn check_update_producer(
    tx: &Transaction,
    info: &ProducerInfo,
    ledger: &dyn LedgerOracle,
) -> Result<(), TxError> {
    check_signed_by_key(tx, &info.public_key)?;
    check_producer_info(info)?;

    let producers = ledger.registered_producers();
    if !producers
        .iter()
        .any(|producer| producer.public_key == info.public_key)
    {
        return Err(TxError::UnknownProducer);
    }
    if producers
        .iter()
        .any(|producer| producer.public_key != info.public_key && producer.nick_name == info.nick_name)
    {
        return Err(TxError::DuplicateNickName);
    }
    Ok(())
}

fn check_withdraw_from_side_chain(
    withdraw: &WithdrawFromSideChain,
    references: &References,
    ledger: &dyn LedgerOracle,
) -> Result<(), TxError> {
    for hash in &withdraw.side_chain_transaction_hashes {
        if ledger.is_sidechain_tx_hash_duplicate(hash) {
            return Err(TxError::SidechainTxConfirmed(*hash));
        }
    }
    if references
        .iter()
        .any(|(_, output)| output.program_hash.prefix() != PREFIX_CROSS_CHAIN)
    {
        return Err(TxError::InvalidCrossChain(
            "withdraw inputs should be cross chain addresses",
        ));
    }
    Ok(())
}

fn check_transfer_cross_chain_asset(
    tx: &Transaction,
    transfer: &TransferCrossChainAsset,
    references: &References,
    params: &ChainParams,
) -> Result<(), TxError> {
    let count = transfer.cross_chain_addresses.len();
    if count == 0
        || count > tx.outputs.len()
        || count != transfer.cross_chain_amounts.len()
        || count != transfer.output_indexes.len()
    {
        return Err(TxError::InvalidCrossChain("invalid transaction payload content"));
    }

    let mut indexes = HashSet::with_capacity(count);
    for &index in &transfer.output_indexes {
        if !indexes.insert(index) || index >= tx.outputs.len() as u64 {
            return Err(TxError::InvalidCrossChain("invalid cross chain output index"));
        }
    }

    let fee = params.min_cross_chain_tx_fee;
    for ((address, &index), &amount) in transfer
        .cross_chain_addresses
        .iter()
        .zip(&transfer.output_indexes)
        .zip(&transfer.cross_chain_amounts)
    {
        let output = &tx.outputs[index as usize];
        if output.program_hash.prefix() != PREFIX_CROSS_CHAIN {
            return Err(TxError::InvalidCrossChain(
                "cross chain output should be a cross chain address",
            ));
        }
        if address.is_empty() {
            return Err(TxError::InvalidCrossChain("invalid cross chain address"));
        }
        let max = output
            .value
            .checked_sub(fee)
            .ok_or(TxError::InvalidCrossChain("invalid cross chain amount"))?;
        if amount.is_negative() || amount > max {
            return Err(TxError::InvalidCrossChain("invalid cross chain amount"));
        }
    }

    let (inputs, outputs) = totals(tx, references)?;
    match inputs.checked_sub(outputs) {
        Some(paid) if paid >= fee => Ok(()),
        _ => Err(TxError::InvalidCrossChain("cross chain transaction fee not enough")),
    }
}

fn totals(tx: &Transaction, references: &References) -> Result<(Fixed64, Fixed64), TxError> {
    let inputs = Fixed64::checked_sum(references.iter().map(|(_, output)| output.value))
        .ok_or(TxError::InvalidInput("inputs value overflow"))?;
    let outputs = Fixed64::checked_sum(tx.outputs.iter().map(|output| output.value))
        .ok_or(TxError::InvalidOutput("outputs value overflow"))?;
    Ok((inputs, outputs))
}

fn check_utxo_lock(tx: &Transaction, references: &References) -> Result<(), TxError> {
    for (input, output) in references {
        if output.output_lock == 0 {
            continue;
        }
        if input.sequence != SEQUENCE_LOCKED_INPUT {
            return Err(TxError::UtxoLocked("invalid input sequence"));
        }
        if tx.lock_time < output.output_lock {
            return Err(TxError::UtxoLocked("UTXO output locked"));
        }
    }
    Ok(())
}

fn check_fee(tx: &Transaction, references: &References, params: &ChainParams) -> Result<(), TxError> {
    let (inputs, outputs) = totals(tx, references)?;
    let required = outputs.checked_add(params.min_tx_fee);
    match required {
        Some(required) if inputs >= required => Ok(()),
        _ => Err(TxError::TransactionBalance {
            inputs,
            outputs,
            min_fee: params.min_tx_fee,
        }),
    }
}

fn check_destruction_address(references: &References, params: &ChainParams) -> Result<(), TxError> {
    if references
        .iter()
        .any(|(_, output)| output.program_hash == params.destruction_address)
    {
        Err(TxError::DestructionAddress)
    } else {
        Ok(())
    }
}

/// every program hash that has to sign: the owners of the spent outputs
/// and the script attributes.
fn obligated_program_hashes(
    tx: &Transaction,
    references: &References,
) -> Result<BTreeSet<Uint168>, TxError> {
    let mut hashes: BTreeSet<Uint168> = references
        .iter()
        .map(|(_, output)| output.program_hash)
        .collect();
    for attribute in &tx.attributes {
        if attribute.usage == AttributeUsage::Script as u8 {
            let hash = Uint168::from_slice(&attribute.data)
                .map_err(|_| TxError::AttributeProgram("invalid script attribute"))?;
            hashes.insert(hash);
        }
    }
    Ok(hashes)
}

fn check_signature(
    tx: &Transaction,
    references: &References,
    verifier: &dyn SignatureVerifier,
) -> Result<(), TxError> {
    let hashes = obligated_program_hashes(tx, references)?;

    let mut programs: Vec<(Uint168, &Program)> = tx
        .programs
        .iter()
        .map(|program| {
            program_hash(&program.code)
                .map(|hash| (hash, program))
                .map_err(|_| TxError::ProgramHashMismatch)
        })
        .collect::<Result<_, _>>()?;
    programs.sort_by(|(a, _), (b, _)| a.cmp(b));

    if hashes.len() != programs.len()
        || hashes
            .iter()
            .zip(&programs)
            .any(|(expected, (hash, _))| expected != hash)
    {
        return Err(TxError::ProgramHashMismatch);
    }

    let message = tx.unsigned_bytes();
    for (hash, program) in programs {
        run_program(program, &message, verifier)
            .map_err(|source| TxError::TransactionSignature { hash, source })?;
    }
    Ok(())
}

/// outputs of a coinbase can only be spent once the coinbase is deep
/// enough in the chain
fn check_coinbase_maturity(
    tx: &Transaction,
    ledger: &dyn LedgerOracle,
    params: &ChainParams,
) -> Result<(), TxError> {
    let current = ledger.height();
    let mut lock_heights: HashMap<Uint256, Option<u32>> = HashMap::new();

    for input in &tx.inputs {
        let referred = input.previous.tx_id;
        let lock_height = match lock_heights.get(&referred) {
            Some(lock_height) => *lock_height,
            None => {
                let (previous, confirmed_at) = ledger
                    .transaction(&referred)
                    .map_err(TxError::UnknownReferredTx)?;
                let lock_height = previous.is_coinbase().then(|| {
                    if previous.lock_time != 0 {
                        previous.lock_time
                    } else {
                        confirmed_at
                    }
                });
                lock_heights.insert(referred, lock_height);
                lock_height
            }
        };

        if let Some(lock_height) = lock_height {
            if current.saturating_sub(lock_height) < params.coinbase_maturity {
                return Err(TxError::CoinbaseNotMature(referred));
            }
        }
    }
    Ok(())
}

fn check_output_policies(
    height: u32,
    tx: &Transaction,
    references: &References,
    ledger: &dyn LedgerOracle,
) -> Result<(), TxError> {
    for output in &tx.outputs {
        ledger
            .check_output_program_hash(height, tx, &output.program_hash)
            .map_err(TxError::ChainPolicy)?;
        ledger
            .check_output_payload(height, tx, output)
            .map_err(TxError::ChainPolicy)?;
    }
    ledger
        .check_vote_producer_outputs(height, tx, references)
        .map_err(TxError::ChainPolicy)
}
