//! checks of a transaction on its own, without looking at the ledger

use crate::config::ChainParams;
use crate::error::TxError;
use ela_core::program::program_hash;
use ela_core::tx::{AttributeUsage, OutPoint, Payload, Transaction, TxType};
use ela_core::Fixed64;
use std::collections::HashSet;

/// check the structure of the transaction
///
/// `height` is the height of the block the transaction would be
/// included in. The checks are run in order, the first failing one is
/// reported.
#[tracing::instrument(level = "trace", skip(params, tx), fields(tx_type = ?tx.tx_type))]
pub fn check_sanity(params: &ChainParams, height: u32, tx: &Transaction) -> Result<(), TxError> {
    check_size(params, tx)?;
    check_inputs(tx)?;
    check_outputs(params, tx)?;
    check_asset_precision(params, tx)?;
    check_attributes_and_programs(tx)?;
    check_payload(params, tx)?;
    check_duplicate_sidechain_tx(tx)?;
    Ok(())
}

fn check_size(params: &ChainParams, tx: &Transaction) -> Result<(), TxError> {
    let size = tx.serialized_size();
    if size == 0 || size > params.max_block_size {
        return Err(TxError::TransactionSize {
            size,
            max: params.max_block_size,
        });
    }
    Ok(())
}

fn check_inputs(tx: &Transaction) -> Result<(), TxError> {
    if tx.is_coinbase() {
        return match tx.inputs.as_slice() {
            [input] if input.previous == OutPoint::COINBASE => Ok(()),
            [_] => Err(TxError::InvalidInput("invalid coinbase input")),
            _ => Err(TxError::InvalidInput("coinbase must have only one input")),
        };
    }

    if tx.tx_type.is_evidence() {
        if !tx.inputs.is_empty() {
            return Err(TxError::InvalidInput("evidence transactions must have no input"));
        }
        return Ok(());
    }

    if tx.inputs.is_empty() {
        return Err(TxError::InvalidInput("transaction has no inputs"));
    }

    let mut existing = HashSet::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        if input.previous == OutPoint::COINBASE {
            return Err(TxError::InvalidInput("invalid transaction input"));
        }
        if !existing.insert(input.refer_key()) {
            return Err(TxError::InvalidInput("duplicated transaction inputs"));
        }
    }
    Ok(())
}

fn check_outputs(params: &ChainParams, tx: &Transaction) -> Result<(), TxError> {
    if tx.outputs.len() > usize::from(u16::MAX) {
        return Err(TxError::InvalidOutput(
            "output count should not be greater than 65535",
        ));
    }

    if tx.is_coinbase() {
        return check_coinbase_outputs(params, tx);
    }

    if tx.tx_type.is_evidence() {
        if !tx.outputs.is_empty() {
            return Err(TxError::InvalidOutput(
                "evidence transactions must have no output",
            ));
        }
        return Ok(());
    }

    if tx.outputs.is_empty() {
        return Err(TxError::InvalidOutput("transaction has no outputs"));
    }
    for output in &tx.outputs {
        if output.asset_id != params.native_asset_id {
            return Err(TxError::InvalidOutput("asset id in output is invalid"));
        }
        if output.value.is_negative() {
            return Err(TxError::InvalidOutput("output value is negative"));
        }
    }
    Ok(())
}

fn check_coinbase_outputs(params: &ChainParams, tx: &Transaction) -> Result<(), TxError> {
    if tx.outputs.len() < 2 {
        return Err(TxError::InvalidOutput(
            "coinbase output is not enough, at least 2",
        ));
    }
    if tx.outputs[0].program_hash != params.foundation {
        return Err(TxError::InvalidOutput(
            "first coinbase output should pay the foundation",
        ));
    }
    if tx
        .outputs
        .iter()
        .any(|output| output.asset_id != params.native_asset_id)
    {
        return Err(TxError::InvalidOutput("asset id in coinbase is invalid"));
    }
    if tx.outputs.iter().any(|output| output.value.is_negative()) {
        return Err(TxError::InvalidOutput("output value is negative"));
    }

    let total = Fixed64::checked_sum(tx.outputs.iter().map(|output| output.value))
        .ok_or(TxError::InvalidOutput("coinbase reward overflow"))?;
    let foundation = tx.outputs[0].value;
    if i128::from(foundation.units()) * 100
        < i128::from(total.units()) * i128::from(params.foundation_reward_percent)
    {
        return Err(TxError::InvalidOutput(
            "reward to the foundation in coinbase is too low",
        ));
    }
    Ok(())
}

fn check_asset_precision(params: &ChainParams, tx: &Transaction) -> Result<(), TxError> {
    for output in &tx.outputs {
        // outputs only carry the native asset once the output check passed
        let precision = if output.asset_id == params.native_asset_id {
            params.native_asset_precision
        } else {
            return Err(TxError::AssetPrecision {
                asset: output.asset_id,
            });
        };
        if !output.value.is_multiple_of_precision(precision) {
            return Err(TxError::AssetPrecision {
                asset: output.asset_id,
            });
        }
    }
    Ok(())
}

fn check_attributes_and_programs(tx: &Transaction) -> Result<(), TxError> {
    match tx.tx_type {
        TxType::CoinBase => {
            if !tx.programs.is_empty() || !tx.attributes.is_empty() {
                return Err(TxError::AttributeProgram(
                    "coinbase transactions should have no attributes and programs",
                ));
            }
            return Ok(());
        }
        TxType::IllegalProposalEvidence | TxType::IllegalVoteEvidence => {
            if !tx.programs.is_empty() || !tx.attributes.is_empty() {
                return Err(TxError::AttributeProgram(
                    "illegal proposal and vote transactions should have no attributes and programs",
                ));
            }
            return Ok(());
        }
        TxType::IllegalBlockEvidence => {
            if tx.programs.len() != 1 {
                return Err(TxError::AttributeProgram(
                    "illegal block transactions should have one and only one program",
                ));
            }
            if !tx.attributes.is_empty() {
                return Err(TxError::AttributeProgram(
                    "illegal block transactions should have no attributes",
                ));
            }
        }
        _ => (),
    }

    check_attribute_usages(tx)?;

    if tx.programs.is_empty() {
        return Err(TxError::AttributeProgram("no programs found in transaction"));
    }
    for program in &tx.programs {
        if program_hash(&program.code).is_err() {
            return Err(TxError::AttributeProgram("invalid program code"));
        }
    }
    Ok(())
}

fn check_attribute_usages(tx: &Transaction) -> Result<(), TxError> {
    for attribute in &tx.attributes {
        if AttributeUsage::try_from(attribute.usage).is_err() {
            return Err(TxError::AttributeProgram("invalid attribute usage"));
        }
    }
    Ok(())
}

fn check_payload(params: &ChainParams, tx: &Transaction) -> Result<(), TxError> {
    if tx.payload.tx_type() != tx.tx_type {
        return Err(TxError::TransactionPayload(
            "payload does not match the transaction type",
        ));
    }

    if let Payload::RegisterAsset(register) = &tx.payload {
        let precision = register.asset.precision;
        if precision < params.min_asset_precision || precision > params.max_asset_precision {
            return Err(TxError::TransactionPayload("invalid asset precision"));
        }
        if !register.amount.is_multiple_of_precision(precision) {
            return Err(TxError::TransactionPayload(
                "asset amount out of the asset precision",
            ));
        }
    }
    Ok(())
}

fn check_duplicate_sidechain_tx(tx: &Transaction) -> Result<(), TxError> {
    let hashes = tx.side_chain_transaction_hashes();
    let mut existing = HashSet::with_capacity(hashes.len());
    for hash in hashes {
        if !existing.insert(hash) {
            return Err(TxError::DuplicateSidechainHash(*hash));
        }
    }
    Ok(())
}
