use ela_core::tx::{Input, Output, Transaction};
use ela_core::{Fixed64, Uint168, Uint256};
use std::sync::Arc;

/// the outputs referred by the inputs of a transaction, in the order of
/// the inputs.
pub type References = Vec<(Input, Output)>;

/// a block producer of the registry
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct RegisteredProducer {
    pub public_key: Vec<u8>,
    pub nick_name: String,
}

/// read only view of the confirmed chain
///
/// The pool calls it while holding its write lock: the implementation
/// has to answer from local state and never block on the network.
pub trait LedgerOracle: Send + Sync {
    /// height of the last committed block
    fn height(&self) -> u32;

    /// a transaction with this hash is already confirmed
    fn is_tx_hash_duplicate(&self, hash: &Uint256) -> bool;

    /// the sidechain transaction has already been withdrawn
    fn is_sidechain_tx_hash_duplicate(&self, hash: &Uint256) -> bool;

    /// resolve every input of the transaction, fails if any of the
    /// referred outputs is unknown or spent.
    fn tx_reference(&self, tx: &Transaction) -> anyhow::Result<References>;

    /// a confirmed transaction and the height of its block
    fn transaction(&self, hash: &Uint256) -> anyhow::Result<(Arc<Transaction>, u32)>;

    fn registered_producers(&self) -> Vec<RegisteredProducer>;

    /// public key of the arbitrator on duty for the next block
    fn on_duty_arbitrator(&self) -> Vec<u8>;

    fn check_output_program_hash(
        &self,
        _height: u32,
        _tx: &Transaction,
        _program_hash: &Uint168,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn check_output_payload(
        &self,
        _height: u32,
        _tx: &Transaction,
        _output: &Output,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn check_vote_producer_outputs(
        &self,
        _height: u32,
        _tx: &Transaction,
        _references: &References,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn check_coinbase_miner_reward(
        &self,
        _height: u32,
        _tx: &Transaction,
        _total_reward: Fixed64,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// the fee paid by the transaction in the given asset: what the
    /// references bring minus what the outputs take.
    fn tx_fee(
        &self,
        tx: &Transaction,
        references: &References,
        asset_id: &Uint256,
    ) -> anyhow::Result<Fixed64> {
        let inputs = Fixed64::checked_sum(
            references
                .iter()
                .filter(|(_, output)| &output.asset_id == asset_id)
                .map(|(_, output)| output.value),
        )
        .ok_or_else(|| anyhow::anyhow!("inputs value overflow"))?;
        let outputs = Fixed64::checked_sum(
            tx.outputs
                .iter()
                .filter(|output| &output.asset_id == asset_id)
                .map(|output| output.value),
        )
        .ok_or_else(|| anyhow::anyhow!("outputs value overflow"))?;

        inputs
            .checked_sub(outputs)
            .ok_or_else(|| anyhow::anyhow!("fee overflow"))
    }
}
