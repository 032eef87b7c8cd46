use crate::config::ChainParams;
use crate::context::{check_context, check_side_chain_pow_signer, Context, Reservations};
use crate::error::TxError;
use crate::events::{Notifier, TxPoolEvent};
use crate::ledger::{LedgerOracle, References};
use crate::sanity::check_sanity;
use ela_core::critical_error;
use ela_core::tx::{OutPoint, Payload, Transaction};
use ela_core::{Block, Fixed64, SignatureVerifier, Uint256};
use imbl::{hashmap::Entry, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// a transaction admitted in the pool
#[derive(Debug, Clone)]
pub struct TxEntry {
    pub tx: Arc<Transaction>,
    pub hash: Uint256,
    /// fee paid in the native asset
    pub fee: Fixed64,
    pub fee_per_kb: Fixed64,
    /// size of the serialized transaction, in bytes
    pub size: usize,
}

/// `fee * 1000 / size`, rounded down
fn fee_per_kb(fee: Fixed64, size: usize) -> Fixed64 {
    let size = i128::try_from(size.max(1)).unwrap_or(i128::MAX);
    let per_kb = i128::from(fee.units()) * 1000 / size;
    Fixed64::new(i64::try_from(per_kb).unwrap_or(i64::MAX))
}

/// the three indices of the pool
///
/// * every transaction of `entries` is keyed by its own hash;
/// * an out point is reserved by at most one transaction of `entries`;
/// * a sidechain transaction hash is claimed by at most one withdraw
///   transaction of `entries`.
#[derive(Default, Clone)]
struct PoolState {
    entries: HashMap<Uint256, Arc<TxEntry>>,
    utxos: HashMap<OutPoint, Uint256>,
    sidechain: HashMap<Uint256, Uint256>,
}

/// the reservations seen by a transaction about to replace `replaced`
struct PoolReservations<'a> {
    state: &'a PoolState,
    replaced: &'a [Uint256],
}

impl<'a> Reservations for PoolReservations<'a> {
    fn reserved_by(&self, previous: &OutPoint) -> Option<Uint256> {
        self.state
            .utxos
            .get(previous)
            .copied()
            .filter(|holder| !self.replaced.contains(holder))
    }
}

impl PoolState {
    /// the side chain proofs of work of the pool the transaction supersedes
    fn pow_replacements(&self, tx: &Transaction) -> Vec<Uint256> {
        let genesis = match &tx.payload {
            Payload::SideChainPow(pow) => pow.side_genesis_hash,
            _ => return Vec::new(),
        };
        self.entries
            .values()
            .filter(|entry| {
                matches!(&entry.tx.payload, Payload::SideChainPow(pow) if pow.side_genesis_hash == genesis)
            })
            .map(|entry| entry.hash)
            .collect()
    }

    /// the checks against the pool indices, nothing is modified
    fn check_admission(
        &self,
        tx: &Transaction,
        hash: &Uint256,
        references: &References,
        replaced: &[Uint256],
    ) -> Result<(), TxError> {
        if self.entries.contains_key(hash) {
            return Err(TxError::TransactionDuplicate);
        }
        for sidechain_hash in tx.side_chain_transaction_hashes() {
            if self.sidechain.contains_key(sidechain_hash) {
                return Err(TxError::SidechainTxDuplicate(*sidechain_hash));
            }
        }
        let reservations = PoolReservations {
            state: self,
            replaced,
        };
        for (input, _) in references {
            if reservations.reserved_by(&input.previous).is_some() {
                return Err(TxError::DoubleSpend(input.previous));
            }
        }
        Ok(())
    }

    fn insert(&mut self, entry: Arc<TxEntry>, references: &References) -> Result<(), TxError> {
        let hash = entry.hash;
        match self.entries.entry(hash) {
            Entry::Occupied(_) => {
                let error = critical_error!("admitted transaction already in the pool");
                tracing::error!(%error, tx = %hash);
                return Err(TxError::TransactionDuplicate);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::clone(&entry));
            }
        }
        for (input, _) in references {
            self.utxos.insert(input.previous, hash);
        }
        for sidechain_hash in entry.tx.side_chain_transaction_hashes() {
            self.sidechain.insert(*sidechain_hash, hash);
        }
        Ok(())
    }

    /// remove the transaction and release everything it holds
    fn evict(&mut self, hash: &Uint256) -> Option<Arc<TxEntry>> {
        let entry = self.entries.remove(hash)?;
        for input in &entry.tx.inputs {
            if self.utxos.get(&input.previous) == Some(hash) {
                self.utxos.remove(&input.previous);
            }
        }
        for sidechain_hash in entry.tx.side_chain_transaction_hashes() {
            if self.sidechain.get(sidechain_hash) == Some(hash) {
                self.sidechain.remove(sidechain_hash);
            }
        }
        Some(entry)
    }
}

/// read only copy of the pool content, taken in constant time
#[derive(Clone)]
pub struct Snapshot {
    entries: HashMap<Uint256, Arc<TxEntry>>,
}

impl Snapshot {
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, hash: &Uint256) -> Option<&Arc<TxEntry>> {
        self.entries.get(hash)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Arc<TxEntry>> {
        self.entries.values()
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Arc<Transaction>> {
        self.entries.values().map(|entry| &entry.tx)
    }
}

/// the unconfirmed transactions
///
/// Admission and reconciliation take the write lock for their whole
/// duration, ledger queries included. The queries only take the read lock.
pub struct TxPool {
    params: ChainParams,
    ledger: Arc<dyn LedgerOracle>,
    verifier: Arc<dyn SignatureVerifier>,
    state: RwLock<PoolState>,
    notifier: Notifier,
}

impl TxPool {
    pub fn new(
        params: ChainParams,
        ledger: Arc<dyn LedgerOracle>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Self {
        let notifier = Notifier::new(params.notification_capacity);
        Self {
            params,
            ledger,
            verifier,
            state: RwLock::new(PoolState::default()),
            notifier,
        }
    }

    #[inline]
    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    fn read(&self) -> RwLockReadGuard<'_, PoolState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PoolState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// receive the events of the transactions accepted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TxPoolEvent> {
        self.notifier.subscribe()
    }

    /// validate the transaction and add it to the pool
    ///
    /// a rejected transaction leaves the pool untouched.
    pub fn admit(&self, tx: Arc<Transaction>) -> Result<Arc<TxEntry>, TxError> {
        let hash = tx.hash();
        let _span = tracing::info_span!("admit", tx = %hash, tx_type = ?tx.tx_type).entered();

        match self.admit_locked(tx, hash) {
            Ok(entry) => {
                debug!(fee = %entry.fee, size = entry.size, "transaction accepted");
                self.notifier
                    .notify(TxPoolEvent::TransactionAccepted(Arc::clone(&entry)));
                Ok(entry)
            }
            Err(error) => {
                warn!(%error, "transaction rejected");
                Err(error)
            }
        }
    }

    fn admit_locked(&self, tx: Arc<Transaction>, hash: Uint256) -> Result<Arc<TxEntry>, TxError> {
        let mut state = self.write();

        if tx.is_coinbase() {
            return Err(TxError::IneffectiveCoinbase);
        }

        let height = self.ledger.height().saturating_add(1);
        check_sanity(&self.params, height, &tx)?;

        let replaced = state.pow_replacements(&tx);
        let reservations = PoolReservations {
            state: &state,
            replaced: &replaced,
        };
        let context = Context {
            params: &self.params,
            ledger: self.ledger.as_ref(),
            verifier: self.verifier.as_ref(),
            reservations: &reservations,
        };
        let references = check_context(&context, height, &tx)?;

        state.check_admission(&tx, &hash, &references, &replaced)?;

        let size = tx.serialized_size();
        let fee = self
            .ledger
            .tx_fee(&tx, &references, &self.params.native_asset_id)
            .map_err(TxError::Ledger)?;
        let entry = Arc::new(TxEntry {
            tx,
            hash,
            fee,
            fee_per_kb: fee_per_kb(fee, size),
            size,
        });

        state.insert(Arc::clone(&entry), &references)?;
        for old in replaced {
            if state.evict(&old).is_some() {
                info!(replaced = %old, "replace side chain pow transaction");
            }
        }
        Ok(entry)
    }

    /// [`TxPool::admit`] the transaction unless it is already in the pool
    pub fn maybe_accept(&self, tx: Arc<Transaction>) -> Result<Arc<TxEntry>, TxError> {
        if self.contains(&tx.hash()) {
            return Err(TxError::AlreadyInPool);
        }
        if tx.is_coinbase() {
            return Err(TxError::IneffectiveCoinbase);
        }
        self.admit(tx)
    }

    pub fn contains(&self, hash: &Uint256) -> bool {
        self.read().entries.contains_key(hash)
    }

    pub fn get(&self, hash: &Uint256) -> Option<Arc<TxEntry>> {
        self.read().entries.get(hash).cloned()
    }

    pub fn count(&self) -> usize {
        self.read().entries.len()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entries: self.read().entries.clone(),
        }
    }

    /// the sidechain transaction is already claimed by a pool transaction
    pub fn is_duplicate_sidechain_tx(&self, sidechain_hash: &Uint256) -> bool {
        self.read().sidechain.contains_key(sidechain_hash)
    }

    /// remove the transaction and every pool transaction depending on
    /// its outputs, returns the evicted entries
    pub fn remove(&self, tx: &Transaction) -> Vec<Arc<TxEntry>> {
        let hash = tx.hash();
        let _span = tracing::debug_span!("remove", tx = %hash).entered();

        let mut state = self.write();
        let mut evicted = Vec::new();
        let mut pending = vec![(hash, tx.outputs.len())];

        if let Some(entry) = state.evict(&hash) {
            debug!(tx = %hash, "transaction removed");
            evicted.push(entry);
        }

        while let Some((parent, outputs)) = pending.pop() {
            for index in 0..outputs {
                let Ok(index) = u16::try_from(index) else {
                    break;
                };
                let spender = match state.utxos.get(&OutPoint::new(parent, index)) {
                    Some(spender) => *spender,
                    None => continue,
                };
                if let Some(entry) = state.evict(&spender) {
                    debug!(tx = %spender, %parent, "orphan transaction removed");
                    pending.push((spender, entry.tx.outputs.len()));
                    evicted.push(entry);
                }
            }
        }
        evicted
    }

    /// update the pool after the block has been committed to the ledger,
    /// returns the evicted entries
    pub fn on_block_committed(&self, block: &Block) -> Vec<Arc<TxEntry>> {
        let _span =
            tracing::info_span!("block_committed", height = block.height()).entered();

        let mut state = self.write();
        let before = state.entries.len();
        let mut evicted = Vec::new();

        for block_tx in block.transactions.iter().filter(|tx| !tx.is_coinbase()) {
            let block_hash = block_tx.hash();
            // evidences have no input to find them by
            if let Some(entry) = state.evict(&block_hash) {
                debug!(tx = %block_hash, "transaction confirmed");
                evicted.push(entry);
            }
            for input in &block_tx.inputs {
                let holder = match state.utxos.get(&input.previous) {
                    Some(holder) => *holder,
                    None => continue,
                };
                if let Some(entry) = state.evict(&holder) {
                    debug!(
                        tx = %holder,
                        block_tx = %block_hash,
                        input = %input.previous,
                        "double spent by a block transaction",
                    );
                    evicted.push(entry);
                }
            }
        }

        for block_tx in &block.transactions {
            for sidechain_hash in block_tx.side_chain_transaction_hashes() {
                let holder = match state.sidechain.get(sidechain_hash) {
                    Some(holder) => *holder,
                    None => continue,
                };
                if let Some(entry) = state.evict(&holder) {
                    debug!(tx = %holder, sidechain_tx = %sidechain_hash, "sidechain transaction settled");
                    evicted.push(entry);
                }
            }
        }

        let arbitrator = self.ledger.on_duty_arbitrator();
        let stale: Vec<Uint256> = state
            .entries
            .values()
            .filter(|entry| match &entry.tx.payload {
                Payload::SideChainPow(pow) => {
                    check_side_chain_pow_signer(pow, &arbitrator, self.verifier.as_ref()).is_err()
                }
                _ => false,
            })
            .map(|entry| entry.hash)
            .collect();
        for hash in stale {
            if let Some(entry) = state.evict(&hash) {
                debug!(tx = %hash, "side chain pow no longer signed by the on duty arbitrator");
                evicted.push(entry);
            }
        }

        debug!(
            block_txs = block.transactions.len(),
            before,
            evicted = evicted.len(),
            remains = state.entries.len(),
            "pool reconciled",
        );
        evicted
    }
}
