#![allow(dead_code)]

use anyhow::{anyhow, bail};
use ela_core::program::{cross_chain_code, program_hash, signatures_parameter, standard_code};
use ela_core::signature::{Ed25519, Ed25519Keypair};
use ela_core::tx::{
    Attribute, AttributeUsage, Input, OutPoint, Output, Payload, Program, SideChainPow,
    Transaction, WithdrawFromSideChain,
};
use ela_core::{Block, BlockHeader, Fixed64, Uint168, Uint256};
use ela_txpool::{ChainParams, LedgerOracle, References, RegisteredProducer, TxPool};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

pub const NATIVE_ASSET: Uint256 = Uint256::new([0xa3; 32]);
pub const FOUNDATION: Uint168 = Uint168::new([0x12; 21]);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn params() -> ChainParams {
    ChainParams::new(NATIVE_ASSET, FOUNDATION)
}

/// owner of outputs: a standard or cross chain program and its keys
pub struct Wallet {
    keypairs: Vec<Ed25519Keypair>,
    code: Vec<u8>,
}

impl Wallet {
    pub fn standard(seed: u8) -> Self {
        let keypair = Ed25519Keypair::from_seed(&[seed; 32]);
        let code = standard_code(keypair.public_key());
        Self {
            keypairs: vec![keypair],
            code,
        }
    }

    pub fn random() -> Self {
        let keypair = Ed25519Keypair::from_seed(&rand::random());
        let code = standard_code(keypair.public_key());
        Self {
            keypairs: vec![keypair],
            code,
        }
    }

    /// an arbitrators controlled address of the given keys
    pub fn cross_chain(seeds: &[u8]) -> Self {
        let keypairs: Vec<_> = seeds
            .iter()
            .map(|seed| Ed25519Keypair::from_seed(&[*seed; 32]))
            .collect();
        let keys: Vec<_> = keypairs.iter().map(|k| *k.public_key()).collect();
        let code = cross_chain_code(keys.len() as u8, &keys).unwrap();
        Self { keypairs, code }
    }

    pub fn keypair(&self) -> &Ed25519Keypair {
        &self.keypairs[0]
    }

    pub fn program_hash(&self) -> Uint168 {
        program_hash(&self.code).unwrap()
    }

    pub fn program(&self, message: &[u8]) -> Program {
        let signatures: Vec<_> = self.keypairs.iter().map(|k| k.sign(message)).collect();
        Program {
            code: self.code.clone(),
            parameter: signatures_parameter(signatures.iter()),
        }
    }

    pub fn sign(&self, tx: &mut Transaction) {
        let message = tx.unsigned_bytes();
        tx.programs.push(self.program(&message));
    }
}

pub fn output(value: i64, owner: Uint168) -> Output {
    Output::new(NATIVE_ASSET, Fixed64::new(value), owner)
}

/// an unsigned transaction of the given type spending `inputs`
pub fn unsigned(payload: Payload, inputs: &[OutPoint], outputs: Vec<Output>) -> Transaction {
    Transaction {
        version: 0,
        tx_type: payload.tx_type(),
        payload_version: 0,
        payload,
        attributes: vec![Attribute::new(AttributeUsage::Nonce, b"nonce".to_vec())],
        inputs: inputs.iter().copied().map(Input::new).collect(),
        outputs,
        lock_time: 0,
        programs: vec![],
    }
}

/// a transfer from `from` paying `value` to `to`, signed by `from`
pub fn transfer(from: &Wallet, inputs: &[OutPoint], value: i64, to: Uint168) -> Arc<Transaction> {
    let mut tx = unsigned(Payload::TransferAsset, inputs, vec![output(value, to)]);
    from.sign(&mut tx);
    Arc::new(tx)
}

pub fn side_chain_pow(
    from: &Wallet,
    input: OutPoint,
    arbitrator: &Ed25519Keypair,
    genesis: Uint256,
    block_height: u32,
) -> Arc<Transaction> {
    let mut pow = SideChainPow {
        side_block_hash: Uint256::new([block_height as u8; 32]),
        side_genesis_hash: genesis,
        block_height,
        signed_data: vec![],
    };
    pow.signed_data = arbitrator.sign(&pow.signed_prefix()).to_vec();
    let mut tx = unsigned(
        Payload::SideChainPow(pow),
        &[input],
        vec![output(1_000, from.program_hash())],
    );
    from.sign(&mut tx);
    Arc::new(tx)
}

pub fn withdraw(
    from: &Wallet,
    input: OutPoint,
    sidechain_hashes: Vec<Uint256>,
    to: Uint168,
) -> Arc<Transaction> {
    let mut tx = unsigned(
        Payload::WithdrawFromSideChain(WithdrawFromSideChain {
            block_height: 100,
            genesis_block_address: "XKUh4GLhFJiqAMTF6HyWQrV9pK9HcGUdfJ".to_owned(),
            side_chain_transaction_hashes: sidechain_hashes,
        }),
        &[input],
        vec![output(1_000, to)],
    );
    from.sign(&mut tx);
    Arc::new(tx)
}

pub fn block(height: u32, transactions: Vec<Arc<Transaction>>) -> Block {
    Block {
        header: BlockHeader {
            version: 0,
            previous: Uint256::ZERO,
            merkle_root: Uint256::ZERO,
            timestamp: 0,
            height,
            nonce: 0,
        },
        transactions,
    }
}

#[derive(Default)]
struct LedgerState {
    height: u32,
    transactions: HashMap<Uint256, (Arc<Transaction>, u32)>,
    unspent: HashMap<OutPoint, Output>,
    sidechain: HashSet<Uint256>,
    producers: Vec<RegisteredProducer>,
    arbitrator: Vec<u8>,
    blocked: HashSet<Uint168>,
    max_reward: Option<Fixed64>,
}

impl LedgerState {
    fn confirm(&mut self, tx: Arc<Transaction>, height: u32) {
        let hash = tx.hash();
        for input in &tx.inputs {
            self.unspent.remove(&input.previous);
        }
        for (index, output) in tx.outputs.iter().enumerate() {
            self.unspent
                .insert(OutPoint::new(hash, index as u16), output.clone());
        }
        self.sidechain
            .extend(tx.side_chain_transaction_hashes().iter().copied());
        self.transactions.insert(hash, (tx, height));
    }
}

/// in memory chain
#[derive(Default)]
pub struct MockLedger {
    state: RwLock<LedgerState>,
}

impl MockLedger {
    pub fn at_height(height: u32) -> Arc<Self> {
        let ledger = Self::default();
        ledger.state.write().unwrap().height = height;
        Arc::new(ledger)
    }

    /// confirm a transaction funding `owner` with the given values,
    /// returns the out points of the new outputs
    pub fn fund(&self, owner: Uint168, values: &[i64]) -> Vec<OutPoint> {
        let mut state = self.state.write().unwrap();
        let nonce = state.transactions.len() as u64;
        let mut tx = unsigned(
            Payload::TransferAsset,
            &[OutPoint::new(Uint256::new([0xee; 32]), 0)],
            values.iter().map(|value| output(*value, owner)).collect(),
        );
        tx.attributes = vec![Attribute::new(
            AttributeUsage::Nonce,
            nonce.to_le_bytes().to_vec(),
        )];
        let tx = Arc::new(tx);
        let hash = tx.hash();
        let height = state.height;
        state.confirm(tx, height);
        (0..values.len())
            .map(|index| OutPoint::new(hash, index as u16))
            .collect()
    }

    /// confirm an already built transaction (a coinbase for example)
    pub fn confirm(&self, tx: Arc<Transaction>, height: u32) {
        self.state.write().unwrap().confirm(tx, height);
    }

    /// apply the block, the pool is reconciled separately
    pub fn commit(&self, block: &Block) {
        let mut state = self.state.write().unwrap();
        for tx in &block.transactions {
            state.confirm(Arc::clone(tx), block.height());
        }
        state.height = block.height();
    }

    pub fn set_height(&self, height: u32) {
        self.state.write().unwrap().height = height;
    }

    pub fn set_arbitrator(&self, public_key: &[u8]) {
        self.state.write().unwrap().arbitrator = public_key.to_vec();
    }

    pub fn register_producer(&self, public_key: &[u8], nick_name: &str) {
        self.state
            .write()
            .unwrap()
            .producers
            .push(RegisteredProducer {
                public_key: public_key.to_vec(),
                nick_name: nick_name.to_owned(),
            });
    }

    pub fn settle_sidechain_tx(&self, hash: Uint256) {
        self.state.write().unwrap().sidechain.insert(hash);
    }

    /// outputs paying this program hash are refused
    pub fn block_address(&self, program_hash: Uint168) {
        self.state.write().unwrap().blocked.insert(program_hash);
    }

    pub fn set_max_reward(&self, reward: Fixed64) {
        self.state.write().unwrap().max_reward = Some(reward);
    }
}

impl LedgerOracle for MockLedger {
    fn height(&self) -> u32 {
        self.state.read().unwrap().height
    }

    fn is_tx_hash_duplicate(&self, hash: &Uint256) -> bool {
        self.state.read().unwrap().transactions.contains_key(hash)
    }

    fn is_sidechain_tx_hash_duplicate(&self, hash: &Uint256) -> bool {
        self.state.read().unwrap().sidechain.contains(hash)
    }

    fn tx_reference(&self, tx: &Transaction) -> anyhow::Result<References> {
        let state = self.state.read().unwrap();
        tx.inputs
            .iter()
            .map(|input| {
                state
                    .unspent
                    .get(&input.previous)
                    .map(|output| (input.clone(), output.clone()))
                    .ok_or_else(|| anyhow!("unknown output {}", input.previous))
            })
            .collect()
    }

    fn transaction(&self, hash: &Uint256) -> anyhow::Result<(Arc<Transaction>, u32)> {
        match self.state.read().unwrap().transactions.get(hash) {
            Some((tx, height)) => Ok((Arc::clone(tx), *height)),
            None => bail!("unknown transaction {}", hash),
        }
    }

    fn registered_producers(&self) -> Vec<RegisteredProducer> {
        self.state.read().unwrap().producers.clone()
    }

    fn on_duty_arbitrator(&self) -> Vec<u8> {
        self.state.read().unwrap().arbitrator.clone()
    }

    fn check_output_program_hash(
        &self,
        _height: u32,
        _tx: &Transaction,
        program_hash: &Uint168,
    ) -> anyhow::Result<()> {
        if self.state.read().unwrap().blocked.contains(program_hash) {
            bail!("output to the blocked address {}", program_hash);
        }
        Ok(())
    }

    fn check_coinbase_miner_reward(
        &self,
        _height: u32,
        _tx: &Transaction,
        reward: Fixed64,
    ) -> anyhow::Result<()> {
        match self.state.read().unwrap().max_reward {
            Some(max) if reward > max => bail!("reward {} above {}", reward, max),
            _ => Ok(()),
        }
    }
}

pub fn pool(ledger: &Arc<MockLedger>) -> TxPool {
    let ledger: Arc<dyn LedgerOracle> = ledger.clone();
    TxPool::new(params(), ledger, Arc::new(Ed25519))
}
