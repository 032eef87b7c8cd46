mod common;

use common::*;
use ela_core::tx::{OutPoint, Payload};
use ela_core::Fixed64;
use ela_txpool::{TxError, TxPoolEvent};
use quickcheck::quickcheck;
use std::sync::Arc;

#[test]
fn transfer_is_admitted() {
    init_tracing();
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::random();
    let bob = Wallet::random();
    let funds = ledger.fund(alice.program_hash(), &[10_000]);

    let tx = transfer(&alice, &funds, 9_000, bob.program_hash());
    let entry = pool.admit(Arc::clone(&tx)).unwrap();

    assert_eq!(entry.hash, tx.hash());
    assert_eq!(entry.fee, Fixed64::new(1_000));
    assert_eq!(entry.size, tx.serialized_size());
    assert_eq!(pool.count(), 1);
    assert!(pool.contains(&tx.hash()));
    assert_eq!(pool.get(&tx.hash()).unwrap().tx, tx);
}

#[test]
fn second_spender_of_an_output_is_rejected() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::standard(1);
    let funds = ledger.fund(alice.program_hash(), &[10_000]);

    let first = transfer(&alice, &funds, 9_000, Wallet::standard(2).program_hash());
    let second = transfer(&alice, &funds, 8_000, Wallet::standard(3).program_hash());
    pool.admit(first.clone()).unwrap();

    assert!(matches!(
        pool.admit(second.clone()),
        Err(TxError::DoubleSpend(previous)) if previous == funds[0]
    ));
    assert_eq!(pool.count(), 1);
    assert!(pool.contains(&first.hash()));
    assert!(!pool.contains(&second.hash()));
}

#[test]
fn resubmission_is_a_duplicate() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::standard(1);
    let funds = ledger.fund(alice.program_hash(), &[10_000]);
    let tx = transfer(&alice, &funds, 9_000, Wallet::standard(2).program_hash());

    pool.admit(tx.clone()).unwrap();
    assert!(matches!(
        pool.admit(tx.clone()),
        Err(TxError::TransactionDuplicate)
    ));
    assert!(matches!(
        pool.maybe_accept(tx),
        Err(TxError::AlreadyInPool)
    ));
    assert_eq!(pool.count(), 1);
}

#[test]
fn confirmed_transaction_is_a_duplicate() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::standard(1);
    let funds = ledger.fund(alice.program_hash(), &[10_000]);
    let tx = transfer(&alice, &funds, 9_000, Wallet::standard(2).program_hash());

    ledger.confirm(tx.clone(), 10);
    assert!(matches!(pool.admit(tx), Err(TxError::TransactionDuplicate)));
    assert!(pool.snapshot().is_empty());
}

#[test]
fn coinbase_is_never_admitted() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let coinbase = Arc::new(coinbase(Wallet::standard(1).program_hash(), 0));

    assert!(matches!(
        pool.admit(coinbase.clone()),
        Err(TxError::IneffectiveCoinbase)
    ));
    assert!(matches!(
        pool.maybe_accept(coinbase),
        Err(TxError::IneffectiveCoinbase)
    ));
    assert_eq!(pool.count(), 0);
}

#[test]
fn fee_below_minimum_is_rejected() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::standard(1);
    let funds = ledger.fund(alice.program_hash(), &[10_000]);
    let tx = transfer(&alice, &funds, 9_901, Wallet::standard(2).program_hash());

    assert!(matches!(
        pool.admit(tx),
        Err(TxError::TransactionBalance { .. })
    ));
    assert_eq!(pool.count(), 0);
}

#[test]
fn unknown_output_is_rejected() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::standard(1);
    let missing = OutPoint::new(ela_core::Uint256::new([9; 32]), 3);
    let tx = transfer(&alice, &[missing], 9_000, Wallet::standard(2).program_hash());

    assert!(matches!(
        pool.admit(tx),
        Err(TxError::UnknownReferredTx(_))
    ));
}

#[test]
fn rejected_transaction_leaves_the_pool_untouched() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::standard(1);
    let funds = ledger.fund(alice.program_hash(), &[10_000, 10_000]);

    let accepted = transfer(&alice, &funds[..1], 9_000, Wallet::standard(2).program_hash());
    pool.admit(accepted).unwrap();
    let before = pool.snapshot();

    // the second input is free, the first one is not
    let rejected = transfer(&alice, &funds, 19_000, Wallet::standard(3).program_hash());
    assert!(matches!(pool.admit(rejected), Err(TxError::DoubleSpend(_))));

    // the free input was not reserved by the rejected transaction
    let free = transfer(&alice, &funds[1..], 9_000, Wallet::standard(4).program_hash());
    pool.admit(free).unwrap();
    assert_eq!(before.len(), 1);
    assert_eq!(pool.count(), 2);
}

#[test]
fn block_commit_evicts_confirmed_and_conflicting() {
    init_tracing();
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::standard(1);
    let funds = ledger.fund(alice.program_hash(), &[10_000, 10_000]);

    let t1 = transfer(&alice, &funds[..1], 9_000, Wallet::standard(2).program_hash());
    let t2 = transfer(&alice, &funds[1..], 9_000, Wallet::standard(3).program_hash());
    // never seen by the pool, spends the output reserved by t2
    let t3 = transfer(&alice, &funds[1..], 8_000, Wallet::standard(4).program_hash());
    pool.admit(t1.clone()).unwrap();
    pool.admit(t2.clone()).unwrap();

    let block = block(11, vec![t1.clone(), t3]);
    ledger.commit(&block);
    let evicted = pool.on_block_committed(&block);

    assert_eq!(evicted.len(), 2);
    assert!(pool.snapshot().is_empty());
    assert!(!pool.contains(&t1.hash()));
    assert!(!pool.contains(&t2.hash()));
}

#[test]
fn block_commit_keeps_unrelated_transactions() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::standard(1);
    let funds = ledger.fund(alice.program_hash(), &[10_000, 10_000, 10_000]);

    let t1 = transfer(&alice, &funds[..1], 9_000, Wallet::standard(2).program_hash());
    let t2 = transfer(&alice, &funds[1..2], 9_000, Wallet::standard(3).program_hash());
    pool.admit(t1.clone()).unwrap();
    pool.admit(t2.clone()).unwrap();

    let block = block(11, vec![t1]);
    ledger.commit(&block);
    pool.on_block_committed(&block);

    assert_eq!(pool.count(), 1);
    assert!(pool.contains(&t2.hash()));

    // t2 still holds its output
    let conflict = transfer(&alice, &funds[1..2], 8_000, Wallet::standard(4).program_hash());
    assert!(matches!(pool.admit(conflict), Err(TxError::DoubleSpend(_))));
    let unrelated = transfer(&alice, &funds[2..], 8_000, Wallet::standard(4).program_hash());
    pool.admit(unrelated).unwrap();
}

#[test]
fn remove_evicts_the_spenders() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::standard(1);
    let bob = Wallet::standard(2);
    let funds = ledger.fund(alice.program_hash(), &[10_000]);

    let parent = transfer(&alice, &funds, 9_000, bob.program_hash());
    pool.admit(parent.clone()).unwrap();
    // the parent outputs become resolvable by the ledger
    ledger.confirm(parent.clone(), 10);
    let child = transfer(
        &bob,
        &[OutPoint::new(parent.hash(), 0)],
        8_000,
        Wallet::standard(3).program_hash(),
    );
    pool.admit(child.clone()).unwrap();
    assert_eq!(pool.count(), 2);

    let evicted = pool.remove(&parent);
    let hashes: Vec<_> = evicted.iter().map(|entry| entry.hash).collect();
    assert_eq!(hashes, vec![parent.hash(), child.hash()]);
    assert_eq!(pool.count(), 0);
}

#[test]
fn remove_of_an_unknown_transaction_is_a_no_op() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::standard(1);
    let funds = ledger.fund(alice.program_hash(), &[10_000]);
    let tx = transfer(&alice, &funds, 9_000, Wallet::standard(2).program_hash());

    assert!(pool.remove(&tx).is_empty());
}

#[test]
fn snapshot_is_not_affected_by_later_admissions() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::standard(1);
    let funds = ledger.fund(alice.program_hash(), &[10_000, 10_000]);

    let t1 = transfer(&alice, &funds[..1], 9_000, Wallet::standard(2).program_hash());
    pool.admit(t1.clone()).unwrap();
    let snapshot = pool.snapshot();

    let t2 = transfer(&alice, &funds[1..], 9_000, Wallet::standard(3).program_hash());
    pool.admit(t2.clone()).unwrap();

    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.get(&t1.hash()).is_some());
    assert!(snapshot.get(&t2.hash()).is_none());
    assert_eq!(snapshot.transactions().next(), Some(&t1));
    assert_eq!(pool.snapshot().entries().count(), 2);
}

#[tokio::test]
async fn accepted_transactions_are_notified() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let mut events = pool.subscribe();
    let alice = Wallet::standard(1);
    let funds = ledger.fund(alice.program_hash(), &[10_000]);

    let rejected = transfer(&alice, &funds, 9_999, Wallet::standard(2).program_hash());
    assert!(pool.admit(rejected).is_err());
    let tx = transfer(&alice, &funds, 9_000, Wallet::standard(2).program_hash());
    pool.admit(tx.clone()).unwrap();

    let TxPoolEvent::TransactionAccepted(entry) = events.recv().await.unwrap();
    assert_eq!(entry.hash, tx.hash());
    assert!(events.try_recv().is_err());
}

#[test]
fn admission_without_subscriber() {
    let ledger = MockLedger::at_height(10);
    let pool = pool(&ledger);
    let alice = Wallet::standard(1);
    let funds = ledger.fund(alice.program_hash(), &[10_000]);

    let tx = transfer(&alice, &funds, 9_000, Wallet::standard(2).program_hash());
    assert!(pool.maybe_accept(tx).is_ok());
}

fn coinbase(miner: ela_core::Uint168, lock_time: u32) -> ela_core::tx::Transaction {
    let mut tx = unsigned(
        Payload::CoinBase(ela_core::tx::CoinBase {
            coinbase_data: b"miner".to_vec(),
        }),
        &[OutPoint::COINBASE],
        vec![output(3_000, FOUNDATION), output(7_000, miner)],
    );
    tx.lock_time = lock_time;
    tx.attributes.clear();
    tx
}

quickcheck! {
    fn fee_is_what_the_inputs_leave(extra: u32, paid: u16) -> bool {
        let ledger = MockLedger::at_height(10);
        let pool = pool(&ledger);
        let alice = Wallet::standard(1);
        let value = 1_000_000 + i64::from(extra);
        let fee = 100 + i64::from(paid);
        let funds = ledger.fund(alice.program_hash(), &[value]);

        let tx = transfer(&alice, &funds, value - fee, Wallet::standard(2).program_hash());
        match pool.admit(tx) {
            Ok(entry) => {
                entry.fee == Fixed64::new(fee)
                    && entry.fee_per_kb == Fixed64::new(fee * 1000 / entry.size as i64)
            }
            Err(_) => false,
        }
    }
}
