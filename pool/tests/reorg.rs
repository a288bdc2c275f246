// Copyright 2019 The Grin Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end coverage of block connect/disconnect reconciliation and
//! the chain-triggered reorg sweep, driven through a plain in-memory
//! `Chain` double rather than a real chain store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chain_primitives::{Block, BlockHeader, Coin, Hash, OutPoint, Transaction, TxIn, TxOut, ZERO_HASH};
use mempool::{Chain, ChainTip, Mempool, NetworkParams, PoolConfig, View};
use node_util::SystemClock;

struct TestChain {
    coins: Mutex<HashMap<OutPoint, Coin>>,
    height: Mutex<u32>,
    final_override: Mutex<Option<Hash>>,
}

impl TestChain {
    fn new(height: u32) -> TestChain {
        TestChain {
            coins: Mutex::new(HashMap::new()),
            height: Mutex::new(height),
            final_override: Mutex::new(None),
        }
    }

    fn fund(&self, outpoint: OutPoint, value: u64, coin_height: u32, coinbase: bool) {
        self.coins.lock().unwrap().insert(
            outpoint,
            Coin::new(
                TxOut {
                    value,
                    script_pubkey: vec![],
                },
                coin_height,
                coinbase,
            ),
        );
    }

    fn bump_height(&self, new_height: u32) {
        *self.height.lock().unwrap() = new_height;
    }

    fn mark_non_final(&self, txid: Hash) {
        *self.final_override.lock().unwrap() = Some(txid);
    }
}

impl Chain for TestChain {
    fn tip(&self) -> ChainTip {
        ChainTip {
            height: *self.height.lock().unwrap(),
            median_time_past: 1_600_000_000,
        }
    }

    fn state(&self) -> u32 {
        mempool::deployment::WITNESS_ACTIVE | mempool::deployment::CSV_ACTIVE
    }

    fn verify_final(&self, _tip: &ChainTip, tx: &Transaction, _flags: u32) -> bool {
        match *self.final_override.lock().unwrap() {
            Some(h) => tx.txid() != h,
            None => true,
        }
    }

    fn verify_locks(&self, _tip: &ChainTip, _tx: &Transaction, _view: &View, _flags: u32) -> bool {
        true
    }

    fn has_coins(&self, _tx: &Transaction) -> bool {
        false
    }

    fn get_coins(&self, view: &mut View, tx: &Transaction) {
        let coins = self.coins.lock().unwrap();
        for input in &tx.inputs {
            if let Some(coin) = coins.get(&input.previous_output) {
                view.insert(input.previous_output, coin.clone());
            }
        }
    }

    fn verify_scripts(&self, _tx: &Transaction, _view: &View, _flags: u32) -> Result<(), ()> {
        Ok(())
    }
}

struct PermissiveParams;
impl NetworkParams for PermissiveParams {
    fn require_standard(&self) -> bool {
        false
    }
    fn min_relay(&self) -> u64 {
        1000
    }
}

fn simple_tx(input: OutPoint, out_value: u64) -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![TxIn {
            previous_output: input,
            script_sig: vec![],
            sequence: 0xffff_ffff,
            witness: vec![],
        }],
        outputs: vec![TxOut {
            value: out_value,
            script_pubkey: vec![],
        }],
        lock_time: 0,
    }
}

fn empty_block(height: u32, transactions: Vec<Transaction>) -> Block {
    Block {
        header: BlockHeader {
            version: 1,
            prev_hash: ZERO_HASH,
            merkle_root: ZERO_HASH,
            time: 0,
            bits: 0,
            nonce: 0,
            height,
        },
        transactions,
    }
}

#[test]
fn add_block_then_remove_block_restores_entry() {
    let chain = Arc::new(TestChain::new(100));
    chain.fund(OutPoint::new(Hash([1u8; 32]), 0), 10_200, 10, false);

    let mut pool = Mempool::new(
        PoolConfig::default(),
        chain.clone(),
        Arc::new(PermissiveParams),
        Arc::new(SystemClock),
    );
    let tx = Arc::new(simple_tx(OutPoint::new(Hash([1u8; 32]), 0), 200));
    let txid = tx.txid();
    pool.add(tx.clone(), 0).unwrap();
    assert!(pool.has(&txid));

    let block = empty_block(101, vec![(*tx).clone()]);
    pool.add_block(&block);
    assert!(!pool.has(&txid));

    pool.remove_block(&block);
    assert!(pool.has(&txid));
}

#[test]
fn handle_reorg_evicts_entries_no_longer_final() {
    let chain = Arc::new(TestChain::new(100));
    chain.fund(OutPoint::new(Hash([1u8; 32]), 0), 10_200, 10, false);

    let mut pool = Mempool::new(
        PoolConfig::default(),
        chain.clone(),
        Arc::new(PermissiveParams),
        Arc::new(SystemClock),
    );
    let tx = Arc::new(simple_tx(OutPoint::new(Hash([1u8; 32]), 0), 200));
    let txid = tx.txid();
    pool.add(tx, 0).unwrap();
    assert!(pool.has(&txid));

    chain.mark_non_final(txid);
    pool.handle_reorg();
    assert!(!pool.has(&txid));
}

#[test]
fn orphan_cascade_resolves_two_levels() {
    let chain = Arc::new(TestChain::new(100));
    chain.fund(OutPoint::new(Hash([7u8; 32]), 0), 10_200, 10, false);

    let mut pool = Mempool::new(
        PoolConfig::default(),
        chain,
        Arc::new(PermissiveParams),
        Arc::new(SystemClock),
    );

    let grandparent = Arc::new(simple_tx(OutPoint::new(Hash([7u8; 32]), 0), 9_000));
    let parent = Arc::new(simple_tx(OutPoint::new(grandparent.txid(), 0), 4_000));
    let child = Arc::new(simple_tx(OutPoint::new(parent.txid(), 0), 1_000));

    let parent_txid = parent.txid();
    let child_txid = child.txid();
    let grandparent_txid = grandparent.txid();

    // Submit child and parent before the grandparent exists anywhere;
    // both should sit as orphans.
    assert!(pool.add(child, 1).is_ok());
    assert!(pool.add(parent, 2).is_ok());
    assert_eq!(pool.orphans_len(), 2);
    assert_eq!(pool.len(), 0);

    // Submitting the grandparent resolves the whole chain in one call.
    pool.add(grandparent, 0).unwrap();
    assert!(pool.has(&grandparent_txid));
    assert!(pool.has(&parent_txid));
    assert!(pool.has(&child_txid));
    assert_eq!(pool.orphans_len(), 0);
}
