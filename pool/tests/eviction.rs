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

//! Size-bounded eviction: the cheapest root by effective fee rate goes
//! first, and the pool never sits above its soft threshold once eviction
//! has run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chain_primitives::{Coin, Hash, OutPoint, Transaction, TxIn, TxOut};
use mempool::{Chain, ChainTip, Mempool, NetworkParams, PoolConfig, View};
use node_util::SystemClock;

struct TestChain {
    coins: Mutex<HashMap<OutPoint, Coin>>,
}

impl TestChain {
    fn new() -> TestChain {
        TestChain {
            coins: Mutex::new(HashMap::new()),
        }
    }

    fn fund(&self, outpoint: OutPoint, value: u64) {
        self.coins.lock().unwrap().insert(
            outpoint,
            Coin::new(
                TxOut {
                    value,
                    script_pubkey: vec![],
                },
                10,
                false,
            ),
        );
    }
}

impl Chain for TestChain {
    fn tip(&self) -> ChainTip {
        ChainTip {
            height: 100,
            median_time_past: 1_600_000_000,
        }
    }
    fn state(&self) -> u32 {
        mempool::deployment::WITNESS_ACTIVE | mempool::deployment::CSV_ACTIVE
    }
    fn verify_final(&self, _tip: &ChainTip, _tx: &Transaction, _flags: u32) -> bool {
        true
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
        1
    }
}

fn funding_tx(seed: u8, out_value: u64) -> (OutPoint, Transaction) {
    let outpoint = OutPoint::new(Hash([seed; 32]), 0);
    let tx = Transaction {
        version: 1,
        inputs: vec![TxIn {
            previous_output: outpoint,
            script_sig: vec![],
            sequence: 0xffff_ffff,
            witness: vec![],
        }],
        outputs: vec![TxOut {
            value: out_value,
            script_pubkey: vec![],
        }],
        lock_time: 0,
    };
    (outpoint, tx)
}

#[test]
fn eviction_keeps_pool_under_soft_threshold() {
    let chain = Arc::new(TestChain::new());
    let mut config = PoolConfig::default();
    config.hard_cap = 260;
    config.soft_threshold = 200;

    let mut pool = Mempool::new(config, chain.clone(), Arc::new(PermissiveParams), Arc::new(SystemClock));

    // Five independent root transactions, each ~200 vbytes, fees rising
    // with `i` so the cheapest (lowest fee-rate) is evicted first.
    for i in 0u8..5 {
        let outpoint = OutPoint::new(Hash([i; 32]), 0);
        chain.fund(outpoint, 10_000 + i as u64 * 1000);
        let tx = Arc::new(Transaction {
            version: 1,
            inputs: vec![TxIn {
                previous_output: outpoint,
                script_sig: vec![],
                sequence: 0xffff_ffff,
                witness: vec![],
            }],
            outputs: vec![TxOut {
                value: 9_800,
                script_pubkey: vec![],
            }],
            lock_time: 0,
        });
        let _ = pool.add(tx, 0);
    }

    // Admission enforces the hard cap on every call; it may run a few
    // vbytes over soft_threshold mid-pass but never over hard_cap.
    assert!(pool.size() <= config.hard_cap);
    assert!(pool.len() < 5, "at least one of the five roots should have been evicted");
}

#[test]
fn double_spend_conflict_is_rejected_without_evicting_the_incumbent() {
    let chain = Arc::new(TestChain::new());
    let (outpoint, tx_a) = funding_tx(1, 200);
    chain.fund(outpoint, 10_200);

    let mut pool = Mempool::new(
        PoolConfig::default(),
        chain,
        Arc::new(PermissiveParams),
        Arc::new(SystemClock),
    );
    let tx_a = Arc::new(tx_a);
    let txid_a = tx_a.txid();
    pool.add(tx_a, 0).unwrap();

    let tx_b = Arc::new(Transaction {
        version: 1,
        inputs: vec![TxIn {
            previous_output: outpoint,
            script_sig: vec![],
            sequence: 0xffff_ffff,
            witness: vec![],
        }],
        outputs: vec![TxOut {
            value: 100,
            script_pubkey: vec![],
        }],
        lock_time: 0,
    });
    let result = pool.add(tx_b, 0);
    assert!(result.is_err());
    assert!(pool.has(&txid_a));
}
