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

//! Best-effort snapshotting of the pool's transactions to disk, so a
//! restart doesn't have to rebuild the pool purely from network relay.
//! This is explicitly auxiliary: a missing or corrupt snapshot is logged
//! and ignored, never treated as a fatal error, and loaded entries are
//! replayed through ordinary admission rather than trusted directly.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use chain_primitives::Transaction;

use crate::error::PoolError;
use crate::pool::Mempool;
use crate::types::Chain;

/// On-disk snapshot format: just the raw transactions, in admission
/// order, so that on reload `add()` re-derives every derived field
/// (fee, size, sigops, ancestor rollups) rather than trusting stale
/// numbers.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
	transactions: Vec<Transaction>,
}

/// Write every entry currently held by `pool` to `path`, in `mempool.dat`
/// form. Errors are the caller's to log; this never panics on I/O
/// failure.
pub fn save<C: Chain>(pool: &Mempool<C>, path: &Path) -> Result<(), failure::Error> {
	let transactions: Vec<Transaction> = pool.iter().map(|(_, entry)| (*entry.tx).clone()).collect();
	let file = File::create(path)?;
	let writer = BufWriter::new(file);
	serde_json::to_writer(writer, &Snapshot { transactions })?;
	Ok(())
}

/// Load a snapshot from `path` and replay its transactions through
/// ordinary admission. Individual transactions that no longer admit
/// cleanly (already confirmed, now invalid, etc.) are skipped; this is
/// never treated as a hard failure of the load as a whole.
pub fn load<C: Chain>(pool: &mut Mempool<C>, path: &Path) -> Result<usize, failure::Error> {
	if !path.exists() {
		return Ok(0);
	}
	let file = File::open(path)?;
	let reader = BufReader::new(file);
	let snapshot: Snapshot = serde_json::from_reader(reader)?;

	let mut admitted = 0;
	for tx in snapshot.transactions {
		match pool.add(Arc::new(tx), -1) {
			Ok(()) => admitted += 1,
			Err(err) => log_skip(&err),
		}
	}
	Ok(admitted)
}

fn log_skip(err: &PoolError) {
	warn!("skipping snapshot transaction on reload: {}", err);
}

#[cfg(test)]
mod tests {
	use super::*;
	use chain_primitives::{Coin, Hash, OutPoint, TxIn, TxOut};
	use node_util::SystemClock;
	use std::collections::HashMap;
	use std::sync::Mutex;
	use tempfile::tempdir;

	use crate::types::{deployment, ChainTip, NetworkParams, PoolConfig};
	use crate::view::View;

	struct DummyChain {
		coins: Mutex<HashMap<OutPoint, Coin>>,
	}

	impl Chain for DummyChain {
		fn tip(&self) -> ChainTip {
			ChainTip {
				height: 100,
				median_time_past: 1_600_000_000,
			}
		}
		fn state(&self) -> u32 {
			deployment::WITNESS_ACTIVE | deployment::CSV_ACTIVE
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
			1000
		}
	}

	#[test]
	fn save_then_load_round_trips_admission() {
		let chain = Arc::new(DummyChain {
			coins: Mutex::new(HashMap::new()),
		});
		chain.coins.lock().unwrap().insert(
			OutPoint::new(Hash([1u8; 32]), 0),
			Coin::new(
				TxOut {
					value: 10_200,
					script_pubkey: vec![],
				},
				10,
				false,
			),
		);

		let mut pool = Mempool::new(
			PoolConfig::default(),
			chain.clone(),
			Arc::new(PermissiveParams),
			Arc::new(SystemClock),
		);
		let tx = Arc::new(Transaction {
			version: 1,
			inputs: vec![TxIn {
				previous_output: OutPoint::new(Hash([1u8; 32]), 0),
				script_sig: vec![],
				sequence: 0xffff_ffff,
				witness: vec![],
			}],
			outputs: vec![TxOut {
				value: 200,
				script_pubkey: vec![],
			}],
			lock_time: 0,
		});
		let txid = tx.txid();
		pool.add(tx, 0).unwrap();

		let dir = tempdir().unwrap();
		let path = dir.path().join("mempool.dat");
		save(&pool, &path).unwrap();

		let mut reloaded = Mempool::new(PoolConfig::default(), chain, Arc::new(PermissiveParams), Arc::new(SystemClock));
		let admitted = load(&mut reloaded, &path).unwrap();
		assert_eq!(admitted, 1);
		assert!(reloaded.has(&txid));
	}

	#[test]
	fn load_of_missing_file_is_a_noop() {
		let chain = Arc::new(DummyChain {
			coins: Mutex::new(HashMap::new()),
		});
		let mut pool = Mempool::new(PoolConfig::default(), chain, Arc::new(PermissiveParams), Arc::new(SystemClock));
		let admitted = load(&mut pool, Path::new("/nonexistent/mempool.dat")).unwrap();
		assert_eq!(admitted, 0);
	}
}
