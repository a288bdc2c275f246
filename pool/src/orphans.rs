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

//! Orphan storage: transactions that parsed and passed standalone checks
//! but reference at least one parent the pool doesn't yet know about.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chain_primitives::{Hash, Transaction};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A stored orphan: the transaction, how many distinct parents are still
/// missing, and the caller tag it arrived with.
#[derive(Debug, Clone)]
pub struct OrphanEntry {
	pub tx: Arc<Transaction>,
	pub txid: Hash,
	pub missing: usize,
	pub id: i64,
}

/// Missing-parent tracking plus the waiting index that lets a single
/// parent's arrival wake every orphan blocked on it.
pub struct OrphanPool {
	orphans: HashMap<Hash, OrphanEntry>,
	/// missing parent txid -> set of orphan txids waiting on it
	waiting: HashMap<Hash, HashSet<Hash>>,
	max_orphans: usize,
	rng: StdRng,
}

impl OrphanPool {
	pub fn new(max_orphans: usize) -> OrphanPool {
		OrphanPool {
			orphans: HashMap::new(),
			waiting: HashMap::new(),
			max_orphans,
			rng: StdRng::from_entropy(),
		}
	}

	/// Build a pool with a fixed seed, so random-victim eviction is
	/// deterministic under test.
	pub fn with_seed(max_orphans: usize, seed: u64) -> OrphanPool {
		OrphanPool {
			orphans: HashMap::new(),
			waiting: HashMap::new(),
			max_orphans,
			rng: StdRng::seed_from_u64(seed),
		}
	}

	pub fn len(&self) -> usize {
		self.orphans.len()
	}

	pub fn is_empty(&self) -> bool {
		self.orphans.is_empty()
	}

	pub fn contains(&self, txid: &Hash) -> bool {
		self.orphans.contains_key(txid)
	}

	pub fn missing_count(&self, txid: &Hash) -> Option<usize> {
		self.orphans.get(txid).map(|o| o.missing)
	}

	/// Register `tx` as an orphan waiting on `missing_parents`, evicting
	/// a uniformly random existing orphan first if the cap would
	/// otherwise be exceeded.
	pub fn add_orphan(&mut self, tx: Arc<Transaction>, missing_parents: HashSet<Hash>, id: i64) {
		if self.orphans.len() >= self.max_orphans {
			self.evict_random();
		}

		let txid = tx.txid();
		let missing = missing_parents.len();
		for parent in &missing_parents {
			self.waiting.entry(*parent).or_insert_with(HashSet::new).insert(txid);
		}
		self.orphans.insert(
			txid,
			OrphanEntry {
				tx,
				txid,
				missing,
				id,
			},
		);
	}

	fn evict_random(&mut self) {
		if self.orphans.is_empty() {
			return;
		}
		let idx = self.rng.gen_range(0, self.orphans.len());
		let victim = self.orphans.keys().nth(idx).copied();
		if let Some(victim) = victim {
			self.remove_orphan(&victim);
		}
	}

	/// The arrival of `parent_txid` (now admitted) may satisfy zero or
	/// more orphans. Returns the txids of orphans whose missing-parent
	/// count just reached zero; they remain stored until the caller
	/// takes them via `take`.
	pub fn resolve_orphans(&mut self, parent_txid: Hash) -> Vec<Hash> {
		let waiters = match self.waiting.remove(&parent_txid) {
			Some(w) => w,
			None => return Vec::new(),
		};

		let mut candidates = Vec::new();
		for orphan_txid in waiters {
			if let Some(orphan) = self.orphans.get_mut(&orphan_txid) {
				if orphan.missing > 0 {
					orphan.missing -= 1;
				}
				if orphan.missing == 0 {
					candidates.push(orphan_txid);
				}
			}
		}
		candidates
	}

	/// Remove and return a resolved candidate so the caller can
	/// re-submit it through ordinary admission.
	pub fn take(&mut self, txid: &Hash) -> Option<OrphanEntry> {
		let orphan = self.orphans.remove(txid)?;
		self.unlink(txid);
		Some(orphan)
	}

	/// Destroy an orphan outright (cascaded removal, or eviction).
	pub fn remove_orphan(&mut self, txid: &Hash) -> Option<OrphanEntry> {
		let orphan = self.orphans.remove(txid)?;
		self.unlink(txid);
		Some(orphan)
	}

	fn unlink(&mut self, txid: &Hash) {
		let mut empty_parents = Vec::new();
		for (parent, set) in self.waiting.iter_mut() {
			set.remove(txid);
			if set.is_empty() {
				empty_parents.push(*parent);
			}
		}
		for parent in empty_parents {
			self.waiting.remove(&parent);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chain_primitives::{OutPoint, TxIn};

	fn tx_spending(parent: Hash) -> Transaction {
		Transaction {
			version: 1,
			inputs: vec![TxIn {
				previous_output: OutPoint::new(parent, 0),
				script_sig: vec![],
				sequence: 0xffff_ffff,
				witness: vec![],
			}],
			outputs: vec![],
			lock_time: 0,
		}
	}

	#[test]
	fn add_and_resolve_single_parent() {
		let mut pool = OrphanPool::with_seed(100, 1);
		let parent = Hash([9u8; 32]);
		let tx = Arc::new(tx_spending(parent));
		let txid = tx.txid();
		let mut missing = HashSet::new();
		missing.insert(parent);
		pool.add_orphan(tx, missing, 42);

		assert!(pool.contains(&txid));
		let candidates = pool.resolve_orphans(parent);
		assert_eq!(candidates, vec![txid]);

		let taken = pool.take(&txid).unwrap();
		assert_eq!(taken.id, 42);
		assert!(!pool.contains(&txid));
	}

	#[test]
	fn dedup_waiting_per_distinct_parent() {
		let mut pool = OrphanPool::with_seed(100, 1);
		let parent = Hash([9u8; 32]);
		// two inputs from the same missing parent still count as one wait
		let tx = Transaction {
			version: 1,
			inputs: vec![
				TxIn {
					previous_output: OutPoint::new(parent, 0),
					script_sig: vec![],
					sequence: 0xffff_ffff,
					witness: vec![],
				},
				TxIn {
					previous_output: OutPoint::new(parent, 1),
					script_sig: vec![],
					sequence: 0xffff_ffff,
					witness: vec![],
				},
			],
			outputs: vec![],
			lock_time: 0,
		};
		let mut missing = HashSet::new();
		missing.insert(parent);
		pool.add_orphan(Arc::new(tx), missing, 1);
		assert_eq!(pool.missing_count(&pool.orphans.keys().next().copied().unwrap()), Some(1));
	}

	#[test]
	fn cap_evicts_one_orphan() {
		let mut pool = OrphanPool::with_seed(2, 7);
		for i in 0..3u8 {
			let tx = Arc::new(tx_spending(Hash([i; 32])));
			let mut missing = HashSet::new();
			missing.insert(Hash([i; 32]));
			pool.add_orphan(tx, missing, 0);
		}
		assert_eq!(pool.len(), 2);
	}
}
