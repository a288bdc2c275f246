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

//! Ancestor traversal over the pool's implicit DAG. There are no
//! back-pointers: ancestors are reached by walking a transaction's
//! inputs and following any previous-txid that is itself in the pool,
//! deduplicating with a visited set as we go.

use std::collections::{HashMap, HashSet};

use chain_primitives::{Hash, Transaction};

use crate::entry::PoolEntry;

/// The transitive, deduplicated set of in-pool ancestors of `tx` (not
/// including `tx` itself, whether or not it's in `entries`). Traversal
/// aborts once `cap` distinct ancestors have been seen; callers use this
/// both to count (soft cap) and to bound the rollup walk.
pub fn ancestors_of_tx(entries: &HashMap<Hash, PoolEntry>, tx: &Transaction, cap: usize) -> HashSet<Hash> {
	let mut visited: HashSet<Hash> = HashSet::new();
	let mut stack: Vec<Hash> = tx
		.inputs
		.iter()
		.map(|i| i.previous_output.txid)
		.filter(|t| entries.contains_key(t))
		.collect();

	while let Some(txid) = stack.pop() {
		if visited.contains(&txid) {
			continue;
		}
		visited.insert(txid);
		if visited.len() >= cap {
			break;
		}
		if let Some(entry) = entries.get(&txid) {
			for input in &entry.tx.inputs {
				let parent = input.previous_output.txid;
				if entries.contains_key(&parent) && !visited.contains(&parent) {
					stack.push(parent);
				}
			}
		}
	}
	visited
}

/// Convenience wrapper when the starting point is already an entry in
/// the pool, keyed by its own txid.
pub fn ancestors_of_entry(entries: &HashMap<Hash, PoolEntry>, txid: &Hash, cap: usize) -> HashSet<Hash> {
	match entries.get(txid) {
		Some(entry) => ancestors_of_tx(entries, &entry.tx, cap),
		None => HashSet::new(),
	}
}
