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

//! The transaction pool itself: the admission pipeline, the entry and
//! spender indexes, fee rollups, eviction, and reorg reconciliation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use chain_primitives::{Block, Coin, Hash, OutPoint, Transaction};
use node_util::Clock;

use crate::entry::PoolEntry;
use crate::error::PoolError;
use crate::graph;
use crate::orphans::OrphanPool;
use crate::reject_filter::RejectFilter;
use crate::types::{deployment, Chain, NetworkParams, NoopListener, PoolConfig, PoolListener};
use crate::verify;
use crate::view::View;

const MAX_MONEY: u64 = 21_000_000 * 100_000_000;
const SEQUENCE_LOCKTIME_DISABLE_FLAG: u32 = 1 << 31;
const MAX_BIP125_RBF_SEQUENCE: u32 = 0xffff_fffd;

/// The in-memory pool of unconfirmed, validated transactions sitting
/// between the p2p network and the block template builder.
pub struct Mempool<C: Chain> {
	config: PoolConfig,
	chain: Arc<C>,
	params: Arc<dyn NetworkParams>,
	clock: Arc<dyn Clock>,
	listener: Arc<dyn PoolListener>,
	entries: HashMap<Hash, PoolEntry>,
	spender_index: HashMap<OutPoint, Hash>,
	orphans: OrphanPool,
	reject_filter: RejectFilter,
	size: u64,
}

impl<C: Chain> Mempool<C> {
	pub fn new(
		config: PoolConfig,
		chain: Arc<C>,
		params: Arc<dyn NetworkParams>,
		clock: Arc<dyn Clock>,
	) -> Mempool<C> {
		Mempool::with_listener(config, chain, params, clock, Arc::new(NoopListener))
	}

	pub fn with_listener(
		config: PoolConfig,
		chain: Arc<C>,
		params: Arc<dyn NetworkParams>,
		clock: Arc<dyn Clock>,
		listener: Arc<dyn PoolListener>,
	) -> Mempool<C> {
		let max_orphans = config.max_orphans;
		Mempool {
			config,
			chain,
			params,
			clock,
			listener,
			entries: HashMap::new(),
			spender_index: HashMap::new(),
			orphans: OrphanPool::new(max_orphans),
			reject_filter: RejectFilter::new(),
			size: 0,
		}
	}

	/// Build a pool whose orphan-eviction RNG is seeded, for deterministic
	/// tests.
	pub fn with_seed(
		config: PoolConfig,
		chain: Arc<C>,
		params: Arc<dyn NetworkParams>,
		clock: Arc<dyn Clock>,
		listener: Arc<dyn PoolListener>,
		seed: u64,
	) -> Mempool<C> {
		let mut pool = Mempool::with_listener(config, chain, params, clock, listener);
		pool.orphans = OrphanPool::with_seed(pool.config.max_orphans, seed);
		pool
	}

	// ---- queries -----------------------------------------------------

	pub fn size(&self) -> u64 {
		self.size
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn has(&self, txid: &Hash) -> bool {
		self.entries.contains_key(txid)
	}

	pub fn get(&self, txid: &Hash) -> Option<&PoolEntry> {
		self.entries.get(txid)
	}

	pub fn orphans_len(&self) -> usize {
		self.orphans.len()
	}

	pub fn is_orphan(&self, txid: &Hash) -> bool {
		self.orphans.contains(txid)
	}

	/// Missing-parent count for a still-stored orphan, if any.
	pub fn missing(&self, txid: &Hash) -> Option<usize> {
		self.orphans.missing_count(txid)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Hash, &PoolEntry)> {
		self.entries.iter()
	}

	// ---- admission -----------------------------------------------------

	/// Submit `tx`, tagged with caller-origin `id` (e.g. source peer),
	/// for admission. On success, cascades through any orphans that were
	/// waiting on this transaction's txid as a parent.
	pub fn add(&mut self, tx: Arc<Transaction>, id: i64) -> Result<(), PoolError> {
		let txid = tx.txid();
		let result = self.add_inner(tx, id);
		match &result {
			Ok(()) => self.cascade_resolve(txid),
			Err(err) => {
				if should_reject_cache(err) {
					self.reject_filter.insert(&txid);
				}
				warn!("tx {} rejected: {} (score {})", txid, err, err.score());
			}
		}
		result.map_err(unwrap_policy_only)
	}

	fn add_inner(&mut self, tx: Arc<Transaction>, id: i64) -> Result<(), PoolError> {
		// 1. Sanity.
		sanity_check(&tx)?;

		// 2. Coinbase rejection.
		if tx.is_coinbase() {
			return Err(PoolError::Coinbase);
		}

		let tip = self.chain.tip();
		let state = self.chain.state();

		// 3. Soft-fork gating.
		if state & deployment::WITNESS_ACTIVE == 0 && tx.has_witness() {
			return Err(PoolError::PrematureWitness);
		}
		if state & deployment::CSV_ACTIVE == 0 && tx.version >= 2 && self.params.require_standard() {
			return Err(PoolError::PrematureCsv);
		}

		// 4. Standardness.
		if self.params.require_standard() {
			self.standardness_check(&tx)?;
		}

		// 5. Finality.
		if !self.chain.verify_final(&tip, &tx, state) {
			return Err(PoolError::Finality);
		}

		// 6. Dedup.
		let txid = tx.txid();
		if self.entries.contains_key(&txid) || self.orphans.contains(&txid) {
			return Err(PoolError::TxInMempool);
		}
		if self.chain.has_coins(&tx) {
			return Err(PoolError::TxKnown);
		}

		// 7. Double-spend.
		for input in &tx.inputs {
			if self.spender_index.contains_key(&input.previous_output) {
				if signals_rbf(&tx) {
					return Err(PoolError::Replacement);
				}
				return Err(PoolError::InputsSpent);
			}
		}

		// 8. View build.
		let view = self.build_view(&tx);
		let mut missing_parents: HashSet<Hash> = HashSet::new();
		for input in &tx.inputs {
			if !view.contains(&input.previous_output) {
				missing_parents.insert(input.previous_output.txid);
			}
		}
		if !missing_parents.is_empty() {
			for parent in &missing_parents {
				if self.reject_filter.contains(parent) {
					return Err(PoolError::Duplicate);
				}
				if self.entries.contains_key(parent) {
					return Err(PoolError::InputsMissing);
				}
			}
			if tx.weight() > self.config.max_tx_weight {
				return Err(PoolError::TxWeight(tx.weight()));
			}
			self.orphans.add_orphan(tx, missing_parents, id);
			return Ok(());
		}

		// 9. Contextual input check.
		let mut total_in: u64 = 0;
		let mut coinbase_spend = false;
		for input in &tx.inputs {
			let coin = view.get(&input.previous_output).expect("resolved by view build");
			if coin.is_coinbase {
				coinbase_spend = true;
				if tip.height < coin.height + self.config.coinbase_maturity {
					return Err(PoolError::Sanity("spends an immature coinbase output".into()));
				}
			}
			total_in = total_in.saturating_add(coin.output.value);
		}
		let total_out: u64 = tx.outputs.iter().map(|o| o.value).sum();
		if total_out > total_in {
			return Err(PoolError::Sanity("output value exceeds input value".into()));
		}
		let fee = total_in - total_out;

		// 10. Entry construction.
		let sigops = tx.legacy_sigop_count();
		let raw_size = tx.vsize();
		let size = raw_size.max(sigops * self.config.bytes_per_sigop);
		let locks = tx.version >= 2
			&& tx
				.inputs
				.iter()
				.any(|i| i.sequence & SEQUENCE_LOCKTIME_DISABLE_FLAG == 0);
		let time = self.clock.now();
		let entry = PoolEntry::new(tx.clone(), tip.height, size, sigops, fee, time, coinbase_spend, locks);

		// 11. Contextual verification.
		let ancestors = graph::ancestors_of_tx(&self.entries, &tx, self.config.max_ancestors + 1);
		verify::verify(
			self.chain.as_ref(),
			self.params.as_ref(),
			&self.config,
			&tip,
			state,
			&entry,
			&view,
			ancestors.len(),
		)?;

		// 12. Index.
		self.insert_entry(entry, &view, &ancestors);

		// 13. Size cap.
		if self.size > self.config.hard_cap {
			self.evict_to_threshold();
			if !self.entries.contains_key(&txid) {
				return Err(PoolError::MempoolFull);
			}
		}

		Ok(())
	}

	/// Drain the worklist of orphans newly unblocked by `root_parent`'s
	/// admission, re-submitting each through ordinary admission. Iterative
	/// rather than recursive, so admission depth stays bounded regardless
	/// of how deep an orphan chain runs.
	fn cascade_resolve(&mut self, root_parent: Hash) {
		let mut queue: VecDeque<Hash> = VecDeque::new();
		queue.push_back(root_parent);

		while let Some(parent) = queue.pop_front() {
			let candidates = self.orphans.resolve_orphans(parent);
			for candidate_txid in candidates {
				let orphan = match self.orphans.take(&candidate_txid) {
					Some(o) => o,
					// Already gone - evicted between resolution and take.
					None => continue,
				};
				match self.add_inner(orphan.tx, orphan.id) {
					Ok(()) => queue.push_back(candidate_txid),
					Err(err) => {
						if should_reject_cache(&err) {
							self.reject_filter.insert(&candidate_txid);
						}
						let err = unwrap_policy_only(err);
						self.listener.on_badorphan(candidate_txid, &err, orphan.id);
					}
				}
			}
		}
	}

	fn insert_entry(&mut self, entry: PoolEntry, view: &View, ancestors: &HashSet<Hash>) {
		let txid = entry.tx.txid();
		for ancestor in ancestors {
			if let Some(a) = self.entries.get_mut(ancestor) {
				a.desc_fee += entry.delta_fee;
				a.desc_size += entry.size;
			}
		}
		for input in &entry.tx.inputs {
			self.spender_index.insert(input.previous_output, txid);
		}
		self.size += entry.size;
		self.listener.on_tx(&entry, view);
		self.entries.insert(txid, entry);
	}

	/// Merge outputs of in-pool parents with chain UTXOs fetched for the
	/// remaining inputs.
	fn build_view(&self, tx: &Transaction) -> View {
		let mut view = View::new();
		for input in &tx.inputs {
			if let Some(parent) = self.entries.get(&input.previous_output.txid) {
				if let Some(output) = parent.tx.outputs.get(input.previous_output.vout as usize) {
					view.insert(
						input.previous_output,
						Coin::new(output.clone(), parent.height, false),
					);
				}
			}
		}
		self.chain.get_coins(&mut view, tx);
		view
	}

	fn standardness_check(&self, tx: &Transaction) -> Result<(), PoolError> {
		if tx.version < 1 || tx.version > 2 {
			return Err(PoolError::Standard("unsupported transaction version".into()));
		}
		if tx.vsize() > self.config.max_tx_weight / 4 {
			return Err(PoolError::Standard("transaction too large for relay".into()));
		}
		for output in &tx.outputs {
			if output.script_pubkey.len() > 10_000 {
				return Err(PoolError::Standard("oversized output script".into()));
			}
		}
		Ok(())
	}

	// ---- indexes, ancestor rollback, eviction --------------------------

	fn is_root(&self, txid: &Hash) -> bool {
		match self.entries.get(txid) {
			Some(entry) => !entry
				.tx
				.inputs
				.iter()
				.any(|i| self.entries.contains_key(&i.previous_output.txid)),
			None => false,
		}
	}

	fn direct_children(&self, txid: &Hash) -> Vec<Hash> {
		let entry = match self.entries.get(txid) {
			Some(e) => e,
			None => return Vec::new(),
		};
		let mut children = Vec::new();
		for vout in 0..entry.tx.outputs.len() as u32 {
			if let Some(child) = self.spender_index.get(&OutPoint::new(*txid, vout)) {
				children.push(*child);
			}
		}
		children
	}

	/// Evict `txid` and its whole descendant subtree, rolling the
	/// ancestor `desc_*` rollup back by the evicted root's own rolled-up
	/// totals (which already account for the subtree being removed).
	fn evict_entry(&mut self, txid: &Hash) {
		let entry = match self.entries.get(txid) {
			Some(e) => e.clone(),
			None => return,
		};
		let ancestors = graph::ancestors_of_entry(&self.entries, txid, usize::MAX);
		for ancestor in ancestors {
			if let Some(a) = self.entries.get_mut(&ancestor) {
				a.desc_fee = a.desc_fee.saturating_sub(entry.desc_fee);
				a.desc_size = a.desc_size.saturating_sub(entry.desc_size);
			}
		}
		self.remove_subtree_indexes(txid);
	}

	fn remove_subtree_indexes(&mut self, txid: &Hash) {
		for child in self.direct_children(txid) {
			self.remove_subtree_indexes(&child);
		}
		if let Some(entry) = self.entries.remove(txid) {
			self.size = self.size.saturating_sub(entry.size);
			for input in &entry.tx.inputs {
				self.spender_index.remove(&input.previous_output);
			}
		}
	}

	/// Remove a single confirmed entry without touching its descendants -
	/// they remain valid in the pool, now rooted on a confirmed parent.
	fn remove_confirmed(&mut self, txid: &Hash) {
		let entry = match self.entries.remove(txid) {
			Some(e) => e,
			None => return,
		};
		self.size = self.size.saturating_sub(entry.size);
		for input in &entry.tx.inputs {
			self.spender_index.remove(&input.previous_output);
		}
		let ancestors = graph::ancestors_of_tx(&self.entries, &entry.tx, usize::MAX);
		for ancestor in ancestors {
			if let Some(a) = self.entries.get_mut(&ancestor) {
				a.desc_fee = a.desc_fee.saturating_sub(entry.delta_fee);
				a.desc_size = a.desc_size.saturating_sub(entry.size);
			}
		}
	}

	/// Any pool entry spending the same outpoint as `tx` is now invalid;
	/// evict it (and its descendants) entirely.
	fn remove_double_spends(&mut self, tx: &Transaction) {
		let mut conflicts = HashSet::new();
		for input in &tx.inputs {
			if let Some(spender) = self.spender_index.get(&input.previous_output) {
				conflicts.insert(*spender);
			}
		}
		for txid in conflicts {
			self.evict_entry(&txid);
		}
	}

	fn cheapest_root(&self) -> Option<Hash> {
		let mut best: Option<(Hash, (u64, u64), i64)> = None;
		for (txid, entry) in self.entries.iter() {
			if !self.is_root(txid) {
				continue;
			}
			let candidate = (*txid, entry.effective_rate_terms(), entry.time);
			best = Some(match best {
				None => candidate,
				Some(current) => {
					if is_cheaper(&candidate, &current) {
						candidate
					} else {
						current
					}
				}
			});
		}
		best.map(|(txid, _, _)| txid)
	}

	/// Expire then evict root-entries until the pool is back under its
	/// soft threshold.
	fn evict_to_threshold(&mut self) {
		let now = self.clock.now();
		let horizon = now - self.config.expiry_horizon_secs;
		let expired: Vec<Hash> = self
			.entries
			.iter()
			.filter(|(txid, e)| e.time < horizon && self.is_root(txid))
			.map(|(txid, _)| *txid)
			.collect();
		for txid in expired {
			if self.entries.contains_key(&txid) {
				self.evict_entry(&txid);
			}
		}

		while self.size > self.config.soft_threshold {
			match self.cheapest_root() {
				Some(txid) => self.evict_entry(&txid),
				None => break,
			}
		}
	}

	// ---- reorg handling -------------------------------------------------

	/// A block has been connected: remove its transactions from the pool
	/// (confirmed entries keep their descendants; unconfirmed conflicts
	/// and orphans are cleared), resolve any orphans the newly confirmed
	/// transactions unblock, and reset the reject filter.
	pub fn add_block(&mut self, block: &Block) {
		for tx in block.transactions.iter().rev() {
			if tx.is_coinbase() {
				continue;
			}
			let txid = tx.txid();
			if self.entries.contains_key(&txid) {
				self.remove_confirmed(&txid);
			} else {
				self.orphans.remove_orphan(&txid);
				self.remove_double_spends(tx);
			}
			self.cascade_resolve(txid);
		}
		self.reject_filter.reset();
	}

	/// A block has been disconnected: re-submit its transactions for
	/// ordinary admission (caller tag `-1`), then reset the reject filter.
	pub fn remove_block(&mut self, block: &Block) {
		for tx in &block.transactions {
			if tx.is_coinbase() {
				continue;
			}
			let txid = tx.txid();
			if !self.entries.contains_key(&txid) {
				let _ = self.add(Arc::new(tx.clone()), -1);
			}
		}
		self.reject_filter.reset();
	}

	/// Walk every entry and evict those invalidated by the new tip: no
	/// longer final, a sequence lock that no longer holds, or a spent
	/// coinbase whose maturity window opened again under the new height.
	pub fn handle_reorg(&mut self) {
		let tip = self.chain.tip();
		let state = self.chain.state();
		let txids: Vec<Hash> = self.entries.keys().copied().collect();

		for txid in txids {
			let entry = match self.entries.get(&txid) {
				Some(e) => e.clone(),
				None => continue, // already evicted by an earlier iteration
			};

			let mut evict = !self.chain.verify_final(&tip, &entry.tx, state);

			if !evict && entry.locks {
				let view = self.build_view(&entry.tx);
				evict = !self.chain.verify_locks(&tip, &entry.tx, &view, state);
			}

			if !evict && entry.coinbase {
				let view = self.build_view(&entry.tx);
				evict = entry.tx.inputs.iter().any(|i| {
					view.get(&i.previous_output)
						.map(|c| c.is_coinbase && tip.height < c.height + self.config.coinbase_maturity)
						.unwrap_or(false)
				});
			}

			if evict {
				self.evict_entry(&txid);
			}
		}
	}
}

fn should_reject_cache(err: &PoolError) -> bool {
	use PoolError::*;
	if err.malleable() {
		return false;
	}
	!matches!(err, ScriptPolicy | TxInMempool | TxKnown | MempoolFull | Duplicate)
}

/// The negative-coded `ScriptConsensusPolicyOnly` signal only ever drives
/// the reject-cache decision above; no caller outside this module should
/// ever see it. Collapse it back to the plain `ScriptConsensus` code it
/// stands in for before an error crosses out of the pool.
fn unwrap_policy_only(err: PoolError) -> PoolError {
	match err {
		PoolError::ScriptConsensusPolicyOnly => PoolError::ScriptConsensus,
		other => other,
	}
}

fn signals_rbf(tx: &Transaction) -> bool {
	tx.inputs.iter().any(|i| i.sequence <= MAX_BIP125_RBF_SEQUENCE)
}

fn is_cheaper(a: &(Hash, (u64, u64), i64), b: &(Hash, (u64, u64), i64)) -> bool {
	let (fa, sa) = a.1;
	let (fb, sb) = b.1;
	let lhs = (fa as u128) * (sb as u128);
	let rhs = (fb as u128) * (sa as u128);
	if lhs != rhs {
		lhs < rhs
	} else {
		a.2 < b.2
	}
}

fn sanity_check(tx: &Transaction) -> Result<(), PoolError> {
	if tx.inputs.is_empty() {
		return Err(PoolError::Sanity("no inputs".into()));
	}
	if tx.outputs.is_empty() {
		return Err(PoolError::Sanity("no outputs".into()));
	}
	let mut seen = HashSet::new();
	for input in &tx.inputs {
		if !seen.insert(input.previous_output) {
			return Err(PoolError::Sanity("duplicate inputs".into()));
		}
	}
	let mut total: u64 = 0;
	for output in &tx.outputs {
		total = total
			.checked_add(output.value)
			.ok_or_else(|| PoolError::Sanity("output value overflow".into()))?;
	}
	if total > MAX_MONEY {
		return Err(PoolError::Sanity("total output value exceeds money supply".into()));
	}
	Ok(())
}
