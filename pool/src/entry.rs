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

//! The durable per-transaction record kept by the pool once a
//! transaction has been admitted.

use std::sync::Arc;

use chain_primitives::Transaction;

/// A successfully admitted transaction plus its fee/size accounting.
#[derive(Debug, Clone)]
pub struct PoolEntry {
	/// Shared with the caller; the entry co-owns it rather than copying.
	pub tx: Arc<Transaction>,
	/// Chain tip height at the time of acceptance.
	pub height: u32,
	/// Virtual size, after the sigops penalty (see `bytes_per_sigop`).
	pub size: u64,
	/// Sigop cost.
	pub sigops: u64,
	/// Absolute fee, in satoshis.
	pub fee: u64,
	/// Fee after prioritization; starts out equal to `fee`.
	pub delta_fee: u64,
	/// Wall-clock insertion time, unix seconds.
	pub time: i64,
	/// Whether this entry spends any coinbase output.
	pub coinbase: bool,
	/// Whether this entry uses relative-locktime sequence semantics.
	pub locks: bool,
	/// This entry's own `delta_fee` plus every descendant's, rolled up.
	pub desc_fee: u64,
	/// This entry's own `size` plus every descendant's, rolled up.
	pub desc_size: u64,
}

impl PoolEntry {
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		tx: Arc<Transaction>,
		height: u32,
		size: u64,
		sigops: u64,
		fee: u64,
		time: i64,
		coinbase: bool,
		locks: bool,
	) -> PoolEntry {
		PoolEntry {
			tx,
			height,
			size,
			sigops,
			fee,
			delta_fee: fee,
			time,
			coinbase,
			locks,
			desc_fee: fee,
			desc_size: size,
		}
	}

	/// `desc_fee × size` vs `delta_fee × desc_size`: whether this entry's
	/// descendants sweeten the package enough that eviction/mining should
	/// rank it by its descendant-inclusive rate rather than its own.
	pub fn use_descendant_rate(&self) -> bool {
		(self.desc_fee as u128) * (self.size as u128) > (self.delta_fee as u128) * (self.desc_size as u128)
	}

	/// The (fee, size) pair eviction and mining rank this entry by.
	pub fn effective_rate_terms(&self) -> (u64, u64) {
		if self.use_descendant_rate() {
			(self.desc_fee, self.desc_size)
		} else {
			(self.delta_fee, self.size)
		}
	}
}
