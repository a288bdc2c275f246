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

//! Base types for the mempool: the collaborator traits it consumes, the
//! observer traits it emits through, and the tuning constants.

use crate::error::PoolError;
use crate::view::View;
use chain_primitives::{Hash, Transaction};

/// Chain tip as presented to the pool: just enough to drive finality and
/// lock checks without the pool reaching into the chain store itself.
#[derive(Debug, Clone, Copy)]
pub struct ChainTip {
	pub height: u32,
	pub median_time_past: i64,
}

/// Soft-fork deployment state, as a small bitmap the chain hands over.
pub mod deployment {
	pub const WITNESS_ACTIVE: u32 = 1 << 0;
	pub const CSV_ACTIVE: u32 = 1 << 1;
}

/// Script verification flag bits, mirroring Bitcoin Core's
/// `STANDARD_VERIFY_FLAGS` / mandatory-flags split closely enough to
/// drive the same policy-vs-consensus retry ladder.
pub mod script_flags {
	pub const P2SH: u32 = 1 << 0;
	pub const DERSIG: u32 = 1 << 1;
	pub const NULLDUMMY: u32 = 1 << 2;
	pub const CHECKLOCKTIMEVERIFY: u32 = 1 << 3;
	pub const CHECKSEQUENCEVERIFY: u32 = 1 << 4;
	pub const WITNESS: u32 = 1 << 5;
	pub const CLEANSTACK: u32 = 1 << 6;
	pub const MINIMALIF: u32 = 1 << 7;

	/// Flags consensus itself enforces; never safe to relax.
	pub const MANDATORY: u32 = P2SH;
	/// The full relay policy flag set.
	pub const STANDARD: u32 = MANDATORY
		| DERSIG
		| NULLDUMMY
		| CHECKLOCKTIMEVERIFY
		| CHECKSEQUENCEVERIFY
		| WITNESS
		| CLEANSTACK
		| MINIMALIF;
	/// `STANDARD` minus `MANDATORY`: the subset the verification wrapper
	/// is allowed to clear and retry under, per spec's "only-standard"
	/// subset.
	pub const STANDARD_NOT_MANDATORY: u32 = STANDARD & !MANDATORY;
}

/// The chain collaborator: everything the pool needs from the node's
/// block store and UTXO index, expressed as a trait so tests can supply
/// a plain in-memory double instead of a real chain.
pub trait Chain: Send + Sync {
	/// Current tip: height and median-time-past.
	fn tip(&self) -> ChainTip;
	/// Current deployment-state bitmap (see `deployment`).
	fn state(&self) -> u32;
	/// BIP68/BIP113-style finality at `tip.height + 1` / the next MTP.
	fn verify_final(&self, tip: &ChainTip, tx: &Transaction, flags: u32) -> bool;
	/// Sequence-lock check against a transaction's resolved view.
	fn verify_locks(&self, tip: &ChainTip, tx: &Transaction, view: &View, flags: u32) -> bool;
	/// Whether the chain's UTXO index already has unspent outputs for
	/// this exact txid (a confirmed duplicate).
	fn has_coins(&self, tx: &Transaction) -> bool;
	/// Populate `view` with chain UTXOs for every input not already
	/// resolved from a pool parent.
	fn get_coins(&self, view: &mut View, tx: &Transaction);
	/// Run the script interpreter (owned entirely by the host - this
	/// crate never inspects scripts itself) under the given flag set.
	fn verify_scripts(&self, tx: &Transaction, view: &View, flags: u32) -> Result<(), ()>;
}

/// Network-parameter collaborator: relay policy knobs that vary by
/// deployment (mainnet/testnet/regtest-equivalent).
pub trait NetworkParams: Send + Sync {
	/// Whether non-consensus standardness checks are enforced.
	fn require_standard(&self) -> bool;
	/// Minimum relay fee rate, satoshis per kilobyte of virtual size.
	fn min_relay(&self) -> u64;
}

/// Observer interface the pool fires into; hosts/tests that don't care
/// can use `NoopListener`.
pub trait PoolListener: Send + Sync {
	/// Fired after a transaction is successfully admitted and indexed.
	fn on_tx(&self, _entry: &crate::entry::PoolEntry, _view: &View) {}
	/// Fired when a previously-stored orphan fails on re-submission.
	fn on_badorphan(&self, _hash: Hash, _err: &PoolError, _id: i64) {}
}

/// A `PoolListener` that does nothing; the default for hosts/tests that
/// don't need the callbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl PoolListener for NoopListener {}

/// Tuning constants, with the spec's exact defaults.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
	pub max_orphans: usize,
	pub max_tx_weight: u64,
	pub max_ancestors: usize,
	pub hard_cap: u64,
	pub soft_threshold: u64,
	pub expiry_horizon_secs: i64,
	pub bytes_per_sigop: u64,
	pub absurd_fee_multiplier: u64,
	pub coinbase_maturity: u32,
}

impl Default for PoolConfig {
	fn default() -> PoolConfig {
		PoolConfig {
			max_orphans: 100,
			max_tx_weight: 400_000,
			max_ancestors: 25,
			hard_cap: 300_000_000,
			soft_threshold: 290_000_000,
			expiry_horizon_secs: 14 * 24 * 60 * 60,
			bytes_per_sigop: 20,
			absurd_fee_multiplier: 10_000,
			coinbase_maturity: 100,
		}
	}
}
