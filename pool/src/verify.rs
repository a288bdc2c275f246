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

//! The contextual verification wrapper, applied once a candidate entry
//! has been constructed but before it is indexed.

use crate::entry::PoolEntry;
use crate::error::PoolError;
use crate::types::{script_flags, Chain, ChainTip, NetworkParams, PoolConfig};
use crate::view::View;

/// Runs, in order: sequence locks, standardness, sigops cap, fee
/// floor/ceiling, ancestor depth cap, script verification with its
/// policy/consensus retry ladder.
///
/// `ancestor_count` is the caller's already-computed ancestor set size
/// (computed once, shared with the rollup step on success).
pub fn verify<C: Chain>(
	chain: &C,
	params: &dyn NetworkParams,
	config: &PoolConfig,
	tip: &ChainTip,
	flags: u32,
	entry: &PoolEntry,
	view: &View,
	ancestor_count: usize,
) -> Result<(), PoolError> {
	// Sequence locks.
	if entry.locks && !chain.verify_locks(tip, &entry.tx, view, flags) {
		return Err(PoolError::Finality);
	}

	// Standard inputs / standard witness (policy only).
	if params.require_standard() {
		if !has_standard_inputs(&entry.tx) {
			return Err(PoolError::InputsNonstandard);
		}
		if !has_standard_witness(&entry.tx) {
			return Err(PoolError::WitnessNonstandard);
		}
	}

	// Sigops cost cap per tx. Reuse the ancestor cap's ceiling as a
	// simple per-tx bound: a transaction this pool will ever mine alone
	// can't cost more sigops than fit in a single block's budget.
	const MAX_TX_SIGOPS: u64 = 16_000;
	if entry.sigops > MAX_TX_SIGOPS {
		return Err(PoolError::TxSigops(entry.sigops));
	}

	// Fee floor / ceiling.
	let floor = params.min_relay().saturating_mul(entry.size) / 1000;
	if entry.fee < floor {
		return Err(PoolError::FeeLow(entry.fee, floor));
	}
	let ceiling = floor.saturating_mul(config.absurd_fee_multiplier);
	if floor > 0 && entry.fee > ceiling {
		return Err(PoolError::FeeHigh(entry.fee, ceiling));
	}

	// Ancestor depth cap.
	if ancestor_count > config.max_ancestors {
		return Err(PoolError::MempoolChain);
	}

	// Script verification, with the policy/consensus retry ladder.
	verify_scripts(chain, &entry.tx, view)
}

fn verify_scripts<C: Chain>(
	chain: &C,
	tx: &chain_primitives::Transaction,
	view: &View,
) -> Result<(), PoolError> {
	if chain.verify_scripts(tx, view, script_flags::STANDARD).is_ok() {
		return Ok(());
	}

	// Retry with only the consensus-mandatory flags; success here means
	// the failure was policy-only.
	if chain.verify_scripts(tx, view, script_flags::MANDATORY).is_ok() {
		return Err(PoolError::ScriptPolicy);
	}

	// A witness-less tx that fails under STANDARD but would pass without
	// WITNESS+CLEANSTACK is attributed to that policy pair, not to a
	// genuine consensus failure - see the negative-coded convention
	// documented on `PoolError::ScriptConsensusPolicyOnly`.
	if !tx.has_witness() {
		let relaxed = script_flags::STANDARD & !(script_flags::WITNESS | script_flags::CLEANSTACK);
		if chain.verify_scripts(tx, view, relaxed).is_ok() {
			return Err(PoolError::ScriptConsensusPolicyOnly);
		}
	}

	Err(PoolError::ScriptConsensus)
}

/// Standalone stand-in for "every input spends a standard script
/// template" - real template matching lives with the script interpreter
/// outside this crate; this only catches the one thing representable
/// without it, an implausibly large scriptSig.
fn has_standard_inputs(tx: &chain_primitives::Transaction) -> bool {
	tx.inputs.iter().all(|i| i.script_sig.len() <= 1650)
}

fn has_standard_witness(tx: &chain_primitives::Transaction) -> bool {
	tx.inputs
		.iter()
		.all(|i| i.witness.iter().all(|item| item.len() <= 520))
}
