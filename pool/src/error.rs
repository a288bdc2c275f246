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

//! The mempool's error taxonomy. A single enum, never thrown - every
//! admission failure is a return value that carries a DoS score for
//! peer-banning and a `malleable` flag the reject-cache wrapper consults.

/// Everything that can keep a transaction out of the pool.
#[derive(Fail, Debug)]
pub enum PoolError {
	/// Non-contextual structural checks (duplicate inputs, bad value
	/// ranges, oversized, as well as the contextual input/output value
	/// checks that don't warrant their own code in the taxonomy).
	#[fail(display = "failed sanity checks: {}", _0)]
	Sanity(String),
	/// Coinbase transactions never enter the pool.
	#[fail(display = "coinbase transactions cannot enter the mempool")]
	Coinbase,
	/// Witness data seen before the witness deployment activated.
	#[fail(display = "witness data seen before its deployment activated")]
	PrematureWitness,
	/// version >= 2 relative-locktime semantics seen before CSV activated.
	#[fail(display = "relative locktime semantics seen before CSV activated")]
	PrematureCsv,
	/// Policy standardness checks.
	#[fail(display = "failed standardness checks: {}", _0)]
	Standard(String),
	/// A spent input's script is not of a standard template.
	#[fail(display = "transaction spends a non-standard input script")]
	InputsNonstandard,
	/// The transaction's witness is not of a standard template.
	#[fail(display = "transaction carries a non-standard witness")]
	WitnessNonstandard,
	/// Not final at tip height + 1 with the next median-time-past.
	#[fail(display = "transaction is not final at the next block")]
	Finality,
	/// Already present, as an entry or an orphan.
	#[fail(display = "transaction already in the mempool")]
	TxInMempool,
	/// The chain already has unspent outputs from this txid.
	#[fail(display = "transaction outputs already exist, unspent, on chain")]
	TxKnown,
	/// An input is already spent by another pool entry, no RBF signal.
	#[fail(display = "one or more inputs already spent in the mempool")]
	InputsSpent,
	/// An input is already spent by another pool entry, RBF signaled but
	/// unsupported.
	#[fail(display = "replace-by-fee is not supported")]
	Replacement,
	/// A missing parent is unexpectedly already indexed - an invariant
	/// violation rather than an ordinary rejection.
	#[fail(display = "missing parent already indexed (invariant violation)")]
	InputsMissing,
	/// Transaction weight exceeds the per-tx cap.
	#[fail(display = "transaction weight {} exceeds the cap", _0)]
	TxWeight(u64),
	/// Sigop cost exceeds the per-tx cap.
	#[fail(display = "transaction sigop cost {} exceeds the cap", _0)]
	TxSigops(u64),
	/// Fee rate below the relay floor.
	#[fail(display = "fee {} is below the relay floor {}", _0, _1)]
	FeeLow(u64, u64),
	/// Fee rate implausibly above the relay floor (absurd-fee safety net).
	#[fail(display = "fee {} is absurdly high relative to the floor {}", _0, _1)]
	FeeHigh(u64, u64),
	/// The ancestor set exceeds `MAX_ANCESTORS`.
	#[fail(display = "ancestor chain exceeds the configured limit")]
	MempoolChain,
	/// Script verification failed only under policy-only flags.
	#[fail(display = "script failed policy-only verification")]
	ScriptPolicy,
	/// Script verification failed under mandatory, consensus-critical flags.
	#[fail(display = "script failed consensus verification")]
	ScriptConsensus,
	/// A consensus-flagged script failure that is actually attributable to
	/// `WITNESS`/`CLEANSTACK` policy on a witness-less tx, rather than a
	/// genuine consensus violation. `verify()` returns this variant as-is;
	/// it exists purely so the reject-cache decision in `pool.rs` (via
	/// `malleable()`) can skip caching it, since a re-malleated variant of
	/// the same transaction might still be valid. `pool.rs` unwraps it
	/// back to the plain `ScriptConsensus` code before any result crosses
	/// out of the pool - to `add()`'s caller or to a `PoolListener`. See
	/// the verification wrapper in `verify.rs`.
	#[fail(display = "script failed consensus verification (policy-attributed)")]
	ScriptConsensusPolicyOnly,
	/// The pool was over its hard cap and eviction reclaimed the entry
	/// that admission had just inserted.
	#[fail(display = "mempool is full")]
	MempoolFull,
	/// A duplicate of a transaction the reject filter remembers as bad.
	#[fail(display = "duplicate of a previously rejected transaction")]
	Duplicate,
}

impl PoolError {
	/// DoS score for peer banning, one of 0, 10 or 100 per the taxonomy.
	pub fn score(&self) -> u32 {
		use PoolError::*;
		match self {
			Sanity(_) | Coinbase | ScriptConsensus => 100,
			PrematureWitness | PrematureCsv | Finality | TxWeight(_) | TxSigops(_)
			| InputsMissing | MempoolChain => 10,
			Standard(_)
			| InputsNonstandard
			| WitnessNonstandard
			| TxInMempool
			| TxKnown
			| InputsSpent
			| Replacement
			| FeeLow(_, _)
			| FeeHigh(_, _)
			| ScriptPolicy
			| ScriptConsensusPolicyOnly
			| MempoolFull
			| Duplicate => 0,
		}
	}

	/// Whether this rejection might be an artifact of transaction
	/// malleation (e.g. a stripped witness) rather than a genuine
	/// double-invalid transaction - such failures should not poison the
	/// reject filter, since a re-malleated variant could still be valid.
	pub fn malleable(&self) -> bool {
		matches!(
			self,
			PoolError::ScriptConsensus | PoolError::ScriptConsensusPolicyOnly
		)
	}

	/// Whether this is the negative-coded "policy-only" variant that must
	/// never be shown to callers as-is (see the design note in `verify.rs`).
	pub fn is_policy_only_consensus(&self) -> bool {
		matches!(self, PoolError::ScriptConsensusPolicyOnly)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sanity_and_coinbase_score_max() {
		assert_eq!(PoolError::Sanity("bad".into()).score(), 100);
		assert_eq!(PoolError::Coinbase.score(), 100);
	}

	#[test]
	fn dedup_and_policy_score_zero() {
		assert_eq!(PoolError::TxInMempool.score(), 0);
		assert_eq!(PoolError::ScriptPolicy.score(), 0);
	}

	#[test]
	fn only_script_consensus_variants_are_malleable() {
		assert!(PoolError::ScriptConsensus.malleable());
		assert!(PoolError::ScriptConsensusPolicyOnly.malleable());
		assert!(!PoolError::FeeLow(1, 2).malleable());
	}
}
