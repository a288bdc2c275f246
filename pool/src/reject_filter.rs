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

//! The reject filter: a probabilistic "seen-bad" set, sized for roughly
//! 120,000 items at a false-positive rate of 1e-6. Modeled directly on
//! Bitcoin Core's `CRollingBloomFilter`, the same way the corpus's own
//! peer-address dedup filter is.

use std::collections::hash_map::RandomState;

use bloom_filters::{BloomFilter, DefaultBuildHashKernels, StableBloomFilter};

use chain_primitives::Hash;

const CAPACITY: usize = 120_000;
const NUM_HASHES: usize = 3;
const FALSE_POSITIVE_RATE: f64 = 1e-6;

/// Drops obvious repeats cheaply; false positives are tolerated since
/// they only suppress orphan storage and retry, never correctness.
pub struct RejectFilter {
	filter: StableBloomFilter<DefaultBuildHashKernels<RandomState>>,
}

impl RejectFilter {
	pub fn new() -> RejectFilter {
		RejectFilter {
			filter: StableBloomFilter::new(
				CAPACITY,
				NUM_HASHES,
				FALSE_POSITIVE_RATE,
				DefaultBuildHashKernels::new(rand::random(), RandomState::default()),
			),
		}
	}

	pub fn insert(&mut self, hash: &Hash) {
		self.filter.insert(hash);
	}

	pub fn contains(&self, hash: &Hash) -> bool {
		self.filter.contains(hash)
	}

	/// Cleared on every block apply/revert, per spec.
	pub fn reset(&mut self) {
		*self = RejectFilter::new();
	}
}

impl Default for RejectFilter {
	fn default() -> RejectFilter {
		RejectFilter::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn insert_then_contains() {
		let mut f = RejectFilter::new();
		let h = Hash([5u8; 32]);
		assert!(!f.contains(&h));
		f.insert(&h);
		assert!(f.contains(&h));
	}

	#[test]
	fn reset_clears_membership() {
		let mut f = RejectFilter::new();
		let h = Hash([6u8; 32]);
		f.insert(&h);
		assert!(f.contains(&h));
		f.reset();
		assert!(!f.contains(&h));
	}
}
