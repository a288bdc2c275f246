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

//! The transient UTXO view built fresh for each admission call: pool
//! parent outputs merged with chain UTXOs for everything else.

use std::collections::HashMap;

use chain_primitives::{Coin, OutPoint};

/// A mapping from outpoint to coin, scoped to a single admission call.
#[derive(Debug, Default)]
pub struct View {
	coins: HashMap<OutPoint, Coin>,
}

impl View {
	pub fn new() -> View {
		View {
			coins: HashMap::new(),
		}
	}

	pub fn insert(&mut self, outpoint: OutPoint, coin: Coin) {
		self.coins.insert(outpoint, coin);
	}

	pub fn get(&self, outpoint: &OutPoint) -> Option<&Coin> {
		self.coins.get(outpoint)
	}

	pub fn contains(&self, outpoint: &OutPoint) -> bool {
		self.coins.contains_key(outpoint)
	}

	pub fn len(&self) -> usize {
		self.coins.len()
	}

	pub fn is_empty(&self) -> bool {
		self.coins.is_empty()
	}
}
