// Copyright 2018 The Grin Developers
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

//! Wall-clock abstraction, so the pool can be driven by a deterministic
//! fake clock in tests instead of `SystemTime::now()`.

use std::time::{SystemTime, UNIX_EPOCH};

/// A source of the current time, as unix seconds.
pub trait Clock: Send + Sync {
	/// Current time, in seconds since the epoch.
	fn now(&self) -> i64;
}

/// The real, system-time-backed clock used outside of tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> i64 {
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.expect("system clock before epoch")
			.as_secs() as i64
	}
}
