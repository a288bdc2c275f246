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

//! The in-memory pool of unconfirmed, validated transactions sitting
//! between the p2p network and the block template builder: admission,
//! orphan resolution, descendant-aware fee accounting and eviction, the
//! reject filter, and reorg reconciliation.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate rand;
extern crate serde;
#[macro_use]
extern crate serde_derive;

pub mod entry;
pub mod error;
pub mod graph;
pub mod orphans;
pub mod persistence;
pub mod pool;
pub mod reject_filter;
pub mod types;
pub mod verify;
pub mod view;

pub use crate::entry::PoolEntry;
pub use crate::error::PoolError;
pub use crate::orphans::{OrphanEntry, OrphanPool};
pub use crate::pool::Mempool;
pub use crate::reject_filter::RejectFilter;
pub use crate::types::{
	deployment, script_flags, Chain, ChainTip, NetworkParams, NoopListener, PoolConfig, PoolListener,
};
pub use crate::view::View;
