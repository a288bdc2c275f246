// Copyright 2016 The Grin Developers
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

//! Transaction, outpoint, coin and block types shared by the node. No
//! script interpreter, merkle proofs or wire codec live here - those
//! belong to the components that own them.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

extern crate byteorder;
extern crate chrono;
extern crate hex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate sha2;

pub mod block;
pub mod hash;
pub mod transaction;

pub use crate::block::{Block, BlockHeader};
pub use crate::hash::{Hash, Hashed, ZERO_HASH};
pub use crate::transaction::{Coin, OutPoint, Transaction, TxIn, TxOut};
