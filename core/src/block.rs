//! Block and block header primitives.

use crate::hash::{Hash, Hashed};
use crate::transaction::Transaction;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
	pub version: i32,
	pub prev_hash: Hash,
	pub merkle_root: Hash,
	pub time: u32,
	pub bits: u32,
	pub nonce: u32,
	pub height: u32,
}

impl Hashed for BlockHeader {
	fn bytes(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(80);
		out.extend_from_slice(&self.version.to_le_bytes());
		out.extend_from_slice(self.prev_hash.as_slice());
		out.extend_from_slice(self.merkle_root.as_slice());
		out.extend_from_slice(&self.time.to_le_bytes());
		out.extend_from_slice(&self.bits.to_le_bytes());
		out.extend_from_slice(&self.nonce.to_le_bytes());
		out
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
	pub header: BlockHeader,
	pub transactions: Vec<Transaction>,
}

impl Block {
	pub fn hash(&self) -> Hash {
		self.header.hash()
	}
}
