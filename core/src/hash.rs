//! Hash type used to identify transactions, outpoints and blocks.

use std::fmt;

use sha2::{Digest, Sha256};

/// A 32-byte double-SHA256 digest, used pervasively to identify
/// transactions, outputs and blocks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

pub const ZERO_HASH: Hash = Hash([0; 32]);

impl Hash {
	pub fn from_slice(v: &[u8]) -> Hash {
		let mut a = [0u8; 32];
		a.copy_from_slice(v);
		Hash(a)
	}

	pub fn to_vec(&self) -> Vec<u8> {
		self.0.to_vec()
	}

	pub fn as_slice(&self) -> &[u8] {
		&self.0
	}
}

impl fmt::Display for Hash {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", hex::encode(&self.0))
	}
}

/// Types that derive their identity from the double-SHA256 of their
/// serialized bytes.
pub trait Hashed {
	fn bytes(&self) -> Vec<u8>;

	fn hash(&self) -> Hash {
		Hash(sha256d(&self.bytes()))
	}
}

/// Bitcoin's usual double round of SHA256.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
	let first = Sha256::digest(data);
	let second = Sha256::digest(&first);
	let mut out = [0u8; 32];
	out.copy_from_slice(&second);
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sha256d_is_deterministic() {
		let a = sha256d(b"hello");
		let b = sha256d(b"hello");
		assert_eq!(a, b);
		assert_ne!(a, sha256d(b"hellp"));
	}
}
