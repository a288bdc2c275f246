//! Transaction, input, output and coin primitives.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::hash::{Hash, Hashed, ZERO_HASH};

/// A reference to a single output of a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
	pub txid: Hash,
	pub vout: u32,
}

impl OutPoint {
	pub fn new(txid: Hash, vout: u32) -> OutPoint {
		OutPoint { txid, vout }
	}

	/// The outpoint a coinbase transaction's sole input points at; it
	/// spends nothing and is never looked up in any view.
	pub fn null() -> OutPoint {
		OutPoint {
			txid: ZERO_HASH,
			vout: 0xffff_ffff,
		}
	}

	pub fn is_null(&self) -> bool {
		self.txid == ZERO_HASH && self.vout == 0xffff_ffff
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxIn {
	pub previous_output: OutPoint,
	pub script_sig: Vec<u8>,
	pub sequence: u32,
	pub witness: Vec<Vec<u8>>,
}

impl TxIn {
	pub fn has_witness(&self) -> bool {
		self.witness.iter().any(|w| !w.is_empty())
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOut {
	pub value: u64,
	pub script_pubkey: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
	pub version: i32,
	pub inputs: Vec<TxIn>,
	pub outputs: Vec<TxOut>,
	pub lock_time: u32,
}

impl Hashed for Transaction {
	fn bytes(&self) -> Vec<u8> {
		self.serialize_for_hash(false)
	}
}

impl Transaction {
	/// `txid`: hash of the transaction with witness data stripped, the
	/// identity that spending references (`OutPoint::txid`) use.
	pub fn txid(&self) -> Hash {
		Hash(crate::hash::sha256d(&self.serialize_for_hash(false)))
	}

	/// `wtxid`: hash including witness data, used for relay dedup.
	pub fn wtxid(&self) -> Hash {
		Hash(crate::hash::sha256d(&self.serialize_for_hash(true)))
	}

	pub fn is_coinbase(&self) -> bool {
		self.inputs.len() == 1 && self.inputs[0].previous_output.is_null()
	}

	pub fn has_witness(&self) -> bool {
		self.inputs.iter().any(|i| i.has_witness())
	}

	/// BIP68-style "final" check: every input either opts out of
	/// relative locktime (top bit set) or locking is the caller's job;
	/// this only reports whether nLockTime itself is satisfied.
	pub fn is_final(&self, height: u32, time: i64) -> bool {
		if self.lock_time == 0 {
			return true;
		}
		if self.inputs.iter().all(|i| i.sequence == 0xffff_ffff) {
			return true;
		}
		if (self.lock_time as u64) < LOCKTIME_THRESHOLD {
			(self.lock_time as u64) < height as u64
		} else {
			(self.lock_time as u64) < time as u64
		}
	}

	/// Rough virtual-size estimate: weight units / 4, rounded up, with
	/// witness data discounted the way segwit weighs it.
	pub fn weight(&self) -> u64 {
		let base = self.serialize_for_hash(false).len() as u64;
		let total = self.serialize_for_hash(true).len() as u64;
		base * 3 + total
	}

	pub fn vsize(&self) -> u64 {
		(self.weight() + 3) / 4
	}

	pub fn legacy_sigop_count(&self) -> u64 {
		// A stand-in conservative estimate: real sigop counting walks the
		// script interpreter, which lives outside this crate.
		self.inputs.len() as u64 + self.outputs.len() as u64
	}

	fn serialize_for_hash(&self, with_witness: bool) -> Vec<u8> {
		let mut out = Vec::new();
		out.write_i32::<LittleEndian>(self.version).unwrap();
		out.write_u32::<LittleEndian>(self.inputs.len() as u32).unwrap();
		for txin in &self.inputs {
			out.extend_from_slice(txin.previous_output.txid.as_slice());
			out.write_u32::<LittleEndian>(txin.previous_output.vout).unwrap();
			out.write_u32::<LittleEndian>(txin.script_sig.len() as u32).unwrap();
			out.extend_from_slice(&txin.script_sig);
			out.write_u32::<LittleEndian>(txin.sequence).unwrap();
			if with_witness {
				out.write_u32::<LittleEndian>(txin.witness.len() as u32).unwrap();
				for item in &txin.witness {
					out.write_u32::<LittleEndian>(item.len() as u32).unwrap();
					out.extend_from_slice(item);
				}
			}
		}
		out.write_u32::<LittleEndian>(self.outputs.len() as u32).unwrap();
		for txout in &self.outputs {
			out.write_u64::<LittleEndian>(txout.value).unwrap();
			out.write_u32::<LittleEndian>(txout.script_pubkey.len() as u32).unwrap();
			out.extend_from_slice(&txout.script_pubkey);
		}
		out.write_u32::<LittleEndian>(self.lock_time).unwrap();
		out
	}
}

const LOCKTIME_THRESHOLD: u64 = 500_000_000;

/// A single unspent coin: an output plus the chain-height context needed
/// to evaluate coinbase maturity and relative-time locks against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
	pub output: TxOut,
	pub height: u32,
	pub is_coinbase: bool,
}

impl Coin {
	pub fn new(output: TxOut, height: u32, is_coinbase: bool) -> Coin {
		Coin {
			output,
			height,
			is_coinbase,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_tx() -> Transaction {
		Transaction {
			version: 2,
			inputs: vec![TxIn {
				previous_output: OutPoint::new(Hash([7u8; 32]), 0),
				script_sig: vec![],
				sequence: 0xffff_ffff,
				witness: vec![],
			}],
			outputs: vec![TxOut {
				value: 5000,
				script_pubkey: vec![0x76, 0xa9],
			}],
			lock_time: 0,
		}
	}

	#[test]
	fn txid_ignores_witness() {
		let mut tx = sample_tx();
		let txid_no_witness = tx.txid();
		tx.inputs[0].witness = vec![vec![1, 2, 3]];
		assert_eq!(txid_no_witness, tx.txid());
		assert_ne!(tx.txid(), tx.wtxid());
	}

	#[test]
	fn coinbase_detection() {
		let mut tx = sample_tx();
		assert!(!tx.is_coinbase());
		tx.inputs[0].previous_output = OutPoint::null();
		assert!(tx.is_coinbase());
	}

	#[test]
	fn final_with_zero_locktime() {
		let tx = sample_tx();
		assert!(tx.is_final(100, 1000));
	}
}
