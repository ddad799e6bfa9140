use crate::node::Node;
use bytes::Bytes;
use ethvm_rlp::{RlpStream, NULL_RLP};
use primitive_types::H256;
use sha3::{Digest, Keccak256};

/// Root hash of the empty trie: `keccak(0x80)`, the hash of the canonical
/// empty byte-string encoding.
pub const KECCAK_NULL_RLP: H256 = H256([
	0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8,
	0x6e, 0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63,
	0xb4, 0x21,
]);

/// The node type used while calculating the hash of a trie.
#[derive(Debug)]
enum EncodedNode {
	/// Node that is RLP-encoded but not hashed: its encoding is under 32
	/// bytes and gets inlined into the parent.
	Raw(Bytes),
	/// Node replaced by its 32-byte hash.
	Hashed([u8; 32]),
}

impl Node {
	/// Calculate the root hash of this node.
	#[must_use]
	pub fn calc_hash(&self) -> H256 {
		match self.rlp_encode_and_hash_node() {
			EncodedNode::Raw(b) => hash(&b),
			EncodedNode::Hashed(h) => H256(h),
		}
	}

	/// The full RLP encoding of this node, with sub-nodes inlined or hashed
	/// per the 32-byte policy. This is the serialized form whose hash is the
	/// root.
	#[must_use]
	pub fn encode_raw(&self) -> Vec<u8> {
		match self {
			Self::Empty => NULL_RLP.to_vec(),
			Self::Hash(h) => ethvm_rlp::encode(h),
			_ => self.rlp_encode_node().to_vec(),
		}
	}

	fn rlp_encode_and_hash_node(&self) -> EncodedNode {
		match self {
			Self::Empty => EncodedNode::Raw(Bytes::from_static(&NULL_RLP)),
			Self::Hash(h) => EncodedNode::Hashed(h.0),
			_ => hash_bytes_if_large_enough(self.rlp_encode_node()),
		}
	}

	/// RLP-encode one non-trivial node, recursing into children.
	fn rlp_encode_node(&self) -> Bytes {
		match self {
			Self::Empty | Self::Hash(_) => {
				unreachable!("trivial nodes are handled by the callers; qed")
			}
			Self::Branch { children, value } => {
				let mut stream = RlpStream::new_list(17);

				for child in children.iter() {
					append_to_stream(&mut stream, child.rlp_encode_and_hash_node());
				}

				if value.is_empty() {
					stream.append_empty_data();
				} else {
					stream.append(value);
				}

				stream.out().into()
			}
			Self::Extension { nibbles, child } => {
				let mut stream = RlpStream::new_list(2);

				stream.append(&nibbles.to_hex_prefix_encoding(false));
				append_to_stream(&mut stream, child.rlp_encode_and_hash_node());

				stream.out().into()
			}
			Self::Leaf { nibbles, value } => {
				let mut stream = RlpStream::new_list(2);

				stream.append(&nibbles.to_hex_prefix_encoding(true));
				stream.append(value);

				stream.out().into()
			}
		}
	}
}

fn hash_bytes_if_large_enough(bytes: Bytes) -> EncodedNode {
	if bytes.len() >= 32 {
		EncodedNode::Hashed(hash(&bytes).0)
	} else {
		EncodedNode::Raw(bytes)
	}
}

fn append_to_stream(s: &mut RlpStream, node: EncodedNode) {
	match node {
		EncodedNode::Raw(b) => s.append_raw(&b, 1),
		EncodedNode::Hashed(h) => s.append(&h[..]),
	};
}

fn hash(bytes: &[u8]) -> H256 {
	H256::from_slice(Keccak256::digest(bytes).as_slice())
}

/// Root hash of the trie committing to the given key-value pairs.
pub fn trie_root<I>(pairs: I) -> H256
where
	I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
{
	Node::from_entries(pairs).calc_hash()
}

/// Full serialized root node of the trie over the given pairs. Hashing this
/// yields [`trie_root`].
pub fn encoded_trie_root<I>(pairs: I) -> Vec<u8>
where
	I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
{
	Node::from_entries(pairs).encode_raw()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(key: &str, value: &str) -> (Vec<u8>, Vec<u8>) {
		(key.as_bytes().to_vec(), value.as_bytes().to_vec())
	}

	#[test]
	fn empty_hash_is_correct() {
		assert_eq!(trie_root(Vec::new()), KECCAK_NULL_RLP);
		assert_eq!(hash(&NULL_RLP), KECCAK_NULL_RLP);
		assert_eq!(
			hex::encode(KECCAK_NULL_RLP),
			"56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
		);
	}

	#[test]
	fn single_leaf_hash_matches_hand_encoding() {
		// Leaf node: [ hex_prefix("dog", leaf), "puppy" ]
		// hex_prefix("dog", leaf) = 0x20 ++ "dog" (even-length leaf flag).
		let mut hand = vec![0xc0 + 11, 0x84, 0x20];
		hand.extend_from_slice(b"dog");
		hand.push(0x85);
		hand.extend_from_slice(b"puppy");

		assert_eq!(encoded_trie_root(vec![entry("dog", "puppy")]), hand);
		assert_eq!(trie_root(vec![entry("dog", "puppy")]), hash(&hand));
	}

	#[test]
	fn insertion_order_does_not_matter() {
		let forward = trie_root(vec![entry("dog", "puppy"), entry("doge", "coin")]);
		let backward = trie_root(vec![entry("doge", "coin"), entry("dog", "puppy")]);
		assert_eq!(forward, backward);

		// And the two-entry root differs from the one-entry root.
		assert_ne!(forward, trie_root(vec![entry("dog", "puppy")]));
	}

	#[test]
	fn any_value_change_changes_the_root() {
		let base = vec![
			entry("do", "verb"),
			entry("dog", "puppy"),
			entry("doge", "coin"),
			entry("horse", "stallion"),
		];
		let root = trie_root(base.clone());

		for i in 0..base.len() {
			let mut changed = base.clone();
			changed[i].1 = b"changed".to_vec();
			assert_ne!(trie_root(changed), root, "entry {i}");
		}
	}

	#[test]
	fn root_hash_is_hash_of_encoded_trie() {
		let pairs = vec![
			entry("do", "verb"),
			entry("dog", "puppy"),
			entry("doge", "coin"),
			entry("horse", "stallion"),
		];
		let encoded = encoded_trie_root(pairs.clone());
		assert_eq!(trie_root(pairs), hash(&encoded));
	}

	#[test]
	fn large_values_force_hashed_children() {
		// Two entries with 100-byte values cannot be inlined; the branch must
		// reference them by hash, and the root still commits to both.
		let a = (b"dog".to_vec(), vec![0xaa; 100]);
		let b = (b"horse".to_vec(), vec![0xbb; 100]);
		let root = trie_root(vec![a.clone(), b.clone()]);

		let mut b_changed = b;
		b_changed.1[99] = 0xbc;
		assert_ne!(trie_root(vec![a, b_changed]), root);
	}

	#[test]
	fn decode_round_trips_the_encoded_root() {
		let pairs = vec![
			entry("do", "verb"),
			entry("dog", "puppy"),
			entry("doge", "coin"),
			entry("horse", "stallion"),
		];
		let node = Node::from_entries(pairs);
		let decoded = Node::decode(&node.encode_raw()).unwrap();
		// Children over 32 bytes decode as hash references, so compare by
		// root hash, which is identical either way.
		assert_eq!(decoded.calc_hash(), node.calc_hash());
	}

	#[test]
	fn malformed_nodes_fail_closed() {
		use crate::node::TrieError;

		// A 3-item list is not a trie node.
		let mut stream = RlpStream::new_list(3);
		stream.append_empty_data();
		stream.append_empty_data();
		stream.append_empty_data();
		assert!(matches!(
			Node::decode(&stream.out()),
			Err(TrieError::InvalidNode(_))
		));

		// A bare 31-byte string is neither empty nor a hash.
		let bytes = ethvm_rlp::encode(&[0x11u8; 31][..]);
		assert!(matches!(
			Node::decode(&bytes),
			Err(TrieError::InvalidNode(_))
		));

		// Truncated RLP is a decoder error.
		assert!(matches!(
			Node::decode(&[0xc2, 0x80]),
			Err(TrieError::Decoder(_))
		));
	}
}
