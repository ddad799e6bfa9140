use crate::nibbles::Nibbles;
use ethvm_rlp::{decode_item, DecoderError, Item};
use primitive_types::H256;
use thiserror::Error;

/// Errors surfaced when parsing an encoded trie node. A malformed structure
/// always fails closed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrieError {
	#[error(transparent)]
	Decoder(#[from] DecoderError),
	#[error("invalid trie node: {0}")]
	InvalidNode(&'static str),
}

/// One node of the Merkle-Patricia structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
	/// The empty trie.
	Empty,
	/// A 32-byte reference to a node stored out of line.
	Hash(H256),
	/// A 17-slot node fanning out on one nibble, with an optional value for
	/// a key terminating at this depth.
	Branch {
		children: Box<[Node; 16]>,
		value: Vec<u8>,
	},
	/// A shared run of nibbles above a single sub-node.
	Extension { nibbles: Nibbles, child: Box<Node> },
	/// A terminal key suffix and its value.
	Leaf { nibbles: Nibbles, value: Vec<u8> },
}

impl Node {
	/// Build a trie from a set of key-value pairs. Later duplicates of a key
	/// replace earlier ones; insertion order does not affect the result.
	pub fn from_entries<I>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
	{
		let map: std::collections::BTreeMap<Nibbles, Vec<u8>> = pairs
			.into_iter()
			.map(|(k, v)| (Nibbles::from_bytes(&k), v))
			.collect();
		let entries: Vec<(Nibbles, Vec<u8>)> = map.into_iter().collect();

		log::trace!(target: "trie", "building trie over {} entries", entries.len());
		build(&entries, 0)
	}

	/// Parse an encoded node, failing closed on anything malformed.
	///
	/// # Errors
	/// Return `TrieError` for malformed RLP or an invalid node shape.
	pub fn decode(bytes: &[u8]) -> Result<Self, TrieError> {
		let item = decode_item(bytes)?;
		Self::from_item(&item)
	}

	fn from_item(item: &Item) -> Result<Self, TrieError> {
		match item {
			Item::Bytes(bytes) if bytes.is_empty() => Ok(Self::Empty),
			Item::Bytes(bytes) if bytes.len() == 32 => Ok(Self::Hash(H256::from_slice(bytes))),
			Item::Bytes(_) => Err(TrieError::InvalidNode(
				"bare byte string is neither empty nor a hash",
			)),
			Item::List(items) => match items.len() {
				2 => Self::from_pair_item(&items[0], &items[1]),
				17 => Self::from_branch_item(items),
				_ => Err(TrieError::InvalidNode("list arity must be 2 or 17")),
			},
		}
	}

	fn from_pair_item(key: &Item, rest: &Item) -> Result<Self, TrieError> {
		let encoded_path = key
			.as_bytes()
			.ok_or(TrieError::InvalidNode("partial key must be a byte string"))?;
		let (nibbles, is_leaf) = Nibbles::from_hex_prefix_encoding(encoded_path)
			.ok_or(TrieError::InvalidNode("invalid hex-prefix flag"))?;

		if is_leaf {
			let value = rest
				.as_bytes()
				.ok_or(TrieError::InvalidNode("leaf value must be a byte string"))?;
			Ok(Self::Leaf {
				nibbles,
				value: value.to_vec(),
			})
		} else {
			let child = Self::from_item(rest)?;
			if matches!(child, Self::Empty) {
				return Err(TrieError::InvalidNode("extension child must not be empty"));
			}
			Ok(Self::Extension {
				nibbles,
				child: Box::new(child),
			})
		}
	}

	fn from_branch_item(items: &[Item]) -> Result<Self, TrieError> {
		let mut children: Vec<Self> = Vec::with_capacity(16);
		for item in &items[..16] {
			children.push(Self::from_item(item)?);
		}
		let value = items[16]
			.as_bytes()
			.ok_or(TrieError::InvalidNode("branch value must be a byte string"))?;

		let children: [Self; 16] = children
			.try_into()
			.expect("exactly 16 children were collected; qed");
		Ok(Self::Branch {
			children: Box::new(children),
			value: value.to_vec(),
		})
	}
}

/// Recursive shared-prefix partition over entries sorted by nibble sequence.
/// `depth` nibbles of every key are already consumed by the path above.
fn build(entries: &[(Nibbles, Vec<u8>)], depth: usize) -> Node {
	match entries {
		[] => Node::Empty,
		[(key, value)] => Node::Leaf {
			nibbles: key.slice(depth..key.len()),
			value: value.clone(),
		},
		_ => {
			// Entries are sorted, so the common prefix of the whole range is
			// the common prefix of its first and last keys.
			let first = &entries[0].0;
			let last = &entries[entries.len() - 1].0;
			let common = first.common_prefix_len(last);

			if common > depth {
				return Node::Extension {
					nibbles: first.slice(depth..common),
					child: Box::new(build(entries, common)),
				};
			}

			// Keys diverge at this nibble: fan out. A key that ends exactly
			// here can only be the first entry.
			let (value, rest) = if first.len() == depth {
				(entries[0].1.clone(), &entries[1..])
			} else {
				(Vec::new(), entries)
			};

			let mut children: [Node; 16] = core::array::from_fn(|_| Node::Empty);
			let mut start = 0;
			while start < rest.len() {
				let nibble = rest[start].0.at(depth);
				let mut end = start + 1;
				while end < rest.len() && rest[end].0.at(depth) == nibble {
					end += 1;
				}
				children[nibble as usize] = build(&rest[start..end], depth + 1);
				start = end;
			}

			Node::Branch {
				children: Box::new(children),
				value,
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(key: &str, value: &str) -> (Vec<u8>, Vec<u8>) {
		(key.as_bytes().to_vec(), value.as_bytes().to_vec())
	}

	#[test]
	fn empty_set_builds_empty_node() {
		assert_eq!(Node::from_entries(Vec::new()), Node::Empty);
	}

	#[test]
	fn single_entry_builds_leaf() {
		let node = Node::from_entries(vec![entry("dog", "puppy")]);
		match node {
			Node::Leaf { nibbles, value } => {
				assert_eq!(nibbles, crate::Nibbles::from_bytes(b"dog"));
				assert_eq!(value, b"puppy");
			}
			other => panic!("expected leaf, got {other:?}"),
		}
	}

	#[test]
	fn shared_prefix_builds_extension() {
		let node = Node::from_entries(vec![entry("dog", "puppy"), entry("doge", "coin")]);
		// "dog" and "doge" share all six nibbles of "dog"; the trie starts
		// with an extension over them.
		match node {
			Node::Extension { nibbles, child } => {
				assert_eq!(nibbles, crate::Nibbles::from_bytes(b"dog"));
				match *child {
					Node::Branch { ref value, .. } => assert_eq!(value, b"puppy"),
					ref other => panic!("expected branch under extension, got {other:?}"),
				}
			}
			other => panic!("expected extension, got {other:?}"),
		}
	}

	#[test]
	fn diverging_keys_build_branch() {
		// 'd' = 0x64 and 'h' = 0x68 share their first nibble only.
		let node = Node::from_entries(vec![entry("dog", "puppy"), entry("horse", "stallion")]);
		match node {
			Node::Extension { nibbles, child } => {
				assert_eq!(nibbles.len(), 1);
				assert!(matches!(*child, Node::Branch { .. }));
			}
			other => panic!("expected extension, got {other:?}"),
		}
	}

	#[test]
	fn duplicate_keys_keep_the_last_value() {
		let a = Node::from_entries(vec![entry("dog", "puppy"), entry("dog", "hound")]);
		let b = Node::from_entries(vec![entry("dog", "hound")]);
		assert_eq!(a, b);
	}
}
