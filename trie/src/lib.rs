//! Merkle-Patricia trie construction and hashing: commits an ordered set of
//! key-value pairs to a single 32-byte root, bit-identical across conforming
//! implementations. Nodes encoding to fewer than 32 bytes are inlined in
//! their parent; larger nodes are replaced by their Keccak-256 hash.

mod hashing;
mod nibbles;
mod node;

pub use crate::hashing::{encoded_trie_root, trie_root, KECCAK_NULL_RLP};
pub use crate::nibbles::Nibbles;
pub use crate::node::{Node, TrieError};
