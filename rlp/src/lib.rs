//! Recursive length prefix serialization: the canonical byte-string/list
//! encoding used for trie nodes, address derivation and everything else that
//! gets hashed. Encoding is infallible; decoding is strict and rejects every
//! non-canonical form.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod decode;
mod error;
mod stream;

pub use crate::decode::{decode_item, Item};
pub use crate::error::DecoderError;
pub use crate::stream::{Encodable, RlpStream};

use alloc::vec::Vec;

/// The RLP encoding of an empty byte string.
pub const NULL_RLP: [u8; 1] = [0x80];

/// The RLP encoding of an empty list.
pub const EMPTY_LIST_RLP: [u8; 1] = [0xc0];

/// Encode a single encodable value.
pub fn encode<E: Encodable + ?Sized>(value: &E) -> Vec<u8> {
	let mut stream = RlpStream::new();
	stream.append(value);
	stream.out()
}

/// Encode an [`Item`] tree.
#[must_use]
pub fn encode_item(item: &Item) -> Vec<u8> {
	let mut stream = RlpStream::new();
	append_item(&mut stream, item);
	stream.out()
}

fn append_item(stream: &mut RlpStream, item: &Item) {
	match item {
		Item::Bytes(bytes) => {
			stream.append(&bytes[..]);
		}
		Item::List(items) => {
			stream.begin_list(items.len());
			for item in items {
				append_item(stream, item);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloc::vec;

	#[test]
	fn canonical_byte_string_vectors() {
		assert_eq!(encode(&b""[..]), vec![0x80]);
		assert_eq!(encode(&b"\x0f"[..]), vec![0x0f]);
		assert_eq!(encode(&b"\x80"[..]), vec![0x81, 0x80]);
		assert_eq!(encode(&b"dog"[..]), vec![0x83, b'd', b'o', b'g']);

		// 55 bytes stays in the short form.
		let fifty_five = [0x61u8; 55];
		let encoded = encode(&fifty_five[..]);
		assert_eq!(encoded[0], 0x80 + 55);
		assert_eq!(encoded.len(), 56);

		// 56 bytes takes the long form.
		let fifty_six = [0x61u8; 56];
		let encoded = encode(&fifty_six[..]);
		assert_eq!(&encoded[..2], &[0xb8, 56]);
		assert_eq!(encoded.len(), 58);
	}

	#[test]
	fn canonical_integer_vectors() {
		assert_eq!(encode(&0u64), vec![0x80]);
		assert_eq!(encode(&15u64), vec![0x0f]);
		assert_eq!(hex::encode(encode(&1024u64)), "820400");
	}

	#[test]
	fn canonical_list_vectors() {
		let stream = RlpStream::new_list(0);
		assert_eq!(stream.out(), vec![0xc0]);

		let mut stream = RlpStream::new_list(2);
		stream.append(&b"cat"[..]).append(&b"dog"[..]);
		assert_eq!(
			stream.out(),
			vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
		);

		// The set-theoretic representation of three:
		// [ [], [[]], [ [], [[]] ] ]
		let item = Item::List(vec![
			Item::List(vec![]),
			Item::List(vec![Item::List(vec![])]),
			Item::List(vec![
				Item::List(vec![]),
				Item::List(vec![Item::List(vec![])]),
			]),
		]);
		assert_eq!(
			encode_item(&item),
			vec![0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0]
		);
	}

	#[test]
	fn long_string_vector() {
		let input = b"Lorem ipsum dolor sit amet, consectetur adipisicing elit";
		let encoded = encode(&input[..]);
		assert_eq!(&encoded[..2], &[0xb8, 0x38]);
		assert_eq!(&encoded[2..], &input[..]);
	}

	#[test]
	fn nested_stream_lists() {
		let mut stream = RlpStream::new_list(3);
		stream.append(&b"cat"[..]);
		stream.begin_list(2);
		stream.append(&b"a"[..]).append(&b"b"[..]);
		stream.append(&b"dog"[..]);
		let out = stream.out();
		assert_eq!(decode_item(&out).unwrap(), Item::List(vec![
			Item::Bytes(b"cat".to_vec()),
			Item::List(vec![
				Item::Bytes(b"a".to_vec()),
				Item::Bytes(b"b".to_vec()),
			]),
			Item::Bytes(b"dog".to_vec()),
		]));
	}

	#[test]
	fn append_raw_counts_as_item() {
		let mut stream = RlpStream::new_list(2);
		stream.append_raw(&[0x83, b'c', b'a', b't'], 1);
		stream.append_empty_data();
		assert_eq!(stream.out(), vec![0xc5, 0x83, b'c', b'a', b't', 0x80]);
	}

	#[test]
	fn round_trip_arbitrary_items() {
		let items = [
			Item::Bytes(Vec::new()),
			Item::Bytes(vec![0x00]),
			Item::Bytes(vec![0x7f]),
			Item::Bytes(vec![0x80]),
			Item::Bytes(vec![0xff; 55]),
			Item::Bytes(vec![0xaa; 56]),
			Item::Bytes(vec![0x55; 300]),
			Item::List(Vec::new()),
			Item::List(vec![Item::Bytes(b"dog".to_vec()), Item::List(Vec::new())]),
			Item::List(vec![Item::Bytes(vec![0x11; 100]); 5]),
		];
		for item in &items {
			assert_eq!(decode_item(&encode_item(item)).unwrap(), *item);
		}
	}

	#[test]
	fn agrees_with_reference_encoder() {
		let dog = b"dog".to_vec();
		let empty = Vec::<u8>::new();
		let ours = {
			let mut stream = RlpStream::new_list(3);
			stream.append(&dog).append(&1024u64).append(&empty);
			stream.out()
		};
		let theirs = {
			let mut stream = rlp::RlpStream::new_list(3);
			stream.append(&dog).append(&1024u64).append(&empty);
			stream.out().to_vec()
		};
		assert_eq!(ours, theirs);
	}
}
