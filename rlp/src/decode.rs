use crate::DecoderError;
use alloc::vec::Vec;

/// An owned RLP value: a byte string or a list of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
	/// A byte string.
	Bytes(Vec<u8>),
	/// A list of values.
	List(Vec<Item>),
}

impl Item {
	/// Whether this item is a byte string.
	#[must_use]
	pub const fn is_bytes(&self) -> bool {
		matches!(self, Self::Bytes(_))
	}

	/// The byte string, if this item is one.
	#[must_use]
	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Self::Bytes(bytes) => Some(bytes),
			Self::List(_) => None,
		}
	}

	/// The list elements, if this item is a list.
	#[must_use]
	pub fn as_list(&self) -> Option<&[Item]> {
		match self {
			Self::Bytes(_) => None,
			Self::List(items) => Some(items),
		}
	}
}

/// Decode a complete RLP value. Trailing bytes are an error.
///
/// # Errors
/// Return `DecoderError` for every malformed or non-canonical encoding.
pub fn decode_item(bytes: &[u8]) -> Result<Item, DecoderError> {
	let (item, consumed) = parse_item(bytes)?;
	if consumed != bytes.len() {
		return Err(DecoderError::RlpIsTooBig);
	}
	Ok(item)
}

fn parse_item(bytes: &[u8]) -> Result<(Item, usize), DecoderError> {
	let first = *bytes.first().ok_or(DecoderError::RlpIsTooShort)?;

	match first {
		0x00..=0x7f => Ok((Item::Bytes(alloc::vec![first]), 1)),
		0x80..=0xb7 => {
			let len = (first - 0x80) as usize;
			let payload = slice(bytes, 1, len)?;
			if len == 1 && payload[0] < 0x80 {
				return Err(DecoderError::RlpInvalidIndirection);
			}
			Ok((Item::Bytes(payload.to_vec()), 1 + len))
		}
		0xb8..=0xbf => {
			let len_of_len = (first - 0xb7) as usize;
			let len = parse_length(bytes, len_of_len, DecoderError::RlpDataLenWithZeroPrefix)?;
			let payload = slice(bytes, 1 + len_of_len, len)?;
			Ok((Item::Bytes(payload.to_vec()), 1 + len_of_len + len))
		}
		0xc0..=0xf7 => {
			let len = (first - 0xc0) as usize;
			let payload = slice(bytes, 1, len)?;
			let items = parse_list_payload(payload)?;
			Ok((Item::List(items), 1 + len))
		}
		0xf8..=0xff => {
			let len_of_len = (first - 0xf7) as usize;
			let len = parse_length(bytes, len_of_len, DecoderError::RlpListLenWithZeroPrefix)?;
			let payload = slice(bytes, 1 + len_of_len, len)?;
			let items = parse_list_payload(payload)?;
			Ok((Item::List(items), 1 + len_of_len + len))
		}
	}
}

fn parse_list_payload(mut payload: &[u8]) -> Result<Vec<Item>, DecoderError> {
	let mut items = Vec::new();
	while !payload.is_empty() {
		let (item, consumed) = parse_item(payload)?;
		items.push(item);
		payload = &payload[consumed..];
	}
	Ok(items)
}

/// Parse a long-form length of `len_of_len` big-endian bytes, enforcing
/// canonicality: no leading zeros, and the value must require the long form.
fn parse_length(
	bytes: &[u8],
	len_of_len: usize,
	zero_prefix_error: DecoderError,
) -> Result<usize, DecoderError> {
	let len_bytes = slice(bytes, 1, len_of_len)?;
	if len_bytes[0] == 0 {
		return Err(zero_prefix_error);
	}
	if len_of_len > core::mem::size_of::<usize>() {
		return Err(DecoderError::RlpInconsistentLengthAndData);
	}

	let mut len = 0usize;
	for byte in len_bytes {
		len = len
			.checked_mul(256)
			.and_then(|l| l.checked_add(*byte as usize))
			.ok_or(DecoderError::RlpInconsistentLengthAndData)?;
	}

	if len < 56 {
		return Err(DecoderError::RlpInvalidLength);
	}

	Ok(len)
}

fn slice(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], DecoderError> {
	let end = offset
		.checked_add(len)
		.ok_or(DecoderError::RlpIsTooShort)?;
	bytes.get(offset..end).ok_or(DecoderError::RlpIsTooShort)
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloc::vec;

	#[test]
	fn rejects_non_minimal_single_byte() {
		assert_eq!(
			decode_item(&[0x81, 0x05]),
			Err(DecoderError::RlpInvalidIndirection)
		);
		// 0x81 0x80 is canonical: the byte is not below 0x80.
		assert_eq!(
			decode_item(&[0x81, 0x80]),
			Ok(Item::Bytes(vec![0x80]))
		);
	}

	#[test]
	fn rejects_truncated_input() {
		assert_eq!(decode_item(&[]), Err(DecoderError::RlpIsTooShort));
		assert_eq!(decode_item(&[0x83, b'd', b'o']), Err(DecoderError::RlpIsTooShort));
		assert_eq!(decode_item(&[0xb8]), Err(DecoderError::RlpIsTooShort));
		assert_eq!(decode_item(&[0xc2, 0x81]), Err(DecoderError::RlpIsTooShort));
	}

	#[test]
	fn rejects_trailing_bytes() {
		assert_eq!(
			decode_item(&[0x83, b'd', b'o', b'g', 0x00]),
			Err(DecoderError::RlpIsTooBig)
		);
	}

	#[test]
	fn rejects_long_form_for_short_payload() {
		let mut bytes = vec![0xb8, 0x05];
		bytes.extend_from_slice(&[0u8; 5]);
		assert_eq!(decode_item(&bytes), Err(DecoderError::RlpInvalidLength));
	}

	#[test]
	fn rejects_length_with_zero_prefix() {
		let mut bytes = vec![0xb9, 0x00, 0x38];
		bytes.extend_from_slice(&[0u8; 56]);
		assert_eq!(
			decode_item(&bytes),
			Err(DecoderError::RlpDataLenWithZeroPrefix)
		);
	}

	#[test]
	fn decodes_nested_lists() {
		assert_eq!(
			decode_item(&[0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0]),
			Ok(Item::List(vec![
				Item::List(vec![]),
				Item::List(vec![Item::List(vec![])]),
				Item::List(vec![
					Item::List(vec![]),
					Item::List(vec![Item::List(vec![])]),
				]),
			]))
		);
	}
}
