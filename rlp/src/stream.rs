use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

/// Structure encodable to RLP.
pub trait Encodable {
	/// Append a value to the stream.
	fn rlp_append(&self, s: &mut RlpStream);
}

/// An RLP stream: appends encoded items into an internal buffer, finalizing
/// each declared list once its item count is reached.
#[derive(Debug, Default)]
pub struct RlpStream {
	buffer: Vec<u8>,
	unfinished: Vec<ListFrame>,
}

#[derive(Debug)]
struct ListFrame {
	/// Position of the list payload start in `buffer`.
	start: usize,
	/// Items still expected before the frame can be finalized.
	remaining: usize,
}

impl RlpStream {
	/// Create a new stream expecting a single value.
	#[must_use]
	pub fn new() -> Self {
		Self {
			buffer: Vec::new(),
			unfinished: Vec::new(),
		}
	}

	/// Create a new stream whose single value is a list of `len` items.
	#[must_use]
	pub fn new_list(len: usize) -> Self {
		let mut stream = Self::new();
		stream.begin_list(len);
		stream
	}

	/// Begin a nested list of `len` items at the current position.
	pub fn begin_list(&mut self, len: usize) -> &mut Self {
		if len == 0 {
			self.buffer.push(0xc0);
			self.note_appended(1);
		} else {
			self.unfinished.push(ListFrame {
				start: self.buffer.len(),
				remaining: len,
			});
		}
		self
	}

	/// Append an encodable value.
	pub fn append<E: Encodable + ?Sized>(&mut self, value: &E) -> &mut Self {
		value.rlp_append(self);
		self
	}

	/// Append an empty byte string.
	pub fn append_empty_data(&mut self) -> &mut Self {
		self.encode_value(&[]);
		self
	}

	/// Append already-encoded RLP bytes, counting as `item_count` items.
	pub fn append_raw(&mut self, bytes: &[u8], item_count: usize) -> &mut Self {
		self.buffer.extend_from_slice(bytes);
		self.note_appended(item_count);
		self
	}

	/// Write one byte string with its canonical prefix.
	pub(crate) fn encode_value(&mut self, value: &[u8]) {
		match value.len() {
			1 if value[0] < 0x80 => self.buffer.push(value[0]),
			len if len < 56 => {
				self.buffer.push(0x80 + len as u8);
				self.buffer.extend_from_slice(value);
			}
			len => {
				let be = to_be_bytes(len);
				self.buffer.push(0xb7 + be.len() as u8);
				self.buffer.extend_from_slice(&be);
				self.buffer.extend_from_slice(value);
			}
		}
		self.note_appended(1);
	}

	/// Note that `count` items were appended, finalizing every list frame
	/// that has just become complete.
	fn note_appended(&mut self, count: usize) {
		if count == 0 {
			return;
		}

		let Some(frame) = self.unfinished.last_mut() else {
			return;
		};
		debug_assert!(frame.remaining >= count, "list is expected to be filled");
		frame.remaining -= count;

		if frame.remaining == 0 {
			let start = frame.start;
			self.unfinished.pop();
			self.finalize_list(start);
			// A finished list is itself one item of its parent.
			self.note_appended(1);
		}
	}

	/// Prefix the payload written since `start` with its list header.
	fn finalize_list(&mut self, start: usize) {
		let len = self.buffer.len() - start;
		if len < 56 {
			self.buffer.insert(start, 0xc0 + len as u8);
		} else {
			let be = to_be_bytes(len);
			let mut prefix = Vec::with_capacity(1 + be.len());
			prefix.push(0xf7 + be.len() as u8);
			prefix.extend_from_slice(&be);
			self.buffer.splice(start..start, prefix);
		}
	}

	/// Consume the stream and return the encoded bytes.
	///
	/// # Panics
	/// Panics if a declared list has not been filled.
	#[must_use]
	pub fn out(self) -> Vec<u8> {
		assert!(
			self.unfinished.is_empty(),
			"stream is expected to be fully built out"
		);
		self.buffer
	}
}

/// Minimal big-endian representation of a length, without leading zeros.
fn to_be_bytes(len: usize) -> Vec<u8> {
	let bytes = len.to_be_bytes();
	let skip = bytes.iter().take_while(|b| **b == 0).count();
	bytes[skip..].to_vec()
}

impl Encodable for [u8] {
	fn rlp_append(&self, s: &mut RlpStream) {
		s.encode_value(self);
	}
}

impl Encodable for Vec<u8> {
	fn rlp_append(&self, s: &mut RlpStream) {
		s.encode_value(self);
	}
}

impl<'a, T: ?Sized + Encodable> Encodable for &'a T {
	fn rlp_append(&self, s: &mut RlpStream) {
		(**self).rlp_append(s);
	}
}

impl Encodable for u8 {
	fn rlp_append(&self, s: &mut RlpStream) {
		if *self == 0 {
			s.encode_value(&[]);
		} else {
			s.encode_value(&[*self]);
		}
	}
}

impl Encodable for u64 {
	fn rlp_append(&self, s: &mut RlpStream) {
		let bytes = self.to_be_bytes();
		let skip = bytes.iter().take_while(|b| **b == 0).count();
		s.encode_value(&bytes[skip..]);
	}
}

impl Encodable for usize {
	fn rlp_append(&self, s: &mut RlpStream) {
		(*self as u64).rlp_append(s);
	}
}

impl Encodable for U256 {
	fn rlp_append(&self, s: &mut RlpStream) {
		let mut bytes = [0u8; 32];
		self.to_big_endian(&mut bytes);
		let skip = bytes.iter().take_while(|b| **b == 0).count();
		s.encode_value(&bytes[skip..]);
	}
}

impl Encodable for H160 {
	fn rlp_append(&self, s: &mut RlpStream) {
		s.encode_value(self.as_bytes());
	}
}

impl Encodable for H256 {
	fn rlp_append(&self, s: &mut RlpStream) {
		s.encode_value(self.as_bytes());
	}
}
