use core::fmt;

/// Error concerning the RLP decoder. Every non-canonical encoding is
/// rejected; a malformed structure never decodes to a best guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderError {
	/// Data has additional bytes at the end of the valid RLP fragment.
	RlpIsTooBig,
	/// Data has too few bytes for valid RLP.
	RlpIsTooShort,
	/// Length prefix declares a short payload in the long form.
	RlpInvalidLength,
	/// A single byte below 0x80 must encode as itself.
	RlpInvalidIndirection,
	/// Byte-string length prefix has leading zero bytes.
	RlpDataLenWithZeroPrefix,
	/// List length prefix has leading zero bytes.
	RlpListLenWithZeroPrefix,
	/// Declared payload length is inconsistent with the data.
	RlpInconsistentLengthAndData,
}

impl fmt::Display for DecoderError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let msg = match self {
			Self::RlpIsTooBig => "trailing bytes after valid rlp fragment",
			Self::RlpIsTooShort => "input too short",
			Self::RlpInvalidLength => "long form used for a short payload",
			Self::RlpInvalidIndirection => "single byte below 0x80 must encode as itself",
			Self::RlpDataLenWithZeroPrefix => "data length prefix has leading zeros",
			Self::RlpListLenWithZeroPrefix => "list length prefix has leading zeros",
			Self::RlpInconsistentLengthAndData => "declared length inconsistent with data",
		};
		write!(f, "{msg}")
	}
}

#[cfg(feature = "std")]
impl std::error::Error for DecoderError {}
