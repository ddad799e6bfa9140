use core::ops::{Deref, DerefMut};

/// A value that is either borrowed from the caller or owned by the holder.
/// Unlike `Cow`, access never clones.
pub enum MaybeBorrowed<'a, T> {
	/// Borrowed value.
	Borrowed(&'a mut T),
	/// Owned value.
	Owned(T),
}

impl<'a, T> Deref for MaybeBorrowed<'a, T> {
	type Target = T;

	fn deref(&self) -> &Self::Target {
		match self {
			Self::Borrowed(x) => x,
			Self::Owned(x) => x,
		}
	}
}

impl<'a, T> DerefMut for MaybeBorrowed<'a, T> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		match self {
			Self::Borrowed(x) => x,
			Self::Owned(x) => x,
		}
	}
}
