use crate::maybe_borrowed::MaybeBorrowed;
use crate::Runtime;
use primitive_types::H160;

/// The role a runtime on the call stack was created for.
#[derive(Clone, Copy, Debug)]
pub enum RuntimeKind {
	/// A contract-creation frame, deploying to the given address.
	Create(H160),
	/// A call frame into the given code address.
	Call(H160),
	/// The top-level frame driven by `execute`.
	Execute,
}

/// A runtime tagged with the reason it sits on the call stack, so its exit
/// can be routed to the matching cleanup.
pub struct TaggedRuntime<'borrow> {
	pub kind: RuntimeKind,
	pub inner: MaybeBorrowed<'borrow, Runtime>,
}
