pub use alloc::{
	borrow::Cow,
	boxed::Box,
	rc::Rc,
	string::{String, ToString},
	vec,
	vec::Vec,
};
