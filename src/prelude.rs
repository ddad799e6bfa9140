pub use alloc::{
	borrow::Cow,
	boxed::Box,
	collections::{btree_map::BTreeMap, btree_set::BTreeSet},
	rc::Rc,
	string::{String, ToString},
	vec,
	vec::Vec,
};
