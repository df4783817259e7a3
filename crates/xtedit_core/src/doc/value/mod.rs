use std::fmt;

use crate::doc::{AtomKind, DocError, Result, RootId, TypeId};

/// Stable arena index of one value node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl fmt::Display for ValueId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Primitive payload of an atom value.
#[derive(Debug, Clone)]
pub enum Atom {
	/// Boolean flag.
	Bool(bool),
	/// Signed 8-bit integer.
	I8(i8),
	/// Signed 16-bit integer.
	I16(i16),
	/// Signed 32-bit integer.
	I32(i32),
	/// Signed 64-bit integer.
	I64(i64),
	/// Unsigned 8-bit integer.
	U8(u8),
	/// Unsigned 16-bit integer.
	U16(u16),
	/// Unsigned 32-bit integer.
	U32(u32),
	/// Unsigned 64-bit integer.
	U64(u64),
	/// 32-bit float.
	F32(f32),
	/// 64-bit float.
	F64(f64),
	/// Fixed-size string.
	String(Box<str>),
	/// Localized-string identifier.
	LocId(u32),
}

impl Atom {
	/// Longest string payload, in bytes, that [`Atom::parse`] accepts.
	pub const MAX_STRING_LEN: usize = 255;

	/// Zero value for a primitive kind.
	pub fn default_for(kind: AtomKind) -> Self {
		match kind {
			AtomKind::Bool => Self::Bool(false),
			AtomKind::I8 => Self::I8(0),
			AtomKind::I16 => Self::I16(0),
			AtomKind::I32 => Self::I32(0),
			AtomKind::I64 => Self::I64(0),
			AtomKind::U8 => Self::U8(0),
			AtomKind::U16 => Self::U16(0),
			AtomKind::U32 => Self::U32(0),
			AtomKind::U64 => Self::U64(0),
			AtomKind::F32 => Self::F32(0.0),
			AtomKind::F64 => Self::F64(0.0),
			AtomKind::String => Self::String("".into()),
			AtomKind::LocId => Self::LocId(0),
		}
	}

	/// Return the primitive kind of this payload.
	pub fn kind(&self) -> AtomKind {
		match self {
			Self::Bool(_) => AtomKind::Bool,
			Self::I8(_) => AtomKind::I8,
			Self::I16(_) => AtomKind::I16,
			Self::I32(_) => AtomKind::I32,
			Self::I64(_) => AtomKind::I64,
			Self::U8(_) => AtomKind::U8,
			Self::U16(_) => AtomKind::U16,
			Self::U32(_) => AtomKind::U32,
			Self::U64(_) => AtomKind::U64,
			Self::F32(_) => AtomKind::F32,
			Self::F64(_) => AtomKind::F64,
			Self::String(_) => AtomKind::String,
			Self::LocId(_) => AtomKind::LocId,
		}
	}

	/// Parse text as a payload of the given kind.
	///
	/// Strings are taken verbatim but may not exceed [`Atom::MAX_STRING_LEN`] bytes.
	pub fn parse(kind: AtomKind, text: &str) -> Result<Self> {
		let bad = || DocError::InvalidLiteral {
			kind: kind.as_str(),
			text: text.to_owned(),
		};
		let trimmed = text.trim();
		Ok(match kind {
			AtomKind::Bool => match trimmed {
				"true" | "1" => Self::Bool(true),
				"false" | "0" => Self::Bool(false),
				_ => return Err(bad()),
			},
			AtomKind::I8 => Self::I8(trimmed.parse().map_err(|_| bad())?),
			AtomKind::I16 => Self::I16(trimmed.parse().map_err(|_| bad())?),
			AtomKind::I32 => Self::I32(trimmed.parse().map_err(|_| bad())?),
			AtomKind::I64 => Self::I64(trimmed.parse().map_err(|_| bad())?),
			AtomKind::U8 => Self::U8(trimmed.parse().map_err(|_| bad())?),
			AtomKind::U16 => Self::U16(trimmed.parse().map_err(|_| bad())?),
			AtomKind::U32 => Self::U32(trimmed.parse().map_err(|_| bad())?),
			AtomKind::U64 => Self::U64(trimmed.parse().map_err(|_| bad())?),
			AtomKind::F32 => Self::F32(trimmed.parse().map_err(|_| bad())?),
			AtomKind::F64 => Self::F64(trimmed.parse().map_err(|_| bad())?),
			AtomKind::String if text.len() > Self::MAX_STRING_LEN => return Err(bad()),
			AtomKind::String => Self::String(text.into()),
			AtomKind::LocId => Self::LocId(trimmed.parse().map_err(|_| bad())?),
		})
	}

	/// Exact comparison; floats compare by bit pattern so NaN payloads restore faithfully.
	pub fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
			(Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::I8(a), Self::I8(b)) => a == b,
			(Self::I16(a), Self::I16(b)) => a == b,
			(Self::I32(a), Self::I32(b)) => a == b,
			(Self::I64(a), Self::I64(b)) => a == b,
			(Self::U8(a), Self::U8(b)) => a == b,
			(Self::U16(a), Self::U16(b)) => a == b,
			(Self::U32(a), Self::U32(b)) => a == b,
			(Self::U64(a), Self::U64(b)) => a == b,
			(Self::String(a), Self::String(b)) => a == b,
			(Self::LocId(a), Self::LocId(b)) => a == b,
			_ => false,
		}
	}

	/// Widen numeric payloads to `f64` for handlers that treat components uniformly.
	pub fn as_f64(&self) -> Option<f64> {
		Some(match self {
			Self::I8(v) => f64::from(*v),
			Self::I16(v) => f64::from(*v),
			Self::I32(v) => f64::from(*v),
			Self::I64(v) => *v as f64,
			Self::U8(v) => f64::from(*v),
			Self::U16(v) => f64::from(*v),
			Self::U32(v) => f64::from(*v),
			Self::U64(v) => *v as f64,
			Self::F32(v) => f64::from(*v),
			Self::F64(v) => *v,
			Self::LocId(v) => f64::from(*v),
			Self::Bool(_) | Self::String(_) => return None,
		})
	}
}

impl fmt::Display for Atom {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool(v) => write!(f, "{v}"),
			Self::I8(v) => write!(f, "{v}"),
			Self::I16(v) => write!(f, "{v}"),
			Self::I32(v) => write!(f, "{v}"),
			Self::I64(v) => write!(f, "{v}"),
			Self::U8(v) => write!(f, "{v}"),
			Self::U16(v) => write!(f, "{v}"),
			Self::U32(v) => write!(f, "{v}"),
			Self::U64(v) => write!(f, "{v}"),
			Self::F32(v) => write!(f, "{v}"),
			Self::F64(v) => write!(f, "{v}"),
			Self::String(v) => write!(f, "{v:?}"),
			Self::LocId(v) => write!(f, "loc:{v}"),
		}
	}
}

/// Variant payload of one value node.
#[derive(Debug, Clone)]
pub enum Value {
	/// Primitive payload.
	Atom(Atom),
	/// Per-instance field values, index-aligned with the type's field layout.
	Struct(Vec<ValueId>),
	/// Elements, or `None` when no array is allocated.
	Array(Option<Vec<ValueId>>),
	/// Owned target, or `None` when null.
	Pointer(Option<ValueId>),
	/// Referenced root id, or `None` when null.
	Handle(Option<RootId>),
	/// Raw enum bits.
	Enum(u32),
}

impl Value {
	/// Return a short label for the variant.
	pub fn kind_label(&self) -> &'static str {
		match self {
			Self::Atom(_) => "atom",
			Self::Struct(_) => "struct",
			Self::Array(_) => "array",
			Self::Pointer(_) => "pointer",
			Self::Handle(_) => "handle",
			Self::Enum(_) => "enum",
		}
	}
}

/// One arena slot: a value together with its declared type.
#[derive(Debug, Clone)]
pub struct Node {
	/// Runtime type of the value.
	pub ty: TypeId,
	/// Variant payload.
	pub value: Value,
}

/// Append-only storage of value nodes addressed by [`ValueId`].
///
/// Detached nodes are never freed so that undo can reattach them.
#[derive(Debug, Clone, Default)]
pub struct ValueArena {
	nodes: Vec<Node>,
}

impl ValueArena {
	/// Store a node and return its id.
	pub fn alloc(&mut self, ty: TypeId, value: Value) -> ValueId {
		let id = ValueId(self.nodes.len() as u32);
		self.nodes.push(Node { ty, value });
		id
	}

	/// Look up a node.
	pub fn get(&self, id: ValueId) -> Option<&Node> {
		self.nodes.get(id.0 as usize)
	}

	/// Look up a node mutably.
	pub fn get_mut(&mut self, id: ValueId) -> Option<&mut Node> {
		self.nodes.get_mut(id.0 as usize)
	}

	/// Return number of allocated nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Return whether the arena is empty.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

#[cfg(test)]
mod tests;
