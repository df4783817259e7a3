use std::collections::HashMap;
use std::fmt;

use crate::doc::{DocError, Result, TypeId, ValueId};

/// Identity of a root entry; what handles refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootId(pub u32);

impl fmt::Display for RootId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// One identity-addressable top-level value.
#[derive(Debug, Clone, Copy)]
pub struct RootEntry {
	/// Root identity.
	pub id: RootId,
	/// Declared type.
	pub ty: TypeId,
	/// Owned value.
	pub value: ValueId,
}

/// Insertion-ordered root entries keyed by id.
#[derive(Debug, Clone, Default)]
pub struct RootTable {
	entries: Vec<RootEntry>,
	by_id: HashMap<RootId, usize>,
}

impl RootTable {
	/// Append an entry, failing on a duplicate id.
	pub fn insert(&mut self, entry: RootEntry) -> Result<&RootEntry> {
		if self.by_id.contains_key(&entry.id) {
			return Err(DocError::DuplicateRoot { id: entry.id.0 });
		}
		self.by_id.insert(entry.id, self.entries.len());
		self.entries.push(entry);
		Ok(&self.entries[self.entries.len() - 1])
	}

	/// Look up an entry, failing with [`DocError::NotFound`].
	pub fn get(&self, id: RootId) -> Result<&RootEntry> {
		self.find(id).ok_or(DocError::NotFound { id: id.0 })
	}

	/// Look up an entry without treating absence as an error.
	pub fn find(&self, id: RootId) -> Option<&RootEntry> {
		let idx = self.by_id.get(&id)?;
		self.entries.get(*idx)
	}

	/// Iterate entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &RootEntry> {
		self.entries.iter()
	}

	/// Return number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Return whether there are no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
