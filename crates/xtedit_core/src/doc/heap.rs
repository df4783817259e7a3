use std::collections::HashSet;

use crate::doc::ValueId;

/// Pool of struct values available for adoption by pointers.
///
/// Keeps insertion order; each value appears at most once.
#[derive(Debug, Clone, Default)]
pub struct RefHeap {
	order: Vec<ValueId>,
	members: HashSet<ValueId>,
}

impl RefHeap {
	/// Add a value, returning whether it was newly inserted.
	pub fn add(&mut self, value: ValueId) -> bool {
		if !self.members.insert(value) {
			return false;
		}
		self.order.push(value);
		true
	}

	/// Remove a value, returning whether it was present. Absent values are a no-op.
	pub fn remove(&mut self, value: ValueId) -> bool {
		if !self.members.remove(&value) {
			return false;
		}
		self.order.retain(|item| *item != value);
		true
	}

	/// Return whether the value is in the heap.
	pub fn contains(&self, value: ValueId) -> bool {
		self.members.contains(&value)
	}

	/// Iterate entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = ValueId> + '_ {
		self.order.iter().copied()
	}

	/// Return entry at an insertion-order position.
	pub fn nth(&self, index: usize) -> Option<ValueId> {
		self.order.get(index).copied()
	}

	/// Return number of entries.
	pub fn len(&self) -> usize {
		self.order.len()
	}

	/// Return whether the heap is empty.
	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}
}
