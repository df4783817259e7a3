/// Fixed-capacity circular undo/redo buffer.
///
/// Three logical cursors walk the slot ring: `start` is the oldest undoable entry, `current` is
/// the next write position, and `end` is one past the newest redoable entry. One extra slot is
/// kept so `start == end` always means empty and `capacity` entries stay undoable.
#[derive(Debug, Clone)]
pub struct History<T> {
	slots: Vec<Option<T>>,
	start: usize,
	end: usize,
	current: usize,
}

impl<T> History<T> {
	/// Create an empty history retaining up to `capacity` undoable entries (at least one).
	pub fn new(capacity: usize) -> Self {
		let slots = capacity.max(1) + 1;
		Self {
			slots: (0..slots).map(|_| None).collect(),
			start: 0,
			end: 0,
			current: 0,
		}
	}

	/// Number of undoable entries retained before the oldest is evicted.
	pub fn capacity(&self) -> usize {
		self.slots.len() - 1
	}

	/// Record an applied entry, discarding the redo tail and evicting the oldest when full.
	pub fn push(&mut self, item: T) {
		self.slots[self.current] = Some(item);
		self.current = self.next(self.current);
		self.end = self.current;
		if self.current == self.start {
			self.slots[self.start] = None;
			self.start = self.next(self.start);
		}
	}

	/// Step back and return the entry to revert, or `None` when nothing is undoable.
	pub fn pop(&mut self) -> Option<&T> {
		if self.current == self.start {
			return None;
		}
		self.current = self.prev(self.current);
		self.slots[self.current].as_ref()
	}

	/// Return the entry to re-apply and step forward, or `None` when nothing is redoable.
	pub fn consume(&mut self) -> Option<&T> {
		if self.current == self.end {
			return None;
		}
		let at = self.current;
		self.current = self.next(at);
		self.slots[at].as_ref()
	}

	/// Entry the next [`History::pop`] would return, without moving.
	pub fn peek_undo(&self) -> Option<&T> {
		if self.current == self.start {
			return None;
		}
		self.slots[self.prev(self.current)].as_ref()
	}

	/// Entry the next [`History::consume`] would return, without moving.
	pub fn peek_redo(&self) -> Option<&T> {
		if self.current == self.end {
			return None;
		}
		self.slots[self.current].as_ref()
	}

	/// Number of entries [`History::pop`] can return.
	pub fn undo_len(&self) -> usize {
		self.distance(self.start, self.current)
	}

	/// Number of entries [`History::consume`] can return.
	pub fn redo_len(&self) -> usize {
		self.distance(self.current, self.end)
	}

	/// Drop every entry.
	pub fn clear(&mut self) {
		self.slots.iter_mut().for_each(|slot| *slot = None);
		self.start = 0;
		self.end = 0;
		self.current = 0;
	}

	fn next(&self, at: usize) -> usize {
		(at + 1) % self.slots.len()
	}

	fn prev(&self, at: usize) -> usize {
		(at + self.slots.len() - 1) % self.slots.len()
	}

	fn distance(&self, from: usize, to: usize) -> usize {
		(to + self.slots.len() - from) % self.slots.len()
	}
}
