use crate::doc::{Atom, DocError, Document, Result, RootId, Value, ValueId};

/// One reversible primitive edit with its captured pre- and post-edit state.
///
/// Old values are captured when the edit is built and never re-derived, so repeated
/// apply/revert cycles are exact inverses.
#[derive(Debug, Clone)]
pub enum EditOp {
	/// Replace an atom payload.
	SetAtom {
		/// Atom value being edited.
		target: ValueId,
		/// Payload before the edit.
		old: Atom,
		/// Payload after the edit.
		new: Atom,
	},
	/// Replace enum bits.
	SetEnum {
		/// Enum value being edited.
		target: ValueId,
		/// Bits before the edit.
		old: u32,
		/// Bits after the edit.
		new: u32,
	},
	/// Re-point a pointer.
	SetPointer {
		/// Pointer value being edited.
		target: ValueId,
		/// Target before the edit.
		old: Option<ValueId>,
		/// Target after the edit.
		new: Option<ValueId>,
		/// Add `new` to the heap on apply and remove it on revert.
		track: bool,
	},
	/// Re-target a handle.
	SetHandle {
		/// Handle value being edited.
		target: ValueId,
		/// Root before the edit.
		old: Option<RootId>,
		/// Root after the edit.
		new: Option<RootId>,
	},
	/// Allocate, clear, or replace a whole array.
	SetArray {
		/// Array value being edited.
		target: ValueId,
		/// Allocation before the edit.
		old: Option<Vec<ValueId>>,
		/// Allocation after the edit.
		new: Option<Vec<ValueId>>,
	},
	/// Insert an element.
	Insert {
		/// Array value being edited.
		array: ValueId,
		/// Insert position.
		index: usize,
		/// Element inserted.
		item: ValueId,
		/// Add `item` to the heap on apply and remove it on revert.
		track: bool,
	},
	/// Remove an element.
	Remove {
		/// Array value being edited.
		array: ValueId,
		/// Position of `item`.
		index: usize,
		/// Element removed.
		item: ValueId,
	},
	/// Several ops applied in order and reverted in reverse order as one step.
	Batch(Vec<EditOp>),
}

impl EditOp {
	/// Return the value the edit targets; batches report their first member.
	pub fn target(&self) -> Option<ValueId> {
		match self {
			Self::SetAtom { target, .. }
			| Self::SetEnum { target, .. }
			| Self::SetPointer { target, .. }
			| Self::SetHandle { target, .. }
			| Self::SetArray { target, .. } => Some(*target),
			Self::Insert { array, .. } | Self::Remove { array, .. } => Some(*array),
			Self::Batch(ops) => ops.first().and_then(Self::target),
		}
	}
}

/// Labelled reversible edit.
#[derive(Debug, Clone)]
pub struct Command {
	label: Box<str>,
	op: EditOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
	Forward,
	Backward,
}

impl Direction {
	fn pick<'a, T>(self, old: &'a T, new: &'a T) -> (&'a T, &'a T) {
		match self {
			Self::Forward => (old, new),
			Self::Backward => (new, old),
		}
	}

	fn flip(self) -> Self {
		match self {
			Self::Forward => Self::Backward,
			Self::Backward => Self::Forward,
		}
	}
}

impl Command {
	/// Wrap an op with a human-readable label.
	pub fn new(label: impl Into<Box<str>>, op: EditOp) -> Self {
		Self { label: label.into(), op }
	}

	/// Return the label.
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Return the wrapped op.
	pub fn op(&self) -> &EditOp {
		&self.op
	}

	/// Return the targeted value.
	pub fn target(&self) -> Option<ValueId> {
		self.op.target()
	}

	/// Run the Do action.
	///
	/// Fails with [`DocError::InvariantViolation`] and leaves the document untouched when the
	/// live graph no longer matches the captured target.
	pub fn apply(&self, doc: &mut Document) -> Result<()> {
		run(&self.op, doc, Direction::Forward)?;
		debug_assert!(holds(&self.op, doc, Direction::Forward), "apply of {:?} did not reach the captured post-state", self.label);
		Ok(())
	}

	/// Run the Undo action.
	///
	/// # Panics
	///
	/// In debug builds, panics when the revert does not restore the captured pre-state.
	pub fn revert(&self, doc: &mut Document) -> Result<()> {
		run(&self.op, doc, Direction::Backward)?;
		debug_assert!(holds(&self.op, doc, Direction::Backward), "revert of {:?} did not restore the captured pre-state", self.label);
		Ok(())
	}
}

fn run(op: &EditOp, doc: &mut Document, dir: Direction) -> Result<()> {
	match op {
		EditOp::SetAtom { target, old, new } => {
			let (_, to) = dir.pick(old, new);
			match &mut doc.node_mut(*target)?.value {
				Value::Atom(current) if current.kind() == to.kind() => {
					*current = to.clone();
					Ok(())
				}
				other => Err(shape(*target, &format!("{} atom", to.kind().as_str()), other)),
			}
		}
		EditOp::SetEnum { target, old, new } => {
			let (_, to) = dir.pick(old, new);
			match &mut doc.node_mut(*target)?.value {
				Value::Enum(bits) => {
					*bits = *to;
					Ok(())
				}
				other => Err(shape(*target, "enum", other)),
			}
		}
		EditOp::SetPointer { target, old, new, track } => {
			let (from, to) = dir.pick(old, new);
			let node = doc.node(*target)?;
			let Value::Pointer(current) = node.value else {
				return Err(shape(*target, "pointer", &node.value));
			};
			if current != *from {
				return Err(violation(format!("pointer {target} changed since the edit was captured")));
			}
			if let Some(to) = to {
				let base = doc.schema().base(node.ty).ok_or_else(|| violation(format!("pointer {target} has no base type")))?;
				doc.schema().check_assignable(doc.type_of(*to)?, base)?;
			}

			doc.node_mut(*target)?.value = Value::Pointer(*to);
			if let (true, Some(item)) = (*track, new) {
				match dir {
					Direction::Forward => doc.heap_add(*item),
					Direction::Backward => doc.heap_remove(*item),
				};
			}
			Ok(())
		}
		EditOp::SetHandle { target, old, new } => {
			let (_, to) = dir.pick(old, new);
			match &mut doc.node_mut(*target)?.value {
				Value::Handle(current) => {
					*current = *to;
					Ok(())
				}
				other => Err(shape(*target, "handle", other)),
			}
		}
		EditOp::SetArray { target, old, new } => {
			let (from, to) = dir.pick(old, new);
			match &mut doc.node_mut(*target)?.value {
				Value::Array(current) if *current == *from => {
					current.clone_from(to);
					Ok(())
				}
				Value::Array(_) => Err(violation(format!("array {target} changed since the edit was captured"))),
				other => Err(shape(*target, "array", other)),
			}
		}
		EditOp::Insert { array, index, item, track } => {
			match dir {
				Direction::Forward => insert_at(doc, *array, *index, *item)?,
				Direction::Backward => remove_at(doc, *array, *index, *item)?,
			}
			if *track {
				match dir {
					Direction::Forward => doc.heap_add(*item),
					Direction::Backward => doc.heap_remove(*item),
				};
			}
			Ok(())
		}
		EditOp::Remove { array, index, item } => match dir {
			Direction::Forward => remove_at(doc, *array, *index, *item),
			Direction::Backward => insert_at(doc, *array, *index, *item),
		},
		EditOp::Batch(ops) => run_batch(ops, doc, dir),
	}
}

fn run_batch(ops: &[EditOp], doc: &mut Document, dir: Direction) -> Result<()> {
	let order: Vec<&EditOp> = match dir {
		Direction::Forward => ops.iter().collect(),
		Direction::Backward => ops.iter().rev().collect(),
	};

	for (done, op) in order.iter().enumerate() {
		if let Err(err) = run(op, doc, dir) {
			for applied in order[..done].iter().rev() {
				let rollback = run(applied, doc, dir.flip());
				debug_assert!(rollback.is_ok(), "batch rollback failed: {rollback:?}");
			}
			return Err(err);
		}
	}
	Ok(())
}

fn insert_at(doc: &mut Document, array: ValueId, index: usize, item: ValueId) -> Result<()> {
	doc.node(item)?;
	match &mut doc.node_mut(array)?.value {
		Value::Array(Some(items)) if index <= items.len() => {
			items.insert(index, item);
			Ok(())
		}
		Value::Array(Some(items)) => Err(violation(format!("insert index {index} out of range for array {array} (len={})", items.len()))),
		Value::Array(None) => Err(violation(format!("array {array} is not allocated"))),
		other => Err(shape(array, "array", other)),
	}
}

fn remove_at(doc: &mut Document, array: ValueId, index: usize, item: ValueId) -> Result<()> {
	match &mut doc.node_mut(array)?.value {
		Value::Array(Some(items)) if items.get(index) == Some(&item) => {
			items.remove(index);
			Ok(())
		}
		Value::Array(Some(_)) => Err(violation(format!("array {array} does not hold {item} at index {index}"))),
		Value::Array(None) => Err(violation(format!("array {array} is not allocated"))),
		other => Err(shape(array, "array", other)),
	}
}

/// Check that the op's target shows the state it should have after running in `dir`.
///
/// A batch is checked by its net effect per target.
fn holds(op: &EditOp, doc: &Document, dir: Direction) -> bool {
	let value = |id: ValueId| doc.value(id).ok();
	match op {
		EditOp::SetAtom { target, old, new } => {
			let (_, to) = dir.pick(old, new);
			matches!(value(*target), Some(Value::Atom(atom)) if atom.same(to))
		}
		EditOp::SetEnum { target, old, new } => {
			let (_, to) = dir.pick(old, new);
			matches!(value(*target), Some(Value::Enum(bits)) if bits == to)
		}
		EditOp::SetPointer { target, old, new, .. } => {
			let (_, to) = dir.pick(old, new);
			matches!(value(*target), Some(Value::Pointer(current)) if current == to)
		}
		EditOp::SetHandle { target, old, new } => {
			let (_, to) = dir.pick(old, new);
			matches!(value(*target), Some(Value::Handle(current)) if current == to)
		}
		EditOp::SetArray { target, old, new } => {
			let (_, to) = dir.pick(old, new);
			matches!(value(*target), Some(Value::Array(current)) if current == to)
		}
		EditOp::Insert { array, index, item, .. } | EditOp::Remove { array, index, item } => {
			let inserted = matches!(op, EditOp::Insert { .. }) == (dir == Direction::Forward);
			match value(*array) {
				Some(Value::Array(Some(items))) if inserted => items.get(*index) == Some(item),
				Some(Value::Array(Some(items))) => !items.contains(item),
				_ => false,
			}
		}
		EditOp::Batch(ops) => {
			let mut leaves = Vec::new();
			flatten(ops, &mut leaves);
			// Only the member that touches a target last in run order determines its final state.
			leaves.iter().enumerate().all(|(at, leaf)| {
				let target = leaf.target();
				let superseded = match dir {
					Direction::Forward => leaves[at + 1..].iter().any(|later| later.target() == target),
					Direction::Backward => leaves[..at].iter().any(|earlier| earlier.target() == target),
				};
				superseded || holds(leaf, doc, dir)
			})
		}
	}
}

fn flatten<'a>(ops: &'a [EditOp], leaves: &mut Vec<&'a EditOp>) {
	for op in ops {
		match op {
			EditOp::Batch(inner) => flatten(inner, leaves),
			leaf => leaves.push(leaf),
		}
	}
}

fn shape(target: ValueId, expected: &str, got: &Value) -> DocError {
	violation(format!("{target} expected {expected}, found {}", got.kind_label()))
}

fn violation(reason: String) -> DocError {
	DocError::InvariantViolation { reason }
}
