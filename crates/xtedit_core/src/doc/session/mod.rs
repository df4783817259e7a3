use tracing::{debug, warn};

use crate::doc::{Atom, Command, DocError, Document, EditOp, History, Result, RootId, TypeId, TypeKind, Value, ValueId};

/// Tunables for an [`EditSession`].
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
	/// Undoable commands retained by the history.
	pub history_capacity: usize,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self { history_capacity: 128 }
	}
}

/// Coarse session phase observable between calls.
///
/// Committing happens entirely inside [`EditSession::commit`], which holds the session
/// exclusively and always returns to [`SessionState::Idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	/// No pass is open and nothing is pending.
	Idle,
	/// Commands are queued and waiting for [`EditSession::commit`].
	Collecting,
}

/// Command that failed its shape check during commit.
#[derive(Debug)]
pub struct Rejected {
	/// Label of the rejected command.
	pub label: String,
	/// Failure reported by the command.
	pub error: DocError,
}

/// Outcome of one [`EditSession::commit`].
#[derive(Debug, Default)]
pub struct CommitReport {
	/// Number of commands applied and pushed onto the history.
	pub applied: usize,
	/// Commands that were dropped.
	pub rejected: Vec<Rejected>,
}

/// Owns a document together with its pending edits and undo/redo history.
#[derive(Debug)]
pub struct EditSession {
	doc: Document,
	pending: Vec<Command>,
	history: History<Command>,
	dirty: i64,
	state: SessionState,
}

impl EditSession {
	/// Start a session over `doc` with default options.
	pub fn new(doc: Document) -> Self {
		Self::with_options(doc, SessionOptions::default())
	}

	/// Start a session over `doc`.
	pub fn with_options(doc: Document, options: SessionOptions) -> Self {
		Self {
			doc,
			pending: Vec::new(),
			history: History::new(options.history_capacity),
			dirty: 0,
			state: SessionState::Idle,
		}
	}

	/// Return the live document.
	pub fn doc(&self) -> &Document {
		&self.doc
	}

	/// Give up the session and return the document.
	pub fn into_document(self) -> Document {
		self.doc
	}

	/// Return the session phase.
	pub fn state(&self) -> SessionState {
		self.state
	}

	/// Return the history.
	pub fn history(&self) -> &History<Command> {
		&self.history
	}

	/// Return queued commands.
	pub fn pending(&self) -> &[Command] {
		&self.pending
	}

	/// Net count of applied edits since the last save; zero means clean.
	pub fn dirty(&self) -> i64 {
		self.dirty
	}

	/// Return whether the document differs from the last save.
	pub fn is_dirty(&self) -> bool {
		self.dirty != 0
	}

	/// Reset the dirty counter after the document was written.
	pub fn mark_saved(&mut self) {
		self.dirty = 0;
	}

	/// Open an edit pass that queues commands for the next commit.
	pub fn begin_pass(&mut self) -> EditPass<'_> {
		EditPass { session: self }
	}

	/// Apply every pending command in order and push each onto the history.
	///
	/// A command whose target no longer matches the live graph is rejected and reported; the
	/// remaining commands still commit.
	pub fn commit(&mut self) -> CommitReport {
		let mut report = CommitReport::default();

		for command in std::mem::take(&mut self.pending) {
			match command.apply(&mut self.doc) {
				Ok(()) => {
					debug!(label = command.label(), "committed");
					self.history.push(command);
					report.applied += 1;
				}
				Err(error) => {
					warn!(label = command.label(), %error, "rejected command");
					report.rejected.push(Rejected {
						label: command.label().to_owned(),
						error,
					});
				}
			}
		}

		self.dirty += report.applied as i64;
		self.state = SessionState::Idle;
		report
	}

	/// Revert the newest applied command and return its label.
	///
	/// The history cursor only moves when the revert succeeds.
	pub fn undo(&mut self) -> Result<String> {
		let command = self.history.peek_undo().ok_or(DocError::EmptyHistory)?;
		command.revert(&mut self.doc)?;
		let label = command.label().to_owned();
		self.history.pop();
		self.dirty -= 1;
		debug!(label = %label, "undo");
		Ok(label)
	}

	/// Re-apply the newest reverted command and return its label.
	pub fn redo(&mut self) -> Result<String> {
		let command = self.history.peek_redo().ok_or(DocError::EmptyHistory)?;
		command.apply(&mut self.doc)?;
		let label = command.label().to_owned();
		self.history.consume();
		self.dirty += 1;
		debug!(label = %label, "redo");
		Ok(label)
	}
}

/// One traversal pass: read the document, queue edits.
///
/// Nothing queued here touches the graph until [`EditSession::commit`]. Values allocated for
/// new pointer targets or array elements stay detached until then.
#[derive(Debug)]
pub struct EditPass<'s> {
	session: &'s mut EditSession,
}

impl EditPass<'_> {
	/// Return the document as of the start of the pass.
	pub fn doc(&self) -> &Document {
		&self.session.doc
	}

	/// Queue a prebuilt command.
	pub fn push(&mut self, command: Command) {
		self.session.pending.push(command);
		self.session.state = SessionState::Collecting;
	}

	/// Queue several ops as a single undo step.
	pub fn batch(&mut self, label: impl Into<Box<str>>, ops: Vec<EditOp>) {
		if !ops.is_empty() {
			self.push(Command::new(label, EditOp::Batch(ops)));
		}
	}

	/// Queue an atom write; `atom` must match the target's primitive kind.
	pub fn set_atom(&mut self, value: ValueId, atom: Atom) -> Result<()> {
		let op = self.set_atom_op(value, atom)?;
		self.push(Command::new(format!("set {value}"), op));
		Ok(())
	}

	/// Build (without queuing) an atom write, for callers assembling batches.
	pub fn set_atom_op(&self, value: ValueId, atom: Atom) -> Result<EditOp> {
		let old = self.doc().atom(value)?;
		if old.kind() != atom.kind() {
			return Err(DocError::TypeMismatch {
				expected: old.kind().as_str(),
				got: atom.kind().as_str().to_owned(),
			});
		}
		Ok(EditOp::SetAtom {
			target: value,
			old: old.clone(),
			new: atom,
		})
	}

	/// Parse `text` as the target's primitive kind and queue the write.
	pub fn set_atom_text(&mut self, value: ValueId, text: &str) -> Result<()> {
		let kind = self.doc().atom(value)?.kind();
		self.set_atom(value, Atom::parse(kind, text)?)
	}

	/// Queue raw enum bits.
	pub fn set_enum(&mut self, value: ValueId, bits: u32) -> Result<()> {
		let old = self.enum_bits(value)?;
		self.push(Command::new(format!("set {value}"), EditOp::SetEnum { target: value, old, new: bits }));
		Ok(())
	}

	/// Queue selection of a label on a non-flags enum.
	pub fn set_enum_label(&mut self, value: ValueId, label: &str) -> Result<()> {
		let (labels, flags) = self.enum_labels(value)?;
		let index = labels.iter().position(|candidate| candidate.as_ref() == label);
		match (flags, index) {
			(false, Some(index)) => self.set_enum(value, index as u32),
			_ => Err(DocError::InvalidLiteral {
				kind: "enum label",
				text: label.to_owned(),
			}),
		}
	}

	/// Queue toggling one bit of a flags enum.
	pub fn toggle_flag(&mut self, value: ValueId, label: &str) -> Result<()> {
		let (labels, flags) = self.enum_labels(value)?;
		let bit = labels.iter().position(|candidate| candidate.as_ref() == label);
		match (flags, bit) {
			(true, Some(bit)) => {
				let old = self.enum_bits(value)?;
				self.set_enum(value, old ^ (1 << bit))
			}
			_ => Err(DocError::InvalidLiteral {
				kind: "flag label",
				text: label.to_owned(),
			}),
		}
	}

	/// Allocate a default `concrete` value and queue attaching it under a pointer.
	///
	/// The new value joins the reference heap on commit and leaves it on undo.
	pub fn new_pointer_target(&mut self, pointer: ValueId, concrete: TypeId) -> Result<ValueId> {
		let (old, base) = self.pointer_parts(pointer)?;
		self.doc().schema().check_assignable(concrete, base)?;

		let item = self.session.doc.create_value(concrete);
		let label = format!("new {} at {pointer}", self.doc().schema().name(concrete));
		self.push(Command::new(
			label,
			EditOp::SetPointer {
				target: pointer,
				old,
				new: Some(item),
				track: true,
			},
		));
		Ok(item)
	}

	/// Queue pointing at an existing heap value.
	///
	/// Heap values are shared: adoption leaves the value in the heap, so several pointers may
	/// reference it.
	pub fn adopt_heap_value(&mut self, pointer: ValueId, heap_value: ValueId) -> Result<()> {
		let (old, base) = self.pointer_parts(pointer)?;
		if !self.doc().heap().contains(heap_value) {
			return Err(DocError::NotInHeap { value: heap_value.0 });
		}
		self.doc().schema().check_assignable(self.doc().type_of(heap_value)?, base)?;

		self.push(Command::new(
			format!("use {heap_value} at {pointer}"),
			EditOp::SetPointer {
				target: pointer,
				old,
				new: Some(heap_value),
				track: false,
			},
		));
		Ok(())
	}

	/// Queue re-targeting a handle; the root must exist and be assignable to the handle base.
	pub fn set_handle(&mut self, handle: ValueId, root: RootId) -> Result<()> {
		let doc = self.doc();
		let node = doc.node(handle)?;
		let Value::Handle(old) = node.value else {
			return Err(DocError::TypeMismatch {
				expected: "handle",
				got: node.value.kind_label().to_owned(),
			});
		};
		let entry = doc.get_root(root)?;
		if let Some(base) = doc.schema().base(node.ty) {
			doc.schema().check_assignable(entry.ty, base)?;
		}

		self.push(Command::new(
			format!("handle {handle} -> {root}"),
			EditOp::SetHandle {
				target: handle,
				old,
				new: Some(root),
			},
		));
		Ok(())
	}

	/// Queue nulling a pointer, handle, or array. Already-null values queue nothing.
	pub fn clear(&mut self, value: ValueId) -> Result<()> {
		let op = match self.doc().value(value)? {
			Value::Pointer(Some(old)) => EditOp::SetPointer {
				target: value,
				old: Some(*old),
				new: None,
				track: false,
			},
			Value::Handle(Some(old)) => EditOp::SetHandle {
				target: value,
				old: Some(*old),
				new: None,
			},
			Value::Array(Some(items)) => EditOp::SetArray {
				target: value,
				old: Some(items.clone()),
				new: None,
			},
			Value::Pointer(None) | Value::Handle(None) | Value::Array(None) => return Ok(()),
			other => {
				return Err(DocError::TypeMismatch {
					expected: "pointer, handle, or array",
					got: other.kind_label().to_owned(),
				});
			}
		};
		self.push(Command::new(format!("clear {value}"), op));
		Ok(())
	}

	/// Queue allocating an empty array in place of a null one.
	pub fn new_array(&mut self, array: ValueId) -> Result<()> {
		match self.doc().value(array)? {
			Value::Array(None) => {}
			Value::Array(Some(_)) => {
				return Err(DocError::TypeMismatch {
					expected: "null array",
					got: "allocated array".to_owned(),
				});
			}
			other => {
				return Err(DocError::TypeMismatch {
					expected: "array",
					got: other.kind_label().to_owned(),
				});
			}
		}
		self.push(Command::new(
			format!("alloc {array}"),
			EditOp::SetArray {
				target: array,
				old: None,
				new: Some(Vec::new()),
			},
		));
		Ok(())
	}

	/// Allocate a default element and queue appending it; struct elements are heap-tracked.
	///
	/// The index is the array length after every command already queued by this pass, batches
	/// included, so an allocation queued earlier in the pass may be appended to.
	pub fn append(&mut self, array: ValueId) -> Result<ValueId> {
		let element_ty = self.array_base(array)?;
		let start = self.doc().elements(array)?.map(<[ValueId]>::len);
		let len = self
			.session
			.pending
			.iter()
			.fold(start, |len, command| queued_len(command.op(), array, len))
			.ok_or_else(|| DocError::TypeMismatch {
				expected: "allocated array",
				got: "null array".to_owned(),
			})?;

		let track = self.doc().schema().get(element_ty).is_struct();
		let item = self.session.doc.create_value(element_ty);
		self.push(Command::new(
			format!("append {array}"),
			EditOp::Insert {
				array,
				index: len,
				item,
				track,
			},
		));
		Ok(item)
	}

	/// Queue removing the element at `index`.
	pub fn remove_at(&mut self, array: ValueId, index: usize) -> Result<()> {
		let items = self.doc().elements(array)?.unwrap_or_default();
		let item = *items.get(index).ok_or(DocError::IndexOutOfRange { index, len: items.len() })?;
		self.push(Command::new(format!("remove {array}[{index}]"), EditOp::Remove { array, index, item }));
		Ok(())
	}

	fn enum_bits(&self, value: ValueId) -> Result<u32> {
		match self.doc().value(value)? {
			Value::Enum(bits) => Ok(*bits),
			other => Err(DocError::TypeMismatch {
				expected: "enum",
				got: other.kind_label().to_owned(),
			}),
		}
	}

	fn enum_labels(&self, value: ValueId) -> Result<(&[Box<str>], bool)> {
		let ty = self.doc().type_of(value)?;
		match &self.doc().schema().get(ty).kind {
			TypeKind::Enum { labels, flags } => Ok((labels, *flags)),
			_ => Err(DocError::TypeMismatch {
				expected: "enum",
				got: self.doc().schema().name(ty).to_owned(),
			}),
		}
	}

	fn pointer_parts(&self, pointer: ValueId) -> Result<(Option<ValueId>, TypeId)> {
		let node = self.doc().node(pointer)?;
		match (&node.value, &self.doc().schema().get(node.ty).kind) {
			(Value::Pointer(old), TypeKind::Pointer { base }) => Ok((*old, *base)),
			(other, _) => Err(DocError::TypeMismatch {
				expected: "pointer",
				got: other.kind_label().to_owned(),
			}),
		}
	}

	fn array_base(&self, array: ValueId) -> Result<TypeId> {
		let ty = self.doc().type_of(array)?;
		match self.doc().schema().get(ty).kind {
			TypeKind::Array { base } => Ok(base),
			_ => Err(DocError::TypeMismatch {
				expected: "array",
				got: self.doc().schema().name(ty).to_owned(),
			}),
		}
	}
}

/// Length of `array` after `op` runs, given its length before.
fn queued_len(op: &EditOp, array: ValueId, len: Option<usize>) -> Option<usize> {
	match op {
		EditOp::Insert { array: target, .. } if *target == array => len.map(|len| len + 1),
		EditOp::Remove { array: target, .. } if *target == array => len.map(|len| len.saturating_sub(1)),
		EditOp::SetArray { target, new, .. } if *target == array => new.as_ref().map(Vec::len),
		EditOp::Batch(ops) => ops.iter().fold(len, |len, op| queued_len(op, array, len)),
		_ => len,
	}
}

#[cfg(test)]
mod tests;
