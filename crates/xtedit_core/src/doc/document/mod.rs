use std::collections::HashSet;

use crate::doc::{Atom, DocError, FieldDef, Node, RefHeap, Result, RootEntry, RootId, RootTable, Schema, TypeId, TypeKind, Value, ValueArena, ValueId};

/// One struct field paired with the per-instance value.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
	/// Position in the struct's flattened field layout.
	pub index: usize,
	/// Type-level field declaration.
	pub def: &'a FieldDef,
	/// Field value.
	pub value: ValueId,
}

/// Loaded value graph with its root table and reference heap.
#[derive(Debug, Clone)]
pub struct Document {
	schema: Schema,
	values: ValueArena,
	roots: RootTable,
	heap: RefHeap,
}

impl Document {
	/// Create an empty document over a schema.
	pub fn new(schema: Schema) -> Self {
		Self {
			schema,
			values: ValueArena::default(),
			roots: RootTable::default(),
			heap: RefHeap::default(),
		}
	}

	/// Return the document schema.
	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	/// Return the root table.
	pub fn roots(&self) -> &RootTable {
		&self.roots
	}

	/// Return the reference heap.
	pub fn heap(&self) -> &RefHeap {
		&self.heap
	}

	/// Return the number of arena nodes, including detached ones.
	pub fn node_count(&self) -> usize {
		self.values.len()
	}

	/// Look up a node by id.
	pub fn node(&self, id: ValueId) -> Result<&Node> {
		self.values.get(id).ok_or_else(|| unknown_value(id))
	}

	/// Look up a value payload by id.
	pub fn value(&self, id: ValueId) -> Result<&Value> {
		Ok(&self.node(id)?.value)
	}

	/// Return the runtime type of a value.
	pub fn type_of(&self, id: ValueId) -> Result<TypeId> {
		Ok(self.node(id)?.ty)
	}

	/// Return the runtime type name of a value.
	pub fn type_name_of(&self, id: ValueId) -> Result<&str> {
		Ok(self.schema.name(self.type_of(id)?))
	}

	pub(crate) fn node_mut(&mut self, id: ValueId) -> Result<&mut Node> {
		self.values.get_mut(id).ok_or_else(|| unknown_value(id))
	}

	pub(crate) fn alloc(&mut self, ty: TypeId, value: Value) -> ValueId {
		self.values.alloc(ty, value)
	}

	/// Allocate a default-constructed value of `ty`.
	///
	/// Atoms and enums are zero, structs build every field, arrays/pointers/handles start null.
	pub fn create_value(&mut self, ty: TypeId) -> ValueId {
		let value = match self.schema.get(ty).kind {
			TypeKind::Atom(kind) => Value::Atom(Atom::default_for(kind)),
			TypeKind::Struct { .. } => return self.create_struct(ty),
			TypeKind::Array { .. } => Value::Array(None),
			TypeKind::Pointer { .. } => Value::Pointer(None),
			TypeKind::Handle { .. } => Value::Handle(None),
			TypeKind::Enum { .. } => Value::Enum(0),
		};
		self.values.alloc(ty, value)
	}

	fn create_struct(&mut self, ty: TypeId) -> ValueId {
		let field_types: Vec<TypeId> = self.schema.fields(ty).iter().map(|field| field.ty).collect();
		let fields = field_types.into_iter().map(|field_ty| self.create_value(field_ty)).collect();
		self.values.alloc(ty, Value::Struct(fields))
	}

	/// Add a root entry holding a fresh default value of `ty`.
	pub fn add_root(&mut self, id: RootId, ty: TypeId) -> Result<&RootEntry> {
		if self.roots.find(id).is_some() {
			return Err(DocError::DuplicateRoot { id: id.0 });
		}
		let value = self.create_value(ty);
		self.roots.insert(RootEntry { id, ty, value })
	}

	/// Add a root entry owning an existing value.
	pub fn attach_root(&mut self, id: RootId, value: ValueId) -> Result<&RootEntry> {
		let ty = self.type_of(value)?;
		self.roots.insert(RootEntry { id, ty, value })
	}

	/// Look up a root entry, failing with [`DocError::NotFound`].
	pub fn get_root(&self, id: RootId) -> Result<&RootEntry> {
		self.roots.get(id)
	}

	/// Add a value to the reference heap, returning whether it was inserted.
	///
	/// Callers pair this with the pointer attach it accounts for.
	pub fn heap_add(&mut self, value: ValueId) -> bool {
		self.heap.add(value)
	}

	/// Remove a value from the reference heap. Removing an absent value is a no-op.
	pub fn heap_remove(&mut self, value: ValueId) -> bool {
		self.heap.remove(value)
	}

	/// Lazily iterate heap values assignable to `base`, in heap insertion order.
	///
	/// The iterator borrows the document; use [`Document::heap_candidate_ids`] for a snapshot
	/// when edits may follow.
	pub fn heap_candidates(&self, base: TypeId) -> impl Iterator<Item = ValueId> + '_ {
		self.heap.iter().filter(move |value| {
			self.values
				.get(*value)
				.is_some_and(|node| node.ty == base || (self.schema.get(node.ty).is_struct() && self.schema.is_of_type(node.ty, base)))
		})
	}

	/// Snapshot of [`Document::heap_candidates`].
	pub fn heap_candidate_ids(&self, base: TypeId) -> Vec<ValueId> {
		self.heap_candidates(base).collect()
	}

	/// Return whether a value has explorable content.
	///
	/// Structs do; allocated arrays do; pointers and handles do when their target does.
	pub fn has_content(&self, id: ValueId) -> bool {
		let mut current = id;
		for _ in 0..=self.values.len() {
			let Some(node) = self.values.get(current) else {
				return false;
			};
			match &node.value {
				Value::Struct(_) => return true,
				Value::Array(items) => return items.is_some(),
				Value::Pointer(Some(target)) => current = *target,
				Value::Handle(Some(root)) => match self.roots.find(*root) {
					Some(entry) => current = entry.value,
					None => return false,
				},
				_ => return false,
			}
		}
		false
	}

	/// Follow non-null pointers and resolved handles to the value they expose.
	///
	/// Returns `None` for a null pointer/handle or an unresolved handle.
	pub fn deref(&self, id: ValueId) -> Option<ValueId> {
		let mut current = id;
		for _ in 0..=self.values.len() {
			match &self.values.get(current)?.value {
				Value::Pointer(target) => current = (*target)?,
				Value::Handle(root) => current = self.roots.find((*root)?)?.value,
				_ => return Some(current),
			}
		}
		None
	}

	/// Iterate a struct value's fields in layout order.
	pub fn fields(&self, id: ValueId) -> Result<impl Iterator<Item = FieldRef<'_>> + '_> {
		let node = self.node(id)?;
		let Value::Struct(values) = &node.value else {
			return Err(mismatch("struct", &node.value));
		};
		let defs = self.schema.fields(node.ty);
		Ok(defs
			.iter()
			.zip(values.iter())
			.enumerate()
			.map(|(index, (def, value))| FieldRef { index, def, value: *value }))
	}

	/// Look up a struct field value by name.
	pub fn field(&self, id: ValueId, name: &str) -> Result<ValueId> {
		self.fields(id)?
			.find(|field| field.def.name.as_ref() == name)
			.map(|field| field.value)
			.ok_or_else(|| DocError::PathNotFound {
				path: name.to_owned(),
				step: format!("field {name}"),
			})
	}

	/// Return array elements, or `None` when no array is allocated.
	pub fn elements(&self, id: ValueId) -> Result<Option<&[ValueId]>> {
		match &self.node(id)?.value {
			Value::Array(items) => Ok(items.as_deref()),
			other => Err(mismatch("array", other)),
		}
	}

	/// Return the atom payload of a value.
	pub fn atom(&self, id: ValueId) -> Result<&Atom> {
		match self.value(id)? {
			Value::Atom(atom) => Ok(atom),
			other => Err(mismatch("atom", other)),
		}
	}

	/// Collect values owned by roots or the heap, in discovery order.
	///
	/// Roots come first in insertion order, then heap entries; descent follows struct fields,
	/// array elements, and pointer targets. Handles are references and are not followed.
	pub fn reachable(&self) -> Vec<ValueId> {
		let mut seen = HashSet::new();
		let mut order = Vec::new();
		let starts = self.roots.iter().map(|entry| entry.value).chain(self.heap.iter());

		for start in starts {
			let mut stack = vec![start];
			while let Some(current) = stack.pop() {
				if !seen.insert(current) {
					continue;
				}
				order.push(current);
				let Some(node) = self.values.get(current) else {
					continue;
				};
				match &node.value {
					Value::Struct(children) | Value::Array(Some(children)) => stack.extend(children.iter().rev().copied()),
					Value::Pointer(Some(target)) => stack.push(*target),
					_ => {}
				}
			}
		}

		order
	}

	/// Count arena nodes no longer reachable from roots or the heap.
	pub fn unreachable_count(&self) -> usize {
		self.values.len() - self.reachable().len()
	}
}

pub(crate) fn mismatch(expected: &'static str, got: &Value) -> DocError {
	DocError::TypeMismatch {
		expected,
		got: got.kind_label().to_owned(),
	}
}

pub(crate) fn unknown_value(id: ValueId) -> DocError {
	DocError::InvariantViolation {
		reason: format!("unknown value {id}"),
	}
}
