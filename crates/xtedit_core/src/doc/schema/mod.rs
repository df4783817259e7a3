use std::collections::HashMap;

use crate::doc::{DocError, Result};

/// Stable index of a type inside a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Fixed primitive set carried by atom values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomKind {
	/// Boolean flag.
	Bool,
	/// Signed 8-bit integer.
	I8,
	/// Signed 16-bit integer.
	I16,
	/// Signed 32-bit integer.
	I32,
	/// Signed 64-bit integer.
	I64,
	/// Unsigned 8-bit integer.
	U8,
	/// Unsigned 16-bit integer.
	U16,
	/// Unsigned 32-bit integer.
	U32,
	/// Unsigned 64-bit integer.
	U64,
	/// 32-bit float.
	F32,
	/// 64-bit float.
	F64,
	/// Fixed-size string.
	String,
	/// Localized-string identifier.
	LocId,
}

impl AtomKind {
	/// Every primitive kind, in declaration order.
	pub const ALL: [AtomKind; 13] = [
		Self::Bool,
		Self::I8,
		Self::I16,
		Self::I32,
		Self::I64,
		Self::U8,
		Self::U16,
		Self::U32,
		Self::U64,
		Self::F32,
		Self::F64,
		Self::String,
		Self::LocId,
	];

	/// Render the kind as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Bool => "bool",
			Self::I8 => "i8",
			Self::I16 => "i16",
			Self::I32 => "i32",
			Self::I64 => "i64",
			Self::U8 => "u8",
			Self::U16 => "u16",
			Self::U32 => "u32",
			Self::U64 => "u64",
			Self::F32 => "f32",
			Self::F64 => "f64",
			Self::String => "string",
			Self::LocId => "loc_id",
		}
	}

	/// Parse a label produced by [`AtomKind::as_str`].
	pub fn from_label(label: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.as_str() == label)
	}
}

/// One field declaration of a struct type.
#[derive(Debug, Clone)]
pub struct FieldDef {
	/// Field name, unique across the struct including inherited fields.
	pub name: Box<str>,
	/// Declared target type.
	pub ty: TypeId,
	/// Struct type that declares this field.
	pub owner: TypeId,
}

/// Variant-specific part of a type definition.
#[derive(Debug, Clone)]
pub enum TypeKind {
	/// Primitive atom.
	Atom(AtomKind),
	/// Struct with optional single parent and its own fields.
	Struct {
		/// Parent struct type.
		parent: Option<TypeId>,
		/// Fields declared directly on this type.
		fields: Vec<FieldDef>,
	},
	/// Nullable homogeneous array.
	Array {
		/// Element type.
		base: TypeId,
	},
	/// Nullable owning pointer.
	Pointer {
		/// Declared base type of the target.
		base: TypeId,
	},
	/// Nullable reference to a root entry.
	Handle {
		/// Declared base type of the referenced root.
		base: TypeId,
	},
	/// Unsigned enumeration with labels.
	Enum {
		/// Ordered labels; bit positions when `flags` is set.
		labels: Vec<Box<str>>,
		/// Bitmask semantics.
		flags: bool,
	},
}

/// Named type definition.
#[derive(Debug, Clone)]
pub struct TypeDef {
	/// Unique type name.
	pub name: Box<str>,
	/// Variant payload.
	pub kind: TypeKind,
	layout: Vec<FieldDef>,
}

impl TypeDef {
	/// Return a short label for the type variant.
	pub fn kind_label(&self) -> &'static str {
		match self.kind {
			TypeKind::Atom(_) => "atom",
			TypeKind::Struct { .. } => "struct",
			TypeKind::Array { .. } => "array",
			TypeKind::Pointer { .. } => "pointer",
			TypeKind::Handle { .. } => "handle",
			TypeKind::Enum { .. } => "enum",
		}
	}

	/// Return whether this is a struct type.
	pub fn is_struct(&self) -> bool {
		matches!(self.kind, TypeKind::Struct { .. })
	}
}

/// Validated set of type definitions for one document.
#[derive(Debug, Clone, Default)]
pub struct Schema {
	types: Vec<TypeDef>,
	by_name: HashMap<Box<str>, TypeId>,
}

impl Schema {
	/// Start building a schema.
	pub fn builder() -> SchemaBuilder {
		SchemaBuilder::default()
	}

	/// Look up a type by id.
	pub fn get(&self, ty: TypeId) -> &TypeDef {
		&self.types[ty.0 as usize]
	}

	/// Return the name of a type.
	pub fn name(&self, ty: TypeId) -> &str {
		&self.get(ty).name
	}

	/// Look up a type id by exact name.
	pub fn lookup(&self, name: &str) -> Option<TypeId> {
		self.by_name.get(name).copied()
	}

	/// Look up a type id by name, failing with [`DocError::TypeNotFound`].
	pub fn require(&self, name: &str) -> Result<TypeId> {
		self.lookup(name).ok_or_else(|| DocError::TypeNotFound { name: name.to_owned() })
	}

	/// Iterate all type ids in definition order.
	pub fn ids(&self) -> impl Iterator<Item = TypeId> + '_ {
		(0..self.types.len() as u32).map(TypeId)
	}

	/// Return number of defined types.
	pub fn len(&self) -> usize {
		self.types.len()
	}

	/// Return whether no types are defined.
	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}

	/// Return the flattened field layout of a struct type, inherited fields first.
	///
	/// Non-struct types have an empty layout.
	pub fn fields(&self, ty: TypeId) -> &[FieldDef] {
		&self.get(ty).layout
	}

	/// Return the parent of a struct type.
	pub fn parent(&self, ty: TypeId) -> Option<TypeId> {
		match self.get(ty).kind {
			TypeKind::Struct { parent, .. } => parent,
			_ => None,
		}
	}

	/// Return the element/target base type for array, pointer, and handle types.
	pub fn base(&self, ty: TypeId) -> Option<TypeId> {
		match self.get(ty).kind {
			TypeKind::Array { base } | TypeKind::Pointer { base } | TypeKind::Handle { base } => Some(base),
			_ => None,
		}
	}

	/// Single-inheritance subtype test: `sub` equals `base` or descends from it.
	pub fn is_of_type(&self, sub: TypeId, base: TypeId) -> bool {
		let mut cursor = Some(sub);
		while let Some(ty) = cursor {
			if ty == base {
				return true;
			}
			cursor = self.parent(ty);
		}
		false
	}

	/// Iterate types a pointer or handle declared with `base` may hold.
	pub fn assignable_types(&self, base: TypeId) -> impl Iterator<Item = TypeId> + '_ {
		self.ids()
			.filter(move |ty| *ty == base || (self.get(*ty).is_struct() && self.get(base).is_struct() && self.is_of_type(*ty, base)))
	}

	/// Render enum bits with the type's labels; flags join set bits with `,`.
	pub fn enum_text(&self, ty: TypeId, bits: u32) -> String {
		let TypeKind::Enum { labels, flags } = &self.get(ty).kind else {
			return bits.to_string();
		};
		if !*flags {
			return match labels.get(bits as usize) {
				Some(label) => label.to_string(),
				None => bits.to_string(),
			};
		}
		if bits == 0 {
			return "None".to_owned();
		}

		let mut parts: Vec<String> = labels
			.iter()
			.enumerate()
			.filter(|(bit, _)| bits & (1_u32 << bit) != 0)
			.map(|(_, label)| label.to_string())
			.collect();
		let known = if labels.len() >= 32 { u32::MAX } else { (1_u32 << labels.len()) - 1 };
		if bits & !known != 0 {
			parts.push(format!("0x{:x}", bits & !known));
		}
		parts.join(",")
	}

	/// Fail with [`DocError::NotAssignable`] unless `ty` may be stored under `base`.
	pub fn check_assignable(&self, ty: TypeId, base: TypeId) -> Result<()> {
		if ty == base || (self.get(base).is_struct() && self.is_of_type(ty, base)) {
			return Ok(());
		}
		Err(DocError::NotAssignable {
			ty: self.name(ty).to_owned(),
			base: self.name(base).to_owned(),
		})
	}
}

#[derive(Debug, Clone)]
enum PendingKind {
	Atom(AtomKind),
	Struct { parent: Option<String>, fields: Vec<(String, String)> },
	Array(String),
	Pointer(String),
	Handle(String),
	Enum { labels: Vec<String>, flags: bool },
}

/// Name-based schema builder; references are resolved and validated by [`SchemaBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
	pending: Vec<(String, PendingKind)>,
}

impl SchemaBuilder {
	/// Declare one atom type per primitive, named by [`AtomKind::as_str`].
	pub fn with_atoms(mut self) -> Self {
		for kind in AtomKind::ALL {
			self.pending.push((kind.as_str().to_owned(), PendingKind::Atom(kind)));
		}
		self
	}

	/// Declare an atom type.
	pub fn atom(mut self, name: &str, kind: AtomKind) -> Self {
		self.pending.push((name.to_owned(), PendingKind::Atom(kind)));
		self
	}

	/// Declare a struct type with `(field, type)` pairs.
	pub fn structure(mut self, name: &str, parent: Option<&str>, fields: &[(&str, &str)]) -> Self {
		let fields = fields.iter().map(|(field, ty)| ((*field).to_owned(), (*ty).to_owned())).collect();
		self.pending.push((
			name.to_owned(),
			PendingKind::Struct {
				parent: parent.map(str::to_owned),
				fields,
			},
		));
		self
	}

	/// Declare an array type.
	pub fn array(mut self, name: &str, base: &str) -> Self {
		self.pending.push((name.to_owned(), PendingKind::Array(base.to_owned())));
		self
	}

	/// Declare a pointer type.
	pub fn pointer(mut self, name: &str, base: &str) -> Self {
		self.pending.push((name.to_owned(), PendingKind::Pointer(base.to_owned())));
		self
	}

	/// Declare a handle type.
	pub fn handle(mut self, name: &str, base: &str) -> Self {
		self.pending.push((name.to_owned(), PendingKind::Handle(base.to_owned())));
		self
	}

	/// Declare an enum type.
	pub fn enumeration(mut self, name: &str, labels: &[&str], flags: bool) -> Self {
		let labels = labels.iter().map(|label| (*label).to_owned()).collect();
		self.pending.push((name.to_owned(), PendingKind::Enum { labels, flags }));
		self
	}

	/// Resolve names and validate the schema.
	pub fn build(self) -> Result<Schema> {
		let mut by_name: HashMap<Box<str>, TypeId> = HashMap::with_capacity(self.pending.len());
		for (idx, (name, _)) in self.pending.iter().enumerate() {
			if by_name.insert(name.as_str().into(), TypeId(idx as u32)).is_some() {
				return Err(invalid(format!("duplicate type name {name}")));
			}
		}

		let resolve = |name: &str| -> Result<TypeId> { by_name.get(name).copied().ok_or_else(|| DocError::TypeNotFound { name: name.to_owned() }) };

		let mut types = Vec::with_capacity(self.pending.len());
		for (idx, (name, pending)) in self.pending.iter().enumerate() {
			let owner = TypeId(idx as u32);
			let kind = match pending {
				PendingKind::Atom(kind) => TypeKind::Atom(*kind),
				PendingKind::Struct { parent, fields } => TypeKind::Struct {
					parent: parent.as_deref().map(resolve).transpose()?,
					fields: fields
						.iter()
						.map(|(field, ty)| {
							Ok(FieldDef {
								name: field.as_str().into(),
								ty: resolve(ty)?,
								owner,
							})
						})
						.collect::<Result<Vec<_>>>()?,
				},
				PendingKind::Array(base) => TypeKind::Array { base: resolve(base)? },
				PendingKind::Pointer(base) => TypeKind::Pointer { base: resolve(base)? },
				PendingKind::Handle(base) => TypeKind::Handle { base: resolve(base)? },
				PendingKind::Enum { labels, flags } => {
					if *flags && labels.len() > 32 {
						return Err(invalid(format!("flags enum {name} has more than 32 labels")));
					}
					TypeKind::Enum {
						labels: labels.iter().map(|label| label.as_str().into()).collect(),
						flags: *flags,
					}
				}
			};
			types.push(TypeDef {
				name: name.as_str().into(),
				kind,
				layout: Vec::new(),
			});
		}

		let mut schema = Schema { types, by_name };
		schema.check_parents()?;
		schema.compute_layouts()?;
		schema.check_inline_containment()?;
		Ok(schema)
	}
}

impl Schema {
	fn check_parents(&self) -> Result<()> {
		for ty in self.ids() {
			let Some(parent) = self.parent(ty) else {
				continue;
			};
			if !self.get(parent).is_struct() {
				return Err(invalid(format!("parent {} of {} is not a struct", self.name(parent), self.name(ty))));
			}

			let mut steps = 0_usize;
			let mut cursor = Some(parent);
			while let Some(current) = cursor {
				if current == ty || steps > self.types.len() {
					return Err(invalid(format!("inheritance cycle through {}", self.name(ty))));
				}
				steps += 1;
				cursor = self.parent(current);
			}
		}
		Ok(())
	}

	fn compute_layouts(&mut self) -> Result<()> {
		for ty in self.ids().collect::<Vec<_>>() {
			if !self.get(ty).is_struct() {
				continue;
			}

			let mut chain = Vec::new();
			let mut cursor = Some(ty);
			while let Some(current) = cursor {
				chain.push(current);
				cursor = self.parent(current);
			}

			let mut layout: Vec<FieldDef> = Vec::new();
			for current in chain.into_iter().rev() {
				let TypeKind::Struct { fields, .. } = &self.get(current).kind else {
					continue;
				};
				for field in fields {
					if layout.iter().any(|existing| existing.name == field.name) {
						return Err(invalid(format!("duplicate field {} in {}", field.name, self.name(ty))));
					}
					layout.push(field.clone());
				}
			}
			self.types[ty.0 as usize].layout = layout;
		}
		Ok(())
	}

	fn check_inline_containment(&self) -> Result<()> {
		#[derive(Clone, Copy, PartialEq)]
		enum Mark {
			Unvisited,
			Active,
			Done,
		}

		fn visit(schema: &Schema, ty: TypeId, marks: &mut [Mark]) -> Result<()> {
			match marks[ty.0 as usize] {
				Mark::Done => return Ok(()),
				Mark::Active => return Err(invalid(format!("struct {} contains itself inline", schema.name(ty)))),
				Mark::Unvisited => {}
			}
			marks[ty.0 as usize] = Mark::Active;
			for field in schema.fields(ty) {
				if schema.get(field.ty).is_struct() {
					visit(schema, field.ty, marks)?;
				}
			}
			marks[ty.0 as usize] = Mark::Done;
			Ok(())
		}

		let mut marks = vec![Mark::Unvisited; self.types.len()];
		for ty in self.ids() {
			if self.get(ty).is_struct() {
				visit(self, ty, &mut marks)?;
			}
		}
		Ok(())
	}
}

fn invalid(reason: String) -> DocError {
	DocError::InvalidSchema { reason }
}
