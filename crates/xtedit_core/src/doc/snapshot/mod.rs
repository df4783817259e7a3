use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::doc::compression::{DEFAULT_ZSTD_LEVEL, decode_bytes, encode_zstd};
use crate::doc::{Atom, AtomKind, Compression, DocError, Document, Result, RootId, Schema, TypeId, TypeKind, Value, ValueId};

/// Format tag written to every snapshot.
pub const SNAPSHOT_FORMAT: &str = "xtedit-snapshot";
/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Document import/export interface.
pub trait DocumentCodec {
	/// Load a document from `path`.
	fn import(&self, path: &Path) -> Result<Document>;

	/// Write `doc` to `path`.
	fn export(&self, doc: &Document, path: &Path) -> Result<()>;
}

/// JSON snapshot codec with optional zstd framing.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotCodec {
	/// Compress every export, not only paths ending in `.zst`.
	pub always_compress: bool,
	/// zstd level for compressed exports.
	pub zstd_level: i32,
}

impl Default for SnapshotCodec {
	fn default() -> Self {
		Self {
			always_compress: false,
			zstd_level: DEFAULT_ZSTD_LEVEL,
		}
	}
}

impl SnapshotCodec {
	/// Load a snapshot and report its compression.
	pub fn open(&self, path: &Path) -> Result<(Compression, Document)> {
		let raw = std::fs::read(path)?;
		let (compression, bytes) = decode_bytes(raw)?;
		let doc = self.decode(&bytes)?;
		debug!(path = %path.display(), compression = compression.as_str(), nodes = doc.node_count(), "snapshot loaded");
		Ok((compression, doc))
	}

	/// Decode uncompressed snapshot JSON.
	pub fn decode(&self, bytes: &[u8]) -> Result<Document> {
		let file: SnapshotFile = serde_json::from_slice(bytes)?;
		if file.format != SNAPSHOT_FORMAT || file.version != SNAPSHOT_VERSION {
			return Err(DocError::UnsupportedSnapshot {
				format: file.format,
				version: file.version,
			});
		}
		file.into_document()
	}

	/// Encode reachable document content as pretty JSON.
	pub fn encode(&self, doc: &Document) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec_pretty(&SnapshotFile::from_document(doc)?)?)
	}

	fn compress_for(&self, path: &Path) -> bool {
		self.always_compress || path.extension().is_some_and(|ext| ext == "zst")
	}
}

impl DocumentCodec for SnapshotCodec {
	fn import(&self, path: &Path) -> Result<Document> {
		Ok(self.open(path)?.1)
	}

	fn export(&self, doc: &Document, path: &Path) -> Result<()> {
		let mut bytes = self.encode(doc)?;
		if self.compress_for(path) {
			bytes = encode_zstd(&bytes, self.zstd_level)?;
		}
		std::fs::write(path, &bytes)?;
		debug!(path = %path.display(), bytes = bytes.len(), "snapshot written");
		Ok(())
	}
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
	format: String,
	version: u32,
	types: Vec<TypeJson>,
	nodes: Vec<NodeJson>,
	roots: Vec<RootJson>,
	#[serde(default)]
	heap: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TypeJson {
	Atom {
		name: String,
		atom: String,
	},
	Struct {
		name: String,
		#[serde(default)]
		parent: Option<String>,
		#[serde(default)]
		fields: Vec<FieldJson>,
	},
	Array {
		name: String,
		base: String,
	},
	Pointer {
		name: String,
		base: String,
	},
	Handle {
		name: String,
		base: String,
	},
	Enum {
		name: String,
		labels: Vec<String>,
		#[serde(default)]
		flags: bool,
	},
}

#[derive(Debug, Serialize, Deserialize)]
struct FieldJson {
	name: String,
	#[serde(rename = "type")]
	ty: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeJson {
	#[serde(rename = "type")]
	ty: String,
	value: ValueJson,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ValueJson {
	Bool(bool),
	I8(i8),
	I16(i16),
	I32(i32),
	I64(i64),
	U8(u8),
	U16(u16),
	U32(u32),
	U64(u64),
	F32(f32),
	F64(f64),
	String(String),
	LocId(u32),
	Struct(Vec<u32>),
	Array(Option<Vec<u32>>),
	Pointer(Option<u32>),
	Handle(Option<u32>),
	Enum(u32),
}

#[derive(Debug, Serialize, Deserialize)]
struct RootJson {
	id: u32,
	#[serde(rename = "type")]
	ty: String,
	node: u32,
}

impl SnapshotFile {
	fn from_document(doc: &Document) -> Result<Self> {
		let schema = doc.schema();
		let order = doc.reachable();
		let index: HashMap<ValueId, u32> = order.iter().enumerate().map(|(at, id)| (*id, at as u32)).collect();
		let remap = |id: &ValueId| {
			index.get(id).copied().ok_or_else(|| DocError::InvalidSnapshot {
				reason: format!("{id} is referenced but not reachable"),
			})
		};

		let types = schema.ids().map(|ty| type_json(schema, ty)).collect();
		let nodes = order
			.iter()
			.map(|id| -> Result<NodeJson> {
				let node = doc.node(*id)?;
				let value = match &node.value {
					Value::Atom(atom) => atom_json(atom),
					Value::Struct(fields) => ValueJson::Struct(fields.iter().map(remap).collect::<Result<_>>()?),
					Value::Array(items) => ValueJson::Array(items.as_ref().map(|items| items.iter().map(remap).collect::<Result<_>>()).transpose()?),
					Value::Pointer(target) => ValueJson::Pointer(target.as_ref().map(remap).transpose()?),
					Value::Handle(root) => ValueJson::Handle(root.map(|root| root.0)),
					Value::Enum(bits) => ValueJson::Enum(*bits),
				};
				Ok(NodeJson {
					ty: schema.name(node.ty).to_owned(),
					value,
				})
			})
			.collect::<Result<_>>()?;
		let roots = doc
			.roots()
			.iter()
			.map(|entry| -> Result<RootJson> {
				Ok(RootJson {
					id: entry.id.0,
					ty: schema.name(entry.ty).to_owned(),
					node: remap(&entry.value)?,
				})
			})
			.collect::<Result<_>>()?;
		let heap = doc.heap().iter().map(|id| remap(&id)).collect::<Result<_>>()?;

		Ok(Self {
			format: SNAPSHOT_FORMAT.to_owned(),
			version: SNAPSHOT_VERSION,
			types,
			nodes,
			roots,
			heap,
		})
	}

	fn into_document(self) -> Result<Document> {
		let mut doc = Document::new(build_schema(&self.types)?);
		let node_types = self
			.nodes
			.iter()
			.map(|node| doc.schema().require(&node.ty))
			.collect::<Result<Vec<TypeId>>>()?;

		// Struct fields, array elements and roots own their node; pointers may share heap values.
		let mut owners: Vec<Option<String>> = vec![None; node_types.len()];
		for (at, node) in self.nodes.into_iter().enumerate() {
			let ty = node_types[at];
			let value = check_node(doc.schema(), &node_types, at, ty, node.value)?;
			if let Value::Struct(children) | Value::Array(Some(children)) = &value {
				for child in children {
					claim(&mut owners, *child, || format!("node {at}"))?;
				}
			}
			doc.alloc(ty, value);
		}

		for root in self.roots {
			let node = node_ref(&node_types, root.node)?;
			claim(&mut owners, node, || format!("root {}", root.id))?;
			if doc.schema().name(node_types[node.0 as usize]) != root.ty {
				return Err(invalid(format!("root {} declares {} but node {} is {}", root.id, root.ty, root.node, doc.type_name_of(node)?)));
			}
			doc.attach_root(RootId(root.id), node)?;
		}

		for entry in self.heap {
			let node = node_ref(&node_types, entry)?;
			if !doc.schema().get(node_types[node.0 as usize]).is_struct() {
				return Err(invalid(format!("heap entry {entry} is not a struct")));
			}
			if !doc.heap_add(node) {
				return Err(invalid(format!("heap entry {entry} listed twice")));
			}
		}

		Ok(doc)
	}
}

fn type_json(schema: &Schema, ty: TypeId) -> TypeJson {
	let def = schema.get(ty);
	let name = def.name.to_string();
	match &def.kind {
		TypeKind::Atom(kind) => TypeJson::Atom {
			name,
			atom: kind.as_str().to_owned(),
		},
		TypeKind::Struct { parent, fields } => TypeJson::Struct {
			name,
			parent: parent.map(|parent| schema.name(parent).to_owned()),
			fields: fields
				.iter()
				.map(|field| FieldJson {
					name: field.name.to_string(),
					ty: schema.name(field.ty).to_owned(),
				})
				.collect(),
		},
		TypeKind::Array { base } => TypeJson::Array {
			name,
			base: schema.name(*base).to_owned(),
		},
		TypeKind::Pointer { base } => TypeJson::Pointer {
			name,
			base: schema.name(*base).to_owned(),
		},
		TypeKind::Handle { base } => TypeJson::Handle {
			name,
			base: schema.name(*base).to_owned(),
		},
		TypeKind::Enum { labels, flags } => TypeJson::Enum {
			name,
			labels: labels.iter().map(ToString::to_string).collect(),
			flags: *flags,
		},
	}
}

fn build_schema(types: &[TypeJson]) -> Result<Schema> {
	let mut builder = Schema::builder();
	for ty in types {
		builder = match ty {
			TypeJson::Atom { name, atom } => {
				let kind = AtomKind::from_label(atom).ok_or_else(|| invalid(format!("type {name} has unknown atom kind {atom:?}")))?;
				builder.atom(name, kind)
			}
			TypeJson::Struct { name, parent, fields } => {
				let fields: Vec<(&str, &str)> = fields.iter().map(|field| (field.name.as_str(), field.ty.as_str())).collect();
				builder.structure(name, parent.as_deref(), &fields)
			}
			TypeJson::Array { name, base } => builder.array(name, base),
			TypeJson::Pointer { name, base } => builder.pointer(name, base),
			TypeJson::Handle { name, base } => builder.handle(name, base),
			TypeJson::Enum { name, labels, flags } => {
				let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
				builder.enumeration(name, &labels, *flags)
			}
		};
	}
	builder.build()
}

fn claim(owners: &mut [Option<String>], node: ValueId, owner: impl FnOnce() -> String) -> Result<()> {
	let slot = owners.get_mut(node.0 as usize).ok_or_else(|| invalid(format!("node {} out of range", node.0)))?;
	if let Some(first) = slot.as_deref() {
		return Err(invalid(format!("node {} is owned by both {first} and {}", node.0, owner())));
	}
	*slot = Some(owner());
	Ok(())
}

/// Validate one node payload against its declared type and every index it references.
fn check_node(schema: &Schema, node_types: &[TypeId], at: usize, ty: TypeId, value: ValueJson) -> Result<Value> {
	let def = schema.get(ty);
	let wrong = |got: &str| invalid(format!("node {at} of type {} holds {got}", def.name));

	Ok(match (&def.kind, value) {
		(TypeKind::Atom(kind), value) => {
			let atom = json_atom(value).ok_or_else(|| wrong("a non-atom value"))?;
			if atom.kind() != *kind {
				return Err(wrong(atom.kind().as_str()));
			}
			Value::Atom(atom)
		}
		(TypeKind::Struct { .. }, ValueJson::Struct(children)) => {
			let layout = schema.fields(ty);
			if children.len() != layout.len() {
				return Err(wrong(&format!("{} fields, expected {}", children.len(), layout.len())));
			}
			let mut values = Vec::with_capacity(children.len());
			for (field, child) in layout.iter().zip(children) {
				let child = node_ref(node_types, child)?;
				if node_types[child.0 as usize] != field.ty {
					return Err(wrong(&format!("field {} of type {}", field.name, schema.name(node_types[child.0 as usize]))));
				}
				values.push(child);
			}
			Value::Struct(values)
		}
		(TypeKind::Array { base }, ValueJson::Array(items)) => {
			let items = items
				.map(|items| {
					items
						.into_iter()
						.map(|item| -> Result<ValueId> {
							let item = node_ref(node_types, item)?;
							schema.check_assignable(node_types[item.0 as usize], *base)?;
							Ok(item)
						})
						.collect::<Result<Vec<_>>>()
				})
				.transpose()?;
			Value::Array(items)
		}
		(TypeKind::Pointer { base }, ValueJson::Pointer(target)) => {
			let target = target.map(|target| node_ref(node_types, target)).transpose()?;
			if let Some(target) = target {
				schema.check_assignable(node_types[target.0 as usize], *base)?;
			}
			Value::Pointer(target)
		}
		(TypeKind::Handle { .. }, ValueJson::Handle(root)) => Value::Handle(root.map(RootId)),
		(TypeKind::Enum { .. }, ValueJson::Enum(bits)) => Value::Enum(bits),
		(_, other) => return Err(wrong(json_kind(&other))),
	})
}

fn node_ref(node_types: &[TypeId], index: u32) -> Result<ValueId> {
	if (index as usize) < node_types.len() {
		Ok(ValueId(index))
	} else {
		Err(invalid(format!("node index {index} out of range (len={})", node_types.len())))
	}
}

fn atom_json(atom: &Atom) -> ValueJson {
	match atom {
		Atom::Bool(v) => ValueJson::Bool(*v),
		Atom::I8(v) => ValueJson::I8(*v),
		Atom::I16(v) => ValueJson::I16(*v),
		Atom::I32(v) => ValueJson::I32(*v),
		Atom::I64(v) => ValueJson::I64(*v),
		Atom::U8(v) => ValueJson::U8(*v),
		Atom::U16(v) => ValueJson::U16(*v),
		Atom::U32(v) => ValueJson::U32(*v),
		Atom::U64(v) => ValueJson::U64(*v),
		Atom::F32(v) => ValueJson::F32(*v),
		Atom::F64(v) => ValueJson::F64(*v),
		Atom::String(v) => ValueJson::String(v.to_string()),
		Atom::LocId(v) => ValueJson::LocId(*v),
	}
}

fn json_atom(value: ValueJson) -> Option<Atom> {
	Some(match value {
		ValueJson::Bool(v) => Atom::Bool(v),
		ValueJson::I8(v) => Atom::I8(v),
		ValueJson::I16(v) => Atom::I16(v),
		ValueJson::I32(v) => Atom::I32(v),
		ValueJson::I64(v) => Atom::I64(v),
		ValueJson::U8(v) => Atom::U8(v),
		ValueJson::U16(v) => Atom::U16(v),
		ValueJson::U32(v) => Atom::U32(v),
		ValueJson::U64(v) => Atom::U64(v),
		ValueJson::F32(v) => Atom::F32(v),
		ValueJson::F64(v) => Atom::F64(v),
		ValueJson::String(v) => Atom::String(v.into()),
		ValueJson::LocId(v) => Atom::LocId(v),
		ValueJson::Struct(_) | ValueJson::Array(_) | ValueJson::Pointer(_) | ValueJson::Handle(_) | ValueJson::Enum(_) => return None,
	})
}

fn json_kind(value: &ValueJson) -> &'static str {
	match value {
		ValueJson::Struct(_) => "struct",
		ValueJson::Array(_) => "array",
		ValueJson::Pointer(_) => "pointer",
		ValueJson::Handle(_) => "handle",
		ValueJson::Enum(_) => "enum",
		_ => "atom",
	}
}

fn invalid(reason: String) -> DocError {
	DocError::InvalidSnapshot { reason }
}
