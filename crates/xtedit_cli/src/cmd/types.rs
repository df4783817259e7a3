use std::path::PathBuf;

use xtedit::doc::{Result, Schema, TypeId, TypeKind};

use crate::cmd::util::{emit_json, open_document};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// List only the types a pointer or handle declared with this base may hold.
	#[arg(long = "assignable-to")]
	pub assignable_to: Option<String>,
	#[arg(long)]
	pub json: bool,
}

/// List schema types, or the concrete types assignable to a base.
pub fn run(args: Args) -> Result<()> {
	let Args { path, assignable_to, json } = args;

	let (_, doc) = open_document(&path)?;
	let schema = doc.schema();
	let ids: Vec<TypeId> = match &assignable_to {
		Some(base) => schema.assignable_types(schema.require(base)?).collect(),
		None => schema.ids().collect(),
	};
	let rows: Vec<TypeRowJson> = ids.into_iter().map(|ty| type_row(schema, ty)).collect();

	if json {
		return emit_json(&TypesJson {
			path: path.display().to_string(),
			assignable_to,
			types: rows,
		});
	}

	println!("path: {}", path.display());
	if let Some(base) = &assignable_to {
		println!("assignable_to: {base}");
	}
	println!("types: {}", rows.len());
	println!("name\tkind\tdetail");
	for row in &rows {
		println!("{}\t{}\t{}", row.name, row.kind, row.detail);
	}

	Ok(())
}

fn type_row(schema: &Schema, ty: TypeId) -> TypeRowJson {
	let def = schema.get(ty);
	let detail = match &def.kind {
		TypeKind::Atom(kind) => kind.as_str().to_owned(),
		TypeKind::Struct { parent, .. } => {
			let fields = schema.fields(ty).len();
			match parent {
				Some(parent) => format!("parent={} fields={fields}", schema.name(*parent)),
				None => format!("fields={fields}"),
			}
		}
		TypeKind::Array { base } | TypeKind::Pointer { base } | TypeKind::Handle { base } => format!("base={}", schema.name(*base)),
		TypeKind::Enum { labels, flags } => {
			let labels = labels.join("|");
			if *flags { format!("flags={labels}") } else { format!("labels={labels}") }
		}
	};

	TypeRowJson {
		name: def.name.to_string(),
		kind: def.kind_label(),
		detail,
	}
}

#[derive(serde::Serialize)]
struct TypeRowJson {
	name: String,
	kind: &'static str,
	detail: String,
}

#[derive(serde::Serialize)]
struct TypesJson {
	path: String,
	assignable_to: Option<String>,
	types: Vec<TypeRowJson>,
}
