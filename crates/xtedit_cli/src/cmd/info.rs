use std::path::PathBuf;

use xtedit::doc::{Result, registry};

use crate::cmd::util::{emit_json, open_document};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Print document-level counts and the root table.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let (compression, doc) = open_document(&path)?;
	let reachable = doc.reachable().len();
	let handlers = registry::global().snapshot().len();

	if json {
		return emit_json(&InfoJson {
			path: path.display().to_string(),
			compression: compression.as_str(),
			types: doc.schema().len(),
			nodes: doc.node_count(),
			reachable,
			heap: doc.heap().len(),
			handlers,
			roots: doc
				.roots()
				.iter()
				.map(|entry| InfoRootJson {
					id: entry.id.0,
					type_name: doc.schema().name(entry.ty).to_owned(),
				})
				.collect(),
		});
	}

	println!("path: {}", path.display());
	println!("compression: {}", compression.as_str());
	println!("types: {}", doc.schema().len());
	println!("nodes: {}", doc.node_count());
	println!("reachable: {reachable}");
	println!("heap: {}", doc.heap().len());
	println!("handlers: {handlers}");
	println!("roots:");
	for entry in doc.roots().iter() {
		println!("  [{}] {}", entry.id, doc.schema().name(entry.ty));
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct InfoRootJson {
	id: u32,
	#[serde(rename = "type")]
	type_name: String,
}

#[derive(serde::Serialize)]
struct InfoJson {
	path: String,
	compression: &'static str,
	types: usize,
	nodes: usize,
	reachable: usize,
	heap: usize,
	handlers: usize,
	roots: Vec<InfoRootJson>,
}
