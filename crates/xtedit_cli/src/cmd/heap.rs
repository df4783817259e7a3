use std::path::PathBuf;

use xtedit::doc::{Result, registry};

use crate::cmd::util::{emit_json, handler_summary, open_document};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Show only entries a pointer of this base type could adopt.
	#[arg(long)]
	pub base: Option<String>,
	#[arg(long)]
	pub json: bool,
}

/// List reference heap entries with their heap index (the `use` step argument).
pub fn run(args: Args) -> Result<()> {
	let Args { path, base, json } = args;

	let (_, doc) = open_document(&path)?;
	let table = registry::global().snapshot();
	let candidates = match &base {
		Some(name) => Some(doc.heap_candidate_ids(doc.schema().require(name)?)),
		None => None,
	};

	let entries: Vec<HeapEntryJson> = doc
		.heap()
		.iter()
		.enumerate()
		.filter(|(_, value)| candidates.as_ref().is_none_or(|ids| ids.contains(value)))
		.map(|(index, value)| HeapEntryJson {
			index,
			value: value.0,
			type_name: doc.type_name_of(value).unwrap_or("?").to_owned(),
			summary: handler_summary(&doc, &table, value),
		})
		.collect();

	if json {
		return emit_json(&HeapJson {
			path: path.display().to_string(),
			base,
			entries,
		});
	}

	println!("path: {}", path.display());
	if let Some(base) = &base {
		println!("base: {base}");
	}
	println!("entries: {}", entries.len());
	println!("idx\tvalue\ttype\tsummary");
	for entry in &entries {
		println!("{}\t#{}\t{}\t{}", entry.index, entry.value, entry.type_name, entry.summary.as_deref().unwrap_or("-"));
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct HeapEntryJson {
	index: usize,
	value: u32,
	#[serde(rename = "type")]
	type_name: String,
	summary: Option<String>,
}

#[derive(serde::Serialize)]
struct HeapJson {
	path: String,
	base: Option<String>,
	entries: Vec<HeapEntryJson>,
}
