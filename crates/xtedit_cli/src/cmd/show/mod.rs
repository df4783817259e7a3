use std::path::PathBuf;

use xtedit::doc::{Document, HandlerTable, Result, WalkItem, WalkOptions, collect_walk, registry};

use crate::cmd::util::{emit_json, open_document, parse_root_id, render_value};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub root: Option<String>,
	#[arg(long = "max-depth")]
	pub max_depth: Option<usize>,
	#[arg(long = "max-array")]
	pub max_array: Option<usize>,
	#[arg(long)]
	pub json: bool,
}

/// Tree rendering options.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ShowOptions {
	pub walk: WalkOptions,
	/// Spaces per depth level.
	pub indent: usize,
}

impl Default for ShowOptions {
	fn default() -> Self {
		Self {
			walk: WalkOptions::default(),
			indent: 2,
		}
	}
}

/// Print the value tree of every root, or of one root.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		root,
		max_depth,
		max_array,
		json,
	} = args;

	let mut options = ShowOptions::default();
	options.walk.root = root.as_deref().map(parse_root_id).transpose()?;
	if let Some(max_depth) = max_depth {
		options.walk.max_depth = max_depth;
	}
	if let Some(max_array) = max_array {
		options.walk.max_array = max_array;
	}

	let (_, doc) = open_document(&path)?;
	let table = registry::global().snapshot();

	if json {
		let items = collect_walk(&doc, &options.walk)?;
		return emit_json(&ShowJson {
			path: path.display().to_string(),
			root: options.walk.root.map(|id| id.0),
			items: items.iter().map(|item| item_json(&doc, &table, item)).collect(),
		});
	}

	println!("path: {}", path.display());
	for line in render_lines(&doc, &table, &options)? {
		println!("{line}");
	}
	Ok(())
}

/// Render the walk as indented `label: value` lines.
pub(crate) fn render_lines(doc: &Document, table: &HandlerTable, options: &ShowOptions) -> Result<Vec<String>> {
	let mut lines = Vec::new();
	for item in collect_walk(doc, &options.walk)? {
		let pad = " ".repeat(item.depth * options.indent);
		let mut line = format!("{pad}{}: {}", item.label, render_value(doc, table, item.value));
		if item.cycle {
			line.push_str(" (cycle)");
		}
		if item.omitted > 0 {
			line.push_str(&format!(" ({} omitted)", item.omitted));
		}
		lines.push(line);
	}
	Ok(lines)
}

fn item_json(doc: &Document, table: &HandlerTable, item: &WalkItem) -> ShowItemJson {
	ShowItemJson {
		depth: item.depth,
		label: item.label.to_string(),
		value: item.value.0,
		type_name: doc.type_name_of(item.value).unwrap_or("?").to_owned(),
		text: render_value(doc, table, item.value),
		target: item.target.map(|target| target.0),
		has_content: item.has_content,
		cycle: item.cycle,
		omitted: item.omitted,
	}
}

#[derive(serde::Serialize)]
struct ShowItemJson {
	depth: usize,
	label: String,
	value: u32,
	#[serde(rename = "type")]
	type_name: String,
	text: String,
	target: Option<u32>,
	has_content: bool,
	cycle: bool,
	omitted: usize,
}

#[derive(serde::Serialize)]
struct ShowJson {
	path: String,
	root: Option<u32>,
	items: Vec<ShowItemJson>,
}
