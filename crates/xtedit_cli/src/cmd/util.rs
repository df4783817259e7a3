use std::path::Path;

use serde::Serialize;
use xtedit::doc::{Compression, DocError, Document, HandlerTable, Result, RootId, SnapshotCodec, Value, ValueId};

/// Rendering of a handle whose root is not present in the document.
pub(crate) const NOT_LOADED: &str = "Not Loaded";

/// Pretty-print a JSON payload on stdout.
pub(crate) fn emit_json<T: Serialize>(payload: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(payload)?);
	Ok(())
}

/// Load a snapshot with the default codec.
pub(crate) fn open_document(path: &Path) -> Result<(Compression, Document)> {
	SnapshotCodec::default().open(path)
}

/// Parse a decimal root id.
pub(crate) fn parse_root_id(text: &str) -> Result<RootId> {
	text.parse::<u32>().map(RootId).map_err(|_| DocError::InvalidLiteral {
		kind: "root id",
		text: text.to_owned(),
	})
}

/// Registered handler summary for `value`, if its type has a handler that can summarize it.
pub(crate) fn handler_summary(doc: &Document, table: &HandlerTable, value: ValueId) -> Option<String> {
	let name = doc.type_name_of(value).ok()?;
	table.get(name)?.summarize(doc, value).ok()
}

/// Render one value as a single display line.
pub(crate) fn render_value(doc: &Document, table: &HandlerTable, value: ValueId) -> String {
	let Ok(node) = doc.node(value) else {
		return format!("<missing {value}>");
	};
	match &node.value {
		Value::Atom(atom) => atom.to_string(),
		Value::Enum(bits) => doc.schema().enum_text(node.ty, *bits),
		Value::Struct(_) => render_target(doc, table, value),
		Value::Array(None) | Value::Pointer(None) | Value::Handle(None) => "null".to_owned(),
		Value::Array(Some(items)) => format!("len={}", items.len()),
		Value::Pointer(Some(target)) => format!("-> {}", render_target(doc, table, *target)),
		Value::Handle(Some(root)) => match doc.roots().find(*root) {
			Some(entry) => format!("-> [{root}] {}", render_target(doc, table, entry.value)),
			None => NOT_LOADED.to_owned(),
		},
	}
}

fn render_target(doc: &Document, table: &HandlerTable, value: ValueId) -> String {
	let name = doc.type_name_of(value).unwrap_or("?");
	match handler_summary(doc, table, value) {
		Some(summary) => format!("{name} {summary}"),
		None => name.to_owned(),
	}
}
