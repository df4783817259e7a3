use xtedit::doc::{Document, DocumentCodec, HandlerTable, SnapshotCodec, builtin_catalog};

/// Two `Item` roots (7 and 8) plus three heap entries: `Derived`, `Base`, `Other`.
pub(crate) fn fixture_document() -> Document {
	SnapshotCodec::default()
		.import(&xtedit_testkit::fixture_path("item.json"))
		.expect("item fixture loads")
}

pub(crate) fn builtin_table() -> HandlerTable {
	HandlerTable::from_catalog(&builtin_catalog())
}
