use crate::doc::{Document, RootId, Schema, ValueId};

/// Schema shared by unit tests: a small inheritance tree plus one struct using every variant.
pub(crate) fn item_schema() -> Schema {
	Schema::builder()
		.with_atoms()
		.structure("Base", None, &[("weight", "f32")])
		.structure("Derived", Some("Base"), &[("extra", "i32")])
		.structure("Other", None, &[("name", "string")])
		.structure("Vec3", None, &[("vx", "f32"), ("vy", "f32"), ("vz", "f32")])
		.structure("Rgb", None, &[("r", "f32"), ("g", "f32"), ("b", "f32")])
		.pointer("Base*", "Base")
		.handle("Item&", "Item")
		.array("f32[]", "f32")
		.array("Base[]", "Base")
		.enumeration("Mode", &["Off", "On", "Auto"], false)
		.enumeration("Caps", &["Read", "Write", "Exec"], true)
		.structure(
			"Item",
			None,
			&[
				("child", "Base*"),
				("owner", "Item&"),
				("samples", "f32[]"),
				("parts", "Base[]"),
				("mode", "Mode"),
				("caps", "Caps"),
				("pos", "Vec3"),
				("tint", "Rgb"),
				("label", "string"),
			],
		)
		.build()
		.expect("test schema builds")
}

/// Document with two default `Item` roots, ids 7 and 8.
pub(crate) fn item_document() -> Document {
	let mut doc = Document::new(item_schema());
	let item = doc.schema().require("Item").expect("Item exists");
	doc.add_root(RootId(7), item).expect("root 7 added");
	doc.add_root(RootId(8), item).expect("root 8 added");
	doc
}

/// Resolve `field` on root `root`.
pub(crate) fn root_field(doc: &Document, root: u32, field: &str) -> ValueId {
	let entry = doc.get_root(RootId(root)).expect("root exists");
	doc.field(entry.value, field).expect("field exists")
}
