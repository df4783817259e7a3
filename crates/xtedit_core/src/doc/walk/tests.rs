use crate::doc::test_support::{item_document, root_field};
use crate::doc::{DocError, ItemLabel, RootId, Value, WalkOptions, collect_walk};

fn only(root: u32) -> WalkOptions {
	WalkOptions {
		root: Some(RootId(root)),
		..WalkOptions::default()
	}
}

#[test]
fn visits_fields_in_layout_order_with_labels() {
	let doc = item_document();
	let items = collect_walk(&doc, &only(7)).expect("walk root 7");

	assert_eq!(items.len(), 16, "root, nine fields, and the two inline vectors");
	assert_eq!(items[0].label.to_string(), "[7]");
	assert_eq!(items[0].depth, 0);
	assert_eq!(items[1].label.to_string(), "Base* child");
	assert!(!items[1].has_content);
	assert_eq!(items[1].target, None);

	let pos = items.iter().position(|item| item.label.to_string() == "Vec3 pos").expect("pos visited");
	let nested: Vec<String> = items[pos + 1..pos + 4].iter().map(|item| item.label.to_string()).collect();
	assert_eq!(nested, ["f32 vx", "f32 vy", "f32 vz"]);
	assert!(items[pos + 1..pos + 4].iter().all(|item| item.depth == 2));
}

#[test]
fn walks_every_root_in_insertion_order() {
	let doc = item_document();
	let roots: Vec<_> = collect_walk(&doc, &WalkOptions::default())
		.expect("walk all")
		.into_iter()
		.filter(|item| item.depth == 0)
		.map(|item| item.label)
		.collect();
	assert_eq!(roots, [ItemLabel::Root(RootId(7)), ItemLabel::Root(RootId(8))]);
}

#[test]
fn handles_are_followed_and_cycles_cut() {
	let mut doc = item_document();
	let owner7 = root_field(&doc, 7, "owner");
	let owner8 = root_field(&doc, 8, "owner");
	doc.node_mut(owner7).expect("owner").value = Value::Handle(Some(RootId(8)));
	doc.node_mut(owner8).expect("owner").value = Value::Handle(Some(RootId(7)));

	let items = collect_walk(&doc, &only(7)).expect("walk root 7");
	let via_handle = items.iter().find(|item| item.value == owner7).expect("owner visited");
	assert!(via_handle.has_content);
	assert!(!via_handle.cycle);

	let back = items.iter().find(|item| item.value == owner8).expect("root 8 fields visited through the handle");
	assert_eq!(back.depth, 2);
	assert!(back.cycle, "root 7 is already open");
	assert!(items.iter().all(|item| item.depth <= 3));
}

#[test]
fn array_elements_respect_max_array() {
	let mut doc = item_document();
	let samples = root_field(&doc, 7, "samples");
	let f32_ty = doc.schema().require("f32").expect("f32 exists");
	let elements: Vec<_> = (0..3).map(|_| doc.create_value(f32_ty)).collect();
	doc.node_mut(samples).expect("samples").value = Value::Array(Some(elements));

	let options = WalkOptions { max_array: 2, ..only(7) };
	let items = collect_walk(&doc, &options).expect("walk root 7");
	let array = items.iter().position(|item| item.value == samples).expect("samples visited");
	assert_eq!(items[array].omitted, 1);
	assert_eq!(items[array + 1].label, ItemLabel::Index(0));
	assert_eq!(items[array + 2].label, ItemLabel::Index(1));
	assert_ne!(items[array + 3].label, ItemLabel::Index(2));
}

#[test]
fn max_depth_stops_descent() {
	let doc = item_document();
	let options = WalkOptions { max_depth: 0, ..WalkOptions::default() };
	let items = collect_walk(&doc, &options).expect("walk");
	assert_eq!(items.len(), 2);
	assert!(items.iter().all(|item| item.has_content));
}

#[test]
fn unknown_root_filter_is_not_found() {
	let doc = item_document();
	assert!(matches!(collect_walk(&doc, &only(3)), Err(DocError::NotFound { id: 3 })));
}
