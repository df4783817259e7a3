use crate::doc::test_support::{item_document, root_field};
use crate::doc::{Atom, DocError, EditOp, EditSession, RootId, SessionOptions, SessionState, Value};

#[test]
fn new_pointer_target_commits_and_undoes() {
	let doc = item_document();
	let child = root_field(&doc, 7, "child");
	let derived = doc.schema().require("Derived").expect("Derived exists");
	let mut session = EditSession::new(doc);

	let item = session.begin_pass().new_pointer_target(child, derived).expect("Derived is a Base");
	assert_eq!(session.state(), SessionState::Collecting);
	assert!(matches!(session.doc().value(child), Ok(Value::Pointer(None))), "nothing applies before commit");

	let report = session.commit();
	assert_eq!(report.applied, 1);
	assert!(report.rejected.is_empty());
	assert_eq!(session.state(), SessionState::Idle);
	assert!(session.pending().is_empty());
	assert!(matches!(session.doc().value(child), Ok(Value::Pointer(Some(target))) if *target == item));
	assert_eq!(session.doc().type_name_of(item).expect("item type"), "Derived");
	assert!(session.doc().heap().contains(item));
	assert_eq!(session.dirty(), 1);

	session.undo().expect("undo succeeds");
	assert!(matches!(session.doc().value(child), Ok(Value::Pointer(None))));
	assert!(!session.doc().heap().contains(item));
	assert!(!session.is_dirty());

	session.redo().expect("redo succeeds");
	assert!(matches!(session.doc().value(child), Ok(Value::Pointer(Some(target))) if *target == item));
	assert!(session.doc().heap().contains(item));
}

#[test]
fn new_pointer_target_rejects_unrelated_type() {
	let doc = item_document();
	let child = root_field(&doc, 7, "child");
	let other = doc.schema().require("Other").expect("Other exists");
	let mut session = EditSession::new(doc);

	let err = session.begin_pass().new_pointer_target(child, other).expect_err("Other is not a Base");
	assert!(matches!(err, DocError::NotAssignable { .. }));
	assert!(session.pending().is_empty());
}

#[test]
fn heap_values_are_shared_between_pointers() {
	let mut doc = item_document();
	let base = doc.schema().require("Base").expect("Base exists");
	let shared = doc.create_value(base);
	doc.heap_add(shared);
	let first = root_field(&doc, 7, "child");
	let second = root_field(&doc, 8, "child");
	let mut session = EditSession::new(doc);

	{
		let mut pass = session.begin_pass();
		pass.adopt_heap_value(first, shared).expect("adopt into root 7");
		pass.adopt_heap_value(second, shared).expect("adopt into root 8");
	}
	assert_eq!(session.commit().applied, 2);

	let doc = session.doc();
	assert!(matches!(doc.value(first), Ok(Value::Pointer(Some(target))) if *target == shared));
	assert!(matches!(doc.value(second), Ok(Value::Pointer(Some(target))) if *target == shared));
	assert_eq!(doc.heap().iter().collect::<Vec<_>>(), [shared], "adoption keeps the value in the heap once");

	session.undo().expect("undo second adoption");
	session.undo().expect("undo first adoption");
	assert!(session.doc().heap().contains(shared));
}

#[test]
fn adopt_requires_heap_membership() {
	let mut doc = item_document();
	let base = doc.schema().require("Base").expect("Base exists");
	let loose = doc.create_value(base);
	let child = root_field(&doc, 7, "child");
	let mut session = EditSession::new(doc);

	let err = session.begin_pass().adopt_heap_value(child, loose).expect_err("value is not in the heap");
	assert!(matches!(err, DocError::NotInHeap { .. }));
}

#[test]
fn stale_command_is_rejected_and_rest_commit() {
	let doc = item_document();
	let child = root_field(&doc, 7, "child");
	let mode = root_field(&doc, 7, "mode");
	let base = doc.schema().require("Base").expect("Base exists");
	let mut session = EditSession::new(doc);

	{
		let mut pass = session.begin_pass();
		pass.new_pointer_target(child, base).expect("first target");
		pass.new_pointer_target(child, base).expect("second target captured the same null");
		pass.set_enum_label(mode, "Auto").expect("mode label");
	}
	let report = session.commit();
	assert_eq!(report.applied, 2);
	assert_eq!(report.rejected.len(), 1);
	assert!(matches!(report.rejected[0].error, DocError::InvariantViolation { .. }));
	assert_eq!(session.history().undo_len(), 2);
	assert!(matches!(session.doc().value(mode), Ok(Value::Enum(2))));
}

#[test]
fn undo_and_redo_on_empty_history_fail() {
	let mut session = EditSession::new(item_document());
	assert!(matches!(session.undo(), Err(DocError::EmptyHistory)));
	assert!(matches!(session.redo(), Err(DocError::EmptyHistory)));
	assert_eq!(session.dirty(), 0);
}

#[test]
fn dirty_counter_tracks_undo_and_save() {
	let doc = item_document();
	let label = root_field(&doc, 7, "label");
	let mut session = EditSession::new(doc);

	session.begin_pass().set_atom_text(label, "crate").expect("string literal");
	session.commit();
	session.mark_saved();
	assert!(!session.is_dirty());

	session.undo().expect("undo after save");
	assert_eq!(session.dirty(), -1, "undoing past the save point is dirty");
	assert!(matches!(session.doc().atom(label), Ok(Atom::String(text)) if text.is_empty()));

	session.redo().expect("redo to the save point");
	assert!(!session.is_dirty());
}

#[test]
fn history_capacity_bounds_undo() {
	let doc = item_document();
	let mode = root_field(&doc, 7, "mode");
	let mut session = EditSession::with_options(doc, SessionOptions { history_capacity: 2 });

	for label in ["On", "Auto", "Off"] {
		session.begin_pass().set_enum_label(mode, label).expect("label exists");
		session.commit();
	}
	session.undo().expect("undo Off");
	session.undo().expect("undo Auto");
	assert!(matches!(session.undo(), Err(DocError::EmptyHistory)));
	assert!(matches!(session.doc().value(mode), Ok(Value::Enum(1))), "the On edit fell out of history");
}

#[test]
fn flags_toggle_and_label_checks() {
	let doc = item_document();
	let caps = root_field(&doc, 7, "caps");
	let mode = root_field(&doc, 7, "mode");
	let mut session = EditSession::new(doc);

	session.begin_pass().toggle_flag(caps, "Exec").expect("Exec is a flag");
	session.commit();
	session.begin_pass().toggle_flag(caps, "Read").expect("Read is a flag");
	session.commit();
	assert!(matches!(session.doc().value(caps), Ok(Value::Enum(0b101))));

	let mut pass = session.begin_pass();
	assert!(matches!(pass.toggle_flag(mode, "On"), Err(DocError::InvalidLiteral { .. })), "Mode is not a flags enum");
	assert!(matches!(pass.set_enum_label(caps, "Read"), Err(DocError::InvalidLiteral { .. })));
	assert!(matches!(pass.set_enum_label(mode, "Missing"), Err(DocError::InvalidLiteral { .. })));
}

#[test]
fn arrays_allocate_append_remove_and_clear() {
	let doc = item_document();
	let parts = root_field(&doc, 7, "parts");
	let samples = root_field(&doc, 7, "samples");
	let mut session = EditSession::new(doc);

	{
		let mut pass = session.begin_pass();
		assert!(matches!(pass.append(parts), Err(DocError::TypeMismatch { .. })), "null array cannot grow");
		pass.new_array(parts).expect("alloc parts");
		pass.new_array(samples).expect("alloc samples");
	}
	session.commit();

	let (a, b, s) = {
		let mut pass = session.begin_pass();
		let a = pass.append(parts).expect("first part");
		let b = pass.append(parts).expect("second part");
		let s = pass.append(samples).expect("sample");
		(a, b, s)
	};
	assert_eq!(session.commit().applied, 3);
	assert_eq!(session.doc().elements(parts).expect("array"), Some(&[a, b][..]));
	assert!(session.doc().heap().contains(a) && session.doc().heap().contains(b), "struct elements are heap-tracked");
	assert!(!session.doc().heap().contains(s), "atom elements are not");

	session.begin_pass().remove_at(parts, 0).expect("remove first");
	session.commit();
	assert_eq!(session.doc().elements(parts).expect("array"), Some(&[b][..]));
	assert!(matches!(session.begin_pass().remove_at(parts, 4), Err(DocError::IndexOutOfRange { index: 4, len: 1 })));

	session.begin_pass().clear(parts).expect("clear parts");
	session.commit();
	assert_eq!(session.doc().elements(parts).expect("array"), None);

	session.undo().expect("undo clear");
	session.undo().expect("undo remove");
	assert_eq!(session.doc().elements(parts).expect("array"), Some(&[a, b][..]));
}

#[test]
fn append_after_queued_remove_lands_at_the_end() {
	let doc = item_document();
	let samples = root_field(&doc, 7, "samples");
	let mut session = EditSession::new(doc);

	let (x, y) = {
		let mut pass = session.begin_pass();
		pass.new_array(samples).expect("alloc samples");
		let x = pass.append(samples).expect("append to queued allocation");
		let y = pass.append(samples).expect("second append");
		(x, y)
	};
	assert_eq!(session.commit().applied, 3);
	assert_eq!(session.doc().elements(samples).expect("array"), Some(&[x, y][..]));

	let z = {
		let mut pass = session.begin_pass();
		pass.remove_at(samples, 0).expect("remove x");
		pass.append(samples).expect("append after remove")
	};
	let report = session.commit();
	assert_eq!(report.applied, 2);
	assert!(report.rejected.is_empty());
	assert_eq!(session.doc().elements(samples).expect("array"), Some(&[y, z][..]));

	session.undo().expect("undo append");
	session.undo().expect("undo remove");
	assert_eq!(session.doc().elements(samples).expect("array"), Some(&[x, y][..]));
}

#[test]
fn batch_writing_one_atom_twice_commits_and_undoes() {
	let doc = item_document();
	let label = root_field(&doc, 7, "label");
	let mut session = EditSession::new(doc);

	{
		let mut pass = session.begin_pass();
		let first = pass.set_atom_op(label, Atom::String("a".into())).expect("string atom");
		let second = EditOp::SetAtom {
			target: label,
			old: Atom::String("a".into()),
			new: Atom::String("b".into()),
		};
		pass.batch("rename twice", vec![first, second]);
	}
	assert_eq!(session.commit().applied, 1);
	assert!(matches!(session.doc().atom(label), Ok(Atom::String(text)) if text.as_ref() == "b"));

	assert_eq!(session.undo().expect("undo batch"), "rename twice");
	assert!(matches!(session.doc().atom(label), Ok(Atom::String(text)) if text.is_empty()));
	session.redo().expect("redo batch");
	assert!(matches!(session.doc().atom(label), Ok(Atom::String(text)) if text.as_ref() == "b"));
}

#[test]
fn handles_retarget_and_clear() {
	let doc = item_document();
	let owner = root_field(&doc, 7, "owner");
	let mut session = EditSession::new(doc);

	assert!(matches!(session.begin_pass().set_handle(owner, RootId(99)), Err(DocError::NotFound { id: 99 })));
	session.begin_pass().set_handle(owner, RootId(8)).expect("root 8 is an Item");
	session.commit();
	assert!(matches!(session.doc().value(owner), Ok(Value::Handle(Some(RootId(8))))));

	session.begin_pass().clear(owner).expect("clear handle");
	session.commit();
	assert!(matches!(session.doc().value(owner), Ok(Value::Handle(None))));

	session.begin_pass().clear(owner).expect("already null");
	assert!(session.pending().is_empty(), "clearing a null handle queues nothing");
}

#[test]
fn clearing_a_pointer_leaves_heap_untouched() {
	let doc = item_document();
	let child = root_field(&doc, 7, "child");
	let base = doc.schema().require("Base").expect("Base exists");
	let mut session = EditSession::new(doc);

	let item = session.begin_pass().new_pointer_target(child, base).expect("new Base");
	session.commit();
	session.begin_pass().clear(child).expect("clear pointer");
	session.commit();

	assert!(matches!(session.doc().value(child), Ok(Value::Pointer(None))));
	assert!(session.doc().heap().contains(item), "cleared target stays adoptable");
	assert_eq!(session.doc().heap_candidate_ids(base), [item]);
}

#[test]
fn set_atom_checks_kind() {
	let doc = item_document();
	let label = root_field(&doc, 7, "label");
	let mut session = EditSession::new(doc);
	let mut pass = session.begin_pass();

	assert!(matches!(pass.set_atom(label, Atom::F32(1.0)), Err(DocError::TypeMismatch { .. })));
	let pos = root_field(pass.doc(), 7, "pos");
	let vx = pass.doc().field(pos, "vx").expect("vx exists");
	assert!(matches!(pass.set_atom_text(vx, "abc"), Err(DocError::InvalidLiteral { kind: "f32", .. })));
}
