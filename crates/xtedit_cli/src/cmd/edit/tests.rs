use xtedit::doc::{DocError, Document, EditSession, RootId, Value, resolve_path};

use super::EditStep;
use crate::cmd::test_support::fixture_document;

fn run(session: &mut EditSession, op: &str) -> Result<Vec<String>, DocError> {
	Ok(EditStep::parse(op)?.apply(session)?.labels)
}

fn atom_text(doc: &Document, path: &str) -> String {
	let value = resolve_path(doc, path).expect("path resolves");
	doc.atom(value).expect("atom").to_string()
}

fn enum_bits(doc: &Document, path: &str) -> u32 {
	match doc.value(resolve_path(doc, path).expect("path resolves")) {
		Ok(Value::Enum(bits)) => *bits,
		other => panic!("expected enum at {path}, got {other:?}"),
	}
}

#[test]
fn parses_verbs_paths_and_arguments() {
	assert_eq!(
		EditStep::parse("set 7.label hello  world").expect("set"),
		EditStep::Set {
			path: "7.label".to_owned(),
			text: "hello  world".to_owned(),
		}
	);
	assert_eq!(
		EditStep::parse("  handle 7.owner 8 ").expect("handle"),
		EditStep::Handle {
			path: "7.owner".to_owned(),
			root: RootId(8),
		}
	);
	assert_eq!(
		EditStep::parse("use 8.child 2").expect("use"),
		EditStep::Use {
			path: "8.child".to_owned(),
			heap_index: 2,
		}
	);
	assert_eq!(EditStep::parse("undo").expect("undo"), EditStep::Undo);
	assert_eq!(EditStep::parse("redo").expect("redo"), EditStep::Redo);

	for bad in ["", "undo 7", "frob 7.label", "clear", "clear 7.child extra", "remove 7.samples x", "new 7.child", "handle 7.owner -1"] {
		assert!(EditStep::parse(bad).is_err(), "{bad:?} should not parse");
	}
}

#[test]
fn set_writes_atoms_and_enums() {
	let mut session = EditSession::new(fixture_document());

	run(&mut session, "set 7.label renamed item").expect("label");
	run(&mut session, "set 7.pos.vx -1.5").expect("component");
	run(&mut session, "set 7.mode Auto").expect("mode label");
	run(&mut session, "set 8.mode 1").expect("mode bits");
	run(&mut session, "set 7.caps Read,Exec").expect("caps list");
	run(&mut session, "set 8.caps None").expect("caps none");
	run(&mut session, "toggle 8.caps Write").expect("toggle");

	let doc = session.doc();
	assert_eq!(atom_text(doc, "7.label"), "\"renamed item\"");
	assert_eq!(atom_text(doc, "7.pos.vx"), "-1.5");
	assert_eq!(enum_bits(doc, "7.mode"), 2);
	assert_eq!(enum_bits(doc, "8.mode"), 1);
	assert_eq!(enum_bits(doc, "7.caps"), 0b101);
	assert_eq!(enum_bits(doc, "8.caps"), 0b010);
	assert_eq!(session.history().undo_len(), 7);

	assert!(matches!(run(&mut session, "set 7.caps Read,Bogus"), Err(DocError::InvalidLiteral { .. })));
	assert!(matches!(run(&mut session, "set 7.samples 3"), Err(DocError::TypeMismatch { .. })));
	assert!(matches!(run(&mut session, "set 7.pos.vx abc"), Err(DocError::InvalidLiteral { .. })));
	assert_eq!(session.history().undo_len(), 7);
}

#[test]
fn input_dispatches_to_registered_handlers() {
	let mut session = EditSession::new(fixture_document());

	let labels = run(&mut session, "input 7.pos 4, 5, 6").expect("vec3 input");
	assert_eq!(labels.len(), 1, "handler edits are one batched command");
	run(&mut session, "input 7.span -3-4").expect("range input");
	run(&mut session, "input 7.tint 0,0,1").expect("color input");

	let doc = session.doc();
	assert_eq!(atom_text(doc, "7.pos.vz"), "6");
	assert_eq!(atom_text(doc, "7.span.from"), "-3");
	assert_eq!(atom_text(doc, "7.span.to"), "4");
	assert_eq!(atom_text(doc, "7.tint.b"), "1");

	assert!(matches!(run(&mut session, "input 8.child 1"), Err(DocError::UnregisteredType { name }) if name == "Derived"));
	assert!(matches!(run(&mut session, "input 7.child 1"), Err(DocError::TypeMismatch { .. })));

	session.undo().expect("undo color");
	assert_eq!(atom_text(session.doc(), "7.tint.b"), "0");
}

#[test]
fn pointer_steps_adopt_create_and_undo() {
	let mut session = EditSession::new(fixture_document());
	assert_eq!(session.doc().heap().len(), 3);

	run(&mut session, "use 7.child 1").expect("adopt shared base");
	assert_eq!(atom_text(session.doc(), "7.child.weight"), "2");
	assert_eq!(session.doc().heap().len(), 3);

	run(&mut session, "new 7.child Derived").expect("new derived");
	assert_eq!(session.doc().heap().len(), 4);
	assert_eq!(atom_text(session.doc(), "7.child.extra"), "0");

	assert_eq!(EditStep::Undo.apply(&mut session).expect("undo new").action, "undo");
	assert_eq!(session.doc().heap().len(), 3);
	assert_eq!(atom_text(session.doc(), "7.child.weight"), "2");

	EditStep::Redo.apply(&mut session).expect("redo new");
	assert_eq!(session.doc().heap().len(), 4);

	assert!(matches!(run(&mut session, "use 7.child 9"), Err(DocError::IndexOutOfRange { index: 9, len: 4 })));
	assert!(matches!(run(&mut session, "use 7.child 2"), Err(DocError::NotAssignable { .. })));
	assert!(matches!(run(&mut session, "new 7.child Other"), Err(DocError::NotAssignable { .. })));
	assert!(matches!(run(&mut session, "new 7.child Missing"), Err(DocError::TypeNotFound { .. })));

	run(&mut session, "clear 7.child").expect("clear");
	assert!(matches!(session.doc().value(resolve_path(session.doc(), "7.child").expect("path")), Ok(Value::Pointer(None))));
	assert_eq!(session.doc().heap().len(), 4);
}

#[test]
fn array_and_handle_steps() {
	let mut session = EditSession::new(fixture_document());

	assert!(matches!(run(&mut session, "append 7.parts"), Err(DocError::TypeMismatch { .. })));
	run(&mut session, "alloc 7.parts").expect("alloc");
	run(&mut session, "append 7.parts").expect("append first");
	run(&mut session, "append 7.parts").expect("append second");
	let parts = resolve_path(session.doc(), "7.parts").expect("parts");
	assert_eq!(session.doc().elements(parts).expect("array").map(<[_]>::len), Some(2));
	assert_eq!(session.doc().heap().len(), 5);

	run(&mut session, "remove 7.parts 0").expect("remove");
	assert_eq!(session.doc().elements(parts).expect("array").map(<[_]>::len), Some(1));
	assert!(matches!(run(&mut session, "remove 7.parts 3"), Err(DocError::IndexOutOfRange { index: 3, len: 1 })));
	assert!(matches!(run(&mut session, "alloc 7.samples"), Err(DocError::TypeMismatch { .. })));

	run(&mut session, "handle 8.owner 7").expect("handle");
	assert_eq!(atom_text(session.doc(), "8.owner.label"), "\"first\"");
	assert!(matches!(run(&mut session, "handle 8.owner 99"), Err(DocError::NotFound { id: 99 })));

	run(&mut session, "clear 8.owner").expect("clear handle");
	assert!(matches!(resolve_path(session.doc(), "8.owner.label"), Err(DocError::PathNotFound { .. })));
}

#[test]
fn undo_and_redo_report_empty_history() {
	let mut session = EditSession::new(fixture_document());
	assert!(matches!(run(&mut session, "undo"), Err(DocError::EmptyHistory)));
	assert!(matches!(run(&mut session, "redo"), Err(DocError::EmptyHistory)));

	let labels = run(&mut session, "clear 7.child").expect("clear null pointer");
	assert!(labels.is_empty(), "null pointer clear queues nothing");
	assert!(!session.is_dirty());
}
