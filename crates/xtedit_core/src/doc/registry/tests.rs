use std::sync::Arc;

use crate::doc::test_support::{item_document, root_field};
use crate::doc::{DocError, Document, EditPass, HandlerDef, HandlerRegistry, Result, TypeHandler, ValueId, builtin_catalog, registry};

#[derive(Debug)]
struct Fixed(&'static str);

impl TypeHandler for Fixed {
	fn summarize(&self, _doc: &Document, _value: ValueId) -> Result<String> {
		Ok(self.0.to_owned())
	}
}

fn fixed_label() -> Arc<dyn TypeHandler> {
	Arc::new(Fixed("catalog"))
}

#[test]
fn resolve_unregistered_fails_then_returns_registered_handler() {
	let registry = HandlerRegistry::new(Vec::new());
	assert!(!registry.has_handler("Base"));
	assert!(matches!(registry.resolve("Base"), Err(DocError::UnregisteredType { name }) if name == "Base"));

	let handler: Arc<dyn TypeHandler> = Arc::new(Fixed("base"));
	registry.register("Base", Arc::clone(&handler));
	assert!(registry.has_handler("Base"));
	let resolved = registry.resolve("Base").expect("registered");
	assert!(Arc::ptr_eq(&resolved, &handler));
}

#[test]
fn lookup_is_exact_by_type_name() {
	let registry = HandlerRegistry::new(Vec::new());
	registry.register("Base", Arc::new(Fixed("base")));
	assert!(!registry.has_handler("Derived"), "subtypes do not inherit handlers");
}

#[test]
fn reload_restores_catalog_and_drops_ad_hoc_entries() {
	let registry = HandlerRegistry::new(vec![HandlerDef {
		type_name: "Item",
		build: fixed_label,
	}]);
	registry.register("Other", Arc::new(Fixed("ad hoc")));
	registry.register("Item", Arc::new(Fixed("override")));
	assert_eq!(registry.snapshot().names(), ["Item", "Other"]);

	assert_eq!(registry.reload(), 1);
	assert!(!registry.has_handler("Other"));
	let doc = item_document();
	let root = doc.roots().iter().next().expect("root").value;
	let text = registry.resolve("Item").expect("catalog entry").summarize(&doc, root).expect("summary");
	assert_eq!(text, "catalog");
}

#[test]
fn snapshot_survives_reload_and_clear() {
	let registry = HandlerRegistry::new(builtin_catalog());
	let before = registry.snapshot();
	registry.clear();
	assert!(registry.snapshot().is_empty());
	assert!(matches!(registry.resolve("Vec3"), Err(DocError::UnregisteredType { .. })));

	let doc = item_document();
	let pos = root_field(&doc, 7, "pos");
	let handler = before.get("Vec3").expect("held snapshot still has Vec3");
	assert_eq!(handler.summarize(&doc, pos).expect("summary"), "(0, 0, 0)");

	registry.reload();
	assert!(registry.has_handler("Vec3"));
	assert_eq!(before.len(), registry.snapshot().len());
}

#[test]
fn default_edit_is_unsupported() {
	let mut session = crate::doc::EditSession::new(item_document());
	let label = root_field(session.doc(), 7, "label");
	let mut pass: EditPass<'_> = session.begin_pass();
	let err = Fixed("x").edit(&mut pass, label, "text").expect_err("no edit support");
	assert!(matches!(err, DocError::HandlerEditUnsupported { name } if name == "string"));
}

#[test]
fn global_registry_lifecycle() {
	let first = registry::init();
	let second = registry::init();
	assert!(std::ptr::eq(first, second), "init is idempotent");
	assert!(registry::global().has_handler("Rgb"));

	registry::shutdown();
	assert!(!registry::global().has_handler("Rgb"));
	assert_eq!(registry::reload(), builtin_catalog().len());
	assert!(registry::global().has_handler("Rgb"));
}

#[test]
fn lookups_see_whole_tables_while_another_thread_reloads() {
	let registry = HandlerRegistry::new(builtin_catalog());
	let catalog_len = registry.snapshot().len();
	let doc = item_document();
	let pos = root_field(&doc, 7, "pos");

	std::thread::scope(|scope| {
		let reader = scope.spawn(|| {
			for _ in 0..2_000 {
				match registry.resolve("Vec3") {
					Ok(handler) => {
						assert_eq!(handler.summarize(&doc, pos).expect("summary"), "(0, 0, 0)");
					}
					Err(err) => assert!(matches!(err, DocError::UnregisteredType { .. })),
				}
				let len = registry.snapshot().len();
				assert!(len == 0 || len == catalog_len, "partial table with {len} handlers");
			}
		});

		for _ in 0..500 {
			assert_eq!(registry.reload(), catalog_len);
			registry.clear();
		}
		registry.reload();
		reader.join().expect("reader thread finishes");
	});

	assert!(registry.resolve("Vec3").is_ok());
}
