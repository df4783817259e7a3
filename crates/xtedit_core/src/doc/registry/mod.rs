use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::doc::{DocError, Document, EditPass, Result, ValueId, builtin_catalog};

/// Behavior attached to one runtime type name.
pub trait TypeHandler: Send + Sync {
	/// Render a one-line summary of `value`.
	fn summarize(&self, doc: &Document, value: ValueId) -> Result<String>;

	/// Translate textual input into commands queued on `pass`.
	fn edit(&self, pass: &mut EditPass<'_>, value: ValueId, input: &str) -> Result<()> {
		let _ = input;
		Err(DocError::HandlerEditUnsupported {
			name: pass.doc().type_name_of(value)?.to_owned(),
		})
	}
}

/// Declarative catalog entry consumed by [`HandlerRegistry::reload`].
#[derive(Clone, Copy)]
pub struct HandlerDef {
	/// Exact runtime type name served.
	pub type_name: &'static str,
	/// Handler constructor.
	pub build: fn() -> Arc<dyn TypeHandler>,
}

impl fmt::Debug for HandlerDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HandlerDef").field("type_name", &self.type_name).finish_non_exhaustive()
	}
}

/// Immutable type-name to handler map.
#[derive(Clone, Default)]
pub struct HandlerTable {
	handlers: HashMap<Box<str>, Arc<dyn TypeHandler>>,
}

impl HandlerTable {
	/// Build a table by running every catalog constructor; later entries win.
	pub fn from_catalog(catalog: &[HandlerDef]) -> Self {
		let handlers = catalog.iter().map(|def| (Box::from(def.type_name), (def.build)())).collect();
		Self { handlers }
	}

	/// Look up a handler by exact type name.
	pub fn get(&self, type_name: &str) -> Option<&Arc<dyn TypeHandler>> {
		self.handlers.get(type_name)
	}

	/// Return sorted type names with a handler.
	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.handlers.keys().map(AsRef::as_ref).collect();
		names.sort_unstable();
		names
	}

	/// Return number of handlers.
	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	/// Return whether the table is empty.
	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}
}

impl fmt::Debug for HandlerTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.names()).finish()
	}
}

/// Reloadable handler dispatch.
///
/// The live table sits behind a lock as an `Arc` snapshot. Readers clone the snapshot and may
/// keep dispatching through it while a writer builds and swaps in a replacement.
#[derive(Debug)]
pub struct HandlerRegistry {
	catalog: Vec<HandlerDef>,
	live: RwLock<Arc<HandlerTable>>,
}

impl HandlerRegistry {
	/// Create a registry populated from `catalog`.
	pub fn new(catalog: Vec<HandlerDef>) -> Self {
		let table = HandlerTable::from_catalog(&catalog);
		Self {
			catalog,
			live: RwLock::new(Arc::new(table)),
		}
	}

	/// Return the current table snapshot.
	pub fn snapshot(&self) -> Arc<HandlerTable> {
		Arc::clone(&self.live.read())
	}

	/// Associate a handler with a type name, replacing any previous one.
	///
	/// Ad-hoc registrations do not survive [`HandlerRegistry::reload`].
	pub fn register(&self, type_name: &str, handler: Arc<dyn TypeHandler>) {
		let mut live = self.live.write();
		let mut next = HandlerTable::clone(&live);
		next.handlers.insert(Box::from(type_name), handler);
		*live = Arc::new(next);
	}

	/// Return whether `type_name` has a handler.
	pub fn has_handler(&self, type_name: &str) -> bool {
		self.live.read().get(type_name).is_some()
	}

	/// Look up a handler, failing with [`DocError::UnregisteredType`].
	pub fn resolve(&self, type_name: &str) -> Result<Arc<dyn TypeHandler>> {
		self.live
			.read()
			.get(type_name)
			.cloned()
			.ok_or_else(|| DocError::UnregisteredType { name: type_name.to_owned() })
	}

	/// Rebuild the table from the catalog and swap it in; returns the handler count.
	pub fn reload(&self) -> usize {
		let table = Arc::new(HandlerTable::from_catalog(&self.catalog));
		let count = table.len();
		*self.live.write() = table;
		debug!(handlers = count, "handler registry reloaded");
		count
	}

	/// Swap in an empty table.
	pub fn clear(&self) {
		*self.live.write() = Arc::new(HandlerTable::default());
	}
}

static GLOBAL: OnceLock<HandlerRegistry> = OnceLock::new();

/// Initialize the process-wide registry with the built-in catalog. Repeated calls are no-ops.
pub fn init() -> &'static HandlerRegistry {
	GLOBAL.get_or_init(|| HandlerRegistry::new(builtin_catalog()))
}

/// Return the process-wide registry, initializing it on first use.
pub fn global() -> &'static HandlerRegistry {
	init()
}

/// Reload the process-wide registry from its catalog.
pub fn reload() -> usize {
	global().reload()
}

/// Empty the process-wide registry; [`reload`] repopulates it.
pub fn shutdown() {
	global().clear();
}

#[cfg(test)]
mod tests;
