mod command;
mod compression;
mod document;
mod error;
mod handlers;
mod heap;
mod history;
mod path;
/// Handler registry types and the process-wide registry.
pub mod registry;
mod roots;
mod schema;
mod session;
mod snapshot;
mod value;
mod walk;

#[cfg(test)]
mod test_support;

/// Reversible edit commands.
pub use command::{Command, EditOp};
/// Compression detection result and zstd frame magic.
pub use compression::{Compression, ZSTD_MAGIC};
/// Value graph container and field views.
pub use document::{Document, FieldRef};
/// Error and result aliases.
pub use error::{DocError, Result};
/// Built-in type handlers and their catalog.
pub use handlers::{Color, Components, RangeI8, builtin_catalog};
/// Reference heap of adoptable struct values.
pub use heap::RefHeap;
/// Bounded circular undo/redo buffer.
pub use history::History;
/// Value path parser and resolver.
pub use path::{PathStep, ValuePath, resolve_path};
/// Handler dispatch types.
pub use registry::{HandlerDef, HandlerRegistry, HandlerTable, TypeHandler};
/// Root table types.
pub use roots::{RootEntry, RootId, RootTable};
/// Type schema and builder.
pub use schema::{AtomKind, FieldDef, Schema, SchemaBuilder, TypeDef, TypeId, TypeKind};
/// Edit session, pass, and commit reporting.
pub use session::{CommitReport, EditPass, EditSession, Rejected, SessionOptions, SessionState};
/// Snapshot codec and the document import/export interface.
pub use snapshot::{DocumentCodec, SNAPSHOT_FORMAT, SNAPSHOT_VERSION, SnapshotCodec};
/// Value payloads and arena storage.
pub use value::{Atom, Node, Value, ValueArena, ValueId};
/// Read-only traversal types and entry points.
pub use walk::{ItemLabel, WalkItem, WalkOptions, collect_walk, walk};
