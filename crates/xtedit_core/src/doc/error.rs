use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, DocError>;

/// Errors produced while building, traversing, and editing documents.
#[derive(Debug, Error)]
pub enum DocError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Snapshot JSON failed to parse or serialize.
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),
	/// Unknown leading file magic.
	#[error("unsupported compression or not a snapshot (magic={magic:?})")]
	UnknownMagic {
		/// First up-to-4 bytes of the stream.
		magic: [u8; 4],
	},
	/// Decompression output exceeded configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
	/// Snapshot header names another format or version.
	#[error("unsupported snapshot format {format:?} version {version}")]
	UnsupportedSnapshot {
		/// Declared format tag.
		format: String,
		/// Declared format version.
		version: u32,
	},
	/// Snapshot content is internally inconsistent.
	#[error("invalid snapshot: {reason}")]
	InvalidSnapshot {
		/// Description of the inconsistency.
		reason: String,
	},
	/// Root id is not present in the root table.
	#[error("root not found: {id}")]
	NotFound {
		/// Requested root id.
		id: u32,
	},
	/// Root id was added twice.
	#[error("duplicate root id {id}")]
	DuplicateRoot {
		/// Offending root id.
		id: u32,
	},
	/// No handler is registered for a type name.
	#[error("no handler registered for type {name}")]
	UnregisteredType {
		/// Requested type name.
		name: String,
	},
	/// Handler does not accept textual edits.
	#[error("handler for {name} does not support edits")]
	HandlerEditUnsupported {
		/// Type name served by the handler.
		name: String,
	},
	/// Undo or redo requested with nothing available.
	#[error("history is empty")]
	EmptyHistory,
	/// Captured command target no longer matches the live graph.
	#[error("invariant violation: {reason}")]
	InvariantViolation {
		/// Description of the mismatch.
		reason: String,
	},
	/// Type name is not present in the schema.
	#[error("type not found: {name}")]
	TypeNotFound {
		/// Requested type name.
		name: String,
	},
	/// Schema definitions are inconsistent.
	#[error("invalid schema: {reason}")]
	InvalidSchema {
		/// Description of the inconsistency.
		reason: String,
	},
	/// Value has a different variant or primitive than required.
	#[error("type mismatch: expected {expected}, got {got}")]
	TypeMismatch {
		/// Expected logical value kind.
		expected: &'static str,
		/// Actual value kind or type name.
		got: String,
	},
	/// Type cannot be stored under a pointer or handle of the given base.
	#[error("type {ty} is not assignable to {base}")]
	NotAssignable {
		/// Offered type name.
		ty: String,
		/// Declared base type name.
		base: String,
	},
	/// Value offered for adoption is not in the reference heap.
	#[error("value #{value} is not in the reference heap")]
	NotInHeap {
		/// Arena index of the value.
		value: u32,
	},
	/// Array index outside the current element range.
	#[error("index {index} out of range (len={len})")]
	IndexOutOfRange {
		/// Requested index.
		index: usize,
		/// Current element count.
		len: usize,
	},
	/// Value path expression syntax is invalid.
	#[error("invalid value path: {path}")]
	InvalidPath {
		/// Path as written.
		path: String,
	},
	/// Value path step does not exist in the live graph.
	#[error("path {path} not found at step {step}")]
	PathNotFound {
		/// Path as written.
		path: String,
		/// Offending step rendered as text.
		step: String,
	},
	/// Text could not be parsed as a value of the target kind.
	#[error("invalid {kind} literal: {text}")]
	InvalidLiteral {
		/// Target value kind.
		kind: &'static str,
		/// Offending text.
		text: String,
	},
}
