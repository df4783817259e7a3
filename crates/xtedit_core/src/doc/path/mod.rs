use std::fmt;

use crate::doc::{DocError, Document, Result, RootId, Value, ValueId};

/// One parsed operation in a value path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
	/// Select a named struct field.
	Field(String),
	/// Select an array element by zero-based index.
	Index(usize),
}

/// Parsed `ROOT(.field|[index])*` expression, e.g. `7.child.parts[2].weight`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePath {
	/// Root entry the path starts from.
	pub root: RootId,
	/// Ordered sequence of path steps.
	pub steps: Vec<PathStep>,
}

impl ValuePath {
	/// Parse a root id followed by dotted fields with optional `[index]` selectors.
	pub fn parse(input: &str) -> Result<Self> {
		let invalid = || DocError::InvalidPath { path: input.to_owned() };
		let bytes = input.as_bytes();
		let mut idx = 0_usize;

		while idx < bytes.len() && bytes[idx].is_ascii_digit() {
			idx += 1;
		}
		if idx == 0 {
			return Err(invalid());
		}
		let root = RootId(input[..idx].parse::<u32>().map_err(|_| invalid())?);
		let mut steps = Vec::new();

		while idx < bytes.len() {
			match bytes[idx] {
				b'.' => {
					idx += 1;
					let start = idx;
					while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_') {
						idx += 1;
					}
					if idx == start {
						return Err(invalid());
					}
					steps.push(PathStep::Field(input[start..idx].to_owned()));
				}
				b'[' => {
					idx += 1;
					let start = idx;
					while idx < bytes.len() && bytes[idx].is_ascii_digit() {
						idx += 1;
					}
					if idx == start || idx >= bytes.len() || bytes[idx] != b']' {
						return Err(invalid());
					}
					steps.push(PathStep::Index(input[start..idx].parse::<usize>().map_err(|_| invalid())?));
					idx += 1;
				}
				_ => return Err(invalid()),
			}
		}

		Ok(Self { root, steps })
	}

	/// Resolve the path against the live graph.
	///
	/// Intermediate pointers and handles are followed transparently; the final step is returned
	/// as-is so a path may name a pointer, handle, or array itself.
	pub fn resolve(&self, doc: &Document) -> Result<ValueId> {
		let not_found = |step: String| DocError::PathNotFound {
			path: self.to_string(),
			step,
		};
		let mut current = doc.get_root(self.root)?.value;

		for step in &self.steps {
			let container = doc.deref(current).ok_or_else(|| not_found(format!("null reference before {step}")))?;
			current = match (step, doc.value(container)?) {
				(PathStep::Field(name), Value::Struct(_)) => doc.field(container, name).map_err(|_| not_found(step.to_string()))?,
				(PathStep::Index(index), Value::Array(Some(items))) => *items.get(*index).ok_or_else(|| not_found(step.to_string()))?,
				(PathStep::Index(_), Value::Array(None)) => return Err(not_found(format!("unallocated array at {step}"))),
				_ => return Err(not_found(step.to_string())),
			};
		}

		Ok(current)
	}
}

impl fmt::Display for PathStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Field(name) => write!(f, ".{name}"),
			Self::Index(index) => write!(f, "[{index}]"),
		}
	}
}

impl fmt::Display for ValuePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.root)?;
		self.steps.iter().try_for_each(|step| write!(f, "{step}"))
	}
}

/// Parse and resolve a path in one step.
pub fn resolve_path(doc: &Document, input: &str) -> Result<ValueId> {
	ValuePath::parse(input)?.resolve(doc)
}
