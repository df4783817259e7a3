use std::path::PathBuf;

use tracing::debug;
use xtedit::doc::{
	DocError, DocumentCodec, EditPass, EditSession, Result, RootId, SessionOptions, SnapshotCodec, TypeKind, ValueId, registry, resolve_path,
};

use crate::cmd::util::{emit_json, parse_root_id};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Edit operation; repeat to run several in order.
	#[arg(long = "op", required = true)]
	pub ops: Vec<String>,
	/// Export the edited document here.
	#[arg(long, conflicts_with = "write")]
	pub out: Option<PathBuf>,
	/// Export the edited document over the input file.
	#[arg(long)]
	pub write: bool,
	/// Undoable commands retained by the session history.
	#[arg(long)]
	pub history: Option<usize>,
	#[arg(long)]
	pub json: bool,
}

/// One scripted edit, parsed from `VERB [PATH [ARG]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EditStep {
	/// Write an atom literal or enum label(s).
	Set { path: String, text: String },
	/// Toggle one flag label.
	Toggle { path: String, label: String },
	/// Attach a new default value of `type_name` under a pointer.
	New { path: String, type_name: String },
	/// Point at the heap entry at `heap_index`.
	Use { path: String, heap_index: usize },
	Handle { path: String, root: RootId },
	Clear { path: String },
	Alloc { path: String },
	Append { path: String },
	Remove { path: String, index: usize },
	/// Hand text to the registered handler of the target's type.
	Input { path: String, text: String },
	Undo,
	Redo,
}

/// What a step did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StepReport {
	pub action: &'static str,
	pub labels: Vec<String>,
}

impl EditStep {
	/// Parse one `--op` argument.
	pub(crate) fn parse(op: &str) -> Result<Self> {
		let (verb, rest) = split_word(op);
		let (path, arg) = split_word(rest);
		let path = path.to_owned();
		let bad = || DocError::InvalidLiteral {
			kind: "edit op",
			text: op.to_owned(),
		};
		let number = |text: &str| text.parse::<usize>().map_err(|_| bad());

		let step = match verb {
			"undo" if rest.is_empty() => Self::Undo,
			"redo" if rest.is_empty() => Self::Redo,
			_ if path.is_empty() => return Err(bad()),
			"set" => Self::Set { path, text: arg.to_owned() },
			"input" => Self::Input { path, text: arg.to_owned() },
			"toggle" if !arg.is_empty() => Self::Toggle { path, label: arg.to_owned() },
			"new" if !arg.is_empty() => Self::New {
				path,
				type_name: arg.to_owned(),
			},
			"use" => Self::Use {
				path,
				heap_index: number(arg)?,
			},
			"handle" => Self::Handle {
				path,
				root: parse_root_id(arg)?,
			},
			"remove" => Self::Remove { path, index: number(arg)? },
			"clear" if arg.is_empty() => Self::Clear { path },
			"alloc" if arg.is_empty() => Self::Alloc { path },
			"append" if arg.is_empty() => Self::Append { path },
			_ => return Err(bad()),
		};
		Ok(step)
	}

	/// Run the step against `session`: one pass plus commit, or one undo/redo.
	///
	/// A command rejected at commit fails the step after the others have been committed.
	pub(crate) fn apply(&self, session: &mut EditSession) -> Result<StepReport> {
		match self {
			Self::Undo => {
				return Ok(StepReport {
					action: "undo",
					labels: vec![session.undo()?],
				});
			}
			Self::Redo => {
				return Ok(StepReport {
					action: "redo",
					labels: vec![session.redo()?],
				});
			}
			_ => {}
		}

		{
			let mut pass = session.begin_pass();
			self.queue(&mut pass)?;
		}
		let labels = session.pending().iter().map(|command| command.label().to_owned()).collect();
		let report = session.commit();
		if let Some(rejected) = report.rejected.into_iter().next() {
			return Err(rejected.error);
		}
		debug!(applied = report.applied, "edit step committed");

		Ok(StepReport { action: "commit", labels })
	}

	fn path(&self) -> Option<&str> {
		match self {
			Self::Set { path, .. }
			| Self::Toggle { path, .. }
			| Self::New { path, .. }
			| Self::Use { path, .. }
			| Self::Handle { path, .. }
			| Self::Clear { path }
			| Self::Alloc { path }
			| Self::Append { path }
			| Self::Remove { path, .. }
			| Self::Input { path, .. } => Some(path),
			Self::Undo | Self::Redo => None,
		}
	}

	fn queue(&self, pass: &mut EditPass<'_>) -> Result<()> {
		let Some(path) = self.path() else {
			return Ok(());
		};
		let at = resolve_path(pass.doc(), path)?;

		match self {
			Self::Set { text, .. } => set_text(pass, at, text),
			Self::Toggle { label, .. } => pass.toggle_flag(at, label),
			Self::New { type_name, .. } => {
				let concrete = pass.doc().schema().require(type_name)?;
				pass.new_pointer_target(at, concrete).map(drop)
			}
			Self::Use { heap_index, .. } => {
				let heap = pass.doc().heap();
				let heap_value = heap.nth(*heap_index).ok_or(DocError::IndexOutOfRange {
					index: *heap_index,
					len: heap.len(),
				})?;
				pass.adopt_heap_value(at, heap_value)
			}
			Self::Handle { root, .. } => pass.set_handle(at, *root),
			Self::Clear { .. } => pass.clear(at),
			Self::Alloc { .. } => pass.new_array(at),
			Self::Append { .. } => pass.append(at).map(drop),
			Self::Remove { index, .. } => pass.remove_at(at, *index),
			Self::Input { text, .. } => {
				let target = pass.doc().deref(at).ok_or_else(|| DocError::TypeMismatch {
					expected: "value with a target",
					got: "null".to_owned(),
				})?;
				let handler = registry::global().resolve(pass.doc().type_name_of(target)?)?;
				handler.edit(pass, target, text)
			}
			Self::Undo | Self::Redo => Ok(()),
		}
	}
}

/// Queue an atom write, an enum label, a flags list (`A,B` or `None`), or raw enum bits.
fn set_text(pass: &mut EditPass<'_>, value: ValueId, text: &str) -> Result<()> {
	let node = pass.doc().node(value)?;
	let (ty, kind) = (node.ty, node.value.kind_label());
	match kind {
		"atom" => pass.set_atom_text(value, text),
		"enum" => {
			if let Ok(bits) = text.parse::<u32>() {
				return pass.set_enum(value, bits);
			}
			let flags = match &pass.doc().schema().get(ty).kind {
				TypeKind::Enum { labels, flags: true } => Some(flag_bits(labels, text)),
				_ => None,
			};
			match flags {
				Some(bits) => pass.set_enum(value, bits?),
				None => pass.set_enum_label(value, text),
			}
		}
		other => Err(DocError::TypeMismatch {
			expected: "atom or enum",
			got: other.to_owned(),
		}),
	}
}

fn flag_bits(labels: &[Box<str>], text: &str) -> Result<u32> {
	if text == "None" {
		return Ok(0);
	}
	text.split(',').map(str::trim).try_fold(0_u32, |bits, label| -> Result<u32> {
		let bit = labels.iter().position(|candidate| candidate.as_ref() == label).ok_or_else(|| DocError::InvalidLiteral {
			kind: "flag label",
			text: label.to_owned(),
		})?;
		Ok(bits | (1 << bit))
	})
}

fn split_word(text: &str) -> (&str, &str) {
	let text = text.trim();
	match text.find(char::is_whitespace) {
		Some(at) => (&text[..at], text[at..].trim_start()),
		None => (text, ""),
	}
}

/// Apply `--op` steps in order, then export if requested.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		ops,
		out,
		write,
		history,
		json,
	} = args;

	let steps = ops.iter().map(|op| EditStep::parse(op)).collect::<Result<Vec<_>>>()?;
	let codec = SnapshotCodec::default();
	let mut options = SessionOptions::default();
	if let Some(history) = history {
		options.history_capacity = history;
	}
	let mut session = EditSession::with_options(codec.import(&path)?, options);

	let mut reports = Vec::with_capacity(steps.len());
	for step in &steps {
		reports.push(step.apply(&mut session)?);
	}

	let dirty = session.dirty();
	let output = out.or_else(|| write.then(|| path.clone()));
	if let Some(output) = &output {
		codec.export(session.doc(), output)?;
		session.mark_saved();
	}

	if json {
		return emit_json(&EditJson {
			path: path.display().to_string(),
			steps: ops
				.iter()
				.zip(&reports)
				.map(|(op, report)| StepJson {
					op: op.clone(),
					action: report.action,
					labels: report.labels.clone(),
				})
				.collect(),
			undo_len: session.history().undo_len(),
			redo_len: session.history().redo_len(),
			dirty,
			output: output.map(|output| output.display().to_string()),
		});
	}

	println!("path: {}", path.display());
	for (op, report) in ops.iter().zip(&reports) {
		println!("{op}\t{}\t{}", report.action, report.labels.join("; "));
	}
	println!("undo_len: {}", session.history().undo_len());
	println!("redo_len: {}", session.history().redo_len());
	println!("dirty: {dirty}");
	match &output {
		Some(output) => println!("written: {}", output.display()),
		None => println!("written: -"),
	}
	Ok(())
}

#[derive(serde::Serialize)]
struct StepJson {
	op: String,
	action: &'static str,
	labels: Vec<String>,
}

#[derive(serde::Serialize)]
struct EditJson {
	path: String,
	steps: Vec<StepJson>,
	undo_len: usize,
	redo_len: usize,
	dirty: i64,
	output: Option<String>,
}

#[cfg(test)]
mod tests;
