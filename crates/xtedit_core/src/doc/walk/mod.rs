use std::fmt;

use crate::doc::{Document, Result, RootId, Value, ValueId};

/// Read-only traversal bounds.
#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
	/// Restrict the walk to one root entry.
	pub root: Option<RootId>,
	/// Maximum descent depth below a root.
	pub max_depth: usize,
	/// Maximum elements visited per array.
	pub max_array: usize,
}

impl Default for WalkOptions {
	fn default() -> Self {
		Self {
			root: None,
			max_depth: 32,
			max_array: 64,
		}
	}
}

/// Presentation label of one visited item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemLabel {
	/// Root entry, rendered `[id]`.
	Root(RootId),
	/// Struct field, rendered `{TargetType} {name}`.
	Field {
		/// Declared field type name.
		type_name: Box<str>,
		/// Field name.
		name: Box<str>,
	},
	/// Array element, rendered `[index]`.
	Index(usize),
}

impl fmt::Display for ItemLabel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Root(id) => write!(f, "[{id}]"),
			Self::Field { type_name, name } => write!(f, "{type_name} {name}"),
			Self::Index(index) => write!(f, "[{index}]"),
		}
	}
}

/// One visited value.
#[derive(Debug, Clone)]
pub struct WalkItem {
	/// Descent depth; roots are 0.
	pub depth: usize,
	/// Presentation label.
	pub label: ItemLabel,
	/// Value at this position (may be a pointer or handle).
	pub value: ValueId,
	/// Value exposed after following pointers and handles, when non-null and resolved.
	pub target: Option<ValueId>,
	/// Whether the item has explorable content.
	pub has_content: bool,
	/// The exposed value is already open on the current descent path.
	pub cycle: bool,
	/// Array elements skipped by `max_array`.
	pub omitted: usize,
}

/// Visit roots depth-first in document order, following pointers and handles transparently.
pub fn walk(doc: &Document, options: &WalkOptions, mut visit: impl FnMut(&WalkItem)) -> Result<()> {
	let entries: Vec<_> = match options.root {
		Some(id) => vec![*doc.get_root(id)?],
		None => doc.roots().iter().copied().collect(),
	};

	let mut open = Vec::new();
	for entry in entries {
		descend(doc, options, entry.value, ItemLabel::Root(entry.id), 0, &mut open, &mut visit)?;
	}
	Ok(())
}

/// Collect [`walk`] output.
pub fn collect_walk(doc: &Document, options: &WalkOptions) -> Result<Vec<WalkItem>> {
	let mut items = Vec::new();
	walk(doc, options, |item| items.push(item.clone()))?;
	Ok(items)
}

fn descend(
	doc: &Document,
	options: &WalkOptions,
	value: ValueId,
	label: ItemLabel,
	depth: usize,
	open: &mut Vec<ValueId>,
	visit: &mut impl FnMut(&WalkItem),
) -> Result<()> {
	let target = doc.deref(value);
	let cycle = target.is_some_and(|target| open.contains(&target));
	let has_content = doc.has_content(value);
	let (mut entries, limit) = match target {
		Some(target) if has_content && !cycle && depth < options.max_depth => children(doc, target, options)?,
		_ => (Vec::new(), 0),
	};
	let omitted = entries.len().saturating_sub(limit);
	entries.truncate(limit);

	visit(&WalkItem {
		depth,
		label,
		value,
		target,
		has_content,
		cycle,
		omitted,
	});

	let Some(target) = target.filter(|_| !entries.is_empty()) else {
		return Ok(());
	};
	open.push(target);
	for (label, child) in entries {
		descend(doc, options, child, label, depth + 1, open, visit)?;
	}
	open.pop();
	Ok(())
}

/// Return the labelled children of an exposed value and how many of them to visit.
fn children(doc: &Document, target: ValueId, options: &WalkOptions) -> Result<(Vec<(ItemLabel, ValueId)>, usize)> {
	Ok(match doc.value(target)? {
		Value::Struct(_) => {
			let fields: Vec<_> = doc
				.fields(target)?
				.map(|field| {
					let label = ItemLabel::Field {
						type_name: doc.schema().name(field.def.ty).into(),
						name: field.def.name.clone(),
					};
					(label, field.value)
				})
				.collect();
			let len = fields.len();
			(fields, len)
		}
		Value::Array(Some(items)) => (
			items.iter().enumerate().map(|(index, item)| (ItemLabel::Index(index), *item)).collect(),
			options.max_array,
		),
		_ => (Vec::new(), 0),
	})
}

#[cfg(test)]
mod tests;
