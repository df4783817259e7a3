use std::sync::Arc;

use crate::doc::{Atom, DocError, Document, EditOp, EditPass, HandlerDef, Result, TypeHandler, ValueId};

/// Handler catalog shipped with the crate.
pub fn builtin_catalog() -> Vec<HandlerDef> {
	vec![
		HandlerDef { type_name: "Vec2", build: vec2 },
		HandlerDef { type_name: "Vec3", build: vec3 },
		HandlerDef {
			type_name: "RangeI8",
			build: range_i8,
		},
		HandlerDef { type_name: "Rgb", build: rgb },
		HandlerDef { type_name: "Rgba", build: rgba },
	]
}

fn vec2() -> Arc<dyn TypeHandler> {
	Arc::new(Components::VEC2)
}

fn vec3() -> Arc<dyn TypeHandler> {
	Arc::new(Components::VEC3)
}

fn range_i8() -> Arc<dyn TypeHandler> {
	Arc::new(RangeI8)
}

fn rgb() -> Arc<dyn TypeHandler> {
	Arc::new(Color { alpha: false })
}

fn rgba() -> Arc<dyn TypeHandler> {
	Arc::new(Color { alpha: true })
}

/// Fixed list of numeric component fields rendered as a tuple.
#[derive(Debug, Clone, Copy)]
pub struct Components {
	type_name: &'static str,
	fields: &'static [&'static str],
}

impl Components {
	/// Two-component vector with `vx`, `vy`.
	pub const VEC2: Self = Self {
		type_name: "Vec2",
		fields: &["vx", "vy"],
	};
	/// Three-component vector with `vx`, `vy`, `vz`.
	pub const VEC3: Self = Self {
		type_name: "Vec3",
		fields: &["vx", "vy", "vz"],
	};
}

impl TypeHandler for Components {
	fn summarize(&self, doc: &Document, value: ValueId) -> Result<String> {
		let parts = self
			.fields
			.iter()
			.map(|name| -> Result<String> { Ok(doc.atom(doc.field(value, name)?)?.to_string()) })
			.collect::<Result<Vec<_>>>()?;
		Ok(format!("({})", parts.join(", ")))
	}

	fn edit(&self, pass: &mut EditPass<'_>, value: ValueId, input: &str) -> Result<()> {
		let parts = split_exact(self.type_name, input, &[self.fields.len()])?;
		let ops = component_ops(pass, value, self.fields, &parts)?;
		pass.batch(format!("set {} {value}", self.type_name), ops);
		Ok(())
	}
}

/// Signed byte range with `from` and `to`, rendered `from-to`.
#[derive(Debug, Clone, Copy)]
pub struct RangeI8;

impl TypeHandler for RangeI8 {
	fn summarize(&self, doc: &Document, value: ValueId) -> Result<String> {
		let from = doc.atom(doc.field(value, "from")?)?;
		let to = doc.atom(doc.field(value, "to")?)?;
		Ok(format!("{from}-{to}"))
	}

	fn edit(&self, pass: &mut EditPass<'_>, value: ValueId, input: &str) -> Result<()> {
		let text = input.trim();
		let parts: Vec<&str> = match text.split_once(',') {
			Some((from, to)) => vec![from, to],
			// skip a leading sign so "-3-4" splits after the first number
			None => match text.char_indices().skip(1).find(|(_, c)| *c == '-') {
				Some((at, _)) => vec![&text[..at], &text[at + 1..]],
				None => vec![text],
			},
		};
		if parts.len() != 2 {
			return Err(DocError::InvalidLiteral {
				kind: "RangeI8",
				text: input.to_owned(),
			});
		}
		let ops = component_ops(pass, value, &["from", "to"], &parts)?;
		pass.batch(format!("set RangeI8 {value}"), ops);
		Ok(())
	}
}

/// Float color channels rendered as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy)]
pub struct Color {
	alpha: bool,
}

impl Color {
	const RGB: &'static [&'static str] = &["r", "g", "b"];
	const RGBA: &'static [&'static str] = &["r", "g", "b", "a"];

	fn channels(self) -> &'static [&'static str] {
		if self.alpha { Self::RGBA } else { Self::RGB }
	}

	fn type_name(self) -> &'static str {
		if self.alpha { "Rgba" } else { "Rgb" }
	}
}

impl TypeHandler for Color {
	fn summarize(&self, doc: &Document, value: ValueId) -> Result<String> {
		let mut out = String::from("#");
		for channel in self.channels() {
			let atom = doc.atom(doc.field(value, channel)?)?;
			let level = atom.as_f64().ok_or_else(|| DocError::TypeMismatch {
				expected: "numeric channel",
				got: atom.kind().as_str().to_owned(),
			})?;
			out.push_str(&format!("{:02x}", (level.clamp(0.0, 1.0) * 255.0).round() as u8));
		}
		Ok(out)
	}

	/// Accepts `r,g,b` for both kinds; `Rgba` also takes `r,g,b,a`, keeping alpha when omitted.
	fn edit(&self, pass: &mut EditPass<'_>, value: ValueId, input: &str) -> Result<()> {
		let channels = self.channels();
		let parts = split_exact(self.type_name(), input, &[3, channels.len()])?;
		let ops = component_ops(pass, value, &channels[..parts.len()], &parts)?;
		pass.batch(format!("set {} {value}", self.type_name()), ops);
		Ok(())
	}
}

fn split_exact<'a>(kind: &'static str, input: &'a str, accepted: &[usize]) -> Result<Vec<&'a str>> {
	let parts: Vec<&str> = input.split(',').map(str::trim).collect();
	if accepted.contains(&parts.len()) {
		Ok(parts)
	} else {
		Err(DocError::InvalidLiteral {
			kind,
			text: input.to_owned(),
		})
	}
}

/// Build one atom write per named field, parsing each part as that field's primitive kind.
fn component_ops(pass: &EditPass<'_>, value: ValueId, fields: &[&str], parts: &[&str]) -> Result<Vec<EditOp>> {
	fields
		.iter()
		.zip(parts)
		.map(|(name, text)| -> Result<EditOp> {
			let field = pass.doc().field(value, name)?;
			let kind = pass.doc().atom(field)?.kind();
			pass.set_atom_op(field, Atom::parse(kind, text)?)
		})
		.collect()
}
