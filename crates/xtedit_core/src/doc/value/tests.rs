use crate::doc::{Atom, AtomKind, DocError};

#[test]
fn parse_respects_kind_ranges() {
	assert!(matches!(Atom::parse(AtomKind::I8, "-12"), Ok(Atom::I8(-12))));
	assert!(matches!(Atom::parse(AtomKind::U16, " 65535 "), Ok(Atom::U16(65535))));
	assert!(matches!(Atom::parse(AtomKind::Bool, "true"), Ok(Atom::Bool(true))));

	let err = Atom::parse(AtomKind::U8, "300").expect_err("out of range");
	assert!(matches!(err, DocError::InvalidLiteral { kind: "u8", .. }));
	assert!(Atom::parse(AtomKind::Bool, "yes").is_err());
}

#[test]
fn string_literals_keep_whitespace() {
	let atom = Atom::parse(AtomKind::String, "  padded ").expect("short strings parse");
	assert!(matches!(atom, Atom::String(text) if text.as_ref() == "  padded "));
}

#[test]
fn string_literals_are_length_capped() {
	let longest = "x".repeat(Atom::MAX_STRING_LEN);
	assert!(matches!(Atom::parse(AtomKind::String, &longest), Ok(Atom::String(text)) if text.len() == 255));

	let err = Atom::parse(AtomKind::String, &format!("{longest}y")).expect_err("one byte too long");
	assert!(matches!(err, DocError::InvalidLiteral { kind: "string", .. }));
}

#[test]
fn same_compares_floats_bitwise() {
	assert!(Atom::F32(f32::NAN).same(&Atom::F32(f32::NAN)));
	assert!(!Atom::F64(0.0).same(&Atom::F64(-0.0)));
	assert!(!Atom::I32(1).same(&Atom::U32(1)));
}

#[test]
fn defaults_match_kind() {
	for kind in AtomKind::ALL {
		assert_eq!(Atom::default_for(kind).kind(), kind);
	}
}

#[test]
fn display_quotes_strings_and_tags_loc_ids() {
	assert_eq!(Atom::String("hi".into()).to_string(), "\"hi\"");
	assert_eq!(Atom::LocId(42).to_string(), "loc:42");
	assert_eq!(Atom::F32(1.5).to_string(), "1.5");
}
