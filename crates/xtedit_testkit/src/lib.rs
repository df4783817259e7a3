//! Shared test helpers for workspace crates.

use std::path::{Path, PathBuf};
use std::process::Output;

/// Resolve the workspace root path.
pub fn workspace_root() -> PathBuf {
	let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
	manifest_dir
		.join("..")
		.join("..")
		.canonicalize()
		.unwrap_or_else(|_| manifest_dir.join("..").join(".."))
}

/// Resolve a fixture path under `<workspace>/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
	workspace_root().join("fixtures").join(name)
}

/// Resolve the workspace target directory.
pub fn target_dir() -> PathBuf {
	std::env::var_os("CARGO_TARGET_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|| workspace_root().join("target"))
}

/// Create (if needed) a per-suite scratch directory under the target dir and join `name`.
pub fn scratch_path(suite: &str, name: &str) -> PathBuf {
	let dir = target_dir().join("xtedit-scratch").join(suite);
	std::fs::create_dir_all(&dir).expect("scratch dir is creatable");
	dir.join(name)
}

/// Copy fixture `name` into the `suite` scratch dir so tests can edit it in place.
pub fn scratch_fixture(suite: &str, name: &str) -> PathBuf {
	let dest = scratch_path(suite, name);
	std::fs::copy(fixture_path(name), &dest).expect("fixture copies into scratch");
	dest
}

/// Assert a process succeeded and parse its stdout as JSON.
pub fn stdout_json(output: &Output) -> serde_json::Value {
	assert!(
		output.status.success(),
		"command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}
