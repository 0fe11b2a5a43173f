use std::path::Path;

use assert_cmd::Command;

/// A `confconst` command running in `dir` with colors and log filters off.
pub fn confconst_cmd(dir: &Path) -> Command {
	let mut cmd =
		Command::cargo_bin("confconst").unwrap_or_else(|e| panic!("confconst binary: {e}"));
	cmd.env("NO_COLOR", "1")
		.env_remove("CONFCONST_LOG")
		.current_dir(dir);
	cmd
}

pub fn write_file(path: &Path, content: &str) {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}
