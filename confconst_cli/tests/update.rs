mod common;

use std::path::Path;

use common::confconst_cmd;
use common::write_file;
use confconst_core::AnyEmptyResult;
use serde_json::Value;
use similar_asserts::assert_eq;

const OLD_CONSTANTS: &str =
	"package config\n\nconst (\n\tOldConst = \"shared\"\n\tGone     = \"removed\"\n)\n";
const NEW_CONSTANTS: &str = "package config\n\nconst (\n\tNewConst = \"shared\"\n)\n";
const MAIN_GO: &str =
	"package main\n\nfunc main() {\n\tprintln(config.OldConst)\n\tprintln(\"OldConst\")\n}\n";

fn setup(root: &Path) {
	write_file(&root.join("consts/old.go"), OLD_CONSTANTS);
	write_file(&root.join("consts/new.go"), NEW_CONSTANTS);
	write_file(&root.join("src/main.go"), MAIN_GO);
	write_file(&root.join("src/broken.go"), "package main\n\nvar s = \"OldConst\n");
}

#[test]
fn update_dry_run_lists_substitutions() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	setup(tmp.path());

	let _ = confconst_cmd(tmp.path())
		.args(["update", "-o", "consts/old.go", "-n", "consts/new.go", "--dry-run"])
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"Dry run: would make 1 substitution(s) in 1 file(s):",
		))
		.stdout(predicates::str::contains("src/main.go:4:17 OldConst -> NewConst"));

	assert_eq!(std::fs::read_to_string(tmp.path().join("src/main.go"))?, MAIN_GO);

	Ok(())
}

#[test]
fn update_rewrites_references_with_backup() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	setup(tmp.path());

	let _ = confconst_cmd(tmp.path())
		.args(["update", "-o", "consts/old.go", "-n", "consts/new.go", "-b"])
		.assert()
		.success()
		.stdout(predicates::str::contains("Updated 1 reference(s) in 1 file(s)."));

	let content = std::fs::read_to_string(tmp.path().join("src/main.go"))?;
	assert!(content.contains("println(config.NewConst)"));
	assert!(content.contains("println(\"OldConst\")"));
	assert_eq!(
		std::fs::read_to_string(tmp.path().join("src/main.go.bak"))?,
		MAIN_GO
	);
	assert!(!tmp.path().join("src/broken.go.bak").exists());
	assert_eq!(
		std::fs::read_to_string(tmp.path().join("consts/old.go"))?,
		OLD_CONSTANTS
	);

	Ok(())
}

#[test]
fn update_reports_skipped_and_unmatched() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	setup(tmp.path());

	let _ = confconst_cmd(tmp.path())
		.args(["update", "-o", "consts/old.go", "-n", "consts/new.go", "-d"])
		.assert()
		.success()
		.stderr(predicates::str::contains(
			"skipped src/broken.go: unterminated string literal on line 3",
		))
		.stderr(predicates::str::contains("`Gone`"));

	Ok(())
}

#[test]
fn check_fails_while_references_are_outdated() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	setup(tmp.path());

	let _ = confconst_cmd(tmp.path())
		.args(["update", "-o", "consts/old.go", "-n", "consts/new.go", "--check"])
		.assert()
		.code(1);
	assert_eq!(std::fs::read_to_string(tmp.path().join("src/main.go"))?, MAIN_GO);

	let _ = confconst_cmd(tmp.path())
		.args(["update", "-o", "consts/old.go", "-n", "consts/new.go"])
		.assert()
		.success();

	let _ = confconst_cmd(tmp.path())
		.args(["update", "-o", "consts/old.go", "-n", "consts/new.go", "--check"])
		.assert()
		.success()
		.stdout(predicates::str::contains("already up to date"));

	Ok(())
}

#[test]
fn update_json_report() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	setup(tmp.path());

	let output = confconst_cmd(tmp.path())
		.args([
			"update",
			"-o",
			"consts/old.go",
			"-n",
			"consts/new.go",
			"--dry-run",
			"--format",
			"json",
		])
		.output()?;
	assert!(output.status.success());

	let report: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(report["dry_run"], Value::Bool(true));
	assert_eq!(report["mapping"]["OldConst"], "NewConst");
	assert_eq!(report["unmatched"][0]["name"], "Gone");
	assert_eq!(report["files"][0]["substitutions"][0]["line"], 4);
	assert_eq!(report["files"][0]["substitutions"][0]["new"], "NewConst");
	assert_eq!(report["skipped"][0]["issue"]["kind"], "unterminated_string");

	Ok(())
}

#[test]
fn update_diff_shows_changed_lines() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	setup(tmp.path());

	let _ = confconst_cmd(tmp.path())
		.args(["update", "-o", "consts/old.go", "-n", "consts/new.go", "-d", "--diff"])
		.assert()
		.success()
		.stderr(predicates::str::contains("-\tprintln(config.OldConst)"))
		.stderr(predicates::str::contains("+\tprintln(config.NewConst)"));

	Ok(())
}

#[test]
fn update_scans_only_requested_dirs() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	setup(tmp.path());
	write_file(&tmp.path().join("other/lib.go"), MAIN_GO);

	let _ = confconst_cmd(tmp.path())
		.args(["update", "-o", "consts/old.go", "-n", "consts/new.go", "--dirs", "other"])
		.assert()
		.success();

	assert!(
		std::fs::read_to_string(tmp.path().join("other/lib.go"))?.contains("config.NewConst")
	);
	assert_eq!(std::fs::read_to_string(tmp.path().join("src/main.go"))?, MAIN_GO);

	Ok(())
}

#[test]
fn identical_constants_are_a_noop() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	setup(tmp.path());

	let _ = confconst_cmd(tmp.path())
		.args(["update", "-o", "consts/new.go", "-n", "consts/new.go"])
		.assert()
		.success()
		.stdout(predicates::str::contains("nothing to update"));

	Ok(())
}

#[test]
fn missing_constants_file_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	let _ = confconst_cmd(tmp.path())
		.args(["update", "-o", "missing.go", "-n", "also-missing.go"])
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse"));

	Ok(())
}

#[test]
fn update_flag_paths_resolve_against_project_root() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	setup(&tmp.path().join("project"));

	let _ = confconst_cmd(tmp.path())
		.args([
			"--path",
			"project",
			"update",
			"-o",
			"consts/old.go",
			"-n",
			"consts/new.go",
			"--dirs",
			"src",
		])
		.assert()
		.success();

	assert!(
		std::fs::read_to_string(tmp.path().join("project/src/main.go"))?
			.contains("config.NewConst")
	);

	Ok(())
}
