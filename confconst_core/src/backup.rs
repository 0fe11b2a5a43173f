use std::path::Path;
use std::path::PathBuf;

use crate::ConfConstError;
use crate::ConfConstResult;

/// The path a backup of `path` is written to: the full file name with
/// `suffix` appended, e.g. `consts.go` → `consts.go.bak`.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
	let mut name = path.as_os_str().to_os_string();
	name.push(suffix);
	PathBuf::from(name)
}

/// Copy `path` to its backup path, replacing any previous backup.
pub fn create_backup(path: &Path, suffix: &str) -> ConfConstResult<PathBuf> {
	let target = backup_path(path, suffix);
	std::fs::copy(path, &target).map_err(|e| ConfConstError::write(&target, e))?;
	tracing::debug!(file = %path.display(), backup = %target.display(), "created backup");

	Ok(target)
}
