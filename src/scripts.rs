//! Bundled installer scripts

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::apt::{CommandRunner, ExternalCommand};
use crate::error::ScriptError;

/// Interpreter for a script, chosen by extension
fn interpreter(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("py") => Some("python3"),
        Some("sh") => Some("bash"),
        _ => None,
    }
}

/// Run a `.py` or `.sh` script through its interpreter
pub fn run_script(runner: &mut dyn CommandRunner, path: &Path) -> Result<(), ScriptError> {
    if !path.is_file() {
        return Err(ScriptError::NotFound(path.to_path_buf()));
    }
    let program = interpreter(path).ok_or_else(|| ScriptError::UnsupportedScript(path.to_path_buf()))?;

    let path_str = path.to_string_lossy();
    let command = ExternalCommand::new(program, &[&*path_str]);
    match runner.run(&command) {
        Ok(true) => Ok(()),
        Ok(false) => Err(ScriptError::Failed(path.to_path_buf())),
        Err(source) => Err(ScriptError::Launch {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Run `dir/name` directly, making it executable first if needed
pub fn run_bundled(runner: &mut dyn CommandRunner, dir: &Path, name: &str) -> Result<(), ScriptError> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(ScriptError::NotFound(path));
    }
    ensure_executable(&path)?;

    let path_str = path.to_string_lossy();
    let command = ExternalCommand::new(&path_str, &[]);
    match runner.run(&command) {
        Ok(true) => Ok(()),
        Ok(false) => Err(ScriptError::Failed(path.clone())),
        Err(source) => Err(ScriptError::Launch { path: path.clone(), source }),
    }
}

fn is_executable(mode: u32) -> bool {
    mode & 0o111 != 0
}

fn ensure_executable(path: &Path) -> Result<(), ScriptError> {
    let perms_err = |source| ScriptError::Permissions {
        path: path.to_path_buf(),
        source,
    };
    let mut perms = fs::metadata(path).map_err(perms_err)?.permissions();
    if !is_executable(perms.mode()) {
        debug!(path = %path.display(), "setting mode 0755");
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).map_err(perms_err)?;
    }
    Ok(())
}

/// Whether a file under the scripts tree should be executable
fn wants_exec_bit(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext == "py" || ext == "sh",
        None => true,
    }
}

/// Add execute bits to every script under `root`.
/// Returns how many files changed; unreadable entries are skipped.
pub fn make_executable(root: &Path) -> usize {
    let mut changed = 0;
    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() || !wants_exec_bit(entry.path()) {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        let mut perms = meta.permissions();
        let mode = perms.mode();
        if mode & 0o111 == 0o111 {
            continue;
        }
        perms.set_mode(mode | 0o111);
        match fs::set_permissions(entry.path(), perms) {
            Ok(()) => changed += 1,
            Err(e) => warn!(path = %entry.path().display(), error = %e, "chmod failed"),
        }
    }
    changed
}

/// `make_executable` over each root, logging what changed
pub fn refresh_permissions<P: AsRef<Path>>(roots: &[P]) -> usize {
    roots
        .iter()
        .map(|root| {
            let root = root.as_ref();
            let changed = make_executable(root);
            debug!(dir = %root.display(), changed, "made scripts executable");
            changed
        })
        .sum()
}
