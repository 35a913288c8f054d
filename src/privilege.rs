//! Root privilege checks

use std::env;
use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use tracing::info;

pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// `sudo <exe> <args...>`
fn sudo_command(exe: &Path, args: &[OsString]) -> Command {
    let mut command = Command::new("sudo");
    command.arg(exe).args(args);
    command
}

/// Replace this process with `sudo <current exe> <args>` unless already root.
/// Returns only when already root or when `exec` fails.
pub fn ensure_root() -> Result<()> {
    if is_root() {
        return Ok(());
    }

    let exe = env::current_exe().wrap_err("cannot locate current executable")?;
    let args: Vec<OsString> = env::args_os().skip(1).collect();
    info!(exe = %exe.display(), "re-executing under sudo");

    let err = sudo_command(&exe, &args).exec();
    Err(eyre!(err).wrap_err("failed to run sudo"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sudo_wraps_exe_and_arguments() {
        let args = vec![OsString::from("--mode"), OsString::from("kali")];
        let command = sudo_command(Path::new("/usr/bin/neokat"), &args);

        assert_eq!(command.get_program(), "sudo");
        let passed: Vec<_> = command.get_args().collect();
        assert_eq!(passed, ["/usr/bin/neokat", "--mode", "kali"]);
    }
}
