//! Package manager integration
//!
//! `apt-get` and the fallback channel are driven as external processes
//! through a `CommandRunner`. Installed-state queries go through the APT
//! cache via rust-apt, behind `PackageDatabase`, so both can be faked.

use std::fmt;
use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::process::{Command, Stdio};

use color_eyre::Result;
use rust_apt::cache::{Cache, PackageSort};
use tracing::{debug, warn};

use crate::executor::PackageBackend;
use crate::types::{FallbackChannel, ItemOutcome};

// ============================================================================
// External commands
// ============================================================================

/// A program invocation, described as data so it can be logged and faked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Discard the command's stdout/stderr
    pub quiet: bool,
}

impl ExternalCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            quiet: false,
        }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs external commands, blocking until they exit
pub trait CommandRunner {
    /// `Ok(true)` when the command exited with status 0
    fn run(&mut self, command: &ExternalCommand) -> io::Result<bool>;
}

/// Runs commands on the host with inherited stdin
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &ExternalCommand) -> io::Result<bool> {
        debug!(%command, "running");
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if command.quiet {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        let status = cmd.status()?;
        debug!(%command, ?status, "finished");
        Ok(status.success())
    }
}

// ============================================================================
// Installed-state queries
// ============================================================================

/// Read access to the system package database
pub trait PackageDatabase {
    fn is_installed(&mut self, name: &str) -> bool;

    /// Names of all installed packages, sorted
    fn installed_packages(&mut self) -> Vec<String>;

    /// Forget cached state after the system was changed
    fn invalidate(&mut self);
}

/// `PackageDatabase` backed by the APT cache.
/// The cache is opened on first use and dropped on `invalidate`.
#[derive(Default)]
pub struct AptDatabase {
    cache: Option<Cache>,
}

impl AptDatabase {
    pub fn new() -> Self {
        Self { cache: None }
    }

    fn cache(&mut self) -> Option<&Cache> {
        if self.cache.is_none() {
            match Cache::new::<&str>(&[]) {
                Ok(cache) => self.cache = Some(cache),
                Err(e) => {
                    warn!(error = %e, "cannot open APT cache");
                    return None;
                }
            }
        }
        self.cache.as_ref()
    }
}

impl PackageDatabase for AptDatabase {
    fn is_installed(&mut self, name: &str) -> bool {
        self.cache()
            .and_then(|cache| cache.get(name))
            .is_some_and(|pkg| pkg.is_installed())
    }

    fn installed_packages(&mut self) -> Vec<String> {
        let Some(cache) = self.cache() else {
            return Vec::new();
        };
        let mut names: Vec<String> = cache
            .packages(&PackageSort::default())
            .filter(rust_apt::Package::is_installed)
            .map(|pkg| pkg.name().to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn invalidate(&mut self) {
        self.cache = None;
    }
}

/// Installed packages whose name contains `filter`, case-insensitively
pub fn installed_tools(db: &mut dyn PackageDatabase, filter: &str) -> Vec<String> {
    let needle = filter.to_lowercase();
    db.installed_packages()
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&needle))
        .collect()
}

/// The subset of `tracked` that is currently installed, in `tracked` order
pub fn installed_apps(db: &mut dyn PackageDatabase, tracked: &[String]) -> Vec<String> {
    tracked
        .iter()
        .filter(|name| db.is_installed(name))
        .cloned()
        .collect()
}

// ============================================================================
// Backend
// ============================================================================

/// Per-package install/remove through apt-get, with an optional fallback
pub struct AptBackend {
    runner: Box<dyn CommandRunner>,
    db: Box<dyn PackageDatabase>,
    fallback: Option<FallbackChannel>,
    quiet: bool,
}

impl AptBackend {
    pub fn new(
        runner: Box<dyn CommandRunner>,
        db: Box<dyn PackageDatabase>,
        fallback: Option<FallbackChannel>,
        quiet: bool,
    ) -> Self {
        Self {
            runner,
            db,
            fallback,
            quiet,
        }
    }

    /// Host backend: real apt-get, real APT cache
    pub fn system(fallback: Option<FallbackChannel>, quiet: bool) -> Self {
        Self::new(
            Box::new(SystemRunner),
            Box::new(AptDatabase::new()),
            fallback,
            quiet,
        )
    }

    pub fn database(&mut self) -> &mut dyn PackageDatabase {
        self.db.as_mut()
    }

    pub fn runner(&mut self) -> &mut dyn CommandRunner {
        self.runner.as_mut()
    }

    /// Run a command, treating a launch error as failure
    fn attempt(&mut self, command: &ExternalCommand) -> bool {
        match self.runner.run(command) {
            Ok(success) => success,
            Err(e) => {
                warn!(%command, error = %e, "failed to launch");
                false
            }
        }
    }
}

impl PackageBackend for AptBackend {
    fn install(&mut self, name: &str) -> ItemOutcome {
        if self.db.is_installed(name) {
            return ItemOutcome::Skipped;
        }

        let apt = ExternalCommand::new("apt-get", &["install", "-y", name]).quiet(self.quiet);
        if self.attempt(&apt) {
            self.db.invalidate();
            return ItemOutcome::Success;
        }

        if let Some(channel) = self.fallback {
            let fallback = ExternalCommand::new(channel.program(), &["install", name]).quiet(self.quiet);
            if self.attempt(&fallback) {
                self.db.invalidate();
                return ItemOutcome::SuccessViaFallback;
            }
        }

        warn!(package = %name, "install failed");
        ItemOutcome::Failure
    }

    fn remove(&mut self, name: &str) -> ItemOutcome {
        let apt = ExternalCommand::new("apt-get", &["remove", "--purge", "-y", name]).quiet(self.quiet);
        if self.attempt(&apt) {
            self.db.invalidate();
            ItemOutcome::Success
        } else {
            warn!(package = %name, "remove failed");
            ItemOutcome::Failure
        }
    }

    fn fallback_label(&self) -> &str {
        self.fallback.map_or("fallback", |c| c.label())
    }
}

// ============================================================================
// Package manager locks
// ============================================================================

const DPKG_LOCKS: &[&str] = &[
    "/var/lib/dpkg/lock-frontend",
    "/var/lib/dpkg/lock",
    "/var/lib/apt/lists/lock",
];

/// A POSIX record lock held by another process (dpkg and apt use these)
fn record_lock_held(file: &File) -> bool {
    let mut probe: libc::flock = unsafe { std::mem::zeroed() };
    probe.l_type = libc::F_WRLCK as libc::c_short;
    probe.l_whence = libc::SEEK_SET as libc::c_short;
    let ret = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_GETLK, &mut probe) };
    ret == 0 && probe.l_type != libc::F_UNLCK as libc::c_short
}

/// A BSD `flock` held through any other open file description
fn whole_file_lock_held(file: &File) -> bool {
    let fd = file.as_raw_fd();
    if unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) } == 0 {
        unsafe { libc::flock(fd, libc::LOCK_UN) };
        return false;
    }
    true
}

/// Whether `path` exists and is locked by someone else
fn is_locked(path: &Path) -> bool {
    File::open(path).is_ok_and(|file| record_lock_held(&file) || whole_file_lock_held(&file))
}

/// First of `paths` that is currently locked
fn first_locked<'a>(paths: &[&'a str]) -> Option<&'a str> {
    paths.iter().copied().find(|path| is_locked(Path::new(path)))
}

/// Message for the user when another package manager holds a dpkg/apt lock
pub fn check_apt_lock() -> Option<String> {
    let path = first_locked(DPKG_LOCKS)?;
    debug!(path, "package manager lock held");
    Some(format!("Another package manager is running ({path}). Close it and try again."))
}

/// Open the APT cache eagerly, surfacing errors to the caller
pub fn open_database() -> Result<AptDatabase> {
    let cache = Cache::new::<&str>(&[])?;
    Ok(AptDatabase { cache: Some(cache) })
}
