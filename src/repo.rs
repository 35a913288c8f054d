//! Kali repository management in `sources.list`

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::apt::{CommandRunner, ExternalCommand};
use crate::error::RepoError;

const ENTRY_COMMENT: &str = "# Kali Linux repository";
const REPO_KEYWORD: &str = "kali";

/// Whether any line mentions the Kali repository
pub fn has_kali_entry(sources: &str) -> bool {
    sources.lines().any(mentions_kali)
}

/// `sources` with every Kali line removed, other lines untouched
pub fn strip_kali_entries(sources: &str) -> String {
    let mut out = String::with_capacity(sources.len());
    for line in sources.split_inclusive('\n') {
        if !mentions_kali(line) {
            out.push_str(line);
        }
    }
    out
}

/// `sources` with the comment and `entry` appended on their own lines
pub fn append_entry(sources: &str, entry: &str) -> String {
    let mut out = sources.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(ENTRY_COMMENT);
    out.push('\n');
    out.push_str(entry);
    out.push('\n');
    out
}

fn mentions_kali(line: &str) -> bool {
    line.to_lowercase().contains(REPO_KEYWORD)
}

/// One `sources.list` file plus the signing-key location
pub struct Repository {
    pub sources_list: PathBuf,
    pub entry: String,
    pub key_url: String,
    pub keyring: PathBuf,
}

impl Repository {
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.sources_list.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Whether the Kali entry is already present
    pub fn exists(&self) -> Result<bool, RepoError> {
        Ok(has_kali_entry(&self.read()?))
    }

    /// Back up, append the entry, install the key, refresh package lists.
    /// If the key or the refresh fails, `sources.list` is put back as it was.
    pub fn add(&self, runner: &mut dyn CommandRunner) -> Result<(), RepoError> {
        let existed = self.sources_list.exists();
        self.backup()?;
        let sources = self.read_or_empty()?;
        self.write(&append_entry(&sources, &self.entry))?;
        info!(path = %self.sources_list.display(), "added Kali entry");

        let keyring = self.keyring.to_string_lossy();
        let fetch_key = ExternalCommand::new("wget", &["-q", "-O", &*keyring, self.key_url.as_str()]);
        let result = run_checked(runner, &fetch_key)
            .and_then(|()| run_checked(runner, &ExternalCommand::new("apt-get", &["update"])));
        if result.is_err() {
            self.rollback(existed);
        }
        result
    }

    /// Back up, drop every Kali line, refresh package lists
    pub fn remove(&self, runner: &mut dyn CommandRunner) -> Result<(), RepoError> {
        self.backup()?;
        let sources = self.read()?;
        self.write(&strip_kali_entries(&sources))?;
        info!(path = %self.sources_list.display(), "removed Kali entries");

        run_checked(runner, &ExternalCommand::new("apt-get", &["update"]))
    }

    fn read(&self) -> Result<String, RepoError> {
        fs::read_to_string(&self.sources_list).map_err(|source| RepoError::Read {
            path: self.sources_list.clone(),
            source,
        })
    }

    /// Empty when the file does not exist (deb822-only systems)
    fn read_or_empty(&self) -> Result<String, RepoError> {
        if self.sources_list.exists() {
            self.read()
        } else {
            Ok(String::new())
        }
    }

    fn write(&self, contents: &str) -> Result<(), RepoError> {
        fs::write(&self.sources_list, contents).map_err(|source| RepoError::Write {
            path: self.sources_list.clone(),
            source,
        })
    }

    /// Restore the pre-`add` state from the backup, or delete a file `add` created
    fn rollback(&self, existed: bool) {
        let restored = if existed {
            fs::copy(self.backup_path(), &self.sources_list).map(drop)
        } else {
            fs::remove_file(&self.sources_list)
        };
        match restored {
            Ok(()) => info!(path = %self.sources_list.display(), "restored sources list"),
            Err(e) => warn!(path = %self.sources_list.display(), error = %e, "cannot restore sources list"),
        }
    }

    fn backup(&self) -> Result<(), RepoError> {
        if !self.sources_list.exists() {
            return Ok(());
        }
        let to = self.backup_path();
        fs::copy(&self.sources_list, &to).map_err(|source| RepoError::Backup {
            from: self.sources_list.clone(),
            to: to.clone(),
            source,
        })?;
        Ok(())
    }
}

fn run_checked(runner: &mut dyn CommandRunner, command: &ExternalCommand) -> Result<(), RepoError> {
    match runner.run(command) {
        Ok(true) => Ok(()),
        Ok(false) => Err(RepoError::Command(command.to_string())),
        Err(e) => Err(RepoError::Command(format!("{command}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_entry_case_insensitively() {
        assert!(has_kali_entry("deb http://deb.debian.org/debian bookworm main\ndeb http://http.KALI.org/kali kali-rolling main\n"));
        assert!(!has_kali_entry("deb http://deb.debian.org/debian bookworm main\n"));
        assert!(!has_kali_entry(""));
    }

    #[test]
    fn strip_keeps_other_lines_verbatim() {
        let sources = "deb a main\n# Kali Linux repository\ndeb http://http.kali.org/kali kali-rolling main\ndeb b main";
        assert_eq!(strip_kali_entries(sources), "deb a main\ndeb b main");
    }

    #[test]
    fn append_adds_comment_and_entry() {
        assert_eq!(
            append_entry("deb a main", "deb k main"),
            "deb a main\n\n# Kali Linux repository\ndeb k main\n"
        );
        assert_eq!(append_entry("", "deb k main"), "\n# Kali Linux repository\ndeb k main\n");
    }

    /// Logs commands and fails the ones whose program is `failing`
    struct FailingRunner {
        failing: &'static str,
        log: Vec<String>,
    }

    impl CommandRunner for FailingRunner {
        fn run(&mut self, command: &ExternalCommand) -> std::io::Result<bool> {
            self.log.push(command.to_string());
            Ok(command.program != self.failing)
        }
    }

    fn repo_in(dir: &std::path::Path) -> Repository {
        Repository {
            sources_list: dir.join("sources.list"),
            entry: "deb http://http.kali.org/kali kali-rolling main".to_string(),
            key_url: "https://archive.kali.org/archive-key.asc".to_string(),
            keyring: dir.join("kali.asc"),
        }
    }

    #[test]
    fn failed_key_download_restores_sources_list() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(dir.path());
        let original = "deb http://archive.ubuntu.com/ubuntu noble main\n";
        fs::write(&repo.sources_list, original).unwrap();
        let mut runner = FailingRunner {
            failing: "wget",
            log: Vec::new(),
        };

        let err = repo.add(&mut runner).unwrap_err();

        assert!(matches!(err, RepoError::Command(_)));
        assert_eq!(runner.log.len(), 1);
        assert_eq!(fs::read_to_string(&repo.sources_list).unwrap(), original);
        assert!(!repo.exists().unwrap());
    }

    #[test]
    fn failed_update_removes_a_created_sources_list() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(dir.path());
        let mut runner = FailingRunner {
            failing: "apt-get",
            log: Vec::new(),
        };

        assert!(repo.add(&mut runner).is_err());

        assert_eq!(runner.log.len(), 2);
        assert!(!repo.sources_list.exists());
    }

    #[test]
    fn successful_add_keeps_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(dir.path());
        fs::write(&repo.sources_list, "deb a main\n").unwrap();
        let mut runner = FailingRunner {
            failing: "none",
            log: Vec::new(),
        };

        repo.add(&mut runner).unwrap();

        assert!(repo.exists().unwrap());
        assert_eq!(fs::read_to_string(repo.backup_path()).unwrap(), "deb a main\n");
    }

    #[test]
    fn backup_path_appends_suffix() {
        let repo = Repository {
            sources_list: PathBuf::from("/etc/apt/sources.list"),
            entry: String::new(),
            key_url: String::new(),
            keyring: PathBuf::new(),
        };
        assert_eq!(repo.backup_path(), PathBuf::from("/etc/apt/sources.list.bak"));
    }
}
