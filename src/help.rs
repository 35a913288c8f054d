//! Help text and environment diagnostics

use std::path::Path;

use crate::apt::{CommandRunner, ExternalCommand};
use crate::config::Config;
use crate::privilege::is_root;
use crate::repo::has_kali_entry;

pub const HELP_TEXT: &str = "\
Neo-Katoolin - Kali Linux Tools Installer
=========================================

OVERVIEW:
Neo-Katoolin installs Kali Linux tools, repositories, and common desktop
applications on Debian-derived systems such as Ubuntu.

FEATURES:
1. Add Kali Linux Repository - Adds the official Kali Linux repository
2. Install Default Toolset   - Installs every tool in the tool list
3. Selective Install         - Pick tools category by category
4. Classic Menu Indicator    - Adds the Kali Linux menu (Kali mode)
5. Common Apps               - Brave, Telegram, VS Code, ProtonVPN
6. Uninstall                 - Removes installed Kali tools and apps
7. Help & Diagnostics        - This screen

SELECTING TOOLS:
- Enter one number (3), several separated by commas (1,3,5), or 'all'
- Numbers outside the list are ignored; anything else is rejected
- Press Ctrl+C during an installation to stop after the current package

USAGE:
- Run neokat (it re-runs itself with sudo when needed)
- Select an option by entering the corresponding number
- Follow the on-screen instructions for each option

TROUBLESHOOTING:
- Make sure you have an active internet connection
- Ensure the Kali Linux repository is added before installing tools
- Set RUST_LOG=debug to see every package manager command
";

/// One diagnostic result line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub ok: bool,
    pub message: String,
}

impl Check {
    fn new(ok: bool, pass: &str, fail: &str) -> Self {
        Self {
            ok,
            message: if ok { pass } else { fail }.to_string(),
        }
    }

    pub fn symbol(&self) -> &'static str {
        if self.ok { "✓" } else { "✗" }
    }
}

fn repo_check(sources_list: &Path) -> Check {
    match std::fs::read_to_string(sources_list) {
        Ok(text) => Check::new(
            has_kali_entry(&text),
            "Kali Linux repository found",
            "Kali Linux repository not found",
        ),
        Err(e) => Check {
            ok: false,
            message: format!("Error checking repository: {e}"),
        },
    }
}

/// Root, repository, manifest, and connectivity checks
pub fn run_diagnostics(config: &Config, runner: &mut dyn CommandRunner) -> Vec<Check> {
    let ping = ExternalCommand::new("ping", &["-c", "1", "8.8.8.8"]).quiet(true);
    let online = runner.run(&ping).unwrap_or(false);

    vec![
        Check::new(
            is_root(),
            "Running with root privileges",
            "Not running with root privileges (some operations may fail)",
        ),
        repo_check(&config.sources_list),
        Check::new(
            config.manifest.exists(),
            "Tools list file found",
            "Tools list file not found",
        ),
        Check::new(
            online,
            "Internet connectivity available",
            "Internet connectivity not available",
        ),
    ]
}
