//! Interactive menu shell
//!
//! Numbered menus on top of the catalog, selector, and batch executor.
//! Every menu returns a `Flow` so end of input or an explicit exit unwinds
//! cleanly through the nested loops.

use std::io::{BufRead, Write};

use color_eyre::Result;
use tracing::{debug, warn};

use crate::apt::{AptBackend, check_apt_lock, installed_apps, installed_tools};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::console::{Console, format_grid};
use crate::error::SelectionError;
use crate::executor::{BatchExecutor, BatchSummary};
use crate::help::{HELP_TEXT, run_diagnostics};
use crate::interrupt::InterruptGuard;
use crate::repo::Repository;
use crate::reporter::Reporter;
use crate::scripts::{refresh_permissions, run_bundled, run_script};
use crate::selector::Selection;
use crate::types::{Action, Mode, Tone};

/// What the enclosing menu should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Stay,
    Back,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    AddRepo,
    InstallDefault,
    Selective,
    Script(&'static str),
    Apps,
    Uninstall,
    Help,
    KaliExtras,
    ClassicMenu,
    Exit,
}

struct MenuEntry {
    key: &'static str,
    label: &'static str,
    action: MenuAction,
}

const fn entry(key: &'static str, label: &'static str, action: MenuAction) -> MenuEntry {
    MenuEntry { key, label, action }
}

const UBUNTU_MENU: &[MenuEntry] = &[
    entry("1", "Add Kali repos & update", MenuAction::AddRepo),
    entry("2", "Install Kali default tools", MenuAction::InstallDefault),
    entry("3", "Custom Installation", MenuAction::Selective),
    entry("4", "Custom Themes", MenuAction::Script("core/ubuntu/theme.sh")),
    entry("5", "Install common apps", MenuAction::Apps),
    entry("6", "Uninstall tools", MenuAction::Uninstall),
    entry("7", "Help & diagnostics", MenuAction::Help),
    entry("0", "Exit", MenuAction::Exit),
];

const KALI_MENU: &[MenuEntry] = &[
    entry("1", "Kali Linux Apps & custom themes", MenuAction::KaliExtras),
    entry("2", "Add Kali repos & update", MenuAction::AddRepo),
    entry("3", "Install Top 10 tools", MenuAction::Script("core/kali/tools.py")),
    entry("4", "Selective install", MenuAction::Selective),
    entry("5", "Kali custom themes", MenuAction::Script("core/kali/theme.sh")),
    entry("6", "Kali common apps", MenuAction::Apps),
    entry("7", "Uninstall Kali tools", MenuAction::Uninstall),
    entry("8", "Help & diagnostics", MenuAction::Help),
    entry("9", "Install classic menu indicator", MenuAction::ClassicMenu),
    entry("0", "Exit", MenuAction::Exit),
];

const KALI_EXTRAS: &[(&str, &str, &str)] = &[
    ("1", "Full setup (all apps, themes, grub)", "core/kali/kali_install.sh"),
    ("2", "Install apps only", "core/kali/app.sh"),
    ("3", "Setup themes only", "core/kali/theme.sh"),
];

const APP_SCRIPTS: &[(&str, &str, &str)] = &[
    ("1", "Install Brave Browser", "install_brave.sh"),
    ("2", "Install Telegram Desktop", "install_telegram.sh"),
    ("3", "Install Visual Studio Code", "install_vscode.sh"),
    ("4", "Install ProtonVPN", "install_protonvpn.sh"),
];

const CLASSIC_MENU_PACKAGE: &str = "kali-menu";

/// Result of asking the user to pick items from a list
enum Pick {
    /// Run the batch over these items
    Run(Vec<String>),
    /// User typed `0`
    Back,
    /// Bad input or declined confirmation; ask again
    Retry,
    Eof,
}

pub struct Shell<'a, R: BufRead, W: Write> {
    console: Console<R, W>,
    config: &'a Config,
    backend: AptBackend,
    lock_check: fn() -> Option<String>,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(console: Console<R, W>, config: &'a Config, backend: AptBackend) -> Self {
        Self {
            console,
            config,
            backend,
            lock_check: check_apt_lock,
        }
    }

    /// Replace the dpkg lock probe run before each batch
    pub fn with_lock_check(mut self, lock_check: fn() -> Option<String>) -> Self {
        self.lock_check = lock_check;
        self
    }

    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// Mode selection, or straight into `mode` when given
    pub fn run(&mut self, mode: Option<Mode>) -> Result<()> {
        let flow = match mode {
            Some(mode) => self.mode_menu(mode)?,
            None => self.mode_selection()?,
        };
        debug!(?flow, "shell finished");
        self.console.say("Goodbye! 👋", Tone::Success)?;
        Ok(())
    }

    fn mode_selection(&mut self) -> Result<Flow> {
        loop {
            self.console.clear()?;
            self.console.header("Neo-Katoolin - Mode Selection")?;
            self.console.option("1", "Ubuntu Mode")?;
            self.console.option("2", "Kali Mode")?;
            self.console.option("0", "Exit")?;
            self.console.rule()?;

            let Some(choice) = self.console.prompt("Choose a mode: ")? else {
                return Ok(Flow::Exit);
            };
            let flow = match choice.trim() {
                "1" => self.mode_menu(Mode::Ubuntu)?,
                "2" => self.mode_menu(Mode::Kali)?,
                "0" => Flow::Exit,
                _ => self.invalid("Invalid input. Try again.")?,
            };
            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    fn mode_menu(&mut self, mode: Mode) -> Result<Flow> {
        let entries = match mode {
            Mode::Ubuntu => UBUNTU_MENU,
            Mode::Kali => KALI_MENU,
        };

        loop {
            self.console.clear()?;
            self.console.header(mode.title())?;
            for entry in entries {
                self.console.option(entry.key, entry.label)?;
            }
            self.console.rule()?;

            let Some(choice) = self.console.prompt("Enter your choice: ")? else {
                return Ok(Flow::Exit);
            };
            let choice = choice.trim();
            let flow = match entries.iter().find(|e| e.key == choice) {
                Some(entry) => self.dispatch(entry.action)?,
                None => self.invalid("❌ Invalid choice. Try again.")?,
            };
            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    fn dispatch(&mut self, action: MenuAction) -> Result<Flow> {
        debug!(?action, "menu action");
        let flow = match action {
            MenuAction::Exit => return Ok(Flow::Exit),
            MenuAction::AddRepo => self.add_repo()?,
            MenuAction::InstallDefault => self.install_default()?,
            MenuAction::Selective => return self.selective_install(),
            MenuAction::Script(path) => self.run_menu_script(path)?,
            MenuAction::Apps => return self.apps_menu(),
            MenuAction::Uninstall => return self.uninstall_menu(),
            MenuAction::Help => return self.help_menu(),
            MenuAction::KaliExtras => return self.kali_extras(),
            MenuAction::ClassicMenu => self.classic_menu()?,
        };
        if flow == Flow::Exit {
            return Ok(Flow::Exit);
        }
        self.pause()
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn invalid(&mut self, message: &str) -> Result<Flow> {
        self.console.say(message, Tone::Error)?;
        self.pause()
    }

    fn pause(&mut self) -> Result<Flow> {
        match self.console.prompt("Press Enter to continue...")? {
            Some(_) => Ok(Flow::Stay),
            None => Ok(Flow::Exit),
        }
    }

    fn section(&mut self, title: &str) -> Result<()> {
        self.console.blank()?;
        self.console.header(title)?;
        Ok(())
    }

    fn load_catalog(&mut self) -> Result<Option<Catalog>> {
        match Catalog::load(&self.config.manifest, self.config.category_marker) {
            Ok(catalog) => Ok(Some(catalog)),
            Err(e) => {
                warn!(error = %e, "manifest unavailable");
                self.console.say(&format!("Error: {e}"), Tone::Error)?;
                Ok(None)
            }
        }
    }

    /// Check the dpkg lock, then run one batch with Ctrl+C handling
    fn run_batch(&mut self, items: &[String], action: Action) -> Result<Option<BatchSummary>> {
        if let Some(message) = (self.lock_check)() {
            self.console.say(&message, Tone::Error)?;
            return Ok(None);
        }

        let palette = self.console.palette();
        let guard = InterruptGuard::arm();
        let mut reporter = Reporter::new(&mut self.console.out, palette);
        let summary = BatchExecutor::new(guard.flag()).run(items, action, &mut self.backend, &mut reporter);
        drop(guard);
        Ok(Some(summary))
    }

    /// Parse a selection against `items`, confirm, and hand back the result
    fn pick(&mut self, items: &[String], action: Action, scope: &str) -> Result<Pick> {
        let verb = action.verb();
        self.console.blank()?;
        self.console.plain("Options:")?;
        self.console.plain(&format!("Enter the number of the item you want to {verb}"))?;
        self.console.plain("Enter multiple numbers separated by commas (e.g., 1,3,5)")?;
        self.console.plain(&format!("Enter '{}' to {verb} all {scope}", self.config.wildcard))?;
        self.console.plain("Enter '0' to go back")?;
        self.console.blank()?;

        let Some(raw) = self.console.prompt("Enter your choice: ")? else {
            return Ok(Pick::Eof);
        };
        if raw.trim() == "0" {
            return Ok(Pick::Back);
        }

        let selection = match Selection::parse(&raw, &self.config.wildcard) {
            Ok(selection) => selection,
            Err(SelectionError::InvalidSelectionSyntax(_)) => {
                self.console
                    .say("Invalid input. Please enter valid numbers separated by commas.", Tone::Error)?;
                return Ok(Pick::Retry);
            }
            Err(SelectionError::EmptySelection) => {
                self.console.say("Invalid selection. Please try again.", Tone::Error)?;
                return Ok(Pick::Retry);
            }
        };

        let chosen: Vec<String> = match selection.apply(items) {
            Ok(chosen) => chosen.into_iter().cloned().collect(),
            Err(_) => {
                self.console.say("Invalid selection. Please try again.", Tone::Error)?;
                return Ok(Pick::Retry);
            }
        };

        let question = if selection == Selection::All {
            format!("Are you sure you want to {verb} all {} {scope}? (y/n): ", chosen.len())
        } else {
            self.console.blank()?;
            self.console.plain(&format!("Selected: {}", chosen.join(", ")))?;
            format!("Continue with {}? (y/n): ", action.noun().to_lowercase())
        };

        if self.console.confirm(&question)? {
            Ok(Pick::Run(chosen))
        } else {
            self.console.say("Operation cancelled.", Tone::Warning)?;
            Ok(Pick::Retry)
        }
    }

    // ========================================================================
    // Install flows
    // ========================================================================

    fn selective_install(&mut self) -> Result<Flow> {
        self.section("Selective Installation")?;
        let Some(catalog) = self.load_catalog()? else {
            self.console.plain("No categories found.")?;
            return self.pause();
        };
        if catalog.is_empty() {
            self.console.plain("No categories found.")?;
            return self.pause();
        }

        loop {
            self.console.blank()?;
            self.console.plain("Available Categories:")?;
            self.console.rule()?;
            for (i, category) in catalog.categories().iter().enumerate() {
                let label = format!("{} ({} tools)", category.label, category.items.len());
                self.console.option(&(i + 1).to_string(), &label)?;
            }
            self.console.blank()?;
            self.console.plain("Enter the number of the category you want to explore")?;
            self.console.plain("Enter '0' to go back to the main menu")?;

            let Some(choice) = self.console.prompt("Enter your choice: ")? else {
                return Ok(Flow::Exit);
            };
            let choice = choice.trim();
            if choice == "0" {
                return Ok(Flow::Back);
            }

            let category = match choice.parse::<usize>() {
                Ok(n) => match catalog.nth(n) {
                    Some(category) => category,
                    None => {
                        self.console.say("Invalid category number. Please try again.", Tone::Error)?;
                        continue;
                    }
                },
                Err(_) => {
                    self.console.say("Invalid input. Please enter a valid number.", Tone::Error)?;
                    continue;
                }
            };

            if self.category_loop(&category.label, &category.items)? == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    fn category_loop(&mut self, label: &str, items: &[String]) -> Result<Flow> {
        loop {
            self.console.blank()?;
            self.console.plain(&format!("Tools in {label}:"))?;
            self.console.rule()?;
            for (i, item) in items.iter().enumerate() {
                self.console.option(&(i + 1).to_string(), item)?;
            }

            match self.pick(items, Action::Install, &format!("tools in {label}"))? {
                Pick::Run(chosen) => {
                    self.run_batch(&chosen, Action::Install)?;
                }
                Pick::Retry => {}
                Pick::Back => return Ok(Flow::Back),
                Pick::Eof => return Ok(Flow::Exit),
            }
        }
    }

    fn install_default(&mut self) -> Result<Flow> {
        self.section("⚡ Kali Linux Default Tool Installer")?;
        let Some(catalog) = self.load_catalog()? else {
            self.console.plain("No tools found in the list. Exiting.")?;
            return Ok(Flow::Stay);
        };
        let tools = catalog.all_items();
        if tools.is_empty() {
            self.console.plain("No tools found in the list. Exiting.")?;
            return Ok(Flow::Stay);
        }

        self.console.plain(&format!("This will install {} tools.", tools.len()))?;
        if self.console.confirm("Continue? (y/n): ")? {
            self.run_batch(&tools, Action::Install)?;
        } else {
            self.console.say("Operation cancelled.", Tone::Warning)?;
        }
        Ok(Flow::Stay)
    }

    fn classic_menu(&mut self) -> Result<Flow> {
        self.section("Install Kali Linux Classic Menu Indicator")?;
        self.console.plain("This will install the Kali Linux classic menu indicator.")?;
        self.console.plain("The classic menu provides easy access to Kali Linux tools.")?;
        if self.console.confirm("Continue? (y/n): ")? {
            self.run_batch(&[CLASSIC_MENU_PACKAGE.to_string()], Action::Install)?;
        } else {
            self.console.say("Operation cancelled.", Tone::Warning)?;
        }
        Ok(Flow::Stay)
    }

    // ========================================================================
    // Scripts
    // ========================================================================

    /// Run a menu script, then re-mark anything it unpacked as executable
    fn run_menu_script(&mut self, relative: &str) -> Result<Flow> {
        let path = self.config.script_path(relative);
        if let Err(e) = run_script(self.backend.runner(), &path) {
            warn!(error = %e, "script failed");
            self.console.say(&format!("⚠ {e}"), Tone::Error)?;
        }
        refresh_permissions(&self.config.script_dirs());
        Ok(Flow::Stay)
    }

    fn kali_extras(&mut self) -> Result<Flow> {
        loop {
            self.console.clear()?;
            self.console.header("Kali Linux Apps & custom themes")?;
            for (key, label, _) in KALI_EXTRAS {
                self.console.option(key, label)?;
            }
            self.console.option("0", "Back")?;
            self.console.blank()?;

            let Some(choice) = self.console.prompt("Enter your choice: ")? else {
                return Ok(Flow::Exit);
            };
            let choice = choice.trim();
            if choice == "0" {
                return Ok(Flow::Back);
            }
            let flow = match KALI_EXTRAS.iter().find(|(key, _, _)| *key == choice) {
                Some((_, _, script)) => {
                    self.run_menu_script(script)?;
                    self.pause()?
                }
                None => self.invalid("Invalid choice. Please try again.")?,
            };
            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    fn run_app_script(&mut self, script: &str) -> Result<()> {
        let tools_dir = self.config.tools_dir.clone();
        match run_bundled(self.backend.runner(), &tools_dir, script) {
            Ok(()) => self.console.say(&format!("✅ {script} done."), Tone::Success)?,
            Err(e) => {
                warn!(error = %e, "app installer failed");
                self.console.say(&format!("❌ Error: {e}"), Tone::Error)?;
            }
        }
        Ok(())
    }

    fn apps_menu(&mut self) -> Result<Flow> {
        loop {
            self.section("Neo-Katoolin - Applications Installer Menu")?;
            for (key, label, _) in APP_SCRIPTS {
                self.console.option(key, label)?;
            }
            self.console.option("00", "Install All Applications")?;
            self.console.option("0", "Back")?;

            let Some(choice) = self.console.prompt("\nEnter your choice: ")? else {
                return Ok(Flow::Exit);
            };
            match choice.trim() {
                "0" => return Ok(Flow::Back),
                "00" => {
                    for (_, _, script) in APP_SCRIPTS {
                        self.run_app_script(script)?;
                    }
                }
                other => match APP_SCRIPTS.iter().find(|(key, _, _)| *key == other) {
                    Some((_, _, script)) => self.run_app_script(script)?,
                    None => self
                        .console
                        .say("Invalid choice. Please enter a valid number.", Tone::Error)?,
                },
            }
        }
    }

    // ========================================================================
    // Uninstall
    // ========================================================================

    fn uninstall_menu(&mut self) -> Result<Flow> {
        self.section("Uninstall Kali Linux Tools and Applications")?;
        loop {
            self.console.blank()?;
            self.console.plain("Options:")?;
            self.console.option("1", "Uninstall Kali Linux tools")?;
            self.console.option("2", "Uninstall applications")?;
            self.console.option("3", "Remove Kali Linux repository")?;
            self.console.option("0", "Go back to main menu")?;

            let Some(choice) = self.console.prompt("\nEnter your choice: ")? else {
                return Ok(Flow::Exit);
            };
            let flow = match choice.trim() {
                "0" => return Ok(Flow::Back),
                "1" => self.uninstall_tools()?,
                "2" => self.uninstall_apps()?,
                "3" => self.remove_repo()?,
                _ => {
                    self.console.say("Invalid choice. Please try again.", Tone::Error)?;
                    Flow::Stay
                }
            };
            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    fn uninstall_tools(&mut self) -> Result<Flow> {
        let tools = installed_tools(self.backend.database(), &self.config.tool_filter);
        if tools.is_empty() {
            self.console.plain("No Kali Linux tools found installed.")?;
            return Ok(Flow::Stay);
        }

        self.console.blank()?;
        self.console.plain("Installed Kali Linux Tools:")?;
        self.console.rule()?;
        for row in format_grid(&tools, self.console.width()) {
            self.console.plain(&row)?;
        }
        self.uninstall_pick(&tools, "Kali Linux tools")
    }

    fn uninstall_apps(&mut self) -> Result<Flow> {
        let apps = installed_apps(self.backend.database(), &self.config.tracked_apps);
        if apps.is_empty() {
            self.console.plain("No applications found installed.")?;
            return Ok(Flow::Stay);
        }

        self.console.blank()?;
        self.console.plain("Installed Applications:")?;
        self.console.rule()?;
        for (i, app) in apps.iter().enumerate() {
            self.console.option(&(i + 1).to_string(), app)?;
        }
        self.uninstall_pick(&apps, "applications")
    }

    fn uninstall_pick(&mut self, items: &[String], scope: &str) -> Result<Flow> {
        match self.pick(items, Action::Remove, scope)? {
            Pick::Run(chosen) => {
                self.run_batch(&chosen, Action::Remove)?;
                Ok(Flow::Stay)
            }
            Pick::Retry | Pick::Back => Ok(Flow::Stay),
            Pick::Eof => Ok(Flow::Exit),
        }
    }

    // ========================================================================
    // Repository
    // ========================================================================

    fn repository(&self) -> Repository {
        Repository {
            sources_list: self.config.sources_list.clone(),
            entry: self.config.repo_entry.clone(),
            key_url: self.config.repo_key_url.clone(),
            keyring: self.config.repo_keyring.clone(),
        }
    }

    fn add_repo(&mut self) -> Result<Flow> {
        self.section("Add Kali Linux Repository")?;
        let repo = self.repository();

        let exists = match repo.exists() {
            Ok(exists) => exists,
            Err(e) => {
                self.console.say(&format!("Error checking repository: {e}"), Tone::Error)?;
                false
            }
        };
        if exists {
            self.console.plain("Kali Linux repository already exists in your system.")?;
            if !self.console.confirm("Do you want to re-add it? (y/n): ")? {
                self.console.say("Operation cancelled.", Tone::Warning)?;
                return Ok(Flow::Stay);
            }
        }

        self.console.plain("This will add the Kali Linux repository to your system.")?;
        self.console
            .say("Make sure you understand the risks of adding third-party repositories.", Tone::Warning)?;
        if !self.console.confirm("Continue? (y/n): ")? {
            self.console.say("Operation cancelled.", Tone::Warning)?;
            return Ok(Flow::Stay);
        }

        self.console.plain("Updating package lists...")?;
        match repo.add(self.backend.runner()) {
            Ok(()) => {
                self.backend.database().invalidate();
                self.console.say("Kali Linux repository added successfully!", Tone::Success)?;
            }
            Err(e) => {
                warn!(error = %e, "adding repository failed");
                self.console.say(&format!("Error adding repository: {e}"), Tone::Error)?;
            }
        }
        Ok(Flow::Stay)
    }

    fn remove_repo(&mut self) -> Result<Flow> {
        if !self
            .console
            .confirm("Are you sure you want to remove the Kali Linux repository? (y/n): ")?
        {
            self.console.say("Operation cancelled.", Tone::Warning)?;
            return Ok(Flow::Stay);
        }

        self.console.plain("Removing Kali Linux repository...")?;
        match self.repository().remove(self.backend.runner()) {
            Ok(()) => {
                self.backend.database().invalidate();
                self.console.say("Kali Linux repository removed successfully!", Tone::Success)?;
            }
            Err(e) => {
                warn!(error = %e, "removing repository failed");
                self.console
                    .say(&format!("Error removing Kali Linux repository: {e}"), Tone::Error)?;
            }
        }
        Ok(Flow::Stay)
    }

    // ========================================================================
    // Help
    // ========================================================================

    fn help_menu(&mut self) -> Result<Flow> {
        self.section("Help & Diagnostics")?;
        loop {
            self.console.blank()?;
            self.console.plain("Options:")?;
            self.console.option("1", "View help documentation")?;
            self.console.option("2", "Run diagnostics")?;
            self.console.option("0", "Go back to main menu")?;

            let Some(choice) = self.console.prompt("\nEnter your choice: ")? else {
                return Ok(Flow::Exit);
            };
            match choice.trim() {
                "0" => return Ok(Flow::Back),
                "1" => self.console.plain(HELP_TEXT)?,
                "2" => {
                    self.console.plain("\nRunning diagnostics...")?;
                    for check in run_diagnostics(self.config, self.backend.runner()) {
                        let tone = if check.ok { Tone::Success } else { Tone::Error };
                        self.console.say(&format!("{} {}", check.symbol(), check.message), tone)?;
                    }
                    self.console.plain("\nDiagnostics complete.")?;
                }
                _ => self.console.say("Invalid choice. Please try again.", Tone::Error)?,
            }
        }
    }
}
