//! Common types used throughout the application

use std::fmt;

use crossterm::style::{Color, Stylize, style};
use serde::{Deserialize, Serialize};

/// Result of one per-item package operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Success,            // Primary channel (apt-get) succeeded
    SuccessViaFallback, // apt-get failed, fallback channel succeeded
    Skipped,            // Already installed, nothing attempted
    Failure,            // Every attempted channel failed
}

impl ItemOutcome {
    /// Glyph shown next to the item in the progress stream.
    /// `fallback` names the channel used for `SuccessViaFallback`.
    pub fn glyph(&self, fallback: &str) -> String {
        match self {
            Self::Success => "✅".to_string(),
            Self::SuccessViaFallback => format!("✅ ({fallback})"),
            Self::Skipped => "✔ already installed".to_string(),
            Self::Failure => "❌ failed".to_string(),
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Success | Self::SuccessViaFallback => Tone::Success,
            Self::Skipped => Tone::Muted,
            Self::Failure => Tone::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::SuccessViaFallback)
    }
}

/// Batch action applied to every selected item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Remove,
}

impl Action {
    /// "Installing", "Uninstalling"
    pub fn progressive(&self) -> &'static str {
        match self {
            Self::Install => "Installing",
            Self::Remove => "Uninstalling",
        }
    }

    /// "Installation", "Uninstallation"
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Install => "Installation",
            Self::Remove => "Uninstallation",
        }
    }

    /// "installed", "uninstalled"
    pub fn past(&self) -> &'static str {
        match self {
            Self::Install => "installed",
            Self::Remove => "uninstalled",
        }
    }

    /// "install", "uninstall"
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Remove => "uninstall",
        }
    }
}

/// Host flavour the menus are tailored for
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    Ubuntu,
    Kali,
}

impl Mode {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Ubuntu => "Neo-Katoolin - Ubuntu Mode",
            Self::Kali => "Neo-Katoolin - Kali Mode",
        }
    }
}

/// Secondary install channel tried after apt-get fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackChannel {
    Snap,
}

impl FallbackChannel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Snap => "snap",
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            Self::Snap => "snap",
        }
    }
}

impl fmt::Display for FallbackChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// When to emit ANSI colors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

/// Semantic text roles, mapped to colors by the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Title,   // bold green
    Rule,    // cyan
    Key,     // yellow menu keys
    Prompt,  // magenta
    Success, // green
    Warning, // yellow
    Error,   // red
    Muted,   // dark grey
    Plain,
}

impl Tone {
    pub fn color(&self) -> Option<Color> {
        match self {
            Self::Title | Self::Success => Some(Color::Green),
            Self::Rule => Some(Color::Cyan),
            Self::Key | Self::Warning => Some(Color::Yellow),
            Self::Prompt => Some(Color::Magenta),
            Self::Error => Some(Color::Red),
            Self::Muted => Some(Color::DarkGrey),
            Self::Plain => None,
        }
    }
}

/// Terminal styling, injected wherever text is rendered.
/// A disabled palette renders every tone as plain text.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    /// Resolve a color choice against the environment
    pub fn detect(choice: ColorChoice) -> Self {
        use std::io::IsTerminal;

        let enabled = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
            }
        };
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.enabled {
            return text.to_string();
        }
        match tone.color() {
            Some(color) if tone == Tone::Title => style(text).with(color).bold().to_string(),
            Some(color) => style(text).with(color).to_string(),
            None => text.to_string(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::plain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_palette_leaves_text_untouched() {
        let palette = Palette::plain();
        assert_eq!(palette.paint("hello", Tone::Error), "hello");
        assert!(!palette.is_enabled());
    }

    #[test]
    fn enabled_palette_wraps_text_in_escapes() {
        let palette = Palette::new(true);
        let painted = palette.paint("hello", Tone::Error);
        assert!(painted.contains("hello"));
        assert!(painted.contains('\u{1b}'));
        assert_eq!(palette.paint("hello", Tone::Plain), "hello");
    }

    #[test]
    fn fallback_glyph_names_the_channel() {
        assert_eq!(ItemOutcome::SuccessViaFallback.glyph("snap"), "✅ (snap)");
        assert_eq!(ItemOutcome::Failure.glyph("snap"), "❌ failed");
        assert!(ItemOutcome::SuccessViaFallback.is_success());
        assert!(!ItemOutcome::Skipped.is_success());
    }
}
