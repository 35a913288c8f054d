//! Progress and summary rendering for batch runs
//!
//! Every write is best-effort: a broken stdout must never abort a batch
//! halfway through a list of package operations.

use std::io::Write;

use crate::executor::{BatchObserver, BatchSummary, ItemProgress};
use crate::types::{Action, Palette, Tone};

const SUMMARY_RULE_WIDTH: usize = 40;

pub struct Reporter<W: Write> {
    out: W,
    palette: Palette,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, palette: Palette) -> Self {
        Self { out, palette }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        drop(writeln!(self.out, "{text}"));
    }

    fn flush(&mut self) {
        drop(self.out.flush());
    }
}

/// `[ 67%] (2/3) nmap ✅`
pub fn format_progress(progress: &ItemProgress<'_>) -> String {
    format!(
        "[{:3}%] ({}/{}) {} {}",
        progress.percent,
        progress.position,
        progress.total,
        progress.name,
        progress.outcome.glyph(progress.fallback_label)
    )
}

impl<W: Write> BatchObserver for Reporter<W> {
    fn batch_started(&mut self, action: Action, total: usize) {
        let noun = if total == 1 { "package" } else { "packages" };
        let text = format!("📦 {} {total} {noun}...", action.progressive());
        self.line("");
        self.line(&text);
        self.line("");
        self.flush();
    }

    fn item_finished(&mut self, progress: &ItemProgress<'_>) {
        let text = format_progress(progress);
        let painted = self.palette.paint(&text, progress.outcome.tone());
        self.line(&painted);
        self.flush();
    }

    fn interrupted(&mut self, processed: usize, total: usize) {
        let text = format!(
            "Operation interrupted by user after {processed} of {total}. Stopping gracefully..."
        );
        let painted = self.palette.paint(&text, Tone::Warning);
        self.line("");
        self.line(&painted);
    }

    fn batch_finished(&mut self, summary: &BatchSummary) {
        let rule = "=".repeat(SUMMARY_RULE_WIDTH);
        let tally = &summary.tally;
        let action = summary.action;

        let rule_line = self.palette.paint(&rule, Tone::Rule);
        let title = self.palette.paint(&format!("   📊 {} Summary", action.noun()), Tone::Title);
        let ok = format!("✅ Successfully {}: {}", action.past(), tally.succeeded);
        let bad = format!("❌ Failed to {}: {}", action.verb(), tally.failed);

        self.line("");
        self.line(&rule_line);
        self.line(&title);
        self.line(&rule_line);
        self.line(&self.palette.paint(&ok, Tone::Success));
        self.line(&self.palette.paint(&bad, if tally.failed > 0 { Tone::Error } else { Tone::Plain }));
        if tally.skipped > 0 {
            let skipped = format!("✔ Already installed: {}", tally.skipped);
            self.line(&self.palette.paint(&skipped, Tone::Muted));
        }
        if summary.interrupted {
            let left = summary.total - summary.processed;
            let text = format!("⏹ Not processed: {left}");
            self.line(&self.palette.paint(&text, Tone::Warning));
        }

        if !tally.failed_items.is_empty() {
            self.line("");
            self.line("Failed packages:");
            for name in &tally.failed_items {
                self.line(&format!(" - {name}"));
            }
        }
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::OutcomeTally;
    use crate::types::ItemOutcome;

    fn render(f: impl FnOnce(&mut Reporter<Vec<u8>>)) -> String {
        let mut reporter = Reporter::new(Vec::new(), Palette::plain());
        f(&mut reporter);
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn progress_line_layout() {
        let progress = ItemProgress {
            name: "nmap",
            outcome: ItemOutcome::SuccessViaFallback,
            position: 2,
            total: 3,
            percent: 67,
            fallback_label: "snap",
        };
        assert_eq!(format_progress(&progress), "[ 67%] (2/3) nmap ✅ (snap)");
    }

    #[test]
    fn summary_lists_failures() {
        let summary = BatchSummary {
            action: Action::Install,
            tally: OutcomeTally {
                succeeded: 2,
                failed: 1,
                skipped: 0,
                failed_items: vec!["hydra".to_string()],
            },
            processed: 3,
            total: 3,
            interrupted: false,
        };
        let text = render(|r| r.batch_finished(&summary));

        assert!(text.contains("Installation Summary"));
        assert!(text.contains("Successfully installed: 2"));
        assert!(text.contains("Failed to install: 1"));
        assert!(text.contains(" - hydra"));
        assert!(!text.contains("Already installed"));
        assert!(!text.contains("Not processed"));
    }

    #[test]
    fn interrupted_summary_reports_leftovers() {
        let summary = BatchSummary {
            action: Action::Remove,
            tally: OutcomeTally {
                succeeded: 2,
                ..OutcomeTally::default()
            },
            processed: 2,
            total: 5,
            interrupted: true,
        };
        let text = render(|r| r.batch_finished(&summary));

        assert!(text.contains("Uninstallation Summary"));
        assert!(text.contains("Successfully uninstalled: 2"));
        assert!(text.contains("Not processed: 3"));
    }

    #[test]
    fn write_errors_are_swallowed() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Err(std::io::Error::other("closed"))
            }
        }

        let mut reporter = Reporter::new(Broken, Palette::new(true));
        reporter.batch_started(Action::Install, 1);
        reporter.interrupted(0, 1);
    }
}
