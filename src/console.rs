//! Line-oriented terminal I/O for the menus
//!
//! Generic over the reader and writer so menu flows can be driven from a
//! byte buffer in tests.

use std::io::{self, BufRead, IsTerminal, Stdin, Stdout, Write};

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType};

use crate::types::{Palette, Tone};

const MAX_WIDTH: usize = 100;
const FALLBACK_WIDTH: usize = 64;

/// Terminal width for rules and headers, clamped to 100 columns
pub fn terminal_width() -> usize {
    terminal::size()
        .map(|(cols, _)| (cols as usize).min(MAX_WIDTH))
        .unwrap_or(FALLBACK_WIDTH)
}

pub struct Console<R: BufRead, W: Write> {
    input: R,
    pub(crate) out: W,
    palette: Palette,
    clear_screen: bool,
    width: usize,
}

impl Console<io::StdinLock<'static>, Stdout> {
    /// Console on the process's stdin/stdout
    pub fn stdio(palette: Palette) -> Self {
        let stdin: Stdin = io::stdin();
        let stdout = io::stdout();
        let clear_screen = stdout.is_terminal();
        Self {
            input: stdin.lock(),
            out: stdout,
            palette,
            clear_screen,
            width: terminal_width(),
        }
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Console over arbitrary streams, never clearing the screen
    pub fn new(input: R, out: W, palette: Palette) -> Self {
        Self {
            input,
            out,
            palette,
            clear_screen: false,
            width: FALLBACK_WIDTH,
        }
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn clear(&mut self) -> io::Result<()> {
        if self.clear_screen {
            execute!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        Ok(())
    }

    pub fn say(&mut self, text: &str, tone: Tone) -> io::Result<()> {
        let painted = self.palette.paint(text, tone);
        writeln!(self.out, "{painted}")
    }

    pub fn plain(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    /// Full-width rule of `=`
    pub fn rule(&mut self) -> io::Result<()> {
        let rule = "=".repeat(self.width);
        self.say(&rule, Tone::Rule)
    }

    /// Title centered between two rules
    pub fn header(&mut self, title: &str) -> io::Result<()> {
        let width = self.width;
        self.rule()?;
        self.say(&format!("{title:^width$}"), Tone::Title)?;
        self.rule()
    }

    /// `1) Label` with the key highlighted
    pub fn option(&mut self, key: &str, label: &str) -> io::Result<()> {
        let key = self.palette.paint(&format!("{key})"), Tone::Key);
        writeln!(self.out, "{key} {label}")
    }

    /// Print `text` and read one line. `None` at end of input.
    pub fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        let painted = self.palette.paint(text, Tone::Prompt);
        write!(self.out, "{painted}")?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// `y`/`Y` confirms; anything else, including end of input, declines
    pub fn confirm(&mut self, text: &str) -> io::Result<bool> {
        Ok(self
            .prompt(text)?
            .is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y")))
    }
}

/// Lay out numbered items in columns fitting `width`
pub fn format_grid(items: &[String], width: usize) -> Vec<String> {
    let Some(max_len) = items.iter().map(|s| s.chars().count()).max() else {
        return Vec::new();
    };
    let columns = (width / (max_len + 4)).max(1);

    items
        .chunks(columns)
        .enumerate()
        .map(|(row, chunk)| {
            chunk
                .iter()
                .enumerate()
                .map(|(col, item)| format!("{}) {item:<max_len$}", row * columns + col + 1))
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect()
}
