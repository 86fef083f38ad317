//! Cosmetic progress reporting for long-running measurement phases
//!
//! A phase ticks a [`ProgressReporter`] a fixed number of times at a fixed
//! interval on a helper thread while the real work runs on the caller's
//! thread. The ticks say nothing about how far the work has actually got.

use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::{Print, Stylize},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

const BAR_WIDTH: u32 = 30;

/// Receives progress callbacks for one phase at a time
pub trait ProgressReporter: Send {
    fn start(&mut self, label: &str, total: u32);
    fn advance(&mut self, step: u32);
    fn finish(&mut self);
}

/// Fixed cadence of the indicator
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    pub steps: u32,
    pub interval: Duration,
}

impl Ticker {
    pub fn new(steps: u32, interval: Duration) -> Self {
        Self { steps, interval }
    }

    /// Runs `work` while the reporter is ticked from a scoped thread
    ///
    /// Returns once both the work and all ticks are done.
    pub fn run_phase<R, T, F>(&self, reporter: &mut R, label: &str, work: F) -> T
    where
        R: ProgressReporter + ?Sized,
        F: FnOnce() -> T,
    {
        let Ticker { steps, interval } = *self;

        thread::scope(|scope| {
            scope.spawn(move || {
                reporter.start(label, steps);
                for step in 1..=steps {
                    thread::sleep(interval);
                    reporter.advance(step);
                }
                reporter.finish();
            });
            work()
        })
    }
}

/// Draws a single-line bar on stderr, redrawn in place
pub struct ConsoleProgress {
    out: io::Stderr,
    label: String,
    total: u32,
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            out: io::stderr(),
            label: String::new(),
            total: 0,
        }
    }

    fn draw(&mut self, step: u32) -> io::Result<()> {
        let filled = (step * BAR_WIDTH).checked_div(self.total).unwrap_or(BAR_WIDTH);
        let bar = format!(
            "{}{}",
            "█".repeat(filled as usize),
            " ".repeat((BAR_WIDTH - filled) as usize)
        );
        let percent = (step * 100).checked_div(self.total).unwrap_or(100);

        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(format!("{}: {:>3}%|", self.label, percent)),
            Print(bar.cyan()),
            Print(format!("| {}/{}", step, self.total))
        )?;
        self.out.flush()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn start(&mut self, label: &str, total: u32) {
        self.label = label.to_string();
        self.total = total;
        let _ = self.draw(0);
    }

    fn advance(&mut self, step: u32) {
        let _ = self.draw(step);
    }

    fn finish(&mut self) {
        let _ = writeln!(self.out);
    }
}
