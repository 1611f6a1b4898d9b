//! Thread-safe progress reporting for the sync engine.
//!
//! Worker threads report completed repositories through a shared
//! [`Progress`]. Every write happens while holding one mutex, so lines from
//! concurrent tasks never interleave and the `[n/N]` counter is strictly
//! increasing in output order.

use std::sync::Mutex;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};
use crate::output::OutputConfig;

enum Sink {
    /// Interactive terminal: a bar with lines printed above it.
    Bar(ProgressBar),
    /// Plain lines on stdout.
    Plain,
    /// Collected in memory, for tests.
    Capture(Vec<String>),
    Quiet,
}

struct State {
    completed: usize,
    sink: Sink,
}

pub struct Progress {
    total: usize,
    use_color: bool,
    state: Mutex<State>,
}

impl Progress {
    /// Picks a bar when stderr is a terminal and plain lines otherwise.
    pub fn for_terminal(total: usize, output: &OutputConfig) -> Self {
        let sink = if console::Term::stderr().is_term() {
            let bar = ProgressBar::new(total as u64);
            if let Ok(bar_style) = ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}") {
                bar.set_style(bar_style);
            }
            Sink::Bar(bar)
        } else {
            Sink::Plain
        };
        Self::with_sink(total, output.use_color, sink)
    }

    /// Records lines in memory instead of printing them.
    pub fn capture(total: usize) -> Self {
        Self::with_sink(total, false, Sink::Capture(Vec::new()))
    }

    pub fn quiet(total: usize) -> Self {
        Self::with_sink(total, false, Sink::Quiet)
    }

    fn with_sink(total: usize, use_color: bool, sink: Sink) -> Self {
        Self {
            total,
            use_color,
            state: Mutex::new(State { completed: 0, sink }),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Marks one repository finished and prints `[n/N] <line>`.
    pub fn done(&self, line: &str) -> Result<()> {
        let mut state = self.lock()?;
        state.completed += 1;
        let counter = format!("[{}/{}]", state.completed, self.total);
        let counter = if self.use_color {
            style(counter).cyan().to_string()
        } else {
            counter
        };
        if let Sink::Bar(bar) = &state.sink {
            bar.inc(1);
        }
        emit(&mut state.sink, format!("{} {}", counter, line));
        Ok(())
    }

    /// Prints a line without advancing the counter.
    pub fn log(&self, line: &str) -> Result<()> {
        let mut state = self.lock()?;
        emit(&mut state.sink, line.to_string());
        Ok(())
    }

    /// Removes the bar, if one is drawn.
    pub fn finish(&self) {
        if let Ok(state) = self.state.lock() {
            if let Sink::Bar(bar) = &state.sink {
                bar.finish_and_clear();
            }
        }
    }

    /// Lines recorded by a capturing sink.
    pub fn lines(&self) -> Vec<String> {
        match self.state.lock() {
            Ok(state) => match &state.sink {
                Sink::Capture(lines) => lines.clone(),
                _ => Vec::new(),
            },
            Err(_) => Vec::new(),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| Error::LockPoisoned {
            context: "progress output".to_string(),
        })
    }
}

fn emit(sink: &mut Sink, line: String) {
    match sink {
        Sink::Bar(bar) => bar.println(line),
        Sink::Plain => println!("{}", line),
        Sink::Capture(lines) => lines.push(line),
        Sink::Quiet => {}
    }
}
