use std::io::{self, BufRead};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Instant;

use clap::Parser;
#[cfg(unix)]
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::{Handle as SignalHandle, Signals},
};
use tracing::{debug, info, warn};

use crate::board::{SessionSignal, TaskBoard};
use crate::cli::commands::ShellLine;
use crate::error::TaskboardError;
use crate::store::KeyValueStore;

enum ShellEvent {
    Line(String),
    Eof,
    #[cfg_attr(not(unix), allow(dead_code))]
    Signal(i32),
}

/// Read commands from stdin until `quit`/`exit`, end of input or a
/// terminating signal, then force a final save. Deferred saves fire on their
/// own deadline while the session is idle.
pub fn run(data_dir: Option<&Path>, json_output: bool) -> Result<(), TaskboardError> {
    let mut board = super::open_board(data_dir)?;
    let (tx, rx) = mpsc::channel();

    let watcher = match SignalWatcher::start(tx.clone()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!(error = %e, "failed to install signal handlers");
            None
        }
    };
    spawn_stdin_reader(tx);
    board.on_signal(SessionSignal::Loaded);

    loop {
        let event = match board.scheduler().deadline() {
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) => {
                        board.tick(Instant::now());
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => ShellEvent::Eof,
                }
            }
            None => rx.recv().unwrap_or(ShellEvent::Eof),
        };
        match event {
            ShellEvent::Line(line) => {
                if !handle_line(&mut board, &line, json_output) {
                    break;
                }
            }
            ShellEvent::Eof => break,
            ShellEvent::Signal(signal) => {
                info!(signal, "terminating signal received");
                break;
            }
        }
        board.tick(Instant::now());
    }

    debug!("session ending");
    board.on_signal(SessionSignal::Unload);
    if let Some(watcher) = watcher {
        watcher.stop();
    }
    Ok(())
}

/// Run one input line. Returns false when the session should end.
fn handle_line<S: KeyValueStore>(board: &mut TaskBoard<S>, line: &str, json_output: bool) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return true;
    }
    if matches!(trimmed, "quit" | "exit") {
        return false;
    }

    let words = match split_words(trimmed) {
        Ok(words) => words,
        Err(e) => {
            super::report(Err(e), json_output);
            return true;
        }
    };
    match ShellLine::try_parse_from(words) {
        Ok(parsed) => {
            let json = json_output || parsed.json;
            super::report(super::execute(board, parsed.command, json), json);
        }
        Err(e) => {
            if let Err(io_err) = e.print() {
                warn!(error = %io_err, "failed to print usage error");
            }
        }
    }
    true
}

/// Stdin blocks, so it is read on its own thread and fed to the session loop.
fn spawn_stdin_reader(tx: Sender<ShellEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(ShellEvent::Line(line)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "stdin read failed, ending session");
                    break;
                }
            }
        }
        if tx.send(ShellEvent::Eof).is_err() {
            debug!("session already closed at end of input");
        }
    });
}

/// Forwards SIGINT, SIGTERM and SIGHUP to the session loop.
#[cfg(unix)]
struct SignalWatcher {
    handle: SignalHandle,
    thread: thread::JoinHandle<()>,
}

#[cfg(unix)]
impl SignalWatcher {
    fn start(tx: Sender<ShellEvent>) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
        let handle = signals.handle();
        let thread = thread::spawn(move || {
            for signal in signals.forever() {
                if tx.send(ShellEvent::Signal(signal)).is_err() {
                    break;
                }
            }
        });
        Ok(Self { handle, thread })
    }

    fn stop(self) {
        self.handle.close();
        if self.thread.join().is_err() {
            warn!("signal watcher thread panicked");
        }
    }
}

#[cfg(not(unix))]
struct SignalWatcher;

#[cfg(not(unix))]
impl SignalWatcher {
    fn start(_tx: Sender<ShellEvent>) -> io::Result<Self> {
        Ok(Self)
    }

    fn stop(self) {}
}

/// Split a command line on whitespace, honoring single and double quotes.
/// Inside double quotes a backslash escapes the next character.
pub fn split_words(line: &str) -> Result<Vec<String>, TaskboardError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => return Err(unterminated()),
                        },
                        Some(other) => current.push(other),
                        None => return Err(unterminated()),
                    }
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(other) => current.push(other),
                        None => return Err(unterminated()),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn unterminated() -> TaskboardError {
    TaskboardError::validation("Unterminated quote")
}
