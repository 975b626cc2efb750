//! Spinner shown on stderr while a request is in flight

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const SPINNER_UPDATE_INTERVAL_MS: u64 = 100;
const CLEAR_LINE_WIDTH: usize = 100;
const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub struct ProgressSpinner {
    message: String,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    interactive: bool,
}

impl ProgressSpinner {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_terminal(message, atty::is(atty::Stream::Stderr))
    }

    /// Spinner that never draws, for pipes and tests
    pub fn silent(message: impl Into<String>) -> Self {
        Self::with_terminal(message, false)
    }

    fn with_terminal(message: impl Into<String>, interactive: bool) -> Self {
        Self {
            message: message.into(),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            interactive,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn start(&mut self) {
        if !self.interactive || self.is_running() {
            return;
        }
        self.running.store(true, Ordering::Relaxed);
        let running = Arc::clone(&self.running);
        let message = self.message.clone();

        let handle = thread::spawn(move || {
            let mut index = 0;
            while running.load(Ordering::Relaxed) {
                eprint!("\r{} {}", SPINNER_CHARS[index], message);
                let _ = io::stderr().flush();

                index = (index + 1) % SPINNER_CHARS.len();
                thread::sleep(Duration::from_millis(SPINNER_UPDATE_INTERVAL_MS));
            }

            eprint!("\r{:<width$}\r", "", width = CLEAR_LINE_WIDTH);
            let _ = io::stderr().flush();
        });

        self.handle = Some(handle);
    }

    pub fn stop(&mut self, completion_message: Option<&str>) {
        self.running.store(false, Ordering::Relaxed);

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        if let Some(msg) = completion_message {
            // Leading space keeps emoji from being clipped
            eprintln!(" {}", msg);
        }
    }
}

impl Drop for ProgressSpinner {
    fn drop(&mut self) {
        self.stop(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_spinner_never_starts() {
        let mut spinner = ProgressSpinner::silent("Loading leads...");
        spinner.start();
        assert!(!spinner.is_running());
        spinner.stop(None);
        assert!(!spinner.is_running());
    }

    #[test]
    fn test_stop_joins_thread() {
        let mut spinner = ProgressSpinner::with_terminal("Exporting...", true);
        spinner.start();
        assert!(spinner.is_running());
        spinner.stop(None);
        assert!(!spinner.is_running());
        assert!(spinner.handle.is_none());
    }
}
