//! User-facing side effects the login flows depend on.

use std::io::{self, BufRead, Write};

/// Launches URLs in the user's browser. Fire-and-forget.
pub trait Browser {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Blocking, single-line exchanges with the user.
pub trait Prompt {
    /// Shows an informational message.
    fn notify(&self, message: &str);

    /// Asks for one line of text. `None` means the user cancelled.
    fn ask_line(&self, message: &str) -> Option<String>;

    /// Like [`Prompt::ask_line`], but the answer is not echoed.
    fn ask_secret(&self, message: &str) -> Option<String> {
        self.ask_line(message)
    }

    /// Asks a yes/no question; anything but an explicit yes is a no.
    fn confirm(&self, question: &str) -> bool;
}

/// Opens URLs with the operating system's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }
}

/// Prompt backed by stdin, with messages written to stderr. Secrets are read
/// from the terminal without echo.
///
/// End of input counts as cancellation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn read_line() -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl Prompt for TerminalPrompt {
    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }

    fn ask_line(&self, message: &str) -> Option<String> {
        eprint!("{message} ");
        let _ = io::stderr().flush();
        Self::read_line()
    }

    fn ask_secret(&self, message: &str) -> Option<String> {
        rpassword::prompt_password(format!("{message} ")).ok()
    }

    fn confirm(&self, question: &str) -> bool {
        eprint!("{question} [y/N] ");
        let _ = io::stderr().flush();
        Self::read_line()
            .map(|answer| is_yes(&answer))
            .unwrap_or(false)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
