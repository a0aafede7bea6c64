// src/prompt.rs

//! Interactive input abstraction
//!
//! Every prompt in the workflow goes through the [`Prompter`] trait, so the
//! retry loops in [`crate::select`] and [`crate::session`] can be driven by
//! scripted input in tests instead of a real console.

use crate::error::Result;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Capability interface for asking the user for a line of input
pub trait Prompter {
    /// Display `prompt` and read one line, without the trailing newline
    fn ask(&mut self, prompt: &str) -> Result<String>;
}

/// Prompter backed by the process console
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl ConsolePrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for ConsolePrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            // EOF must not spin the unbounded retry loops forever
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "standard input closed while waiting for input",
            )
            .into());
        }

        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

/// Prompter that replays a fixed sequence of replies
///
/// Used by the test suite; also usable by embedders that drive the workflow
/// without a console. Running out of replies is reported as EOF.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    replies: VecDeque<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, _prompt: &str) -> Result<String> {
        self.replies.pop_front().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "scripted prompter ran out of replies",
            )
            .into()
        })
    }
}
