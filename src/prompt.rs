//! Yes/no confirmation before destructive operations.

use std::io::{self, BufRead, Write};

use crate::error::Result;

/// Answers a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Asks on stderr and reads the answer from stdin. Anything but `y`/`yes` is a no.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let mut stderr = io::stderr();
        write!(stderr, "{} [y/N] ", question)?;
        stderr.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

/// Gives the same answer to every question and remembers what was asked.
#[derive(Debug, Default)]
pub struct FixedAnswer {
    pub answer: bool,
    pub asked: Vec<String>,
}

impl FixedAnswer {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Vec::new(),
        }
    }
}

impl Confirm for FixedAnswer {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.asked.push(question.to_string());
        Ok(self.answer)
    }
}
