//! Handing ranked candidates to a fuzzy picker.

mod bridge;

use std::collections::VecDeque;
use std::io::Write as _;
use std::process::{Command, Stdio};

use crate::config::SelectorSection;
use crate::error::{Error, Result};

pub use bridge::{Action, BridgeState, Handler, Resolution, SelectorBridge};

/// Something that lets a user pick one line out of many.
pub trait Selector {
    /// `Ok(None)` means the user picked nothing.
    ///
    /// # Errors
    /// `Selector` if the picker cannot be run at all.
    fn select(&mut self, candidates: &[String]) -> Result<Option<String>>;
}

/// Runs an external picker (`fzf` by default): candidates on stdin, the
/// chosen line on stdout, non-zero exit or empty output means cancelled.
#[derive(Debug, Clone)]
pub struct ExternalSelector {
    program: String,
    args: Vec<String>,
}

impl ExternalSelector {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_settings(settings: &SelectorSection) -> Self {
        Self::new(settings.command.clone(), settings.args.iter().cloned())
    }
}

impl Selector for ExternalSelector {
    fn select(&mut self, candidates: &[String]) -> Result<Option<String>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::Selector(format!("'{}' not found on PATH", self.program))
                } else {
                    Error::Selector(format!("failed launching '{}': {e}", self.program))
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload: String = candidates.iter().map(|c| format!("{c}\n")).collect();
            match stdin.write_all(payload.as_bytes()) {
                // The picker may exit before reading everything.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }

        let out = child.wait_with_output()?;
        if !out.status.success() {
            tracing::debug!(status = ?out.status, "picker exited without a selection");
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&out.stdout)
            .lines()
            .next()
            .map(str::trim)
            .unwrap_or_default()
            .to_owned();
        Ok((!line.is_empty()).then_some(line))
    }
}

/// Replays canned answers and records what it was shown.
#[derive(Debug, Default)]
pub struct ScriptedSelector {
    answers: VecDeque<Option<String>>,
    shown: Vec<Vec<String>>,
}

impl ScriptedSelector {
    pub fn new(answers: impl IntoIterator<Item = Option<String>>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            shown: Vec::new(),
        }
    }

    /// Always picks `line` once.
    pub fn picking(line: impl Into<String>) -> Self {
        Self::new([Some(line.into())])
    }

    pub fn cancelling() -> Self {
        Self::new([None])
    }

    /// Candidate lists passed to each `select` call, in order.
    pub fn invocations(&self) -> &[Vec<String>] {
        &self.shown
    }
}

impl Selector for ScriptedSelector {
    fn select(&mut self, candidates: &[String]) -> Result<Option<String>> {
        self.shown.push(candidates.to_vec());
        Ok(self.answers.pop_front().flatten())
    }
}
