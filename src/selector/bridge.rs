use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::history::{FileType, VisitKind};
use crate::query::Dispatcher;
use crate::ranking::Candidate;

use super::Selector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Querying,
    AwaitingSelection,
    Resolved,
}

/// Which shell-side program should open a picked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Handler {
    Player,
    Editor,
}

impl Handler {
    pub fn for_file_type(file_type: &FileType) -> Self {
        if file_type.is_media() {
            Self::Player
        } else {
            Self::Editor
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Editor => "editor",
        }
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the calling shell should do. The bridge never does it itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    #[serde(rename = "cd")]
    ChangeDirectory { path: String },
    Open {
        path: String,
        file_type: FileType,
        handler: Handler,
    },
}

impl Action {
    /// Tab-separated token for shell wrappers: `cd\t<path>` or
    /// `open\t<file_type>\t<handler>\t<path>`.
    pub fn token(&self) -> String {
        match self {
            Self::ChangeDirectory { path } => format!("cd\t{path}"),
            Self::Open {
                path,
                file_type,
                handler,
            } => format!("open\t{file_type}\t{handler}\t{path}"),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::ChangeDirectory { path } | Self::Open { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Selected(Action),
    /// The picker ran and the user backed out.
    Cancelled,
    /// Nothing to pick from; the picker was never started.
    Empty,
}

fn still_exists(kind: VisitKind, path: &Path) -> bool {
    match kind {
        VisitKind::Directory => path.is_dir(),
        VisitKind::File => path.is_file(),
    }
}

/// Drives one interactive pick: query, present, resolve.
pub struct SelectorBridge<'d, S> {
    dispatcher: &'d Dispatcher<'d>,
    selector: S,
    state: BridgeState,
}

impl<'d, S: Selector> SelectorBridge<'d, S> {
    pub const fn new(dispatcher: &'d Dispatcher<'d>, selector: S) -> Self {
        Self {
            dispatcher,
            selector,
            state: BridgeState::Querying,
        }
    }

    pub const fn state(&self) -> BridgeState {
        self.state
    }

    pub fn into_selector(self) -> S {
        self.selector
    }

    /// Rank candidates of `kind`, let the user pick one, and turn the pick
    /// into an [`Action`].
    ///
    /// # Errors
    /// Store failures, a picker that cannot be started, or `StaleSelection`
    /// when the picked path vanished before it could be acted on.
    pub fn run(&mut self, kind: VisitKind, limit: Option<i64>) -> Result<Resolution> {
        self.state = BridgeState::Querying;
        let candidates: Vec<Candidate> = self
            .dispatcher
            .interactive_candidates(kind, limit)?
            .into_iter()
            .filter(|c| {
                let keep = still_exists(kind, Path::new(&c.path));
                if !keep {
                    tracing::debug!(path = %c.path, "skipping candidate that no longer exists");
                }
                keep
            })
            .collect();

        if candidates.is_empty() {
            self.state = BridgeState::Resolved;
            return Ok(Resolution::Empty);
        }

        self.state = BridgeState::AwaitingSelection;
        let lines: Vec<String> = candidates.iter().map(|c| c.path.clone()).collect();
        let picked = self.selector.select(&lines);
        self.state = BridgeState::Resolved;

        let Some(line) = picked? else {
            return Ok(Resolution::Cancelled);
        };
        let Some(candidate) = candidates.iter().find(|c| c.path == line) else {
            return Err(Error::Selector(format!(
                "picker returned a line that was not offered: '{line}'"
            )));
        };
        if !still_exists(kind, Path::new(&candidate.path)) {
            return Err(Error::StaleSelection(candidate.path.clone()));
        }

        let action = match kind {
            VisitKind::Directory => Action::ChangeDirectory {
                path: candidate.path.clone(),
            },
            VisitKind::File => {
                let file_type = candidate.file_type.clone().unwrap_or_else(FileType::other);
                Action::Open {
                    path: candidate.path.clone(),
                    handler: Handler::for_file_type(&file_type),
                    file_type,
                }
            }
        };
        Ok(Resolution::Selected(action))
    }
}
