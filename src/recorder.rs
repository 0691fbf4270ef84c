//! Appending visits: path canonicalization and extension classification.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::history::{DirectoryVisit, FileType, FileVisit, HistoryStore, VisitRecord};

/// Prefix the editor's directory browser puts in front of real paths.
const EDITOR_URI_PREFIX: &str = "oil://";

pub const DEFAULT_ACTION: &str = "opened";

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "wav", "ogg", "oga", "opus", "m4a", "aac", "aiff", "aif", "alac", "wma", "ape",
    "wv",
];
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "webm", "wmv", "flv", "m4v", "mpg", "mpeg", "ts", "3gp", "ogv",
];

/// Maps a path to the category stored with a file visit.
pub trait Classify {
    fn classify(&self, path: &Path) -> FileType;
}

/// Extension lookup table; anything unmapped is `other`.
#[derive(Debug, Clone)]
pub struct ExtensionClassifier {
    by_extension: HashMap<String, FileType>,
}

impl Default for ExtensionClassifier {
    fn default() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
        .with_category(FileType::AUDIO, AUDIO_EXTENSIONS)
        .with_category(FileType::VIDEO, VIDEO_EXTENSIONS)
    }
}

impl ExtensionClassifier {
    /// Map every extension in `extensions` to `category`, replacing earlier mappings.
    #[must_use]
    pub fn with_category<S: AsRef<str>>(mut self, category: &str, extensions: &[S]) -> Self {
        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
            if !ext.is_empty() {
                self.by_extension.insert(ext, FileType::new(category));
            }
        }
        self
    }
}

impl Classify for ExtensionClassifier {
    fn classify(&self, path: &Path) -> FileType {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.by_extension.get(&e.to_ascii_lowercase()))
            .cloned()
            .unwrap_or_else(FileType::other)
    }
}

/// Writes directory and file visits to a [`HistoryStore`].
///
/// Every call appends synchronously; nothing is buffered.
pub struct Recorder<'a> {
    store: &'a HistoryStore,
    classifier: &'a dyn Classify,
}

impl<'a> Recorder<'a> {
    pub fn new(store: &'a HistoryStore, classifier: &'a dyn Classify) -> Self {
        Self { store, classifier }
    }

    /// # Errors
    /// Fails if the path cannot be made absolute or the append fails.
    pub fn record_directory_visit(&self, path: &Path) -> Result<DirectoryVisit> {
        self.record_directory_visit_at(path, Utc::now())
    }

    /// # Errors
    /// Fails if the path cannot be made absolute or the append fails.
    pub fn record_directory_visit_at(
        &self,
        path: &Path,
        visited_at: DateTime<Utc>,
    ) -> Result<DirectoryVisit> {
        let visit = DirectoryVisit {
            path: path_to_string(canonicalize(path)?)?,
            visited_at,
        };
        self.store.append(&VisitRecord::Directory(visit.clone()))?;
        tracing::debug!(path = %visit.path, "recorded directory visit");
        Ok(visit)
    }

    /// # Errors
    /// Fails if the path cannot be made absolute or the append fails.
    pub fn record_file_visit(&self, path: &Path, action: &str) -> Result<FileVisit> {
        self.record_file_visit_at(path, action, Utc::now())
    }

    /// # Errors
    /// Fails if the path cannot be made absolute or the append fails.
    pub fn record_file_visit_at(
        &self,
        path: &Path,
        action: &str,
        visited_at: DateTime<Utc>,
    ) -> Result<FileVisit> {
        let action = validate_action(action)?;
        let canonical = canonicalize(path)?;
        let visit = FileVisit {
            file_type: self.classifier.classify(&canonical),
            path: path_to_string(canonical)?,
            action: action.to_owned(),
            visited_at,
        };
        self.store.append(&VisitRecord::File(visit.clone()))?;
        tracing::debug!(path = %visit.path, file_type = %visit.file_type, "recorded file visit");
        Ok(visit)
    }
}

/// Trimmed file action.
///
/// # Errors
/// `Usage` if the action is blank.
pub fn validate_action(action: &str) -> Result<&str> {
    let action = action.trim();
    if action.is_empty() {
        return Err(Error::Usage("file action must not be empty".to_owned()));
    }
    Ok(action)
}

/// Resolve `path` to the identity it is stored under.
///
/// Strips the editor URI prefix, makes the path absolute against the working
/// directory and resolves symlinks. A path that does not exist (yet) keeps its
/// lexically normalized form, with symlinks in its existing parent resolved.
///
/// # Errors
/// Fails on an empty path or when the working directory is unavailable.
pub fn canonicalize(path: &Path) -> Result<PathBuf> {
    let path = match path.to_str().and_then(|s| s.strip_prefix(EDITOR_URI_PREFIX)) {
        Some(stripped) => PathBuf::from(stripped),
        None => path.to_path_buf(),
    };
    if path.as_os_str().is_empty() {
        return Err(Error::Usage("path must not be empty".to_owned()));
    }
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };
    if let Ok(resolved) = std::fs::canonicalize(&absolute) {
        return Ok(resolved);
    }

    let normalized = normalize_lexically(&absolute);
    tracing::debug!(path = %normalized.display(), "path does not exist, storing normalized form");
    if let (Some(parent), Some(name)) = (normalized.parent(), normalized.file_name())
        && let Ok(parent) = std::fs::canonicalize(parent)
    {
        return Ok(parent.join(name));
    }
    Ok(normalized)
}

/// Drop `.` components and fold `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn path_to_string(path: PathBuf) -> Result<String> {
    path.into_os_string()
        .into_string()
        .map_err(|raw| Error::Usage(format!("path is not valid UTF-8: {}", raw.to_string_lossy())))
}
