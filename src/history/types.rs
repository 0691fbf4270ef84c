use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone as _, Utc};
use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Storage format for `timestamp` columns: `SQLite`'s `CURRENT_TIMESTAMP` shape
/// with milliseconds, so rows written by shell hooks and by us sort together.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Which history table a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitKind {
    Directory,
    File,
}

impl VisitKind {
    pub(crate) const fn table(self) -> &'static str {
        match self {
            Self::Directory => "directory_history",
            Self::File => "file_history",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::File => "file",
        }
    }
}

impl fmt::Display for VisitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VisitKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dir" | "dirs" | "directory" | "directories" => Ok(Self::Directory),
            "file" | "files" => Ok(Self::File),
            other => Err(Error::InvalidQuery(format!(
                "unknown history kind '{other}' (expected 'dirs' or 'files')"
            ))),
        }
    }
}

/// Category tag derived from a file's extension when the visit was recorded.
///
/// Open-ended: configuration may add categories beyond the built-in three.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileType(String);

impl FileType {
    pub const AUDIO: &'static str = "audio";
    pub const VIDEO: &'static str = "video";
    pub const OTHER: &'static str = "other";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn audio() -> Self {
        Self::new(Self::AUDIO)
    }

    pub fn video() -> Self {
        Self::new(Self::VIDEO)
    }

    pub fn other() -> Self {
        Self::new(Self::OTHER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Audio and video are opened with a media player; everything else with an editor.
    pub fn is_media(&self) -> bool {
        self.0 == Self::AUDIO || self.0 == Self::VIDEO
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryVisit {
    pub path: String,
    pub visited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileVisit {
    pub path: String,
    pub file_type: FileType,
    pub action: String,
    pub visited_at: DateTime<Utc>,
}

/// One row of either history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VisitRecord {
    Directory(DirectoryVisit),
    File(FileVisit),
}

impl VisitRecord {
    pub const fn kind(&self) -> VisitKind {
        match self {
            Self::Directory(_) => VisitKind::Directory,
            Self::File(_) => VisitKind::File,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Directory(v) => &v.path,
            Self::File(v) => &v.path,
        }
    }

    pub const fn visited_at(&self) -> DateTime<Utc> {
        match self {
            Self::Directory(v) => v.visited_at,
            Self::File(v) => v.visited_at,
        }
    }
}

impl From<DirectoryVisit> for VisitRecord {
    fn from(v: DirectoryVisit) -> Self {
        Self::Directory(v)
    }
}

impl From<FileVisit> for VisitRecord {
    fn from(v: FileVisit) -> Self {
        Self::File(v)
    }
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Accepts `YYYY-MM-DD HH:MM:SS[.fff]` (UTC)
/// and RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub(crate) fn timestamp_from_sql(value: ValueRef<'_>) -> Option<DateTime<Utc>> {
    match value {
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().and_then(parse_timestamp),
        ValueRef::Integer(secs) => Utc.timestamp_opt(secs, 0).single(),
        #[allow(clippy::cast_possible_truncation)]
        ValueRef::Real(secs) => DateTime::from_timestamp_millis((secs * 1000.0) as i64),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}
