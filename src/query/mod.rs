//! Named commands mapped onto ranking calls.

mod format;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::history::{HistoryStore, VisitKind, VisitRecord, parse_timestamp};
use crate::ranking::{
    self, Candidate, DEFAULT_INTERACTIVE_LIMIT, DEFAULT_LIST_LIMIT, DecayPolicy, FileStats,
    SearchResults,
};

pub use format::{Styler, pretty_json};

/// A validated listing command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    RecentDirs { limit: Option<i64> },
    RecentFiles { limit: Option<i64> },
    PopularDirs { limit: Option<i64> },
    FileStats,
    Search { query: String },
    Dump { kind: VisitKind, since: Option<DateTime<Utc>> },
}

impl Query {
    /// # Errors
    /// `Usage` if the query is blank.
    pub fn search(query: &str) -> Result<Self> {
        if query.trim().is_empty() {
            return Err(Error::Usage("search requires a non-empty query".to_owned()));
        }
        Ok(Self::Search {
            query: query.to_owned(),
        })
    }

    /// # Errors
    /// `InvalidQuery` for an unknown kind, `Usage` for an unparseable `since`.
    pub fn dump(kind: &str, since: Option<&str>) -> Result<Self> {
        let kind = kind.parse::<VisitKind>()?;
        let since = since
            .map(|raw| {
                parse_timestamp(raw).ok_or_else(|| {
                    Error::Usage(format!(
                        "cannot parse time '{raw}' (expected YYYY-MM-DD HH:MM:SS or RFC 3339)"
                    ))
                })
            })
            .transpose()?;
        Ok(Self::Dump { kind, since })
    }
}

/// The fully computed result of one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    Recent(Vec<Candidate>),
    Popular(Vec<Candidate>),
    Stats(FileStats),
    Search(SearchResults),
    Rows(Vec<VisitRecord>),
}

impl QueryOutput {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Recent(c) | Self::Popular(c) => c.is_empty(),
            Self::Stats(s) => s.total == 0,
            Self::Search(r) => r.is_empty(),
            Self::Rows(r) => r.is_empty(),
        }
    }

    /// Plain-text rendering, one entry per line.
    ///
    /// # Errors
    /// Only if a dumped row cannot be serialized.
    pub fn to_lines(&self, styler: &Styler) -> Result<Vec<String>> {
        format::lines(self, styler)
    }
}

/// Runs queries against one store with a fixed clock and decay policy.
pub struct Dispatcher<'a> {
    store: &'a HistoryStore,
    config: &'a StoreConfig,
    policy: DecayPolicy,
    now: DateTime<Utc>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(store: &'a HistoryStore, config: &'a StoreConfig, policy: DecayPolicy) -> Self {
        Self {
            store,
            config,
            policy,
            now: Utc::now(),
        }
    }

    /// Pin the reference time used for frecency scoring.
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn styler(&self) -> Styler {
        Styler::new(self.config.color_enabled)
    }

    /// # Errors
    /// Store read failures.
    pub fn execute(&self, query: &Query) -> Result<QueryOutput> {
        tracing::debug!(?query, "executing query");
        let output = match query {
            Query::RecentDirs { limit } => QueryOutput::Recent(self.candidates(
                VisitKind::Directory,
                *limit,
                DEFAULT_LIST_LIMIT,
            )?),
            Query::RecentFiles { limit } => {
                QueryOutput::Recent(self.candidates(VisitKind::File, *limit, DEFAULT_LIST_LIMIT)?)
            }
            Query::PopularDirs { limit } => {
                let visits = self.store.scan_directories(None)?;
                let limit = ranking::resolve_limit(*limit, DEFAULT_LIST_LIMIT);
                QueryOutput::Popular(ranking::popular_directories(
                    &visits,
                    self.now,
                    &self.policy,
                    limit,
                ))
            }
            Query::FileStats => {
                QueryOutput::Stats(ranking::file_stats(&self.store.scan_files(None)?))
            }
            Query::Search { query } => {
                let directories = self.store.scan_directories(None)?;
                let files = self.store.scan_files(None)?;
                QueryOutput::Search(ranking::search(&directories, &files, query))
            }
            Query::Dump { kind, since } => QueryOutput::Rows(self.store.scan(*kind, *since)?),
        };
        Ok(output)
    }

    /// Recency-ranked candidates of one kind, as fed to the interactive picker.
    ///
    /// # Errors
    /// Store read failures.
    pub fn interactive_candidates(
        &self,
        kind: VisitKind,
        limit: Option<i64>,
    ) -> Result<Vec<Candidate>> {
        self.candidates(kind, limit, DEFAULT_INTERACTIVE_LIMIT)
    }

    fn candidates(
        &self,
        kind: VisitKind,
        limit: Option<i64>,
        default: usize,
    ) -> Result<Vec<Candidate>> {
        let limit = ranking::resolve_limit(limit, default);
        Ok(match kind {
            VisitKind::Directory => {
                ranking::recent_directories(&self.store.scan_directories(None)?, limit)
            }
            VisitKind::File => ranking::recent_files(&self.store.scan_files(None)?, limit),
        })
    }
}
