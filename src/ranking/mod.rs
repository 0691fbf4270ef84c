//! Turning raw visit rows into ordered candidates.
//!
//! Everything here is a pure function over rows already read from the store:
//! no I/O, no clock reads (callers pass `now`).

mod decay;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::history::{DirectoryVisit, FileType, FileVisit, VisitKind};

pub use decay::DecayPolicy;

/// Default page size for the listing commands.
pub const DEFAULT_LIST_LIMIT: usize = 500;
/// Default page size for the interactive commands.
pub const DEFAULT_INTERACTIVE_LIMIT: usize = 1000;

/// Clamp a caller-supplied limit: absent, zero or negative means `default`.
pub fn resolve_limit(requested: Option<i64>, default: usize) -> usize {
    requested
        .filter(|&n| n > 0)
        .map_or(default, |n| usize::try_from(n).unwrap_or(usize::MAX))
}

/// One ranked path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub path: String,
    pub kind: VisitKind,
    pub last_visited: DateTime<Utc>,
    pub visits: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Category of the most recent file visit; `None` for directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub file_type: FileType,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCount {
    pub file_type: FileType,
    pub action: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileStats {
    /// Ordered by the first visit seen in each category.
    pub categories: Vec<CategoryCount>,
    /// Per `(category, action)` pair, in first-seen order.
    pub actions: Vec<ActionCount>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub directories: Vec<Candidate>,
    pub files: Vec<Candidate>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

/// `(path, visited_at, file_type)` as fed to the aggregator.
type Row<'a> = (&'a str, DateTime<Utc>, Option<&'a FileType>);

/// Per-path accumulator.
struct Aggregate<'a> {
    last_visited: DateTime<Utc>,
    visits: Vec<DateTime<Utc>>,
    file_type: Option<&'a FileType>,
}

fn aggregate<'a, I>(rows: I) -> HashMap<&'a str, Aggregate<'a>>
where
    I: IntoIterator<Item = Row<'a>>,
{
    let mut by_path: HashMap<&str, Aggregate<'_>> = HashMap::new();
    for (path, at, file_type) in rows {
        let entry = by_path.entry(path).or_insert_with(|| Aggregate {
            last_visited: at,
            visits: Vec::new(),
            file_type,
        });
        // Latest visit wins; equal timestamps pick the greater category so the
        // choice does not depend on row order.
        if at > entry.last_visited || (at == entry.last_visited && file_type > entry.file_type) {
            entry.last_visited = at;
            entry.file_type = file_type;
        }
        entry.visits.push(at);
    }
    by_path
}

fn directory_rows(visits: &[DirectoryVisit]) -> impl Iterator<Item = Row<'_>> {
    visits.iter().map(|v| (v.path.as_str(), v.visited_at, None))
}

fn file_rows(visits: &[FileVisit]) -> impl Iterator<Item = Row<'_>> {
    visits
        .iter()
        .map(|v| (v.path.as_str(), v.visited_at, Some(&v.file_type)))
}

fn to_candidate(
    kind: VisitKind,
    path: &str,
    agg: &Aggregate<'_>,
    score: Option<f64>,
) -> Candidate {
    Candidate {
        path: path.to_owned(),
        kind,
        last_visited: agg.last_visited,
        visits: agg.visits.len() as u64,
        score,
        file_type: agg.file_type.cloned(),
    }
}

fn by_recency(a: &Candidate, b: &Candidate) -> Ordering {
    b.last_visited
        .cmp(&a.last_visited)
        .then_with(|| a.path.cmp(&b.path))
}

fn rank_by_recency<'a, I>(kind: VisitKind, rows: I, limit: usize) -> Vec<Candidate>
where
    I: IntoIterator<Item = Row<'a>>,
{
    let mut candidates: Vec<Candidate> = aggregate(rows)
        .iter()
        .map(|(path, agg)| to_candidate(kind, path, agg, None))
        .collect();
    candidates.sort_by(by_recency);
    candidates.truncate(limit);
    candidates
}

/// Distinct directories, most recently visited first.
pub fn recent_directories(visits: &[DirectoryVisit], limit: usize) -> Vec<Candidate> {
    rank_by_recency(VisitKind::Directory, directory_rows(visits), limit)
}

/// Distinct files, most recently visited first.
pub fn recent_files(visits: &[FileVisit], limit: usize) -> Vec<Candidate> {
    rank_by_recency(VisitKind::File, file_rows(visits), limit)
}

/// Distinct directories by frecency score; ties go to the more recent
/// last visit, then to the lexicographically smaller path.
pub fn popular_directories(
    visits: &[DirectoryVisit],
    now: DateTime<Utc>,
    policy: &DecayPolicy,
    limit: usize,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = aggregate(directory_rows(visits))
        .into_iter()
        .map(|(path, mut agg)| {
            let score = policy.score(now, &mut agg.visits);
            to_candidate(VisitKind::Directory, path, &agg, Some(score))
        })
        .collect();
    candidates.sort_by(|a, b| {
        let (sa, sb) = (a.score.unwrap_or(0.0), b.score.unwrap_or(0.0));
        sb.total_cmp(&sa).then_with(|| by_recency(a, b))
    });
    candidates.truncate(limit);
    candidates
}

/// Count visits per key, ordered by each key's earliest visit (ties by key).
fn first_seen_counts<K: Hash + Ord>(
    keyed: impl IntoIterator<Item = (K, DateTime<Utc>)>,
) -> Vec<(K, u64)> {
    let mut seen: HashMap<K, (DateTime<Utc>, u64)> = HashMap::new();
    for (key, at) in keyed {
        let entry = seen.entry(key).or_insert((at, 0));
        entry.0 = entry.0.min(at);
        entry.1 += 1;
    }
    let mut ordered: Vec<_> = seen.into_iter().collect();
    ordered.sort_by(|(ka, (fa, _)), (kb, (fb, _))| fa.cmp(fb).then_with(|| ka.cmp(kb)));
    ordered.into_iter().map(|(key, (_, count))| (key, count)).collect()
}

/// Visit counts per file category, and per category and action, in first-seen order.
pub fn file_stats(visits: &[FileVisit]) -> FileStats {
    let categories = first_seen_counts(visits.iter().map(|v| (&v.file_type, v.visited_at)))
        .into_iter()
        .map(|(file_type, count)| CategoryCount {
            file_type: file_type.clone(),
            count,
        })
        .collect();
    let actions = first_seen_counts(
        visits
            .iter()
            .map(|v| ((&v.file_type, v.action.as_str()), v.visited_at)),
    )
    .into_iter()
    .map(|((file_type, action), count)| ActionCount {
        file_type: file_type.clone(),
        action: action.to_owned(),
        count,
    })
    .collect();

    FileStats {
        categories,
        actions,
        total: visits.len() as u64,
    }
}

/// Case-insensitive substring match over both kinds, each group by recency.
pub fn search(directories: &[DirectoryVisit], files: &[FileVisit], query: &str) -> SearchResults {
    let needle = query.to_lowercase();
    let matches = |path: &str| path.to_lowercase().contains(&needle);

    SearchResults {
        directories: rank_by_recency(
            VisitKind::Directory,
            directory_rows(directories).filter(|(p, ..)| matches(*p)),
            usize::MAX,
        ),
        files: rank_by_recency(
            VisitKind::File,
            file_rows(files).filter(|(p, ..)| matches(*p)),
            usize::MAX,
        ),
    }
}

#[cfg(test)]
mod tests;
