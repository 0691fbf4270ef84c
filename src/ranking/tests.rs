#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use chrono::TimeDelta;

fn t(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
}

fn dirs(rows: &[(&str, i64)]) -> Vec<DirectoryVisit> {
    rows.iter()
        .map(|&(path, secs)| DirectoryVisit {
            path: path.to_owned(),
            visited_at: t(secs),
        })
        .collect()
}

fn files(rows: &[(&str, &str, i64)]) -> Vec<FileVisit> {
    rows.iter()
        .map(|&(path, file_type, secs)| FileVisit {
            path: path.to_owned(),
            file_type: FileType::new(file_type),
            action: "opened".to_owned(),
            visited_at: t(secs),
        })
        .collect()
}

fn file_actions(rows: &[(&str, &str, &str, i64)]) -> Vec<FileVisit> {
    rows.iter()
        .map(|&(path, file_type, action, secs)| FileVisit {
            path: path.to_owned(),
            file_type: FileType::new(file_type),
            action: action.to_owned(),
            visited_at: t(secs),
        })
        .collect()
}

fn paths(candidates: &[Candidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.path.as_str()).collect()
}

fn hourly() -> DecayPolicy {
    DecayPolicy::from_hours(1.0, 0.05).unwrap()
}

// --- resolve_limit ---

#[test]
fn non_positive_limits_fall_back_to_default() {
    assert_eq!(resolve_limit(None, DEFAULT_LIST_LIMIT), 500);
    assert_eq!(resolve_limit(Some(0), DEFAULT_LIST_LIMIT), 500);
    assert_eq!(resolve_limit(Some(-7), DEFAULT_INTERACTIVE_LIMIT), 1000);
    assert_eq!(resolve_limit(Some(3), DEFAULT_LIST_LIMIT), 3);
}

#[test]
fn non_positive_limit_yields_default_result_set() {
    let visits: Vec<_> = (0..600)
        .map(|i| DirectoryVisit {
            path: format!("/d/{i:04}"),
            visited_at: t(i),
        })
        .collect();
    let by_default = recent_directories(&visits, resolve_limit(None, DEFAULT_LIST_LIMIT));
    let by_zero = recent_directories(&visits, resolve_limit(Some(0), DEFAULT_LIST_LIMIT));
    let by_negative = recent_directories(&visits, resolve_limit(Some(-1), DEFAULT_LIST_LIMIT));
    assert_eq!(by_default.len(), 500);
    assert_eq!(by_default, by_zero);
    assert_eq!(by_default, by_negative);
}

// --- recency ---

#[test]
fn recent_and_popular_agree_when_one_path_dominates() {
    let visits = dirs(&[("/home/a", 1), ("/home/b", 2), ("/home/b", 3), ("/home/b", 4)]);
    assert_eq!(paths(&recent_directories(&visits, 10)), vec!["/home/b", "/home/a"]);
    assert_eq!(
        paths(&popular_directories(&visits, t(5), &DecayPolicy::default(), 10)),
        vec!["/home/b", "/home/a"]
    );
}

#[test]
fn recency_uses_latest_visit_only() {
    // Many old visits to /old, one newer visit to /new.
    let mut rows: Vec<(&str, i64)> = (0..50).map(|i| ("/old", i)).collect();
    rows.push(("/new", 100));
    rows.push(("/old", 99));
    let ranked = recent_directories(&dirs(&rows), 10);

    assert_eq!(paths(&ranked), vec!["/new", "/old"]);
    assert_eq!(ranked[1].last_visited, t(99));
    assert_eq!(ranked[1].visits, 51);
}

#[test]
fn recency_ties_break_by_path() {
    let visits = dirs(&[("/zeta", 5), ("/alpha", 5), ("/mid", 5)]);
    assert_eq!(
        paths(&recent_directories(&visits, 10)),
        vec!["/alpha", "/mid", "/zeta"]
    );
}

#[test]
fn recency_respects_limit() {
    let visits = dirs(&[("/a", 1), ("/b", 2), ("/c", 3)]);
    assert_eq!(paths(&recent_directories(&visits, 2)), vec!["/c", "/b"]);
}

#[test]
fn recent_files_carry_latest_file_type() {
    let visits = files(&[("/clip", "video", 1), ("/clip", "other", 2), ("/song", "audio", 3)]);
    let ranked = recent_files(&visits, 10);
    assert_eq!(paths(&ranked), vec!["/song", "/clip"]);
    assert_eq!(ranked[1].file_type, Some(FileType::other()));
    assert_eq!(ranked[1].kind, VisitKind::File);
    assert!(ranked.iter().all(|c| c.score.is_none()));
}

#[test]
fn empty_history_ranks_nothing() {
    assert!(recent_directories(&[], 10).is_empty());
    assert!(recent_files(&[], 10).is_empty());
    assert!(popular_directories(&[], t(0), &hourly(), 10).is_empty());
}

// --- frecency ---

#[test]
fn frecency_grows_with_visit_count() {
    let policy = hourly();
    let now = t(10_000);
    let mut previous = 0.0;
    for count in 1..=20 {
        let visits: Vec<_> = (0..count).map(|_| ("/p", 5_000)).collect();
        let ranked = popular_directories(&dirs(&visits), now, &policy, 1);
        let score = ranked[0].score.unwrap();
        assert!(score >= previous, "score fell at count {count}");
        previous = score;
    }
}

#[test]
fn frecency_shrinks_with_age() {
    let policy = hourly();
    let now = t(100_000);
    let mut previous = f64::INFINITY;
    for age_hours in 0..48 {
        let at = 100_000 - age_hours * 3600;
        let visits = dirs(&[("/p", at), ("/p", at), ("/p", at)]);
        let score = popular_directories(&visits, now, &policy, 1)[0].score.unwrap();
        assert!(score <= previous, "score rose at {age_hours}h");
        previous = score;
    }
}

#[test]
fn newer_history_outranks_equally_sized_older_history() {
    let now = t(100_000);
    let visits = dirs(&[
        ("/old", 0),
        ("/old", 10),
        ("/old", 20),
        ("/new", 90_000),
        ("/new", 90_010),
        ("/new", 90_020),
    ]);
    let ranked = popular_directories(&visits, now, &hourly(), 10);
    assert_eq!(paths(&ranked), vec!["/new", "/old"]);
}

#[test]
fn frequent_recent_beats_single_recent_visit() {
    let now = t(10_000);
    let mut rows: Vec<(&str, i64)> = (0..10).map(|i| ("/often", 9_000 + i)).collect();
    rows.push(("/once", 9_999));
    let ranked = popular_directories(&dirs(&rows), now, &hourly(), 10);
    assert_eq!(paths(&ranked), vec!["/often", "/once"]);
}

#[test]
fn ancient_but_voluminous_history_is_not_erased() {
    let now = t(0) + TimeDelta::days(3650);
    let mut rows: Vec<(&str, i64)> = (0..100).map(|i| ("/ancient", i)).collect();
    rows.push(("/never-mind", -10));
    let ranked = popular_directories(&dirs(&rows), now, &hourly(), 10);
    assert_eq!(ranked[0].path, "/ancient");
    assert!(ranked[0].score.unwrap() > 4.0);
}

#[test]
fn frecency_ties_prefer_recent_then_path() {
    let now = t(1_000_000);
    // All visits far past the cutoff: every one weighs exactly the floor.
    let visits = dirs(&[("/b", 10), ("/a", 10), ("/c", 20)]);
    let ranked = popular_directories(&visits, now, &hourly(), 10);
    assert_eq!(paths(&ranked), vec!["/c", "/a", "/b"]);
}

#[test]
fn frecency_is_stable_under_row_order() {
    let now = t(50_000);
    let forward = dirs(&[
        ("/x", 100),
        ("/y", 40_000),
        ("/x", 45_000),
        ("/z", 49_000),
        ("/y", 100),
        ("/x", 30_000),
    ]);
    let mut backward = forward.clone();
    backward.reverse();
    let policy = hourly();
    assert_eq!(
        popular_directories(&forward, now, &policy, 10),
        popular_directories(&backward, now, &policy, 10)
    );
}

// --- file_stats ---

#[test]
fn file_stats_counts_in_first_seen_order() {
    let visits = files(&[
        ("/b.mp3", "audio", 3),
        ("/v.mkv", "video", 2),
        ("/a.mp3", "audio", 4),
        ("/c.mp3", "audio", 5),
    ]);
    let stats = file_stats(&visits);
    assert_eq!(stats.total, 4);
    assert_eq!(
        stats.categories,
        vec![
            CategoryCount {
                file_type: FileType::video(),
                count: 1
            },
            CategoryCount {
                file_type: FileType::audio(),
                count: 3
            },
        ]
    );
}

#[test]
fn file_stats_breaks_categories_down_by_action() {
    let visits = file_actions(&[
        ("/a.mp3", "audio", "played", 4),
        ("/v.mkv", "video", "opened", 1),
        ("/a.mp3", "audio", "opened", 2),
        ("/b.mp3", "audio", "played", 3),
    ]);
    let stats = file_stats(&visits);
    let actions: Vec<(&str, &str, u64)> = stats
        .actions
        .iter()
        .map(|a| (a.file_type.as_str(), a.action.as_str(), a.count))
        .collect();
    assert_eq!(
        actions,
        vec![("video", "opened", 1), ("audio", "opened", 1), ("audio", "played", 2)]
    );
    let per_category: u64 = stats.actions.iter().map(|a| a.count).sum();
    assert_eq!(per_category, stats.total);
}

#[test]
fn file_stats_on_empty_history() {
    let stats = file_stats(&[]);
    assert!(stats.categories.is_empty());
    assert!(stats.actions.is_empty());
    assert_eq!(stats.total, 0);
}

// --- search ---

#[test]
fn search_is_case_insensitive_and_keeps_kinds_apart() {
    let d = dirs(&[("/home/Music", 1), ("/home/docs", 2), ("/srv/music", 3)]);
    let f = files(&[("/home/Music", "other", 4), ("/home/music/a.flac", "audio", 5)]);
    let results = search(&d, &f, "MUSIC");

    assert_eq!(paths(&results.directories), vec!["/srv/music", "/home/Music"]);
    assert_eq!(paths(&results.files), vec!["/home/music/a.flac", "/home/Music"]);
    assert!(results.directories.iter().all(|c| c.kind == VisitKind::Directory));
    assert!(results.files.iter().all(|c| c.kind == VisitKind::File));
}

#[test]
fn search_merges_repeat_visits_within_a_kind() {
    let d = dirs(&[("/proj", 1), ("/proj", 2)]);
    let results = search(&d, &[], "proj");
    assert_eq!(results.directories.len(), 1);
    assert_eq!(results.directories[0].visits, 2);
    assert!(results.files.is_empty());
}

#[test]
fn search_without_matches_is_empty() {
    let results = search(&dirs(&[("/a", 1)]), &files(&[("/b", "other", 1)]), "zzz");
    assert!(results.is_empty());
}
