//! Directory scanning: find session files, read them in overlapping batches and
//! feed each session through the classifier into one aggregate.

use crate::aggregate::{Scope, SummaryAggregate};
use crate::error::ScanError;
use crate::parse::{parse_kills, parse_stats};
use crate::session::{SessionId, SessionRecord};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

pub const STATS_SUFFIX: &str = "_stats.xml";
pub const KILLS_SUFFIX: &str = "_kills.xml";
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub scope: Scope,
    pub batch_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            scope: Scope::All,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Raw documents for one session, as read from disk.
#[derive(Debug, Clone)]
struct LoadedSession {
    id: SessionId,
    stats: String,
    kills: Option<String>,
}

async fn session_ids(dir: &Path) -> Result<Vec<SessionId>, ScanError> {
    let read_dir_err = |source| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_err)?;

    let mut ids = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(id) = name.strip_suffix(STATS_SUFFIX) {
            if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                ids.push(id.to_string());
            }
        }
    }
    ids.sort();
    Ok(ids)
}

/// Sessions in `dir` whose identifier falls inside `scope`, oldest first.
pub async fn list_sessions(dir: &Path, scope: Scope) -> Result<Vec<SessionId>, ScanError> {
    let mut ids = session_ids(dir).await?;
    ids.retain(|id| scope.includes_id(id));
    Ok(ids)
}

/// Number of session files per four-digit year prefix.
pub async fn prescan_years(dir: &Path) -> Result<BTreeMap<i32, usize>, ScanError> {
    let mut years = BTreeMap::new();
    for id in session_ids(dir).await? {
        let Some(prefix) = id.get(..4) else {
            continue;
        };
        if !prefix.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if let Ok(year) = prefix.parse::<i32>() {
            *years.entry(year).or_insert(0) += 1;
        }
    }
    Ok(years)
}

async fn load_session(dir: PathBuf, id: SessionId) -> Option<LoadedSession> {
    let stats_path = dir.join(format!("{id}{STATS_SUFFIX}"));
    let stats = match tokio::fs::read_to_string(&stats_path).await {
        Ok(text) => text,
        Err(err) => {
            log::debug!("skipping session {id}: {err}");
            return None;
        }
    };

    let kills_path = dir.join(format!("{id}{KILLS_SUFFIX}"));
    let kills = match tokio::fs::read_to_string(&kills_path).await {
        Ok(text) => Some(text),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => {
            log::warn!("ignoring kill breakdown for {id}: {err}");
            None
        }
    };

    Some(LoadedSession { id, stats, kills })
}

/// Classify one session's documents and fold it in.
/// Returns `false` when the stats document has no root record.
pub fn ingest_documents(
    agg: &mut SummaryAggregate,
    id: &str,
    stats_xml: &str,
    kills_xml: Option<&str>,
) -> bool {
    let Some(raw) = parse_stats(stats_xml) else {
        log::debug!("skipping session {id}: no <stats> record");
        return false;
    };
    let kills = kills_xml.map(parse_kills);
    agg.ingest(&SessionRecord::classify(id, &raw, kills));
    true
}

/// Scan `dir` and return the filled aggregate.
///
/// Sessions are read `batch_size` at a time; reads inside a batch overlap and
/// complete in any order, but each batch is ingested in identifier order once
/// it has fully arrived. Only failing to list the directory is an error;
/// unreadable or malformed sessions are skipped.
///
/// With `Scope::Year`, files from other years are never read, so totals and
/// records cover that year only, not just the time histograms.
pub async fn scan_directory<F>(
    dir: &Path,
    options: ScanOptions,
    mut on_progress: F,
) -> Result<SummaryAggregate, ScanError>
where
    F: FnMut(usize, usize),
{
    let ids = list_sessions(dir, options.scope).await?;
    let total = ids.len();
    let mut agg = SummaryAggregate::new(options.scope);
    let mut processed = 0;
    let mut skipped = 0;

    for batch in ids.chunks(options.batch_size.max(1)) {
        let mut tasks = JoinSet::new();
        for id in batch {
            tasks.spawn(load_session(dir.to_path_buf(), id.clone()));
        }

        let mut loaded = Vec::with_capacity(batch.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(session)) => loaded.push(session),
                Ok(None) => skipped += 1,
                Err(err) => {
                    log::warn!("session loader failed: {err}");
                    skipped += 1;
                }
            }
        }
        loaded.sort_by(|a, b| a.id.cmp(&b.id));

        for session in &loaded {
            if !ingest_documents(&mut agg, &session.id, &session.stats, session.kills.as_deref()) {
                skipped += 1;
            }
        }

        processed += batch.len();
        log::info!("parsed {processed}/{total} sessions");
        on_progress(processed, total);
    }

    log::info!(
        "scan of {} complete: {} sessions ingested, {} skipped",
        dir.display(),
        agg.total_sessions,
        skipped
    );
    Ok(agg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[tokio::test]
    async fn prescan_counts_years() {
        let dir = tempdir().unwrap();
        write(dir.path(), "20240101-000000_stats.xml", "<stats/>");
        write(dir.path(), "20250101-000000_stats.xml", "<stats/>");
        write(dir.path(), "20250102-000000_stats.xml", "<stats/>");
        write(dir.path(), "20250102-000000_kills.xml", "<kill_map/>");
        write(dir.path(), "notes_stats.xml", "<stats/>");

        let years = prescan_years(dir.path()).await.unwrap();
        assert_eq!(years.get(&2024), Some(&1));
        assert_eq!(years.get(&2025), Some(&2));
        assert_eq!(years.len(), 2);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = scan_directory(&missing, ScanOptions::default(), |_, _| {})
            .await
            .unwrap_err();
        assert_matches!(err, ScanError::ReadDir { .. });
    }

    #[tokio::test]
    async fn malformed_sessions_are_skipped() {
        let dir = tempdir().unwrap();
        write(dir.path(), "20250101-000000_stats.xml", r#"<stats playtime="300" dead="1"/>"#);
        write(dir.path(), "20250102-000000_stats.xml", "not xml at all");

        let mut calls = Vec::new();
        let options = ScanOptions {
            batch_size: 1,
            ..ScanOptions::default()
        };
        let agg = scan_directory(dir.path(), options, |done, total| calls.push((done, total)))
            .await
            .unwrap();
        assert_eq!(agg.total_sessions, 1);
        assert_eq!(calls, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn ingest_documents_reads_companion() {
        let mut agg = SummaryAggregate::default();
        let kills = r#"<kill_map><E key="pollen" value="3"/></kill_map>"#;
        assert!(ingest_documents(&mut agg, "20250101-000000", "<stats/>", Some(kills)));
        assert!(!ingest_documents(&mut agg, "20250101-000001", "", None));
        assert_eq!(agg.total_fodder_killed, 3);
        assert_eq!(agg.total_sessions, 1);
    }
}
