// src/store.rs
//! Append-only CSV history.
//!
//! Rows on disk are never rewritten. The header is written once, when the file is
//! created (or found empty); later batches line up with it and put columns the
//! file has never seen at the end.
//!
//! Those trailing columns are positional. The header never learns their names, so
//! every batch lays its unnamed extras out from the same slot, sorted by name. A
//! batch whose extras differ from an earlier batch's will share slots with them.
//! Records only carry `error` today, so the slot is stable.

use std::{
    collections::{BTreeSet, HashSet},
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::config::consts::STORE_SEP;
use crate::config::WriteMode;
use crate::csv::{first_row, parse_rows};
use crate::error::{Error, Result};
use crate::file::{append_rows, read_if_exists, write_rows_atomic};
use crate::record::{dedup_key_with, Tabular};

/// What one write did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub path: PathBuf,
    pub rows_written: usize,
    pub header_written: bool,
    pub columns: Vec<String>,
}

/// New vs already-seen records. Diagnostic only: both halves are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DedupSplit {
    pub new: usize,
    pub duplicate: usize,
}

pub struct HistoricalStore {
    path: PathBuf,
}

impl HistoricalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dedup keys of every existing row. Missing or empty store: empty set.
    pub fn load_existing_keys<R: Tabular>(&self) -> Result<HashSet<String>> {
        let Some(text) = self.read()? else { return Ok(HashSet::new()) };
        let mut rows = parse_rows(&text, STORE_SEP).into_iter();
        let Some(header) = rows.next() else { return Ok(HashSet::new()) };

        let idx: Vec<Option<usize>> = R::KEY_COLUMNS
            .iter()
            .map(|k| header.iter().position(|h| h == k))
            .collect();

        let keys: HashSet<String> = rows
            .map(|row| {
                let mut parts = idx.iter();
                dedup_key_with(R::KEY_COLUMNS, |_| {
                    parts.next().copied().flatten().and_then(|i| row.get(i).cloned())
                })
            })
            .collect();
        logd!(path = %self.path.display(), keys = keys.len(), "existing keys loaded");
        Ok(keys)
    }

    /// Split `records` against `existing` keys.
    pub fn classify<R: Tabular>(records: &[R], existing: &HashSet<String>) -> DedupSplit {
        let duplicate = records.iter().filter(|r| existing.contains(&r.dedup_key())).count();
        DedupSplit { new: records.len() - duplicate, duplicate }
    }

    /// Append every record. Header only when the file is missing or empty.
    pub fn append<R: Tabular>(&self, records: &[R]) -> Result<WriteReport> {
        let existing_header = self.read_header()?;
        let header_written = existing_header.is_none();
        let columns = columns_for(existing_header.as_deref(), records);

        if records.is_empty() && !header_written {
            return Ok(WriteReport { path: self.path.clone(), rows_written: 0, header_written, columns });
        }

        let rows = to_rows(&columns, records);
        let header = header_written.then_some(columns.as_slice());
        append_rows(&self.path, header, &rows, STORE_SEP).map_err(|e| Error::persistence(&self.path, e))?;

        logf!(path = %self.path.display(), rows = rows.len(), header_written, "appended");
        Ok(WriteReport { path: self.path.clone(), rows_written: rows.len(), header_written, columns })
    }

    /// Replace the file with exactly `records`.
    pub fn overwrite<R: Tabular>(&self, records: &[R]) -> Result<WriteReport> {
        let columns = columns_for(None, records);
        let rows = to_rows(&columns, records);
        write_rows_atomic(&self.path, &columns, &rows, STORE_SEP).map_err(|e| Error::persistence(&self.path, e))?;

        logf!(path = %self.path.display(), rows = rows.len(), "overwritten");
        Ok(WriteReport { path: self.path.clone(), rows_written: rows.len(), header_written: true, columns })
    }

    pub fn write<R: Tabular>(&self, records: &[R], mode: WriteMode) -> Result<WriteReport> {
        match mode {
            WriteMode::Append => self.append(records),
            WriteMode::Overwrite => self.overwrite(records),
        }
    }

    fn read(&self) -> Result<Option<String>> {
        read_if_exists(&self.path).map_err(|e| Error::persistence(&self.path, e))
    }

    // `None` for a missing file or one with no content.
    fn read_header(&self) -> Result<Option<Vec<String>>> {
        Ok(self
            .read()?
            .and_then(|text| first_row(&text, STORE_SEP))
            .filter(|h| h.iter().any(|c| !c.is_empty())))
    }
}

/// Column order for a batch: the file's header as-is, then core columns it lacks,
/// then the batch's extra columns it lacks, sorted.
///
/// Extras missing from `existing` are placed by position only; rows already on
/// disk past the header's width are not consulted.
pub fn columns_for<R: Tabular>(existing: Option<&[String]>, records: &[R]) -> Vec<String> {
    let mut columns: Vec<String> = existing.map(<[String]>::to_vec).unwrap_or_default();
    let mut seen: HashSet<String> = columns.iter().cloned().collect();

    for core in R::CORE_COLUMNS {
        if seen.insert(s!(*core)) {
            columns.push(s!(*core));
        }
    }
    let extras: BTreeSet<&String> = records.iter().flat_map(|r| r.extra().keys()).collect();
    for extra in extras {
        if seen.insert(extra.clone()) {
            columns.push(extra.clone());
        }
    }
    columns
}

fn to_rows<R: Tabular>(columns: &[String], records: &[R]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|r| columns.iter().map(|c| r.value_of(c)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{listener_error, ListenerRecord, METHOD_REQUEST_FAILED};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::fs;

    fn rec(id: &str, n: u64) -> ListenerRecord {
        ListenerRecord {
            artist_name: s!("A"),
            artist_id: s!(id),
            monthly_listeners: n,
            monthly_listeners_raw: n.to_string(),
            source_url: s!("u"),
            scrape_date: s!("2025-03-10 00:00:00"),
            data_source: s!("spotify.com"),
            extraction_method: s!("testid_exact"),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn existing_header_order_is_kept() {
        let existing = vec![s!("artist_id"), s!("artist_name"), s!("legacy")];
        let cols = columns_for(Some(&existing), &[rec("x", 1)]);
        assert_eq!(&cols[..3], &existing[..]);
        assert_eq!(cols.len(), 3 + ListenerRecord::CORE_COLUMNS.len() - 2);
    }

    #[test]
    fn extras_go_last_sorted() {
        let mut r = rec("x", 1);
        r.extra.insert(s!("zeta"), s!("z"));
        r.extra.insert(s!("alpha"), s!("a"));
        let cols = columns_for(None, &[r]);
        assert_eq!(&cols[cols.len() - 2..], ["alpha", "zeta"]);
    }

    #[test]
    fn empty_file_gets_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ml.csv");
        fs::write(&path, "").unwrap();
        let report = HistoricalStore::new(&path).append(&[rec("x", 1)]).unwrap();
        assert!(report.header_written);
    }

    #[test]
    fn error_column_joins_later() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoricalStore::new(dir.path().join("ml.csv"));
        store.append(&[rec("x", 1)]).unwrap();

        let at = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let err = listener_error("y", "u", at, METHOD_REQUEST_FAILED, "timed out");
        let report = store.append(&[err]).unwrap();
        assert!(!report.header_written);
        assert_eq!(report.columns.last().map(String::as_str), Some("error"));

        let text = fs::read_to_string(store.path()).unwrap();
        let rows = parse_rows(&text, ',');
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), ListenerRecord::CORE_COLUMNS.len());
        assert_eq!(rows[2].last().map(String::as_str), Some("timed out"));
    }

    #[test]
    fn repeated_error_batches_share_one_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoricalStore::new(dir.path().join("ml.csv"));
        store.append(&[rec("x", 1)]).unwrap();

        let at = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(0, 0, 0).unwrap();
        for (id, msg) in [("y", "timed out"), ("z", "blocked")] {
            let report = store.append(&[listener_error(id, "u", at, METHOD_REQUEST_FAILED, msg)]).unwrap();
            assert_eq!(report.columns.len(), ListenerRecord::CORE_COLUMNS.len() + 1);
        }

        let rows = parse_rows(&fs::read_to_string(store.path()).unwrap(), ',');
        let width = ListenerRecord::CORE_COLUMNS.len() + 1;
        assert_eq!(rows[0].len(), ListenerRecord::CORE_COLUMNS.len());
        assert_eq!((rows[2].len(), rows[3].len()), (width, width));
        assert_eq!(rows[2][width - 1], "timed out");
        assert_eq!(rows[3][width - 1], "blocked");
    }

    #[test]
    fn classify_counts_seen_keys() {
        let existing: HashSet<String> = [s!("x")].into();
        let split = HistoricalStore::classify(&[rec("x", 1), rec("y", 2), rec("x", 3)], &existing);
        assert_eq!(split, DedupSplit { new: 1, duplicate: 2 });
    }
}
