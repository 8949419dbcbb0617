// src/summary.rs
//! End-of-run report: counts, method breakdown, top-N ranking, and for stream
//! runs track-id coverage plus combined streams.
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::core::number::group_thousands;
use crate::error::{Error, Result};
use crate::file::ensure_parent;
use crate::record::{StreamRecord, Tabular};
use crate::store::{DedupSplit, WriteReport};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub rank: usize,
    pub label: String,
    pub value: u64,
}

/// Stream-run extras, over the successfully scraped songs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StreamStats {
    pub songs: usize,
    pub with_spotify_id: usize,
    pub spotify_id_pct: f64,
    pub total_streams: u64,
}

impl StreamStats {
    pub fn from_records(records: &[StreamRecord]) -> Self {
        let songs: Vec<&StreamRecord> = records.iter().filter(|r| r.is_successful()).collect();
        let with_spotify_id = songs.iter().filter(|r| r.has_spotify_id).count();
        let spotify_id_pct = if songs.is_empty() { 0.0 } else { with_spotify_id as f64 * 100.0 / songs.len() as f64 };
        let total_streams = songs.iter().fold(0u64, |acc, r| acc.saturating_add(r.total_streams));
        Self { songs: songs.len(), with_spotify_id, spotify_id_pct, total_streams }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    /// `listeners` or `streams`.
    pub kind: String,
    pub targets: usize,
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub methods: BTreeMap<String, usize>,
    pub top: Vec<RankEntry>,
    pub dedup: DedupSplit,
    pub writes: Vec<WriteReport>,
    pub finished_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streams: Option<StreamStats>,
}

impl RunSummary {
    pub fn from_records<R: Tabular>(
        kind: &str,
        targets: usize,
        records: &[R],
        top_n: usize,
        dedup: DedupSplit,
        writes: Vec<WriteReport>,
        finished_at: String,
    ) -> Self {
        let successful = records.iter().filter(|r| r.is_successful()).count();

        let mut methods = BTreeMap::new();
        for r in records {
            *methods.entry(s!(r.extraction_method())).or_insert(0) += 1;
        }

        let mut ranked: Vec<&R> = records.iter().filter(|r| r.is_successful()).collect();
        // Stable: equal metrics keep scrape order.
        ranked.sort_by(|a, b| b.metric().cmp(&a.metric()));
        let top = ranked
            .into_iter()
            .take(top_n)
            .enumerate()
            .map(|(i, r)| RankEntry { rank: i + 1, label: r.label(), value: r.metric() })
            .collect();

        Self {
            kind: s!(kind),
            targets,
            total_processed: records.len(),
            successful,
            failed: records.len() - successful,
            methods,
            top,
            dedup,
            writes,
            finished_at,
            streams: None,
        }
    }

    pub fn with_stream_stats(mut self, stats: StreamStats) -> Self {
        self.streams = Some(stats);
        self
    }

    /// Multi-line report for the log / terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} run: {} target(s), {} record(s)", self.kind, self.targets, self.total_processed);
        let _ = writeln!(out, "  successful: {}/{}", self.successful, self.total_processed);
        let _ = writeln!(out, "  new: {}, already seen: {}", self.dedup.new, self.dedup.duplicate);

        if !self.methods.is_empty() {
            let _ = writeln!(out, "  extraction methods:");
            for (method, n) in &self.methods {
                let _ = writeln!(out, "    {method}: {n}");
            }
        }
        if !self.top.is_empty() {
            let _ = writeln!(out, "  top {}:", self.top.len());
            for e in &self.top {
                let _ = writeln!(out, "    {:>2}. {} - {}", e.rank, e.label, group_thousands(e.value));
            }
        }
        if let Some(st) = &self.streams {
            let _ = writeln!(out, "  with spotify id: {}/{} ({:.1}%)", st.with_spotify_id, st.songs, st.spotify_id_pct);
            let _ = writeln!(out, "  total streams: {}", group_thousands(st.total_streams));
        }
        for w in &self.writes {
            let _ = writeln!(out, "  wrote {} row(s) to {}", w.rows_written, w.path.display());
        }
        out
    }

    /// Status file for an external notifier.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        ensure_parent(path).map_err(|e| Error::persistence(path, e))?;
        std::fs::write(path, json).map_err(|e| Error::persistence(path, e))
    }
}
