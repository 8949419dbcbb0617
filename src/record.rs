// src/record.rs
//! Record shapes and the pure builders that fill them.
//!
//! Builders take the fetch timestamp as an argument; nothing here reads the clock
//! or touches the network or disk.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::config::consts::{KWORB_DATA_SOURCE, SPOTIFY_DATA_SOURCE};
use crate::engine::is_spotify_id;
use crate::specs::{ListenerExtraction, SongsExtraction};
use crate::target::Target;

/// Persisted form of `retrieved_at`.
pub const SCRAPE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATA_DATE_FORMAT: &str = "%Y-%m-%d";

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ID: &str = "unknown";

/// `extraction_method` of a record whose fetch exhausted its retries.
pub const METHOD_REQUEST_FAILED: &str = "request_failed";
/// `extraction_method` of a record that could not be built.
pub const METHOD_ERROR: &str = "error";

/// A row-shaped record: fixed core columns, then optional extras.
pub trait Tabular {
    const CORE_COLUMNS: &'static [&'static str];
    /// Columns joined with `_` to form the dedup key.
    const KEY_COLUMNS: &'static [&'static str];

    /// Value of a core column; `None` for names outside `CORE_COLUMNS`.
    fn cell(&self, column: &str) -> Option<String>;
    fn extra(&self) -> &BTreeMap<String, String>;

    /// Core value, else extra value, else empty.
    fn value_of(&self, column: &str) -> String {
        self.cell(column)
            .or_else(|| self.extra().get(column).cloned())
            .unwrap_or_default()
    }

    fn dedup_key(&self) -> String {
        dedup_key_with(Self::KEY_COLUMNS, |c| Some(self.value_of(c)))
    }

    /// The number the summary ranks by.
    fn metric(&self) -> u64;
    /// What the ranking prints next to the metric.
    fn label(&self) -> String;
    fn extraction_method(&self) -> &str;

    fn is_successful(&self) -> bool {
        self.metric() > 0
    }
}

/// Key from arbitrary column lookups (records or rows already on disk).
pub fn dedup_key_with<F>(columns: &[&str], mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let parts: Vec<String> = columns.iter().map(|c| lookup(c).unwrap_or_default()).collect();
    parts.join("_")
}

/* ---------------- Monthly listeners ---------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerRecord {
    pub artist_name: String,
    pub artist_id: String,
    pub monthly_listeners: u64,
    pub monthly_listeners_raw: String,
    pub source_url: String,
    pub scrape_date: String,
    pub data_source: String,
    pub extraction_method: String,
    pub extra: BTreeMap<String, String>,
}

impl Tabular for ListenerRecord {
    const CORE_COLUMNS: &'static [&'static str] = &[
        "artist_name",
        "artist_id",
        "monthly_listeners",
        "monthly_listeners_raw",
        "source_url",
        "scrape_date",
        "data_source",
        "extraction_method",
    ];
    const KEY_COLUMNS: &'static [&'static str] = &["artist_id"];

    fn cell(&self, column: &str) -> Option<String> {
        Some(match column {
            "artist_name" => self.artist_name.clone(),
            "artist_id" => self.artist_id.clone(),
            "monthly_listeners" => self.monthly_listeners.to_string(),
            "monthly_listeners_raw" => self.monthly_listeners_raw.clone(),
            "source_url" => self.source_url.clone(),
            "scrape_date" => self.scrape_date.clone(),
            "data_source" => self.data_source.clone(),
            "extraction_method" => self.extraction_method.clone(),
            _ => return None,
        })
    }

    fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    fn metric(&self) -> u64 {
        self.monthly_listeners
    }

    fn label(&self) -> String {
        self.artist_name.clone()
    }

    fn extraction_method(&self) -> &str {
        &self.extraction_method
    }
}

/// Listener record from an extraction. Without an artist id the attempt becomes an
/// error record; a missing count is kept as `not_found` with `0`.
pub fn build_listener(x: &ListenerExtraction, source_url: &str, at: NaiveDateTime) -> ListenerRecord {
    if !x.artist_id.is_found() {
        return listener_error(UNKNOWN_ID, source_url, at, METHOD_ERROR, "artist id could not be determined");
    }

    let artist_name = if x.artist_name.is_found() { x.artist_name.value.clone() } else { s!(UNKNOWN_ARTIST) };
    ListenerRecord {
        artist_name,
        artist_id: x.artist_id.value.clone(),
        monthly_listeners: x.monthly_listeners.value,
        monthly_listeners_raw: x.monthly_listeners.raw.clone(),
        source_url: s!(source_url),
        scrape_date: at.format(SCRAPE_DATE_FORMAT).to_string(),
        data_source: s!(SPOTIFY_DATA_SOURCE),
        extraction_method: s!(x.monthly_listeners.source),
        extra: BTreeMap::new(),
    }
}

/// Placeholder that records a failed attempt.
pub fn listener_error(artist_id: &str, source_url: &str, at: NaiveDateTime, method: &str, reason: &str) -> ListenerRecord {
    let artist_id = if artist_id.is_empty() { UNKNOWN_ID } else { artist_id };
    ListenerRecord {
        artist_name: s!("Error"),
        artist_id: s!(artist_id),
        monthly_listeners: 0,
        monthly_listeners_raw: s!(),
        source_url: s!(source_url),
        scrape_date: at.format(SCRAPE_DATE_FORMAT).to_string(),
        data_source: s!(SPOTIFY_DATA_SOURCE),
        extraction_method: s!(method),
        extra: BTreeMap::from([(s!("error"), s!(reason))]),
    }
}

/* ---------------- Stream ranks ---------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    None,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::None => "none",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamRecord {
    pub artist_name: String,
    pub artist_id: String,
    pub rank: u32,
    pub song_title: String,
    pub spotify_track_id: String,
    pub total_streams: u64,
    pub daily_streams: u64,
    pub source_url: String,
    /// Date the source says its numbers are from (else the scrape day).
    pub data_date: String,
    pub scrape_date: String,
    /// Whether `data_date` came from the page itself.
    pub data_source_updated: bool,
    pub spotify_url: String,
    pub has_spotify_id: bool,
    pub data_confidence: Confidence,
    pub data_source: String,
    pub extraction_method: String,
    pub extra: BTreeMap<String, String>,
}

impl Tabular for StreamRecord {
    const CORE_COLUMNS: &'static [&'static str] = &[
        "artist_name",
        "artist_id",
        "rank",
        "song_title",
        "spotify_track_id",
        "total_streams",
        "daily_streams",
        "source_url",
        "data_date",
        "scrape_date",
        "data_source_updated",
        "spotify_url",
        "has_spotify_id",
        "data_confidence",
        "data_source",
        "extraction_method",
    ];
    const KEY_COLUMNS: &'static [&'static str] = &["artist_id", "spotify_track_id"];

    fn cell(&self, column: &str) -> Option<String> {
        Some(match column {
            "artist_name" => self.artist_name.clone(),
            "artist_id" => self.artist_id.clone(),
            "rank" => self.rank.to_string(),
            "song_title" => self.song_title.clone(),
            "spotify_track_id" => self.spotify_track_id.clone(),
            "total_streams" => self.total_streams.to_string(),
            "daily_streams" => self.daily_streams.to_string(),
            "source_url" => self.source_url.clone(),
            "data_date" => self.data_date.clone(),
            "scrape_date" => self.scrape_date.clone(),
            "data_source_updated" => flag(self.data_source_updated),
            "spotify_url" => self.spotify_url.clone(),
            "has_spotify_id" => flag(self.has_spotify_id),
            "data_confidence" => s!(self.data_confidence.as_str()),
            "data_source" => self.data_source.clone(),
            "extraction_method" => self.extraction_method.clone(),
            _ => return None,
        })
    }

    fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    fn metric(&self) -> u64 {
        self.total_streams
    }

    fn label(&self) -> String {
        join!(&self.song_title, " (", &self.artist_name, ")")
    }

    fn extraction_method(&self) -> &str {
        &self.extraction_method
    }
}

/// One record per extracted row, ranked in page order. A page without rows, or a
/// target without an artist id, yields a single error record instead.
pub fn build_streams(x: &SongsExtraction, target: &Target, source_url: &str, at: NaiveDateTime) -> Vec<StreamRecord> {
    if target.id.is_empty() {
        return vec![stream_error(target, source_url, at, "artist id could not be determined")];
    }
    if x.rows.is_empty() {
        return vec![stream_error(target, source_url, at, "no song rows found")];
    }

    let artist_name = if x.artist_name.is_found() { x.artist_name.value.clone() } else { s!(UNKNOWN_ARTIST) };
    let page_dated = x.last_updated.is_found();
    let data_date = if page_dated { x.last_updated.value.clone() } else { at.format(DATA_DATE_FORMAT).to_string() };
    let scrape_date = at.format(SCRAPE_DATE_FORMAT).to_string();

    x.rows
        .iter()
        .zip(1u32..)
        .map(|(row, rank)| {
            let track_id = row.spotify_track_id.value.clone();
            let has_spotify_id = is_spotify_id(&track_id);
            let total = row.total_streams.value;
            StreamRecord {
                artist_name: artist_name.clone(),
                artist_id: target.id.clone(),
                rank,
                song_title: row.song_title.value.clone(),
                spotify_url: if has_spotify_id { format!("https://open.spotify.com/track/{track_id}") } else { s!() },
                spotify_track_id: track_id,
                total_streams: total,
                daily_streams: row.daily_streams.value,
                source_url: s!(source_url),
                data_date: data_date.clone(),
                scrape_date: scrape_date.clone(),
                data_source_updated: page_dated,
                has_spotify_id,
                data_confidence: if total > 0 { Confidence::High } else { Confidence::Medium },
                data_source: s!(KWORB_DATA_SOURCE),
                extraction_method: s!(row.total_streams.source),
                extra: BTreeMap::new(),
            }
        })
        .collect()
}

pub fn stream_error(target: &Target, source_url: &str, at: NaiveDateTime, reason: &str) -> StreamRecord {
    let artist_id = if target.id.is_empty() { UNKNOWN_ID } else { target.id.as_str() };
    StreamRecord {
        artist_name: s!("Error"),
        artist_id: s!(artist_id),
        rank: 0,
        song_title: s!(),
        spotify_track_id: s!(),
        total_streams: 0,
        daily_streams: 0,
        source_url: s!(source_url),
        data_date: at.format(DATA_DATE_FORMAT).to_string(),
        scrape_date: at.format(SCRAPE_DATE_FORMAT).to_string(),
        data_source_updated: false,
        spotify_url: s!(),
        has_spotify_id: false,
        data_confidence: Confidence::None,
        data_source: s!(KWORB_DATA_SOURCE),
        extraction_method: s!(METHOD_ERROR),
        extra: BTreeMap::from([(s!("error"), s!(reason))]),
    }
}

// Existing files were written with Python-style booleans.
fn flag(b: bool) -> String {
    s!(if b { "True" } else { "False" })
}
