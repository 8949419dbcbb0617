// src/specs/songs.rs
//! Scraping *spec* for a kworb.net artist songs page (stream ranks).
//!
//! The page is one big table. We walk `<tr>` blocks, skip header/total rows, and
//! run the per-row field tables on each remaining row.
//!
//! Stable row shape: `song_title`, `spotify_track_id` (may be empty),
//! `total_streams`, `daily_streams` (0 when absent).

use chrono::NaiveDate;
use regex::Regex;

use crate::config::consts::{DAILY_STREAMS_MAX, DAILY_STREAMS_MIN, TOTAL_STREAMS_FLOOR};
use crate::core::{html::{clean_text, tag_blocks_ci}, number::parse_count};
use crate::engine::{is_spotify_id, Field, FieldRule};
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongRow {
    pub song_title: Field<String>,
    pub spotify_track_id: Field<String>,
    pub total_streams: Field<u64>,
    pub daily_streams: Field<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongsExtraction {
    pub artist_name: Field<String>,
    /// `YYYY-MM-DD` when the page states it.
    pub last_updated: Field<String>,
    pub rows: Vec<SongRow>,
}

pub struct SongsPageSpec {
    artist_name: FieldRule<String>,
    last_updated: FieldRule<String>,
    song_title: FieldRule<String>,
    spotify_track_id: FieldRule<String>,
    total_streams: FieldRule<u64>,
    daily_streams: FieldRule<u64>,
    grouped: Regex,
}

impl SongsPageSpec {
    pub fn new() -> Result<Self> {
        let artist_name = FieldRule::new("artist_name", |s: &String| !s.is_empty() && s.chars().count() <= 200)
            .then("title", r"(?is)<title[^>]*>\s*([^<]+?)(?:\s+-\s[^<]*)?(?:\s*\|\s*kworb\.net)?\s*</title>", text)?
            .then("heading", r"(?is)<h1[^>]*>(.*?)</h1>", text)?
            .then("artist_class", r#"(?is)<[a-z0-9]+[^>]*class="[^"]*\bartist\b[^"]*"[^>]*>\s*([^<]+?)\s*<"#, text)?;

        let last_updated = FieldRule::new("last_updated", |s: &String| !s.is_empty())
            .then("last_updated_label", r"(?i)last\s+updated:?\s*([0-9]{4}/[0-9]{2}/[0-9]{2})", kworb_date)?
            .then("updated_label", r"(?i)updated:?\s*([0-9]{4}/[0-9]{2}/[0-9]{2})", kworb_date)?;

        let song_title = FieldRule::new("song_title", |s: &String| !s.is_empty())
            .then("first_link", r"(?is)<a[^>]*>([^<]+)</a>", text)?;

        let spotify_track_id = FieldRule::new("spotify_track_id", |s: &String| is_spotify_id(s))
            .then("track_url", r"open\.spotify\.com/track/([A-Za-z0-9]{22})\b", |s| Some(s!(s)))?;

        let total_streams = FieldRule::new("total_streams", |v: &u64| *v > TOTAL_STREAMS_FLOOR)
            .then("cell_exact", r">\s*([0-9][0-9,]*)\s*</td>", parse_count)?
            .then("grouped_number", r">([0-9]{1,3}(?:,[0-9]{3})+)<", parse_count)?
            .then("near_streams", r"(?i)\b([0-9]{1,3}(?:,[0-9]{3})+)\s*streams", parse_count)?;

        let daily_streams = FieldRule::new("daily_streams", |v: &u64| (DAILY_STREAMS_MIN..=DAILY_STREAMS_MAX).contains(v))
            .then("cell_any", r">\s*([0-9][0-9,]*)\s*<", parse_count)?;

        Ok(Self {
            artist_name,
            last_updated,
            song_title,
            spotify_track_id,
            total_streams,
            daily_streams,
            grouped: Regex::new(r"[0-9]+,[0-9]+")?,
        })
    }

    /// Page-level fields plus up to `max_songs` rows in page order.
    pub fn extract(&self, content: &str, max_songs: Option<usize>) -> SongsExtraction {
        let limit = max_songs.unwrap_or(usize::MAX);
        let mut rows = Vec::new();
        let mut skipped = 0usize;

        for tr in tag_blocks_ci(content, "<tr", "</tr>") {
            if rows.len() >= limit {
                break;
            }
            if !self.is_data_row(tr) {
                skipped += 1;
                continue;
            }
            rows.push(self.extract_row(tr));
        }

        logd!(rows = rows.len(), skipped, "songs table walked");
        SongsExtraction {
            artist_name: self.artist_name.evaluate(content),
            last_updated: self.last_updated.evaluate(content),
            rows,
        }
    }

    fn extract_row(&self, tr: &str) -> SongRow {
        let total_streams = self.total_streams.evaluate(tr);
        let total = total_streams.value;
        SongRow {
            song_title: self.song_title.evaluate(tr),
            spotify_track_id: self.spotify_track_id.evaluate(tr),
            daily_streams: self.daily_streams.evaluate_where(tr, |v| *v != total),
            total_streams,
        }
    }

    // Header and total rows carry `<th>`, a "Total"/"Song(s)" cell, or no grouped number.
    fn is_data_row(&self, tr: &str) -> bool {
        if tr.to_ascii_lowercase().contains("<th") || !tr.contains("<a") {
            return false;
        }
        if !self.grouped.is_match(tr) {
            return false;
        }
        !tag_blocks_ci(tr, "<td", "</td>")
            .into_iter()
            .map(clean_text)
            .any(|cell| matches!(cell.as_str(), "Total" | "Song" | "Songs"))
    }
}

fn text(s: &str) -> Option<String> {
    Some(clean_text(s))
}

/// `2025/03/09` -> `2025-03-09`; impossible dates are rejected.
fn kworb_date(s: &str) -> Option<String> {
    NaiveDate::parse_from_str(s, "%Y/%m/%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NOT_FOUND;

    const PAGE: &str = r#"<html><head><title>SB19 - Spotify Top Songs | kworb.net</title></head>
<body><span class="pagetitle">Last updated: 2025/03/09</span>
<table>
<tr><th>Song Title</th><th>Streams</th><th>Daily</th></tr>
<tr><td>Total</td><td>412,345,678</td><td>301,222</td></tr>
<tr><td><div><a href="https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC">GENTO</a></div></td><td>98,765,432</td><td>45,678</td></tr>
<tr><td><div><a href="https://open.spotify.com/track/1ABCDEFGHIJKLMNOPQRSTU">MAPA</a></div></td><td>87,654,321</td><td></td></tr>
<tr><td><div><a href="/other.html">Bazinga &amp; Co</a></div></td><td>12,345</td><td>12,345</td></tr>
</table></body></html>"#;

    #[test]
    fn page_fields() {
        let spec = SongsPageSpec::new().unwrap();
        let out = spec.extract(PAGE, None);
        assert_eq!((out.artist_name.value.as_str(), out.artist_name.source), ("SB19", "title"));
        assert_eq!(out.last_updated.value, "2025-03-09");
        assert_eq!(out.last_updated.source, "last_updated_label");
    }

    #[test]
    fn header_and_total_rows_skipped() {
        let spec = SongsPageSpec::new().unwrap();
        let out = spec.extract(PAGE, None);
        let titles: Vec<&str> = out.rows.iter().map(|r| r.song_title.value.as_str()).collect();
        assert_eq!(titles, ["GENTO", "MAPA", "Bazinga & Co"]);
    }

    #[test]
    fn row_values() {
        let spec = SongsPageSpec::new().unwrap();
        let out = spec.extract(PAGE, None);

        let gento = &out.rows[0];
        assert_eq!(gento.spotify_track_id.value, "4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!((gento.total_streams.value, gento.total_streams.source), (98_765_432, "cell_exact"));
        assert_eq!((gento.daily_streams.value, gento.daily_streams.source), (45_678, "cell_any"));

        // No daily cell: the total is out of the daily range, so nothing qualifies.
        assert_eq!(out.rows[1].daily_streams.source, NOT_FOUND);

        // Daily equal to total is rejected; no track link means no id.
        let odd = &out.rows[2];
        assert_eq!(odd.total_streams.value, 12_345);
        assert_eq!(odd.daily_streams.source, NOT_FOUND);
        assert!(!odd.spotify_track_id.is_found());
    }

    #[test]
    fn max_songs_caps_rows() {
        let spec = SongsPageSpec::new().unwrap();
        assert_eq!(spec.extract(PAGE, Some(1)).rows.len(), 1);
        assert_eq!(spec.extract(PAGE, Some(0)).rows.len(), 0);
    }

    #[test]
    fn impossible_date_rejected() {
        let spec = SongsPageSpec::new().unwrap();
        let out = spec.extract("Last updated: 2025/02/30", None);
        assert_eq!(out.last_updated.source, NOT_FOUND);
        assert_eq!(kworb_date("2024/02/29").as_deref(), Some("2024-02-29"));
    }

    #[test]
    fn song_named_like_header_word_survives() {
        let spec = SongsPageSpec::new().unwrap();
        let doc = r#"<tr><td><a href="x">Love Song</a></td><td>1,234,567</td></tr>"#;
        let out = spec.extract(doc, None);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].song_title.value, "Love Song");
    }
}
