// src/target.rs
//! What to scrape: a stable id plus the URLs to try for it, in order.
use crate::config::consts::{BINI_ID, SB19_ID, SPOTIFY_HOST};
use crate::engine::is_spotify_id;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    /// Spotify artist page; yields one listener record.
    Artist,
    /// kworb.net songs page; yields one stream record per song row.
    Songs,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub id: String,
    pub kind: TargetKind,
    /// Fallback chain; the first endpoint that fetches wins.
    pub urls: Vec<String>,
}

impl Target {
    /// Main page, international page, then the lighter embed page.
    pub fn artist(id: &str) -> Self {
        let urls = ["artist", "intl-en/artist", "embed/artist"]
            .iter()
            .map(|path| format!("https://{SPOTIFY_HOST}/{path}/{id}"))
            .collect();
        Self { id: s!(id), kind: TargetKind::Artist, urls }
    }

    /// Bare 22-char id or any `open.spotify.com/.../artist/<id>` URL.
    pub fn parse_artist(input: &str) -> Option<Self> {
        let input = input.trim();
        if is_spotify_id(input) {
            return Some(Self::artist(input));
        }
        let id = artist_segment(input)?;
        let id: String = id.chars().take_while(char::is_ascii_alphanumeric).collect();
        is_spotify_id(&id).then(|| Self::artist(&id))
    }

    /// kworb songs page, e.g. `https://kworb.net/spotify/artist/<id>_songs.html`.
    /// The id is whatever sits between `/artist/` and the first `_` or `/`.
    pub fn songs(url: &str) -> Self {
        let url = url.trim();
        let id = artist_segment(url)
            .map(|seg| seg.split(['_', '/']).next().unwrap_or_default())
            .unwrap_or_default();
        Self { id: s!(id), kind: TargetKind::Songs, urls: vec![s!(url)] }
    }

    pub fn primary_url(&self) -> &str {
        self.urls.first().map(String::as_str).unwrap_or_default()
    }
}

/// Named artist sets selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Preset {
    Sb19,
    Bini,
    Both,
}

impl Preset {
    pub fn targets(self) -> Vec<Target> {
        let ids: &[&str] = match self {
            Preset::Sb19 => &[SB19_ID],
            Preset::Bini => &[BINI_ID],
            Preset::Both => &[SB19_ID, BINI_ID],
        };
        ids.iter().map(|id| Target::artist(id)).collect()
    }
}

fn artist_segment(url: &str) -> Option<&str> {
    let at = url.find("/artist/")?;
    Some(&url[at + "/artist/".len()..])
}
