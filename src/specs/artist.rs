// src/specs/artist.rs
//! Scraping *spec* for a Spotify artist page (monthly listeners).
//!
//! Where the number lives changes without notice, so every field is a priority
//! table: labeled test ids and the meta description first, loose "N monthly
//! listeners" text last. The artist id comes from the URL we fetched, falling back
//! to canonical links in the markup.
//!
//! Overrides are applied *after* all strategies ran and replace their result.

use crate::config::consts::{LISTENERS_MAX, LISTENERS_MIN};
use crate::core::{html::clean_text, number::{group_thousands, parse_count}};
use crate::engine::{first_found, is_spotify_id, Field, FieldRule, Overrides, KNOWN_EXACT};
use crate::error::Result;

/// What the page was fetched as: the target's stable id and the URL that answered.
#[derive(Clone, Copy, Debug)]
pub struct PageContext<'a> {
    pub target_id: &'a str,
    pub url: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerExtraction {
    pub artist_id: Field<String>,
    pub artist_name: Field<String>,
    pub monthly_listeners: Field<u64>,
}

pub struct ArtistPageSpec {
    artist_name: FieldRule<String>,
    monthly_listeners: FieldRule<u64>,
    id_from_url: FieldRule<String>,
    id_from_content: FieldRule<String>,
}

impl ArtistPageSpec {
    pub fn new() -> Result<Self> {
        let artist_name = FieldRule::new("artist_name", valid_name)
            .then("title_spotify_suffix", r"(?is)<title[^>]*>\s*([^<|]+?)\s*\|\s*Spotify\s*</title>", text)?
            .then("og_title", r#"(?i)<meta\s+property="og:title"\s+content="([^"]+)""#, text)?
            .then("title_plain", r"(?is)<title[^>]*>\s*([^<]+?)\s*</title>", text)?
            .then("heading", r"(?is)<h1[^>]*>\s*([^<]+?)\s*</h1>", text)?
            .then("json_name", r#""name"\s*:\s*"([^"]+)""#, text)?;

        let monthly_listeners = FieldRule::new("monthly_listeners", |v: &u64| (LISTENERS_MIN..=LISTENERS_MAX).contains(v))
            .then("testid_exact", r#"(?i)data-testid="monthly-listeners-label"[^>]*>\s*([0-9][0-9,]*)\s*monthly\s+listeners"#, parse_count)?
            .then("meta_description", r"(?i)Artist\s*·\s*([0-9][0-9.,]*[KMB]?)\s*monthly\s+listeners", parse_count)?
            .then("json_ld", r#"(?i)"description"\s*:\s*"[^"]*?([0-9][0-9.,]*[KMB]?)\s*monthly\s+listeners"#, parse_count)?
            .then("generic_exact", r"(?i)\b([0-9]{1,3}(?:,[0-9]{3})+|[0-9]+)\s*monthly\s+listeners", parse_count)?
            .then("abbreviated", r"(?i)\b([0-9]+(?:\.[0-9]+)?[KMB])\s*monthly\s+listeners", parse_count)?
            .then("aria_label", r#"(?i)aria-label="[^"]*?([0-9][0-9,]*)\s*monthly\s+listeners"#, parse_count)?
            .then("data_attribute", r#"(?i)monthly[_-]?listeners["']?\s*:\s*["']?([0-9][0-9,]*)"#, parse_count)?;

        let id_from_url = FieldRule::new("artist_id", |s: &String| is_spotify_id(s))
            .then("url_path", r"/artist/([A-Za-z0-9]{22})\b", id)?;

        let id_from_content = FieldRule::new("artist_id", |s: &String| is_spotify_id(s))
            .then("og_url", r#"(?i)<meta\s+property="og:url"\s+content="https?://open\.spotify\.com/(?:[a-z-]+/)?artist/([A-Za-z0-9]{22})\b"#, id)?
            .then("spotify_uri", r"spotify:artist:([A-Za-z0-9]{22})\b", id)?;

        Ok(Self { artist_name, monthly_listeners, id_from_url, id_from_content })
    }

    /// Run every field table against `content`. Never fails; misses are sentinels.
    pub fn extract(&self, content: &str, ctx: PageContext<'_>) -> ListenerExtraction {
        let target_id = if is_spotify_id(ctx.target_id) {
            Field { value: ctx.target_id.to_string(), raw: ctx.target_id.to_string(), source: "target_id" }
        } else {
            Field::not_found()
        };

        let artist_id = first_found([
            self.id_from_url.evaluate(ctx.url),
            target_id,
            self.id_from_content.evaluate(content),
        ]);

        ListenerExtraction {
            artist_id,
            artist_name: self.artist_name.evaluate(content),
            monthly_listeners: self.monthly_listeners.evaluate(content),
        }
    }

    /// `extract`, then the override table.
    pub fn extract_with(&self, content: &str, ctx: PageContext<'_>, overrides: &Overrides) -> ListenerExtraction {
        let mut result = self.extract(content, ctx);
        apply_overrides(&mut result, overrides);
        result
    }

    pub fn listener_strategies(&self) -> Vec<&'static str> {
        self.monthly_listeners.strategy_names()
    }
}

/// Replace (never merge) listener count and name for ids with a verified value.
pub fn apply_overrides(result: &mut ListenerExtraction, overrides: &Overrides) {
    if !result.artist_id.is_found() {
        return;
    }
    let Some(known) = overrides.get(&result.artist_id.value) else { return };

    logd!(artist_id = %result.artist_id.value, was = result.monthly_listeners.value, now = known.monthly_listeners, "override applied");
    result.monthly_listeners = Field {
        value: known.monthly_listeners,
        raw: group_thousands(known.monthly_listeners),
        source: KNOWN_EXACT,
    };
    if let Some(name) = &known.artist_name {
        result.artist_name = Field { value: name.clone(), raw: name.clone(), source: KNOWN_EXACT };
    }
}

fn text(s: &str) -> Option<String> {
    Some(clean_text(s))
}

fn id(s: &str) -> Option<String> {
    Some(s.to_string())
}

fn valid_name(s: &String) -> bool {
    !s.is_empty() && s.chars().count() <= 200 && !s.contains("Spotify")
}
