// src/engine/mod.rs
//! Strategy engine: ordered, independent matchers per field.
//!
//! Page-specific tables live in `specs`; this module only knows how to run them.
mod engine;
mod types;

pub use engine::{first_found, FieldRule, Strategy};
pub use types::{Field, KnownValue, Overrides, KNOWN_EXACT, NOT_FOUND};

use crate::config::consts::SPOTIFY_ID_LEN;
use crate::core::sanitize::is_alnum_of_len;

/// Spotify artist/track id shape: 22 base-62 characters.
pub fn is_spotify_id(s: &str) -> bool {
    is_alnum_of_len(s, SPOTIFY_ID_LEN)
}
