// src/specs/mod.rs
//! # Scraping “specs” module
//!
//! Page-specific extraction tables. Each spec focuses on a single page type and
//! encodes *where the ground truth lives in the markup* and *in which order to trust
//! the places it might be*.
//!
//! ## What lives here
//! - **Priority tables** built on `engine::FieldRule`: one ordered list of named
//!   strategies per field, plus the field's plausibility check.
//! - **Row walking** for tabular pages, using `core::html` tag-block helpers.
//! - **Override application** for artist pages (verified values win outright).
//!
//! ## What does **not** live here
//! - **Fetching, retries, identity rotation** (`net`).
//! - **Record shaping and persistence** (`record`, `store`).
//! - **Pacing and sequencing of targets** (`scrape`).
//!
//! ## Conventions & invariants
//! - Specs never fail on content: a missing field is `Field::not_found()`.
//! - Strategy names are stable; they end up in the `extraction_method` column.
//! - Patterns are compiled once per run (`*Spec::new`), not per page.
//!
//! In short: **`specs` knows how to read the pages.** Other layers decide when to
//! fetch, what to keep, and where to write it.
pub mod artist;
pub mod songs;

pub use artist::{apply_overrides, ArtistPageSpec, ListenerExtraction, PageContext};
pub use songs::{SongRow, SongsExtraction, SongsPageSpec};
