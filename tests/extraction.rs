// tests/extraction.rs
use std::fs;

use pulse_scrape::config::consts::SB19_ID;
use pulse_scrape::core::number::parse_count;
use pulse_scrape::engine::{KnownValue, Overrides, KNOWN_EXACT, NOT_FOUND};
use pulse_scrape::specs::{ArtistPageSpec, PageContext, SongsPageSpec};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR")))
        .unwrap_or_else(|e| panic!("fixture {name}: {e}"))
}

fn ctx(url: &str) -> PageContext<'_> {
    PageContext { target_id: "", url }
}

#[test]
fn abbreviated_counts_normalize_exactly() {
    let inputs = ["1.7M", "800K", "2B", "450", "1,234"];
    let got: Vec<u64> = inputs.iter().map(|s| parse_count(s).unwrap()).collect();
    assert_eq!(got, [1_700_000, 800_000, 2_000_000_000, 450, 1_234]);
}

#[test]
fn meta_description_fixture() {
    let spec = ArtistPageSpec::new().unwrap();
    let out = spec.extract(&fixture("artist_meta.html"), ctx("https://open.spotify.com/embed/artist/x"));
    assert_eq!(out.artist_name.value, "Foo");
    assert_eq!(out.monthly_listeners.value, 1_700_000);
    assert_eq!(out.monthly_listeners.source, "meta_description");
    // No id in the URL; the canonical link supplies it.
    assert_eq!((out.artist_id.value.as_str(), out.artist_id.source), (SB19_ID, "og_url"));
}

#[test]
fn labeled_count_outranks_description_and_loose_text() {
    let spec = ArtistPageSpec::new().unwrap();
    let out = spec.extract(&fixture("artist_labeled.html"), ctx(""));
    assert_eq!(out.monthly_listeners.value, 1_977_848);
    assert_eq!(out.monthly_listeners.source, "testid_exact");
    assert_eq!(out.artist_name.value, "BINI");
}

#[test]
fn placeholder_page_yields_sentinels() {
    let spec = ArtistPageSpec::new().unwrap();
    let out = spec.extract(&fixture("web_player.html"), ctx("https://open.spotify.com/"));
    assert_eq!((out.monthly_listeners.value, out.monthly_listeners.source), (0, NOT_FOUND));
    assert_eq!(out.artist_name.source, NOT_FOUND);
}

#[test]
fn override_is_last_word() {
    let spec = ArtistPageSpec::new().unwrap();
    let mut table = Overrides::new();
    table.insert(SB19_ID, KnownValue { monthly_listeners: 1_720_632, artist_name: Some("SB19".into()) });

    let out = spec.extract_with(&fixture("artist_meta.html"), ctx(""), &table);
    assert_eq!(out.monthly_listeners.value, 1_720_632);
    assert_eq!(out.monthly_listeners.source, KNOWN_EXACT);
    assert_eq!(out.artist_name.value, "SB19");
}

#[test]
fn kworb_fixture_rows() {
    let spec = SongsPageSpec::new().unwrap();
    let out = spec.extract(&fixture("kworb_songs.html"), None);

    assert_eq!(out.artist_name.value, "SB19");
    assert_eq!(out.last_updated.value, "2025-03-09");

    let titles: Vec<&str> = out.rows.iter().map(|r| r.song_title.value.as_str()).collect();
    assert_eq!(titles, ["GENTO", "MAPA", "Bazinga", "What?"]);

    let totals: Vec<u64> = out.rows.iter().map(|r| r.total_streams.value).collect();
    assert_eq!(totals, [98_765_432, 87_654_321, 55_010_999, 9_876_543]);

    let daily: Vec<u64> = out.rows.iter().map(|r| r.daily_streams.value).collect();
    assert_eq!(daily, [45_678, 31_002, 20_415, 2_001]);

    assert!(out.rows.iter().all(|r| r.spotify_track_id.is_found()));
}

#[test]
fn kworb_cap() {
    let spec = SongsPageSpec::new().unwrap();
    let out = spec.extract(&fixture("kworb_songs.html"), Some(2));
    assert_eq!(out.rows.len(), 2);
    assert_eq!(out.rows[1].song_title.value, "MAPA");
}
