// tests/run_e2e.rs
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use rand::{rngs::StdRng, SeedableRng};

use pulse_scrape::config::consts::{BINI_ID, SB19_ID};
use pulse_scrape::config::RunOptions;
use pulse_scrape::csv::parse_rows;
use pulse_scrape::net::{HttpGet, IdentityProfile, Pause, Response, TransportError};
use pulse_scrape::progress::NullProgress;
use pulse_scrape::record::METHOD_REQUEST_FAILED;
use pulse_scrape::scrape::Runner;
use pulse_scrape::target::{Preset, Target};

const KWORB_SB19: &str = "https://kworb.net/spotify/artist/3g7vYcdDXnqnDKYFwqXBJP_songs.html";

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))).unwrap()
}

/// Serves fixtures by URL; anything unrouted gets the web-player placeholder.
struct Fake {
    routes: HashMap<String, String>,
    placeholder: String,
}

impl Fake {
    fn new(routes: &[(&str, &str)]) -> Self {
        Self {
            routes: routes.iter().map(|(u, f)| (u.to_string(), fixture(f))).collect(),
            placeholder: fixture("web_player.html"),
        }
    }
}

impl HttpGet for Fake {
    fn get(&self, url: &str, _profile: &IdentityProfile, _t: Duration) -> Result<Response, TransportError> {
        Ok(Response::ok(self.routes.get(url).unwrap_or(&self.placeholder).clone()))
    }
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<Duration>>>);

impl Pause for Recorder {
    fn pause(&mut self, d: Duration) {
        self.0.borrow_mut().push(d);
    }
}

fn fixed() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(8, 30, 0).unwrap()
}

fn options(dir: &Path) -> RunOptions {
    RunOptions {
        max_retries: 2,
        output_path: Some(dir.join("out.csv")),
        history_path: Some(dir.join("history.csv")),
        ..Default::default()
    }
}

fn rows(path: &Path) -> Vec<Vec<String>> {
    parse_rows(&fs::read_to_string(path).unwrap(), ',')
}

#[test]
fn every_target_fails_softly_one_record_each() {
    let dir = tempfile::tempdir().unwrap();
    let pauses = Recorder::default();
    let mut runner = Runner::with_parts(Fake::new(&[]), pauses.clone(), StdRng::seed_from_u64(1), options(dir.path()))
        .unwrap()
        .with_clock(fixed);

    let targets = Preset::Both.targets();
    let out = runner.run_listeners(&targets, None).unwrap();

    assert_eq!(out.records.len(), targets.len());
    let ids: Vec<&str> = out.records.iter().map(|r| r.artist_id.as_str()).collect();
    assert_eq!(ids, [SB19_ID, BINI_ID]);
    assert!(out.records.iter().all(|r| r.extraction_method == METHOD_REQUEST_FAILED));
    assert!(out.records.iter().all(|r| r.extra.contains_key("error")));
    assert_eq!((out.summary.successful, out.summary.failed), (0, 2));
    assert!(out.summary.streams.is_none());

    // Every wait went through the injected pause.
    assert!(!pauses.0.borrow().is_empty());

    let written = rows(&dir.path().join("out.csv"));
    assert_eq!(written.len(), 3);
    assert_eq!(written[0].last().map(String::as_str), Some("error"));
}

#[test]
fn falls_through_to_the_embed_page() {
    let dir = tempfile::tempdir().unwrap();
    let embed = format!("https://open.spotify.com/embed/artist/{SB19_ID}");
    let fake = Fake::new(&[(embed.as_str(), "artist_meta.html")]);
    let mut runner = Runner::with_parts(fake, Recorder::default(), StdRng::seed_from_u64(2), options(dir.path()))
        .unwrap()
        .with_clock(fixed);

    let out = runner.run_listeners(&[Target::artist(SB19_ID)], Some(&mut NullProgress)).unwrap();
    let rec = &out.records[0];
    assert_eq!(rec.monthly_listeners, 1_700_000);
    assert_eq!(rec.source_url, embed);
    assert_eq!(rec.artist_id, SB19_ID);
    assert_eq!(rec.scrape_date, "2025-03-10 08:30:00");
    assert_eq!(out.summary.top[0].label, "Foo");
}

#[test]
fn streams_run_appends_and_reports_seen_rows() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Fake::new(&[(KWORB_SB19, "kworb_songs.html")]);
    let mut runner = Runner::with_parts(fake, Recorder::default(), StdRng::seed_from_u64(3), options(dir.path()))
        .unwrap()
        .with_clock(fixed);
    let targets = [Target::songs(KWORB_SB19)];

    let first = runner.run_streams(&targets, None, None).unwrap();
    assert_eq!(first.records.len(), 4);
    assert_eq!(first.summary.dedup.new, 4);
    assert_eq!(first.summary.writes.len(), 2);
    assert_eq!(first.records[0].data_date, "2025-03-09");
    assert_eq!(first.summary.top[0].label, "GENTO (SB19)");
    let stats = first.summary.streams.as_ref().unwrap();
    assert_eq!((stats.songs, stats.with_spotify_id), (4, 4));
    assert_eq!(stats.spotify_id_pct, 100.0);
    assert_eq!(stats.total_streams, 251_307_295);

    let second = runner.run_streams(&targets, Some(2), None).unwrap();
    assert_eq!(second.records.len(), 2);
    assert_eq!((second.summary.dedup.new, second.summary.dedup.duplicate), (0, 2));

    // Seen rows are still written: the store is a time series.
    assert_eq!(rows(&dir.path().join("out.csv")).len(), 1 + 4 + 2);
    assert_eq!(rows(&dir.path().join("history.csv")).len(), 1 + 4 + 2);

    let status = dir.path().join("status.json");
    second.summary.write_json(&status).unwrap();
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&status).unwrap()).unwrap();
    assert_eq!(v["kind"], "streams");
    assert_eq!(v["total_processed"], 2);
    assert_eq!(v["streams"]["total_streams"], 98_765_432u64 + 87_654_321);
}

#[test]
fn history_equal_to_output_is_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(dir.path());
    opts.history_path = opts.output_path.clone();
    let fake = Fake::new(&[(KWORB_SB19, "kworb_songs.html")]);
    let mut runner = Runner::with_parts(fake, Recorder::default(), StdRng::seed_from_u64(4), opts)
        .unwrap()
        .with_clock(fixed);

    let out = runner.run_streams(&[Target::songs(KWORB_SB19)], None, None).unwrap();
    assert_eq!(out.summary.writes.len(), 1);
    assert_eq!(rows(&dir.path().join("out.csv")).len(), 5);
}
