// src/scrape.rs
//! Run orchestrator: targets in, records out, store written, summary built.
//!
//! Strictly sequential. Each target is fetched, extracted, built and collected
//! before the next one starts; the pacer sleeps between targets.
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::{consts::DESKTOP_SESSIONS, PageKind, RunOptions, WriteMode},
    engine::Overrides,
    error::Result,
    net::{FetchAttempt, HttpGet, Pacer, Pause, ProfilePool, ReqwestClient, ThreadPause, Transport},
    progress::Progress,
    record::{self, ListenerRecord, StreamRecord, Tabular, METHOD_REQUEST_FAILED},
    specs::{ArtistPageSpec, PageContext, SongsPageSpec},
    store::{DedupSplit, HistoricalStore, WriteReport},
    summary::{RunSummary, StreamStats},
    target::Target,
};

/// Records plus what was done with them.
#[derive(Debug)]
pub struct RunOutcome<R> {
    pub records: Vec<R>,
    pub summary: RunSummary,
}

pub struct Runner<C: HttpGet, P: Pause + Clone> {
    transport: Transport<C, P>,
    pacer: Pacer<P>,
    opts: RunOptions,
    overrides: Overrides,
    artist_spec: ArtistPageSpec,
    songs_spec: SongsPageSpec,
    clock: fn() -> NaiveDateTime,
}

impl Runner<ReqwestClient, ThreadPause> {
    /// Real network, real sleeps, entropy-seeded jitter.
    pub fn new(opts: RunOptions) -> Result<Self> {
        let seed = StdRng::from_rng(&mut rand::rng());
        Self::with_parts(ReqwestClient::new()?, ThreadPause, seed, opts)
    }
}

impl<C: HttpGet, P: Pause + Clone> Runner<C, P> {
    pub fn with_parts(client: C, pause: P, mut rng: StdRng, opts: RunOptions) -> Result<Self> {
        opts.validate()?;
        let pool = ProfilePool::build(&mut rng, DESKTOP_SESSIONS);
        let transport = Transport::new(
            client,
            pool,
            opts.retry_policy(),
            opts.soft_failure_rules(),
            opts.timeout(),
            pause.clone(),
            StdRng::from_rng(&mut rng),
        );
        let pacer = Pacer::new(opts.delay_policy(), pause, StdRng::from_rng(&mut rng));
        let artist_spec = ArtistPageSpec::new()?;
        let overrides = opts.overrides();

        logd!(
            sessions = transport.pool().len(),
            overrides = overrides.len(),
            strategies = ?artist_spec.listener_strategies(),
            "runner ready"
        );
        Ok(Self {
            transport,
            pacer,
            overrides,
            opts,
            artist_spec,
            songs_spec: SongsPageSpec::new()?,
            clock: local_now,
        })
    }

    /// Fixed timestamps for reproducible records.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.opts
    }

    /// One listener record per target, in target order. No I/O besides fetching.
    pub fn collect_listeners(
        &mut self,
        targets: &[Target],
        mut progress: Option<&mut dyn Progress>,
    ) -> Vec<ListenerRecord> {
        if let Some(p) = progress.as_deref_mut() {
            p.begin(targets.len());
        }

        let mut records = Vec::with_capacity(targets.len());
        for (i, target) in targets.iter().enumerate() {
            if i > 0 {
                self.pacer.wait();
            }
            if let Some(p) = progress.as_deref_mut() {
                p.log(&format!("[{}/{}] {}", i + 1, targets.len(), target.id));
            }

            let rec = self.listener_for(target);
            if let Some(p) = progress.as_deref_mut() {
                match rec.extra.get("error") {
                    Some(reason) => p.item_failed(&target.id, reason),
                    None => p.item_done(&target.id),
                }
            }
            records.push(rec);
        }

        if let Some(p) = progress.as_deref_mut() {
            p.finish();
        }
        records
    }

    fn listener_for(&mut self, target: &Target) -> ListenerRecord {
        let Some(fetched) = self.fetch_first(target) else {
            return record::listener_error(&target.id, target.primary_url(), (self.clock)(), METHOD_REQUEST_FAILED, "no endpoints");
        };
        let at = (self.clock)();
        match &fetched.body {
            Some(body) => {
                let ctx = PageContext { target_id: &target.id, url: &fetched.url };
                let x = self.artist_spec.extract_with(body, ctx, &self.overrides);
                let rec = record::build_listener(&x, &fetched.url, at);
                logf!(
                    artist = %rec.artist_name,
                    listeners = rec.monthly_listeners,
                    method = %rec.extraction_method,
                    "listeners extracted"
                );
                rec
            }
            None => {
                let reason = fetched.last_error().unwrap_or("all attempts failed");
                loge!(target = %target.id, %reason, "target failed");
                record::listener_error(&target.id, &fetched.url, at, METHOD_REQUEST_FAILED, reason)
            }
        }
    }

    /// Stream-rank records for every target: the song rows of each page, or one
    /// error record for a page that failed or had no rows.
    pub fn collect_streams(
        &mut self,
        targets: &[Target],
        max_songs: Option<usize>,
        mut progress: Option<&mut dyn Progress>,
    ) -> Vec<StreamRecord> {
        if let Some(p) = progress.as_deref_mut() {
            p.begin(targets.len());
        }

        let mut records = Vec::new();
        for (i, target) in targets.iter().enumerate() {
            if i > 0 {
                self.pacer.wait();
            }
            if let Some(p) = progress.as_deref_mut() {
                p.log(&format!("[{}/{}] {}", i + 1, targets.len(), target.primary_url()));
            }

            let batch = self.streams_for(target, max_songs);
            if let Some(p) = progress.as_deref_mut() {
                match batch.first().and_then(|r| r.extra.get("error")) {
                    Some(reason) => p.item_failed(&target.id, reason),
                    None => p.item_done(&target.id),
                }
            }
            records.extend(batch);
        }

        if let Some(p) = progress.as_deref_mut() {
            p.finish();
        }
        records
    }

    fn streams_for(&mut self, target: &Target, max_songs: Option<usize>) -> Vec<StreamRecord> {
        let Some(fetched) = self.fetch_first(target) else {
            return vec![record::stream_error(target, target.primary_url(), (self.clock)(), "no endpoints")];
        };
        let at = (self.clock)();
        match &fetched.body {
            Some(body) => {
                let x = self.songs_spec.extract(body, max_songs);
                let recs = record::build_streams(&x, target, &fetched.url, at);
                logf!(artist = %x.artist_name.value, songs = x.rows.len(), "songs extracted");
                recs
            }
            None => {
                let reason = fetched.last_error().unwrap_or("all attempts failed");
                loge!(target = %target.id, %reason, "target failed");
                vec![record::stream_error(target, &fetched.url, at, reason)]
            }
        }
    }

    // Walk the endpoint chain until one fetch succeeds; the last attempt otherwise.
    // `None` only for a target without URLs.
    fn fetch_first(&mut self, target: &Target) -> Option<FetchAttempt> {
        let mut last = None;
        for (i, url) in target.urls.iter().enumerate() {
            if i > 0 {
                logf!(target = %target.id, next = %url, "endpoint failed, trying next");
                self.pacer.wait();
            }
            let attempt = self.transport.fetch(url);
            if attempt.is_success() {
                return Some(attempt);
            }
            last = Some(attempt);
        }
        last
    }

    /// Collect, persist, summarize: the whole listeners run.
    pub fn run_listeners(&mut self, targets: &[Target], progress: Option<&mut dyn Progress>) -> Result<RunOutcome<ListenerRecord>> {
        let records = self.collect_listeners(targets, progress);
        self.finish("listeners", PageKind::Listeners, targets.len(), records, None)
    }

    pub fn run_streams(
        &mut self,
        targets: &[Target],
        max_songs: Option<usize>,
        progress: Option<&mut dyn Progress>,
    ) -> Result<RunOutcome<StreamRecord>> {
        let records = self.collect_streams(targets, max_songs, progress);
        let stats = StreamStats::from_records(&records);
        self.finish("streams", PageKind::Streams, targets.len(), records, Some(stats))
    }

    fn finish<R: Tabular>(
        &self,
        label: &str,
        kind: PageKind,
        targets: usize,
        records: Vec<R>,
        stats: Option<StreamStats>,
    ) -> Result<RunOutcome<R>> {
        let (dedup, writes) = persist(&self.opts, kind, &records)?;
        let finished_at = (self.clock)().format(record::SCRAPE_DATE_FORMAT).to_string();
        let mut summary = RunSummary::from_records(label, targets, &records, self.opts.top_n, dedup, writes, finished_at);
        if let Some(stats) = stats {
            summary = summary.with_stream_stats(stats);
        }
        for line in summary.render().lines() {
            logf!("{line}");
        }
        Ok(RunOutcome { records, summary })
    }
}

/// Write `records` to the run's destination (per its mode) and, when set, append
/// them to the history file too. Keys are read before anything is written.
pub fn persist<R: Tabular>(opts: &RunOptions, kind: PageKind, records: &[R]) -> Result<(DedupSplit, Vec<WriteReport>)> {
    let output = HistoricalStore::new(opts.output_for(kind));
    let existing = output.load_existing_keys::<R>()?;
    let dedup = HistoricalStore::classify(records, &existing);
    logd!(new = dedup.new, duplicate = dedup.duplicate, "dedup split");

    let mut writes = vec![output.write(records, opts.mode)?];

    if let Some(history) = distinct_history(opts, output.path().to_path_buf()) {
        writes.push(HistoricalStore::new(history).write(records, WriteMode::Append)?);
    }
    Ok((dedup, writes))
}

fn distinct_history(opts: &RunOptions, output: PathBuf) -> Option<PathBuf> {
    opts.history_path.clone().filter(|h| *h != output)
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
