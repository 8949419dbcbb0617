// src/cli.rs
//! Command-line front end. Flags override the TOML file, which overrides defaults.
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::config::{RunOptions, WriteMode};
use crate::error::{Error, Result};
use crate::log;
use crate::progress::Progress;
use crate::scrape::Runner;
use crate::target::{Preset, Target};

#[derive(Parser, Debug)]
#[command(name = "pulse_scrape", version, about = "Scrape artist monthly listeners and stream counts into CSV history")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// TOML config file (all keys optional)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Attempt cap per endpoint
    #[arg(long, global = true, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Base delay between targets, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub base_delay: Option<f64>,

    /// Destination CSV
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also append the batch to this historical CSV
    #[arg(long, global = true, value_name = "FILE")]
    pub history: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    pub mode: Option<WriteMode>,

    /// Write the run summary as JSON
    #[arg(long, global = true, value_name = "FILE")]
    pub status_file: Option<PathBuf>,

    /// Ranking length in the summary
    #[arg(long, global = true, value_name = "N")]
    pub top: Option<usize>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Monthly listeners from Spotify artist pages
    Listeners {
        /// Artist id or open.spotify.com artist URL (repeatable)
        #[arg(long = "artist", value_name = "ID|URL")]
        artists: Vec<String>,

        #[arg(long, value_enum)]
        preset: Option<Preset>,
    },
    /// Per-song stream counts from kworb.net songs pages
    Streams {
        /// kworb songs page URL (repeatable)
        #[arg(long = "url", value_name = "KWORB_URL", required = true)]
        urls: Vec<String>,

        #[arg(long, value_name = "N")]
        max_songs: Option<usize>,
    },
}

impl GlobalArgs {
    /// Defaults, then the config file, then these flags.
    pub fn resolve(&self) -> Result<RunOptions> {
        let mut opts = match &self.config {
            Some(path) => RunOptions::load(path)?,
            None => RunOptions::default(),
        };
        if let Some(v) = self.max_retries { opts.max_retries = v; }
        if let Some(v) = self.base_delay { opts.base_delay = v; }
        if let Some(v) = &self.output { opts.output_path = Some(v.clone()); }
        if let Some(v) = &self.history { opts.history_path = Some(v.clone()); }
        if let Some(v) = self.mode { opts.mode = v; }
        if let Some(v) = self.top { opts.top_n = v; }
        opts.validate()?;
        Ok(opts)
    }
}

/// Listener targets from explicit ids/URLs plus an optional preset; the SB19+BINI
/// preset when neither is given.
pub fn listener_targets(artists: &[String], preset: Option<Preset>) -> Result<Vec<Target>> {
    let mut targets = Vec::new();
    for a in artists {
        let t = Target::parse_artist(a).ok_or_else(|| Error::Config(format!("not an artist id or URL: {a}")))?;
        targets.push(t);
    }
    match preset {
        Some(p) => targets.extend(p.targets()),
        None if targets.is_empty() => targets.extend(Preset::Both.targets()),
        None => {}
    }
    Ok(targets)
}

/// Prints one line per target to stderr.
struct ConsoleProgress {
    total: usize,
    done: usize,
    failed: usize,
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        eprintln!("Scraping {total} target(s)...");
    }
    fn log(&mut self, msg: &str) {
        eprintln!("{msg}");
    }
    fn item_done(&mut self, id: &str) {
        self.done += 1;
        eprintln!("  ok      {id}");
    }
    fn item_failed(&mut self, id: &str, reason: &str) {
        self.failed += 1;
        eprintln!("  FAILED  {id}: {reason}");
    }
    fn finish(&mut self) {
        eprintln!("Done: {}/{} ok, {} failed", self.done, self.total, self.failed);
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    log::init(cli.global.verbose, Some(Path::new(log::LOG_FILE)));

    let opts = cli.global.resolve()?;
    let mut runner = Runner::new(opts)?;
    let mut progress = ConsoleProgress { total: 0, done: 0, failed: 0 };

    let summary = match &cli.command {
        Command::Listeners { artists, preset } => {
            let targets = listener_targets(artists, *preset)?;
            runner.run_listeners(&targets, Some(&mut progress))?.summary
        }
        Command::Streams { urls, max_songs } => {
            let targets: Vec<Target> = urls.iter().map(|u| Target::songs(u)).collect();
            runner.run_streams(&targets, *max_songs, Some(&mut progress))?.summary
        }
    };

    print!("{}", summary.render());
    if let Some(path) = &cli.global.status_file {
        summary.write_json(path)?;
    }
    Ok(())
}
