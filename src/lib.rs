// src/lib.rs

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod net;
pub mod specs;

pub mod csv;
pub mod file;
pub mod progress;
pub mod record;
pub mod scrape;
pub mod store;
pub mod summary;
pub mod target;

pub use error::{Error, Result};
