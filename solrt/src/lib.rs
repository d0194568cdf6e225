#![warn(unused_extern_crates)]
#![allow(clippy::missing_errors_doc)]
pub mod info;
pub mod json;
pub mod remove;
pub mod roundtrip;
pub mod ux;

use std::path::Path;

use crossterm::style::Stylize;
use solr::Solution;

#[cfg(test)] // <-- not needed in integration tests
extern crate rstest;

/// Consume provides parsed [`Solution`] consumer
pub trait Consume {
    /// Called in case of success parsing
    fn ok(&mut self, path: &Path, solution: &Solution);
    /// Called on error
    fn err(&mut self, path: &Path, error: &miette::Report);
}

/// Parses solution file and passes it to the consumer specified.
/// Returns whether the file was parsed.
pub fn scan_file<C: Consume>(path: &Path, consumer: &mut C) -> bool {
    match solr::parse_file(path) {
        Ok(solution) => {
            consumer.ok(path, &solution);
            true
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), "Solution not parsed");
            consumer.err(path, &e);
            false
        }
    }
}

pub fn print_error(path: &Path, error: &miette::Report) {
    eprintln!("Error parsing {} solution", path.display().to_string().red());
    eprintln!("{error:?}");
}
