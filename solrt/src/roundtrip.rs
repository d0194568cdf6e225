use std::collections::HashMap;
use std::fmt::{self, Display};
use std::fs;
use std::path::{Path, PathBuf};

use crossterm::style::Stylize;
use solr::{SlnError, SlnWriter, Solution};

use crate::Consume;

/// Outcome of re-emitting single solution without any writer
#[derive(Debug, PartialEq, Eq)]
pub enum Verdict {
    Identical,
    /// One based number of the first line that differs
    Differs(usize),
    Failed(String),
}

/// Checks that solutions are written back byte for byte
#[derive(Default)]
pub struct Roundtrip {
    results: Vec<(PathBuf, Verdict)>,
}

impl Roundtrip {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn all_identical(&self) -> bool {
        self.results.iter().all(|(_, v)| *v == Verdict::Identical)
    }
}

/// Writes all sections of the solution into memory
pub fn emit(solution: &Solution) -> Result<Vec<u8>, SlnError> {
    let mut writer = SlnWriter::for_solution(Vec::new(), HashMap::new(), solution);
    writer.write(solution.map())?;
    Ok(writer.into_inner().unwrap_or_default())
}

#[must_use]
pub fn compare(original: &[u8], written: &[u8]) -> Verdict {
    if original == written {
        return Verdict::Identical;
    }
    let line = original
        .iter()
        .zip(written)
        .take_while(|(a, b)| a == b)
        .filter(|(a, _)| **a == b'\n')
        .count();
    Verdict::Differs(line + 1)
}

impl Consume for Roundtrip {
    fn ok(&mut self, path: &Path, solution: &Solution) {
        let verdict = match (fs::read(path), emit(solution)) {
            (Ok(original), Ok(written)) => compare(&original, &written),
            (Err(e), _) => Verdict::Failed(e.to_string()),
            (_, Err(e)) => Verdict::Failed(e.to_string()),
        };
        self.results.push((path.to_path_buf(), verdict));
    }

    fn err(&mut self, path: &Path, error: &miette::Report) {
        self.results
            .push((path.to_path_buf(), Verdict::Failed(error.to_string())));
    }
}

impl Display for Roundtrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (path, verdict) in &self.results {
            let path = path.display().to_string();
            match verdict {
                Verdict::Identical => writeln!(f, " {} {path}", "identical".green())?,
                Verdict::Differs(line) => {
                    writeln!(f, " {} {path} at line {line}", "differs".red().bold())?;
                }
                Verdict::Failed(e) => writeln!(f, " {} {path}: {e}", "failed".dark_red())?,
            }
        }
        Ok(())
    }
}
