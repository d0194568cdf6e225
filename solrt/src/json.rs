use std::fmt::{self, Display};
use std::path::Path;

use serde::Serialize;
use solr::Solution;

use crate::Consume;

/// Model of one solution with the facts `info` derives from it
#[derive(Serialize)]
struct Entry<'a> {
    path: String,
    default_config: Option<String>,
    undeclared_configs: Vec<String>,
    solution: &'a Solution,
}

#[derive(Serialize)]
struct Failure {
    path: String,
    error: String,
}

#[derive(Default, Serialize)]
struct Document {
    solutions: Vec<serde_json::Value>,
    errors: Vec<Failure>,
}

/// Collects solutions into single JSON document
pub struct Json {
    document: Document,
    pretty: bool,
}

impl Json {
    #[must_use]
    pub fn new(pretty: bool) -> Self {
        Self {
            document: Document::default(),
            pretty,
        }
    }

    #[must_use]
    pub fn errors(&self) -> usize {
        self.document.errors.len()
    }
}

impl Consume for Json {
    fn ok(&mut self, path: &Path, solution: &Solution) {
        let entry = Entry {
            path: path.display().to_string(),
            default_config: solution.default_config().map(ToString::to_string),
            undeclared_configs: solution
                .undeclared_configs()
                .map(ToString::to_string)
                .collect(),
            solution,
        };
        match serde_json::to_value(entry) {
            Ok(v) => self.document.solutions.push(v),
            Err(e) => tracing::error!(error = %e, "Solution cannot be serialized"),
        }
    }

    fn err(&mut self, path: &Path, error: &miette::Report) {
        self.document.errors.push(Failure {
            path: path.display().to_string(),
            error: format!("{error:#}"),
        });
    }
}

impl Display for Json {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = if self.pretty {
            serde_json::to_string_pretty(&self.document)
        } else {
            serde_json::to_string(&self.document)
        };
        writeln!(f, "{}", s.map_err(|_| fmt::Error)?)
    }
}
