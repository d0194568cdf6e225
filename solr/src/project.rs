use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

use nom::{
    bytes::complete::{tag, take_until},
    character::complete::{char, multispace0},
    combinator,
    error::{ParseError, VerboseError},
    sequence::{self, tuple},
    IResult,
};
use serde::Serialize;

use crate::msbuild;

/// Project or solution folder declared by `Project(...) = ...` line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectItem {
    pub guid: String,
    pub type_guid: String,
    pub name: String,
    /// Path as written in solution
    pub path: String,
    /// Path resolved against solution directory
    pub full_path: PathBuf,
    /// Guid of the folder this item is nested into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl ProjectItem {
    #[must_use]
    pub fn new(
        guid: impl Into<String>,
        type_guid: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        solution_dir: &Path,
    ) -> Self {
        let path = path.into();
        Self {
            guid: guid.into(),
            type_guid: type_guid.into(),
            name: name.into(),
            full_path: make_path(solution_dir, &path),
            path,
            parent: None,
        }
    }

    /// Parses project declaration line. Returns `None` if the line isn't
    /// a declaration at all. Empty fields are kept as is.
    #[must_use]
    pub fn parse(line: &str, solution_dir: &Path) -> Option<Self> {
        let (_, (type_guid, name, path, guid)) =
            declaration::<VerboseError<&str>>(line.trim()).ok()?;
        Some(Self::new(guid, type_guid, name, path, solution_dir))
    }

    #[must_use]
    pub fn is_folder(&self) -> bool {
        msbuild::is_solution_folder(&self.type_guid)
    }

    /// Web site has no project file, its path is a directory or an uri
    #[must_use]
    pub fn is_web_site(&self) -> bool {
        msbuild::is_web_site_project(&self.type_guid)
    }

    #[must_use]
    pub fn type_description(&self) -> &str {
        msbuild::describe_project(&self.type_guid)
    }

    /// Compares guid ignoring case
    #[must_use]
    pub fn has_guid(&self, guid: &str) -> bool {
        self.guid.eq_ignore_ascii_case(guid)
    }
}

fn make_path(dir: &Path, relative: &str) -> PathBuf {
    if relative.contains("://") {
        return PathBuf::from(relative);
    }
    let normalized = relative.replace('\\', MAIN_SEPARATOR_STR);
    dir.join(normalized)
}

fn declaration<'a, E>(input: &'a str) -> IResult<&'a str, (&'a str, &'a str, &'a str, &'a str), E>
where
    E: ParseError<&'a str> + std::fmt::Debug,
{
    let head = sequence::delimited(
        tag("Project(\""),
        take_until("\""),
        tuple((tag("\")"), multispace0, char('='), multispace0)),
    );
    let parser = tuple((head, quoted, comma, quoted, comma, quoted));
    combinator::map(parser, |(type_guid, name, _, path, _, guid)| {
        (type_guid, name, path, guid)
    })(input)
}

fn quoted<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str> + std::fmt::Debug,
{
    sequence::delimited(char('"'), take_until("\""), char('"'))(input)
}

fn comma<'a, E>(input: &'a str) -> IResult<&'a str, char, E>
where
    E: ParseError<&'a str> + std::fmt::Debug,
{
    sequence::delimited(multispace0, char(','), multispace0)(input)
}
