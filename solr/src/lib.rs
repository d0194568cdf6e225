/*!
A library for parsing Microsoft Visual Studio solution files and writing
them back byte for byte.

Every line of a solution becomes a [`Section`]. Lines recognized by a
handler carry a reference to it and feed the typed [`Solution`] model,
all other lines are kept verbatim. [`SlnWriter`] re-emits sections,
replacing blocks for which a writer was registered.

## Example: parsing solution from [&str]

```
use solr::{SlnItems, SlnParser};

const SOLUTION: &str = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "bench", "bench\bench.csproj", "{A61CD222-0F3B-47B6-9F7F-25D658368EEC}"
EndProject
Global
    GlobalSection(SolutionConfigurationPlatforms) = preSolution
        Debug|Any CPU = Debug|Any CPU
        Release|Any CPU = Release|Any CPU
    EndGlobalSection
    GlobalSection(ProjectConfigurationPlatforms) = postSolution
        {A61CD222-0F3B-47B6-9F7F-25D658368EEC}.Debug|Any CPU.ActiveCfg = Debug|Any CPU
        {A61CD222-0F3B-47B6-9F7F-25D658368EEC}.Debug|Any CPU.Build.0 = Debug|Any CPU
        {A61CD222-0F3B-47B6-9F7F-25D658368EEC}.Release|Any CPU.ActiveCfg = Release|Any CPU
        {A61CD222-0F3B-47B6-9F7F-25D658368EEC}.Release|Any CPU.Build.0 = Release|Any CPU
    EndGlobalSection
EndGlobal
"#;

let mut parser = SlnParser::new();
let solution = parser.parse_str(SOLUTION, SlnItems::SOLUTION_DEFAULTS);
assert_eq!(solution.project_items().len(), 1);
assert_eq!(solution.solution_configs().count(), 2);
assert_eq!(solution.header().format_version, "12.00");
```

## Example: writing solution back

```
use std::collections::HashMap;
use solr::{SlnItems, SlnParser, SlnWriter};

let content = "Global\r\n\tGlobalSection(SolutionProperties) = preSolution\r\n\tEndGlobalSection\r\nEndGlobal\r\n";
let solution = SlnParser::new().parse_str(content, SlnItems::ALL);

let mut writer = SlnWriter::for_solution(Vec::new(), HashMap::new(), &solution);
writer.write(solution.map()).unwrap();
assert_eq!(writer.into_inner().unwrap(), content.as_bytes());
```
*/

#![warn(unused_extern_crates)]
#![allow(clippy::missing_errors_doc)]
use std::collections::HashMap;
use std::path::Path;

use miette::{Result, WrapErr};

pub mod api;
pub mod config;
mod error;
pub mod folder;
pub mod handlers;
pub mod msbuild;
mod parser;
pub mod project;
pub mod raw;
mod section;
pub mod svc;
pub mod writer;
pub mod writers;

pub use api::{Solution, SolutionBuilder};
pub use config::{ConfigItem, ConfigPrj, ConfigSln, DefaultRules, RuleOfConfig};
pub use error::SlnError;
pub use folder::SolutionFolder;
pub use parser::{SlnItems, SlnParser, Subscribers};
pub use project::ProjectItem;
pub use raw::{LineEnd, RawLine};
pub use section::{HandlerId, HandlerRef, Section};
pub use writer::{HandlerValue, ObjHandler, SlnWriter};

#[cfg(test)] // <-- not needed in integration tests
extern crate rstest;

/// `parse_file` parses solution file specified by path using built-in handlers
/// and extracting all known categories.
///
/// # Errors
///
/// This function will return an error if file content cannot be read into memory.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Solution> {
    let path = path.as_ref();
    SlnParser::new()
        .parse_file(path, SlnItems::ALL)
        .wrap_err_with(|| format!("Failed to parse solution from path: {}", path.display()))
}

/// `parse_str` parses solution content from `&str` using built-in handlers
/// and extracting all known categories.
///
/// # Errors
///
/// Kept fallible for symmetry with [`parse_file`]. Malformed lines are
/// recovered and never make parsing fail.
pub fn parse_str(contents: &str) -> Result<Solution> {
    Ok(SlnParser::new().parse_str(contents, SlnItems::ALL))
}

/// Writes solution sections to the file specified in the encoding the
/// solution was read with.
///
/// # Errors
///
/// Co-handler rules violations of `writers` and I/O errors.
pub fn write_file<P: AsRef<Path>>(
    path: P,
    solution: &Solution,
    writers: HashMap<HandlerId, HandlerValue>,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = SlnWriter::create(path, writers)
        .map(|w| w.with_encoding(solution.encoding(), solution.has_bom()))
        .wrap_err_with(|| format!("Failed to create solution file: {}", path.display()))?;
    writer
        .write(solution.map())
        .and_then(|()| writer.close())
        .wrap_err_with(|| format!("Failed to write solution to path: {}", path.display()))
}
