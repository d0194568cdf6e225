//! Line recognizers that turn solution text into facts.
//!
//! The driver offers every line to the registered handlers in order. The
//! first one that is activated, whose condition holds and that claims the
//! line in `positioned` owns the resulting section. Block handlers read the
//! rest of their block through [`Svc::read_line_for`].

use std::path::Path;

use crate::project::ProjectItem;
use crate::raw::RawLine;
use crate::section::{HandlerId, HandlerRef};
use crate::svc::Svc;

mod ext;
mod folders;
mod header;
mod nested;
mod prj_configs;
mod projects;
mod properties;
mod sln_configs;

pub use ext::ExtensibilityHandler;
pub use folders::FolderHandler;
pub use header::VersionHandler;
pub use nested::NestedProjectsHandler;
pub use prj_configs::ProjectConfigsHandler;
pub use projects::ProjectHandler;
pub use properties::PropertiesHandler;
pub use sln_configs::SolutionConfigsHandler;

/// What the driver does with a claimed line
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LineAct {
    /// Keep section
    #[default]
    Process,
    /// Keep section but never write it
    Ignore,
    /// Don't keep section at all
    Drop,
}

/// Recognizer of one kind of solution sections
pub trait SlnHandler {
    /// Stable identity used for registration and writer lookup
    fn id(&self) -> HandlerId;

    /// Handlers whose sections this handler's rendering subsumes
    fn co_handlers(&self) -> &[HandlerId] {
        &[]
    }

    fn line_control(&self) -> LineAct {
        LineAct::Process
    }

    /// May the handler start matching in the current parse context
    fn is_activated(&self, svc: &Svc<'_>) -> bool;

    /// Does the line belong to the handler
    fn condition(&self, line: &RawLine) -> bool;

    /// Extracts facts from the line. Returns whether the line was claimed.
    fn positioned(&mut self, svc: &mut Svc<'_>, line: &RawLine) -> bool;

    /// Called once before the first match in a file
    fn pre_processing(&mut self, _svc: &mut Svc<'_>) {}

    /// Called once after the whole file is processed
    fn post_processing(&mut self, _svc: &mut Svc<'_>) {}

    fn handler_ref(&self) -> HandlerRef {
        HandlerRef::new(self.id(), self.co_handlers())
    }
}

/// Built-in recognizers in the order they are offered lines
#[must_use]
pub fn default_handlers() -> Vec<Box<dyn SlnHandler>> {
    vec![
        Box::<VersionHandler>::default(),
        Box::<ProjectHandler>::default(),
        Box::<FolderHandler>::default(),
        Box::<NestedProjectsHandler>::default(),
        Box::<SolutionConfigsHandler>::default(),
        Box::<ProjectConfigsHandler>::default(),
        Box::<PropertiesHandler>::default(),
        Box::<ExtensibilityHandler>::default(),
    ]
}

/// Project item from declaration line. Items without guid and solution
/// folders are not project items.
pub fn project_item(line: &str, solution_dir: &Path) -> Option<ProjectItem> {
    let item = ProjectItem::parse(line, solution_dir)?;
    if item.guid.trim().is_empty() {
        tracing::error!(line, "Project guid is empty");
        return None;
    }
    if item.is_folder() {
        tracing::debug!(name = %item.name, "Ignored as solution folder");
        return None;
    }
    Some(item)
}

/// Reads lines up to and including the closing line tracking them for the
/// handler. Returns the lines between.
pub(crate) fn read_block<H: SlnHandler + ?Sized>(
    svc: &mut Svc<'_>,
    handler: &H,
    end: &str,
) -> Vec<RawLine> {
    let mut body = Vec::new();
    while let Some(line) = svc.read_line_for(handler) {
        if line.trimmed() == end {
            return body;
        }
        body.push(line);
    }
    tracing::warn!(end, handler = %handler.id(), "Block is not closed");
    body
}

/// Splits `key = value` line. Line without `=` is a key only.
pub(crate) fn key_value(line: &str) -> (&str, Option<&str>) {
    match line.split_once('=') {
        Some((k, v)) => (k.trim(), Some(v.trim())),
        None => (line.trim(), None),
    }
}

pub(crate) fn is_global_section(line: &RawLine, name: &str) -> bool {
    line.trimmed()
        .strip_prefix("GlobalSection(")
        .and_then(|s| s.strip_prefix(name))
        .is_some_and(|s| s.starts_with(')'))
}
