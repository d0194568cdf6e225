use crate::parser::SlnItems;
use crate::raw::RawLine;
use crate::section::HandlerId;
use crate::svc::{Scope, Svc};

use super::{is_global_section, key_value, read_block, SlnHandler};

const CO_HANDLERS: &[HandlerId] = &[HandlerId::ProjectSolutionItems];

/// `GlobalSection(NestedProjects)` that places projects and folders
/// into folders. Its rendering covers folder membership too.
#[derive(Debug, Default)]
pub struct NestedProjectsHandler;

impl SlnHandler for NestedProjectsHandler {
    fn id(&self) -> HandlerId {
        HandlerId::NestedProjects
    }

    fn co_handlers(&self) -> &[HandlerId] {
        CO_HANDLERS
    }

    fn is_activated(&self, svc: &Svc<'_>) -> bool {
        svc.items().intersects(SlnItems::NESTED | SlnItems::SOLUTION_FOLDERS)
            && svc.scope() == Scope::GlobalSection
    }

    fn condition(&self, line: &RawLine) -> bool {
        is_global_section(line, "NestedProjects")
    }

    fn positioned(&mut self, svc: &mut Svc<'_>, _line: &RawLine) -> bool {
        for l in read_block(svc, &*self, "EndGlobalSection") {
            match key_value(l.trimmed()) {
                (child, Some(parent)) if !child.is_empty() && !parent.is_empty() => {
                    svc.sln().nest(child, parent);
                }
                ("", None) => {}
                _ => tracing::error!(line = l.trimmed(), "Nested project record is malformed"),
            }
        }
        true
    }
}
