use crate::parser::SlnItems;
use crate::raw::RawLine;
use crate::section::HandlerId;
use crate::svc::{Scope, Svc};

use super::{project_item, SlnHandler};

/// Ordinary project declarations. Solution folders are left to
/// [`super::FolderHandler`].
#[derive(Debug, Default)]
pub struct ProjectHandler;

impl SlnHandler for ProjectHandler {
    fn id(&self) -> HandlerId {
        HandlerId::Project
    }

    fn is_activated(&self, svc: &Svc<'_>) -> bool {
        svc.items().contains(SlnItems::PROJECTS) && svc.scope() == Scope::Project
    }

    fn condition(&self, line: &RawLine) -> bool {
        line.trimmed().starts_with("Project(")
    }

    fn positioned(&mut self, svc: &mut Svc<'_>, line: &RawLine) -> bool {
        let Some(item) = project_item(line.trimmed(), svc.solution_dir()) else {
            return false;
        };
        tracing::trace!(name = %item.name, guid = %item.guid, "Project");
        svc.sln().add_project(item);
        true
    }
}
