use crate::folder::SolutionFolder;
use crate::parser::SlnItems;
use crate::project::ProjectItem;
use crate::raw::RawLine;
use crate::section::HandlerId;
use crate::svc::{Scope, Svc};

use super::{key_value, read_block, SlnHandler};

/// Solution folder declarations with their `SolutionItems` up to `EndProject`
#[derive(Debug, Default)]
pub struct FolderHandler;

impl SlnHandler for FolderHandler {
    fn id(&self) -> HandlerId {
        HandlerId::ProjectSolutionItems
    }

    fn is_activated(&self, svc: &Svc<'_>) -> bool {
        svc.items().contains(SlnItems::SOLUTION_FOLDERS) && svc.scope() == Scope::Project
    }

    fn condition(&self, line: &RawLine) -> bool {
        line.trimmed().starts_with("Project(")
    }

    fn positioned(&mut self, svc: &mut Svc<'_>, line: &RawLine) -> bool {
        let Some(header) = ProjectItem::parse(line.trimmed(), svc.solution_dir()) else {
            return false;
        };
        if !header.is_folder() {
            return false;
        }
        // a folder the model can't hold stays verbatim
        let mut folder = match SolutionFolder::new(header, Vec::new()) {
            Ok(folder) => folder,
            Err(e) => {
                tracing::error!(error = %e, line = line.trimmed(), "Solution folder is malformed");
                return false;
            }
        };

        let mut in_items = false;
        for l in read_block(svc, &*self, "EndProject") {
            let t = l.trimmed();
            if t.starts_with("ProjectSection(SolutionItems)") {
                in_items = true;
            } else if t == "EndProjectSection" {
                in_items = false;
            } else if in_items && !t.is_empty() {
                let (item, _) = key_value(t);
                folder.items.push(RawLine::with_encoding(item, l.encoding()));
            }
        }
        svc.sln().add_folder(folder);
        true
    }
}
