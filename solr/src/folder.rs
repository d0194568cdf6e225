use std::collections::HashSet;

use serde::Serialize;

use crate::error::{Result, SlnError};
use crate::project::ProjectItem;
use crate::raw::RawLine;

/// Solution folder with its `SolutionItems` entries
#[derive(Debug, Clone, Serialize)]
pub struct SolutionFolder {
    pub header: ProjectItem,
    pub items: Vec<RawLine>,
}

impl SolutionFolder {
    /// Creates folder. Guid and name of the header are mandatory.
    pub fn new(header: ProjectItem, items: Vec<RawLine>) -> Result<Self> {
        if header.guid.trim().is_empty() {
            return Err(SlnError::MissingArgument("guid"));
        }
        if header.name.trim().is_empty() {
            return Err(SlnError::MissingArgument("name"));
        }
        Ok(Self { header, items })
    }

    #[must_use]
    pub fn guid(&self) -> &str {
        &self.header.guid
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.header.name
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.header.parent.is_none()
    }
}

impl PartialEq for SolutionFolder {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
    }
}

impl Eq for SolutionFolder {}

/// Read-only view over the folder hierarchy of a solution.
///
/// Parent links are guids so a malformed solution may contain cycles,
/// every upward walk stops when it meets a folder twice.
#[derive(Debug, Clone, Copy)]
pub struct FolderTree<'a> {
    folders: &'a [SolutionFolder],
    projects: &'a [ProjectItem],
}

impl<'a> FolderTree<'a> {
    #[must_use]
    pub fn new(folders: &'a [SolutionFolder], projects: &'a [ProjectItem]) -> Self {
        Self { folders, projects }
    }

    #[must_use]
    pub fn folder(&self, guid: &str) -> Option<&'a SolutionFolder> {
        self.folders.iter().find(|f| f.header.has_guid(guid))
    }

    /// Folder the item (project or folder) with guid specified is nested into
    #[must_use]
    pub fn parent_of(&self, guid: &str) -> Option<&'a SolutionFolder> {
        let parent = self
            .folders
            .iter()
            .map(|f| &f.header)
            .chain(self.projects.iter())
            .find(|h| h.has_guid(guid))?
            .parent
            .as_deref()?;
        self.folder(parent)
    }

    /// Folders without parent
    pub fn roots(&self) -> impl Iterator<Item = &'a SolutionFolder> {
        self.folders.iter().filter(|f| f.is_root())
    }

    pub fn child_folders(&self, guid: &'a str) -> impl Iterator<Item = &'a SolutionFolder> {
        self.folders
            .iter()
            .filter(move |f| is_child_of(&f.header, guid))
    }

    pub fn child_projects(&self, guid: &'a str) -> impl Iterator<Item = &'a ProjectItem> {
        self.projects
            .iter()
            .filter(move |p| is_child_of(p, guid))
    }

    /// Folder names from root down to the folder specified inclusive
    #[must_use]
    pub fn path(&self, guid: &str) -> Vec<&'a str> {
        let mut visited = HashSet::new();
        let mut names = Vec::new();
        let mut current = self.folder(guid);
        while let Some(f) = current {
            if !visited.insert(f.guid().to_uppercase()) {
                tracing::warn!(folder = f.name(), "Solution folders nesting has a cycle");
                break;
            }
            names.push(f.name());
            current = f.header.parent.as_deref().and_then(|p| self.folder(p));
        }
        names.reverse();
        names
    }
}

fn is_child_of(item: &ProjectItem, guid: &str) -> bool {
    item.parent
        .as_deref()
        .is_some_and(|p| p.eq_ignore_ascii_case(guid))
}
