use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Write};
use std::path::Path;

use comfy_table::Table;
use crossterm::style::Stylize;
use itertools::Itertools;
use solr::folder::FolderTree;
use solr::Solution;

use crate::{ux, Consume};

/// Rendered information about every consumed solution
#[derive(Default)]
pub struct Info {
    reports: Vec<String>,
    errors: usize,
}

impl Info {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn errors(&self) -> usize {
        self.errors
    }
}

impl Consume for Info {
    fn ok(&mut self, path: &Path, solution: &Solution) {
        self.reports.push(Report { path, solution }.to_string());
    }

    fn err(&mut self, path: &Path, error: &miette::Report) {
        self.errors += 1;
        crate::print_error(path, error);
    }
}

impl Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in &self.reports {
            write!(f, "{r}")?;
        }
        Ok(())
    }
}

struct Report<'a> {
    path: &'a Path,
    solution: &'a Solution,
}

impl Report<'_> {
    fn header_table(&self) -> Table {
        let header = self.solution.header();
        let mut table = ux::new_properties_table();
        table.add_row(vec![ux::header_cell("Format"), ux::value_cell(&header.format_version)]);
        if !header.product.is_empty() {
            table.add_row(vec![ux::header_cell("Product"), ux::value_cell(&header.product)]);
        }
        if let Some(v) = &header.visual_studio_version {
            table.add_row(vec![ux::header_cell("VisualStudioVersion"), ux::value_cell(v)]);
        }
        if let Some(v) = &header.minimum_visual_studio_version {
            table.add_row(vec![
                ux::header_cell("MinimumVisualStudioVersion"),
                ux::value_cell(v),
            ]);
        }
        if let Some(c) = self.solution.default_config() {
            table.add_row(vec![ux::header_cell("Default configuration"), ux::value_cell(c)]);
        }
        table
    }

    fn project_types_table(&self) -> Option<Table> {
        let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
        for p in self.solution.project_items() {
            *by_type.entry(p.type_description()).or_insert(0) += 1;
        }
        if by_type.is_empty() {
            return None;
        }
        let mut table = ux::new_table();
        table.set_header(vec![ux::header_cell("Project type"), ux::header_cell("Count")]);
        for (t, count) in by_type {
            table.add_row(vec![comfy_table::Cell::new(t), ux::count_cell(count)]);
        }
        Some(table)
    }

    fn folder_tree(&self) -> Result<String, fmt::Error> {
        let tree = self.solution.folder_tree();
        let mut out = String::new();
        for root in tree.roots() {
            write_folder(&tree, root.guid(), 0, &mut out)?;
        }
        Ok(out)
    }
}

fn write_folder<W: Write>(
    tree: &FolderTree<'_>,
    guid: &str,
    depth: usize,
    out: &mut W,
) -> fmt::Result {
    let Some(folder) = tree.folder(guid) else {
        return Ok(());
    };
    let indent = "  ".repeat(depth + 1);
    writeln!(out, "{indent}{}/", folder.name())?;
    for child in tree.child_folders(folder.guid()) {
        write_folder(tree, child.guid(), depth + 1, out)?;
    }
    for p in tree.child_projects(folder.guid()) {
        writeln!(out, "{indent}  {}", p.name)?;
    }
    Ok(())
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ux::write_solution_path(f, &self.path.display().to_string())?;
        writeln!(f, "{}", self.header_table())?;
        writeln!(f)?;

        if let Some(table) = self.project_types_table() {
            writeln!(f, "{table}")?;
            writeln!(f)?;
        }

        let configurations: BTreeSet<&str> = self
            .solution
            .solution_configs()
            .map(|c| c.configuration.as_str())
            .collect();
        let platforms: BTreeSet<&str> = self
            .solution
            .solution_configs()
            .map(|c| c.platform.as_str())
            .filter(|p| !p.is_empty())
            .collect();
        for (head, set) in [("Configuration", configurations), ("Platform", platforms)] {
            if let Some(table) = ux::one_column_table(head, set) {
                writeln!(f, "{table}")?;
                writeln!(f)?;
            }
        }

        let undeclared = self.solution.undeclared_configs().join(", ");
        if !undeclared.is_empty() {
            writeln!(
                f,
                " {} {undeclared}",
                "Undeclared configurations:".dark_yellow().bold()
            )?;
            writeln!(f)?;
        }

        let tree = self.folder_tree()?;
        if !tree.is_empty() {
            writeln!(f, " {}", "Solution folders:".bold())?;
            write!(f, "{tree}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::SOLUTION;
    use solr::SlnItems;
    use solr::SlnParser;

    #[test]
    fn report_contains_facts() {
        // Arrange
        let solution = SlnParser::new().parse_str(SOLUTION, SlnItems::ALL);
        let mut info = Info::new();

        // Act
        info.ok(Path::new("a.sln"), &solution);

        // Assert
        let s = info.to_string();
        assert!(s.contains("12.00"));
        assert!(s.contains("Visual Studio Version 17"));
        assert!(s.contains("Debug|Any CPU"));
        assert!(s.contains("C#"));
        assert!(s.contains("x64"));
        assert!(s.contains("  src/"));
        assert!(s.contains("    app"));
        assert_eq!(0, info.errors());
    }

    #[test]
    fn folder_tree_without_folders_is_empty() {
        // Arrange
        let solution = SlnParser::new().parse_str("Global\nEndGlobal\n", SlnItems::ALL);
        let report = Report {
            path: Path::new("a.sln"),
            solution: &solution,
        };

        // Act
        let tree = report.folder_tree().unwrap();

        // Assert
        assert!(tree.is_empty());
        assert!(report.project_types_table().is_none());
    }
}
