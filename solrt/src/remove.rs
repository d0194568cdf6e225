use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use miette::{bail, IntoDiagnostic, Result, WrapErr};
use solr::writers::{self, ProjectConfigsWriter, SolutionConfigsWriter};
use solr::{ConfigItem, DefaultRules, HandlerId, HandlerValue, SlnWriter, Solution};

/// What was removed from solution
#[derive(Debug, PartialEq, Eq)]
pub struct Removed {
    pub configuration: ConfigItem,
    pub project_configs: usize,
}

/// Writers that render the solution without the configuration specified
#[must_use]
pub fn writers_without(
    solution: &Solution,
    config: &ConfigItem,
) -> (HashMap<HandlerId, HandlerValue>, usize) {
    let configs: Vec<_> = writers::solution_configs(solution)
        .into_iter()
        .filter(|c| !c.is_same(config))
        .collect();
    let all = writers::project_configs(solution);
    let before = all.len();
    let project_configs: Vec<_> = all
        .into_iter()
        .filter(|(sln, _)| !sln.is_same(config))
        .collect();
    let removed = before - project_configs.len();

    let mut map = HashMap::new();
    map.insert(
        HandlerId::SolutionConfigurationPlatforms,
        HandlerValue::with_value(SolutionConfigsWriter, configs),
    );
    map.insert(
        HandlerId::ProjectConfigurationPlatforms,
        HandlerValue::with_value(ProjectConfigsWriter, project_configs),
    );
    (map, removed)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Removes solution configuration like `Release|x64` and every project
/// mapping to it. File is replaced only after it is completely written.
pub fn remove_config(path: &Path, configuration: &str) -> Result<Removed> {
    let solution = solr::parse_file(path)?;
    let config = ConfigItem::parse(configuration, &DefaultRules);
    let Some(declared) = solution.solution_configs().find(|c| c.is_same(&config)) else {
        bail!(
            "Configuration '{config}' is not declared in {}",
            path.display()
        );
    };
    let declared = declared.clone();
    let (writers, removed) = writers_without(&solution, &declared);

    let tmp = temp_sibling(path);
    {
        let mut writer = SlnWriter::create(&tmp, writers)?
            .with_encoding(solution.encoding(), solution.has_bom());
        writer.write(solution.map())?;
        writer.close()?;
    }
    fs::rename(&tmp, path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to replace {}", path.display()))?;

    tracing::debug!(config = %declared, removed, "Configuration removed");
    Ok(Removed {
        configuration: declared,
        project_configs: removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{TempSln, SOLUTION};
    use rstest::rstest;
    use solr::{SlnItems, SlnParser};

    #[rstest]
    #[case("exact", "Release|x64", 2)]
    #[case("case", "release|X64", 2)]
    #[case("normalized", "Debug|AnyCPU", 2)]
    #[trace]
    fn remove_declared(#[case] name: &str, #[case] configuration: &str, #[case] expected: usize) {
        // Arrange
        let file = TempSln::new(&format!("remove-{name}"), SOLUTION.as_bytes());

        // Act
        let removed = remove_config(&file.0, configuration).unwrap();

        // Assert
        assert_eq!(expected, removed.project_configs);
        let content = fs::read_to_string(&file.0).unwrap();
        let solution = SlnParser::new().parse_str(&content, SlnItems::ALL);
        assert_eq!(2, solution.solution_configs().count());
        assert!(solution
            .solution_configs()
            .all(|c| !c.is_same(&removed.configuration)));
        assert_eq!(6 - expected, solution.project_configs().len());
        assert_eq!(2, solution.project_items().len());
        assert!(!temp_sibling(&file.0).exists());
    }

    #[test]
    fn remove_undeclared_fails_without_changes() {
        // Arrange
        let file = TempSln::new("remove-undeclared", SOLUTION.as_bytes());

        // Act
        let result = remove_config(&file.0, "Debug|ARM");

        // Assert
        assert!(result.is_err());
        assert_eq!(SOLUTION, fs::read_to_string(&file.0).unwrap());
    }

    #[test]
    fn temp_sibling_tests() {
        // Arrange
        let path = Path::new("/dir/a.sln");

        // Act
        let actual = temp_sibling(path);

        // Assert
        assert_eq!(Path::new("/dir/a.sln.tmp"), actual);
    }
}
