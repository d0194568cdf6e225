//! Built-in writers re-authoring whole global sections and solution folders.
//!
//! Each writer renders the complete block at the first section of its kind
//! from the value it is given. Helpers below build these values from a
//! parsed [`Solution`].

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use crate::api::Solution;
use crate::config::{ConfigPrj, ConfigSln, ConfigTag};
use crate::folder::SolutionFolder;
use crate::msbuild;
use crate::section::HandlerId;
use crate::writer::{HandlerValue, ObjHandler};

fn global_section(name: &str, stage: &str, body: &str) -> String {
    format!("\tGlobalSection({name}) = {stage}\n{body}\tEndGlobalSection")
}

/// `SolutionConfigurationPlatforms` from `Vec<ConfigSln>`
#[derive(Debug, Default)]
pub struct SolutionConfigsWriter;

impl ObjHandler for SolutionConfigsWriter {
    fn extract(&self, value: Option<&dyn Any>) -> Option<String> {
        let configs = value?.downcast_ref::<Vec<ConfigSln>>()?;
        let body = configs.iter().fold(String::new(), |mut s, c| {
            let _ = writeln!(s, "\t\t{c} = {c}");
            s
        });
        Some(global_section(
            "SolutionConfigurationPlatforms",
            "preSolution",
            &body,
        ))
    }
}

/// `ProjectConfigurationPlatforms` from `Vec<(ConfigSln, ConfigPrj)>`
#[derive(Debug, Default)]
pub struct ProjectConfigsWriter;

impl ObjHandler for ProjectConfigsWriter {
    fn extract(&self, value: Option<&dyn Any>) -> Option<String> {
        let configs = value?.downcast_ref::<Vec<(ConfigSln, ConfigPrj)>>()?;
        let mut body = String::new();
        for (sln, prj) in configs {
            let mut tags = Vec::with_capacity(3);
            if prj.has_active_cfg() {
                tags.push(ConfigTag::ActiveCfg);
            }
            if prj.include_in_build() {
                tags.push(ConfigTag::Build);
            }
            if prj.include_in_deploy() {
                tags.push(ConfigTag::Deploy);
            }
            for tag in tags {
                let _ = writeln!(
                    body,
                    "\t\t{}.{sln}.{} = {}",
                    prj.project_guid,
                    tag.suffix(),
                    prj.item
                );
            }
        }
        Some(global_section(
            "ProjectConfigurationPlatforms",
            "postSolution",
            &body,
        ))
    }
}

/// `NestedProjects` from `Vec<(child, parent)>` guid pairs
#[derive(Debug, Default)]
pub struct NestedProjectsWriter;

impl ObjHandler for NestedProjectsWriter {
    fn extract(&self, value: Option<&dyn Any>) -> Option<String> {
        let pairs = value?.downcast_ref::<Vec<(String, String)>>()?;
        let body = pairs.iter().fold(String::new(), |mut s, (child, parent)| {
            let _ = writeln!(s, "\t\t{child} = {parent}");
            s
        });
        Some(global_section("NestedProjects", "preSolution", &body))
    }
}

/// Solution folder declarations from `Vec<SolutionFolder>`
#[derive(Debug, Default)]
pub struct SolutionFoldersWriter;

impl ObjHandler for SolutionFoldersWriter {
    fn extract(&self, value: Option<&dyn Any>) -> Option<String> {
        let folders = value?.downcast_ref::<Vec<SolutionFolder>>()?;
        let mut out = String::new();
        for f in folders {
            let _ = writeln!(
                out,
                "Project(\"{}\") = \"{}\", \"{}\", \"{}\"",
                msbuild::ID_SOLUTION_FOLDER,
                f.header.name,
                f.header.path,
                f.header.guid
            );
            if !f.items.is_empty() {
                out.push_str("\tProjectSection(SolutionItems) = preProject\n");
                for item in &f.items {
                    let _ = writeln!(out, "\t\t{item} = {item}");
                }
                out.push_str("\tEndProjectSection\n");
            }
            out.push_str("EndProject\n");
        }
        // trailing terminator comes from the section
        out.pop();
        Some(out)
    }
}

/// `SolutionProperties` from `BTreeMap<String, String>`
#[derive(Debug, Default)]
pub struct PropertiesWriter;

impl ObjHandler for PropertiesWriter {
    fn extract(&self, value: Option<&dyn Any>) -> Option<String> {
        let props = value?.downcast_ref::<BTreeMap<String, String>>()?;
        let body = props.iter().fold(String::new(), |mut s, (k, v)| {
            let _ = writeln!(s, "\t\t{k} = {v}");
            s
        });
        Some(global_section("SolutionProperties", "preSolution", &body))
    }
}

/// `ExtensibilityGlobals` from `BTreeMap<String, Option<String>>`
#[derive(Debug, Default)]
pub struct ExtensibilityWriter;

impl ObjHandler for ExtensibilityWriter {
    fn extract(&self, value: Option<&dyn Any>) -> Option<String> {
        let items = value?.downcast_ref::<BTreeMap<String, Option<String>>>()?;
        let body = items.iter().fold(String::new(), |mut s, (k, v)| {
            let _ = match v {
                Some(v) => writeln!(s, "\t\t{k} = {v}"),
                None => writeln!(s, "\t\t{k}"),
            };
            s
        });
        Some(global_section("ExtensibilityGlobals", "postSolution", &body))
    }
}

#[must_use]
pub fn solution_configs(solution: &Solution) -> Vec<ConfigSln> {
    solution.solution_configs().cloned().collect()
}

/// Project configurations paired with the solution configurations they
/// are mapped to
#[must_use]
pub fn project_configs(solution: &Solution) -> Vec<(ConfigSln, ConfigPrj)> {
    solution
        .project_configs()
        .iter()
        .filter_map(|pc| {
            solution
                .solution_config(pc.sln())
                .map(|sln| (sln.clone(), pc.clone()))
        })
        .collect()
}

/// Child and parent guids of every nested folder and project
#[must_use]
pub fn nested_projects(solution: &Solution) -> Vec<(String, String)> {
    let folders = solution.solution_folders().iter().map(|f| &f.header);
    folders
        .chain(solution.project_items())
        .filter_map(|item| {
            item.parent
                .as_ref()
                .map(|parent| (item.guid.clone(), parent.clone()))
        })
        .collect()
}

/// Writers for every built-in handler fed with the facts of the solution.
/// Writing with them re-authors all recognized blocks.
#[must_use]
pub fn writers_for(solution: &Solution) -> HashMap<HandlerId, HandlerValue> {
    let mut writers = HashMap::new();
    writers.insert(
        HandlerId::SolutionConfigurationPlatforms,
        HandlerValue::with_value(SolutionConfigsWriter, solution_configs(solution)),
    );
    writers.insert(
        HandlerId::ProjectConfigurationPlatforms,
        HandlerValue::with_value(ProjectConfigsWriter, project_configs(solution)),
    );
    writers.insert(
        HandlerId::NestedProjects,
        HandlerValue::with_value(NestedProjectsWriter, nested_projects(solution)),
    );
    writers.insert(
        HandlerId::ProjectSolutionItems,
        HandlerValue::with_value(SolutionFoldersWriter, solution.solution_folders().to_vec()),
    );
    writers.insert(
        HandlerId::SolutionProperties,
        HandlerValue::with_value(PropertiesWriter, solution.properties().extract()),
    );
    writers.insert(
        HandlerId::ExtensibilityGlobals,
        HandlerValue::with_value(ExtensibilityWriter, solution.ext_items().clone()),
    );
    writers
}
