use std::collections::{btree_map, BTreeMap, HashMap};
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;

use crate::config::{ConfigItem, ConfigPrj, ConfigSln, SlnConfigIx};
use crate::error::{Result, SlnError};
use crate::folder::{FolderTree, SolutionFolder};
use crate::parser::SlnItems;
use crate::project::ProjectItem;
use crate::raw::RawLine;
use crate::section::Section;

/// Solution header: format line, product comment and version records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlnHeader {
    /// Version from `Microsoft Visual Studio Solution File, Format Version 12.00`
    pub format_version: String,
    /// Product comment like `Visual Studio Version 17`
    pub product: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_studio_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_visual_studio_version: Option<String>,
}

/// Project dependencies graph built outside of the parser.
/// Solution only stores and forwards it.
pub trait SlnPdManager: Debug {
    /// Guids of projects the project specified depends on
    fn dependencies(&self, guid: &str) -> Vec<String>;

    /// Guids of all projects in build order
    fn build_order(&self) -> Vec<String>;
}

/// Read-only key value view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoProperties(BTreeMap<String, String>);

impl RoProperties {
    #[must_use]
    pub fn new(data: BTreeMap<String, String>) -> Self {
        Self(data)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Independent mutable copy of the data
    #[must_use]
    pub fn extract(&self) -> BTreeMap<String, String> {
        self.0.clone()
    }
}

impl<'a> IntoIterator for &'a RoProperties {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Project item with all its configurations
#[derive(Debug, Serialize)]
pub struct ProjectItemCfg<'a> {
    pub project: &'a ProjectItem,
    pub configs: Vec<&'a ConfigPrj>,
}

/// Parsed Visual Studio solution.
///
/// Immutable facts extracted by handlers plus the ordered section map used
/// to write the file back. Only the header and dependencies may be set
/// after parsing, and the section map may be edited before writing.
#[derive(Debug, Serialize)]
pub struct Solution {
    solution_dir: PathBuf,
    #[serde(skip)]
    result_type: SlnItems,
    header: SlnHeader,
    #[serde(rename = "solution_configs_arena")]
    sln_configs: Vec<ConfigSln>,
    #[serde(skip)]
    declared: Vec<SlnConfigIx>,
    project_configs: Vec<ConfigPrj>,
    project_items: Vec<ProjectItem>,
    solution_folders: Vec<SolutionFolder>,
    properties: RoProperties,
    ext_items: BTreeMap<String, Option<String>>,
    default_config: Option<SlnConfigIx>,
    #[serde(skip)]
    project_dependencies: Option<Box<dyn SlnPdManager>>,
    #[serde(skip)]
    map: Vec<Section>,
    #[serde(skip)]
    dropped_lines: usize,
    #[serde(skip)]
    encoding: &'static Encoding,
    #[serde(skip)]
    bom: bool,
    #[serde(skip)]
    raw_xml_projects: HashMap<String, RawLine>,
}

impl Solution {
    #[must_use]
    pub fn solution_dir(&self) -> &Path {
        &self.solution_dir
    }

    /// Categories requested when parsing
    #[must_use]
    pub fn result_type(&self) -> SlnItems {
        self.result_type
    }

    #[must_use]
    pub fn header(&self) -> &SlnHeader {
        &self.header
    }

    pub fn set_header(&mut self, header: SlnHeader) {
        self.header = header;
    }

    /// Solution configurations in declaration order
    pub fn solution_configs(&self) -> impl Iterator<Item = &ConfigSln> {
        self.declared.iter().map(|ix| &self.sln_configs[ix.0])
    }

    /// Resolves link from [`ConfigPrj::sln`]
    #[must_use]
    pub fn solution_config(&self, ix: SlnConfigIx) -> Option<&ConfigSln> {
        self.sln_configs.get(ix.0)
    }

    /// Solution configurations referenced by project configurations
    /// but never declared in `SolutionConfigurationPlatforms`
    pub fn undeclared_configs(&self) -> impl Iterator<Item = &ConfigSln> {
        self.sln_configs
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.declared.contains(&SlnConfigIx(*i)))
            .map(|(_, c)| c)
    }

    #[must_use]
    pub fn project_configs(&self) -> &[ConfigPrj] {
        &self.project_configs
    }

    /// Project configurations grouped by the solution configuration they
    /// belong to. Derived from project configurations every time.
    #[must_use]
    pub fn project_configuration_platforms(&self) -> BTreeMap<&ConfigSln, Vec<&ConfigPrj>> {
        let mut result: BTreeMap<&ConfigSln, Vec<&ConfigPrj>> = BTreeMap::new();
        for pc in &self.project_configs {
            if let Some(sln) = self.solution_config(pc.sln()) {
                result.entry(sln).or_default().push(pc);
            }
        }
        result
    }

    /// Projects excluding solution folders
    #[must_use]
    pub fn project_items(&self) -> &[ProjectItem] {
        &self.project_items
    }

    #[must_use]
    pub fn project_items_configs(&self) -> Vec<ProjectItemCfg<'_>> {
        self.project_items
            .iter()
            .map(|p| ProjectItemCfg {
                project: p,
                configs: self
                    .project_configs
                    .iter()
                    .filter(|c| p.has_guid(&c.project_guid))
                    .collect(),
            })
            .collect()
    }

    #[must_use]
    pub fn solution_folders(&self) -> &[SolutionFolder] {
        &self.solution_folders
    }

    #[must_use]
    pub fn folder_tree(&self) -> FolderTree<'_> {
        FolderTree::new(&self.solution_folders, &self.project_items)
    }

    #[must_use]
    pub fn properties(&self) -> &RoProperties {
        &self.properties
    }

    /// Free form records. `None` value denotes key only record.
    #[must_use]
    pub fn ext_items(&self) -> &BTreeMap<String, Option<String>> {
        &self.ext_items
    }

    #[must_use]
    pub fn default_config(&self) -> Option<&ConfigSln> {
        self.default_config.and_then(|ix| self.solution_config(ix))
    }

    #[must_use]
    pub fn project_dependencies(&self) -> Option<&dyn SlnPdManager> {
        self.project_dependencies.as_deref()
    }

    pub fn set_project_dependencies(&mut self, dependencies: Box<dyn SlnPdManager>) {
        self.project_dependencies = Some(dependencies);
    }

    /// All sections in line order
    #[must_use]
    pub fn map(&self) -> &[Section] {
        &self.map
    }

    /// Sections for editing before write
    pub fn sections_mut(&mut self) -> &mut Vec<Section> {
        &mut self.map
    }

    /// Number of input lines that handlers dropped from the map on purpose
    #[must_use]
    pub fn dropped_lines(&self) -> usize {
        self.dropped_lines
    }

    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    #[must_use]
    pub fn has_bom(&self) -> bool {
        self.bom
    }

    /// Content of the project file. Fallback raw xml is used when
    /// the file isn't available or the project is a web site.
    pub fn project_content(&self, guid: &str) -> Result<String> {
        let on_disk = self
            .project_items
            .iter()
            .find(|p| p.has_guid(guid) && !p.is_web_site())
            .map(|p| p.full_path.as_path())
            .filter(|p| p.is_file());
        if let Some(path) = on_disk {
            return Ok(fs::read_to_string(path)?);
        }
        self.raw_xml_projects
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(guid))
            .map(|(_, v)| v.text().to_owned())
            .ok_or_else(|| SlnError::ProjectContent(guid.to_owned()))
    }
}

/// Accumulates facts during a single parse pass
#[derive(Debug, Default)]
pub struct SolutionBuilder {
    header: SlnHeader,
    sln_configs: Vec<ConfigSln>,
    declared: Vec<SlnConfigIx>,
    project_configs: Vec<ConfigPrj>,
    project_items: Vec<ProjectItem>,
    solution_folders: Vec<SolutionFolder>,
    nesting: Vec<(String, String)>,
    properties: BTreeMap<String, String>,
    ext_items: BTreeMap<String, Option<String>>,
    default_config: Option<SlnConfigIx>,
}

impl SolutionBuilder {
    pub fn set_header(&mut self, header: SlnHeader) {
        self.header = header;
    }

    pub fn add_project(&mut self, item: ProjectItem) {
        self.project_items.push(item);
    }

    pub fn add_folder(&mut self, folder: SolutionFolder) {
        self.solution_folders.push(folder);
    }

    /// Records that item `child` is nested into folder `parent`
    pub fn nest(&mut self, child: impl Into<String>, parent: impl Into<String>) {
        self.nesting.push((child.into(), parent.into()));
    }

    /// Declares solution configuration. Declaring the same pair twice
    /// returns the first declaration.
    pub fn declare_config(&mut self, config: ConfigSln) -> SlnConfigIx {
        let ix = match self.find_config(&config) {
            Some(ix) => ix,
            None => self.push_config(config),
        };
        if !self.declared.contains(&ix) {
            self.declared.push(ix);
        }
        ix
    }

    /// Link to the solution configuration for project configuration lines.
    /// Undeclared pair is kept in the arena so the mapping is not lost.
    pub fn link_config(&mut self, config: ConfigSln) -> SlnConfigIx {
        if let Some(ix) = self.find_config(&config) {
            return ix;
        }
        tracing::warn!(
            config = %config,
            "Project configuration refers to undeclared solution configuration"
        );
        self.push_config(config)
    }

    /// Project configuration for the project and solution configuration
    /// specified. The first record creates it with no record kinds set.
    pub fn project_config(
        &mut self,
        project_guid: &str,
        sln: SlnConfigIx,
        item: ConfigItem,
    ) -> &mut ConfigPrj {
        let pos = self
            .project_configs
            .iter()
            .position(|c| c.sln() == sln && c.project_guid.eq_ignore_ascii_case(project_guid));
        let pos = pos.unwrap_or_else(|| {
            let mut config = ConfigPrj::new(item, project_guid, sln);
            config.set_active_cfg(false);
            self.project_configs.push(config);
            self.project_configs.len() - 1
        });
        &mut self.project_configs[pos]
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn add_ext_item(&mut self, key: impl Into<String>, value: Option<String>) {
        self.ext_items.insert(key.into(), value);
    }

    pub fn set_default_config(&mut self, ix: SlnConfigIx) {
        self.default_config = Some(ix);
    }

    pub fn solution_configs(&self) -> impl Iterator<Item = (SlnConfigIx, &ConfigSln)> {
        self.declared.iter().map(|ix| (*ix, &self.sln_configs[ix.0]))
    }

    #[must_use]
    pub fn project_items(&self) -> &[ProjectItem] {
        &self.project_items
    }

    #[must_use]
    pub fn solution_folders(&self) -> &[SolutionFolder] {
        &self.solution_folders
    }

    fn find_config(&self, config: &ConfigSln) -> Option<SlnConfigIx> {
        self.sln_configs
            .iter()
            .position(|c| c.is_same(config))
            .map(SlnConfigIx)
    }

    fn push_config(&mut self, config: ConfigSln) -> SlnConfigIx {
        self.sln_configs.push(config);
        SlnConfigIx(self.sln_configs.len() - 1)
    }

    fn resolve_nesting(&mut self) {
        for (child, parent) in std::mem::take(&mut self.nesting) {
            let target = self
                .project_items
                .iter_mut()
                .chain(self.solution_folders.iter_mut().map(|f| &mut f.header))
                .find(|p| p.has_guid(&child));
            match target {
                Some(item) => item.parent = Some(parent),
                None => tracing::debug!(child = %child, parent = %parent, "Nested item is not declared"),
            }
        }
    }

    pub(crate) fn finalize(mut self, parts: Finalize) -> Solution {
        self.resolve_nesting();
        Solution {
            solution_dir: parts.solution_dir,
            result_type: parts.result_type,
            header: self.header,
            sln_configs: self.sln_configs,
            declared: self.declared,
            project_configs: self.project_configs,
            project_items: self.project_items,
            solution_folders: self.solution_folders,
            properties: RoProperties::new(self.properties),
            ext_items: self.ext_items,
            default_config: self.default_config,
            project_dependencies: None,
            map: parts.map,
            dropped_lines: parts.dropped_lines,
            encoding: parts.encoding,
            bom: parts.bom,
            raw_xml_projects: parts.raw_xml_projects,
        }
    }
}

/// Parse pass outputs that aren't facts
pub(crate) struct Finalize {
    pub solution_dir: PathBuf,
    pub result_type: SlnItems,
    pub map: Vec<Section>,
    pub dropped_lines: usize,
    pub encoding: &'static Encoding,
    pub bom: bool,
    pub raw_xml_projects: HashMap<String, RawLine>,
}

impl Default for Finalize {
    fn default() -> Self {
        Self {
            solution_dir: PathBuf::new(),
            result_type: SlnItems::empty(),
            map: Vec::new(),
            dropped_lines: 0,
            encoding: UTF_8,
            bom: false,
            raw_xml_projects: HashMap::new(),
        }
    }
}
