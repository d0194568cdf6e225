use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};

use crate::api::{Finalize, Solution};
use crate::config::{DefaultRules, RuleOfConfig};
use crate::error::Result;
use crate::handlers::{self, SlnHandler};
use crate::raw::{self, Decoded, RawLine};
use crate::section::HandlerId;
use crate::svc::Svc;

bitflags::bitflags! {
    /// Categories of facts to extract
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SlnItems: u32 {
        const HEADER = 1;
        const PROJECTS = 1 << 1;
        const SOLUTION_CONFS = 1 << 2;
        const PROJECT_CONFS = 1 << 3;
        const SOLUTION_FOLDERS = 1 << 4;
        const NESTED = 1 << 5;
        const PROPERTIES = 1 << 6;
        const EXT_ITEMS = 1 << 7;
        const DEFAULT_CONFIG = 1 << 8;
        const SOLUTION_DEFAULTS = Self::HEADER.bits()
            | Self::PROJECTS.bits()
            | Self::SOLUTION_CONFS.bits()
            | Self::PROJECT_CONFS.bits()
            | Self::DEFAULT_CONFIG.bits();
        const ALL = Self::SOLUTION_DEFAULTS.bits()
            | Self::SOLUTION_FOLDERS.bits()
            | Self::NESTED.bits()
            | Self::PROPERTIES.bits()
            | Self::EXT_ITEMS.bits();
    }
}

/// Ordered handler registration set without duplicate identities
#[derive(Default)]
pub struct Subscribers {
    items: Vec<Box<dyn SlnHandler>>,
}

impl Subscribers {
    /// Adds handler. Returns `false` if handler with the same identity is
    /// already registered.
    pub fn register(&mut self, handler: Box<dyn SlnHandler>) -> bool {
        if self.contains(handler.id()) {
            return false;
        }
        self.items.push(handler);
        true
    }

    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let before = self.items.len();
        self.items.retain(|h| h.id() != id);
        before != self.items.len()
    }

    #[must_use]
    pub fn contains(&self, id: HandlerId) -> bool {
        self.items.iter().any(|h| h.id() == id)
    }

    pub fn reset(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = HandlerId> + '_ {
        self.items.iter().map(|h| h.id())
    }
}

/// Solution parser: handler registration set plus parsing options
pub struct SlnParser {
    handlers: Subscribers,
    raw_xml_projects: HashMap<String, RawLine>,
    rules: Box<dyn RuleOfConfig>,
    encoding: &'static Encoding,
}

impl Default for SlnParser {
    fn default() -> Self {
        let mut parser = Self::empty();
        parser.set_default_handlers();
        parser
    }
}

impl SlnParser {
    /// Parser with the built-in handlers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser without any handler. Every line is kept verbatim.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: Subscribers::default(),
            raw_xml_projects: HashMap::new(),
            rules: Box::new(DefaultRules),
            encoding: UTF_8,
        }
    }

    /// Resets handlers to the built-in set
    pub fn set_default_handlers(&mut self) {
        self.handlers.reset();
        for h in handlers::default_handlers() {
            self.handlers.register(h);
        }
    }

    #[must_use]
    pub fn handlers(&self) -> &Subscribers {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut Subscribers {
        &mut self.handlers
    }

    /// Project content used when project file is not on disk
    pub fn raw_xml_projects(&mut self) -> &mut HashMap<String, RawLine> {
        &mut self.raw_xml_projects
    }

    pub fn set_rules(&mut self, rules: Box<dyn RuleOfConfig>) {
        self.rules = rules;
    }

    /// Encoding used when content has no byte order mark
    pub fn set_fallback_encoding(&mut self, encoding: &'static Encoding) {
        self.encoding = encoding;
    }

    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P, items: SlnItems) -> Result<Solution> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        tracing::debug!(path = %path.display(), "Parsing solution");
        Ok(self.parse_bytes(&bytes, dir, items))
    }

    /// Parses solution from reader. Project paths are relative to current
    /// directory.
    pub fn parse_reader<R: Read>(&mut self, mut reader: R, items: SlnItems) -> Result<Solution> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(self.parse_bytes(&bytes, PathBuf::new(), items))
    }

    /// Parses already decoded solution text
    pub fn parse_str(&mut self, content: &str, items: SlnItems) -> Solution {
        let (text, bom) = match content.strip_prefix('\u{FEFF}') {
            Some(rest) => (rest, true),
            None => (content, false),
        };
        let decoded = Decoded {
            text: text.to_owned(),
            encoding: UTF_8,
            bom,
        };
        self.run(decoded, PathBuf::new(), items)
    }

    pub fn parse_bytes(&mut self, bytes: &[u8], solution_dir: PathBuf, items: SlnItems) -> Solution {
        let decoded = raw::decode(bytes, self.encoding);
        self.run(decoded, solution_dir, items)
    }

    fn run(&mut self, decoded: Decoded, solution_dir: PathBuf, items: SlnItems) -> Solution {
        let Decoded {
            text,
            encoding,
            bom,
        } = decoded;
        let mut svc = Svc::new(
            text,
            encoding,
            items,
            &*self.rules,
            solution_dir.clone(),
        );
        let handlers = &mut self.handlers.items;
        let mut started = vec![false; handlers.len()];
        let mut lines = 0_usize;

        while let Some(line) = svc.read_line() {
            lines += 1;
            let eol = svc.last_eol();
            let at = svc.tracked();
            let mut owner = None;
            for (i, h) in handlers.iter_mut().enumerate() {
                if !h.is_activated(&svc) || !h.condition(&line) {
                    continue;
                }
                if !started[i] {
                    h.pre_processing(&mut svc);
                    started[i] = true;
                }
                if h.positioned(&mut svc, &line) {
                    owner = Some(i);
                    break;
                }
            }
            match owner {
                Some(i) => {
                    let h = &*handlers[i];
                    tracing::trace!(handler = %h.id(), line = line.trimmed(), "Line claimed");
                    svc.track_at(at, line, eol, Some(h));
                }
                None => svc.track_at::<dyn SlnHandler>(at, line, eol, None),
            }
        }

        for h in handlers.iter_mut() {
            h.post_processing(&mut svc);
        }

        let (builder, map, dropped_lines) = svc.into_parts();
        tracing::debug!(lines, sections = map.len(), dropped_lines, "Solution parsed");
        builder.finalize(Finalize {
            solution_dir,
            result_type: items,
            map,
            dropped_lines,
            encoding,
            bom,
            raw_xml_projects: self.raw_xml_projects.clone(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{ConfigItem, ConfigPrj};
    use crate::handlers::LineAct;
    use crate::svc::Scope;
    use proptest::strategy::{Strategy, ValueTree};
    use proptest::test_runner::TestRunner;
    use rstest::rstest;

    #[test]
    fn parse_real_solution() {
        // Arrange
        let mut parser = SlnParser::new();

        // Act
        let solution = parser.parse_str(REAL_SOLUTION, SlnItems::ALL);

        // Assert
        let header = solution.header();
        assert_eq!("12.00", header.format_version);
        assert_eq!("Visual Studio Version 17", header.product);
        assert_eq!(Some("17.0.31903.59"), header.visual_studio_version.as_deref());
        assert_eq!(
            Some("10.0.40219.1"),
            header.minimum_visual_studio_version.as_deref()
        );
        assert_eq!(3, solution.project_items().len());
        assert_eq!(2, solution.solution_folders().len());
        assert_eq!(
            vec![".editorconfig", "README.md"],
            solution.solution_folders()[0]
                .items
                .iter()
                .map(RawLine::text)
                .collect::<Vec<_>>()
        );
        assert_eq!(
            vec![
                ConfigItem::new("Debug", "Any CPU"),
                ConfigItem::new("Release", "Any CPU"),
                ConfigItem::new("Release", "x64"),
            ],
            solution.solution_configs().cloned().collect::<Vec<_>>()
        );
        assert_eq!(Some(&ConfigItem::new("Debug", "Any CPU")), solution.default_config());
        assert_eq!(Some("FALSE"), solution.properties().get("HideSolutionNode"));
        assert_eq!(
            Some(&Some("{A1B2C3D4-0000-0000-0000-000000000001}".to_owned())),
            solution.ext_items().get("SolutionGuid")
        );
        assert_eq!(Some(&None), solution.ext_items().get("Flag"));
        assert_eq!(0, solution.dropped_lines());
        assert_eq!(REAL_SOLUTION.lines().count(), solution.map().len());
    }

    #[test]
    fn nesting_and_folder_tree() {
        // Arrange
        let mut parser = SlnParser::new();

        // Act
        let solution = parser.parse_str(REAL_SOLUTION, SlnItems::ALL);

        // Assert
        let tree = solution.folder_tree();
        let roots: Vec<&str> = tree.roots().map(|f| f.name()).collect();
        assert_eq!(vec!["Solution Items"], roots);
        assert_eq!(vec!["Solution Items", "tests"], tree.path(TESTS_FOLDER));
        let tests: Vec<&str> = tree
            .child_projects(TESTS_FOLDER)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(vec!["solr.tests"], tests);
    }

    #[test]
    fn include_in_build_independent_of_mapping() {
        // Arrange
        let mut parser = SlnParser::new();

        // Act
        let solution = parser.parse_str(INCLUDE_IN_BUILD, SlnItems::ALL);

        // Assert
        let release = ConfigItem::new("Release", "Any CPU");
        let mapped: Vec<&ConfigPrj> = solution
            .project_configs()
            .iter()
            .filter(|pc| solution.solution_config(pc.sln()) == Some(&release))
            .collect();
        assert_eq!(1, mapped.len());
        assert_eq!("{AAAAAAAA-0000-0000-0000-000000000000}", mapped[0].project_guid);
        assert!(!mapped[0].include_in_build());
        assert_eq!(1, solution.project_configuration_platforms()[&release].len());
        let debug = &solution.project_configs()[0];
        assert!(debug.include_in_build());
        assert!(debug.include_in_deploy());
    }

    #[test]
    fn project_configs_normalized_and_undeclared_kept() {
        // Arrange
        let mut parser = SlnParser::new();

        // Act
        let solution = parser.parse_str(UNDECLARED, SlnItems::ALL);

        // Assert
        assert_eq!(1, solution.solution_configs().count());
        let undeclared: Vec<&ConfigItem> = solution.undeclared_configs().collect();
        assert_eq!(vec![&ConfigItem::new("Release", "Any CPU")], undeclared);
        assert_eq!(
            ConfigItem::new("Debug", "Any CPU"),
            solution.project_configs()[0].item
        );
        assert_eq!(2, solution.project_configs().len());
    }

    #[rstest]
    #[case(SlnItems::PROJECTS, 3, 0, 0)]
    #[case(SlnItems::SOLUTION_FOLDERS, 0, 2, 0)]
    #[case(SlnItems::SOLUTION_CONFS, 0, 0, 3)]
    #[case(SlnItems::empty(), 0, 0, 0)]
    #[trace]
    fn items_mask_limits_extraction(
        #[case] items: SlnItems,
        #[case] projects: usize,
        #[case] folders: usize,
        #[case] configs: usize,
    ) {
        // Arrange
        let mut parser = SlnParser::new();

        // Act
        let solution = parser.parse_str(REAL_SOLUTION, items);

        // Assert
        assert_eq!(projects, solution.project_items().len());
        assert_eq!(folders, solution.solution_folders().len());
        assert_eq!(configs, solution.solution_configs().count());
        assert!(solution.project_configs().is_empty());
        assert_eq!(items, solution.result_type());
        assert_eq!(REAL_SOLUTION.lines().count(), solution.map().len());
    }

    #[test]
    fn sections_are_in_line_order() {
        // Arrange
        let mut parser = SlnParser::new();

        // Act
        let solution = parser.parse_str(REAL_SOLUTION, SlnItems::ALL);

        // Assert
        let texts: Vec<&str> = solution.map().iter().map(|s| s.raw.text()).collect();
        assert_eq!(REAL_SOLUTION.lines().collect::<Vec<_>>(), texts);
        let owners: Vec<Option<HandlerId>> =
            solution.map().iter().map(crate::Section::handler_id).collect();
        assert!(owners.contains(&Some(HandlerId::NestedProjects)));
        assert!(owners.contains(&None));
    }

    #[test]
    fn missing_guid_is_kept_verbatim() {
        // Arrange
        let mut parser = SlnParser::new();
        let content = "Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"a\", \"a.csproj\", \"\"\r\nEndProject\r\n";

        // Act
        let solution = parser.parse_str(content, SlnItems::ALL);

        // Assert
        assert!(solution.project_items().is_empty());
        assert_eq!(2, solution.map().len());
        assert!(solution.map().iter().all(|s| s.handler.is_none()));
    }

    #[test]
    fn registration_set_deduplicates() {
        // Arrange
        let mut parser = SlnParser::empty();

        // Act
        let first = parser
            .handlers_mut()
            .register(Box::new(crate::handlers::ProjectHandler));
        let second = parser
            .handlers_mut()
            .register(Box::new(crate::handlers::ProjectHandler));
        let removed = parser.handlers_mut().unregister(HandlerId::Project);

        // Assert
        assert!(first);
        assert!(!second);
        assert!(removed);
        assert!(parser.handlers().is_empty());
        parser.set_default_handlers();
        assert_eq!(8, parser.handlers().len());
        assert!(parser.handlers().contains(HandlerId::NestedProjects));
    }

    #[derive(Default)]
    struct CommentDropper;

    impl SlnHandler for CommentDropper {
        fn id(&self) -> HandlerId {
            HandlerId::Custom("CommentDropper")
        }

        fn line_control(&self) -> LineAct {
            LineAct::Drop
        }

        fn is_activated(&self, svc: &Svc<'_>) -> bool {
            svc.scope() == Scope::Root
        }

        fn condition(&self, line: &RawLine) -> bool {
            line.trimmed().starts_with('#')
        }

        fn positioned(&mut self, svc: &mut Svc<'_>, _line: &RawLine) -> bool {
            let id = self.id();
            let seen = svc
                .udata()
                .entry(id)
                .or_insert_with(|| Box::new(0_usize));
            if let Some(n) = seen.downcast_mut::<usize>() {
                *n += 1;
            }
            true
        }
    }

    #[test]
    fn dropped_lines_are_counted() {
        // Arrange
        let mut parser = SlnParser::new();
        parser.handlers_mut().unregister(HandlerId::VisualStudioVersion);
        parser
            .handlers_mut()
            .register(Box::<CommentDropper>::default());

        // Act
        let solution = parser.parse_str(REAL_SOLUTION, SlnItems::ALL);

        // Assert
        assert_eq!(1, solution.dropped_lines());
        assert_eq!(
            REAL_SOLUTION.lines().count(),
            solution.map().len() + solution.dropped_lines()
        );
        assert!(solution.header().product.is_empty());
    }

    #[test]
    fn every_line_has_one_section() {
        // Arrange
        let mut runner = TestRunner::default();
        let mut parser = SlnParser::new();

        for _ in 0..256 {
            let content = "(\\PC|\r\n|\n|\r){0,64}"
                .new_tree(&mut runner)
                .unwrap()
                .current();

            // Act
            let solution = parser.parse_str(&content, SlnItems::ALL);

            // Assert
            let stripped = content.strip_prefix('\u{FEFF}').unwrap_or(&content);
            let mut reader = raw::LineReader::new(stripped.to_owned());
            let mut lines = 0;
            while reader.next_line().is_some() {
                lines += 1;
            }
            assert_eq!(lines, solution.map().len() + solution.dropped_lines());
        }
    }

    #[test]
    fn parse_utf16_bytes() {
        // Arrange
        let mut bytes = raw::bom_of(encoding_rs::UTF_16LE).to_vec();
        bytes.extend_from_slice(&raw::encode(INCLUDE_IN_BUILD, encoding_rs::UTF_16LE));
        let mut parser = SlnParser::new();

        // Act
        let solution = parser.parse_bytes(&bytes, PathBuf::new(), SlnItems::ALL);

        // Assert
        assert_eq!(encoding_rs::UTF_16LE, solution.encoding());
        assert!(solution.has_bom());
        assert_eq!(1, solution.project_items().len());
        assert_eq!(encoding_rs::UTF_16LE, solution.map()[0].raw.encoding());
    }

    #[test]
    fn parse_reader_and_file_errors() {
        // Arrange
        let mut parser = SlnParser::new();

        // Act
        let from_reader = parser.parse_reader(INCLUDE_IN_BUILD.as_bytes(), SlnItems::ALL);
        let missing = parser.parse_file("/nonexistent/dir/x.sln", SlnItems::ALL);

        // Assert
        assert_eq!(1, from_reader.unwrap().project_items().len());
        assert!(matches!(missing, Err(crate::SlnError::Io(_))));
    }

    pub(crate) const TESTS_FOLDER: &str = "{B0000000-0000-0000-0000-000000000002}";

    pub(crate) const REAL_SOLUTION: &str = "\r
Microsoft Visual Studio Solution File, Format Version 12.00\r
# Visual Studio Version 17\r
VisualStudioVersion = 17.0.31903.59\r
MinimumVisualStudioVersion = 10.0.40219.1\r
Project(\"{2150E333-8FDC-42A3-9474-1A3956D46DE8}\") = \"Solution Items\", \"Solution Items\", \"{B0000000-0000-0000-0000-000000000001}\"\r
\tProjectSection(SolutionItems) = preProject\r
\t\t.editorconfig = .editorconfig\r
\t\tREADME.md = README.md\r
\tEndProjectSection\r
EndProject\r
Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"solr\", \"solr\\solr.csproj\", \"{A0000000-0000-0000-0000-000000000001}\"\r
EndProject\r
Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"solrt\", \"solrt\\solrt.csproj\", \"{A0000000-0000-0000-0000-000000000002}\"\r
\tProjectSection(ProjectDependencies) = postProject\r
\t\t{A0000000-0000-0000-0000-000000000001} = {A0000000-0000-0000-0000-000000000001}\r
\tEndProjectSection\r
EndProject\r
Project(\"{2150E333-8FDC-42A3-9474-1A3956D46DE8}\") = \"tests\", \"tests\", \"{B0000000-0000-0000-0000-000000000002}\"\r
EndProject\r
Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"solr.tests\", \"tests\\solr.tests.csproj\", \"{A0000000-0000-0000-0000-000000000003}\"\r
EndProject\r
Global\r
\tGlobalSection(SolutionConfigurationPlatforms) = preSolution\r
\t\tDebug|Any CPU = Debug|Any CPU\r
\t\tRelease|Any CPU = Release|Any CPU\r
\t\tRelease|x64 = Release|x64\r
\tEndGlobalSection\r
\tGlobalSection(ProjectConfigurationPlatforms) = postSolution\r
\t\t{A0000000-0000-0000-0000-000000000001}.Debug|Any CPU.ActiveCfg = Debug|AnyCPU\r
\t\t{A0000000-0000-0000-0000-000000000001}.Debug|Any CPU.Build.0 = Debug|AnyCPU\r
\t\t{A0000000-0000-0000-0000-000000000001}.Release|Any CPU.ActiveCfg = Release|Any CPU\r
\t\t{A0000000-0000-0000-0000-000000000001}.Release|Any CPU.Build.0 = Release|Any CPU\r
\t\t{A0000000-0000-0000-0000-000000000001}.Release|x64.ActiveCfg = Release|x64\r
\t\t{A0000000-0000-0000-0000-000000000002}.Debug|Any CPU.ActiveCfg = Debug|Any CPU\r
\t\t{A0000000-0000-0000-0000-000000000002}.Debug|Any CPU.Build.0 = Debug|Any CPU\r
\t\t{A0000000-0000-0000-0000-000000000002}.Release|Any CPU.ActiveCfg = Release|Any CPU\r
\t\t{A0000000-0000-0000-0000-000000000003}.Debug|Any CPU.ActiveCfg = Debug|Any CPU\r
\t\t{A0000000-0000-0000-0000-000000000003}.Debug|Any CPU.Build.0 = Debug|Any CPU\r
\tEndGlobalSection\r
\tGlobalSection(SolutionProperties) = preSolution\r
\t\tHideSolutionNode = FALSE\r
\tEndGlobalSection\r
\tGlobalSection(NestedProjects) = preSolution\r
\t\t{B0000000-0000-0000-0000-000000000002} = {B0000000-0000-0000-0000-000000000001}\r
\t\t{A0000000-0000-0000-0000-000000000003} = {B0000000-0000-0000-0000-000000000002}\r
\tEndGlobalSection\r
\tGlobalSection(ExtensibilityGlobals) = postSolution\r
\t\tSolutionGuid = {A1B2C3D4-0000-0000-0000-000000000001}\r
\t\tFlag\r
\tEndGlobalSection\r
EndGlobal\r
";

    pub(crate) const INCLUDE_IN_BUILD: &str = "Microsoft Visual Studio Solution File, Format Version 12.00
Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"P\", \"P\\P.csproj\", \"{AAAAAAAA-0000-0000-0000-000000000000}\"
EndProject
Global
\tGlobalSection(SolutionConfigurationPlatforms) = preSolution
\t\tDebug|Any CPU = Debug|Any CPU
\t\tRelease|Any CPU = Release|Any CPU
\tEndGlobalSection
\tGlobalSection(ProjectConfigurationPlatforms) = postSolution
\t\t{AAAAAAAA-0000-0000-0000-000000000000}.Debug|Any CPU.ActiveCfg = Debug|Any CPU
\t\t{AAAAAAAA-0000-0000-0000-000000000000}.Debug|Any CPU.Build.0 = Debug|Any CPU
\t\t{AAAAAAAA-0000-0000-0000-000000000000}.Debug|Any CPU.Deploy.0 = Debug|Any CPU
\t\t{AAAAAAAA-0000-0000-0000-000000000000}.Release|Any CPU.ActiveCfg = Release|Any CPU
\tEndGlobalSection
EndGlobal
";

    const UNDECLARED: &str = "Global
\tGlobalSection(SolutionConfigurationPlatforms) = preSolution
\t\tDebug|AnyCPU = Debug|AnyCPU
\tEndGlobalSection
\tGlobalSection(ProjectConfigurationPlatforms) = postSolution
\t\t{AAAAAAAA-0000-0000-0000-000000000000}.Debug|Any CPU.ActiveCfg = Debug|AnyCPU
\t\t{AAAAAAAA-0000-0000-0000-000000000000}.Release|Any CPU.ActiveCfg = Release|Any CPU
\t\tmalformed line
\tEndGlobalSection
EndGlobal
";
}
