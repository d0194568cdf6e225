use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;

use crate::api::SolutionBuilder;
use crate::config::RuleOfConfig;
use crate::handlers::{LineAct, SlnHandler};
use crate::parser::SlnItems;
use crate::raw::{LineEnd, LineReader, RawLine};
use crate::section::{HandlerId, Section};

/// Block of the solution file the last read line belongs to
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Root,
    Project,
    ProjectSection,
    Global,
    GlobalSection,
}

impl Scope {
    fn next(self, trimmed: &str) -> Self {
        if trimmed.starts_with("ProjectSection(") {
            Scope::ProjectSection
        } else if trimmed == "EndProjectSection" {
            Scope::Project
        } else if trimmed.starts_with("Project(") {
            Scope::Project
        } else if trimmed == "EndProject" || trimmed == "EndGlobal" {
            Scope::Root
        } else if trimmed.starts_with("GlobalSection(") {
            Scope::GlobalSection
        } else if trimmed == "EndGlobalSection" || trimmed == "Global" {
            Scope::Global
        } else {
            self
        }
    }
}

/// Parse pass context shared by the driver and handlers.
///
/// Owns the line stream, the facts builder and the sections produced so far.
pub struct Svc<'p> {
    reader: LineReader,
    encoding: &'static Encoding,
    sln: SolutionBuilder,
    udata: HashMap<HandlerId, Box<dyn Any>>,
    items: SlnItems,
    rules: &'p dyn RuleOfConfig,
    solution_dir: PathBuf,
    scope: Scope,
    last_eol: LineEnd,
    map: Vec<Section>,
    dropped: usize,
}

impl<'p> Svc<'p> {
    pub(crate) fn new(
        text: String,
        encoding: &'static Encoding,
        items: SlnItems,
        rules: &'p dyn RuleOfConfig,
        solution_dir: PathBuf,
    ) -> Self {
        Self {
            reader: LineReader::new(text),
            encoding,
            sln: SolutionBuilder::default(),
            udata: HashMap::new(),
            items,
            rules,
            solution_dir,
            scope: Scope::Root,
            last_eol: LineEnd::default(),
            map: Vec::new(),
            dropped: 0,
        }
    }

    /// Reads next line without tracking it
    pub fn read_line(&mut self) -> Option<RawLine> {
        let (text, eol) = self.reader.next_line()?;
        let line = RawLine::with_encoding(text, self.encoding);
        self.last_eol = eol;
        self.scope = self.scope.next(line.trimmed());
        Some(line)
    }

    /// Reads next line and tracks it as owned by the handler specified
    pub fn read_line_for<H: SlnHandler + ?Sized>(&mut self, handler: &H) -> Option<RawLine> {
        let line = self.read_line()?;
        self.track(line.clone(), Some(handler));
        Some(line)
    }

    /// Terminator of the last line read
    #[must_use]
    pub fn last_eol(&self) -> LineEnd {
        self.last_eol
    }

    /// Records the line as a section. Line is verbatim if handler is `None`.
    pub fn track<H: SlnHandler + ?Sized>(&mut self, line: RawLine, handler: Option<&H>) {
        let at = self.map.len();
        self.track_at(at, line, self.last_eol, handler);
    }

    pub(crate) fn track_at<H: SlnHandler + ?Sized>(
        &mut self,
        at: usize,
        line: RawLine,
        eol: LineEnd,
        handler: Option<&H>,
    ) {
        let Some(handler) = handler else {
            self.map.insert(at, Section::with_handler(line, eol, None));
            return;
        };
        let mut section = Section::with_handler(line, eol, Some(handler.handler_ref()));
        match handler.line_control() {
            LineAct::Process => {}
            LineAct::Ignore => section.ignore = true,
            LineAct::Drop => {
                self.dropped += 1;
                return;
            }
        }
        self.map.insert(at, section);
    }

    /// Starts the stream from the beginning forgetting all tracked lines
    pub fn reset_stream(&mut self) {
        self.reader.reset();
        self.scope = Scope::Root;
        self.last_eol = LineEnd::default();
        self.map.clear();
        self.dropped = 0;
    }

    pub fn sln(&mut self) -> &mut SolutionBuilder {
        &mut self.sln
    }

    #[must_use]
    pub fn solution(&self) -> &SolutionBuilder {
        &self.sln
    }

    /// Handler private data surviving between lines
    pub fn udata(&mut self) -> &mut HashMap<HandlerId, Box<dyn Any>> {
        &mut self.udata
    }

    #[must_use]
    pub fn items(&self) -> SlnItems {
        self.items
    }

    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    #[must_use]
    pub fn rules(&self) -> &dyn RuleOfConfig {
        self.rules
    }

    #[must_use]
    pub fn solution_dir(&self) -> &Path {
        &self.solution_dir
    }

    pub(crate) fn tracked(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn into_parts(self) -> (SolutionBuilder, Vec<Section>, usize) {
        (self.sln, self.map, self.dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefaultRules;
    use encoding_rs::UTF_8;
    use rstest::rstest;

    struct Dropper;

    impl SlnHandler for Dropper {
        fn id(&self) -> HandlerId {
            HandlerId::Custom("Dropper")
        }

        fn line_control(&self) -> LineAct {
            LineAct::Drop
        }

        fn is_activated(&self, _svc: &Svc<'_>) -> bool {
            true
        }

        fn condition(&self, _line: &RawLine) -> bool {
            true
        }

        fn positioned(&mut self, _svc: &mut Svc<'_>, _line: &RawLine) -> bool {
            true
        }
    }

    fn svc(text: &str) -> Svc<'static> {
        Svc::new(
            text.to_owned(),
            UTF_8,
            SlnItems::ALL,
            &DefaultRules,
            PathBuf::new(),
        )
    }

    #[rstest]
    #[case("Project(\"{A}\") = \"a\", \"a\", \"{B}\"", Scope::Root, Scope::Project)]
    #[case("\tProjectSection(SolutionItems) = preProject", Scope::Project, Scope::ProjectSection)]
    #[case("EndProjectSection", Scope::ProjectSection, Scope::Project)]
    #[case("EndProject", Scope::Project, Scope::Root)]
    #[case("Global", Scope::Root, Scope::Global)]
    #[case("\tGlobalSection(SolutionProperties) = preSolution", Scope::Global, Scope::GlobalSection)]
    #[case("\tEndGlobalSection", Scope::GlobalSection, Scope::Global)]
    #[case("EndGlobal", Scope::Global, Scope::Root)]
    #[case("\t\tHideSolutionNode = FALSE", Scope::GlobalSection, Scope::GlobalSection)]
    #[trace]
    fn scope_transitions(#[case] line: &str, #[case] from: Scope, #[case] expected: Scope) {
        // Arrange
        let trimmed = line.trim();

        // Act
        let actual = from.next(trimmed);

        // Assert
        assert_eq!(expected, actual);
    }

    #[test]
    fn read_line_keeps_terminator() {
        // Arrange
        let mut svc = svc("Global\r\n\tGlobalSection(A) = preSolution\n");

        // Act
        let first = svc.read_line().unwrap();
        let first_eol = svc.last_eol();
        let second = svc.read_line().unwrap();

        // Assert
        assert_eq!("Global", first.text());
        assert_eq!(LineEnd::CrLf, first_eol);
        assert_eq!("\tGlobalSection(A) = preSolution", second.text());
        assert_eq!(LineEnd::Lf, svc.last_eol());
        assert_eq!(Scope::GlobalSection, svc.scope());
        assert!(svc.read_line().is_none());
    }

    #[test]
    fn track_respects_line_control() {
        // Arrange
        let mut svc = svc("a\nb\nc");

        // Act
        let a = svc.read_line().unwrap();
        svc.track::<Dropper>(a, None);
        svc.read_line_for(&Dropper);
        let tracked = svc.tracked();

        // Assert
        assert_eq!(1, tracked);
        let (_, map, dropped) = svc.into_parts();
        assert_eq!(1, dropped);
        assert_eq!("a", map[0].raw.text());
        assert!(map[0].handler.is_none());
    }

    #[test]
    fn reset_stream_starts_over() {
        // Arrange
        let mut svc = svc("Global\nEndGlobal");
        while let Some(line) = svc.read_line() {
            svc.track::<Dropper>(line, None);
        }

        // Act
        svc.reset_stream();

        // Assert
        assert_eq!(0, svc.tracked());
        assert_eq!(Scope::Root, svc.scope());
        assert_eq!("Global", svc.read_line().unwrap().text());
    }

    #[test]
    fn udata_survives_between_lines() {
        // Arrange
        let mut svc = svc("");
        let id = HandlerId::Custom("Counter");

        // Act
        svc.udata().insert(id, Box::new(2_usize));
        let value = svc
            .udata()
            .get(&id)
            .and_then(|v| v.downcast_ref::<usize>())
            .copied();

        // Assert
        assert_eq!(Some(2), value);
    }
}
