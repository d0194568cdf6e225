use std::fmt::{self, Display};

use crate::raw::{LineEnd, RawLine};

/// Stable identity of a handler kind.
///
/// Built-in recognizers have their own variants, externally supplied
/// handlers identify themselves with a unique static name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandlerId {
    VisualStudioVersion,
    Project,
    ProjectSolutionItems,
    NestedProjects,
    SolutionConfigurationPlatforms,
    ProjectConfigurationPlatforms,
    SolutionProperties,
    ExtensibilityGlobals,
    Custom(&'static str),
}

impl Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerId::Custom(name) => f.write_str(name),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Back reference from a section to the handler that recognized it.
/// Carries the handler identity and the co-handlers it declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRef {
    id: HandlerId,
    co_handlers: Vec<HandlerId>,
}

impl HandlerRef {
    #[must_use]
    pub fn new(id: HandlerId, co_handlers: &[HandlerId]) -> Self {
        Self {
            id,
            co_handlers: co_handlers.to_vec(),
        }
    }

    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    #[must_use]
    pub fn co_handlers(&self) -> &[HandlerId] {
        &self.co_handlers
    }
}

/// One line of a solution file together with its owner.
///
/// Sections without a handler are reproduced verbatim on write.
/// Ignored sections are never written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub raw: RawLine,
    pub eol: LineEnd,
    pub handler: Option<HandlerRef>,
    pub ignore: bool,
}

impl Section {
    /// Creates unowned section terminated by CRLF
    #[must_use]
    pub fn new(raw: RawLine) -> Self {
        Self {
            raw,
            eol: LineEnd::default(),
            handler: None,
            ignore: false,
        }
    }

    #[must_use]
    pub fn with_handler(raw: RawLine, eol: LineEnd, handler: Option<HandlerRef>) -> Self {
        Self {
            raw,
            eol,
            handler,
            ignore: false,
        }
    }

    #[must_use]
    pub fn handler_id(&self) -> Option<HandlerId> {
        self.handler.as_ref().map(HandlerRef::id)
    }

    #[must_use]
    pub fn is_owned_by(&self, id: HandlerId) -> bool {
        self.handler_id() == Some(id)
    }
}
