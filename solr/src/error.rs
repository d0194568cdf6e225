use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

use crate::section::HandlerId;

/// Errors produced by parsing and writing solutions.
///
/// Malformed lines are not errors: they are recovered with a diagnostic
/// and kept verbatim so that the file can still be written back.
#[derive(Debug, Error, Diagnostic)]
pub enum SlnError {
    #[error(transparent)]
    #[diagnostic(code(solr::io))]
    Io(#[from] std::io::Error),

    /// Co-handler registered for writing without its parent handler
    #[error(
        "Define parent handler {} instead of '{handler}'",
        .parents.iter().join(", ")
    )]
    #[diagnostic(
        code(solr::co_handler_rule),
        help("Only the parent handler may render sections it subsumes")
    )]
    CoHandlerParentRequired {
        handler: HandlerId,
        parents: Vec<HandlerId>,
    },

    /// Parent handler registered for writing without all of its co-handlers
    #[error(
        "Parent handler '{handler}' requires writers for {}",
        .co_handlers.iter().join(", ")
    )]
    #[diagnostic(
        code(solr::co_handler_rule),
        help("Register writers for every co-handler of the parent handler")
    )]
    CoHandlerMissing {
        handler: HandlerId,
        co_handlers: Vec<HandlerId>,
    },

    #[error("'{0}' is required and cannot be empty")]
    #[diagnostic(code(solr::missing_argument))]
    MissingArgument(&'static str),

    #[error("Content of project {0} is neither on disk nor in raw xml projects")]
    #[diagnostic(
        code(solr::project_content),
        help("Add the project content into raw xml projects of the parser")
    )]
    ProjectContent(String),

    #[error("Solution writer destination has been already released")]
    #[diagnostic(code(solr::closed))]
    Closed,
}

impl SlnError {
    /// Shows whether the error is a violation of co-handler rules
    #[must_use]
    pub fn is_co_handler_rule(&self) -> bool {
        matches!(
            self,
            SlnError::CoHandlerParentRequired { .. } | SlnError::CoHandlerMissing { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SlnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn co_handler_messages() {
        // Arrange
        let parent = SlnError::CoHandlerParentRequired {
            handler: HandlerId::ProjectSolutionItems,
            parents: vec![HandlerId::NestedProjects],
        };
        let missing = SlnError::CoHandlerMissing {
            handler: HandlerId::NestedProjects,
            co_handlers: vec![HandlerId::ProjectSolutionItems],
        };

        // Act
        let parent_msg = parent.to_string();
        let missing_msg = missing.to_string();

        // Assert
        assert_eq!(
            "Define parent handler NestedProjects instead of 'ProjectSolutionItems'",
            parent_msg
        );
        assert_eq!(
            "Parent handler 'NestedProjects' requires writers for ProjectSolutionItems",
            missing_msg
        );
        assert!(parent.is_co_handler_rule());
        assert!(missing.is_co_handler_rule());
        assert!(!SlnError::Closed.is_co_handler_rule());
    }
}
