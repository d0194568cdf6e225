use crate::parser::SlnItems;
use crate::raw::RawLine;
use crate::section::HandlerId;
use crate::svc::{Scope, Svc};

use super::{is_global_section, key_value, read_block, SlnHandler};

/// `GlobalSection(SolutionProperties)`
#[derive(Debug, Default)]
pub struct PropertiesHandler;

impl SlnHandler for PropertiesHandler {
    fn id(&self) -> HandlerId {
        HandlerId::SolutionProperties
    }

    fn is_activated(&self, svc: &Svc<'_>) -> bool {
        svc.items().contains(SlnItems::PROPERTIES) && svc.scope() == Scope::GlobalSection
    }

    fn condition(&self, line: &RawLine) -> bool {
        is_global_section(line, "SolutionProperties")
    }

    fn positioned(&mut self, svc: &mut Svc<'_>, _line: &RawLine) -> bool {
        for l in read_block(svc, &*self, "EndGlobalSection") {
            match key_value(l.trimmed()) {
                ("", _) => {}
                (key, value) => svc.sln().set_property(key, value.unwrap_or_default()),
            }
        }
        true
    }
}
