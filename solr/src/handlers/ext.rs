use crate::parser::SlnItems;
use crate::raw::RawLine;
use crate::section::HandlerId;
use crate::svc::{Scope, Svc};

use super::{is_global_section, key_value, read_block, SlnHandler};

/// `GlobalSection(ExtensibilityGlobals)` with free form records
#[derive(Debug, Default)]
pub struct ExtensibilityHandler;

impl SlnHandler for ExtensibilityHandler {
    fn id(&self) -> HandlerId {
        HandlerId::ExtensibilityGlobals
    }

    fn is_activated(&self, svc: &Svc<'_>) -> bool {
        svc.items().contains(SlnItems::EXT_ITEMS) && svc.scope() == Scope::GlobalSection
    }

    fn condition(&self, line: &RawLine) -> bool {
        is_global_section(line, "ExtensibilityGlobals")
    }

    fn positioned(&mut self, svc: &mut Svc<'_>, _line: &RawLine) -> bool {
        for l in read_block(svc, &*self, "EndGlobalSection") {
            match key_value(l.trimmed()) {
                ("", _) => {}
                (key, value) => svc.sln().add_ext_item(key, value.map(str::to_owned)),
            }
        }
        true
    }
}
