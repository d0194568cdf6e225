use std::mem;

use crate::api::SlnHeader;
use crate::parser::SlnItems;
use crate::raw::RawLine;
use crate::section::HandlerId;
use crate::svc::{Scope, Svc};

use super::{key_value, SlnHandler};

const FORMAT_PREFIX: &str = "Microsoft Visual Studio Solution File, Format Version ";
const PRODUCT_PREFIX: &str = "# ";
const VS_VERSION: &str = "VisualStudioVersion";
const MIN_VS_VERSION: &str = "MinimumVisualStudioVersion";

/// Format line, product comment and Visual Studio version records
#[derive(Debug, Default)]
pub struct VersionHandler {
    header: Option<SlnHeader>,
}

impl SlnHandler for VersionHandler {
    fn id(&self) -> HandlerId {
        HandlerId::VisualStudioVersion
    }

    fn is_activated(&self, svc: &Svc<'_>) -> bool {
        svc.items().contains(SlnItems::HEADER) && svc.scope() == Scope::Root
    }

    fn condition(&self, line: &RawLine) -> bool {
        let t = line.trimmed();
        t.starts_with(FORMAT_PREFIX)
            || t.starts_with(PRODUCT_PREFIX)
            || t.starts_with(VS_VERSION)
            || t.starts_with(MIN_VS_VERSION)
    }

    fn positioned(&mut self, _svc: &mut Svc<'_>, line: &RawLine) -> bool {
        let t = line.trimmed();
        let header = self.header.get_or_insert_with(SlnHeader::default);
        if let Some(version) = t.strip_prefix(FORMAT_PREFIX) {
            header.format_version = version.trim().to_owned();
            return true;
        }
        if let Some(product) = t.strip_prefix(PRODUCT_PREFIX) {
            header.product = product.trim().to_owned();
            return true;
        }
        match key_value(t) {
            (VS_VERSION, Some(v)) => header.visual_studio_version = Some(v.to_owned()),
            (MIN_VS_VERSION, Some(v)) => header.minimum_visual_studio_version = Some(v.to_owned()),
            _ => return false,
        }
        true
    }

    fn pre_processing(&mut self, _svc: &mut Svc<'_>) {
        self.header = None;
    }

    fn post_processing(&mut self, svc: &mut Svc<'_>) {
        if let Some(header) = mem::take(&mut self.header) {
            svc.sln().set_header(header);
        }
    }
}
