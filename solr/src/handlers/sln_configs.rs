use std::mem;

use crate::config::{ConfigItem, ConfigSln, SlnConfigIx};
use crate::parser::SlnItems;
use crate::raw::RawLine;
use crate::section::HandlerId;
use crate::svc::{Scope, Svc};

use super::{is_global_section, key_value, read_block, SlnHandler};

const DEFAULT_CONFIGURATION: &str = "Debug";
const PREFERRED_PLATFORMS: [&str; 4] = ["Any CPU", "Mixed Platforms", "x86", "Win32"];

/// `GlobalSection(SolutionConfigurationPlatforms)` that declares
/// solution configurations
#[derive(Debug, Default)]
pub struct SolutionConfigsHandler {
    pending: Vec<ConfigSln>,
}

impl SolutionConfigsHandler {
    fn flush(&mut self, svc: &mut Svc<'_>) {
        if self.pending.is_empty() {
            return;
        }
        for config in mem::take(&mut self.pending) {
            svc.sln().declare_config(config);
        }
        if svc.items().contains(SlnItems::DEFAULT_CONFIG) {
            let declared: Vec<(SlnConfigIx, &ConfigSln)> = svc.solution().solution_configs().collect();
            if let Some(ix) = select_default(&declared) {
                svc.sln().set_default_config(ix);
            }
        }
    }
}

impl SlnHandler for SolutionConfigsHandler {
    fn id(&self) -> HandlerId {
        HandlerId::SolutionConfigurationPlatforms
    }

    fn is_activated(&self, svc: &Svc<'_>) -> bool {
        svc.items().intersects(
            SlnItems::SOLUTION_CONFS | SlnItems::PROJECT_CONFS | SlnItems::DEFAULT_CONFIG,
        ) && svc.scope() == Scope::GlobalSection
    }

    fn condition(&self, line: &RawLine) -> bool {
        is_global_section(line, "SolutionConfigurationPlatforms")
    }

    fn positioned(&mut self, svc: &mut Svc<'_>, _line: &RawLine) -> bool {
        for l in read_block(svc, &*self, "EndGlobalSection") {
            let (left, _) = key_value(l.trimmed());
            if left.is_empty() {
                continue;
            }
            self.pending.push(ConfigItem::parse(left, svc.rules()));
        }
        self.flush(svc);
        true
    }

    fn pre_processing(&mut self, _svc: &mut Svc<'_>) {
        self.pending.clear();
    }

    fn post_processing(&mut self, svc: &mut Svc<'_>) {
        self.flush(svc);
    }
}

/// `Debug` with the most common platform, any `Debug` or the first one
fn select_default(configs: &[(SlnConfigIx, &ConfigSln)]) -> Option<SlnConfigIx> {
    let debug = |c: &ConfigSln| c.configuration.eq_ignore_ascii_case(DEFAULT_CONFIGURATION);
    PREFERRED_PLATFORMS
        .iter()
        .find_map(|p| {
            configs
                .iter()
                .find(|(_, c)| debug(c) && c.platform.eq_ignore_ascii_case(p))
        })
        .or_else(|| configs.iter().find(|(_, c)| debug(c)))
        .or_else(|| configs.first())
        .map(|(ix, _)| *ix)
}
