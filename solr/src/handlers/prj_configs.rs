use crate::config::{ConfigItem, ConfigTag, ProjectConfigLine};
use crate::parser::SlnItems;
use crate::raw::RawLine;
use crate::section::HandlerId;
use crate::svc::{Scope, Svc};

use super::{is_global_section, read_block, SlnHandler};

/// `GlobalSection(ProjectConfigurationPlatforms)` that maps project
/// configurations to solution ones
#[derive(Debug, Default)]
pub struct ProjectConfigsHandler;

impl SlnHandler for ProjectConfigsHandler {
    fn id(&self) -> HandlerId {
        HandlerId::ProjectConfigurationPlatforms
    }

    fn is_activated(&self, svc: &Svc<'_>) -> bool {
        svc.items().contains(SlnItems::PROJECT_CONFS) && svc.scope() == Scope::GlobalSection
    }

    fn condition(&self, line: &RawLine) -> bool {
        is_global_section(line, "ProjectConfigurationPlatforms")
    }

    fn positioned(&mut self, svc: &mut Svc<'_>, _line: &RawLine) -> bool {
        for l in read_block(svc, &*self, "EndGlobalSection") {
            if l.trimmed().is_empty() {
                continue;
            }
            let Some(record) = ProjectConfigLine::parse(l.trimmed()) else {
                tracing::error!(line = l.trimmed(), "Project configuration record is malformed");
                continue;
            };
            let solution = ConfigItem::parse(record.solution, svc.rules());
            let project = ConfigItem::parse(record.project, svc.rules());
            let ix = svc.sln().link_config(solution);
            let config = svc.sln().project_config(record.project_guid, ix, project);
            match record.tag {
                ConfigTag::ActiveCfg => config.set_active_cfg(true),
                ConfigTag::Build => config.set_include_in_build(true),
                ConfigTag::Deploy => config.set_include_in_deploy(true),
            }
        }
        true
    }
}
