use std::fmt::{self, Display};

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until},
    character::complete::char,
    combinator::{self, opt, recognize, rest},
    error::{ParseError, VerboseError},
    sequence::{self, tuple},
    IResult,
};
use serde::Serialize;

/// Configuration and platform pair like `Debug|Any CPU`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConfigItem {
    pub configuration: String,
    pub platform: String,
}

/// Configuration pair declared at solution scope
pub type ConfigSln = ConfigItem;

/// Index of a solution configuration inside the owning solution arena
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SlnConfigIx(pub(crate) usize);

impl SlnConfigIx {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl ConfigItem {
    #[must_use]
    pub fn new(configuration: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            configuration: configuration.into(),
            platform: platform.into(),
        }
    }

    /// Parses `configuration|platform` string applying normalization rules.
    /// String without `|` is configuration only with empty platform.
    #[must_use]
    pub fn parse(s: &str, rules: &dyn RuleOfConfig) -> Self {
        let s = s.trim();
        let (configuration, platform) = match configuration::<VerboseError<&str>>(s) {
            Ok((platform, configuration)) => (configuration, platform),
            Err(_) => (s, ""),
        };
        Self {
            configuration: rules.configuration(configuration.trim()),
            platform: rules.platform(platform.trim()),
        }
    }

    /// Compares ignoring case the way Visual Studio does
    #[must_use]
    pub fn is_same(&self, other: &ConfigItem) -> bool {
        self.configuration.eq_ignore_ascii_case(&other.configuration)
            && self.platform.eq_ignore_ascii_case(&other.platform)
    }
}

impl Display for ConfigItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.platform.is_empty() {
            f.write_str(&self.configuration)
        } else {
            write!(f, "{}|{}", self.configuration, self.platform)
        }
    }
}

/// Project configuration mapped to a solution configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigPrj {
    /// Configuration and platform of the project itself
    pub item: ConfigItem,
    pub project_guid: String,
    active_cfg: bool,
    include_in_build: bool,
    include_in_deploy: bool,
    sln: SlnConfigIx,
}

impl ConfigPrj {
    #[must_use]
    pub fn new(item: ConfigItem, project_guid: impl Into<String>, sln: SlnConfigIx) -> Self {
        Self {
            item,
            project_guid: project_guid.into(),
            active_cfg: true,
            include_in_build: false,
            include_in_deploy: false,
            sln,
        }
    }

    /// Whether `.ActiveCfg` record exists for this mapping. Set for
    /// mappings created by hand.
    #[must_use]
    pub fn has_active_cfg(&self) -> bool {
        self.active_cfg
    }

    /// Whether `.Build.0` record exists for this mapping
    #[must_use]
    pub fn include_in_build(&self) -> bool {
        self.include_in_build
    }

    /// Whether `.Deploy.0` record exists for this mapping
    #[must_use]
    pub fn include_in_deploy(&self) -> bool {
        self.include_in_deploy
    }

    /// Link to the owning solution configuration.
    /// Resolve it with [`crate::Solution::solution_config`].
    #[must_use]
    pub fn sln(&self) -> SlnConfigIx {
        self.sln
    }

    pub(crate) fn set_active_cfg(&mut self, value: bool) {
        self.active_cfg = value;
    }

    pub(crate) fn set_include_in_build(&mut self, value: bool) {
        self.include_in_build = value;
    }

    pub(crate) fn set_include_in_deploy(&mut self, value: bool) {
        self.include_in_deploy = value;
    }
}

/// Name normalization applied to configuration text at the point it is parsed
pub trait RuleOfConfig {
    fn platform(&self, name: &str) -> String;
    fn configuration(&self, name: &str) -> String;
}

/// Reconciles historical naming of Visual Studio where `AnyCPU` and
/// `Any CPU` mean the same platform
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRules;

impl RuleOfConfig for DefaultRules {
    fn platform(&self, name: &str) -> String {
        if name.eq_ignore_ascii_case("AnyCPU") {
            "Any CPU".to_owned()
        } else {
            name.to_owned()
        }
    }

    fn configuration(&self, name: &str) -> String {
        name.to_owned()
    }
}

/// Kind of a project configuration record
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConfigTag {
    ActiveCfg,
    Build,
    Deploy,
}

impl ConfigTag {
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            ConfigTag::ActiveCfg => "ActiveCfg",
            ConfigTag::Build => "Build.0",
            ConfigTag::Deploy => "Deploy.0",
        }
    }
}

/// Parsed `{guid}.Debug|Any CPU.Build.0 = Debug|x86` line
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ProjectConfigLine<'a> {
    pub project_guid: &'a str,
    pub solution: &'a str,
    pub tag: ConfigTag,
    pub project: &'a str,
}

impl<'a> ProjectConfigLine<'a> {
    pub(crate) fn parse(line: &'a str) -> Option<Self> {
        let (left, right) = line.split_once('=')?;
        let (_, (project_guid, solution, tag)) =
            project_config::<VerboseError<&str>>(left.trim()).ok()?;
        Some(Self {
            project_guid,
            solution,
            tag,
            project: right.trim(),
        })
    }
}

fn project_config<'a, E>(input: &'a str) -> IResult<&'a str, (&'a str, &'a str, ConfigTag), E>
where
    E: ParseError<&'a str> + std::fmt::Debug,
{
    let parser = sequence::separated_pair(
        guid,
        char('.'),
        tuple((recognize(tuple((opt(configuration), platform))), suffix)),
    );
    combinator::map(parser, |(id, (solution, tag))| (id, solution, tag))(input)
}

pub(crate) fn guid<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str> + std::fmt::Debug,
{
    recognize(sequence::delimited(char('{'), is_not("{}"), char('}')))(input)
}

fn platform<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str> + std::fmt::Debug,
{
    alt((
        take_until(".ActiveCfg"),
        take_until(".Build.0"),
        take_until(".Deploy.0"),
    ))(input)
}

fn suffix<'a, E>(input: &'a str) -> IResult<&'a str, ConfigTag, E>
where
    E: ParseError<&'a str> + std::fmt::Debug,
{
    sequence::terminated(
        alt((
            combinator::value(ConfigTag::ActiveCfg, tag(".ActiveCfg")),
            combinator::value(ConfigTag::Build, tag(".Build.0")),
            combinator::value(ConfigTag::Deploy, tag(".Deploy.0")),
        )),
        rest,
    )(input)
}

fn configuration<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str> + std::fmt::Debug,
{
    sequence::terminated(is_not("|"), char('|'))(input)
}
