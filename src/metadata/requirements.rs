//! Pinned build dependency manifest (`requirements-build.txt`).
//!
//! Only the subset of the pip requirements format used for build pins is
//! understood: `name<specifier>` optionally followed by `; <marker>`, where
//! the marker compares `sys_platform` or `platform_system` with `==`/`!=`,
//! possibly combined with `and` / `or`.

use crate::bundler::error::{ErrorExt, Result};
use regex::Regex;
use std::path::Path;

const REQUIREMENT_PATTERN: &str =
    r"^(?P<name>[A-Za-z0-9][A-Za-z0-9._-]*(?:\[[^\]]*\])?)\s*(?P<spec>(?:[<>=!~]=?|===)[^;]*)?$";

const MARKER_PATTERN: &str =
    r#"^(?P<var>sys_platform|platform_system)\s*(?P<op>==|!=)\s*["'](?P<value>[^"']+)["']$"#;

const OR_PATTERN: &str = r"\s+or\s+";
const AND_PATTERN: &str = r"\s+and\s+";

/// Platform condition attached to a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// `sys_platform == '<value>'` (or `platform_system`, lower-cased).
    Is(String),
    /// `sys_platform != '<value>'`.
    IsNot(String),
    /// Holds when any of the clauses holds.
    Any(Vec<Marker>),
    /// Holds when every clause holds.
    All(Vec<Marker>),
    /// A clause on a variable this parser does not evaluate; treated as
    /// holding everywhere.
    Other(String),
}

impl Marker {
    /// Whether the marker holds on the given `sys_platform`.
    pub fn holds_on(&self, platform: &str) -> bool {
        match self {
            Marker::Is(value) => platform_matches(value, platform),
            Marker::IsNot(value) => !platform_matches(value, platform),
            Marker::Any(clauses) => clauses.iter().any(|m| m.holds_on(platform)),
            Marker::All(clauses) => clauses.iter().all(|m| m.holds_on(platform)),
            Marker::Other(_) => true,
        }
    }
}

/// Compiled marker grammar. `or` binds looser than `and`.
struct MarkerParser {
    or_re: Regex,
    and_re: Regex,
    clause_re: Regex,
}

impl MarkerParser {
    fn new() -> Result<Self> {
        Ok(Self {
            or_re: Regex::new(OR_PATTERN)?,
            and_re: Regex::new(AND_PATTERN)?,
            clause_re: Regex::new(MARKER_PATTERN)?,
        })
    }

    fn parse(&self, text: &str) -> Marker {
        let mut any: Vec<Marker> = self
            .or_re
            .split(text.trim())
            .map(|alternative| {
                let mut all: Vec<Marker> = self
                    .and_re
                    .split(alternative.trim())
                    .map(|clause| self.parse_clause(clause))
                    .collect();
                if all.len() == 1 {
                    all.remove(0)
                } else {
                    Marker::All(all)
                }
            })
            .collect();

        if any.len() == 1 {
            any.remove(0)
        } else {
            Marker::Any(any)
        }
    }

    fn parse_clause(&self, clause: &str) -> Marker {
        let clause = clause.trim().trim_start_matches('(').trim_end_matches(')').trim();
        match self.clause_re.captures(clause) {
            Some(mc) => {
                let value = mc["value"].to_ascii_lowercase();
                if &mc["op"] == "==" {
                    Marker::Is(value)
                } else {
                    Marker::IsNot(value)
                }
            }
            None => Marker::Other(clause.to_string()),
        }
    }
}

/// One line of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Distribution name, e.g. `PyInstaller`.
    pub name: String,
    /// Version specifier, e.g. `==6.3.0`. Empty when unconstrained.
    pub specifier: String,
    /// Platform condition.
    pub marker: Option<Marker>,
    /// 1-based line number in the manifest.
    pub line: usize,
}

impl Requirement {
    /// Whether the version is pinned exactly.
    pub fn is_pinned(&self) -> bool {
        self.specifier.starts_with("==") && !self.specifier.contains(',')
    }

    /// Whether the requirement applies on the given `sys_platform`.
    pub fn applies_to(&self, platform: &str) -> bool {
        self.marker.as_ref().is_none_or(|m| m.holds_on(platform))
    }
}

/// `platform_system` uses `Darwin`, `sys_platform` uses `darwin`.
fn platform_matches(value: &str, platform: &str) -> bool {
    value.eq_ignore_ascii_case(platform)
}

/// Parsed manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementsManifest {
    requirements: Vec<Requirement>,
}

impl RequirementsManifest {
    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).fs_context("reading requirements manifest", path)?;
        Self::parse(&text)
    }

    /// Parse manifest text.
    ///
    /// Comments, blank lines and pip option lines (`-r`, `--hash`, ...) are
    /// skipped. A line that is not a recognisable requirement is an error.
    pub fn parse(text: &str) -> Result<Self> {
        let requirement_re = Regex::new(REQUIREMENT_PATTERN)?;
        let markers = MarkerParser::new()?;

        let mut requirements = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() || line.starts_with('-') {
                continue;
            }

            let (spec_part, marker_part) = match line.split_once(';') {
                Some((spec, marker)) => (spec.trim(), Some(marker.trim())),
                None => (line, None),
            };

            let caps = requirement_re.captures(spec_part).ok_or_else(|| {
                crate::bundler::Error::InvalidConfig(format!(
                    "line {}: cannot parse requirement '{}'",
                    index + 1,
                    line
                ))
            })?;

            let marker = marker_part.map(|m| markers.parse(m));

            requirements.push(Requirement {
                name: caps["name"].to_string(),
                specifier: caps
                    .name("spec")
                    .map(|s| s.as_str().replace(' ', ""))
                    .unwrap_or_default(),
                marker,
                line: index + 1,
            });
        }

        Ok(Self { requirements })
    }

    /// All requirements in manifest order.
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Requirements that apply on `platform` (a `sys_platform` value).
    pub fn for_platform<'a>(&'a self, platform: &'a str) -> impl Iterator<Item = &'a Requirement> {
        self.requirements.iter().filter(move |r| r.applies_to(platform))
    }

    /// Requirements applying on `platform` that are not pinned with `==`.
    pub fn unpinned_for<'a>(&'a self, platform: &'a str) -> Vec<&'a Requirement> {
        self.for_platform(platform).filter(|r| !r.is_pinned()).collect()
    }
}
