//! Table-driven column resolution.
//!
//! Every alias-resolved field goes through `match_alias`; full names go
//! through the ordered `NameRule` list. A resolved column is taken out of
//! the frame so no later field (and no extra column) can see it again.

use serde_json::Value;

use super::config::NameRule;
use super::frame::Frame;

/// A canonical slot filled from one input column
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub source: String,
    pub values: Vec<Value>,
}

/// Raw name material pulled out by the first matching rule
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedName {
    Pair {
        first: Option<Resolved>,
        last: Option<Resolved>,
    },
    Single(Resolved),
}

impl ResolvedName {
    /// Input columns this name was built from
    pub fn sources(&self) -> Vec<&str> {
        match self {
            ResolvedName::Pair { first, last } => first
                .iter()
                .chain(last.iter())
                .map(|r| r.source.as_str())
                .collect(),
            ResolvedName::Single(resolved) => vec![resolved.source.as_str()],
        }
    }
}

/// First alias (in priority order) that names a present column.
/// `present` must answer for lower-cased column names.
pub fn match_alias<'a, F>(present: F, aliases: &'a [String]) -> Option<&'a str>
where
    F: Fn(&str) -> bool,
{
    aliases
        .iter()
        .map(String::as_str)
        .find(|&alias| present(alias))
}

/// Claims the first matching alias column out of the frame
pub fn resolve_field(frame: &mut Frame, aliases: &[String]) -> Option<Resolved> {
    let source = match_alias(|name| frame.contains(name), aliases)?.to_string();
    let values = frame.take(&source)?;
    Some(Resolved { source, values })
}

/// Applies name rules in order and stops at the first one that matches.
/// A pair rule matches when either of its columns is present.
pub fn resolve_name(frame: &mut Frame, rules: &[NameRule]) -> Option<ResolvedName> {
    let rule = rules.iter().find(|rule| match rule {
        NameRule::Pair { first, last } => frame.contains(first) || frame.contains(last),
        NameRule::Single { column } => frame.contains(column),
    })?;

    match rule {
        NameRule::Pair { first, last } => {
            let first = take_resolved(frame, first);
            let last = take_resolved(frame, last);
            Some(ResolvedName::Pair { first, last })
        }
        NameRule::Single { column } => take_resolved(frame, column).map(ResolvedName::Single),
    }
}

fn take_resolved(frame: &mut Frame, name: &str) -> Option<Resolved> {
    frame.take(name).map(|values| Resolved {
        source: name.to_string(),
        values,
    })
}
