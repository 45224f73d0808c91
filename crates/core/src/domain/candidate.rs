use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

impl CandidateId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl GroupId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CandidateId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reviewer registered in a channel, tagged with the groups it can be drawn for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: CandidateId,
    #[serde(default)]
    pub groups: BTreeSet<GroupId>,
}

impl Candidate {
    pub fn new(name: CandidateId, groups: impl IntoIterator<Item = GroupId>) -> Self {
        Self { name, groups: groups.into_iter().collect() }
    }

    pub fn ungrouped(name: CandidateId) -> Self {
        Self { name, groups: BTreeSet::new() }
    }

    pub fn belongs_to(&self, group: &GroupId) -> bool {
        self.groups.contains(group)
    }
}

/// Which slice of a channel's candidates a request may draw from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum GroupFilter {
    #[default]
    Any,
    Specific(GroupId),
}

impl GroupFilter {
    /// Keyword accepted in place of a group name to mean "every candidate".
    pub const ANY_KEYWORD: &'static str = "all";

    pub fn matches(&self, candidate: &Candidate) -> bool {
        match self {
            Self::Any => true,
            Self::Specific(group) => candidate.belongs_to(group),
        }
    }
}

impl From<Option<GroupId>> for GroupFilter {
    fn from(value: Option<GroupId>) -> Self {
        value.map_or(Self::Any, Self::Specific)
    }
}

impl FromStr for GroupFilter {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(Self::ANY_KEYWORD) {
            return Ok(Self::Any);
        }
        Ok(Self::Specific(GroupId(trimmed.to_owned())))
    }
}

impl fmt::Display for GroupFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(Self::ANY_KEYWORD),
            Self::Specific(group) => f.write_str(group.as_str()),
        }
    }
}
