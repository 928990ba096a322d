//! Catalog snapshot
//!
//! Catalogs are derived from the reference sheet once and then passed by
//! reference into every operation that needs them. They are never mutated;
//! a refresh builds a new snapshot.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result};

/// team → header text of the team's description column
///
/// Keeps reference-sheet row order. This map decides which teams make up
/// the dependency sub-region of a row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamMap(IndexMap<String, String>);

impl TeamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair; a repeated team keeps its position and takes the new header.
    pub fn insert(&mut self, team: impl Into<String>, description_header: impl Into<String>) {
        self.0.insert(team.into(), description_header.into());
    }

    /// Description header of `team`. An exact key wins, otherwise the first
    /// team equal after trimming and ignoring case, as header columns match.
    pub fn description_header(&self, team: &str) -> Option<&str> {
        if let Some(header) = self.0.get(team) {
            return Some(header);
        }
        let wanted = team.trim().to_lowercase();
        self.0
            .iter()
            .find(|(key, _)| key.trim().to_lowercase() == wanted)
            .map(|(_, header)| header.as_str())
    }

    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TeamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TeamMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// team → group (train / CoE) the team rolls up into
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupMap(IndexMap<String, String>);

impl GroupMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, team: impl Into<String>, group: impl Into<String>) {
        self.0.insert(team.into(), group.into());
    }

    pub fn group_of(&self, team: &str) -> Option<&str> {
        self.0.get(team).map(String::as_str)
    }

    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for GroupMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = GroupMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Read-only catalog snapshot
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalogs {
    pub statuses: Vec<String>,
    /// Priority quarters (`Q_RADICADO` values)
    pub priorities: Vec<String>,
    pub requesters: Vec<String>,
    pub areas: Vec<String>,
    pub initiatives: Vec<String>,
    /// Sorted distinct groups of the group map
    pub groups: Vec<String>,
    /// Sorted union of teams known to either map
    pub teams: Vec<String>,
    pub team_map: TeamMap,
    pub group_map: GroupMap,
}

impl Catalogs {
    /// True when nothing was loaded, e.g. after a degraded load
    pub fn is_empty(&self) -> bool {
        self.team_map.is_empty()
            && self.group_map.is_empty()
            && self.statuses.is_empty()
            && self.priorities.is_empty()
            && self.requesters.is_empty()
            && self.areas.is_empty()
            && self.initiatives.is_empty()
    }

    /// The team map, or `NoTeamMapping` when it is empty.
    pub fn require_team_map(&self) -> Result<&TeamMap> {
        if self.team_map.is_empty() {
            Err(LedgerError::NoTeamMapping)
        } else {
            Ok(&self.team_map)
        }
    }

    /// Teams of the team map that roll up into `group`
    pub fn teams_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let group = group.trim();
        self.team_map
            .teams()
            .filter(move |team| self.group_map.group_of(team).map(str::trim) == Some(group))
    }
}
