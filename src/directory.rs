use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub type TeamId = u32;

/// Shown wherever an id cannot be resolved against the directory.
pub const UNKNOWN_TEAM: &str = "Unknown Team";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    #[serde(deserialize_with = "team_id_from_number_or_string")]
    pub id: TeamId,
    pub name: String,
    // Anything else the service attaches to a team (abbreviation, conference, ...).
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl TeamRecord {
    pub fn new(id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            metadata: Map::new(),
        }
    }
}

/// Id-indexed team list. Never mutated after construction; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    teams: Vec<TeamRecord>,
    index: HashMap<TeamId, usize>,
    duplicates: usize,
}

impl TeamDirectory {
    pub fn new(records: Vec<TeamRecord>) -> Self {
        let mut teams = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());
        let mut duplicates = 0;
        for record in records {
            if index.contains_key(&record.id) {
                duplicates += 1;
                continue;
            }
            index.insert(record.id, teams.len());
            teams.push(record);
        }
        Self {
            teams,
            index,
            duplicates,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TeamId) -> Option<&TeamRecord> {
        self.index.get(&id).map(|&i| &self.teams[i])
    }

    /// Exact match first, then a trimmed case-insensitive match.
    pub fn find_by_name(&self, name: &str) -> Option<&TeamRecord> {
        if let Some(team) = self.teams.iter().find(|t| t.name == name) {
            return Some(team);
        }
        let needle = name.trim();
        self.teams
            .iter()
            .find(|t| t.name.trim().eq_ignore_ascii_case(needle))
    }

    pub fn display_name(&self, id: TeamId) -> &str {
        self.get(id).map(|t| t.name.as_str()).unwrap_or(UNKNOWN_TEAM)
    }

    pub fn teams(&self) -> &[TeamRecord] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Records dropped because their id was already taken.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

#[derive(Debug, Clone, Default)]
pub enum DirectoryState {
    #[default]
    NotLoaded,
    Loading,
    Ready(Arc<TeamDirectory>),
    Unavailable(String),
}

impl DirectoryState {
    pub fn directory(&self) -> Option<&TeamDirectory> {
        match self {
            DirectoryState::Ready(dir) => Some(dir.as_ref()),
            _ => None,
        }
    }

    /// Ready or failed: nothing more is coming this session.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            DirectoryState::Ready(_) | DirectoryState::Unavailable(_)
        )
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, DirectoryState::Loading)
    }
}

fn team_id_from_number_or_string<'de, D>(deserializer: D) -> Result<TeamId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n.as_u64().and_then(|v| TeamId::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<TeamId>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| serde::de::Error::custom(format!("invalid team id: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_record_wins_on_duplicate_ids() {
        let dir = TeamDirectory::new(vec![
            TeamRecord::new(1, "Boston Celtics"),
            TeamRecord::new(1, "Impostors"),
            TeamRecord::new(2, "LA Lakers"),
        ]);
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.duplicates(), 1);
        assert_eq!(dir.display_name(1), "Boston Celtics");
    }

    #[test]
    fn unresolved_ids_use_placeholder() {
        let dir = TeamDirectory::empty();
        assert_eq!(dir.display_name(42), UNKNOWN_TEAM);
    }

    #[test]
    fn name_lookup_falls_back_to_case_insensitive() {
        let dir = TeamDirectory::new(vec![TeamRecord::new(7, "Denver Nuggets")]);
        assert_eq!(dir.find_by_name("denver nuggets ").map(|t| t.id), Some(7));
        assert!(dir.find_by_name("Nuggets").is_none());
    }
}
