use crate::directory::{TeamDirectory, TeamId};

pub const DEFAULT_TOP_N: usize = 5;

/// Team ratings in the order the service listed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingSnapshot {
    entries: Vec<(TeamId, f64)>,
}

impl RatingSnapshot {
    /// A repeated id keeps its first position and takes the later rating.
    pub fn new(entries: Vec<(TeamId, f64)>) -> Self {
        let mut out: Vec<(TeamId, f64)> = Vec::with_capacity(entries.len());
        for (id, rating) in entries {
            if let Some(slot) = out.iter_mut().find(|(existing, _)| *existing == id) {
                slot.1 = rating;
            } else {
                out.push((id, rating));
            }
        }
        Self { entries: out }
    }

    pub fn entries(&self) -> &[(TeamId, f64)] {
        &self.entries
    }

    pub fn get(&self, id: TeamId) -> Option<f64> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, rating)| *rating)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub team_id: TeamId,
    pub rating: f64,
    pub display_name: String,
}

impl RankedEntry {
    /// Last word of the display name, used for chart labels ("Boston Celtics" -> "Celtics").
    pub fn short_name(&self) -> &str {
        self.display_name
            .split_whitespace()
            .last()
            .unwrap_or(self.display_name.as_str())
    }
}

/// Top `n` teams by rating, highest first. Equal ratings rank by ascending team id.
pub fn compute_top_teams(
    snapshot: &RatingSnapshot,
    directory: &TeamDirectory,
    n: usize,
) -> Vec<RankedEntry> {
    let mut pairs: Vec<(TeamId, f64)> = snapshot.entries().to_vec();
    // total_cmp keeps NaN from poisoning the order.
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    pairs
        .into_iter()
        .take(n)
        .map(|(team_id, rating)| RankedEntry {
            team_id,
            rating,
            display_name: directory.display_name(team_id).to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RatingsState {
    #[default]
    NotLoaded,
    Loading,
    Ready(RatingSnapshot),
    Unavailable(String),
}

impl RatingsState {
    pub fn snapshot(&self) -> Option<&RatingSnapshot> {
        match self {
            RatingsState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RatingsState::Loading)
    }
}
