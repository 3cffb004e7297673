use crate::directory::{TeamDirectory, TeamId, TeamRecord};
use crate::prediction::PredictionRequest;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum TeamChoice {
    #[default]
    Unselected,
    Selected(TeamRecord),
}

impl TeamChoice {
    pub fn team(&self) -> Option<&TeamRecord> {
        match self {
            TeamChoice::Selected(team) => Some(team),
            TeamChoice::Unselected => None,
        }
    }

    pub fn id(&self) -> Option<TeamId> {
        self.team().map(|t| t.id)
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, TeamChoice::Selected(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Home => "Home",
            Side::Away => "Away",
        }
    }
}

/// The user's pick for each side plus the per-field "missing" flags.
///
/// Selection never validates; only `validate_and_submit` raises the flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub home: TeamChoice,
    pub away: TeamChoice,
    pub home_error: bool,
    pub away_error: bool,
    pub submit_requested: bool,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_home(&mut self, team: TeamRecord) {
        self.home = TeamChoice::Selected(team);
        self.home_error = false;
    }

    pub fn select_away(&mut self, team: TeamRecord) {
        self.away = TeamChoice::Selected(team);
        self.away_error = false;
    }

    pub fn clear_home(&mut self) {
        self.home = TeamChoice::Unselected;
    }

    pub fn clear_away(&mut self) {
        self.away = TeamChoice::Unselected;
    }

    pub fn select(&mut self, side: Side, team: TeamRecord) {
        match side {
            Side::Home => self.select_home(team),
            Side::Away => self.select_away(team),
        }
    }

    pub fn clear(&mut self, side: Side) {
        match side {
            Side::Home => self.clear_home(),
            Side::Away => self.clear_away(),
        }
    }

    pub fn choice(&self, side: Side) -> &TeamChoice {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    pub fn error(&self, side: Side) -> bool {
        match side {
            Side::Home => self.home_error,
            Side::Away => self.away_error,
        }
    }

    /// Picks by display name. An empty name clears the side; an unknown name changes
    /// nothing and returns false.
    pub fn select_by_name(&mut self, side: Side, directory: &TeamDirectory, name: &str) -> bool {
        if name.trim().is_empty() {
            self.clear(side);
            return true;
        }
        match directory.find_by_name(name) {
            Some(team) => {
                self.select(side, team.clone());
                true
            }
            None => false,
        }
    }

    pub fn select_home_by_name(&mut self, directory: &TeamDirectory, name: &str) -> bool {
        self.select_by_name(Side::Home, directory, name)
    }

    pub fn select_away_by_name(&mut self, directory: &TeamDirectory, name: &str) -> bool {
        self.select_by_name(Side::Away, directory, name)
    }

    /// The only gate in front of a prediction request.
    pub fn validate_and_submit(&mut self) -> bool {
        self.home_error = !self.home.is_selected();
        self.away_error = !self.away.is_selected();
        let ok = !self.home_error && !self.away_error;
        if ok {
            self.submit_requested = true;
        }
        ok
    }

    pub fn request(&self) -> Option<PredictionRequest> {
        Some(PredictionRequest::new(self.home.id()?, self.away.id()?))
    }

    pub fn reset_submit(&mut self) {
        self.submit_requested = false;
    }
}
