use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::Local;

use crate::directory::{DirectoryState, TeamDirectory, TeamId, TeamRecord, UNKNOWN_TEAM};
use crate::error::ServiceError;
use crate::prediction::{Prediction, PredictionController, PredictionOutcome, Resolution, Ticket};
use crate::ratings::{self, RankedEntry, RatingSnapshot, RatingsState};
use crate::selection::SelectionState;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone)]
pub struct SessionState {
    pub directory: DirectoryState,
    pub ratings: RatingsState,
    /// `None` until a rating snapshot is present and the directory has settled.
    pub ranked: Option<Vec<RankedEntry>>,
    pub ratings_generation: u64,
    pub top_n: usize,
    pub selection: SelectionState,
    pub prediction: PredictionController,
    pub logs: VecDeque<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(ratings::DEFAULT_TOP_N)
    }
}

impl SessionState {
    pub fn new(top_n: usize) -> Self {
        Self {
            directory: DirectoryState::NotLoaded,
            ratings: RatingsState::NotLoaded,
            ranked: None,
            ratings_generation: 0,
            top_n,
            selection: SelectionState::new(),
            prediction: PredictionController::new(),
            logs: VecDeque::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let stamp = Local::now().format("%H:%M:%S");
        self.logs.push_back(format!("{stamp} {}", msg.into()));
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn outcome(&self) -> &PredictionOutcome {
        self.prediction.outcome()
    }

    /// Display name for an id, degrading to the placeholder when the directory is missing.
    pub fn team_name(&self, id: TeamId) -> &str {
        match self.directory.directory() {
            Some(dir) => dir.display_name(id),
            None => UNKNOWN_TEAM,
        }
    }

    /// Rebuilds the ranked view from whatever is currently loaded.
    pub fn recompute_ranked(&mut self) {
        let Some(snapshot) = self.ratings.snapshot() else {
            self.ranked = None;
            return;
        };
        if !self.directory.is_settled() {
            self.ranked = None;
            return;
        }
        let empty = TeamDirectory::empty();
        let dir = self.directory.directory().unwrap_or(&empty);
        self.ranked = Some(ratings::compute_top_teams(snapshot, dir, self.top_n));
    }
}

/// Results coming back from the provider, plus free-form log lines.
#[derive(Debug, Clone)]
pub enum Delta {
    SetTeamNames(Result<Vec<TeamRecord>, ServiceError>),
    SetRatings {
        generation: u64,
        result: Result<RatingSnapshot, ServiceError>,
    },
    SetPrediction {
        ticket: Ticket,
        result: Result<Prediction, ServiceError>,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    FetchTeamNames,
    FetchRatings { generation: u64 },
    FetchPrediction(Ticket),
}

/// What part of the state a mutation touched; sent to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    Directory,
    Ratings,
    Selection,
    Prediction,
    Log,
}

pub fn apply_delta(state: &mut SessionState, delta: Delta) -> Vec<Change> {
    if !state.prediction.is_live() && !matches!(delta, Delta::Log(_)) {
        // Torn down: late results must not touch state.
        return Vec::new();
    }
    match delta {
        Delta::SetTeamNames(result) => apply_team_names(state, result),
        Delta::SetRatings { generation, result } => apply_ratings(state, generation, result),
        Delta::SetPrediction { ticket, result } => apply_prediction(state, ticket, result),
        Delta::Log(msg) => {
            state.push_log(msg);
            vec![Change::Log]
        }
    }
}

fn apply_team_names(
    state: &mut SessionState,
    result: Result<Vec<TeamRecord>, ServiceError>,
) -> Vec<Change> {
    if matches!(state.directory, DirectoryState::Ready(_)) {
        // Directory is populated once per session.
        state.push_log("[WARN] Ignoring repeated team directory load");
        return vec![Change::Log];
    }
    match result {
        Ok(records) => {
            let dir = TeamDirectory::new(records);
            state.push_log(format!("[INFO] Loaded {} teams", dir.len()));
            if dir.duplicates() > 0 {
                state.push_log(format!(
                    "[WARN] Dropped {} duplicate team ids",
                    dir.duplicates()
                ));
            }
            state.directory = DirectoryState::Ready(Arc::new(dir));
        }
        Err(err) => {
            state.push_log(format!("[WARN] Error in fetching team names: {err}"));
            state.directory = DirectoryState::Unavailable(err.to_string());
        }
    }
    state.recompute_ranked();
    vec![Change::Directory, Change::Ratings, Change::Log]
}

fn apply_ratings(
    state: &mut SessionState,
    generation: u64,
    result: Result<RatingSnapshot, ServiceError>,
) -> Vec<Change> {
    if generation != state.ratings_generation {
        state.push_log(format!(
            "[INFO] Discarded ratings from superseded load #{generation}"
        ));
        return vec![Change::Log];
    }
    match result {
        Ok(snapshot) => {
            state.push_log(format!("[INFO] Loaded ratings for {} teams", snapshot.len()));
            state.ratings = RatingsState::Ready(snapshot);
        }
        Err(err) => {
            state.push_log(format!("[WARN] Error in loading team ratings: {err}"));
            state.ratings = RatingsState::Unavailable(err.to_string());
        }
    }
    state.recompute_ranked();
    vec![Change::Ratings, Change::Log]
}

fn apply_prediction(
    state: &mut SessionState,
    ticket: Ticket,
    result: Result<Prediction, ServiceError>,
) -> Vec<Change> {
    let request = ticket.request();
    match state.prediction.resolve(&ticket, result) {
        Resolution::Applied => {
            state.selection.reset_submit();
            let msg = match state.prediction.outcome() {
                PredictionOutcome::Failure(reason) => format!(
                    "[WARN] Prediction {}-{} failed: {reason}",
                    request.home_team_id, request.away_team_id
                ),
                _ => format!(
                    "[INFO] Prediction {}-{} ready",
                    request.home_team_id, request.away_team_id
                ),
            };
            state.push_log(msg);
            vec![Change::Prediction, Change::Selection, Change::Log]
        }
        Resolution::Stale => {
            state.push_log(format!(
                "[INFO] Discarded stale prediction {}-{}",
                request.home_team_id, request.away_team_id
            ));
            vec![Change::Log]
        }
        Resolution::Detached => Vec::new(),
    }
}

/// Owns the session state and fans change notifications out to subscribers.
///
/// Every mutation goes through `dispatch` or `update` on the owning thread.
#[derive(Debug)]
pub struct Store {
    state: SessionState,
    subscribers: Vec<Sender<Change>>,
}

impl Store {
    pub fn new(top_n: usize) -> Self {
        Self {
            state: SessionState::new(top_n),
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn subscribe(&mut self) -> Receiver<Change> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn dispatch(&mut self, delta: Delta) -> Vec<Change> {
        let changes = apply_delta(&mut self.state, delta);
        self.notify(&changes);
        changes
    }

    pub fn update<F>(&mut self, f: F) -> Vec<Change>
    where
        F: FnOnce(&mut SessionState) -> Vec<Change>,
    {
        let changes = f(&mut self.state);
        self.notify(&changes);
        changes
    }

    fn notify(&mut self, changes: &[Change]) {
        if changes.is_empty() {
            return;
        }
        // Dropped receivers are pruned on the next send.
        self.subscribers
            .retain(|tx| changes.iter().all(|change| tx.send(*change).is_ok()));
    }
}
