use std::sync::mpsc::{Receiver, Sender};

use crate::config::ClientConfig;
use crate::directory::{DirectoryState, TeamDirectory, TeamId};
use crate::error::ServiceError;
use crate::prediction::Ticket;
use crate::ratings::RatingsState;
use crate::selection::Side;
use crate::state::{Change, Delta, ProviderCommand, SessionState, Store};

/// User intents on top of the store. Commands go out to the provider; results come back
/// as deltas through `pump` or `dispatch`.
#[derive(Debug)]
pub struct Session {
    store: Store,
    cmd_tx: Sender<ProviderCommand>,
    started: bool,
}

impl Session {
    pub fn new(config: &ClientConfig, cmd_tx: Sender<ProviderCommand>) -> Self {
        Self {
            store: Store::new(config.top_n),
            cmd_tx,
            started: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.store.state()
    }

    pub fn subscribe(&mut self) -> Receiver<Change> {
        self.store.subscribe()
    }

    /// Kicks off the one-per-session directory load and the first ratings load.
    pub fn start(&mut self) {
        if self.started || !self.state().prediction.is_live() {
            return;
        }
        self.started = true;

        let directory_sent = self.cmd_tx.send(ProviderCommand::FetchTeamNames).is_ok();
        self.store.update(|state| {
            if directory_sent {
                state.directory = DirectoryState::Loading;
            } else {
                state.directory = DirectoryState::Unavailable("provider unavailable".to_string());
                state.push_log("[WARN] Team directory fetch unavailable");
            }
            vec![Change::Directory, Change::Log]
        });
        self.reload_ratings();
    }

    /// User-triggered ratings refresh. The newest load wins; older ones are discarded.
    pub fn reload_ratings(&mut self) {
        if !self.state().prediction.is_live() {
            return;
        }
        let generation = self.state().ratings_generation + 1;
        let sent = self
            .cmd_tx
            .send(ProviderCommand::FetchRatings { generation })
            .is_ok();
        self.store.update(|state| {
            state.ratings_generation = generation;
            if sent {
                if state.ratings.snapshot().is_none() {
                    state.ratings = RatingsState::Loading;
                }
                state.push_log("[INFO] Ratings request sent");
            } else {
                state.ratings = RatingsState::Unavailable("provider unavailable".to_string());
                state.recompute_ranked();
                state.push_log("[WARN] Ratings request failed");
            }
            vec![Change::Ratings, Change::Log]
        });
    }

    /// Resolves `id` against the directory; false when the directory does not know it.
    pub fn select(&mut self, side: Side, id: TeamId) -> bool {
        let Some(team) = self
            .state()
            .directory
            .directory()
            .and_then(|dir| dir.get(id))
            .cloned()
        else {
            return false;
        };
        self.store.update(|state| {
            state.selection.select(side, team);
            vec![Change::Selection]
        });
        true
    }

    pub fn select_home(&mut self, id: TeamId) -> bool {
        self.select(Side::Home, id)
    }

    pub fn select_away(&mut self, id: TeamId) -> bool {
        self.select(Side::Away, id)
    }

    pub fn select_by_name(&mut self, side: Side, name: &str) -> bool {
        let mut selected = false;
        self.store.update(|state| {
            let SessionState {
                directory,
                selection,
                ..
            } = state;
            let empty = TeamDirectory::empty();
            let dir = directory.directory().unwrap_or(&empty);
            selected = selection.select_by_name(side, dir, name);
            if selected {
                vec![Change::Selection]
            } else {
                Vec::new()
            }
        });
        selected
    }

    pub fn clear(&mut self, side: Side) {
        self.store.update(|state| {
            state.selection.clear(side);
            vec![Change::Selection]
        });
    }

    pub fn clear_home(&mut self) {
        self.clear(Side::Home);
    }

    pub fn clear_away(&mut self) {
        self.clear(Side::Away);
    }

    /// Validates the selection and, if both sides are picked, issues a prediction request.
    ///
    /// Returns the ticket of the request that went out, or `None` when validation failed or
    /// the same pair is already loading.
    pub fn submit(&mut self) -> Option<Ticket> {
        let mut ticket = None;
        self.store.update(|state| {
            if !state.prediction.is_live() {
                return Vec::new();
            }
            if !state.selection.validate_and_submit() {
                return vec![Change::Selection];
            }
            let Some(request) = state.selection.request() else {
                return vec![Change::Selection];
            };
            if request.is_mirror() {
                let name = state.team_name(request.home_team_id).to_string();
                state.push_log(format!("[WARN] Predicting {name} against itself"));
            }
            match state.prediction.begin(request) {
                Some(t) => {
                    ticket = Some(t);
                    vec![Change::Selection, Change::Prediction, Change::Log]
                }
                None => {
                    state.push_log(format!(
                        "[INFO] Prediction {}-{} already in flight",
                        request.home_team_id, request.away_team_id
                    ));
                    vec![Change::Selection, Change::Log]
                }
            }
        });

        let issued = ticket?;
        if self
            .cmd_tx
            .send(ProviderCommand::FetchPrediction(issued))
            .is_err()
        {
            self.dispatch(Delta::SetPrediction {
                ticket: issued,
                result: Err(ServiceError::Transport("provider unavailable".to_string())),
            });
        }
        Some(issued)
    }

    pub fn dispatch(&mut self, delta: Delta) -> Vec<Change> {
        self.store.dispatch(delta)
    }

    /// Applies every delta already waiting on `rx`; returns how many were applied.
    pub fn pump(&mut self, rx: &Receiver<Delta>) -> usize {
        let mut applied = 0;
        while let Ok(delta) = rx.try_recv() {
            self.dispatch(delta);
            applied += 1;
        }
        applied
    }

    /// The view is going away: anything that resolves later must not touch state.
    pub fn teardown(&mut self) {
        self.store.update(|state| {
            state.prediction.teardown();
            Vec::new()
        });
    }
}
