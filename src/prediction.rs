use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::directory::TeamId;
use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
}

impl PredictionRequest {
    pub fn new(home_team_id: TeamId, away_team_id: TeamId) -> Self {
        Self {
            home_team_id,
            away_team_id,
        }
    }

    /// Same team on both sides.
    pub fn is_mirror(&self) -> bool {
        self.home_team_id == self.away_team_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub is_hot: bool,
    #[serde(default)]
    pub is_cold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_win_probability: f64,
    pub away_win_probability: f64,
    #[serde(default)]
    pub home_recent_streak: Streak,
    #[serde(default)]
    pub away_recent_streak: Streak,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Prediction {
    pub fn matches(&self, request: &PredictionRequest) -> bool {
        self.home_team_id == request.home_team_id && self.away_team_id == request.away_team_id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PredictionOutcome {
    #[default]
    Idle,
    Loading(PredictionRequest),
    Success(Prediction),
    Failure(String),
}

impl PredictionOutcome {
    pub fn is_loading(&self) -> bool {
        matches!(self, PredictionOutcome::Loading(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            PredictionOutcome::Idle => "idle",
            PredictionOutcome::Loading(_) => "loading",
            PredictionOutcome::Success(_) => "success",
            PredictionOutcome::Failure(_) => "error",
        }
    }
}

/// Handed out for every issued request; the response must bring it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    request: PredictionRequest,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> PredictionRequest {
        self.request
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    /// A newer request was issued (or this one already resolved); result dropped.
    Stale,
    /// The owning view is gone; result dropped.
    Detached,
}

/// Single-flight prediction state machine.
///
/// Only the most recently issued ticket may move the outcome out of `Loading`.
#[derive(Debug, Clone)]
pub struct PredictionController {
    outcome: PredictionOutcome,
    generation: u64,
    live: bool,
}

impl Default for PredictionController {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionController {
    pub fn new() -> Self {
        Self {
            outcome: PredictionOutcome::Idle,
            generation: 0,
            live: true,
        }
    }

    pub fn outcome(&self) -> &PredictionOutcome {
        &self.outcome
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Returns `None` when the same pair is already loading or the controller is torn down.
    /// Any other call supersedes whatever was in flight.
    pub fn begin(&mut self, request: PredictionRequest) -> Option<Ticket> {
        if !self.live {
            return None;
        }
        if let PredictionOutcome::Loading(current) = &self.outcome
            && *current == request
        {
            return None;
        }
        self.generation += 1;
        self.outcome = PredictionOutcome::Loading(request);
        Some(Ticket {
            generation: self.generation,
            request,
        })
    }

    pub fn resolve(
        &mut self,
        ticket: &Ticket,
        result: Result<Prediction, ServiceError>,
    ) -> Resolution {
        if !self.live {
            return Resolution::Detached;
        }
        if ticket.generation != self.generation || !self.outcome.is_loading() {
            return Resolution::Stale;
        }
        self.outcome = match result {
            Ok(prediction) if prediction.matches(&ticket.request) => {
                PredictionOutcome::Success(prediction)
            }
            Ok(_) => PredictionOutcome::Failure(
                "prediction response does not match request".to_string(),
            ),
            Err(err) => PredictionOutcome::Failure(err.to_string()),
        };
        Resolution::Applied
    }

    pub fn teardown(&mut self) {
        self.live = false;
    }
}
