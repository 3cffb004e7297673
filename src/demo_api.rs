use std::ops::Range;
use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::api::ScoringApi;
use crate::directory::{TeamId, TeamRecord};
use crate::elo::{self, EloConfig};
use crate::error::ServiceError;
use crate::prediction::{Prediction, PredictionRequest, Streak};
use crate::ratings::RatingSnapshot;

const SEED_TEAMS: &[(TeamId, &str, f64)] = &[
    (1, "Boston Celtics", 1712.0),
    (2, "LA Lakers", 1588.0),
    (3, "Denver Nuggets", 1664.0),
    (4, "Milwaukee Bucks", 1621.0),
    (5, "Golden State Warriors", 1574.0),
    (6, "Oklahoma City Thunder", 1698.0),
    (7, "New York Knicks", 1633.0),
    (8, "Minnesota Timberwolves", 1640.0),
    (9, "Phoenix Suns", 1552.0),
    (10, "Portland Trail Blazers", 1421.0),
    (11, "Detroit Pistons", 1398.0),
    (12, "Miami Heat", 1569.0),
];

/// Offline stand-in for the scoring service. Latency is randomized per call so
/// overlapping prediction requests resolve out of order, just like the real thing can.
#[derive(Debug, Clone)]
pub struct DemoScoringApi {
    teams: Vec<(TeamId, String, f64)>,
    latency_ms: Range<u64>,
    failure_rate: f64,
    elo: EloConfig,
}

impl Default for DemoScoringApi {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoScoringApi {
    pub fn new() -> Self {
        Self {
            teams: SEED_TEAMS
                .iter()
                .map(|(id, name, rating)| (*id, name.to_string(), *rating))
                .collect(),
            latency_ms: 150..900,
            failure_rate: 0.05,
            elo: EloConfig::default(),
        }
    }

    pub fn with_latency(mut self, latency_ms: Range<u64>) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    fn rating(&self, id: TeamId) -> Option<f64> {
        self.teams
            .iter()
            .find(|(team_id, _, _)| *team_id == id)
            .map(|(_, _, rating)| *rating)
    }

    fn simulate_latency(&self) {
        if self.latency_ms.is_empty() {
            return;
        }
        let ms = rand::thread_rng().gen_range(self.latency_ms.clone());
        thread::sleep(Duration::from_millis(ms));
    }

    fn maybe_fail(&self) -> Result<(), ServiceError> {
        if self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate) {
            return Err(ServiceError::Http {
                status: 500,
                detail: "demo service hiccup".to_string(),
            });
        }
        Ok(())
    }
}

impl ScoringApi for DemoScoringApi {
    fn fetch_team_names(&self) -> Result<Vec<TeamRecord>, ServiceError> {
        self.simulate_latency();
        Ok(self
            .teams
            .iter()
            .map(|(id, name, _)| TeamRecord::new(*id, name.clone()))
            .collect())
    }

    fn fetch_ratings(&self) -> Result<RatingSnapshot, ServiceError> {
        self.simulate_latency();
        self.maybe_fail()?;
        Ok(RatingSnapshot::new(
            self.teams
                .iter()
                .map(|(id, _, rating)| (*id, *rating))
                .collect(),
        ))
    }

    fn fetch_prediction(&self, request: &PredictionRequest) -> Result<Prediction, ServiceError> {
        self.simulate_latency();
        self.maybe_fail()?;
        let (Some(home), Some(away)) = (
            self.rating(request.home_team_id),
            self.rating(request.away_team_id),
        ) else {
            return Err(ServiceError::Http {
                status: 500,
                detail: "unknown team id".to_string(),
            });
        };

        let (p_home, p_away) = elo::win_probabilities(home, away, self.elo);
        let mut rng = rand::thread_rng();
        Ok(Prediction {
            home_team_id: request.home_team_id,
            away_team_id: request.away_team_id,
            home_win_probability: round2(p_home),
            away_win_probability: round2(p_away),
            home_recent_streak: streak(rng.gen_range(0..=5)),
            away_recent_streak: streak(rng.gen_range(0..=5)),
            extra: Default::default(),
        })
    }
}

/// Last-five-games streak; hot/cold needs three of a kind.
fn streak(wins: u32) -> Streak {
    let losses = 5 - wins.min(5);
    Streak {
        wins,
        losses,
        is_hot: wins >= 3,
        is_cold: losses >= 3,
    }
}

fn round2(p: f64) -> f64 {
    (p * 100.0).round() / 100.0
}
