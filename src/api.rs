use reqwest::blocking::RequestBuilder;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{ClientConfig, PredictRoute};
use crate::directory::{TeamId, TeamRecord};
use crate::error::ServiceError;
use crate::http_client::LazyClient;
use crate::prediction::{Prediction, PredictionRequest};
use crate::ratings::RatingSnapshot;

const MAX_DETAIL_CHARS: usize = 200;

/// The three calls the client makes against the scoring service.
pub trait ScoringApi: Send + Sync {
    fn fetch_team_names(&self) -> Result<Vec<TeamRecord>, ServiceError>;
    fn fetch_ratings(&self) -> Result<RatingSnapshot, ServiceError>;
    fn fetch_prediction(&self, request: &PredictionRequest) -> Result<Prediction, ServiceError>;
}

#[derive(Debug)]
pub struct HttpScoringApi {
    config: ClientConfig,
    client: LazyClient,
}

impl HttpScoringApi {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            config: config.clone(),
            client: LazyClient::new(config.timeout_secs),
        }
    }

    pub fn team_names_url(&self) -> String {
        self.config.endpoint("teamnames")
    }

    pub fn ratings_url(&self) -> String {
        self.config.endpoint("ratings")
    }

    pub fn prediction_url(&self, request: &PredictionRequest) -> String {
        match self.config.predict_route {
            PredictRoute::Query => format!(
                "{}?home={}&away={}",
                self.config.endpoint("predict"),
                request.home_team_id,
                request.away_team_id
            ),
            PredictRoute::JsonBody => self.config.endpoint("prediction"),
        }
    }

    fn send(&self, req: RequestBuilder) -> Result<String, ServiceError> {
        let resp = req.send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(ServiceError::Http {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        Ok(body)
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, ServiceError> {
        self.client
            .get()
            .map_err(|err| ServiceError::Transport(format!("{err:#}")))
    }
}

impl ScoringApi for HttpScoringApi {
    fn fetch_team_names(&self) -> Result<Vec<TeamRecord>, ServiceError> {
        let body = self.send(self.client()?.get(self.team_names_url()))?;
        parse_team_names_json(&body)
    }

    fn fetch_ratings(&self) -> Result<RatingSnapshot, ServiceError> {
        let body = self.send(self.client()?.get(self.ratings_url()))?;
        parse_ratings_json(&body)
    }

    fn fetch_prediction(&self, request: &PredictionRequest) -> Result<Prediction, ServiceError> {
        let client = self.client()?;
        let url = self.prediction_url(request);
        let req = match self.config.predict_route {
            PredictRoute::Query => client.get(url),
            PredictRoute::JsonBody => client.post(url).json(request),
        };
        let body = self.send(req)?;
        parse_prediction_json(&body)
    }
}

#[derive(Debug, Deserialize)]
struct TeamNamesResponse {
    team_names: Option<Vec<TeamRecord>>,
}

pub fn parse_team_names_json(raw: &str) -> Result<Vec<TeamRecord>, ServiceError> {
    let trimmed = non_empty_body(raw)?;
    let parsed: TeamNamesResponse = serde_json::from_str(trimmed)?;
    parsed
        .team_names
        .ok_or_else(|| ServiceError::Parse("missing team_names".to_string()))
}

/// Keeps the document order of the ratings object; keys must be numeric team ids.
pub fn parse_ratings_json(raw: &str) -> Result<RatingSnapshot, ServiceError> {
    let trimmed = non_empty_body(raw)?;
    let root: Value = serde_json::from_str(trimmed)?;
    let Value::Object(map) = root else {
        return Err(ServiceError::Parse("ratings must be a json object".to_string()));
    };

    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        let id = key
            .trim()
            .parse::<TeamId>()
            .map_err(|_| ServiceError::Parse(format!("invalid team id '{key}'")))?;
        let rating = value
            .as_f64()
            .ok_or_else(|| ServiceError::Parse(format!("rating for team {id} is not a number")))?;
        entries.push((id, rating));
    }
    Ok(RatingSnapshot::new(entries))
}

pub fn parse_prediction_json(raw: &str) -> Result<Prediction, ServiceError> {
    let trimmed = non_empty_body(raw)?;
    Ok(serde_json::from_str(trimmed)?)
}

/// Best-effort message from an error body: FastAPI's `detail`, else the trimmed text.
pub fn error_detail(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(v) = serde_json::from_str::<Value>(trimmed)
        && let Some(detail) = v.get("detail")
    {
        return match detail {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }
    if trimmed.is_empty() {
        return "no response body".to_string();
    }
    trimmed.chars().take(MAX_DETAIL_CHARS).collect()
}

fn non_empty_body(raw: &str) -> Result<&str, ServiceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(ServiceError::Parse("empty response".to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_configured_route() {
        let mut cfg = ClientConfig::new("http://localhost:8000/apis/");
        let api = HttpScoringApi::new(&cfg);
        assert_eq!(api.team_names_url(), "http://localhost:8000/apis/teamnames");
        assert_eq!(api.ratings_url(), "http://localhost:8000/apis/ratings");
        assert_eq!(
            api.prediction_url(&PredictionRequest::new(1, 2)),
            "http://localhost:8000/apis/predict?home=1&away=2"
        );

        cfg.predict_route = PredictRoute::JsonBody;
        let api = HttpScoringApi::new(&cfg);
        assert_eq!(
            api.prediction_url(&PredictionRequest::new(1, 2)),
            "http://localhost:8000/apis/prediction"
        );
    }
}
