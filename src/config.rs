use anyhow::{Result, bail};

use crate::http_client::DEFAULT_TIMEOUT_SECS;
use crate::ratings::DEFAULT_TOP_N;

pub const BASE_URL_VAR: &str = "SERVER_APIS_BASE_URL";
const MAX_TOP_N: usize = 30;

/// How prediction requests are shaped on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictRoute {
    /// `GET {base}/predict?home={id}&away={id}`
    #[default]
    Query,
    /// `POST {base}/prediction` with a JSON body of both ids.
    JsonBody,
}

impl PredictRoute {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "query" | "get" => Some(PredictRoute::Query),
            "json" | "post" | "body" => Some(PredictRoute::JsonBody),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub top_n: usize,
    pub predict_route: PredictRoute,
    pub timeout_secs: u64,
    pub demo_mode: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            top_n: DEFAULT_TOP_N,
            predict_route: PredictRoute::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            demo_mode: false,
        }
    }

    /// Offline configuration backed by the demo service.
    pub fn demo() -> Self {
        Self {
            demo_mode: true,
            ..Self::new("demo://local")
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let demo_mode = lookup("DEMO_MODE")
            .map(|val| matches!(val.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let base_url = lookup(BASE_URL_VAR)
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty());

        let mut cfg = match (base_url, demo_mode) {
            (Some(url), _) => Self::new(url),
            (None, true) => Self::demo(),
            (None, false) => bail!("{BASE_URL_VAR} is not set (set DEMO_MODE=1 to run offline)"),
        };
        cfg.demo_mode = demo_mode;

        cfg.top_n = lookup("TOP_TEAMS_COUNT")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_TOP_N)
            .clamp(1, MAX_TOP_N);
        cfg.timeout_secs = lookup("HTTP_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(1);
        if let Some(raw) = lookup("PREDICT_ROUTE") {
            match PredictRoute::parse(&raw) {
                Some(route) => cfg.predict_route = route,
                None => bail!("unknown PREDICT_ROUTE '{raw}' (expected query or json)"),
            }
        }
        Ok(cfg)
    }

    /// Joins `path` onto the base URL, tolerating a trailing slash on either side.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn endpoint_joins_with_single_slash() {
        let cfg = ClientConfig::new("http://localhost:8000/apis/");
        assert_eq!(cfg.endpoint("ratings"), "http://localhost:8000/apis/ratings");
        let cfg = ClientConfig::new("http://localhost:8000/apis");
        assert_eq!(cfg.endpoint("/teamnames"), "http://localhost:8000/apis/teamnames");
    }

    #[test]
    fn missing_base_url_is_an_error_outside_demo_mode() {
        assert!(ClientConfig::from_lookup(lookup_from(&[])).is_err());
        let cfg = ClientConfig::from_lookup(lookup_from(&[("DEMO_MODE", "1")])).unwrap();
        assert!(cfg.demo_mode);
    }

    #[test]
    fn env_values_are_clamped_and_parsed() {
        let cfg = ClientConfig::from_lookup(lookup_from(&[
            (BASE_URL_VAR, "http://svc/"),
            ("TOP_TEAMS_COUNT", "500"),
            ("HTTP_TIMEOUT_SECS", "0"),
            ("PREDICT_ROUTE", "json"),
        ]))
        .unwrap();
        assert_eq!(cfg.base_url, "http://svc/");
        assert_eq!(cfg.top_n, MAX_TOP_N);
        assert_eq!(cfg.timeout_secs, 1);
        assert_eq!(cfg.predict_route, PredictRoute::JsonBody);
    }

    #[test]
    fn unknown_route_is_rejected() {
        let res = ClientConfig::from_lookup(lookup_from(&[
            (BASE_URL_VAR, "http://svc"),
            ("PREDICT_ROUTE", "carrier-pigeon"),
        ]));
        assert!(res.is_err());
    }
}
