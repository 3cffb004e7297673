#[derive(Debug, Clone, Copy)]
pub struct EloConfig {
    pub home_adv_pts: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            home_adv_pts: 100.0,
        }
    }
}

/// (home, away) win probabilities with the home side's rating bumped by the court advantage.
pub fn win_probabilities(home_rating: f64, away_rating: f64, cfg: EloConfig) -> (f64, f64) {
    let p_home = expected_score(home_rating + cfg.home_adv_pts, away_rating);
    (p_home, 1.0 - p_home)
}

pub fn expected_score(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf(-(r_a - r_b) / 400.0))
}
