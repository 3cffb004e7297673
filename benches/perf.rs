use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use courtside::api::{parse_prediction_json, parse_ratings_json};
use courtside::directory::{TeamDirectory, TeamRecord};
use courtside::ratings::{RatingSnapshot, compute_top_teams};
use courtside::state::{Delta, SessionState, apply_delta};

fn sample_directory(n: u32) -> TeamDirectory {
    TeamDirectory::new(
        (1..=n)
            .map(|id| TeamRecord::new(id, format!("Team Number {id}")))
            .collect(),
    )
}

fn sample_snapshot(n: u32) -> RatingSnapshot {
    RatingSnapshot::new(
        (1..=n)
            .map(|id| (id, 1300.0 + ((id * 7919) % 601) as f64))
            .collect(),
    )
}

fn ratings_json(n: u32) -> String {
    let body = (1..=n)
        .map(|id| format!("\"{id}\": {}", 1300 + (id * 7919) % 601))
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{body}}}")
}

fn bench_top_teams(c: &mut Criterion) {
    let dir = sample_directory(30);
    let snapshot = sample_snapshot(30);
    c.bench_function("top_teams_30", |b| {
        b.iter(|| {
            let ranked = compute_top_teams(black_box(&snapshot), black_box(&dir), 5);
            black_box(ranked.len());
        })
    });
}

fn bench_ratings_parse(c: &mut Criterion) {
    let raw = ratings_json(30);
    c.bench_function("ratings_parse_30", |b| {
        b.iter(|| {
            let snapshot = parse_ratings_json(black_box(&raw)).unwrap();
            black_box(snapshot.len());
        })
    });
}

fn bench_prediction_parse(c: &mut Criterion) {
    c.bench_function("prediction_parse", |b| {
        b.iter(|| {
            let p = parse_prediction_json(black_box(PREDICTION_JSON)).unwrap();
            black_box(p.home_win_probability);
        })
    });
}

fn bench_ratings_delta(c: &mut Criterion) {
    let teams: Vec<TeamRecord> = sample_directory(30).teams().to_vec();
    c.bench_function("apply_ratings_delta", |b| {
        b.iter(|| {
            let mut state = SessionState::new(5);
            apply_delta(&mut state, Delta::SetTeamNames(Ok(teams.clone())));
            apply_delta(
                &mut state,
                Delta::SetRatings {
                    generation: 0,
                    result: Ok(sample_snapshot(30)),
                },
            );
            black_box(state.ranked.as_ref().map(|r| r.len()));
        })
    });
}

criterion_group!(
    benches,
    bench_top_teams,
    bench_ratings_parse,
    bench_prediction_parse,
    bench_ratings_delta
);
criterion_main!(benches);

const PREDICTION_JSON: &str = r#"{
  "home_team_id": 1,
  "away_team_id": 2,
  "home_win_probability": 0.71,
  "away_win_probability": 0.29,
  "home_recent_streak": {"wins": 4, "losses": 1, "is_hot": true, "is_cold": false},
  "away_recent_streak": {"wins": 1, "losses": 4, "is_hot": false, "is_cold": true}
}"#;
