use std::sync::mpsc;

use courtside::api::parse_ratings_json;
use courtside::config::ClientConfig;
use courtside::directory::{DirectoryState, TeamDirectory, TeamRecord, UNKNOWN_TEAM};
use courtside::error::ServiceError;
use courtside::ratings::{RankedEntry, RatingSnapshot, RatingsState, compute_top_teams};
use courtside::session::Session;
use courtside::state::{Change, Delta, ProviderCommand, SessionState, Store, apply_delta};

fn celtics_lakers() -> TeamDirectory {
    TeamDirectory::new(vec![
        TeamRecord::new(1, "Boston Celtics"),
        TeamRecord::new(2, "LA Lakers"),
    ])
}

#[test]
fn ranks_example_pair() {
    let snapshot = RatingSnapshot::new(vec![(1, 1800.0), (2, 1750.0)]);
    let ranked = compute_top_teams(&snapshot, &celtics_lakers(), 5);
    assert_eq!(
        ranked,
        vec![
            RankedEntry {
                team_id: 1,
                rating: 1800.0,
                display_name: "Boston Celtics".to_string(),
            },
            RankedEntry {
                team_id: 2,
                rating: 1750.0,
                display_name: "LA Lakers".to_string(),
            },
        ]
    );
}

#[test]
fn keeps_at_most_n_sorted_descending() {
    let entries: Vec<(u32, f64)> = (1..=12)
        .map(|id| (id, 1400.0 + (id * 37 % 11) as f64 * 25.0))
        .collect();
    let snapshot = RatingSnapshot::new(entries);
    let ranked = compute_top_teams(&snapshot, &TeamDirectory::empty(), 5);
    assert_eq!(ranked.len(), 5);
    assert!(ranked.windows(2).all(|w| w[0].rating >= w[1].rating));

    let max = snapshot
        .entries()
        .iter()
        .map(|(_, r)| *r)
        .fold(f64::MIN, f64::max);
    assert_eq!(ranked[0].rating, max);
}

#[test]
fn equal_ratings_rank_by_ascending_id() {
    let snapshot = RatingSnapshot::new(vec![(9, 1600.0), (4, 1700.0), (7, 1600.0), (3, 1600.0)]);
    let ranked = compute_top_teams(&snapshot, &TeamDirectory::empty(), 3);
    let ids: Vec<u32> = ranked.iter().map(|e| e.team_id).collect();
    assert_eq!(ids, vec![4, 3, 7]);
}

#[test]
fn parsed_ties_ignore_document_order() {
    let snapshot = parse_ratings_json(r#"{"9": 1600, "3": 1600, "5": 1700}"#).expect("ratings");
    let ranked = compute_top_teams(&snapshot, &TeamDirectory::empty(), 5);
    let ids: Vec<u32> = ranked.iter().map(|e| e.team_id).collect();
    assert_eq!(ids, vec![5, 3, 9]);
}

#[test]
fn recomputation_is_deterministic() {
    let snapshot = RatingSnapshot::new(vec![(1, 1500.0), (2, 1500.0), (3, 1490.0), (4, 1510.0)]);
    let dir = celtics_lakers();
    let first = compute_top_teams(&snapshot, &dir, 5);
    let second = compute_top_teams(&snapshot, &dir, 5);
    assert_eq!(first, second);
}

#[test]
fn unresolved_ids_get_placeholder_name() {
    let snapshot = RatingSnapshot::new(vec![(1, 1800.0), (99, 1900.0)]);
    let ranked = compute_top_teams(&snapshot, &celtics_lakers(), 5);
    assert_eq!(ranked[0].display_name, UNKNOWN_TEAM);
    assert_eq!(ranked[1].display_name, "Boston Celtics");
}

#[test]
fn zero_n_and_empty_snapshot_yield_empty_view() {
    let snapshot = RatingSnapshot::new(vec![(1, 1800.0)]);
    assert!(compute_top_teams(&snapshot, &celtics_lakers(), 0).is_empty());
    assert!(compute_top_teams(&RatingSnapshot::default(), &celtics_lakers(), 5).is_empty());
}

fn ratings_delta(generation: u64, entries: Vec<(u32, f64)>) -> Delta {
    Delta::SetRatings {
        generation,
        result: Ok(RatingSnapshot::new(entries)),
    }
}

fn loading_state() -> SessionState {
    let mut state = SessionState::new(5);
    state.directory = DirectoryState::Loading;
    state.ratings = RatingsState::Loading;
    state.ratings_generation = 1;
    state
}

#[test]
fn ranked_view_waits_for_directory_to_settle() {
    let mut state = loading_state();
    apply_delta(&mut state, ratings_delta(1, vec![(1, 1800.0), (2, 1750.0)]));
    assert!(state.ratings.snapshot().is_some());
    assert!(state.ranked.is_none(), "no half-resolved names while the directory loads");

    apply_delta(
        &mut state,
        Delta::SetTeamNames(Ok(vec![
            TeamRecord::new(1, "Boston Celtics"),
            TeamRecord::new(2, "LA Lakers"),
        ])),
    );
    let ranked = state.ranked.as_ref().expect("ranked view after both inputs");
    assert_eq!(ranked[0].display_name, "Boston Celtics");
    assert_eq!(ranked[1].display_name, "LA Lakers");
}

#[test]
fn directory_failure_degrades_names_not_the_view() {
    let mut state = loading_state();
    apply_delta(
        &mut state,
        Delta::SetTeamNames(Err(ServiceError::Http {
            status: 503,
            detail: "down".to_string(),
        })),
    );
    assert!(state.ranked.is_none(), "nothing to rank before ratings arrive");

    apply_delta(&mut state, ratings_delta(1, vec![(1, 1800.0)]));
    let ranked = state.ranked.as_ref().expect("ranked view despite directory failure");
    assert_eq!(ranked[0].display_name, UNKNOWN_TEAM);
    assert!(state.logs.iter().any(|l| l.contains("[WARN] Error in fetching team names")));
}

#[test]
fn ratings_failure_suppresses_view() {
    let mut state = loading_state();
    apply_delta(&mut state, Delta::SetTeamNames(Ok(Vec::new())));
    apply_delta(
        &mut state,
        Delta::SetRatings {
            generation: 1,
            result: Err(ServiceError::Transport("connection refused".to_string())),
        },
    );
    assert!(matches!(state.ratings, RatingsState::Unavailable(_)));
    assert!(state.ranked.is_none());
}

#[test]
fn superseded_ratings_load_is_discarded() {
    let mut state = loading_state();
    apply_delta(&mut state, Delta::SetTeamNames(Ok(Vec::new())));
    state.ratings_generation = 2;

    apply_delta(&mut state, ratings_delta(2, vec![(1, 1900.0)]));
    apply_delta(&mut state, ratings_delta(1, vec![(1, 1100.0)]));

    assert_eq!(state.ratings.snapshot().and_then(|s| s.get(1)), Some(1900.0));
    assert_eq!(state.ranked.as_ref().map(|r| r[0].rating), Some(1900.0));
}

#[test]
fn later_load_fully_replaces_snapshot() {
    let mut state = loading_state();
    apply_delta(&mut state, Delta::SetTeamNames(Ok(Vec::new())));
    apply_delta(&mut state, ratings_delta(1, vec![(1, 1800.0), (2, 1700.0)]));
    state.ratings_generation = 2;
    apply_delta(&mut state, ratings_delta(2, vec![(3, 1600.0)]));

    let snapshot = state.ratings.snapshot().expect("snapshot");
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get(1), None);
    assert_eq!(state.ranked.as_ref().map(|r| r.len()), Some(1));
}

#[test]
fn repeated_directory_load_is_ignored() {
    let mut state = loading_state();
    apply_delta(
        &mut state,
        Delta::SetTeamNames(Ok(vec![TeamRecord::new(1, "Boston Celtics")])),
    );
    let changes = apply_delta(
        &mut state,
        Delta::SetTeamNames(Ok(vec![TeamRecord::new(1, "Renamed")])),
    );
    assert_eq!(changes, vec![Change::Log]);
    assert_eq!(state.team_name(1), "Boston Celtics");
}

#[test]
fn store_notifies_subscribers_of_ratings_changes() {
    let mut store = Store::new(5);
    let rx = store.subscribe();
    store.dispatch(Delta::SetTeamNames(Ok(Vec::new())));
    let seen: Vec<Change> = rx.try_iter().collect();
    assert!(seen.contains(&Change::Directory));
    assert!(seen.contains(&Change::Ratings));

    drop(rx);
    store.dispatch(Delta::Log("[INFO] ping".to_string()));
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn late_loads_after_teardown_are_no_ops() {
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let mut session = Session::new(&ClientConfig::new("http://scores.test"), cmd_tx);
    session.start();
    let changes = session.subscribe();
    session.teardown();

    let applied = session.dispatch(ratings_delta(1, vec![(1, 1800.0)]));
    assert!(applied.is_empty());
    let applied = session.dispatch(Delta::SetTeamNames(Ok(vec![TeamRecord::new(
        1,
        "Boston Celtics",
    )])));
    assert!(applied.is_empty());

    assert!(changes.try_iter().next().is_none());
    assert_eq!(session.state().ratings, RatingsState::Loading);
    assert!(matches!(session.state().directory, DirectoryState::Loading));
    assert!(session.state().ranked.is_none());

    cmd_rx.try_iter().for_each(drop);
    session.reload_ratings();
    assert!(
        !cmd_rx
            .try_iter()
            .any(|cmd| matches!(cmd, ProviderCommand::FetchRatings { .. }))
    );
    assert_eq!(session.state().ratings_generation, 1);
}
