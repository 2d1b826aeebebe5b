mod common;

use chrono::{DateTime, TimeZone, Utc};

use common::*;
use scenekeeper_reconcile::*;

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn acme_system() -> FakeAcquisition {
    let mut system = FakeAcquisition {
        series: vec![series(1, "Acme"), series(2, "Other Studio")],
        ..Default::default()
    };
    system.episodes.insert(
        1,
        vec![
            episode(11, "Scene One", Some("2024-03-01")),
            episode(12, "Scene Two", Some("2024-03-08")),
        ],
    );
    system.episodes.insert(2, vec![episode(21, "Elsewhere", None)]);
    system
}

#[test]
fn scenario_c_studio_missing_is_recorded() {
    let system = acme_system();
    let mut state = MatchState::default();
    let candidates = vec![missing("ext-9", "Lost", Some("2023-01-01"), Some("Unknown Studio"))];

    let now = at(2024, 6, 1);
    let outcomes =
        run_acquisition(&system, &candidates, &mut state, &|| now, false, &SilentProgress)
            .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, AcquisitionStatus::StudioMissingInLibrary);
    let attempt = state.attempt("ext-9").unwrap();
    assert_eq!(attempt.attempts, 1);
    assert_eq!(attempt.last_status, AcquisitionStatus::StudioMissingInLibrary);
    assert_eq!(state.runs, 1);
    assert_eq!(state.last_run_at_utc, Some(now));
    assert!(system.episode_calls.borrow().is_empty());
}

#[test]
fn scenario_c_rerun_is_excluded_by_cutoff() {
    let system = acme_system();
    let mut state = MatchState::default();
    let candidates = vec![missing("ext-9", "Lost", Some("2023-01-01"), Some("Unknown Studio"))];

    let first = at(2024, 6, 1);
    run_acquisition(&system, &candidates, &mut state, &|| first, false, &SilentProgress).unwrap();

    let cutoff = state.cutoff(30, false);
    let result = apply_cutoff(candidates.clone(), &state, cutoff);
    assert!(result.selected.is_empty());
    assert_eq!(result.skipped_old, 1);

    let full = apply_cutoff(candidates, &state, state.cutoff(30, true));
    assert_eq!(full.selected.len(), 1);
}

#[test]
fn every_terminal_status_is_reached_and_recorded() {
    let mut system = acme_system();
    system.rejected.push(12);
    let candidates = vec![
        missing("a", "Scene One", Some("2024-03-01"), Some("ACME")),
        missing("b", "No Studio", None, Some("  ")),
        missing("c", "Nope", Some("1999-01-01"), Some("Acme")),
        missing("d", "Scene Two", None, Some("Acme")),
        missing("e", "Whatever", Some("2024-03-01"), Some("Acme")),
    ];
    let mut state = MatchState::default();
    let now = at(2024, 6, 1);
    let outcomes =
        run_acquisition(&system, &candidates, &mut state, &|| now, false, &SilentProgress)
            .unwrap();

    let statuses: Vec<AcquisitionStatus> = outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            AcquisitionStatus::QueuedEpisodeSearch,
            AcquisitionStatus::SkippedNoStudio,
            AcquisitionStatus::EpisodeNotFound,
            AcquisitionStatus::Failed,
            AcquisitionStatus::QueuedEpisodeSearch,
        ]
    );
    assert_eq!(outcomes[0].command_id, Some(1011));
    assert_eq!(outcomes[0].matched_by, Some(MatchPass::TitleAndDate));
    assert_eq!(outcomes[3].episode_id, Some(12));
    assert!(outcomes[3].error.as_deref().unwrap().contains("invalid"));
    assert_eq!(outcomes[4].matched_by, Some(MatchPass::DateOnly));
    assert_eq!(state.scene_history.len(), 5);
    assert_eq!(*system.searches.borrow(), vec![11, 11]);
}

#[test]
fn episode_listing_not_found_fails_only_that_record() {
    let mut system = acme_system();
    system.vanished_series.push(1);
    let candidates = vec![
        missing("a", "Scene One", Some("2024-03-01"), Some("Acme")),
        missing("c", "Elsewhere", None, Some("Other Studio")),
    ];
    let mut state = MatchState::default();
    let now = at(2024, 6, 1);
    let outcomes =
        run_acquisition(&system, &candidates, &mut state, &|| now, false, &SilentProgress)
            .unwrap();

    assert_eq!(outcomes[0].status, AcquisitionStatus::Failed);
    assert_eq!(outcomes[0].series_id, Some(1));
    assert!(outcomes[0].error.as_deref().unwrap().contains("series 1"));
    assert_eq!(outcomes[1].status, AcquisitionStatus::QueuedEpisodeSearch);
    assert_eq!(*system.searches.borrow(), vec![21]);

    let failed = state.attempt("a").unwrap();
    assert_eq!(failed.last_status, AcquisitionStatus::Failed);
    assert_eq!(failed.attempts, 1);
    assert_eq!(state.runs, 1);
    assert_eq!(state.last_run_at_utc, Some(now));
}

#[test]
fn episodes_are_fetched_once_per_series() {
    let system = acme_system();
    let candidates = vec![
        missing("a", "Scene One", None, Some("Acme")),
        missing("b", "Scene Two", None, Some("acme")),
        missing("c", "Elsewhere", None, Some("Other Studio")),
    ];
    let mut state = MatchState::default();
    run_acquisition(&system, &candidates, &mut state, &Utc::now, true, &SilentProgress).unwrap();
    assert_eq!(*system.episode_calls.borrow(), vec![1, 2]);
    assert_eq!(*system.series_calls.borrow(), 1);
}

#[test]
fn dry_run_never_queues() {
    let system = acme_system();
    let candidates = vec![missing("a", "Scene One", None, Some("Acme"))];
    let mut state = MatchState::default();
    let outcomes =
        run_acquisition(&system, &candidates, &mut state, &Utc::now, true, &SilentProgress)
            .unwrap();
    assert_eq!(outcomes[0].status, AcquisitionStatus::DryRunWouldQueueSearch);
    assert!(system.searches.borrow().is_empty());
    assert_eq!(state.attempt("a").unwrap().attempts, 1);
}

#[test]
fn transport_error_aborts_the_run() {
    let system = FakeAcquisition {
        offline: true,
        ..acme_system()
    };
    let candidates = vec![missing("a", "Scene One", None, Some("Acme"))];
    let mut state = MatchState::default();
    let err = run_acquisition(&system, &candidates, &mut state, &Utc::now, false, &SilentProgress)
        .unwrap_err();
    assert!(matches!(err, SourceError::Transport(_)));
    assert_eq!(state.runs, 0);
}

#[test]
fn empty_run_still_stamps_the_ledger() {
    let system = acme_system();
    let mut state = MatchState::default();
    let now = at(2024, 6, 1);
    let outcomes = run_acquisition(&system, &[], &mut state, &|| now, false, &SilentProgress)
        .unwrap();
    assert!(outcomes.is_empty());
    assert_eq!(state.runs, 1);
    assert_eq!(state.last_run_at_utc, Some(now));
    assert_eq!(*system.series_calls.borrow(), 0);
}

#[test]
fn ledger_survives_a_second_run_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let layout = RunLayout::new(dir.path());
    let store = JsonStateStore::new(layout.acquisition_state("perf"));
    let system = acme_system();
    let candidates = vec![missing("a", "Scene One", Some("2024-03-01"), Some("Acme"))];

    for (i, day) in [1, 2].into_iter().enumerate() {
        let mut state = store.load().unwrap();
        let now = at(2024, 6, day);
        run_acquisition(&system, &candidates, &mut state, &|| now, false, &SilentProgress)
            .unwrap();
        store.save(&state).unwrap();
        assert_eq!(state.runs, i as u64 + 1);
    }

    let state = store.load().unwrap();
    assert_eq!(state.attempt("a").unwrap().attempts, 2);
    assert_eq!(state.last_run_at_utc, Some(at(2024, 6, 2)));
}
