use fraktum_core::{ProgressTracker, UpdatePhase, UpdateProgress, UpdateState};

#[test]
fn full_cycle_reaches_downloaded_and_keeps_version() {
    let mut state = UpdateState::idle();
    state.begin_check().unwrap();
    state.available("2.0.0").unwrap();
    state.downloading(UpdateProgress::default()).unwrap();
    state
        .downloading(UpdateProgress::from_percent(60, 1000))
        .unwrap();
    state.downloaded().unwrap();

    assert_eq!(state.phase(), UpdatePhase::Downloaded);
    assert_eq!(state.version(), Some("2.0.0"));
    assert_eq!(state.progress().map(|p| p.percent), Some(60));

    state.install_pending().unwrap();
    assert_eq!(state.phase(), UpdatePhase::InstallPending);
    assert_eq!(state.version(), Some("2.0.0"));
}

#[test]
fn error_is_only_reachable_from_checking_or_downloading() {
    let mut idle = UpdateState::idle();
    assert!(idle.failed().is_err());

    let mut checking = UpdateState::idle();
    checking.begin_check().unwrap();
    checking.failed().unwrap();
    checking.settle().unwrap();
    assert_eq!(checking.phase(), UpdatePhase::Idle);

    let mut downloaded = UpdateState::idle();
    downloaded.begin_check().unwrap();
    downloaded.available("1.1.0").unwrap();
    downloaded.downloading(UpdateProgress::default()).unwrap();
    downloaded.downloaded().unwrap();
    assert!(downloaded.failed().is_err());
}

#[test]
fn second_check_is_rejected_while_cycle_is_active() {
    let mut state = UpdateState::idle();
    state.begin_check().unwrap();
    let err = state.begin_check().unwrap_err();
    assert_eq!(err.from, UpdatePhase::Checking);
    assert_eq!(err.to, UpdatePhase::Checking);
    assert!(state.phase().is_cycle_active());
}

#[test]
fn no_update_allows_a_fresh_check() {
    let mut state = UpdateState::idle();
    state.begin_check().unwrap();
    state.no_update().unwrap();
    assert!(!state.phase().is_cycle_active());
    state.begin_check().unwrap();
}

#[test]
fn tracker_never_reports_a_lower_percent() {
    let mut tracker = ProgressTracker::new(10_000);
    let raw = [0, 5, 3, 5, 20, 19, 80, 250, 100];

    let published: Vec<u8> = raw
        .iter()
        .filter_map(|p| tracker.advance(*p))
        .map(|p| p.percent)
        .collect();

    assert_eq!(published, vec![0, 5, 20, 80, 100]);
    assert!(published.windows(2).all(|w| w[0] <= w[1]));
    assert!(published.iter().all(|p| *p <= 100));
}

#[test]
fn tracker_transferred_never_exceeds_total() {
    let mut tracker = ProgressTracker::new(777);
    for raw in 0..=120 {
        if let Some(p) = tracker.advance(raw) {
            assert!(p.transferred_bytes <= p.total_bytes);
        }
    }
    assert_eq!(tracker.last_percent(), Some(100));
}
