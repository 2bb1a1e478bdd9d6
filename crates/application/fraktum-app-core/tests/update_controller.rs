use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fraktum_app_core::{
    CheckOutcome, InstallChoice, InstallPrompt, QuitOutcome, UpdateController, UpdateEvents,
};
use fraktum_core::{StatusPhase, UpdateEvent, UpdatePhase};
use fraktum_infra::{AvailableRelease, ReleaseFeed, UpdateError};

#[derive(Default)]
struct FeedScript {
    packaged: bool,
    unavailable: Option<String>,
    release: Option<(String, u64)>,
    check_error: Option<String>,
    check_delay: Option<Duration>,
    download_error: Option<String>,
    progress: Vec<i32>,
    apply_error: Mutex<Option<String>>,
    applied: AtomicUsize,
    scheduled_on_exit: AtomicUsize,
}

#[derive(Clone)]
struct FakeFeed(Arc<FeedScript>);

impl ReleaseFeed for FakeFeed {
    type Release = String;

    fn is_packaged(&self) -> bool {
        self.0.packaged
    }

    fn unavailable_reason(&self) -> Option<String> {
        self.0.unavailable.clone()
    }

    fn check(&self) -> Result<Option<AvailableRelease<String>>, UpdateError> {
        if let Some(delay) = self.0.check_delay {
            std::thread::sleep(delay);
        }
        if let Some(e) = &self.0.check_error {
            return Err(UpdateError::Network(e.clone()));
        }
        Ok(self.0.release.clone().map(|(version, total_bytes)| AvailableRelease {
            release: version.clone(),
            version,
            total_bytes,
        }))
    }

    fn download(
        &self,
        _release: &String,
        progress: &(dyn Fn(i32) + Send + Sync),
    ) -> Result<(), UpdateError> {
        for pct in &self.0.progress {
            progress(*pct);
        }
        match &self.0.download_error {
            Some(e) => Err(UpdateError::Network(e.clone())),
            None => Ok(()),
        }
    }

    fn apply_and_restart(&self, _release: &String) -> Result<(), UpdateError> {
        if let Some(e) = self.0.apply_error.lock().unwrap().clone() {
            return Err(UpdateError::Network(e));
        }
        self.0.applied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn apply_on_exit(&self, _release: &String) -> Result<(), UpdateError> {
        self.0.scheduled_on_exit.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FixedPrompt {
    choice: InstallChoice,
    asked: AtomicUsize,
}

#[async_trait]
impl InstallPrompt for FixedPrompt {
    async fn ask(&self, _version: &str) -> InstallChoice {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.choice
    }
}

fn controller(
    script: FeedScript,
    choice: InstallChoice,
) -> (
    UpdateController<FakeFeed>,
    UpdateEvents,
    Arc<FeedScript>,
    Arc<FixedPrompt>,
) {
    let script = Arc::new(script);
    let prompt = Arc::new(FixedPrompt {
        choice,
        asked: AtomicUsize::new(0),
    });
    let (ctl, rx) = UpdateController::new(FakeFeed(script.clone()), prompt.clone());
    (ctl, rx, script, prompt)
}

fn packaged_with_release(version: &str, total: u64) -> FeedScript {
    FeedScript {
        packaged: true,
        release: Some((version.to_string(), total)),
        ..FeedScript::default()
    }
}

async fn next_event(rx: &mut UpdateEvents) -> UpdateEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for update event")
        .expect("update event channel closed")
}

/// Collects events up to and including the first status event with one of `phases`.
async fn events_until(rx: &mut UpdateEvents, phases: &[StatusPhase]) -> Vec<UpdateEvent> {
    let mut seen = Vec::new();
    loop {
        let ev = next_event(rx).await;
        let done = matches!(&ev, UpdateEvent::Status(s) if phases.contains(&s.phase));
        seen.push(ev);
        if done {
            return seen;
        }
    }
}

fn status_phases(events: &[UpdateEvent]) -> Vec<StatusPhase> {
    events
        .iter()
        .filter_map(|e| match e {
            UpdateEvent::Status(s) => Some(s.phase),
            UpdateEvent::Progress(_) => None,
        })
        .collect()
}

async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..250 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn unpackaged_build_check_is_silent() {
    let (ctl, mut rx, _, _) = controller(FeedScript::default(), InstallChoice::Later);

    assert_eq!(ctl.check_for_updates(), CheckOutcome::NotApplicable);
    assert_eq!(ctl.quit_and_install().await, QuitOutcome::NotApplicable);
    assert!(rx.try_recv().is_err());
    assert_eq!(ctl.state().phase(), UpdatePhase::Idle);
}

#[tokio::test]
async fn unavailable_feed_is_reported_without_events() {
    let script = FeedScript {
        packaged: true,
        unavailable: Some("no release feed configured".into()),
        ..FeedScript::default()
    };
    let (ctl, mut rx, _, _) = controller(script, InstallChoice::Later);

    assert!(matches!(ctl.check_for_updates(), CheckOutcome::Unavailable(_)));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn full_cycle_defers_install_until_exit() {
    let mut script = packaged_with_release("1.2.0", 1000);
    script.progress = vec![10, 5, 50, 150, 100];
    let (ctl, mut rx, feed, prompt) = controller(script, InstallChoice::Later);

    assert_eq!(ctl.check_for_updates(), CheckOutcome::Accepted);
    let events = events_until(&mut rx, &[StatusPhase::Downloaded, StatusPhase::Error]).await;

    assert_eq!(
        status_phases(&events),
        vec![
            StatusPhase::Checking,
            StatusPhase::Available,
            StatusPhase::Downloaded
        ]
    );
    assert_eq!(events[1], UpdateEvent::available("1.2.0"));
    assert_eq!(events.last(), Some(&UpdateEvent::downloaded("1.2.0")));

    let percents: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            UpdateEvent::Progress(p) => {
                assert!(p.transferred_bytes <= p.total_bytes);
                Some(p.percent)
            }
            UpdateEvent::Status(_) => None,
        })
        .collect();
    assert_eq!(percents, vec![10, 50, 100]);

    wait_for(|| prompt.asked.load(Ordering::SeqCst) == 1).await;
    assert_eq!(ctl.state().phase(), UpdatePhase::Downloaded);
    assert_eq!(ctl.state().version(), Some("1.2.0"));
    assert_eq!(feed.applied.load(Ordering::SeqCst), 0);

    assert!(ctl.install_on_exit());
    assert!(!ctl.install_on_exit());
    assert_eq!(feed.scheduled_on_exit.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn no_update_allows_another_check() {
    let (ctl, mut rx, _, _) = controller(
        FeedScript {
            packaged: true,
            ..FeedScript::default()
        },
        InstallChoice::Later,
    );

    ctl.check_for_updates();
    let events = events_until(&mut rx, &[StatusPhase::NoUpdate]).await;
    assert_eq!(
        status_phases(&events),
        vec![StatusPhase::Checking, StatusPhase::NoUpdate]
    );
    assert_eq!(ctl.state().phase(), UpdatePhase::NoUpdate);

    assert_eq!(ctl.check_for_updates(), CheckOutcome::Accepted);
    let again = events_until(&mut rx, &[StatusPhase::NoUpdate]).await;
    assert_eq!(status_phases(&again)[0], StatusPhase::Checking);
}

#[tokio::test]
async fn check_failure_reports_error_and_returns_to_idle() {
    let script = FeedScript {
        packaged: true,
        check_error: Some("feed unreachable".into()),
        ..FeedScript::default()
    };
    let (ctl, mut rx, _, _) = controller(script, InstallChoice::Later);

    ctl.check_for_updates();
    let events = events_until(&mut rx, &[StatusPhase::Error]).await;

    assert_eq!(
        status_phases(&events),
        vec![StatusPhase::Checking, StatusPhase::Error]
    );
    match events.last() {
        Some(UpdateEvent::Status(s)) => {
            assert!(s.error.as_deref().unwrap_or("").contains("feed unreachable"))
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(ctl.state().phase(), UpdatePhase::Idle);
}

#[tokio::test]
async fn download_failure_reports_error_and_returns_to_idle() {
    let mut script = packaged_with_release("2.0.0", 10);
    script.download_error = Some("connection reset".into());
    let (ctl, mut rx, _, prompt) = controller(script, InstallChoice::Now);

    ctl.check_for_updates();
    let events = events_until(&mut rx, &[StatusPhase::Error, StatusPhase::Downloaded]).await;

    assert_eq!(
        status_phases(&events),
        vec![
            StatusPhase::Checking,
            StatusPhase::Available,
            StatusPhase::Error
        ]
    );
    assert_eq!(ctl.state().phase(), UpdatePhase::Idle);
    assert_eq!(prompt.asked.load(Ordering::SeqCst), 0);
    assert!(!ctl.install_on_exit());
}

#[tokio::test]
async fn second_check_during_cycle_starts_nothing() {
    let script = FeedScript {
        packaged: true,
        check_delay: Some(Duration::from_millis(200)),
        ..FeedScript::default()
    };
    let (ctl, mut rx, _, _) = controller(script, InstallChoice::Later);

    assert_eq!(ctl.check_for_updates(), CheckOutcome::Accepted);
    assert_eq!(ctl.state().phase(), UpdatePhase::Checking);
    assert_eq!(ctl.check_for_updates(), CheckOutcome::Accepted);

    let events = events_until(&mut rx, &[StatusPhase::NoUpdate]).await;
    let checking = status_phases(&events)
        .into_iter()
        .filter(|p| *p == StatusPhase::Checking)
        .count();
    assert_eq!(checking, 1);
}

#[tokio::test]
async fn quit_and_install_without_download_is_refused() {
    let (ctl, mut rx, feed, _) = controller(
        FeedScript {
            packaged: true,
            ..FeedScript::default()
        },
        InstallChoice::Later,
    );

    assert_eq!(ctl.quit_and_install().await, QuitOutcome::NothingDownloaded);
    assert!(rx.try_recv().is_err());
    assert_eq!(feed.applied.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn restart_now_applies_once() {
    let (ctl, mut rx, feed, _) = controller(packaged_with_release("1.3.0", 100), InstallChoice::Now);

    ctl.check_for_updates();
    events_until(&mut rx, &[StatusPhase::Downloaded]).await;

    wait_for(|| feed.applied.load(Ordering::SeqCst) == 1).await;
    assert_eq!(ctl.state().phase(), UpdatePhase::InstallPending);
    assert!(!ctl.install_on_exit());
    assert_eq!(feed.scheduled_on_exit.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_install_keeps_update_for_exit() {
    let script = packaged_with_release("1.4.0", 100);
    *script.apply_error.lock().unwrap() = Some("installer missing".into());
    let (ctl, mut rx, feed, prompt) = controller(script, InstallChoice::Later);

    ctl.check_for_updates();
    events_until(&mut rx, &[StatusPhase::Downloaded]).await;
    wait_for(|| prompt.asked.load(Ordering::SeqCst) == 1).await;

    let outcome = ctl.quit_and_install().await;
    assert!(matches!(outcome, QuitOutcome::Failed(ref m) if m.contains("installer missing")));

    let ev = next_event(&mut rx).await;
    assert!(matches!(ev, UpdateEvent::Status(ref s) if s.phase == StatusPhase::Error));
    assert_eq!(ctl.state().phase(), UpdatePhase::Downloaded);

    assert!(ctl.install_on_exit());
    assert_eq!(feed.scheduled_on_exit.load(Ordering::SeqCst), 1);
}
