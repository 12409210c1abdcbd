//! Cancellation and late-result handling on the coordination path

use std::time::{Duration, Instant};

use glance_translator::Translation;
use glance_types::{
    HotkeyKey, KeyEvent, OcrResult, PointerEvent, SegmentationMode, SelectionRegion,
    SessionReport, SessionStage, TranslationModel,
};
use tokio_util::sync::CancellationToken;

use super::fakes::{HarnessBuilder, Reply};
use crate::{CoordinatorEvent, DetectorState, Disposition, SessionEnd};

fn region() -> SelectionRegion {
    SelectionRegion::new(0, 0, 100, 30)
}

#[tokio::test]
async fn test_cancel_while_translating_discards_late_result() {
    let mut h = HarnessBuilder::new().reply(Reply::Hang).build().await;

    h.activate().await;
    h.drag(region()).await;
    h.pump().await;
    assert_eq!(h.coordinator.stage(), SessionStage::Translating);
    let id = h.coordinator.active_session().unwrap();

    assert_eq!(h.coordinator.handle(CoordinatorEvent::Cancel).await, Disposition::Applied);
    assert_eq!(h.coordinator.stage(), SessionStage::Idle);
    assert_eq!(
        h.coordinator.last_outcome().map(|o| o.end),
        Some(SessionEnd::Cancelled)
    );

    // the in-flight request observes its token and reports back; ignored
    assert_eq!(h.pump().await, Disposition::Stale);

    // a success arriving after cancellation is never applied either
    let late = CoordinatorEvent::TranslationFinished {
        session: id,
        result: Ok(Translation {
            text: "สวัสดี".to_string(),
            model: TranslationModel::Gemma3n,
            elapsed: Duration::from_secs(3),
        }),
    };
    assert_eq!(h.coordinator.handle(late).await, Disposition::Stale);

    assert!(h.clipboard.writes().is_empty());
    let stages = h.overlay.stages();
    assert!(!stages.contains(&SessionStage::Presenting));
    assert_eq!(stages.last(), Some(&SessionStage::Idle));
    assert_eq!(h.overlay.results().len(), 1);
    assert_eq!(h.overlay.results()[0].report, SessionReport::Cancelled);
}

#[tokio::test]
async fn test_cancel_key_during_selection() {
    let mut h = HarnessBuilder::new().build().await;

    h.activate().await;
    h.coordinator
        .handle(CoordinatorEvent::Pointer(PointerEvent::Down { x: 5, y: 5 }))
        .await;

    let disposition = h
        .coordinator
        .handle(CoordinatorEvent::Key(KeyEvent::down(HotkeyKey::Cancel, Instant::now())))
        .await;
    assert_eq!(disposition, Disposition::Applied);
    assert_eq!(h.coordinator.stage(), SessionStage::Idle);
    assert_eq!(
        h.coordinator.last_outcome().map(|o| o.end),
        Some(SessionEnd::Cancelled)
    );

    // pointer-up after the cancel does nothing
    assert_eq!(
        h.coordinator
            .handle(CoordinatorEvent::Pointer(PointerEvent::Up { x: 80, y: 40 }))
            .await,
        Disposition::Ignored
    );
    assert!(h.capture.calls().is_empty());
}

#[tokio::test]
async fn test_zero_area_selection_is_cancelled() {
    let mut h = HarnessBuilder::new().build().await;

    h.activate().await;
    h.drag(SelectionRegion::new(40, 10, 0, 25)).await;

    assert_eq!(h.coordinator.stage(), SessionStage::Idle);
    assert_eq!(
        h.coordinator.last_outcome().map(|o| o.end),
        Some(SessionEnd::Cancelled)
    );
    assert!(h.capture.calls().is_empty());
    assert!(!h.coordinator.selection().is_selecting());
}

#[tokio::test]
async fn test_lapsed_double_press_window_resets_detector_while_waiting() {
    let mut config = glance_config::Config::default();
    config.hotkey.double_press_threshold_ms = 50;
    let mut h = HarnessBuilder::new().config(config).build().await;

    h.coordinator
        .handle(CoordinatorEvent::Key(KeyEvent::down(
            HotkeyKey::Activation,
            Instant::now(),
        )))
        .await;
    assert!(matches!(
        h.coordinator.detector().state(),
        DetectorState::PendingSecondPress { .. }
    ));

    // nothing arrives; only the window deadline and then shutdown fire
    let (_tx, rx) = kanal::bounded_async::<CoordinatorEvent>(1);
    let shutdown = CancellationToken::new();
    let stop = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        stop.cancel();
    });

    let event = h.coordinator.next_event(&rx, &shutdown).await;
    assert!(matches!(event, CoordinatorEvent::Shutdown));
    assert_eq!(h.coordinator.detector().state(), DetectorState::Idle);
    assert_eq!(h.coordinator.stage(), SessionStage::Idle);
}

#[tokio::test]
async fn test_result_for_previous_session_is_stale() {
    let mut h = HarnessBuilder::new().build().await;

    h.activate().await;
    h.drag(region()).await;
    let old = h.coordinator.active_session().unwrap();
    h.coordinator.handle(CoordinatorEvent::Cancel).await;

    // old OCR worker still reports
    assert_eq!(h.pump().await, Disposition::Stale);

    h.activate().await;
    let current = h.coordinator.active_session().unwrap();
    assert_ne!(old, current);

    let stale = CoordinatorEvent::OcrFinished {
        session: old,
        result: Ok(OcrResult::found("Hello".into(), SegmentationMode::SingleBlock)),
    };
    assert_eq!(h.coordinator.handle(stale).await, Disposition::Stale);
    assert_eq!(h.coordinator.stage(), SessionStage::Selecting);
}

#[tokio::test]
async fn test_result_for_wrong_stage_is_stale() {
    let mut h = HarnessBuilder::new().build().await;
    h.activate().await;
    let id = h.coordinator.active_session().unwrap();

    let early = CoordinatorEvent::OcrFinished {
        session: id,
        result: Ok(OcrResult::found("Hello".into(), SegmentationMode::SingleBlock)),
    };
    assert_eq!(h.coordinator.handle(early).await, Disposition::Stale);
    assert_eq!(h.coordinator.stage(), SessionStage::Selecting);
}

#[tokio::test]
async fn test_cancel_when_idle_is_ignored() {
    let mut h = HarnessBuilder::new().build().await;
    assert_eq!(h.coordinator.handle(CoordinatorEvent::Cancel).await, Disposition::Ignored);
    assert!(h.coordinator.last_outcome().is_none());
    assert!(h.overlay.results().is_empty());
}

#[tokio::test]
async fn test_new_session_after_cancel_gets_fresh_token() {
    let mut h = HarnessBuilder::new().build().await;

    h.activate().await;
    h.coordinator.handle(CoordinatorEvent::Cancel).await;

    h.activate().await;
    h.drag(region()).await;
    h.pump().await;
    h.pump().await;

    assert_eq!(
        h.coordinator.last_outcome().map(|o| o.end),
        Some(SessionEnd::Completed)
    );
    assert_eq!(h.clipboard.writes(), vec!["สวัสดี".to_string()]);
}

#[tokio::test]
async fn test_run_loop_stops_on_shutdown() {
    let h = HarnessBuilder::new().reply(Reply::Hang).build().await;
    let overlay = h.overlay.clone();
    let (tx, rx) = kanal::bounded_async(8);
    let shutdown = CancellationToken::new();

    let task = tokio::spawn(h.coordinator.run(rx, shutdown.clone()));

    tx.send(CoordinatorEvent::Activate(glance_types::ActivationSource::Manual))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(overlay.stages(), vec![SessionStage::Selecting]);

    shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("coordinator should stop")
        .unwrap();
    assert!(result.is_ok());

    // the live session was cancelled on the way out
    assert_eq!(overlay.results()[0].report, SessionReport::Cancelled);
}
