use super::*;
use crate::classifier::Letter;
use crate::clock::ManualClock;
use crate::config::GiftConfig;
use crate::events::SessionEvent;
use crate::fixtures::letter_hand;
use crate::hold::HoldTarget;
use crate::landmarks::LandmarkFrame;
use crate::session::SessionMode;
use crate::surprise::SurpriseId;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{timeout, Duration};

fn create_runtime() -> (SessionRuntime, ManualClock) {
    let clock = ManualClock::new(0);
    let runtime = SessionRuntime::new(GiftConfig::default(), Arc::new(clock.clone())).unwrap();
    (runtime, clock)
}

async fn next_matching<F>(receiver: &mut broadcast::Receiver<SessionEvent>, f: F) -> SessionEvent
where
    F: Fn(&SessionEvent) -> bool,
{
    timeout(Duration::from_secs(2), async {
        loop {
            let event = receiver.recv().await.unwrap();
            if f(&event) {
                return event;
            }
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_runtime_creation() {
    let (runtime, _clock) = create_runtime();
    let states = runtime.get_all_component_states().await;
    assert!(states.is_empty()); // Nothing started yet
    assert_eq!(runtime.snapshot().mode, SessionMode::Intro);
}

#[tokio::test]
async fn test_inputs_drive_the_session() {
    let (mut runtime, clock) = create_runtime();
    let mut events = runtime.event_bus().subscribe();
    runtime.start().await.unwrap();
    assert_eq!(
        runtime.get_component_state("session").await,
        Some(ComponentState::Running)
    );

    let handle = runtime.handle().unwrap();
    handle.intro_text_complete().await.unwrap();
    handle
        .landmarks(LandmarkFrame::with_hand(0, letter_hand(Letter::O)))
        .await
        .unwrap();
    next_matching(&mut events, |e| {
        matches!(e, SessionEvent::HoldProgress { target: HoldTarget::Ok, .. })
    })
    .await;

    clock.set(5000);
    handle
        .landmarks(LandmarkFrame::with_hand(5000, letter_hand(Letter::O)))
        .await
        .unwrap();
    let changed = next_matching(&mut events, |e| matches!(e, SessionEvent::ModeChanged { .. })).await;
    assert_eq!(
        changed,
        SessionEvent::ModeChanged {
            from: SessionMode::Intro,
            to: SessionMode::Instructions,
        }
    );
    assert_eq!(handle.snapshot().mode, SessionMode::Instructions);

    handle.shutdown().await.unwrap();
    timeout(Duration::from_secs(2), runtime.finished().cancelled())
        .await
        .unwrap();
    let summary = runtime.shutdown(ShutdownReason::UserRequest).await.unwrap();
    assert_eq!(summary.final_mode, SessionMode::Instructions);
    assert_eq!(summary.reason, ShutdownReason::UserRequest);
    assert!(summary.events_published >= 3);
    assert_eq!(
        runtime.get_component_state("session").await,
        Some(ComponentState::Stopped)
    );
}

#[tokio::test]
async fn test_rejected_input_is_counted_not_fatal() {
    let (mut runtime, _clock) = create_runtime();
    runtime.start().await.unwrap();
    let handle = runtime.handle().unwrap();

    handle
        .surprise_closed(SurpriseId::VoiceClip)
        .await
        .unwrap();
    handle.letter_card_closed(Letter::I).await.unwrap();
    handle.intro_text_complete().await.unwrap();
    handle.shutdown().await.unwrap();

    timeout(Duration::from_secs(2), runtime.finished().cancelled())
        .await
        .unwrap();
    let summary = runtime.shutdown(ShutdownReason::UserRequest).await.unwrap();
    assert_eq!(summary.rejected_inputs, 2);
    assert_eq!(summary.final_mode, SessionMode::Intro);
    assert_eq!(summary.collected, 0);
}

#[tokio::test]
async fn test_session_ends_when_inputs_close() {
    let (mut runtime, _clock) = create_runtime();
    runtime.start().await.unwrap();
    let handle = runtime.handle().unwrap();
    runtime.close_inputs();
    assert!(runtime.handle().is_err());

    handle.set_modal_open(true).await.unwrap();
    drop(handle);

    let summary = timeout(Duration::from_secs(2), runtime.run())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.reason, ShutdownReason::InputExhausted);
    assert!(runtime.snapshot().paused);
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let (mut runtime, _clock) = create_runtime();
    runtime.start().await.unwrap();

    let first = runtime
        .shutdown(ShutdownReason::Signal("SIGINT".to_string()))
        .await
        .unwrap();
    assert_eq!(first.reason, ShutdownReason::Signal("SIGINT".to_string()));

    let second = runtime.shutdown(ShutdownReason::UserRequest).await.unwrap();
    assert_eq!(second.session_id, first.session_id);
    assert_eq!(second.reason, first.reason);
}

#[tokio::test]
async fn test_shutdown_without_start() {
    let (mut runtime, _clock) = create_runtime();
    let summary = runtime.shutdown(ShutdownReason::UserRequest).await.unwrap();
    assert_eq!(summary.final_mode, SessionMode::Intro);
    assert_eq!(summary.events_published, 0);
}

#[tokio::test]
async fn test_start_twice_fails() {
    let (mut runtime, _clock) = create_runtime();
    runtime.start().await.unwrap();
    assert!(runtime.start().await.is_err());
    runtime.shutdown(ShutdownReason::UserRequest).await.unwrap();
}
