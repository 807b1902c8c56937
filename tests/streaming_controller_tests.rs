// Integration tests for the per-connection streaming controller
//
// These tests drive the controller with the same frames a websocket client
// sends and check the emitted events, engine calls and registry state.

mod common;

use anyhow::Result;
use common::{pcm_frame, Call, Script, ScriptedEngine, StalledEngine, STRIDE};
use std::sync::Arc;
use std::time::Duration;
use stream_asr::{
    ClientMessage, InferenceEngine, ServerEvent, SessionRegistry, StreamingController,
    StreamingSettings,
};

fn controller_with(
    engine: Arc<dyn InferenceEngine>,
    settings: StreamingSettings,
) -> (StreamingController, SessionRegistry) {
    let registry = SessionRegistry::new(settings.params.chunk_stride());
    let controller = StreamingController::connect(registry.clone(), engine, settings);
    (controller, registry)
}

fn setup(script: Script) -> (StreamingController, SessionRegistry, Arc<ScriptedEngine>) {
    let engine = Arc::new(ScriptedEngine::new(script));
    let (controller, registry) = controller_with(engine.clone(), StreamingSettings::default());
    (controller, registry, engine)
}

fn audio(samples: usize) -> ClientMessage {
    ClientMessage::Audio(pcm_frame(samples))
}

fn control(json: &str) -> ClientMessage {
    ClientMessage::Control(json.to_string())
}

async fn buffered(controller: &StreamingController, registry: &SessionRegistry) -> usize {
    let id = controller.session_id().expect("controller should hold a session");
    let session = registry.get(&id).unwrap();
    let session = session.lock().await;
    session.audio.buffered()
}

#[tokio::test]
async fn test_connect_creates_session() {
    let (controller, registry, _engine) = setup(Script::Counting);

    let id = controller.session_id().expect("session created on connect");
    assert!(registry.contains(&id));
    assert_eq!(registry.stats().active_sessions, 1);
}

#[tokio::test]
async fn test_no_dispatch_until_window_complete() {
    let (mut controller, registry, engine) = setup(Script::Counting);

    let events = controller.handle(audio(5000)).await;
    assert!(events.is_empty());
    assert_eq!(engine.call_count(), 0);

    let events = controller.handle(audio(5000)).await;
    assert_eq!(events, vec![ServerEvent::partial("c0".into(), "c0".into())]);
    assert_eq!(
        engine.calls(),
        vec![Call {
            samples: STRIDE,
            is_final: false,
            cache_in: None,
        }]
    );
    assert_eq!(buffered(&controller, &registry).await, 400);
}

#[tokio::test]
async fn test_short_frame_is_discarded() {
    let (mut controller, registry, engine) = setup(Script::Counting);

    let events = controller.handle(audio(50)).await;

    assert!(events.is_empty());
    assert_eq!(engine.call_count(), 0);
    assert_eq!(buffered(&controller, &registry).await, 0);
}

#[tokio::test]
async fn test_stop_without_start_returns_empty_transcript() {
    let (mut controller, registry, engine) = setup(Script::Counting);
    let first = controller.session_id().unwrap();

    let events = controller.handle(control(r#"{"action":"stop"}"#)).await;

    assert_eq!(events, vec![ServerEvent::final_result(String::new())]);
    assert_eq!(engine.call_count(), 0, "empty buffer needs no flush");
    assert_eq!(registry.stats().total_requests, 1);

    let next = controller.session_id().expect("stop recreates a session");
    assert_ne!(first, next);
    assert!(!registry.contains(&first));
    assert_eq!(registry.stats().active_sessions, 1);
}

#[tokio::test]
async fn test_stop_flushes_remainder_with_final_flag() {
    let (mut controller, registry, engine) = setup(Script::Counting);

    controller.handle(audio(STRIDE + 400)).await;
    let events = controller.handle(control(r#"{"action":"stop"}"#)).await;

    assert_eq!(events, vec![ServerEvent::final_result("c0c1".into())]);
    assert_eq!(
        engine.calls(),
        vec![
            Call {
                samples: STRIDE,
                is_final: false,
                cache_in: None,
            },
            Call {
                samples: 400,
                is_final: true,
                cache_in: Some(1),
            },
        ]
    );
    assert_eq!(buffered(&controller, &registry).await, 0);
    assert_eq!(registry.stats().total_requests, 1);
}

#[tokio::test]
async fn test_multiple_windows_in_one_push_emit_in_order() {
    let (mut controller, _registry, engine) = setup(Script::Counting);

    let events = controller.handle(audio(3 * STRIDE + 10)).await;

    assert_eq!(
        events,
        vec![
            ServerEvent::partial("c0".into(), "c0".into()),
            ServerEvent::partial("c0c1".into(), "c1".into()),
            ServerEvent::partial("c0c1c2".into(), "c2".into()),
        ]
    );

    let caches: Vec<Option<u32>> = engine.calls().iter().map(|c| c.cache_in).collect();
    assert_eq!(caches, vec![None, Some(1), Some(2)], "cache must be threaded");
}

#[tokio::test]
async fn test_push_granularity_does_not_change_transcript() -> Result<()> {
    let (mut bulk, _r1, _e1) = setup(Script::Counting);
    let (mut trickle, _r2, _e2) = setup(Script::Counting);

    let total = 3 * STRIDE + 700;
    bulk.handle(audio(total)).await;
    for _ in 0..(total / 500) {
        trickle.handle(audio(500)).await;
    }

    let stop = r#"{"action":"stop"}"#;
    let bulk_final = bulk.handle(control(stop)).await;
    let trickle_final = trickle.handle(control(stop)).await;

    assert_eq!(bulk_final, vec![ServerEvent::final_result("c0c1c2c3".into())]);
    assert_eq!(bulk_final, trickle_final);

    Ok(())
}

#[tokio::test]
async fn test_start_discards_previous_session() {
    let (mut controller, registry, _engine) = setup(Script::Counting);
    let first = controller.session_id().unwrap();

    controller.handle(audio(STRIDE + 500)).await;
    let events = controller.handle(control(r#"{"action":"start"}"#)).await;

    let second = controller.session_id().unwrap();
    assert_ne!(first, second);
    assert_eq!(events, vec![ServerEvent::ready(second)]);
    assert!(!registry.contains(&first));
    assert_eq!(registry.stats().active_sessions, 1);

    let events = controller.handle(control(r#"{"action":"stop"}"#)).await;
    assert_eq!(
        events,
        vec![ServerEvent::final_result(String::new())],
        "no transcript may leak from the discarded session"
    );
}

#[tokio::test]
async fn test_repeated_start_keeps_single_session() {
    let (mut controller, registry, _engine) = setup(Script::Counting);

    for _ in 0..5 {
        controller.handle(control(r#"{"action":"start"}"#)).await;
    }

    assert_eq!(registry.stats().active_sessions, 1);
    assert_eq!(registry.stats().total_requests, 0);
}

#[tokio::test]
async fn test_silent_engine_emits_no_partials() {
    let (mut controller, registry, engine) = setup(Script::Silent);

    let events = controller.handle(audio(2 * STRIDE)).await;
    assert!(events.is_empty());
    assert_eq!(engine.call_count(), 2);

    let id = controller.session_id().unwrap();
    {
        let session = registry.get(&id).unwrap();
        let session = session.lock().await;
        assert_eq!(session.chunk_count(), 0);
        assert_eq!(session.cache.as_bytes(), &2u32.to_le_bytes());
    }

    let events = controller.handle(control(r#"{"action":"stop"}"#)).await;
    assert_eq!(events, vec![ServerEvent::final_result(String::new())]);
}

#[tokio::test]
async fn test_inference_failure_abandons_session() {
    let (mut controller, registry, _engine) = setup(Script::FailOn(1));

    let events = controller.handle(audio(2 * STRIDE)).await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ServerEvent::partial("c0".into(), "c0".into()));
    match &events[1] {
        ServerEvent::Error { message } => assert!(message.contains("scripted failure")),
        other => panic!("expected error event, got {:?}", other),
    }
    assert!(controller.session_id().is_none());
    assert_eq!(registry.stats().active_sessions, 0);

    // Audio is unusable until a session is recreated
    let events = controller.handle(audio(STRIDE)).await;
    assert!(matches!(events.as_slice(), [ServerEvent::Error { .. }]));

    let events = controller.handle(control(r#"{"action":"start"}"#)).await;
    assert!(matches!(events.as_slice(), [ServerEvent::Status { .. }]));

    let events = controller.handle(audio(STRIDE)).await;
    assert_eq!(events, vec![ServerEvent::partial("c0".into(), "c0".into())]);
}

#[tokio::test]
async fn test_stop_after_failure_recreates_session_without_counting() {
    let (mut controller, registry, _engine) = setup(Script::FailOn(0));

    controller.handle(audio(STRIDE)).await;
    assert!(controller.session_id().is_none());

    let events = controller.handle(control(r#"{"action":"stop"}"#)).await;

    assert_eq!(events, vec![ServerEvent::final_result(String::new())]);
    assert!(controller.session_id().is_some());
    assert_eq!(registry.stats().total_requests, 0);
    assert_eq!(registry.stats().active_sessions, 1);
}

#[tokio::test]
async fn test_final_flush_failure_still_completes() {
    let (mut controller, registry, _engine) = setup(Script::FailOn(1));

    controller.handle(audio(STRIDE + 300)).await;
    let events = controller.handle(control(r#"{"action":"stop"}"#)).await;

    assert_eq!(events, vec![ServerEvent::final_result("c0".into())]);
    assert_eq!(registry.stats().total_requests, 1);
    assert!(controller.session_id().is_some());
}

#[tokio::test]
async fn test_malformed_control_is_ignored() {
    let (mut controller, registry, _engine) = setup(Script::Counting);
    let id = controller.session_id();

    for payload in ["not json", "{\"action\":", "[1,2]", r#"{"action":42}"#] {
        assert!(controller.handle(control(payload)).await.is_empty());
    }
    assert!(controller
        .handle(control(r#"{"action":"pause"}"#))
        .await
        .is_empty());
    assert!(controller.handle(control("{}")).await.is_empty());

    assert_eq!(controller.session_id(), id);
    assert_eq!(registry.stats().active_sessions, 1);
}

#[tokio::test]
async fn test_malformed_audio_frame_is_ignored() {
    let (mut controller, registry, engine) = setup(Script::Counting);

    let events = controller.handle(ClientMessage::Audio(vec![0u8; 4001])).await;

    assert!(events.is_empty());
    assert_eq!(engine.call_count(), 0);
    assert_eq!(buffered(&controller, &registry).await, 0);
}

#[tokio::test]
async fn test_drop_releases_session() {
    let (mut controller, registry, _engine) = setup(Script::Counting);
    controller.handle(audio(1000)).await;

    drop(controller);

    assert_eq!(registry.stats().active_sessions, 0);
}

#[tokio::test]
async fn test_close_releases_session() {
    let (controller, registry, _engine) = setup(Script::Counting);

    controller.close();

    assert_eq!(registry.stats().active_sessions, 0);
}

#[tokio::test]
async fn test_inference_timeout_is_failure() {
    let settings = StreamingSettings {
        inference_timeout: Some(Duration::from_millis(50)),
        ..StreamingSettings::default()
    };
    let (mut controller, registry) = controller_with(Arc::new(StalledEngine), settings);

    let events = controller.handle(audio(STRIDE)).await;

    match events.as_slice() {
        [ServerEvent::Error { message }] => assert!(message.contains("timed out")),
        other => panic!("expected a single error event, got {:?}", other),
    }
    assert_eq!(registry.stats().active_sessions, 0);
}

#[tokio::test]
async fn test_aborting_in_flight_inference_releases_session() {
    let (mut controller, registry) =
        controller_with(Arc::new(StalledEngine), StreamingSettings::default());
    assert_eq!(registry.stats().active_sessions, 1);

    let task = tokio::spawn(async move {
        controller.handle(audio(STRIDE)).await;
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    task.abort();
    let _ = task.await;

    assert_eq!(registry.stats().active_sessions, 0);
}

#[test]
fn test_server_event_wire_format() {
    let id = uuid::Uuid::nil();

    let ready = serde_json::to_value(ServerEvent::ready(id)).unwrap();
    assert_eq!(
        ready,
        serde_json::json!({
            "type": "status",
            "status": "ready",
            "session_id": "00000000-0000-0000-0000-000000000000"
        })
    );

    let partial = serde_json::to_value(ServerEvent::partial("ab".into(), "b".into())).unwrap();
    assert_eq!(
        partial,
        serde_json::json!({"type": "partial", "text": "ab", "chunk": "b", "status": "recognizing"})
    );

    let done = serde_json::to_value(ServerEvent::final_result("ab".into())).unwrap();
    assert_eq!(
        done,
        serde_json::json!({"type": "final", "text": "ab", "status": "completed"})
    );

    let error = serde_json::to_value(ServerEvent::error("boom")).unwrap();
    assert_eq!(error, serde_json::json!({"type": "error", "message": "boom"}));
}
