use dev_overlay::overlay::state::ErrorKind;
use dev_overlay::protocol::{ErrorPayload, OverlayEvent, SurfaceSignal};
use dev_overlay::transport::bridge::OverlayBridge;
use tokio::sync::mpsc;

fn payload(name: &str, kind: ErrorKind) -> ErrorPayload {
    ErrorPayload {
        name: name.to_string(),
        message: format!("{} happened", name),
        kind,
        frames: Vec::new(),
    }
}

#[test]
fn events_queue_until_readiness_and_flush_in_arrival_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut bridge = OverlayBridge::new();
    bridge.init(tx);

    bridge.runtime_error(payload("e1", ErrorKind::Runtime));
    bridge.compile_error(vec![payload("e2", ErrorKind::Compile)]);
    assert_eq!(bridge.pending_count(), 2);
    assert!(rx.try_recv().is_err(), "nothing delivered before readiness");

    bridge.handle_signal(SurfaceSignal::Ready);
    assert!(bridge.is_ready());
    assert_eq!(bridge.pending_count(), 0);

    match rx.try_recv().unwrap() {
        OverlayEvent::RuntimeError { error } => assert_eq!(error.name, "e1"),
        other => panic!("expected the runtime error first, got {:?}", other),
    }
    match rx.try_recv().unwrap() {
        OverlayEvent::CompileErrors { errors } => assert_eq!(errors[0].name, "e2"),
        other => panic!("expected the compile errors second, got {:?}", other),
    }
    assert!(rx.try_recv().is_err());
}

#[test]
fn ready_bridge_posts_immediately() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut bridge = OverlayBridge::new();
    bridge.init(tx);
    bridge.handle_signal(SurfaceSignal::Ready);

    bridge.clear_compile_errors();
    assert!(matches!(
        rx.try_recv().unwrap(),
        OverlayEvent::ClearCompileErrors
    ));
    assert_eq!(bridge.pending_count(), 0);
}

#[test]
fn close_resets_readiness_for_a_future_init() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut bridge = OverlayBridge::new();
    bridge.init(tx);
    bridge.handle_signal(SurfaceSignal::Ready);
    bridge.handle_signal(SurfaceSignal::Close);
    assert!(!bridge.is_ready());

    // events after close queue again instead of being lost
    bridge.clear_runtime_errors();
    assert_eq!(bridge.pending_count(), 1);
    assert!(rx.try_recv().is_err());

    let (tx2, mut rx2) = mpsc::unbounded_channel();
    bridge.init(tx2);
    bridge.handle_signal(SurfaceSignal::Ready);
    assert!(matches!(
        rx2.try_recv().unwrap(),
        OverlayEvent::ClearRuntimeErrors
    ));
}

#[test]
fn dispatch_without_a_surface_is_a_queued_noop() {
    let mut bridge = OverlayBridge::new();
    bridge.runtime_error(payload("early", ErrorKind::Runtime));
    assert_eq!(bridge.pending_count(), 1);
}

#[test]
fn signals_round_trip_as_json() {
    let ready = serde_json::to_string(&SurfaceSignal::Ready).unwrap();
    assert_eq!(
        serde_json::from_str::<SurfaceSignal>(&ready).unwrap(),
        SurfaceSignal::Ready
    );
}
