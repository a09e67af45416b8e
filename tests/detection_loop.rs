use std::sync::{Arc, Mutex};
use std::time::Duration;

use ar_assist::detect::{ScriptedClassifier, ScriptedReply, SharedEventStore};
use ar_assist::{
    ClassificationResult, DetectionClient, EventStore, FrameSampler, InMemoryEventStore,
    LoopExit, LoopHandle, LoopObserver, LoopRuntime, LoopSettings, ObjectCatalog, ObjectType,
    SamplerSettings, SyntheticSource,
};

const RUN_LIMIT: Duration = Duration::from_secs(5);

#[derive(Clone, Default)]
struct Seen {
    detections: Arc<Mutex<Vec<ClassificationResult>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

struct Recorder {
    seen: Seen,
    confirm_with: Option<LoopHandle>,
}

impl LoopObserver for Recorder {
    fn on_detection(&mut self, result: &ClassificationResult) {
        self.seen.detections.lock().unwrap().push(result.clone());
        if let Some(handle) = &self.confirm_with {
            handle.confirm(result.object_type.clone()).unwrap();
        }
    }

    fn on_error(&mut self, diagnostic: &str) {
        self.seen.errors.lock().unwrap().push(diagnostic.to_string());
    }
}

fn fast_settings(cooldown: Duration) -> LoopSettings {
    LoopSettings {
        tick_interval: Duration::from_millis(20),
        cooldown,
        min_confidence: 60,
    }
}

fn runtime(
    backend: Arc<ScriptedClassifier>,
    settings: LoopSettings,
    store: Option<SharedEventStore>,
) -> LoopRuntime {
    let mut client = DetectionClient::new(backend, ObjectCatalog::default());
    if let Some(store) = store {
        client = client.with_event_store(store);
    }
    let sampler = FrameSampler::new(SamplerSettings {
        max_dimension: 64,
        jpeg_quality: 70,
    });
    LoopRuntime::new(settings, sampler, Arc::new(client))
}

fn source() -> Box<SyntheticSource> {
    Box::new(SyntheticSource::new("test", 48, 32))
}

#[test]
fn confirms_first_confident_detection() {
    let backend = Arc::new(ScriptedClassifier::new(vec![
        ScriptedReply::object("unknown", 90.0),
        ScriptedReply::object("graffiti", 85.0),
    ]));
    let events = Arc::new(Mutex::new(InMemoryEventStore::new()));
    let store: SharedEventStore = events.clone();
    let seen = Seen::default();

    let mut rt = runtime(
        backend.clone(),
        fast_settings(Duration::from_secs(30)),
        Some(store),
    );
    let handle = rt.handle();
    rt = rt.with_observer(Recorder {
        seen: seen.clone(),
        confirm_with: Some(handle),
    });

    rt.start(source());
    let exit = rt.run(Some(RUN_LIMIT)).unwrap();

    let LoopExit::Confirmed(confirmation) = exit else {
        panic!("expected confirmation, got {:?}", exit);
    };
    assert_eq!(confirmation.object_type, ObjectType::new("graffiti"));
    let last = confirmation.last_result.expect("last result");
    assert_eq!(last.confidence, 85);

    assert_eq!(seen.detections.lock().unwrap().len(), 1);
    assert!(!rt.controller().state().is_active());
    assert!(rt.controller().state().last_result().is_none());

    // Only the known object was logged.
    let recorded = events.lock().unwrap().recent(10).unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].event.object_type, "graffiti");
    assert_eq!(confirmation.event_id, Some(recorded[0].id));
}

#[test]
fn classifier_slower_than_interval_still_delivers_results() {
    let backend = Arc::new(
        ScriptedClassifier::new(vec![ScriptedReply::object("syringe", 95.0)])
            .with_delay(Duration::from_millis(60)),
    );
    let seen = Seen::default();
    let mut rt = runtime(backend.clone(), fast_settings(Duration::from_secs(30)), None)
        .with_observer(Recorder {
            seen: seen.clone(),
            confirm_with: None,
        });

    rt.start(source());
    let exit = rt.run(Some(Duration::from_millis(600))).unwrap();

    assert_eq!(exit, LoopExit::TimedOut);
    assert_eq!(backend.calls(), 1);
    assert_eq!(seen.detections.lock().unwrap().len(), 1);
    let last = rt.controller().state().last_result().expect("slow result kept");
    assert_eq!(last.object_type.as_str(), "syringe");
    assert_eq!(last.confidence, 95);
}

#[test]
fn cooldown_suppresses_requests_until_it_elapses() {
    let backend = Arc::new(ScriptedClassifier::new(vec![ScriptedReply::object(
        "syringe", 95.0,
    )]));
    let seen = Seen::default();
    let settings = LoopSettings {
        tick_interval: Duration::from_millis(100),
        ..fast_settings(Duration::from_secs(30))
    };
    let mut rt = runtime(backend.clone(), settings, None).with_observer(Recorder {
        seen: seen.clone(),
        confirm_with: None,
    });

    rt.start(source());
    let exit = rt.run(Some(Duration::from_millis(600))).unwrap();

    assert_eq!(exit, LoopExit::TimedOut);
    assert_eq!(backend.calls(), 1);
    assert_eq!(seen.detections.lock().unwrap().len(), 1);
    assert!(!rt.controller().state().is_active());
}

#[test]
fn failures_are_reported_and_the_loop_keeps_ticking() {
    let backend = Arc::new(ScriptedClassifier::new(vec![ScriptedReply::Fail(
        "connection reset".to_string(),
    )]));
    let seen = Seen::default();
    let mut rt = runtime(backend.clone(), fast_settings(Duration::from_secs(30)), None)
        .with_observer(Recorder {
            seen: seen.clone(),
            confirm_with: None,
        });

    rt.start(source());
    let exit = rt.run(Some(Duration::from_millis(300))).unwrap();

    assert_eq!(exit, LoopExit::TimedOut);
    assert!(backend.calls() >= 2);
    let errors = seen.errors.lock().unwrap();
    assert!(errors.len() >= 2);
    assert!(errors[0].starts_with("Error analyzing image:"));
    assert!(errors[0].contains("connection reset"));
    let last = rt.controller().state().last_result().expect("fallback kept");
    assert!(last.object_type.is_unknown());
    assert_eq!(last.confidence, 0);
}

#[test]
fn stop_from_another_thread_ends_the_run() {
    let backend = Arc::new(
        ScriptedClassifier::new(vec![ScriptedReply::object("unknown", 10.0)])
            .with_delay(Duration::from_millis(5)),
    );
    let mut rt = runtime(backend, fast_settings(Duration::from_secs(30)), None);
    let handle = rt.handle();

    rt.start(source());
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        handle.stop().unwrap();
    });
    let exit = rt.run(Some(RUN_LIMIT)).unwrap();
    stopper.join().unwrap();

    assert_eq!(exit, LoopExit::Stopped);
    assert!(!rt.controller().state().is_active());
    assert!(!rt.controller().state().is_detecting());
}

#[test]
fn reset_clears_last_result() {
    let backend = Arc::new(ScriptedClassifier::new(vec![ScriptedReply::object(
        "pen", 30.0,
    )]));
    let mut rt = runtime(backend.clone(), fast_settings(Duration::from_secs(30)), None);
    let handle = rt.handle();

    rt.start(source());
    assert_eq!(rt.run(Some(Duration::from_millis(200))).unwrap(), LoopExit::TimedOut);
    assert!(rt.controller().state().last_result().is_some());

    rt.start(source());
    handle.reset().unwrap();
    assert_eq!(rt.run(Some(RUN_LIMIT)).unwrap(), LoopExit::Reset);
    assert!(rt.controller().state().last_result().is_none());
    assert!(!rt.controller().state().is_active());
}
