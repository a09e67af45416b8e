//! Continuous detection loop.
//!
//! State machine over four phases:
//!
//! - `Idle`: nothing scheduled.
//! - `Waiting`: tick armed, no request in flight.
//! - `Detecting`: a classification request is in flight.
//! - `Paused`: cooldown after a confident hit; ticks suspended.
//!
//! The controller never blocks. Timers go through a [`Scheduler`], requests
//! through a [`Dispatcher`], and completions come back via
//! [`DetectionLoop::on_completion`] tagged with the ticket they were issued
//! under. A completion whose ticket is no longer current is dropped before it
//! can touch [`LoopState`].

use std::time::Duration;

use crate::detect::{
    ClassificationResult, DetectionOutcome, ObjectType, RequestGate, RequestTicket,
};
use crate::frame::{EncodedImage, FrameSource};
use crate::sampler::FrameSampler;
use crate::scheduler::{Scheduler, TimerHandle, TimerKind, TimerQueue};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(3_000);
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(30_000);
pub const DEFAULT_MIN_CONFIDENCE: u8 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopSettings {
    pub tick_interval: Duration,
    pub cooldown: Duration,
    /// Hits below this confidence never pause the loop.
    pub min_confidence: u8,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            cooldown: DEFAULT_COOLDOWN,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    Waiting,
    Detecting,
    Paused,
}

/// Loop state as seen by presentation layers. Read-only outside this module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoopState {
    is_active: bool,
    is_detecting: bool,
    is_paused: bool,
    last_result: Option<ClassificationResult>,
    /// Event-store id of `last_result`, if it was logged.
    last_event_id: Option<i64>,
    pending_request: Option<RequestTicket>,
}

impl LoopState {
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_detecting(&self) -> bool {
        self.is_detecting
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn last_result(&self) -> Option<&ClassificationResult> {
        self.last_result.as_ref()
    }

    pub fn last_event_id(&self) -> Option<i64> {
        self.last_event_id
    }

    pub fn pending_request(&self) -> Option<RequestTicket> {
        self.pending_request
    }

    pub fn phase(&self) -> LoopPhase {
        if !self.is_active {
            LoopPhase::Idle
        } else if self.is_paused {
            LoopPhase::Paused
        } else if self.is_detecting {
            LoopPhase::Detecting
        } else {
            LoopPhase::Waiting
        }
    }
}

/// Issues classification requests on behalf of the loop.
///
/// Implementations must eventually hand the outcome back to
/// [`DetectionLoop::on_completion`] with the same ticket, or drop it.
pub trait Dispatcher {
    fn dispatch(&mut self, ticket: RequestTicket, image: EncodedImage);
}

/// Callbacks for the presentation layer.
pub trait LoopObserver: Send {
    /// A confident hit paused the loop.
    fn on_detection(&mut self, _result: &ClassificationResult) {}

    /// A tick's classification call failed. The loop keeps going.
    fn on_error(&mut self, _diagnostic: &str) {}
}

pub struct NoopObserver;

impl LoopObserver for NoopObserver {}

/// Returned by [`DetectionLoop::confirm`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub object_type: ObjectType,
    pub last_result: Option<ClassificationResult>,
    /// Event logged for `last_result`, if any.
    pub event_id: Option<i64>,
}

pub struct DetectionLoop<S: Scheduler, D: Dispatcher> {
    settings: LoopSettings,
    sampler: FrameSampler,
    scheduler: S,
    dispatcher: D,
    observer: Box<dyn LoopObserver>,
    source: Option<Box<dyn FrameSource>>,
    gate: RequestGate,
    state: LoopState,
    tick_timer: Option<TimerHandle>,
    cooldown_timer: Option<TimerHandle>,
    ticks: u64,
}

impl<S: Scheduler, D: Dispatcher> DetectionLoop<S, D> {
    pub fn new(settings: LoopSettings, sampler: FrameSampler, scheduler: S, dispatcher: D) -> Self {
        Self {
            settings,
            sampler,
            scheduler,
            dispatcher,
            observer: Box::new(NoopObserver),
            source: None,
            gate: RequestGate::new(),
            state: LoopState::default(),
            tick_timer: None,
            cooldown_timer: None,
            ticks: 0,
        }
    }

    pub fn with_observer(mut self, observer: impl LoopObserver + 'static) -> Self {
        self.set_observer(observer);
        self
    }

    pub fn set_observer(&mut self, observer: impl LoopObserver + 'static) {
        self.observer = Box::new(observer);
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn phase(&self) -> LoopPhase {
        self.state.phase()
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// Ticks handled since construction, including skipped ones.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    /// Enter detection mode with `source`. From `Paused` this ends the cooldown
    /// early; while already running it only swaps the source.
    pub fn start(&mut self, source: Box<dyn FrameSource>) {
        log::info!("detection loop source: {}", source.describe());
        self.source = Some(source);
        match self.phase() {
            LoopPhase::Waiting | LoopPhase::Detecting => return,
            LoopPhase::Paused => self.cancel_cooldown(),
            LoopPhase::Idle => {}
        }
        self.state.is_active = true;
        self.state.is_paused = false;
        self.arm_tick();
        log::info!(
            "detection loop started (interval={}ms, min_confidence={})",
            self.settings.tick_interval.as_millis(),
            self.settings.min_confidence
        );
    }

    /// Leave detection mode. Timers and any in-flight request are cancelled;
    /// the last result stays visible.
    pub fn stop(&mut self) {
        self.cancel_tick();
        self.cancel_cooldown();
        if let Some(ticket) = self.gate.cancel() {
            log::debug!("cancelled in-flight request #{}", ticket.generation());
        }
        let was_active = self.state.is_active;
        self.state.is_active = false;
        self.state.is_detecting = false;
        self.state.is_paused = false;
        self.state.pending_request = None;
        self.source = None;
        if was_active {
            log::info!("detection loop stopped after {} ticks", self.ticks);
        }
    }

    /// `stop()` and forget the last result.
    pub fn reset(&mut self) {
        self.stop();
        self.state.last_result = None;
        self.state.last_event_id = None;
    }

    /// The user accepted a detection: tear the loop down and hand back what it saw.
    pub fn confirm(&mut self, object_type: ObjectType) -> Confirmation {
        self.stop();
        let last_result = self.state.last_result.take();
        let event_id = self.state.last_event_id.take();
        self.state = LoopState::default();
        log::info!("detection confirmed: {}", object_type);
        Confirmation {
            object_type,
            last_result,
            event_id,
        }
    }

    /// Deliver a fired timer. Handles that are no longer armed are ignored.
    pub fn on_timer(&mut self, handle: TimerHandle, kind: TimerKind) {
        match kind {
            TimerKind::Tick => {
                if self.tick_timer != Some(handle) {
                    return;
                }
                self.tick_timer = None;
                self.tick();
            }
            TimerKind::Cooldown => {
                if self.cooldown_timer != Some(handle) {
                    return;
                }
                self.cooldown_timer = None;
                self.resume_after_cooldown();
            }
        }
    }

    /// Deliver a finished request. Returns false if the result was stale and dropped.
    pub fn on_completion(&mut self, ticket: RequestTicket, outcome: DetectionOutcome) -> bool {
        if !self.gate.settle(ticket) {
            log::debug!("dropping stale result for request #{}", ticket.generation());
            return false;
        }
        self.state.is_detecting = false;
        self.state.pending_request = None;

        let DetectionOutcome {
            result,
            error,
            event_id,
        } = outcome;
        if let Some(diagnostic) = &error {
            log::debug!("tick request #{} failed: {}", ticket.generation(), diagnostic);
            self.observer.on_error(diagnostic);
        }

        let confident = self.state.is_active
            && !self.state.is_paused
            && result.is_confident(self.settings.min_confidence);
        self.state.last_result = Some(result);
        self.state.last_event_id = event_id;

        if confident {
            self.pause();
            if let Some(result) = &self.state.last_result {
                log::info!(
                    "confident detection: {} ({}%), pausing for {}ms",
                    result.object_type,
                    result.confidence,
                    self.settings.cooldown.as_millis()
                );
                self.observer.on_detection(result);
            }
        }
        true
    }

    fn tick(&mut self) {
        if !self.state.is_active || self.state.is_paused {
            return;
        }
        self.ticks += 1;
        self.arm_tick();
        if let Some(pending) = self.state.pending_request {
            log::debug!(
                "tick {}: request #{} still in flight, skipping",
                self.ticks,
                pending.generation()
            );
            return;
        }

        let frame = self.source.as_mut().and_then(|source| source.current_frame());
        let Some(image) = frame.and_then(|frame| self.sampler.sample(&frame)) else {
            log::debug!("tick {}: no frame available, skipping", self.ticks);
            return;
        };

        let (ticket, superseded) = self.gate.issue();
        if let Some(old) = superseded {
            log::debug!(
                "request #{} superseded by #{}",
                old.generation(),
                ticket.generation()
            );
        }
        self.state.is_detecting = true;
        self.state.pending_request = Some(ticket);
        self.dispatcher.dispatch(ticket, image);
    }

    fn pause(&mut self) {
        self.cancel_tick();
        self.cancel_cooldown();
        self.state.is_paused = true;
        self.cooldown_timer = Some(
            self.scheduler
                .schedule_once(self.settings.cooldown, TimerKind::Cooldown),
        );
    }

    fn resume_after_cooldown(&mut self) {
        if !self.state.is_active || !self.state.is_paused {
            return;
        }
        self.state.is_paused = false;
        self.arm_tick();
        log::info!("cooldown elapsed, detection resumed");
    }

    fn arm_tick(&mut self) {
        self.cancel_tick();
        self.tick_timer = Some(
            self.scheduler
                .schedule_once(self.settings.tick_interval, TimerKind::Tick),
        );
    }

    fn cancel_tick(&mut self) {
        if let Some(handle) = self.tick_timer.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn cancel_cooldown(&mut self) {
        if let Some(handle) = self.cooldown_timer.take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl<D: Dispatcher> DetectionLoop<TimerQueue, D> {
    /// Fire every timer due up to `now`, in deadline order. Returns how many fired.
    pub fn advance_to(&mut self, now: Duration) -> usize {
        let mut fired = 0;
        while let Some((handle, kind)) = self.scheduler.pop_due(now) {
            self.on_timer(handle, kind);
            fired += 1;
        }
        self.scheduler.set_now(now);
        fired
    }

    /// Advance the virtual clock by `step`.
    pub fn advance_by(&mut self, step: Duration) -> usize {
        let now = self.scheduler.now() + step;
        self.advance_to(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::VideoFrame;
    use std::sync::{Arc, Mutex};

    const INTERVAL: Duration = DEFAULT_TICK_INTERVAL;
    const COOLDOWN: Duration = DEFAULT_COOLDOWN;

    /// Holds dispatched requests until the test resolves them.
    #[derive(Default)]
    struct ManualDispatcher {
        issued: Vec<RequestTicket>,
    }

    impl Dispatcher for ManualDispatcher {
        fn dispatch(&mut self, ticket: RequestTicket, _image: EncodedImage) {
            self.issued.push(ticket);
        }
    }

    struct SolidSource;

    impl FrameSource for SolidSource {
        fn describe(&self) -> String {
            "solid test frames".to_string()
        }

        fn current_frame(&mut self) -> Option<VideoFrame> {
            Some(VideoFrame::from_rgb(vec![90; 8 * 6 * 3], 8, 6))
        }
    }

    struct DarkSource;

    impl FrameSource for DarkSource {
        fn describe(&self) -> String {
            "camera without frames".to_string()
        }

        fn current_frame(&mut self) -> Option<VideoFrame> {
            None
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        detections: Arc<Mutex<Vec<ClassificationResult>>>,
        errors: Arc<Mutex<Vec<String>>>,
    }

    impl LoopObserver for Recorder {
        fn on_detection(&mut self, result: &ClassificationResult) {
            self.detections.lock().unwrap().push(result.clone());
        }

        fn on_error(&mut self, diagnostic: &str) {
            self.errors.lock().unwrap().push(diagnostic.to_string());
        }
    }

    type TestLoop = DetectionLoop<TimerQueue, ManualDispatcher>;

    fn new_loop() -> (TestLoop, Recorder) {
        let recorder = Recorder::default();
        let controller = DetectionLoop::new(
            LoopSettings::default(),
            FrameSampler::default(),
            TimerQueue::new(),
            ManualDispatcher::default(),
        )
        .with_observer(recorder.clone());
        (controller, recorder)
    }

    fn hit(object_type: &str, confidence: u8) -> DetectionOutcome {
        DetectionOutcome::classified(ClassificationResult {
            object_type: ObjectType::new(object_type),
            confidence,
            explanation: format!("{} in view", object_type),
            other_objects: Vec::new(),
        })
    }

    fn last_ticket(controller: &TestLoop) -> RequestTicket {
        *controller.dispatcher().issued.last().expect("a request was dispatched")
    }

    #[test]
    fn start_arms_tick_and_first_tick_dispatches() {
        let (mut controller, _) = new_loop();
        assert_eq!(controller.phase(), LoopPhase::Idle);
        controller.start(Box::new(SolidSource));
        assert_eq!(controller.phase(), LoopPhase::Waiting);
        assert!(controller.scheduler().is_armed(TimerKind::Tick));

        assert_eq!(controller.advance_by(INTERVAL - Duration::from_millis(1)), 0);
        assert!(controller.dispatcher().issued.is_empty());

        controller.advance_by(Duration::from_millis(1));
        assert_eq!(controller.phase(), LoopPhase::Detecting);
        assert_eq!(controller.dispatcher().issued.len(), 1);
        assert_eq!(controller.state().pending_request(), Some(last_ticket(&controller)));
    }

    #[test]
    fn confident_hit_pauses_until_cooldown_elapses() {
        let (mut controller, recorder) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let ticket = last_ticket(&controller);

        assert!(controller.on_completion(ticket, hit("syringe", 75)));
        assert_eq!(controller.phase(), LoopPhase::Paused);
        assert!(controller.state().is_paused());
        assert!(!controller.scheduler().is_armed(TimerKind::Tick));
        assert!(controller.scheduler().is_armed(TimerKind::Cooldown));
        assert_eq!(recorder.detections.lock().unwrap().len(), 1);

        // No ticks for the whole cooldown window.
        controller.advance_by(COOLDOWN - Duration::from_millis(1));
        assert_eq!(controller.dispatcher().issued.len(), 1);
        assert_eq!(controller.phase(), LoopPhase::Paused);

        controller.advance_by(Duration::from_millis(1));
        assert_eq!(controller.phase(), LoopPhase::Waiting);
        controller.advance_by(INTERVAL);
        assert_eq!(controller.dispatcher().issued.len(), 2);
    }

    #[test]
    fn low_confidence_hit_keeps_ticking() {
        let (mut controller, recorder) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let ticket = last_ticket(&controller);

        controller.on_completion(ticket, hit("dog-poop", 40));
        assert_eq!(controller.phase(), LoopPhase::Waiting);
        assert_eq!(
            controller.state().last_result().map(|r| r.confidence),
            Some(40)
        );
        assert!(recorder.detections.lock().unwrap().is_empty());

        controller.advance_by(INTERVAL);
        assert_eq!(controller.dispatcher().issued.len(), 2);
    }

    #[test]
    fn confident_unknown_does_not_pause() {
        let (mut controller, _) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let ticket = last_ticket(&controller);
        controller.on_completion(ticket, hit("unknown", 95));
        assert_eq!(controller.phase(), LoopPhase::Waiting);
    }

    #[test]
    fn threshold_is_inclusive() {
        let (mut controller, _) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let ticket = last_ticket(&controller);
        controller.on_completion(ticket, hit("pen", DEFAULT_MIN_CONFIDENCE));
        assert_eq!(controller.phase(), LoopPhase::Paused);
    }

    #[test]
    fn tick_during_slow_request_does_not_dispatch() {
        let (mut controller, _) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let slow = last_ticket(&controller);

        // Classifier slower than the interval: ticks keep firing, nothing new goes out.
        controller.advance_by(INTERVAL * 3);
        assert_eq!(controller.dispatcher().issued.len(), 1);
        assert_eq!(controller.ticks(), 4);
        assert_eq!(controller.state().pending_request(), Some(slow));
        assert!(controller.scheduler().is_armed(TimerKind::Tick));

        assert!(controller.on_completion(slow, hit("syringe", 95)));
        assert_eq!(controller.phase(), LoopPhase::Paused);
        assert_eq!(
            controller.state().last_result().map(|r| r.object_type.as_str()),
            Some("syringe")
        );
    }

    #[test]
    fn superseded_result_never_overwrites_last_result() {
        let (mut controller, _) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let slow = last_ticket(&controller);

        // Close and reopen while the first request is still out.
        controller.stop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let fast = last_ticket(&controller);
        assert_ne!(slow, fast);

        assert!(controller.on_completion(fast, hit("graffiti", 30)));
        assert!(!controller.on_completion(slow, hit("syringe", 99)));

        let last = controller.state().last_result().expect("stored result");
        assert_eq!(last.object_type.as_str(), "graffiti");
        assert_eq!(controller.phase(), LoopPhase::Waiting);
    }

    #[test]
    fn stop_mid_request_discards_result_and_clears_timers() {
        let (mut controller, recorder) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let first = last_ticket(&controller);
        controller.on_completion(first, hit("water-bottle", 20));

        controller.advance_by(INTERVAL);
        let in_flight = last_ticket(&controller);
        controller.stop();
        assert_eq!(controller.phase(), LoopPhase::Idle);
        assert_eq!(controller.scheduler().pending(), 0);
        assert!(controller.state().pending_request().is_none());

        assert!(!controller.on_completion(in_flight, hit("syringe", 90)));
        let last = controller.state().last_result().expect("kept result");
        assert_eq!(last.object_type.as_str(), "water-bottle");
        assert!(recorder.detections.lock().unwrap().is_empty());

        controller.advance_by(INTERVAL * 20);
        assert_eq!(controller.dispatcher().issued.len(), 2);
    }

    #[test]
    fn stop_during_cooldown_prevents_resume() {
        let (mut controller, _) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let ticket = last_ticket(&controller);
        controller.on_completion(ticket, hit("syringe", 80));
        controller.stop();

        controller.advance_by(COOLDOWN * 2);
        assert_eq!(controller.phase(), LoopPhase::Idle);
        assert_eq!(controller.dispatcher().issued.len(), 1);
        assert!(controller.state().last_result().is_some());
    }

    #[test]
    fn reset_clears_flags_and_result() {
        let (mut controller, _) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let ticket = last_ticket(&controller);
        controller.on_completion(ticket, hit("pen", 70));
        controller.reset();
        assert_eq!(controller.state(), &LoopState::default());
        assert_eq!(controller.scheduler().pending(), 0);
    }

    #[test]
    fn restart_from_pause_skips_remaining_cooldown() {
        let (mut controller, _) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let ticket = last_ticket(&controller);
        controller.on_completion(ticket, hit("graffiti", 88));
        assert_eq!(controller.phase(), LoopPhase::Paused);

        controller.start(Box::new(SolidSource));
        assert_eq!(controller.phase(), LoopPhase::Waiting);
        assert!(!controller.scheduler().is_armed(TimerKind::Cooldown));
        controller.advance_by(INTERVAL);
        assert_eq!(controller.dispatcher().issued.len(), 2);
    }

    #[test]
    fn start_while_active_keeps_single_tick() {
        let (mut controller, _) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.start(Box::new(SolidSource));
        assert_eq!(controller.scheduler().pending(), 1);
    }

    #[test]
    fn capture_failure_skips_tick_without_request() {
        let (mut controller, _) = new_loop();
        controller.start(Box::new(DarkSource));
        controller.advance_by(INTERVAL * 3);
        assert!(controller.dispatcher().issued.is_empty());
        assert_eq!(controller.ticks(), 3);
        assert_eq!(controller.phase(), LoopPhase::Waiting);
    }

    #[test]
    fn failed_call_reports_error_and_keeps_looping() {
        let (mut controller, recorder) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let ticket = last_ticket(&controller);
        controller.on_completion(ticket, DetectionOutcome::failed("Error analyzing image: 429"));

        assert_eq!(recorder.errors.lock().unwrap().len(), 1);
        assert_eq!(controller.phase(), LoopPhase::Waiting);
        let last = controller.state().last_result().unwrap();
        assert!(last.object_type.is_unknown());
        assert_eq!(last.confidence, 0);

        controller.advance_by(INTERVAL);
        assert_eq!(controller.dispatcher().issued.len(), 2);
    }

    #[test]
    fn confirm_tears_down_and_returns_last_result() {
        let (mut controller, _) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let ticket = last_ticket(&controller);
        controller.on_completion(ticket, hit("syringe", 75));

        let confirmation = controller.confirm(ObjectType::new("syringe"));
        assert_eq!(confirmation.object_type.as_str(), "syringe");
        assert_eq!(confirmation.last_result.map(|r| r.confidence), Some(75));
        assert_eq!(confirmation.event_id, None);
        assert_eq!(controller.state(), &LoopState::default());
        assert_eq!(controller.scheduler().pending(), 0);
    }

    #[test]
    fn confirm_carries_event_id_of_last_result() {
        let (mut controller, _) = new_loop();
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let ticket = last_ticket(&controller);
        let outcome = DetectionOutcome {
            event_id: Some(42),
            ..hit("graffiti", 82)
        };
        controller.on_completion(ticket, outcome);
        assert_eq!(controller.state().last_event_id(), Some(42));

        let confirmation = controller.confirm(ObjectType::new("graffiti"));
        assert_eq!(confirmation.event_id, Some(42));
        assert_eq!(controller.state().last_event_id(), None);
    }

    #[test]
    fn custom_threshold_is_respected() {
        let settings = LoopSettings {
            min_confidence: 90,
            ..LoopSettings::default()
        };
        let mut controller = DetectionLoop::new(
            settings,
            FrameSampler::default(),
            TimerQueue::new(),
            ManualDispatcher::default(),
        );
        controller.start(Box::new(SolidSource));
        controller.advance_by(INTERVAL);
        let ticket = last_ticket(&controller);
        controller.on_completion(ticket, hit("syringe", 75));
        assert_eq!(controller.phase(), LoopPhase::Waiting);
    }
}
