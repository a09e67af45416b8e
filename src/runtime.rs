//! Real-time driver for the detection loop.
//!
//! One control thread owns the [`DetectionLoop`]. Classification calls run on
//! short-lived worker threads and report back over a channel; commands from
//! other threads (Ctrl-C, UI buttons) arrive on the same channel through a
//! [`LoopHandle`]. Nothing but the control thread ever touches loop state.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::controller::{Confirmation, DetectionLoop, Dispatcher, LoopObserver, LoopSettings};
use crate::detect::{DetectionClient, DetectionOutcome, ObjectType, RequestTicket};
use crate::frame::{EncodedImage, FrameSource};
use crate::sampler::FrameSampler;
use crate::scheduler::TimerQueue;

/// Upper bound on one wait when no timer is armed.
const IDLE_POLL: Duration = Duration::from_millis(250);

pub enum LoopEvent {
    Completed {
        ticket: RequestTicket,
        outcome: DetectionOutcome,
    },
    Command(LoopCommand),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopCommand {
    Stop,
    Reset,
    Confirm(ObjectType),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopExit {
    Stopped,
    Reset,
    Confirmed(Confirmation),
    /// `run` hit its time limit; the loop was stopped.
    TimedOut,
}

/// Runs each classification on its own worker thread.
pub struct ThreadDispatcher {
    client: Arc<DetectionClient>,
    events: Sender<LoopEvent>,
}

impl ThreadDispatcher {
    pub fn new(client: Arc<DetectionClient>, events: Sender<LoopEvent>) -> Self {
        Self { client, events }
    }
}

impl Dispatcher for ThreadDispatcher {
    fn dispatch(&mut self, ticket: RequestTicket, image: EncodedImage) {
        let client = Arc::clone(&self.client);
        let events = self.events.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("detect-{}", ticket.generation()))
            .spawn(move || {
                let outcome = client.classify(&image);
                // Receiver is gone once the runtime is torn down.
                let _ = events.send(LoopEvent::Completed { ticket, outcome });
            });
        if let Err(e) = spawned {
            log::warn!("failed to spawn detection worker: {}", e);
            let outcome = DetectionOutcome::failed(format!("Error analyzing image: {}", e));
            let _ = self.events.send(LoopEvent::Completed { ticket, outcome });
        }
    }
}

/// Cloneable control handle for a running [`LoopRuntime`].
#[derive(Clone)]
pub struct LoopHandle {
    events: Sender<LoopEvent>,
}

impl LoopHandle {
    pub fn stop(&self) -> Result<()> {
        self.send(LoopCommand::Stop)
    }

    pub fn reset(&self) -> Result<()> {
        self.send(LoopCommand::Reset)
    }

    pub fn confirm(&self, object_type: ObjectType) -> Result<()> {
        self.send(LoopCommand::Confirm(object_type))
    }

    fn send(&self, command: LoopCommand) -> Result<()> {
        self.events
            .send(LoopEvent::Command(command))
            .map_err(|_| anyhow!("detection loop is no longer running"))
    }
}

pub struct LoopRuntime {
    controller: DetectionLoop<TimerQueue, ThreadDispatcher>,
    events: Receiver<LoopEvent>,
    sender: Sender<LoopEvent>,
    epoch: Instant,
}

impl LoopRuntime {
    pub fn new(
        settings: LoopSettings,
        sampler: FrameSampler,
        client: Arc<DetectionClient>,
    ) -> Self {
        let (sender, events) = mpsc::channel();
        let dispatcher = ThreadDispatcher::new(client, sender.clone());
        Self {
            controller: DetectionLoop::new(settings, sampler, TimerQueue::new(), dispatcher),
            events,
            sender,
            epoch: Instant::now(),
        }
    }

    pub fn with_observer(mut self, observer: impl LoopObserver + 'static) -> Self {
        self.controller.set_observer(observer);
        self
    }

    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            events: self.sender.clone(),
        }
    }

    pub fn controller(&self) -> &DetectionLoop<TimerQueue, ThreadDispatcher> {
        &self.controller
    }

    pub fn start(&mut self, source: Box<dyn FrameSource>) {
        self.sync_clock();
        self.controller.start(source);
    }

    /// Drive the loop until it is stopped, reset or confirmed, or until `limit`
    /// elapses.
    pub fn run(&mut self, limit: Option<Duration>) -> Result<LoopExit> {
        let deadline = limit.map(|limit| Instant::now() + limit);
        loop {
            self.sync_clock();
            if !self.controller.state().is_active() {
                return Ok(LoopExit::Stopped);
            }

            let now = self.epoch.elapsed();
            let mut wait = self
                .controller
                .scheduler()
                .next_deadline()
                .map(|due| due.saturating_sub(now))
                .unwrap_or(IDLE_POLL);
            if let Some(deadline) = deadline {
                wait = wait.min(deadline.saturating_duration_since(Instant::now()));
            }

            match self.events.recv_timeout(wait) {
                Ok(LoopEvent::Completed { ticket, outcome }) => {
                    self.sync_clock();
                    self.controller.on_completion(ticket, outcome);
                }
                Ok(LoopEvent::Command(command)) => {
                    self.sync_clock();
                    return Ok(self.apply(command));
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(anyhow!("detection event channel closed"));
                }
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                self.controller.stop();
                return Ok(LoopExit::TimedOut);
            }
        }
    }

    fn apply(&mut self, command: LoopCommand) -> LoopExit {
        match command {
            LoopCommand::Stop => {
                self.controller.stop();
                LoopExit::Stopped
            }
            LoopCommand::Reset => {
                self.controller.reset();
                LoopExit::Reset
            }
            LoopCommand::Confirm(object_type) => {
                LoopExit::Confirmed(self.controller.confirm(object_type))
            }
        }
    }

    fn sync_clock(&mut self) {
        let now = self.epoch.elapsed();
        self.controller.advance_to(now);
    }
}

impl Drop for LoopRuntime {
    fn drop(&mut self) {
        self.controller.stop();
    }
}
