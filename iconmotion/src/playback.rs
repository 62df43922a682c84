//! Temporal state of a single animation: sweeps progress forwards and backwards as the host
//! delivers frame ticks.
//!
//! Nothing here reads a clock. The host owns the per-frame ticker (see [`VsyncProvider`]) and
//! calls [`PlaybackController::tick`] once per rendered frame with the elapsed frame time.

use std::{cell::Cell, fmt::Debug, rc::Rc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    ease::{clamp, Curve},
    listeners::{Listeners, Subscription},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No playback exists, reported for controllers not attached to a surface
    Idle,
    Forward,
    Reverse,
    Completed,
    Dismissed,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlaybackState {
    pub progress: f64,
    pub phase: Phase,
}

impl PlaybackState {
    pub const INITIAL: Self = Self {
        progress: 0.0,
        phase: Phase::Dismissed,
    };

    pub const DETACHED: Self = Self {
        progress: 0.0,
        phase: Phase::Idle,
    };
}

/// Timing of a playback, durations are (de)serialized as integer milliseconds
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    #[serde(rename = "duration_ms", with = "millis")]
    pub duration: Duration,
    /// Zero makes reverse instantaneous
    #[serde(rename = "reverse_duration_ms", with = "millis")]
    pub reverse_duration: Duration,
    pub curve: Curve,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(250),
            reverse_duration: Duration::ZERO,
            curve: Curve::Linear,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The sweep reached its endpoint
    Completed,
    /// Stopped, reset, superseded or disposed before reaching its endpoint
    Cancelled,
}

/// One-shot token that resolves when a sweep settles.
///
/// Resolves exactly once; later attempts to resolve are ignored.
#[derive(Debug, Clone, Default)]
pub struct Completion(Rc<Cell<Option<Outcome>>>);

impl Completion {
    fn resolved(outcome: Outcome) -> Self {
        let completion = Self::default();
        completion.resolve(outcome);
        completion
    }

    fn resolve(&self, outcome: Outcome) {
        if self.0.get().is_none() {
            self.0.set(Some(outcome));
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.0.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome().is_some()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TickerId(pub u64);

/// The host's per-frame tick source, bound to the lifecycle of a presentation surface.
///
/// A ticker is requested when a controller is created and must be released when it is
/// disposed. Implementations use interior mutability; everything runs on the UI thread.
pub trait VsyncProvider {
    fn create_ticker(&self) -> TickerId;
    fn release_ticker(&self, ticker: TickerId);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug)]
struct Sweep {
    direction: Direction,
    from: f64,
    elapsed: Duration,
    completion: Completion,
    /// Return progress to 0 once a forward sweep completes
    reset_after: bool,
}

#[derive(Debug)]
enum PingPong {
    AwaitingForward(Completion),
    AwaitingReverse(Completion),
}

impl PingPong {
    fn completion(self) -> Completion {
        match self {
            PingPong::AwaitingForward(c) | PingPong::AwaitingReverse(c) => c,
        }
    }
}

pub struct PlaybackController {
    config: PlaybackConfig,
    state: PlaybackState,
    sweep: Option<Sweep>,
    ping_pong: Option<PingPong>,
    value_listeners: Listeners<f64>,
    phase_listeners: Listeners<Phase>,
    vsync: Rc<dyn VsyncProvider>,
    ticker: TickerId,
    disposed: bool,
}

impl Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("sweep", &self.sweep)
            .field("ticker", &self.ticker)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl PlaybackController {
    pub fn new(config: PlaybackConfig, vsync: Rc<dyn VsyncProvider>) -> Self {
        let ticker = vsync.create_ticker();
        debug!("Playback created with {ticker:?}, {config:?}");
        Self {
            config,
            state: PlaybackState::INITIAL,
            sweep: None,
            ping_pong: None,
            value_listeners: Default::default(),
            phase_listeners: Default::default(),
            vsync,
            ticker,
            disposed: false,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Progress bent by the configured curve
    pub fn value(&self) -> f64 {
        self.config
            .curve
            .transform(clamp(self.state.progress, 0.0, 1.0))
    }

    pub fn is_animating(&self) -> bool {
        self.sweep.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Called with progress on every change
    pub fn add_value_listener(&mut self, callback: impl FnMut(&f64) + 'static) -> Subscription {
        self.value_listeners.subscribe(callback)
    }

    /// Called whenever the phase changes
    pub fn add_phase_listener(&mut self, callback: impl FnMut(&Phase) + 'static) -> Subscription {
        self.phase_listeners.subscribe(callback)
    }

    pub fn remove_value_listener(&mut self, subscription: Subscription) -> bool {
        self.value_listeners.unsubscribe(subscription)
    }

    pub fn remove_phase_listener(&mut self, subscription: Subscription) -> bool {
        self.phase_listeners.unsubscribe(subscription)
    }

    fn check_live(&self, operation: &str) -> bool {
        debug_assert!(!self.disposed, "{operation} called after dispose");
        !self.disposed
    }

    /// Sweep to 1. If already sweeping forward the in-flight completion is returned.
    ///
    /// Once complete, progress returns to 0 so the next forward starts clean.
    pub fn forward(&mut self) -> Completion {
        if !self.check_live("forward") {
            return Completion::resolved(Outcome::Cancelled);
        }
        if let Some(sweep) = &self.sweep {
            if sweep.direction == Direction::Forward {
                return sweep.completion.clone();
            }
        }
        self.cancel();
        self.begin(Direction::Forward, true)
    }

    /// Sweep to 0 over the reverse duration
    pub fn reverse(&mut self) -> Completion {
        if !self.check_live("reverse") {
            return Completion::resolved(Outcome::Cancelled);
        }
        if let Some(sweep) = &self.sweep {
            if sweep.direction == Direction::Reverse {
                return sweep.completion.clone();
            }
        }
        self.cancel();
        self.begin(Direction::Reverse, false)
    }

    /// Forward, then reverse once forward completes, then reset. One completion for the lot.
    pub fn play_ping_pong(&mut self) -> Completion {
        if !self.check_live("play_ping_pong") {
            return Completion::resolved(Outcome::Cancelled);
        }
        self.cancel();
        let completion = Completion::default();
        self.ping_pong = Some(PingPong::AwaitingForward(completion.clone()));
        self.begin(Direction::Forward, false);
        completion
    }

    /// Halt where we are; progress and phase are kept
    pub fn stop(&mut self) {
        if !self.check_live("stop") {
            return;
        }
        if self.sweep.is_some() {
            debug!("Stop at {:.3}", self.state.progress);
        }
        self.cancel();
    }

    /// Back to the initial state, cancelling anything in flight
    pub fn reset(&mut self) {
        if !self.check_live("reset") {
            return;
        }
        self.cancel();
        self.set_progress(0.0);
        self.set_phase(Phase::Dismissed);
    }

    /// Advance the active sweep by one frame.
    ///
    /// Returns the phase the playback settled in if a sweep finished during this tick.
    pub fn tick(&mut self, elapsed: Duration) -> Option<Phase> {
        if !self.check_live("tick") {
            return None;
        }
        self.advance(elapsed)
    }

    /// Release listeners and the ticker. Must be called exactly once.
    pub fn dispose(&mut self) {
        if !self.check_live("dispose") {
            return;
        }
        self.cancel();
        self.value_listeners.clear();
        self.phase_listeners.clear();
        self.vsync.release_ticker(self.ticker);
        self.disposed = true;
        debug!("Playback disposed, released {:?}", self.ticker);
    }

    fn cancel(&mut self) {
        if let Some(sweep) = self.sweep.take() {
            sweep.completion.resolve(Outcome::Cancelled);
        }
        if let Some(ping_pong) = self.ping_pong.take() {
            ping_pong.completion().resolve(Outcome::Cancelled);
        }
    }

    /// Restart forward from 0 for an owner that loops.
    ///
    /// Unlike [`Self::forward`] the sweep is left in flight until the next tick, even at zero
    /// duration, so a loop never reads as settled between ticks.
    pub(crate) fn restart_forward(&mut self) -> Completion {
        if !self.check_live("restart_forward") {
            return Completion::resolved(Outcome::Cancelled);
        }
        self.cancel();
        self.set_progress(0.0);
        self.start(Direction::Forward, true)
    }

    fn begin(&mut self, direction: Direction, reset_after: bool) -> Completion {
        let completion = self.start(direction, reset_after);
        // zero duration or already at the endpoint settles right away
        self.advance(Duration::ZERO);
        completion
    }

    fn start(&mut self, direction: Direction, reset_after: bool) -> Completion {
        debug_assert!(self.sweep.is_none(), "start with a sweep in flight");
        let completion = Completion::default();
        self.sweep = Some(Sweep {
            direction,
            from: self.state.progress,
            elapsed: Duration::ZERO,
            completion: completion.clone(),
            reset_after,
        });
        self.set_phase(match direction {
            Direction::Forward => Phase::Forward,
            Direction::Reverse => Phase::Reverse,
        });
        completion
    }

    fn advance(&mut self, elapsed: Duration) -> Option<Phase> {
        let (progress, done) = {
            let sweep = self.sweep.as_mut()?;
            sweep.elapsed += elapsed;
            let (duration, target, sign) = match sweep.direction {
                Direction::Forward => (self.config.duration, 1.0, 1.0),
                Direction::Reverse => (self.config.reverse_duration, 0.0, -1.0),
            };
            let progress = if duration.is_zero() {
                target
            } else {
                sweep.from + sign * sweep.elapsed.as_secs_f64() / duration.as_secs_f64()
            };
            let progress = clamp(progress, 0.0, 1.0);
            (progress, progress == target)
        };
        trace!("tick {:?} progress {progress:.4}", elapsed);
        self.set_progress(progress);
        if done {
            Some(self.finish_sweep())
        } else {
            None
        }
    }

    fn finish_sweep(&mut self) -> Phase {
        let Some(sweep) = self.sweep.take() else {
            return self.state.phase;
        };
        match sweep.direction {
            Direction::Forward => {
                self.set_phase(Phase::Completed);
                sweep.completion.resolve(Outcome::Completed);
                match self.ping_pong.take() {
                    Some(PingPong::AwaitingForward(chain)) => {
                        self.ping_pong = Some(PingPong::AwaitingReverse(chain));
                        self.begin(Direction::Reverse, false);
                    }
                    other => {
                        self.ping_pong = other;
                        if sweep.reset_after {
                            self.set_progress(0.0);
                        }
                    }
                }
            }
            Direction::Reverse => {
                self.set_phase(Phase::Dismissed);
                sweep.completion.resolve(Outcome::Completed);
                if let Some(PingPong::AwaitingReverse(chain)) = self.ping_pong.take() {
                    self.set_progress(0.0);
                    chain.resolve(Outcome::Completed);
                }
            }
        }
        self.state.phase
    }

    fn set_progress(&mut self, progress: f64) {
        if self.state.progress == progress && self.sweep.is_none() {
            return;
        }
        self.state.progress = progress;
        self.value_listeners.notify(&progress);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.state.phase == phase {
            return;
        }
        debug!("{:?} => {phase:?}", self.state.phase);
        self.state.phase = phase;
        self.phase_listeners.notify(&phase);
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if !self.disposed {
            warn!(
                "PlaybackController dropped without dispose, {:?} leaked",
                self.ticker
            );
        }
    }
}
