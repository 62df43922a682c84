//! Drives one icon: which animation is active, whether it repeats, and which icon is showing.
//!
//! The controller owns its [`PlaybackController`] from [`IconController::attach`] until
//! [`IconController::dispose`]. While detached every operation is ignored.

use std::{fmt::Debug, rc::Rc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    adaptive::AdaptiveIcon,
    catalog::AnimationKind,
    color::Color,
    error::ControllerError,
    listeners::{Listeners, Subscription},
    playback::{Phase, PlaybackConfig, PlaybackController, PlaybackState, VsyncProvider},
    transition::TransitionConfig,
};

/// Everything about timing and swaps a controller is created with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub playback: PlaybackConfig,
    pub transition: TransitionConfig,
}

/// One call's worth of instructions, consumed by [`IconController::request`]
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    pub kind: AnimationKind,
    pub repeat: bool,
    pub transition_target: Option<AdaptiveIcon>,
    pub transition_color: Option<Color>,
}

impl PlaybackRequest {
    pub fn play(kind: AnimationKind) -> Self {
        Self {
            kind,
            repeat: false,
            transition_target: None,
            transition_color: None,
        }
    }

    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn then_switch_to(mut self, icon: AdaptiveIcon, color: Option<Color>) -> Self {
        self.transition_target = Some(icon);
        self.transition_color = color;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IconControllerState {
    pub active_animation: Option<AnimationKind>,
    pub repeating: bool,
    pub current_icon: AdaptiveIcon,
    pub current_color: Option<Color>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControllerStatus {
    Idle,
    Playing,
    PlayingRepeating,
}

type TransitionCallback = Box<dyn FnMut(&AdaptiveIcon, Option<Color>)>;

pub struct IconController {
    config: AnimationConfig,
    playback: Option<PlaybackController>,
    state: IconControllerState,
    /// What was showing before the last swap, drawn as the outgoing layer of the transition
    previous: Option<(AdaptiveIcon, Option<Color>)>,
    animation_listeners: Listeners<Option<AnimationKind>>,
    on_icon_transition: Option<TransitionCallback>,
    disposed: bool,
}

impl Debug for IconController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconController")
            .field("config", &self.config)
            .field("playback", &self.playback)
            .field("state", &self.state)
            .field("previous", &self.previous)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl IconController {
    pub fn new(icon: AdaptiveIcon, config: AnimationConfig) -> Self {
        Self {
            config,
            playback: None,
            state: IconControllerState {
                active_animation: None,
                repeating: false,
                current_icon: icon,
                current_color: None,
            },
            previous: None,
            animation_listeners: Default::default(),
            on_icon_transition: None,
            disposed: false,
        }
    }

    /// Bind to a presentation surface, acquiring a ticker from `vsync`
    pub fn attach(&mut self, vsync: Rc<dyn VsyncProvider>) -> Result<(), ControllerError> {
        if self.disposed {
            debug!("attach ignored, controller is disposed");
            return Ok(());
        }
        if self.playback.is_some() {
            return Err(ControllerError::AlreadyAttached);
        }
        self.playback = Some(PlaybackController::new(self.config.playback, vsync));
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.playback.is_some()
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn state(&self) -> &IconControllerState {
        &self.state
    }

    pub fn current_animation(&self) -> Option<AnimationKind> {
        self.state.active_animation
    }

    pub fn current_icon(&self) -> &AdaptiveIcon {
        &self.state.current_icon
    }

    pub fn current_color(&self) -> Option<Color> {
        self.state.current_color
    }

    pub fn previous_icon(&self) -> Option<(&AdaptiveIcon, Option<Color>)> {
        self.previous.as_ref().map(|(icon, color)| (icon, *color))
    }

    /// Read-only view for presentation
    pub fn playback(&self) -> Option<&PlaybackController> {
        self.playback.as_ref()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback
            .as_ref()
            .map(PlaybackController::state)
            .unwrap_or(PlaybackState::DETACHED)
    }

    /// Curved progress, 0 while detached
    pub fn value(&self) -> f64 {
        self.playback
            .as_ref()
            .map(PlaybackController::value)
            .unwrap_or_default()
    }

    pub fn status(&self) -> ControllerStatus {
        match &self.playback {
            Some(playback) if playback.is_animating() => {
                if self.state.repeating {
                    ControllerStatus::PlayingRepeating
                } else {
                    ControllerStatus::Playing
                }
            }
            _ => ControllerStatus::Idle,
        }
    }

    /// Called with the new active animation whenever a play request is accepted
    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&Option<AnimationKind>) + 'static,
    ) -> Subscription {
        self.animation_listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.animation_listeners.unsubscribe(subscription)
    }

    /// Called with the new icon and color when a non-repeating transition swaps icons
    pub fn on_icon_transition(
        &mut self,
        callback: impl FnMut(&AdaptiveIcon, Option<Color>) + 'static,
    ) {
        self.on_icon_transition = Some(Box::new(callback));
    }

    pub fn play(&mut self, kind: AnimationKind, repeat: bool) {
        let Some(playback) = self.playback.as_mut() else {
            debug!("play {kind} ignored, controller is detached");
            return;
        };
        debug!("play {kind} repeat {repeat}");
        self.state.active_animation = Some(kind);
        self.state.repeating = repeat;
        self.previous = None;
        // observers hear about it before playback time starts so they can render frame zero
        self.animation_listeners.notify(&self.state.active_animation);
        playback.reset();
        if repeat {
            playback.restart_forward();
        } else {
            playback.forward();
        }
    }

    /// Play `kind` and, unless repeating, switch to `to` right away
    pub fn play_with_icon_transition(
        &mut self,
        kind: AnimationKind,
        to: AdaptiveIcon,
        color: Option<Color>,
        repeat: bool,
    ) {
        if self.playback.is_none() {
            debug!("transition to {} ignored, controller is detached", to.name);
            return;
        }
        self.play(kind, repeat);
        if repeat {
            debug!("repeating request, {} is never swapped in", to.name);
            return;
        }
        let outgoing = std::mem::replace(&mut self.state.current_icon, to);
        let outgoing_color = std::mem::replace(&mut self.state.current_color, color);
        debug!("swap {} => {}", outgoing.name, self.state.current_icon.name);
        self.previous = Some((outgoing, outgoing_color));
        if let Some(callback) = self.on_icon_transition.as_mut() {
            callback(&self.state.current_icon, color);
        }
    }

    pub fn request(&mut self, request: PlaybackRequest) {
        match request.transition_target {
            Some(to) => self.play_with_icon_transition(
                request.kind,
                to,
                request.transition_color,
                request.repeat,
            ),
            None => self.play(request.kind, request.repeat),
        }
    }

    /// Halt in place. The active animation and progress are kept.
    pub fn stop(&mut self) {
        let Some(playback) = self.playback.as_mut() else {
            debug!("stop ignored, controller is detached");
            return;
        };
        playback.stop();
        self.state.repeating = false;
    }

    /// Advance by one host frame
    pub fn tick(&mut self, elapsed: Duration) {
        let Some(playback) = self.playback.as_mut() else {
            return;
        };
        if playback.tick(elapsed) == Some(Phase::Completed) && self.state.repeating {
            debug!("restart {:?}", self.state.active_animation);
            playback.restart_forward();
        }
    }

    /// Dispose playback and detach. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            playback.dispose();
        }
        if !self.disposed {
            debug!("dispose {}", self.state.current_icon.name);
        }
        self.animation_listeners.clear();
        self.on_icon_transition = None;
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc, time::Duration};

    use crate::{
        adaptive::AdaptiveIcon,
        catalog::AnimationKind,
        color::Color,
        error::ControllerError,
        playback::{
            tests::{FakeVsync, FRAME},
            Phase, PlaybackConfig, PlaybackState,
        },
    };

    use super::{AnimationConfig, ControllerStatus, IconController, PlaybackRequest};

    fn attached() -> (IconController, Rc<FakeVsync>) {
        let vsync = Rc::new(FakeVsync::default());
        let mut controller =
            IconController::new(AdaptiveIcon::named("favorite"), AnimationConfig::default());
        controller.attach(vsync.clone()).unwrap();
        (controller, vsync)
    }

    fn ticks(controller: &mut IconController, n: usize) {
        for _ in 0..n {
            controller.tick(FRAME);
        }
    }

    /// Record swaps delivered to the transition callback
    fn swap_log(controller: &mut IconController) -> Rc<RefCell<Vec<(String, Option<Color>)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        controller.on_icon_transition(move |icon, color| {
            sink.borrow_mut().push((icon.name.clone(), color))
        });
        log
    }

    #[test]
    fn pop_plays_once() {
        let (mut controller, _) = attached();
        let swaps = swap_log(&mut controller);
        controller.play(AnimationKind::Pop, false);
        assert_eq!(Some(AnimationKind::Pop), controller.current_animation());
        assert_eq!(ControllerStatus::Playing, controller.status());

        ticks(&mut controller, 20);
        assert_eq!(
            PlaybackState {
                progress: 0.0,
                phase: Phase::Completed
            },
            controller.playback_state()
        );
        assert_eq!(ControllerStatus::Idle, controller.status());
        assert!(swaps.borrow().is_empty());
        controller.dispose();
    }

    #[test]
    fn observers_hear_before_playback_starts() {
        let (mut controller, _) = attached();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        controller.subscribe(move |kind| sink.borrow_mut().push(*kind));
        controller.play(AnimationKind::Tada, false);
        controller.play(AnimationKind::ShakeX, false);
        assert_eq!(
            vec![Some(AnimationKind::Tada), Some(AnimationKind::ShakeX)],
            *seen.borrow()
        );
        assert_eq!(0.0, controller.playback_state().progress);
        controller.dispose();
    }

    #[test]
    fn transition_swaps_before_any_tick() {
        let (mut controller, _) = attached();
        let swaps = swap_log(&mut controller);
        controller.play_with_icon_transition(
            AnimationKind::Particle,
            AdaptiveIcon::named("favorite_filled"),
            Some(Color::RED),
            false,
        );
        assert_eq!(
            vec![("favorite_filled".to_string(), Some(Color::RED))],
            *swaps.borrow()
        );
        assert_eq!("favorite_filled", controller.current_icon().name);
        assert_eq!(Some(Color::RED), controller.current_color());
        assert_eq!(
            Some("favorite"),
            controller.previous_icon().map(|(icon, _)| icon.name.as_str())
        );

        ticks(&mut controller, 30);
        assert_eq!(1, swaps.borrow().len(), "Swapped more than once");
        controller.dispose();
    }

    #[test]
    fn repeating_transition_never_swaps() {
        let (mut controller, _) = attached();
        let swaps = swap_log(&mut controller);
        controller.request(
            PlaybackRequest::play(AnimationKind::Pulse)
                .then_switch_to(AdaptiveIcon::named("star"), None)
                .repeating(),
        );
        ticks(&mut controller, 40);
        assert!(swaps.borrow().is_empty());
        assert_eq!("favorite", controller.current_icon().name);
        controller.dispose();
    }

    #[test]
    fn repeat_restarts_until_stopped() {
        let (mut controller, _) = attached();
        let mut completions = 0;
        // 250ms at 60fps is 15 frames, run long enough for several loops
        controller.play(AnimationKind::Pulse, true);
        for _ in 0..100 {
            controller.tick(FRAME);
            if controller.playback_state().phase == Phase::Completed {
                completions += 1;
            }
            assert_eq!(
                ControllerStatus::PlayingRepeating,
                controller.status(),
                "Settled while repeating"
            );
        }
        assert_eq!(0, completions, "Should restart on the same tick");

        ticks(&mut controller, 3);
        controller.stop();
        let stopped = controller.playback_state();
        assert_eq!(ControllerStatus::Idle, controller.status());
        ticks(&mut controller, 60);
        assert_eq!(stopped, controller.playback_state());
        assert_eq!(Some(AnimationKind::Pulse), controller.current_animation());
        controller.dispose();
    }

    #[test]
    fn zero_duration_repeat_loops_every_tick() {
        let vsync = Rc::new(FakeVsync::default());
        let config = AnimationConfig {
            playback: PlaybackConfig {
                duration: Duration::ZERO,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut controller = IconController::new(AdaptiveIcon::named("sync"), config);
        controller.attach(vsync).unwrap();
        controller.play(AnimationKind::Pulse, true);
        assert_eq!(Phase::Forward, controller.playback_state().phase);
        assert_eq!(ControllerStatus::PlayingRepeating, controller.status());

        for _ in 0..5 {
            controller.tick(FRAME);
            assert_eq!(Phase::Forward, controller.playback_state().phase);
            assert_eq!(ControllerStatus::PlayingRepeating, controller.status());
        }

        controller.stop();
        assert_eq!(ControllerStatus::Idle, controller.status());
        controller.dispose();
    }

    #[test]
    fn zero_duration_single_play_completes_at_once() {
        let vsync = Rc::new(FakeVsync::default());
        let config = AnimationConfig {
            playback: PlaybackConfig {
                duration: Duration::ZERO,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut controller = IconController::new(AdaptiveIcon::named("sync"), config);
        controller.attach(vsync).unwrap();
        controller.play(AnimationKind::Pop, false);
        assert_eq!(Phase::Completed, controller.playback_state().phase);
        assert_eq!(ControllerStatus::Idle, controller.status());
        controller.dispose();
    }

    #[test]
    fn stop_twice_is_stop_once() {
        let (mut controller, _) = attached();
        controller.play(AnimationKind::RotateLeft, false);
        ticks(&mut controller, 4);
        controller.stop();
        let once = controller.playback_state();
        controller.stop();
        assert_eq!(once, controller.playback_state());
        assert!(once.progress > 0.0);
        controller.dispose();
    }

    #[test]
    fn detached_ignores_everything() {
        let mut controller =
            IconController::new(AdaptiveIcon::named("home"), AnimationConfig::default());
        let swaps = swap_log(&mut controller);
        controller.play(AnimationKind::Pop, false);
        controller.play_with_icon_transition(
            AnimationKind::Pop,
            AdaptiveIcon::named("house"),
            None,
            false,
        );
        controller.tick(FRAME);
        controller.stop();
        assert_eq!(None, controller.current_animation());
        assert_eq!("home", controller.current_icon().name);
        assert_eq!(PlaybackState::DETACHED, controller.playback_state());
        assert!(swaps.borrow().is_empty());
    }

    #[test]
    fn attach_twice_is_an_error() {
        let (mut controller, vsync) = attached();
        assert_eq!(
            Err(ControllerError::AlreadyAttached),
            controller.attach(vsync.clone())
        );
        assert_eq!(1, vsync.live.borrow().len());
        controller.dispose();
    }

    #[test]
    fn dispose_releases_ticker_and_is_idempotent() {
        let (mut controller, vsync) = attached();
        controller.play(AnimationKind::Heartbeat, true);
        controller.dispose();
        controller.dispose();
        assert!(vsync.live.borrow().is_empty());
        assert!(!controller.is_attached());

        controller.play(AnimationKind::Pop, false);
        assert_eq!(PlaybackState::DETACHED, controller.playback_state());
        assert_eq!(Ok(()), controller.attach(vsync.clone()));
        assert!(!controller.is_attached(), "Disposed controllers stay detached");
    }

    #[test]
    fn new_play_supersedes() {
        let vsync = Rc::new(FakeVsync::default());
        let config = AnimationConfig {
            playback: PlaybackConfig {
                duration: Duration::from_millis(500),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut controller = IconController::new(AdaptiveIcon::named("bolt"), config);
        controller.attach(vsync).unwrap();
        controller.play(AnimationKind::ZoomIn, false);
        ticks(&mut controller, 10);
        assert!(controller.playback_state().progress > 0.3);
        controller.play(AnimationKind::ZoomOut, false);
        assert_eq!(Some(AnimationKind::ZoomOut), controller.current_animation());
        assert_eq!(0.0, controller.playback_state().progress);
        assert_eq!(Phase::Forward, controller.playback_state().phase);
        controller.dispose();
    }

    #[test]
    fn config_from_json() {
        let config: AnimationConfig = serde_json::from_str(
            r#"{"playback": {"duration_ms": 400, "curve": "ease-out"}, "transition": {"kind": "switch-to"}}"#,
        )
        .unwrap();
        assert_eq!(Duration::from_millis(400), config.playback.duration);
        assert_eq!(Duration::ZERO, config.playback.reverse_duration);
    }
}
