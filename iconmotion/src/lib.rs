//! Declarative icon animation: a catalog of named animations, a tick-driven playback clock,
//! a particle burst and transitions between icons, composed into frames for drawing.
//!
//! Everything is single threaded. The host owns the frame clock and calls
//! [`controller::IconController::tick`] once per frame.

pub mod adaptive;
pub mod catalog;
pub mod color;
pub mod command;
pub mod controller;
pub mod ease;
pub mod error;
pub mod keyframes;
pub mod listeners;
pub mod particle;
pub mod playback;
pub mod transition;

pub use adaptive::{AdaptiveIcon, GlyphRef, IconFrame, IconPresentation, Platform};
pub use catalog::{AnimationKind, IconTransform};
pub use color::Color;
pub use controller::{AnimationConfig, IconController, PlaybackRequest};
pub use playback::{Completion, Outcome, Phase, PlaybackConfig, PlaybackState, VsyncProvider};
