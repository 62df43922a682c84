//! Error types
use std::num::ParseIntError;

use thiserror::Error;

use crate::transition::TransitionKind;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0:?} transition requires both a particle color and a particle size")]
    IncompleteParticleStyle(TransitionKind),
    #[error("Size must be > 0, got {0}")]
    NonPositiveSize(f64),
    #[error("Interval [{0}, {1}] must satisfy 0 <= begin <= end <= 1")]
    InvalidInterval(f64, f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum ControllerError {
    #[error("Controller is already attached to a surface")]
    AlreadyAttached,
}

#[derive(Debug, Error, PartialEq)]
pub enum ColorError {
    #[error("Color must look like #rrggbb or #rrggbbaa, got '{0}'")]
    InvalidFormat(String),
    #[error("Invalid hex digits: {0}")]
    InvalidHex(#[from] ParseIntError),
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Unrecognized command")]
    UnrecognizedCommand,
    #[error("No capture for {0} at {1}")]
    NoCapture(&'static str, usize),
    #[error("Unknown animation '{0}'")]
    UnknownAnimation(String),
    #[error("{0}")]
    InvalidColor(#[from] ColorError),
}
