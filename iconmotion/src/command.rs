//! Quick & dirty text input to playback requests

use std::{str::FromStr, sync::OnceLock};

use regex::{Captures, Regex};

use crate::{
    adaptive::AdaptiveIcon, catalog::AnimationKind, color::Color, controller::PlaybackRequest,
    error::CommandError,
};

#[derive(Debug, PartialEq)]
pub struct PlayCommand<'a> {
    kind: AnimationKind,
    switch_to: Option<&'a str>,
    color: Option<Color>,
    repeat: bool,
}

impl<'a> PlayCommand<'a> {
    fn from_captures(
        captures: &Captures<'a>,
        kind_idx: usize,
        switch_idx: usize,
        color_idx: usize,
        repeat_idx: usize,
    ) -> Result<Self, CommandError> {
        let kind = captures
            .get(kind_idx)
            .ok_or(CommandError::NoCapture("animation", kind_idx))?
            .as_str()
            .parse::<AnimationKind>()?;
        let switch_to = captures.get(switch_idx).map(|m| m.as_str());
        let color = captures
            .get(color_idx)
            .map(|m| Color::from_str(m.as_str()))
            .transpose()?;
        let repeat = captures.get(repeat_idx).is_some();
        Ok(PlayCommand {
            kind,
            switch_to,
            color,
            repeat,
        })
    }

    pub fn kind(&self) -> AnimationKind {
        self.kind
    }

    pub fn switch_to(&self) -> Option<&'a str> {
        self.switch_to
    }

    /// The request to hand an [`crate::controller::IconController`], icons resolved by name
    pub fn request(&self) -> PlaybackRequest {
        let mut request = PlaybackRequest::play(self.kind);
        if let Some(icon) = self.switch_to {
            request = request.then_switch_to(AdaptiveIcon::named(icon), self.color);
        }
        if self.repeat {
            request = request.repeating();
        }
        request
    }
}

#[derive(Debug, PartialEq)]
pub enum Command<'a> {
    Play(PlayCommand<'a>),
    Stop,
}

impl Command<'_> {
    fn parse(command: &str) -> Result<Command<'_>, CommandError> {
        const SWITCH: &str = r"(?:\s+then\s+switch\s+to\s+(\w+)(?:\s+color\s+(#\S+))?)?";
        static PLAY: OnceLock<Regex> = OnceLock::new();
        static STOP: OnceLock<Regex> = OnceLock::new();

        let play = PLAY.get_or_init(|| {
            Regex::new(&(r"^Play\s+([\w-]+)".to_string() + SWITCH + r"(\s+repeating)?\s*$"))
                .unwrap()
        });
        let stop = STOP.get_or_init(|| Regex::new(r"^Stop\s*$").unwrap());

        Ok(if let Some(captures) = play.captures_at(command, 0) {
            Command::Play(PlayCommand::from_captures(&captures, 1, 2, 3, 4)?)
        } else if stop.is_match(command) {
            Command::Stop
        } else {
            return Err(CommandError::UnrecognizedCommand);
        })
    }
}

pub fn parse_command(command: &str) -> Result<Command<'_>, CommandError> {
    Command::parse(command.trim())
}
