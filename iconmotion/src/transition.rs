//! Transitions between two icons, configured independently of the in-place animation catalog

use std::f64::consts::PI;

use kurbo::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::IconTransform,
    color::Color,
    ease::{clamp, deg_to_rad, remap, Tween},
    error::ConfigError,
    particle::ParticleStyle,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    #[default]
    None,
    SwitchTo,
    Rotate,
    SlideUp,
    SlideDown,
    ZoomIn,
    ZoomOut,
    Particle,
}

/// Angle and scale ranges the outgoing icon moves through during [`TransitionKind::SwitchTo`];
/// the incoming icon plays them backwards.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchIconTransition {
    /// Degrees
    pub angle: Tween,
    pub scale: Tween,
}

impl Default for SwitchIconTransition {
    fn default() -> Self {
        Self {
            angle: Tween::new(0.0, 90.0),
            scale: Tween::new(1.0, 0.5),
        }
    }
}

/// Transforms for the two layers of a transition at some progress
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionFrame {
    /// The previous icon, None once it is gone
    pub outgoing: Option<IconTransform>,
    pub incoming: IconTransform,
}

/// How the icon changes when it is swapped.
///
/// Only constructed through [`TransitionConfigBuilder`], deserialization included, so a
/// particle transition always has its color and size.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "TransitionConfigBuilder")]
pub struct TransitionConfig {
    kind: TransitionKind,
    switch: SwitchIconTransition,
    particle_color: Option<Color>,
    particle_size: Option<f64>,
}

impl TransitionConfig {
    pub fn builder(kind: TransitionKind) -> TransitionConfigBuilder {
        TransitionConfigBuilder {
            kind,
            ..Default::default()
        }
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn switch(&self) -> &SwitchIconTransition {
        &self.switch
    }

    /// The burst to draw behind the incoming icon, if a particle color and size were given
    pub fn particle(&self) -> Option<ParticleStyle> {
        let (color, size) = self.particle_color.zip(self.particle_size)?;
        ParticleStyle::from_accent(size, color).ok()
    }

    pub fn frame(&self, progress: f64) -> TransitionFrame {
        let t = clamp(progress, 0.0, 1.0);
        // most transitions hand over at the midpoint
        let first_half = clamp(remap(t, 0.0, 0.5, 0.0, 1.0), 0.0, 1.0);
        let second_half = clamp(remap(t, 0.5, 1.0, 0.0, 1.0), 0.0, 1.0);
        let handover = |outgoing: IconTransform, incoming: IconTransform| TransitionFrame {
            outgoing: (t < 0.5).then_some(outgoing),
            incoming: if t < 0.5 {
                IconTransform::opacity(0.0)
            } else {
                incoming
            },
        };
        match self.kind {
            TransitionKind::None => TransitionFrame {
                outgoing: None,
                incoming: IconTransform::IDENTITY,
            },
            TransitionKind::SwitchTo => {
                let out = IconTransform {
                    rotation: deg_to_rad(self.switch.angle.lerp(first_half)),
                    ..IconTransform::uniform_scale(self.switch.scale.lerp(first_half))
                };
                let inc = IconTransform {
                    rotation: deg_to_rad(self.switch.angle.lerp(1.0 - second_half)),
                    ..IconTransform::uniform_scale(self.switch.scale.lerp(1.0 - second_half))
                };
                handover(out, inc)
            }
            TransitionKind::Rotate => handover(
                IconTransform::rotation(PI * first_half),
                IconTransform::rotation(-PI * (1.0 - second_half)),
            ),
            TransitionKind::SlideUp => TransitionFrame {
                outgoing: (t < 1.0).then_some(IconTransform {
                    opacity: 1.0 - t,
                    ..IconTransform::translation(Vec2::new(0.0, -t))
                }),
                incoming: IconTransform {
                    opacity: t,
                    ..IconTransform::translation(Vec2::new(0.0, 1.0 - t))
                },
            },
            TransitionKind::SlideDown => TransitionFrame {
                outgoing: (t < 1.0).then_some(IconTransform {
                    opacity: 1.0 - t,
                    ..IconTransform::translation(Vec2::new(0.0, t))
                }),
                incoming: IconTransform {
                    opacity: t,
                    ..IconTransform::translation(Vec2::new(0.0, t - 1.0))
                },
            },
            TransitionKind::ZoomIn => handover(
                IconTransform::uniform_scale(1.0 - first_half),
                IconTransform::uniform_scale(second_half),
            ),
            TransitionKind::ZoomOut => handover(
                IconTransform {
                    opacity: 1.0 - first_half,
                    ..IconTransform::uniform_scale(1.0 + first_half)
                },
                IconTransform {
                    opacity: second_half,
                    ..IconTransform::uniform_scale(2.0 - second_half)
                },
            ),
            // the burst itself is drawn from the particle style, the icon just pops in
            TransitionKind::Particle => TransitionFrame {
                outgoing: None,
                incoming: IconTransform::uniform_scale(crate::particle::content_scale(t)),
            },
        }
    }
}

/// Collects the optional pieces of a [`TransitionConfig`] and checks they fit together
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransitionConfigBuilder {
    kind: TransitionKind,
    switch: Option<SwitchIconTransition>,
    particle_color: Option<Color>,
    particle_size: Option<f64>,
}

impl TransitionConfigBuilder {
    pub fn switch(mut self, switch: SwitchIconTransition) -> Self {
        self.switch = Some(switch);
        self
    }

    pub fn particle_color(mut self, color: Color) -> Self {
        self.particle_color = Some(color);
        self
    }

    pub fn particle_size(mut self, size: f64) -> Self {
        self.particle_size = Some(size);
        self
    }

    pub fn build(self) -> Result<TransitionConfig, ConfigError> {
        match (self.particle_color, self.particle_size) {
            (Some(color), Some(size)) => {
                ParticleStyle::from_accent(size, color)?;
            }
            (None, None) if self.kind != TransitionKind::Particle => (),
            _ => return Err(ConfigError::IncompleteParticleStyle(self.kind)),
        };
        Ok(TransitionConfig {
            kind: self.kind,
            switch: self.switch.unwrap_or_default(),
            particle_color: self.particle_color,
            particle_size: self.particle_size,
        })
    }
}

impl TryFrom<TransitionConfigBuilder> for TransitionConfig {
    type Error = ConfigError;

    fn try_from(builder: TransitionConfigBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}
