//! The closed set of animations an icon can play and the transform each produces.
//!
//! Every kind is a pure function of progress; dispatch is one exhaustive match so adding a kind
//! forces a decision about what it looks like.

use std::{f64::consts::PI, fmt::Display, str::FromStr, sync::OnceLock};

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

use crate::{
    ease::{clamp, deg_to_rad, overshoot_ease, remap, Tween},
    error::CommandError,
    keyframes::Track,
    particle,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationKind {
    #[default]
    None,
    ZoomIn,
    ZoomOut,
    RotateLeft,
    RotateRight,
    ShakeX,
    ShakeY,
    FlipX,
    FlipXReverse,
    FlipY,
    FlipYReverse,
    Heartbeat,
    FadeIn,
    FadeOut,
    Particle,
    Pulse,
    Tada,
    SwingUp,
    SwingDown,
    Pop,
}

impl AnimationKind {
    pub const ALL: [AnimationKind; 20] = [
        AnimationKind::None,
        AnimationKind::ZoomIn,
        AnimationKind::ZoomOut,
        AnimationKind::RotateLeft,
        AnimationKind::RotateRight,
        AnimationKind::ShakeX,
        AnimationKind::ShakeY,
        AnimationKind::FlipX,
        AnimationKind::FlipXReverse,
        AnimationKind::FlipY,
        AnimationKind::FlipYReverse,
        AnimationKind::Heartbeat,
        AnimationKind::FadeIn,
        AnimationKind::FadeOut,
        AnimationKind::Particle,
        AnimationKind::Pulse,
        AnimationKind::Tada,
        AnimationKind::SwingUp,
        AnimationKind::SwingDown,
        AnimationKind::Pop,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AnimationKind::None => "none",
            AnimationKind::ZoomIn => "zoom-in",
            AnimationKind::ZoomOut => "zoom-out",
            AnimationKind::RotateLeft => "rotate-left",
            AnimationKind::RotateRight => "rotate-right",
            AnimationKind::ShakeX => "shake-x",
            AnimationKind::ShakeY => "shake-y",
            AnimationKind::FlipX => "flip-x",
            AnimationKind::FlipXReverse => "flip-x-reverse",
            AnimationKind::FlipY => "flip-y",
            AnimationKind::FlipYReverse => "flip-y-reverse",
            AnimationKind::Heartbeat => "heartbeat",
            AnimationKind::FadeIn => "fade-in",
            AnimationKind::FadeOut => "fade-out",
            AnimationKind::Particle => "particle",
            AnimationKind::Pulse => "pulse",
            AnimationKind::Tada => "tada",
            AnimationKind::SwingUp => "swing-up",
            AnimationKind::SwingDown => "swing-down",
            AnimationKind::Pop => "pop",
        }
    }

    /// Whether the particle composite draws behind the icon
    pub fn has_particles(&self) -> bool {
        *self == AnimationKind::Particle
    }

    /// The transform to apply to the icon at `progress`
    pub fn transform(&self, progress: f64) -> IconTransform {
        let t = progress;
        match self {
            AnimationKind::None => IconTransform::IDENTITY,
            AnimationKind::ZoomIn => IconTransform::uniform_scale(t),
            AnimationKind::ZoomOut => IconTransform::uniform_scale(1.0 - t),
            AnimationKind::RotateLeft => IconTransform::rotation(-2.0 * PI * t),
            AnimationKind::RotateRight => IconTransform::rotation(2.0 * PI * t),
            AnimationKind::ShakeX => IconTransform::translation(Vec2::new(shake(t), 0.0)),
            AnimationKind::ShakeY => IconTransform::translation(Vec2::new(0.0, shake(t))),
            AnimationKind::FlipX => IconTransform::flip(Vec2::new(PI * t, 0.0)),
            AnimationKind::FlipXReverse => IconTransform::flip(Vec2::new(-PI * t, 0.0)),
            AnimationKind::FlipY => IconTransform::flip(Vec2::new(0.0, PI * t)),
            AnimationKind::FlipYReverse => IconTransform::flip(Vec2::new(0.0, -PI * t)),
            AnimationKind::Heartbeat => IconTransform::uniform_scale(heartbeat().sample(t)),
            AnimationKind::FadeIn => IconTransform::opacity(t),
            AnimationKind::FadeOut => IconTransform::opacity(1.0 - t),
            AnimationKind::Particle => {
                IconTransform::uniform_scale(particle::content_scale(clamp(t, 0.0, 1.0)))
            }
            AnimationKind::Pulse => IconTransform::uniform_scale(1.0 + 0.2 * (PI * t).sin()),
            AnimationKind::Tada => {
                let (scale, rotate) = tada();
                IconTransform {
                    rotation: deg_to_rad(rotate.sample(t)),
                    ..IconTransform::uniform_scale(scale.sample(t))
                }
            }
            AnimationKind::SwingUp => IconTransform {
                anchor: Point::new(0.5, 0.0),
                ..IconTransform::rotation(deg_to_rad(swing().sample(t)))
            },
            AnimationKind::SwingDown => IconTransform {
                anchor: Point::new(0.5, 1.0),
                ..IconTransform::rotation(-deg_to_rad(swing().sample(t)))
            },
            AnimationKind::Pop => IconTransform::uniform_scale(pop(t)),
        }
    }
}

impl Display for AnimationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnimationKind {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnimationKind::ALL
            .iter()
            .find(|k| k.name() == s)
            .copied()
            .ok_or_else(|| CommandError::UnknownAnimation(s.to_string()))
    }
}

/// Horizontal or vertical offset, as a fraction of icon size, that dies down over the run
fn shake(t: f64) -> f64 {
    0.1 * (6.0 * PI * t).sin() * (1.0 - t)
}

/// Dip slightly, then spring back past full size
fn pop(t: f64) -> f64 {
    const DIP: f64 = 0.3;
    let squeeze = Tween::new(1.0, 0.8);
    if t < DIP {
        squeeze.lerp(remap(t, 0.0, DIP, 0.0, 1.0))
    } else {
        let release = clamp(remap(t, DIP, 1.0, 0.0, 1.0), 0.0, 1.0);
        Tween::new(squeeze.end, 1.0).lerp(overshoot_ease(release))
    }
}

fn heartbeat() -> &'static Track {
    static TRACK: OnceLock<Track> = OnceLock::new();
    TRACK.get_or_init(|| {
        Track::from_table(&[(0.0, 1.0), (0.14, 1.3), (0.28, 1.0), (0.42, 1.3), (0.7, 1.0)])
    })
}

/// (scale, rotation in degrees)
fn tada() -> (&'static Track, &'static Track) {
    static SCALE: OnceLock<Track> = OnceLock::new();
    static ROTATE: OnceLock<Track> = OnceLock::new();
    let scale = SCALE.get_or_init(|| {
        Track::from_table(&[
            (0.0, 1.0),
            (0.1, 0.9),
            (0.2, 0.9),
            (0.3, 1.1),
            (0.9, 1.1),
            (1.0, 1.0),
        ])
    });
    let rotate = ROTATE.get_or_init(|| {
        Track::from_table(&[
            (0.0, 0.0),
            (0.1, -3.0),
            (0.2, -3.0),
            (0.3, 3.0),
            (0.4, -3.0),
            (0.5, 3.0),
            (0.6, -3.0),
            (0.7, 3.0),
            (0.8, -3.0),
            (0.9, 3.0),
            (1.0, 0.0),
        ])
    });
    (scale, rotate)
}

/// Rotation in degrees around the pivot
fn swing() -> &'static Track {
    static TRACK: OnceLock<Track> = OnceLock::new();
    TRACK.get_or_init(|| {
        Track::from_table(&[
            (0.0, 0.0),
            (0.2, 15.0),
            (0.4, -10.0),
            (0.6, 5.0),
            (0.8, -5.0),
            (1.0, 0.0),
        ])
    })
}

/// A visual transform in icon-relative units.
///
/// Translation is a fraction of icon size, the anchor a normalized point within the icon box
/// (0.5, 0.5 is the center). Flip holds rotation around the vertical (x) and horizontal (y)
/// axes which 2d rendering projects as a scale by the cosine.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IconTransform {
    pub scale: Vec2,
    pub rotation: f64,
    pub translate: Vec2,
    pub flip: Vec2,
    pub anchor: Point,
    pub opacity: f64,
}

impl Default for IconTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl IconTransform {
    pub const IDENTITY: Self = Self {
        scale: Vec2::new(1.0, 1.0),
        rotation: 0.0,
        translate: Vec2::ZERO,
        flip: Vec2::ZERO,
        anchor: Point::new(0.5, 0.5),
        opacity: 1.0,
    };

    pub fn uniform_scale(scale: f64) -> Self {
        Self {
            scale: Vec2::new(scale, scale),
            ..Self::IDENTITY
        }
    }

    pub fn rotation(radians: f64) -> Self {
        Self {
            rotation: radians,
            ..Self::IDENTITY
        }
    }

    pub fn translation(offset: Vec2) -> Self {
        Self {
            translate: offset,
            ..Self::IDENTITY
        }
    }

    pub fn flip(angles: Vec2) -> Self {
        Self {
            flip: angles,
            ..Self::IDENTITY
        }
    }

    pub fn opacity(opacity: f64) -> Self {
        Self {
            opacity,
            ..Self::IDENTITY
        }
    }

    /// Stack `other` on top of self: scales multiply, rotations and offsets add.
    ///
    /// The anchor of `other` wins unless it is the default center.
    pub fn then(&self, other: &IconTransform) -> IconTransform {
        IconTransform {
            scale: Vec2::new(self.scale.x * other.scale.x, self.scale.y * other.scale.y),
            rotation: self.rotation + other.rotation,
            translate: self.translate + other.translate,
            flip: self.flip + other.flip,
            anchor: if other.anchor == Self::IDENTITY.anchor {
                self.anchor
            } else {
                other.anchor
            },
            opacity: self.opacity * other.opacity,
        }
    }

    /// The 2d scale after projecting flips
    pub fn projected_scale(&self) -> Vec2 {
        Vec2::new(
            self.scale.x * self.flip.x.cos(),
            self.scale.y * self.flip.y.cos(),
        )
    }

    /// Affine for an icon drawn in a `size` x `size` box at the origin. Y-down.
    pub fn to_affine(&self, size: f64) -> Affine {
        let pivot = (self.anchor.to_vec2()) * size;
        let scale = self.projected_scale();
        Affine::translate(pivot + self.translate * size)
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(scale.x, scale.y)
            * Affine::translate(-pivot)
    }
}
