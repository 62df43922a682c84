//! The particle burst: two rings of bubbles flying out, an expanding circle and the icon
//! popping back in, all driven by one shared progress value.
//!
//! Nothing here keeps state between frames. A frame is a function of progress, canvas size and
//! the palettes; [`BubblesPainter::should_repaint`] and [`CirclePainter::should_repaint`] tell a
//! caller holding the previous frame whether recomputing is worthwhile.

use std::fmt::Write;

use kurbo::{Circle, Point, Shape};
use tracing::trace;

use crate::{
    color::{BubblesColor, CircleColor, Color},
    ease::{clamp, deg_to_rad, remap, Curve, Interval, Tween},
    error::ConfigError,
};

/// Bubbles per ring
pub const BUBBLE_COUNT: usize = 7;

/// Degrees between neighbouring bubbles of a ring
pub const BUBBLE_ANGLE_STEP: f64 = 360.0 / BUBBLE_COUNT as f64;

const OUTER_CIRCLE: Interval = Interval::fixed(0.0, 0.3, Curve::Ease);
const OUTER_CIRCLE_RADIUS: Tween = Tween::new(0.1, 1.0);
const INNER_CIRCLE: Interval = Interval::fixed(0.2, 0.5, Curve::Ease);
const INNER_CIRCLE_RADIUS: Tween = Tween::new(0.2, 1.0);
const CONTENT: Interval = Interval::fixed(0.35, 0.7, Curve::Overshoot);
const CONTENT_SCALE: Tween = Tween::new(0.2, 1.0);
const BUBBLES: Interval = Interval::fixed(0.1, 1.0, Curve::Decelerate);

/// Scale of the icon within the burst; briefly exceeds 1 before settling
pub fn content_scale(progress: f64) -> f64 {
    CONTENT_SCALE.lerp(CONTENT.transform(progress))
}

/// Static inputs of the effect. Build with [`ParticleStyle::new`] so the size is checked.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParticleStyle {
    /// Edge length of the square canvas the burst occupies
    pub size: f64,
    pub bubbles: BubblesColor,
    pub circle: CircleColor,
}

impl ParticleStyle {
    pub fn new(size: f64, bubbles: BubblesColor, circle: CircleColor) -> Result<Self, ConfigError> {
        if size <= 0.0 || !size.is_finite() {
            return Err(ConfigError::NonPositiveSize(size));
        }
        Ok(Self {
            size,
            bubbles,
            circle,
        })
    }

    /// Bubbles tinted from one color, for callers that only have an accent color
    pub fn from_accent(size: f64, accent: Color) -> Result<Self, ConfigError> {
        let bubbles = BubblesColor {
            dot_primary: accent.lerp(Color::WHITE, 0.45),
            dot_secondary: accent.lerp(Color::WHITE, 0.2),
            dot_third: accent,
            dot_last: accent.lerp(Color::BLACK, 0.2),
        };
        let circle = CircleColor {
            start: accent.lerp(Color::WHITE, 0.3),
            end: accent,
        };
        Self::new(size, bubbles, circle)
    }

    /// The whole composite at `progress`
    pub fn frame(&self, progress: f64) -> ParticleFrame {
        trace!("particle frame at {progress:.3}");
        let bubbles = BubblesPainter::new(BUBBLES.transform(progress), self.size, self.bubbles);
        let circle = CirclePainter::new(
            OUTER_CIRCLE_RADIUS.lerp(OUTER_CIRCLE.transform(progress)),
            INNER_CIRCLE_RADIUS.lerp(INNER_CIRCLE.transform(progress)),
            self.size,
            self.circle,
        );
        ParticleFrame {
            progress,
            size: self.size,
            circle: circle.paint(),
            bubbles: bubbles.paint(),
            content_scale: content_scale(progress),
        }
    }
}

/// Derived state of one ring of bubbles
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BubbleRingState {
    pub radius: f64,
    pub dot_size: f64,
    /// Start angle of bubble 0, degrees
    pub start_angle: f64,
    /// Offset into the paints, bubble i uses paints[(i + offset) % 4]
    pub paint_offset: usize,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bubble {
    pub center: Point,
    pub radius: f64,
    pub color: Color,
}

/// Two rings of [`BUBBLE_COUNT`] bubbles. Outer flies further and lives longer, inner sits
/// half a step around so the rings are staggered.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BubblesPainter {
    progress: f64,
    size: f64,
    colors: BubblesColor,
}

impl BubblesPainter {
    pub fn new(progress: f64, size: f64, colors: BubblesColor) -> Self {
        Self {
            progress,
            size,
            colors,
        }
    }

    pub fn max_dot_size(&self) -> f64 {
        self.size * 0.05
    }

    /// R_max, the furthest the outer ring travels
    pub fn max_outer_radius(&self) -> f64 {
        (self.size * 0.5 - self.max_dot_size() * 2.0).max(0.0)
    }

    pub fn max_inner_radius(&self) -> f64 {
        0.8 * self.max_outer_radius()
    }

    pub fn should_repaint(&self, old: &BubblesPainter) -> bool {
        self.progress != old.progress || self.size != old.size || self.colors != old.colors
    }

    pub fn outer_ring(&self) -> BubbleRingState {
        let p = self.progress;
        let max_radius = self.max_outer_radius();
        let max_dot = self.max_dot_size();
        let radius = if p < 0.3 {
            remap(p, 0.0, 0.3, 0.0, max_radius * 0.8)
        } else {
            remap(p, 0.3, 1.0, 0.8 * max_radius, max_radius)
        };
        let dot_size = if p == 0.0 {
            0.0
        } else if p < 0.7 {
            max_dot
        } else {
            remap(p, 0.7, 1.0, max_dot, 0.0)
        };
        BubbleRingState {
            radius: clamp(radius, 0.0, max_radius),
            dot_size: clamp(dot_size, 0.0, max_dot),
            start_angle: BUBBLE_ANGLE_STEP / 4.0 * 3.0,
            paint_offset: 0,
        }
    }

    pub fn inner_ring(&self) -> BubbleRingState {
        let p = self.progress;
        let max_radius = self.max_inner_radius();
        let max_dot = self.max_dot_size();
        let radius = if p < 0.3 {
            remap(p, 0.0, 0.3, 0.0, max_radius)
        } else {
            max_radius
        };
        let dot_size = if p == 0.0 {
            0.0
        } else if p < 0.2 {
            max_dot
        } else if p < 0.5 {
            remap(p, 0.2, 0.5, max_dot, 0.3 * max_dot)
        } else {
            remap(p, 0.5, 1.0, 0.3 * max_dot, 0.0)
        };
        BubbleRingState {
            radius: clamp(radius, 0.0, max_radius),
            dot_size: clamp(dot_size, 0.0, max_dot),
            start_angle: BUBBLE_ANGLE_STEP / 4.0 * 3.0 - BUBBLE_ANGLE_STEP / 2.0,
            paint_offset: 1,
        }
    }

    /// Opaque until 0.6, then fades out
    pub fn alpha(&self) -> u8 {
        let p = clamp(self.progress, 0.6, 1.0);
        clamp(remap(p, 0.6, 1.0, 255.0, 0.0), 0.0, 255.0) as u8
    }

    /// The four paints; colors rotate one palette slot per half of the run
    pub fn paints(&self) -> [Color; 4] {
        let [c1, c2, c3, c4] = self.colors.as_array();
        let alpha = self.alpha();
        let (pairs, t) = if self.progress < 0.5 {
            (
                [(c1, c2), (c2, c3), (c3, c4), (c4, c1)],
                remap(self.progress, 0.0, 0.5, 0.0, 1.0),
            )
        } else {
            (
                [(c2, c3), (c3, c4), (c4, c1), (c1, c2)],
                remap(self.progress, 0.5, 1.0, 0.0, 1.0),
            )
        };
        pairs.map(|(from, to)| from.lerp(to, t).with_alpha(alpha))
    }

    /// Outer ring first, then inner
    pub fn paint(&self) -> Vec<Bubble> {
        let center = Point::new(self.size * 0.5, self.size * 0.5);
        let paints = self.paints();
        [self.outer_ring(), self.inner_ring()]
            .into_iter()
            .flat_map(|ring| {
                (0..BUBBLE_COUNT).map(move |i| {
                    let angle = deg_to_rad(ring.start_angle + BUBBLE_ANGLE_STEP * i as f64);
                    Bubble {
                        center: center + ring.radius * kurbo::Vec2::from_angle(angle),
                        radius: ring.dot_size,
                        color: paints[(i + ring.paint_offset) % paints.len()],
                    }
                })
            })
            .collect()
    }
}

/// The expanding outline behind the bubbles
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RingStroke {
    pub center: Point,
    pub radius: f64,
    pub stroke_width: f64,
    pub color: Color,
}

/// An outer circle that grows while an inner circle, cut out of it, grows slightly later,
/// leaving a thinning ring that changes color in its second half.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CirclePainter {
    outer_progress: f64,
    inner_progress: f64,
    size: f64,
    colors: CircleColor,
}

impl CirclePainter {
    pub fn new(outer_progress: f64, inner_progress: f64, size: f64, colors: CircleColor) -> Self {
        Self {
            outer_progress,
            inner_progress,
            size,
            colors,
        }
    }

    pub fn should_repaint(&self, old: &CirclePainter) -> bool {
        self.outer_progress != old.outer_progress
            || self.inner_progress != old.inner_progress
            || self.size != old.size
            || self.colors != old.colors
    }

    pub fn color(&self) -> Color {
        let t = remap(clamp(self.outer_progress, 0.5, 1.0), 0.5, 1.0, 0.0, 1.0);
        self.colors.start.lerp(self.colors.end, t)
    }

    /// None once the inner circle has caught up with the outer one
    pub fn paint(&self) -> Option<RingStroke> {
        let half = self.size * 0.5;
        let stroke_width = (self.outer_progress - self.inner_progress) * half;
        if stroke_width <= 0.0 {
            return None;
        }
        Some(RingStroke {
            center: Point::new(half, half),
            radius: clamp(self.outer_progress * half, 0.0, half),
            stroke_width,
            color: self.color(),
        })
    }
}

/// Everything needed to draw one frame of the burst
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleFrame {
    pub progress: f64,
    pub size: f64,
    pub circle: Option<RingStroke>,
    pub bubbles: Vec<Bubble>,
    pub content_scale: f64,
}

impl ParticleFrame {
    /// Svg elements, circle then bubbles, in a `size` x `size` box
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        if let Some(ring) = &self.circle {
            let path = Circle::new(ring.center, ring.radius).to_path(0.1);
            let _ = writeln!(
                svg,
                "  <path fill=\"none\" stroke=\"{}\" stroke-opacity=\"{:.3}\" stroke-width=\"{:.2}\" d=\"{}\" />",
                ring.color.to_hex_rgb(),
                ring.color.opacity(),
                ring.stroke_width,
                path.to_svg()
            );
        }
        for bubble in self.bubbles.iter().filter(|b| b.radius > 0.0) {
            let path = Circle::new(bubble.center, bubble.radius).to_path(0.1);
            let _ = writeln!(
                svg,
                "  <path fill=\"{}\" fill-opacity=\"{:.3}\" d=\"{}\" />",
                bubble.color.to_hex_rgb(),
                bubble.color.opacity(),
                path.to_svg()
            );
        }
        svg
    }
}

#[cfg(test)]
mod tests {
    use ordered_float::OrderedFloat;

    use crate::color::{BubblesColor, CircleColor, Color};

    use super::*;

    const SIZE: f64 = 100.0;

    fn painter(progress: f64) -> BubblesPainter {
        BubblesPainter::new(progress, SIZE, BubblesColor::default())
    }

    fn progressions() -> impl Iterator<Item = f64> {
        (0..=200).map(|i| i as f64 / 200.0)
    }

    #[test]
    fn alpha_and_radius_stay_in_bounds() {
        for p in progressions() {
            let painter = painter(p);
            let r_max = painter.max_outer_radius();
            for ring in [painter.outer_ring(), painter.inner_ring()] {
                assert!(
                    (0.0..=r_max).contains(&ring.radius),
                    "radius {} at {p}",
                    ring.radius
                );
                assert!(ring.dot_size >= 0.0 && ring.dot_size <= painter.max_dot_size());
            }
            for bubble in painter.paint() {
                let distance = (bubble.center - Point::new(SIZE / 2.0, SIZE / 2.0)).hypot();
                assert!(distance <= r_max + 1e-9, "{bubble:?} at {p}");
            }
        }
    }

    #[test]
    fn alpha_only_fades_after_sixty_percent() {
        assert_eq!(255, painter(0.0).alpha());
        assert_eq!(255, painter(0.6).alpha());
        assert_eq!(0, painter(1.0).alpha());
        let mid = painter(0.8).alpha();
        assert!(mid > 0 && mid < 255, "{mid}");
    }

    #[test]
    fn nothing_visible_at_start() {
        let painter = painter(0.0);
        assert_eq!(0.0, painter.outer_ring().dot_size);
        assert_eq!(0.0, painter.inner_ring().dot_size);
        assert_eq!(0.0, painter.outer_ring().radius);
    }

    #[test]
    fn outer_ring_reaches_eighty_percent_at_point_three() {
        let at_03 = painter(0.3);
        assert!((at_03.outer_ring().radius - 0.8 * at_03.max_outer_radius()).abs() < 1e-9);
        assert_eq!(at_03.max_inner_radius(), at_03.inner_ring().radius);
        assert_eq!(at_03.max_inner_radius(), painter(0.9).inner_ring().radius);
    }

    #[test]
    fn dot_sizes_follow_their_segments() {
        let max_dot = painter(0.5).max_dot_size();
        assert_eq!(max_dot, painter(0.69).outer_ring().dot_size);
        assert!((painter(0.85).outer_ring().dot_size - max_dot / 2.0).abs() < 1e-9);
        assert_eq!(max_dot, painter(0.1).inner_ring().dot_size);
        assert!((painter(0.5).inner_ring().dot_size - 0.3 * max_dot).abs() < 1e-9);
        assert_eq!(0.0, painter(1.0).inner_ring().dot_size);
        assert_eq!(0.0, painter(1.0).outer_ring().dot_size);
    }

    #[test]
    fn rings_are_staggered_by_half_a_step() {
        let painter = painter(0.5);
        let outer = painter.outer_ring();
        let inner = painter.inner_ring();
        assert!((outer.start_angle - inner.start_angle - BUBBLE_ANGLE_STEP / 2.0).abs() < 1e-9);
        assert_eq!(2 * BUBBLE_COUNT, painter.paint().len());
    }

    #[test]
    fn paints_rotate_through_the_palette() {
        let colors = BubblesColor::default();
        let start = painter(0.0).paints();
        assert_eq!(colors.dot_primary, start[0]);
        assert_eq!(colors.dot_last, start[3]);
        // at the halfway point each paint has moved one slot along
        let half = painter(0.5).paints();
        assert_eq!(colors.dot_secondary, half[0]);
        assert_eq!(colors.dot_primary, half[3]);
    }

    #[test]
    fn inner_ring_uses_next_paint() {
        let painter = painter(0.0001);
        let bubbles = painter.paint();
        let paints = painter.paints();
        assert_eq!(paints[0], bubbles[0].color);
        assert_eq!(paints[1], bubbles[BUBBLE_COUNT].color);
    }

    #[test]
    fn repaint_only_on_change() {
        let a = painter(0.4);
        assert!(!a.should_repaint(&painter(0.4)));
        assert!(a.should_repaint(&painter(0.41)));
        let recolored = BubblesPainter::new(
            0.4,
            SIZE,
            BubblesColor {
                dot_last: Color::BLACK,
                ..Default::default()
            },
        );
        assert!(a.should_repaint(&recolored));
    }

    #[test]
    fn circle_ring_thins_and_recolors() {
        let colors = CircleColor::default();
        let early = CirclePainter::new(0.4, 0.2, SIZE, colors);
        let ring = early.paint().unwrap();
        assert!((ring.stroke_width - 0.2 * SIZE / 2.0).abs() < 1e-9);
        assert_eq!(colors.start, ring.color);

        let done = CirclePainter::new(1.0, 1.0, SIZE, colors);
        assert_eq!(None, done.paint());
        assert_eq!(colors.end, done.color());
    }

    #[test]
    fn content_scale_overshoots_then_settles() {
        assert_eq!(0.2, content_scale(0.0));
        assert_eq!(0.2, content_scale(0.35));
        assert_eq!(1.0, content_scale(1.0));
        let max = progressions()
            .map(|p| OrderedFloat(content_scale(p)))
            .max()
            .unwrap()
            .0;
        assert!(max > 1.0, "Should overshoot, max {max}");
    }

    #[test]
    fn frames_are_deterministic() {
        let style = ParticleStyle::new(SIZE, BubblesColor::default(), CircleColor::default())
            .unwrap();
        let run = || progressions().map(|p| style.frame(p)).collect::<Vec<_>>();
        assert_eq!(run(), run());
    }

    #[test]
    fn frame_composites_all_layers() {
        let style = ParticleStyle::from_accent(SIZE, Color::RED).unwrap();
        let frame = style.frame(0.25);
        assert!(frame.circle.is_some());
        assert_eq!(2 * BUBBLE_COUNT, frame.bubbles.len());
        let svg = frame.to_svg();
        assert!(svg.contains("stroke-width"), "{svg}");
        assert_eq!(2 * BUBBLE_COUNT, svg.matches("fill-opacity").count(), "{svg}");
    }

    #[test]
    fn style_rejects_empty_canvas() {
        assert_eq!(
            Err(ConfigError::NonPositiveSize(0.0)),
            ParticleStyle::new(0.0, Default::default(), Default::default())
        );
    }
}
