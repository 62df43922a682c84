//! Platform-adaptive glyph choice, and composition of a controller's state into drawable layers.

use std::fmt::Write;

use kurbo::{Affine, Vec2};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    catalog::{AnimationKind, IconTransform},
    color::{BubblesColor, CircleColor, Color},
    controller::IconController,
    error::ConfigError,
    particle::{ParticleFrame, ParticleStyle},
    playback::Phase,
    transition::TransitionKind,
};

pub const PRIMARY_FAMILY: &str = "Material Icons";
pub const ALTERNATE_FAMILY: &str = "CupertinoIcons";

/// Which icon family the host platform draws with
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    #[default]
    Primary,
    Alternate,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlyphRef {
    pub family: String,
    pub name: String,
}

impl GlyphRef {
    pub fn new(family: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            name: name.into(),
        }
    }
}

fn unit_scale() -> f64 {
    1.0
}

/// One logical icon with a glyph per platform style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveIcon {
    pub name: String,
    pub primary: GlyphRef,
    pub alternate: GlyphRef,
    /// Applied to the alternate glyph when fitting it to the primary's optical size
    #[serde(default = "unit_scale")]
    pub alternate_fit_scale: f64,
}

impl AdaptiveIcon {
    pub fn new(name: impl Into<String>, primary: GlyphRef, alternate: GlyphRef) -> Self {
        Self {
            name: name.into(),
            primary,
            alternate,
            alternate_fit_scale: 1.0,
        }
    }

    /// The same glyph name in both default families
    pub fn named(name: &str) -> Self {
        Self::new(
            name,
            GlyphRef::new(PRIMARY_FAMILY, name),
            GlyphRef::new(ALTERNATE_FAMILY, name),
        )
    }

    pub fn with_alternate_fit_scale(mut self, scale: f64) -> Self {
        self.alternate_fit_scale = scale;
        self
    }

    pub fn resolve(&self, platform: Platform, fit: bool) -> ResolvedGlyph<'_> {
        match platform {
            Platform::Primary => ResolvedGlyph {
                glyph: &self.primary,
                scale: 1.0,
            },
            Platform::Alternate => ResolvedGlyph {
                glyph: &self.alternate,
                scale: if fit { self.alternate_fit_scale } else { 1.0 },
            },
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ResolvedGlyph<'a> {
    pub glyph: &'a GlyphRef,
    pub scale: f64,
}

/// One glyph to draw, bottom to top order is the order in [`IconFrame::layers`]
#[derive(Debug, Clone, PartialEq)]
pub struct IconLayer {
    pub glyph: GlyphRef,
    pub color: Color,
    /// Platform fit, applied about the center before the animation transform
    pub base_scale: f64,
    pub transform: IconTransform,
}

impl IconLayer {
    pub fn to_affine(&self, size: f64) -> Affine {
        let center = Vec2::new(size / 2.0, size / 2.0);
        self.transform.to_affine(size)
            * Affine::translate(center)
            * Affine::scale(self.base_scale)
            * Affine::translate(-center)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IconFrame {
    pub size: f64,
    pub layers: Vec<IconLayer>,
    /// Drawn behind the layers, centered
    pub particles: Option<ParticleFrame>,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl IconFrame {
    /// Svg elements for the frame in a `size` x `size` box at the origin
    pub fn svg_body(&self) -> String {
        let mut svg = String::new();
        if let Some(particles) = &self.particles {
            let inset = (self.size - particles.size) / 2.0;
            if inset != 0.0 {
                let _ = writeln!(svg, "  <g transform=\"translate({inset:.2} {inset:.2})\">");
                svg.push_str(&particles.to_svg());
                svg.push_str("  </g>\n");
            } else {
                svg.push_str(&particles.to_svg());
            }
        }
        for layer in self.layers.iter().filter(|l| l.transform.opacity > 0.0) {
            let [a, b, c, d, e, f] = layer.to_affine(self.size).as_coeffs();
            let _ = writeln!(
                svg,
                "  <g transform=\"matrix({a:.4} {b:.4} {c:.4} {d:.4} {e:.3} {f:.3})\" opacity=\"{:.3}\">",
                layer.transform.opacity.min(1.0),
            );
            let _ = writeln!(
                svg,
                "    <text x=\"{0:.2}\" y=\"{0:.2}\" font-family=\"{1}\" font-size=\"{2:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" fill=\"{3}\" fill-opacity=\"{4:.3}\">{5}</text>",
                self.size / 2.0,
                escape(&layer.glyph.family),
                self.size,
                layer.color.to_hex_rgb(),
                layer.color.opacity(),
                escape(&layer.glyph.name),
            );
            svg.push_str("  </g>\n");
        }
        svg
    }

    /// A standalone svg document
    pub fn to_svg(&self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{0}\" height=\"{0}\" viewBox=\"0 0 {0} {0}\">\n{1}</svg>\n",
            self.size,
            self.svg_body()
        )
    }
}

/// Inputs that fully determine a frame
#[derive(Debug, Clone, PartialEq)]
struct FrameKey {
    value: f64,
    phase: Phase,
    animation: Option<AnimationKind>,
    icon: AdaptiveIcon,
    color: Option<Color>,
    previous: Option<(AdaptiveIcon, Option<Color>)>,
    platform: Platform,
}

impl FrameKey {
    fn of(controller: &IconController, platform: Platform) -> Self {
        let state = controller.playback_state();
        Self {
            value: controller.value(),
            phase: state.phase,
            animation: controller.current_animation(),
            icon: controller.current_icon().clone(),
            color: controller.current_color(),
            previous: controller
                .previous_icon()
                .map(|(icon, color)| (icon.clone(), color)),
            platform,
        }
    }

    /// Only sweeps in flight show the animation; settled icons rest at identity
    fn in_flight(&self) -> bool {
        matches!(self.phase, Phase::Forward | Phase::Reverse)
    }
}

/// Turns an [`IconController`] into an [`IconFrame`] for one platform and size.
///
/// The last frame is kept and only recomputed when something that feeds it changed.
#[derive(Debug)]
pub struct IconPresentation {
    platform: Platform,
    size: f64,
    fit: bool,
    color: Color,
    bubbles: BubblesColor,
    circle: CircleColor,
    cached: Option<FrameKey>,
    frame: IconFrame,
    recomputes: usize,
}

impl IconPresentation {
    pub fn new(platform: Platform, size: f64) -> Result<Self, ConfigError> {
        if size <= 0.0 || !size.is_finite() {
            return Err(ConfigError::NonPositiveSize(size));
        }
        Ok(Self {
            platform,
            size,
            fit: true,
            color: Color::BLACK,
            bubbles: BubblesColor::default(),
            circle: CircleColor::default(),
            cached: None,
            frame: IconFrame {
                size,
                layers: Vec::new(),
                particles: None,
            },
            recomputes: 0,
        })
    }

    pub fn with_fit(mut self, fit: bool) -> Self {
        self.fit = fit;
        self.cached = None;
        self
    }

    /// Used when the controller has no color of its own
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self.cached = None;
        self
    }

    /// Palettes for [`AnimationKind::Particle`]
    pub fn with_particle_colors(mut self, bubbles: BubblesColor, circle: CircleColor) -> Self {
        self.bubbles = bubbles;
        self.circle = circle;
        self.cached = None;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn set_platform(&mut self, platform: Platform) {
        self.platform = platform;
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    /// How many times a frame was actually computed
    pub fn recomputes(&self) -> usize {
        self.recomputes
    }

    pub fn render(&mut self, controller: &IconController) -> &IconFrame {
        let key = FrameKey::of(controller, self.platform);
        if self.cached.as_ref() != Some(&key) {
            self.frame = self.compose(&key, controller);
            self.recomputes += 1;
            self.cached = Some(key);
        }
        &self.frame
    }

    fn layer(&self, icon: &AdaptiveIcon, color: Option<Color>, transform: IconTransform) -> IconLayer {
        let resolved = icon.resolve(self.platform, self.fit);
        IconLayer {
            glyph: resolved.glyph.clone(),
            color: color.unwrap_or(self.color),
            base_scale: resolved.scale,
            transform,
        }
    }

    fn compose(&self, key: &FrameKey, controller: &IconController) -> IconFrame {
        trace!("compose {} at {:.3} {:?}", key.icon.name, key.value, key.phase);
        let kind = key.animation.unwrap_or_default();
        let animation = if key.in_flight() {
            kind.transform(key.value)
        } else {
            IconTransform::IDENTITY
        };

        let mut layers = Vec::with_capacity(2);
        let mut particles = None;
        let transition = &controller.config().transition;
        let incoming = match &key.previous {
            Some((previous, previous_color))
                if key.in_flight() && transition.kind() != TransitionKind::None =>
            {
                let frame = transition.frame(key.value);
                if let Some(outgoing) = frame.outgoing {
                    layers.push(self.layer(previous, *previous_color, outgoing));
                }
                if transition.kind() == TransitionKind::Particle {
                    particles = transition.particle().map(|style| style.frame(key.value));
                    if kind.has_particles() {
                        // both already pop the icon in, scale once
                        return self.finish(layers, frame.incoming, key, particles);
                    }
                }
                frame.incoming.then(&animation)
            }
            _ => animation,
        };
        if particles.is_none() && key.in_flight() && kind.has_particles() {
            let style = ParticleStyle {
                size: self.size,
                bubbles: self.bubbles,
                circle: self.circle,
            };
            particles = Some(style.frame(key.value));
        }
        self.finish(layers, incoming, key, particles)
    }

    fn finish(
        &self,
        mut layers: Vec<IconLayer>,
        incoming: IconTransform,
        key: &FrameKey,
        particles: Option<ParticleFrame>,
    ) -> IconFrame {
        layers.push(self.layer(&key.icon, key.color, incoming));
        IconFrame {
            size: self.size,
            layers,
            particles,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::{
        catalog::{AnimationKind, IconTransform},
        color::Color,
        controller::{AnimationConfig, IconController},
        playback::tests::{FakeVsync, FRAME},
        transition::{TransitionConfig, TransitionKind},
    };

    use super::{AdaptiveIcon, GlyphRef, IconPresentation, Platform, ALTERNATE_FAMILY};

    fn controller(config: AnimationConfig) -> IconController {
        let mut controller = IconController::new(AdaptiveIcon::named("favorite"), config);
        controller.attach(Rc::new(FakeVsync::default())).unwrap();
        controller
    }

    fn ticks(controller: &mut IconController, n: usize) {
        for _ in 0..n {
            controller.tick(FRAME);
        }
    }

    #[test]
    fn resolve_per_platform() {
        let icon = AdaptiveIcon::new(
            "settings",
            GlyphRef::new("Material Icons", "settings"),
            GlyphRef::new(ALTERNATE_FAMILY, "gear"),
        )
        .with_alternate_fit_scale(1.2);

        let primary = icon.resolve(Platform::Primary, true);
        assert_eq!("settings", primary.glyph.name);
        assert_eq!(1.0, primary.scale);

        let fitted = icon.resolve(Platform::Alternate, true);
        assert_eq!("gear", fitted.glyph.name);
        assert_eq!(1.2, fitted.scale);
        assert_eq!(1.0, icon.resolve(Platform::Alternate, false).scale);
    }

    #[test]
    fn fit_scale_defaults_to_one() {
        let icon: AdaptiveIcon = serde_json::from_str(
            r#"{"name": "home",
                "primary": {"family": "Material Icons", "name": "home"},
                "alternate": {"family": "CupertinoIcons", "name": "house"}}"#,
        )
        .unwrap();
        assert_eq!(1.0, icon.alternate_fit_scale);
    }

    #[test]
    fn non_positive_size_rejected() {
        assert!(IconPresentation::new(Platform::Primary, 0.0).is_err());
    }

    #[test]
    fn idle_is_one_identity_layer() {
        let mut controller = controller(AnimationConfig::default());
        let mut presentation = IconPresentation::new(Platform::Primary, 48.0).unwrap();
        let frame = presentation.render(&controller);
        assert_eq!(1, frame.layers.len());
        assert_eq!(IconTransform::IDENTITY, frame.layers[0].transform);
        assert_eq!(None, frame.particles);
        controller.dispose();
    }

    #[test]
    fn particle_kind_draws_burst() {
        let mut controller = controller(AnimationConfig::default());
        let mut presentation = IconPresentation::new(Platform::Primary, 48.0).unwrap();
        controller.play(AnimationKind::Particle, false);
        ticks(&mut controller, 3);
        let frame = presentation.render(&controller);
        let particles = frame.particles.as_ref().expect("particles while playing");
        assert_eq!(48.0, particles.size);
        assert!(frame.layers[0].transform.scale.x < 1.0);

        ticks(&mut controller, 30);
        let frame = presentation.render(&controller);
        assert_eq!(None, frame.particles, "Burst outlived the sweep");
        assert_eq!(IconTransform::IDENTITY, frame.layers[0].transform);
        controller.dispose();
    }

    #[test]
    fn switch_transition_draws_both_icons() {
        let transition = TransitionConfig::builder(TransitionKind::SwitchTo)
            .build()
            .unwrap();
        let mut controller = controller(AnimationConfig {
            transition,
            ..Default::default()
        });
        let mut presentation = IconPresentation::new(Platform::Primary, 48.0).unwrap();
        controller.play_with_icon_transition(
            AnimationKind::None,
            AdaptiveIcon::named("favorite_filled"),
            Some(Color::RED),
            false,
        );
        ticks(&mut controller, 3);
        let frame = presentation.render(&controller);
        let names: Vec<_> = frame.layers.iter().map(|l| l.glyph.name.as_str()).collect();
        assert_eq!(vec!["favorite", "favorite_filled"], names);
        assert_eq!(Color::BLACK, frame.layers[0].color);
        assert_eq!(Color::RED, frame.layers[1].color);

        ticks(&mut controller, 30);
        let frame = presentation.render(&controller);
        assert_eq!(1, frame.layers.len());
        assert_eq!("favorite_filled", frame.layers[0].glyph.name);
        controller.dispose();
    }

    #[test]
    fn particle_transition_uses_its_own_style() {
        let transition = TransitionConfig::builder(TransitionKind::Particle)
            .particle_color(Color::RED)
            .particle_size(32.0)
            .build()
            .unwrap();
        let mut controller = controller(AnimationConfig {
            transition,
            ..Default::default()
        });
        let mut presentation = IconPresentation::new(Platform::Primary, 48.0).unwrap();
        controller.play_with_icon_transition(
            AnimationKind::Particle,
            AdaptiveIcon::named("favorite_filled"),
            Some(Color::RED),
            false,
        );
        ticks(&mut controller, 5);
        let frame = presentation.render(&controller);
        assert_eq!(32.0, frame.particles.as_ref().unwrap().size);
        let scale = frame.layers[0].transform.scale.x;
        let expected = crate::particle::content_scale(controller.value());
        assert!((scale - expected).abs() < 1e-12, "{scale} vs {expected}");
        assert!(frame.to_svg().contains("translate(8.00 8.00)"));
        controller.dispose();
    }

    #[test]
    fn unchanged_state_is_not_recomputed() {
        let mut controller = controller(AnimationConfig::default());
        let mut presentation = IconPresentation::new(Platform::Alternate, 48.0).unwrap();
        presentation.render(&controller);
        presentation.render(&controller);
        assert_eq!(1, presentation.recomputes());

        controller.play(AnimationKind::Pulse, false);
        controller.tick(FRAME);
        presentation.render(&controller);
        presentation.render(&controller);
        assert_eq!(2, presentation.recomputes());

        presentation.set_platform(Platform::Primary);
        presentation.render(&controller);
        assert_eq!(3, presentation.recomputes());
        controller.dispose();
    }

    #[test]
    fn fit_scales_alternate_glyph() {
        let mut controller = IconController::new(
            AdaptiveIcon::named("bell").with_alternate_fit_scale(0.5),
            AnimationConfig::default(),
        );
        controller.attach(Rc::new(FakeVsync::default())).unwrap();
        let mut presentation = IconPresentation::new(Platform::Alternate, 40.0).unwrap();
        let layer = presentation.render(&controller).layers[0].clone();
        assert_eq!(ALTERNATE_FAMILY, layer.glyph.family);
        // the center stays put, the corner moves halfway in
        let affine = layer.to_affine(40.0);
        assert_eq!(kurbo::Point::new(20.0, 20.0), affine * kurbo::Point::new(20.0, 20.0));
        assert_eq!(kurbo::Point::new(10.0, 10.0), affine * kurbo::Point::ZERO);
        controller.dispose();
    }

    #[test]
    fn svg_names_the_glyph() {
        let mut controller = controller(AnimationConfig::default());
        let mut presentation = IconPresentation::new(Platform::Primary, 24.0).unwrap();
        let svg = presentation.render(&controller).to_svg();
        assert!(svg.starts_with("<svg"), "{svg}");
        assert!(svg.contains(">favorite</text>"), "{svg}");
        controller.dispose();
    }
}
