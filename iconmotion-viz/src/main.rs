//! Writes an svg to help visualize motion: the curve catalog, then the particle burst over time

use std::fmt::Write;
use std::fs;

use clap::Parser;
use iconmotion::{
    color::nth_series_color,
    ease::Curve,
    particle::{content_scale, ParticleStyle},
};
use kurbo::{BezPath, Point};
use ordered_float::OrderedFloat;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Plot box edge, progress and value are scaled to this
const PLOT: f64 = 100.0;

#[derive(Parser)]
struct Args {
    /// Samples per curve
    #[arg(long)]
    #[clap(default_value_t = 60)]
    samples: usize,

    /// Particle frames drawn below the plot
    #[arg(long)]
    #[clap(default_value_t = 11)]
    particle_frames: usize,

    #[arg(long)]
    #[clap(default_value = "/tmp/curves.svg")]
    out_file: String,
}

/// Svg is y-down, plots read better y-up
fn y_up_to_y_down(value: f64) -> f64 {
    PLOT - value * PLOT
}

pub fn main() {
    let args = Args::parse();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Unable to install logging");
    assert!(args.samples > 1, "Need at least two samples");

    let mut series: Vec<(&str, Box<dyn Fn(f64) -> f64>)> = Curve::NAMED
        .iter()
        .map(|(name, curve)| {
            let curve = *curve;
            (*name, Box::new(move |t: f64| curve.transform(t)) as Box<dyn Fn(f64) -> f64>)
        })
        .collect();
    series.push(("particle content", Box::new(content_scale)));

    let sampled: Vec<Vec<Point>> = series
        .iter()
        .map(|(_, f)| {
            (0..=args.samples)
                .map(|i| {
                    let t = i as f64 / args.samples as f64;
                    Point::new(t, f(t))
                })
                .collect()
        })
        .collect();

    // overshooting curves leave [0, 1]
    let (min, max) = sampled
        .iter()
        .flatten()
        .map(|p| (OrderedFloat(p.y), OrderedFloat(p.y)))
        .reduce(|(lo, hi), (v0, v1)| (lo.min(v0), hi.max(v1)))
        .expect("Curves have samples");
    let value_top = y_up_to_y_down(max.0.max(1.0));
    let value_bottom = y_up_to_y_down(min.0.min(0.0));
    let margin = 0.1 * PLOT;

    let particle_size = PLOT / 4.0;
    let strip_height = if args.particle_frames > 0 {
        particle_size + margin
    } else {
        0.0
    };
    let strip_width = args.particle_frames as f64 * particle_size;
    let width = PLOT.max(strip_width) + 2.0 * margin;
    let height = value_bottom - value_top + 2.0 * margin + strip_height;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg viewBox=\"{:.2} {:.2} {:.2} {:.2}\" version=\"1.1\" xmlns=\"http://www.w3.org/2000/svg\" >",
        -margin,
        value_top - margin,
        width,
        height
    );
    let _ = writeln!(
        svg,
        "  <rect x=\"0\" y=\"0\" width=\"{PLOT}\" height=\"{PLOT}\" fill=\"none\" stroke=\"#ccc\" stroke-width=\"0.2\" />"
    );

    for (i, ((name, _), points)) in series.iter().zip(sampled.iter()).enumerate() {
        let color = nth_series_color(i).to_hex_rgb();
        let mut path = BezPath::new();
        for (j, p) in points.iter().enumerate() {
            let p = Point::new(p.x * PLOT, y_up_to_y_down(p.y));
            if j == 0 {
                path.move_to(p);
            } else {
                path.line_to(p);
            }
        }
        let _ = writeln!(svg, "\n  <!-- {name} -->");
        let _ = writeln!(
            svg,
            "  <path fill=\"none\" stroke=\"{color}\" stroke-width=\"0.4\" d=\"{}\" />",
            path.to_svg()
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{:.2}\" y=\"{:.2}\" font-size=\"3\" fill=\"{color}\">{name}</text>",
            PLOT + 2.0,
            value_top + 4.0 * (i + 1) as f64
        );
    }

    if args.particle_frames > 0 {
        let style = ParticleStyle::new(particle_size, Default::default(), Default::default())
            .expect("Positive size");
        let denominator = (args.particle_frames - 1).max(1) as f64;
        let top = value_bottom + margin;
        for i in 0..args.particle_frames {
            let progress = i as f64 / denominator;
            let _ = writeln!(
                svg,
                "  <g transform=\"translate({:.2} {top:.2})\">\n{}  </g>",
                i as f64 * particle_size,
                style.frame(progress).to_svg()
            );
        }
    }
    svg.push_str("</svg>\n");

    fs::write(&args.out_file, svg).expect("write");
    info!("Wrote {}", args.out_file);
}
