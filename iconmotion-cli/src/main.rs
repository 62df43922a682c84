use std::cell::Cell;
use std::fmt::Write;
use std::rc::Rc;
use std::time::Duration;
use std::{fs, io, path::Path};

use clap::Parser;
use clap::ValueEnum;
use iconmotion::command::{parse_command, Command};
use iconmotion::playback::TickerId;
use iconmotion::{
    AdaptiveIcon, AnimationConfig, AnimationKind, IconController, IconPresentation, Phase,
    Platform, VsyncProvider,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Clap-friendly version of [Platform]
#[derive(ValueEnum, Clone, Debug)]
pub enum CliPlatform {
    Primary,
    Alternate,
}

impl CliPlatform {
    fn to_lib(&self) -> Platform {
        match self {
            CliPlatform::Primary => Platform::Primary,
            CliPlatform::Alternate => Platform::Alternate,
        }
    }
}

#[derive(Parser)]
struct Args {
    /// Whether to emit additional debug info
    #[arg(long)]
    debug: bool,

    /// E.g. "Play particle then switch to favorite_filled color #f44336"
    #[arg(long)]
    command: String,

    /// The icon showing before the command runs
    #[arg(long)]
    #[clap(default_value = "favorite")]
    icon: String,

    #[clap(value_enum)]
    #[arg(long, default_value = "primary")]
    platform: CliPlatform,

    /// Scale applied to the alternate glyph to match the primary's optical size
    #[arg(long)]
    fit_scale: Option<f64>,

    /// Frames in the filmstrip
    #[arg(long)]
    #[clap(default_value_t = 20)]
    frames: usize,

    #[arg(long)]
    #[clap(default_value_t = 60.0)]
    fps: f64,

    /// Ticks between filmstrip frames
    #[arg(long)]
    #[clap(default_value_t = 1)]
    every: usize,

    /// Stop playback before rendering this filmstrip frame
    #[arg(long)]
    stop_at: Option<usize>,

    /// Edge length of each frame
    #[arg(long)]
    #[clap(default_value_t = 48.0)]
    size: f64,

    /// Json animation config, missing fields take defaults
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    #[clap(default_value = "filmstrip.svg")]
    out_file: String,

    /// Also write the playback state of every frame as json beside the svg
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Unable to read config: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

fn load_config(path: Option<&str>) -> Result<AnimationConfig, ConfigFileError> {
    let Some(path) = path else {
        return Ok(AnimationConfig::default());
    };
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Stands in for a display's vsync; the filmstrip clock is simulated
#[derive(Default)]
struct SimulatedVsync {
    next: Cell<u64>,
}

impl VsyncProvider for SimulatedVsync {
    fn create_ticker(&self) -> TickerId {
        let id = TickerId(self.next.get());
        self.next.set(id.0 + 1);
        debug!("create {id:?}");
        id
    }

    fn release_ticker(&self, ticker: TickerId) {
        debug!("release {ticker:?}");
    }
}

#[derive(Serialize)]
struct FrameRecord {
    frame: usize,
    elapsed_ms: f64,
    progress: f64,
    value: f64,
    phase: Phase,
    animation: Option<AnimationKind>,
    icon: String,
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.debug { "debug" } else { "info" }));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Unable to install logging");

    let config = load_config(args.config.as_deref())
        .unwrap_or_else(|e| panic!("Unable to load --config: {e}"));
    let command = parse_command(&args.command)
        .unwrap_or_else(|e| panic!("Unable to parse '{}': {e}", args.command));
    let Command::Play(play) = command else {
        panic!("Stop has nothing to stop, use --stop-at to stop a Play");
    };
    assert!(args.fps > 0.0, "--fps must be > 0");
    let frame_time = Duration::from_secs_f64(1.0 / args.fps);

    let mut icon = AdaptiveIcon::named(&args.icon);
    if let Some(scale) = args.fit_scale {
        icon = icon.with_alternate_fit_scale(scale);
    }
    let mut controller = IconController::new(icon, config);
    controller
        .attach(Rc::new(SimulatedVsync::default()))
        .expect("Fresh controller must attach");
    controller.on_icon_transition(|to, color| {
        info!(
            "Switched to {} {}",
            to.name,
            color.map(|c| c.to_string()).unwrap_or_default()
        )
    });

    let mut presentation = IconPresentation::new(args.platform.to_lib(), args.size)
        .unwrap_or_else(|e| panic!("Invalid --size: {e}"));

    controller.request(play.request());

    let mut strip = String::new();
    let mut records = Vec::new();
    let mut ticks = 0;
    for frame in 0..args.frames {
        if frame > 0 {
            for _ in 0..args.every {
                controller.tick(frame_time);
                ticks += 1;
            }
        }
        if args.stop_at == Some(frame) {
            controller.stop();
        }
        let rendered = presentation.render(&controller);
        let _ = writeln!(
            strip,
            "<g transform=\"translate({:.2} 0)\">\n{}</g>",
            frame as f64 * args.size,
            rendered.svg_body()
        );
        let state = controller.playback_state();
        records.push(FrameRecord {
            frame,
            elapsed_ms: (frame_time * ticks).as_secs_f64() * 1000.0,
            progress: state.progress,
            value: controller.value(),
            phase: state.phase,
            animation: controller.current_animation(),
            icon: controller.current_icon().name.clone(),
        });
    }
    info!(
        "Rendered {} frames, {} recomputed",
        args.frames,
        presentation.recomputes()
    );

    let width = args.frames as f64 * args.size;
    let svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{0}\" viewBox=\"0 0 {width} {0}\">\n{strip}</svg>\n",
        args.size
    );
    fs::write(&args.out_file, svg).unwrap();
    info!("Wrote {}", args.out_file);

    if args.json {
        let json_out = Path::new(&args.out_file).with_extension("json");
        fs::write(&json_out, serde_json::to_string_pretty(&records).unwrap()).unwrap();
        info!("Wrote {}", json_out.display());
    }

    controller.dispose();
}
