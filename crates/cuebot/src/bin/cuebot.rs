//! cuebot CLI: measure single frames or drive the robot from a frame loop.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use cuebot::core::{init_with_level, BallMeasurement, CalibrationConfig};
use cuebot::detect;
use cuebot::robot::{CommandSink, DispatchController, HttpDispatcher};
use cuebot::{FramePipeline, RunError, Trigger};
use log::LevelFilter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(name = "cuebot")]
#[command(about = "Calibrate a table from printed markers, measure balls and dispatch the robot")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit structured JSON logs through `tracing` instead of the plain logger.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure the balls in one image and print a JSON report.
    Measure(MeasureArgs),

    /// Process frames and act on hold/polar/cartesian/strike/quit lines from stdin.
    Run(RunArgs),

    /// Write the default configuration as JSON.
    DefaultConfig {
        /// Destination file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct MeasureArgs {
    /// Session configuration (JSON). Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input frame.
    #[arg(long)]
    image: PathBuf,

    /// Write the report here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write an annotated overlay image.
    #[arg(long)]
    annotate: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Session configuration (JSON). Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pause between frames.
    #[arg(long, default_value = "100")]
    interval_ms: u64,

    /// Cycle through the frames until `quit`.
    #[arg(long)]
    repeat: bool,

    /// Image files or directories of images.
    frames: Vec<PathBuf>,
}

/// Work handed to the dispatch task.
#[derive(Debug)]
enum Action {
    Hold(Vec<BallMeasurement>),
    Polar,
    Cartesian,
    Strike(u32),
}

#[tokio::main]
async fn main() -> Result<(), RunError> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Commands::Measure(args) => measure(args),
        Commands::Run(args) => run(args).await,
        Commands::DefaultConfig { out } => default_config(out),
    }
}

fn init_logging(cli: &Cli) {
    #[cfg(feature = "tracing")]
    if cli.log_json {
        if !cuebot::core::init_tracing(true) {
            eprintln!("a tracing subscriber is already installed");
        }
        return;
    }
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if let Err(e) = init_with_level(level) {
        eprintln!("logger already installed: {e}");
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<CalibrationConfig, RunError> {
    match path {
        Some(p) => Ok(CalibrationConfig::load_json(p)?),
        None => Ok(CalibrationConfig::default()),
    }
}

fn measure(args: MeasureArgs) -> Result<(), RunError> {
    let cfg = load_config(args.config.as_ref())?;
    let (frame, analysis) = detect::measure_file(&args.image, &cfg)?;

    for (i, m) in analysis.measurements.iter().enumerate() {
        log::info!(
            "ball {i}: distance {:.2} cm, angle {:.2} deg, X {:.2} cm, Y {:.2} cm",
            m.distance_cm,
            m.angle_deg,
            m.x_cm,
            m.y_cm
        );
    }
    if let Some(stage) = analysis.stopped_at() {
        log::info!("pipeline stopped at {stage:?}");
    }

    if let Some(path) = &args.annotate {
        detect::write_overlay(path, &frame, &analysis)?;
    }

    let report = analysis.report(frame.width(), frame.height());
    match &args.out {
        Some(path) => detect::write_report(path, &report)?,
        None => {
            let json = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
            println!("{json}");
        }
    }
    Ok(())
}

fn default_config(out: Option<PathBuf>) -> Result<(), RunError> {
    let cfg = CalibrationConfig::default();
    match out {
        Some(path) => cfg.write_json(path)?,
        None => {
            let json = serde_json::to_string_pretty(&cfg).map_err(std::io::Error::from)?;
            println!("{json}");
        }
    }
    Ok(())
}

async fn run(args: RunArgs) -> Result<(), RunError> {
    let cfg = load_config(args.config.as_ref())?;
    let frames = detect::list_frames(&args.frames)?;
    let pipeline = FramePipeline::new(&cfg);
    let controller = DispatchController::new(
        HttpDispatcher::new(&cfg.device)?,
        cfg.physical.clone(),
        cfg.dispatch.clone(),
    );

    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(dispatch_worker(Arc::new(controller), action_rx));
    let mut triggers = spawn_stdin_reader();

    let interval = Duration::from_millis(args.interval_ms);
    let mut latest: Vec<BallMeasurement> = Vec::new();
    let mut quit = false;

    'frames: loop {
        for path in &frames {
            let frame = match detect::load_frame(path) {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("skipping {}: {e}", path.display());
                    continue;
                }
            };
            let analysis = pipeline.process(&frame);
            log::info!(
                "{}: {} ball(s), {} measured",
                path.display(),
                analysis.balls.len(),
                analysis.measurements.len()
            );
            latest = analysis.measurements;

            while let Ok(trigger) = triggers.try_recv() {
                if !forward(trigger, &latest, &action_tx) {
                    quit = true;
                    break 'frames;
                }
            }
            tokio::time::sleep(interval).await;
        }
        if !args.repeat || frames.is_empty() {
            break;
        }
    }

    if !quit {
        while let Some(trigger) = triggers.recv().await {
            if !forward(trigger, &latest, &action_tx) {
                break;
            }
        }
    }

    drop(action_tx);
    if let Err(e) = worker.await {
        log::error!("dispatch task failed: {e}");
    }
    Ok(())
}

/// Translate an operator trigger into a dispatch action. `false` on quit.
fn forward(
    trigger: Trigger,
    latest: &[BallMeasurement],
    actions: &mpsc::UnboundedSender<Action>,
) -> bool {
    let action = match trigger {
        Trigger::Hold => Action::Hold(latest.to_vec()),
        Trigger::Polar => Action::Polar,
        Trigger::Cartesian => Action::Cartesian,
        Trigger::Strike { charge_duration_ms } => Action::Strike(charge_duration_ms),
        Trigger::Quit => return false,
    };
    if actions.send(action).is_err() {
        log::error!("dispatch task is gone");
        return false;
    }
    true
}

/// Runs actions in arrival order so a slow device never blocks the frame loop.
async fn dispatch_worker<S: CommandSink>(
    controller: Arc<DispatchController<S>>,
    mut actions: mpsc::UnboundedReceiver<Action>,
) {
    let mut deferred: Vec<JoinHandle<()>> = Vec::new();
    while let Some(action) = actions.recv().await {
        match action {
            Action::Hold(measurements) => {
                let n = controller.hold(&measurements);
                println!("held {n} measurement(s)");
            }
            Action::Polar => {
                if let Some(handle) = controller.dispatch_polar().await {
                    track_deferred(&mut deferred, handle);
                }
            }
            Action::Cartesian => {
                for (x, y) in controller.dispatch_cartesian() {
                    println!("X: {x:.2} cm, Y: {y:.2} cm");
                }
            }
            Action::Strike(ms) => {
                controller.strike(ms).await;
            }
        }
    }
    for handle in deferred {
        let _ = handle.await;
    }
}

/// Keep `handle` for the shutdown join, dropping translations already done.
fn track_deferred(deferred: &mut Vec<JoinHandle<()>>, handle: JoinHandle<()>) {
    deferred.retain(|h| !h.is_finished());
    deferred.push(handle);
}

fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<Trigger> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Trigger>() {
                Ok(trigger) => {
                    if tx.send(trigger).is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("{e}"),
            }
        }
    });
    rx
}
