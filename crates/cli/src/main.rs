use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facemoji_core::detection::domain::primary_face_selector::FaceSelection;
use facemoji_core::detection::infrastructure::recorded_face_detector::RecordedFaceDetector;
use facemoji_core::expression::domain::expression_event::ExpressionEvent;
use facemoji_core::expression::domain::expression_label::ExpressionLabel;
use facemoji_core::expression::domain::expression_state::NotifyPolicy;
use facemoji_core::overlay::infrastructure::cpu_overlay_compositor::CpuOverlayCompositor;
use facemoji_core::overlay::infrastructure::overlay_asset_loader::load_catalog;
use facemoji_core::pipeline::frame_pipeline::FramePipeline;
use facemoji_core::pipeline::frame_slot::OverlaySlot;
use facemoji_core::pipeline::infrastructure::capture_session::CaptureSession;
use facemoji_core::pipeline::pipeline_config::PipelineConfig;
use facemoji_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facemoji_core::shared::settings::Settings;
use facemoji_core::shared::video_metadata::frame_interval;
use facemoji_core::video::domain::frame_source::{CaptureError, FrameSource};
use facemoji_core::video::infrastructure::image_sequence_reader::ImageSequenceReader;
use facemoji_core::video::infrastructure::image_sequence_writer::ImageSequenceWriter;

/// Replaces faces in an image sequence with an emoji matching their expression.
#[derive(Parser)]
#[command(name = "facemoji")]
struct Cli {
    /// Input image or directory of frames.
    input: PathBuf,

    /// Directory to write rendered frames to.
    output: PathBuf,

    /// Recorded detector output (JSON track keyed by frame index).
    #[arg(long)]
    observations: PathBuf,

    /// Directory holding one overlay PNG per expression.
    #[arg(long)]
    assets: PathBuf,

    /// Classify every Nth frame (1 = every frame).
    #[arg(long)]
    throttle: Option<usize>,

    /// Event policy: always or on-change.
    #[arg(long)]
    notify: Option<NotifyPolicy>,

    /// Primary face policy: first or nearest.
    #[arg(long)]
    face_selection: Option<FaceSelection>,

    /// Overlay shown before the first classification (e.g. smile).
    #[arg(long)]
    initial: Option<ExpressionLabel>,

    /// Settings file (default: per-user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings to this file.
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Emulate a live camera: capture on a background thread and render
    /// only the newest frame at the render rate.
    #[arg(long)]
    live: bool,

    /// Render rate in frames per second.
    #[arg(long)]
    fps: Option<f64>,

    /// Camera rate for --live (default: the render rate).
    #[arg(long)]
    camera_fps: Option<f64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    apply_overrides(&mut settings, &cli);
    if let Some(path) = &cli.save_config {
        settings.save_to(path)?;
        log::info!("Saved settings to {}", path.display());
    }
    let config = PipelineConfig::from_settings(&settings)?;

    let catalog = load_catalog(&cli.assets)?;
    let initial = cli.initial.map(|label| catalog.lookup(label).clone());
    let detector = RecordedFaceDetector::from_file(&cli.observations)?;

    let mut pipeline = FramePipeline::new(
        Box::new(detector),
        Box::new(CpuOverlayCompositor::default()),
        catalog,
        &config,
    )
    .with_logger(Box::new(StdoutPipelineLogger::new(config.progress_every)))
    .with_overlay_slot(OverlaySlot::new(initial));
    let mut surface = ImageSequenceWriter::new(&cli.output);

    if cli.live {
        let camera_fps = cli.camera_fps.unwrap_or(config.render_fps);
        run_live(&cli.input, camera_fps, &config, &mut pipeline, &mut surface)?;
    } else {
        run_offline(&cli.input, &mut pipeline, &mut surface)?;
    }

    pipeline.summary();
    log::info!(
        "Wrote {} frames to {}",
        surface.frames_written(),
        cli.output.display()
    );
    Ok(())
}

/// Renders every frame in order.
fn run_offline(
    input: &Path,
    pipeline: &mut FramePipeline,
    surface: &mut ImageSequenceWriter,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = ImageSequenceReader::new(input);
    let metadata = reader
        .open()
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
    let mut announcer = Announcer::default();

    for (i, frame_result) in reader.frames().enumerate() {
        let frame = frame_result.map_err(|e| CaptureError::Source(e.to_string()))?;
        pipeline.run_cycle(&frame, surface)?;
        announcer.report(pipeline);
        pipeline.logger_mut().progress(i + 1, metadata.total_frames);
    }
    reader.close();
    Ok(())
}

/// Captures on a producer thread and renders the newest frame each tick.
fn run_live(
    input: &Path,
    camera_fps: f64,
    config: &PipelineConfig,
    pipeline: &mut FramePipeline,
    surface: &mut ImageSequenceWriter,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = ImageSequenceReader::new(input).with_fps(camera_fps);
    let mut session = CaptureSession::new(Box::new(reader));
    session.start()?;

    let tick = config.render_interval();
    let mut announcer = Announcer::default();
    while !(session.is_source_exhausted() && !session.has_pending_frame()) {
        if session.render_latest(pipeline, surface)? {
            announcer.report(pipeline);
        }
        std::thread::sleep(tick);
    }

    let source_error = session.source_error();
    session.stop();
    match source_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Logs queued expression events and the label whenever it changes.
#[derive(Default)]
struct Announcer {
    last_label: Option<ExpressionLabel>,
}

impl Announcer {
    fn report(&mut self, pipeline: &FramePipeline) {
        let events: Vec<ExpressionEvent> = pipeline.events().try_iter().collect();
        if !events.is_empty() {
            let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
            log::debug!("Events: {}", names.join(", "));
        }

        let state = pipeline.expression_state();
        let label = state
            .face_detected
            .then(|| ExpressionLabel::from_state(state));
        if label != self.last_label {
            match label {
                Some(l) => log::info!("Expression: {} {l}", l.glyph()),
                None => log::info!("Expression: no face"),
            }
            self.last_label = label;
        }
    }
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(throttle) = cli.throttle {
        settings.throttle_interval = throttle;
    }
    if let Some(policy) = cli.notify {
        settings.notify_policy = policy;
    }
    if let Some(selection) = cli.face_selection {
        settings.face_selection = selection;
    }
    if let Some(fps) = cli.fps {
        settings.render_fps = fps;
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if !cli.observations.is_file() {
        return Err(format!(
            "Observation track not found: {}",
            cli.observations.display()
        )
        .into());
    }
    if !cli.assets.is_dir() {
        return Err(format!("Asset directory not found: {}", cli.assets.display()).into());
    }
    if cli.throttle == Some(0) {
        return Err("Throttle must be at least 1".into());
    }
    if let Some(fps) = cli.camera_fps {
        if frame_interval(fps).is_none() {
            return Err(format!("Camera fps must be a usable positive rate, got {fps}").into());
        }
    }
    if cli.camera_fps.is_some() && !cli.live {
        return Err("--camera-fps only applies with --live".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["facemoji", "in", "out", "--observations", "o.json", "--assets", "a"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = parse(&[
            "--throttle",
            "3",
            "--notify",
            "on-change",
            "--face-selection",
            "nearest",
            "--fps",
            "12",
        ]);
        let mut settings = Settings::default();
        apply_overrides(&mut settings, &cli);

        assert_eq!(settings.throttle_interval, 3);
        assert_eq!(settings.notify_policy, NotifyPolicy::OnChange);
        assert_eq!(settings.face_selection, FaceSelection::Nearest);
        assert_eq!(settings.render_fps, 12.0);
    }

    #[test]
    fn test_absent_flags_keep_settings() {
        let cli = parse(&[]);
        let mut settings = Settings {
            throttle_interval: 5,
            ..Settings::default()
        };
        apply_overrides(&mut settings, &cli);
        assert_eq!(settings.throttle_interval, 5);
        assert_eq!(settings.notify_policy, NotifyPolicy::Always);
    }

    #[test]
    fn test_initial_label_parses_asset_name() {
        let cli = parse(&["--initial", "right_wink_open"]);
        assert_eq!(cli.initial, Some(ExpressionLabel::RightWinkOpen));
    }

    #[test]
    fn test_bad_policy_is_rejected() {
        let result = Cli::try_parse_from([
            "facemoji",
            "in",
            "out",
            "--observations",
            "o.json",
            "--assets",
            "a",
            "--notify",
            "sometimes",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_subnormal_camera_fps() {
        let dir = tempfile::tempdir().unwrap();
        let observations = dir.path().join("o.json");
        std::fs::write(&observations, "{}").unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let observations_arg = observations.to_str().unwrap();
        let cli = Cli::try_parse_from([
            "facemoji",
            dir_arg,
            "out",
            "--observations",
            observations_arg,
            "--assets",
            dir_arg,
            "--live",
            "--camera-fps",
            "1e-320",
        ])
        .unwrap();
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().starts_with("Camera fps"));
    }

    #[test]
    fn test_validate_reports_missing_input() {
        let cli = parse(&[]);
        let err = validate(&cli).unwrap_err();
        assert_eq!(err.to_string(), "Input not found: in");
    }
}
