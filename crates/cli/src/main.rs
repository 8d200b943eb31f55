use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use mattecam_core::io::domain::frame_source::FrameSource;
use mattecam_core::io::domain::presenter::Presenter;
use mattecam_core::io::infrastructure::image_directory_source::ImageDirectorySource;
use mattecam_core::io::infrastructure::image_file_presenter::ImageFilePresenter;
use mattecam_core::io::infrastructure::image_file_source::ImageFileSource;
use mattecam_core::pipeline::analyze_image_use_case::AnalyzeImageUseCase;
use mattecam_core::pipeline::frame_scheduler::FrameScheduler;
use mattecam_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use mattecam_core::segmentation::domain::mask_compositor::MaskCompositor;
use mattecam_core::segmentation::domain::segmentation_analyzer::SegmentationAnalyzer;
use mattecam_core::segmentation::domain::tensor_encoder::TensorEncoder;
use mattecam_core::segmentation::infrastructure::onnx_mask_engine::OnnxMaskEngine;
use mattecam_core::shared::constants::{
    DEFAULT_MASK_CUTOFF, DEFAULT_TICK_INTERVAL_MS, MODEL_INPUT_SIZE, U2NET_MODEL_NAME,
    U2NET_MODEL_URL,
};
use mattecam_core::shared::model_resolver;

/// Background removal for still images and frame sequences.
#[derive(Parser)]
#[command(name = "mattecam")]
struct Cli {
    /// Input image file, or a directory of frames with --stream.
    input: PathBuf,

    /// Output composite PNG, or a directory for numbered composites with
    /// --stream.
    output: PathBuf,

    /// Path to the segmentation model (ONNX). Resolved from cache or
    /// downloaded when omitted.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Mask cutoff threshold (0.0-1.0); mask values at or below it become
    /// fully transparent.
    #[arg(long, default_value_t = DEFAULT_MASK_CUTOFF)]
    cutoff: f32,

    /// Treat input as a directory of frames and sample it periodically.
    #[arg(long)]
    stream: bool,

    /// Sampling interval in milliseconds (stream mode).
    #[arg(long, default_value_t = DEFAULT_TICK_INTERVAL_MS)]
    interval_ms: u64,

    /// How long to keep sampling, in seconds (stream mode).
    #[arg(long, default_value = "10")]
    run_for: u64,

    /// Start over from the first frame when the directory is exhausted
    /// (stream mode).
    #[arg(long)]
    loop_frames: bool,
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

    let analyzer = build_analyzer(&cli)?;

    if cli.stream {
        run_stream(&cli, analyzer)
    } else {
        run_single(&cli, analyzer)
    }
}

fn run_single(
    cli: &Cli,
    analyzer: SegmentationAnalyzer,
) -> Result<(), Box<dyn std::error::Error>> {
    let source: Box<dyn FrameSource> = Box::new(ImageFileSource::new(&cli.input));
    let presenter: Box<dyn Presenter> = Box::new(ImageFilePresenter::single(&cli.output));

    let mut use_case = AnalyzeImageUseCase::new(source, Box::new(analyzer), presenter);
    use_case.execute()?;
    log::info!("Composite written to {}", cli.output.display());
    Ok(())
}

fn run_stream(
    cli: &Cli,
    analyzer: SegmentationAnalyzer,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = ImageDirectorySource::new(&cli.input, cli.loop_frames)?;
    log::info!(
        "Streaming {} frames from {} every {}ms",
        source.frame_count(),
        cli.input.display(),
        cli.interval_ms
    );
    let presenter: Box<dyn Presenter> = Box::new(ImageFilePresenter::sequence(&cli.output));

    let mut scheduler = FrameScheduler::new(
        Box::new(source),
        Box::new(analyzer),
        presenter,
        Box::new(StdoutPipelineLogger::default()),
    );
    scheduler.start(Duration::from_millis(cli.interval_ms))?;
    std::thread::sleep(Duration::from_secs(cli.run_for));
    scheduler.stop();

    log::info!(
        "Presented {} composites to {} ({} ticks dropped)",
        scheduler.completed_cycles(),
        cli.output.display(),
        scheduler.dropped_ticks()
    );
    Ok(())
}

fn build_analyzer(cli: &Cli) -> Result<SegmentationAnalyzer, Box<dyn std::error::Error>> {
    let model_path = match &cli.model {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {U2NET_MODEL_NAME}");
            let path = model_resolver::resolve(
                U2NET_MODEL_NAME,
                U2NET_MODEL_URL,
                None,
                Some(Box::new(download_progress)),
            )?;
            eprintln!();
            path
        }
    };

    let mut analyzer = SegmentationAnalyzer::new(
        TensorEncoder::new(MODEL_INPUT_SIZE, MODEL_INPUT_SIZE),
        Box::new(OnnxMaskEngine::from_file(model_path)),
        MaskCompositor::new(cli.cutoff),
    );
    // Load eagerly: a bad model should fail the run here, not on the first
    // sampled frame.
    analyzer.warm_up()?;
    Ok(analyzer)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if cli.stream && !cli.input.is_dir() {
        return Err("--stream requires the input to be a directory of frames".into());
    }
    if !cli.stream && cli.input.is_dir() {
        return Err(format!(
            "{} is a directory; pass --stream to sample it",
            cli.input.display()
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.cutoff) {
        return Err(format!("Cutoff must be between 0.0 and 1.0, got {}", cli.cutoff).into());
    }
    if cli.interval_ms == 0 {
        return Err("Interval must be at least 1 millisecond".into());
    }
    if let Some(model) = &cli.model {
        if !model.exists() {
            return Err(format!("Model file not found: {}", model.display()).into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading segmentation model... {pct}%");
    } else {
        eprint!("\rDownloading segmentation model... {downloaded} bytes");
    }
}
