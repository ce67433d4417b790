use std::path::PathBuf;
use std::process::ExitCode;

use alphagif_rs::image_pipeline::{
    ConversionConfig, ConversionError, ConversionTask, DisposalMode, DitherMode, FrameSource,
    FramesToGifPipeline, ProgressStage,
};
use alphagif_rs::logger;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

/// Turn a folder of still frames into a looping GIF with clean transparency
#[derive(Parser, Debug)]
#[command(name = "alphagif", version, about)]
struct Args {
    /// Folder holding the frames (png, jpg, jpeg, bmp, tiff)
    input_dir: PathBuf,

    /// Where to write the animation
    #[arg(short, long, default_value = "animation.gif")]
    output: PathBuf,

    /// Display time of each frame in milliseconds (1-1000)
    #[arg(long, default_value_t = 40)]
    duration: u32,

    /// Palette size per frame, transparent slot included (2-256)
    #[arg(long, default_value_t = 256)]
    colors: u16,

    /// Scale factor applied to every frame (0.1-1.0)
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// none | floyd-steinberg
    #[arg(long, default_value = "floyd-steinberg", value_parser = parse_dither)]
    dither: DitherMode,

    /// none | keep | clear | previous
    #[arg(long, default_value = "clear", value_parser = parse_disposal)]
    disposal: DisposalMode,

    /// Approximate palettes and pixels for a smaller file
    #[arg(long)]
    lossy: bool,

    /// Process frames one at a time
    #[arg(long)]
    sequential: bool,

    /// Log debug output and stage timings
    #[arg(short, long)]
    verbose: bool,
}

fn parse_dither(value: &str) -> Result<DitherMode, String> {
    value.parse().map_err(|e: ConversionError| e.to_string())
}

fn parse_disposal(value: &str) -> Result<DisposalMode, String> {
    value.parse().map_err(|e: ConversionError| e.to_string())
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = ConversionConfig::builder()
        .frame_duration_ms(args.duration)
        .color_count(args.colors)
        .resize_factor(args.scale)
        .dither(args.dither)
        .disposal(args.disposal)
        .lossy(args.lossy)
        .parallel(!args.sequential)
        .build();

    let pipeline = FramesToGifPipeline::new(config).context("invalid settings")?;
    info!("Settings: {:?}", pipeline.config());

    let (task, events) = ConversionTask::spawn(
        pipeline,
        FrameSource::Folder(args.input_dir.clone()),
        &args.output,
    )?;

    for event in events.iter() {
        // Failures surface through `wait`
        if event.stage != ProgressStage::Failed {
            info!("[{:>3}%] {}", event.percent, event.message);
        }
    }

    let summary = task
        .wait()
        .with_context(|| format!("converting {}", args.input_dir.display()))?;

    info!(
        "Created {} ({} frames, {}x{}, {} bytes)",
        args.output.display(),
        summary.frame_count,
        summary.width,
        summary.height,
        summary.bytes_written
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init_with_level(if args.verbose { "debug" } else { "info" });

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
