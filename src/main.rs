//! hsvmask CLI - HSV colour-range video masking
//!
//! Subcommands:
//! - `mask`: mask every frame of a video with a parameter file
//! - `preview`: mask a single frame and write the intermediate images
//! - `codecs`: list the codecs this machine can write

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use hsvmask::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "hsvmask", version, about = "Mask videos by HSV colour range")]
struct Cli {
    #[command(flatten)]
    tools: ToolArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ToolArgs {
    /// ffmpeg executable
    #[arg(long, global = true, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// ffprobe executable
    #[arg(long, global = true, default_value = "ffprobe")]
    ffprobe: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mask every frame of a video and write the result
    Mask {
        /// Input video
        #[arg(short, long)]
        input: PathBuf,

        /// Folder for the masked video (defaults to the input's folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON file with the 15 filter parameters
        #[arg(short = 'p', long = "params")]
        params: Option<PathBuf>,

        /// Frames to mask in parallel
        #[arg(long, default_value_t = 1)]
        batch: usize,
    },
    /// Mask one frame and write mask, masked and processed images as PNG
    Preview {
        /// Input video
        #[arg(short, long)]
        input: PathBuf,

        /// Folder for the images and the parameter dump (defaults to the input's folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON file with the filter parameters (defaults to the tuning start values)
        #[arg(short = 'p', long = "params")]
        params: Option<PathBuf>,

        /// Zero-based frame index
        #[arg(long, default_value_t = 0)]
        frame: u64,
    },
    /// List codecs a writer can be opened with
    Codecs,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let tools = FfmpegTools {
        ffmpeg: cli.tools.ffmpeg,
        ffprobe: cli.tools.ffprobe,
    };

    let result = match cli.command {
        Command::Mask {
            input,
            output,
            params,
            batch,
        } => mask_video(&tools, &input, output.as_deref(), params.as_deref(), batch),
        Command::Preview {
            input,
            output,
            params,
            frame,
        } => preview_frame(&tools, &input, output.as_deref(), params.as_deref(), frame),
        Command::Codecs => list_codecs(&tools),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn load_config(params: Option<&Path>) -> Result<FilterConfig> {
    let path = params.ok_or(ConfigError::Missing).map_err(explain_config_error)?;
    FilterConfig::load(path).map_err(explain_config_error)
}

fn explain_config_error(error: ConfigError) -> anyhow::Error {
    for violation in error.violations() {
        log::error!("  {}", violation);
    }
    match error.suggested_fix() {
        Some(fix) => anyhow::Error::new(error).context(fix),
        None => anyhow::Error::new(error),
    }
}

fn mask_video(
    tools: &FfmpegTools,
    input: &Path,
    output_dir: Option<&Path>,
    params: Option<&Path>,
    batch: usize,
) -> Result<()> {
    let config = load_config(params)?;
    let options = ExportOptions::new()
        .with_batch_size(batch)
        .with_progress(|update| {
            if let ProgressUpdate::FrameMasked { frames, percent, .. } = update {
                eprint!("\rMasked {} frames. Progress: {}%.", frames, percent);
                let _ = std::io::stderr().flush();
            }
        });

    let mut job = MaskJob::new(input, config).with_options(options);
    if let Some(dir) = output_dir {
        job = job.with_output_dir(dir);
    }
    let outcome = job
        .run(tools)
        .with_context(|| format!("Error processing video file {}", input.display()))?;
    eprintln!();

    let report = outcome.report;
    match report.status {
        ExportStatus::FinishedOk => {
            log::info!("Masked video saved to {}", outcome.output.display());
            Ok(())
        }
        ExportStatus::FinishedShortRead { frames } => {
            bail!(
                "Frame processing error on frame number {} of {}. Partial output kept at {}",
                frames,
                report.total_hint,
                outcome.output.display()
            )
        }
        ExportStatus::Running => bail!("Export stopped after {} frames", report.frames),
    }
}

fn preview_frame(
    tools: &FfmpegTools,
    input: &Path,
    output_dir: Option<&Path>,
    params: Option<&Path>,
    index: u64,
) -> Result<()> {
    let config = match params {
        Some(_) => load_config(params)?,
        None => FilterConfig::gui_defaults(),
    };

    let mut source = FfmpegSource::open(tools, input)
        .with_context(|| format!("Error reading video file {}", input.display()))?;
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let files = write_preview(&mut source, index, &config, input, &dir)?;
    for file in [&files.mask, &files.masked, &files.processed, &files.parameters] {
        log::info!("Wrote {}", file.display());
    }
    Ok(())
}

fn list_codecs(tools: &FfmpegTools) -> Result<()> {
    let available = FfmpegCodecProbe::new(tools.clone()).available_codecs();
    if available.is_empty() {
        bail!("No writable codecs found; is {} installed?", tools.ffmpeg.display());
    }
    for codec in available {
        println!("{}", codec);
    }
    Ok(())
}
