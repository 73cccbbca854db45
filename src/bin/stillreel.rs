use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stillreel", version, about = "Turn a folder of images into an MP4 video")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode every image of a folder into `<DIR>/<NAME>.mp4` (requires `ffmpeg` on PATH).
    Encode(EncodeArgs),
    /// Print the images of a folder in encoding order.
    List(ListArgs),
}

#[derive(Parser, Debug)]
struct EncodeArgs {
    /// Folder holding the images.
    dir: PathBuf,

    /// Output base name, without `.mp4`.
    #[arg(long, default_value = "output")]
    name: String,

    /// Frame rate, either an integer (`10`) or a rational (`30000/1001`).
    #[arg(long, default_value = "10")]
    fps: stillreel::Fps,

    /// Audio track to mux in, cut to the video duration.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Settings JSON file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Video codec (overrides the settings file).
    #[arg(long, value_enum)]
    codec: Option<CodecChoice>,

    /// How images whose size differs from the first one are handled.
    #[arg(long, value_enum)]
    policy: Option<PolicyChoice>,

    /// Fail instead of replacing an existing output file.
    #[arg(long)]
    no_overwrite: bool,
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Folder holding the images.
    dir: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CodecChoice {
    Mpeg4,
    H264,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyChoice {
    Reject,
    Fit,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.cmd {
        Command::Encode(args) => cmd_encode(args),
        Command::List(args) => cmd_list(&args.dir).map(|()| ExitCode::SUCCESS),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stillreel=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_settings(args: &EncodeArgs) -> anyhow::Result<stillreel::Settings> {
    let mut settings = match &args.config {
        Some(path) => stillreel::Settings::from_path(path)
            .with_context(|| format!("load settings '{}'", path.display()))?,
        None => stillreel::Settings::default(),
    };
    if let Some(codec) = args.codec {
        settings.codec = match codec {
            CodecChoice::Mpeg4 => stillreel::VideoCodec::Mpeg4,
            CodecChoice::H264 => stillreel::VideoCodec::H264,
        };
    }
    if let Some(policy) = args.policy {
        settings.geometry_policy = match policy {
            PolicyChoice::Reject => stillreel::GeometryPolicy::Reject,
            PolicyChoice::Fit => stillreel::GeometryPolicy::Fit,
        };
    }
    if args.no_overwrite {
        settings.overwrite = false;
    }
    Ok(settings)
}

fn cmd_encode(args: EncodeArgs) -> anyhow::Result<ExitCode> {
    let coordinator = stillreel::Coordinator::with_ffmpeg(load_settings(&args)?)?;

    let mut job = stillreel::EncodingJob::new(&args.dir, args.fps).with_output_name(&args.name);
    if let Some(audio) = &args.audio {
        job = job.with_audio(audio);
    }

    let handle = coordinator
        .start(job)
        .with_context(|| format!("start encoding '{}'", args.dir.display()))?;
    let mut drew_bar = false;
    let timeout = coordinator.settings().completion_timeout();
    let outcome = handle.wait(timeout, |percent| {
        draw_progress(percent);
        drew_bar = true;
    })?;
    if drew_bar {
        eprintln!();
    }

    println!("{}", outcome.message());
    Ok(match outcome {
        stillreel::JobOutcome::Failed { .. } => ExitCode::FAILURE,
        stillreel::JobOutcome::Success { .. } | stillreel::JobOutcome::NoImages => {
            ExitCode::SUCCESS
        }
    })
}

fn draw_progress(percent: u8) {
    const WIDTH: usize = 30;
    let filled = usize::from(percent) * WIDTH / 100;
    let mut err = std::io::stderr().lock();
    let _ = write!(
        err,
        "\r[{}{}] {percent:>3}%",
        "#".repeat(filled),
        " ".repeat(WIDTH - filled)
    );
    let _ = err.flush();
}

fn cmd_list(dir: &Path) -> anyhow::Result<()> {
    let images = stillreel::list_images(dir)
        .with_context(|| format!("list images in '{}'", dir.display()))?;
    let mut out = std::io::stdout().lock();
    for path in images {
        writeln!(out, "{}", path.display())?;
    }
    Ok(())
}
