use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use kinetype::{
    CancelToken, ExportFormat, ExportRequest, ExportSettings, ExportTarget, Exporter, Fps,
    JobStatus, Platform, PlatformProfile, SceneDescription, StickerPack,
};

#[derive(Parser, Debug)]
#[command(name = "kinetype", version, about = "Animated text stickers")]
struct Cli {
    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Export an animated scene as GIF, APNG or MP4.
    Export(ExportArgs),
    /// Export every sticker of a pack into a directory.
    Pack(PackArgs),
    /// Print format, size, frame count and loop count of an artifact.
    Probe(ProbeArgs),
    /// List the built-in platform profiles.
    Profiles(ProfilesArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Time in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct TimingArgs {
    /// Export settings JSON. Flags below override it.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Duration in seconds.
    #[arg(long)]
    duration: Option<f64>,

    /// Frames per second.
    #[arg(long)]
    fps: Option<u32>,
}

impl TimingArgs {
    fn resolve(&self, base: ExportSettings) -> anyhow::Result<ExportSettings> {
        let mut settings = match &self.settings {
            Some(p) => ExportSettings::from_path(p)?,
            None => base,
        };
        if let Some(d) = self.duration {
            settings.duration_secs = d;
        }
        if let Some(n) = self.fps {
            settings.fps = Fps::per_second(n)?;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path.
    #[arg(long)]
    out: PathBuf,

    /// Output format (gif, apng, mp4, webp). Defaults to the output extension.
    #[arg(long, conflicts_with_all = ["platform", "profile"])]
    format: Option<ExportFormat>,

    /// Built-in platform profile (whatsapp, telegram, instagram, imessage, generic).
    #[arg(long, conflicts_with = "profile")]
    platform: Option<Platform>,

    /// Custom platform profile JSON.
    #[arg(long)]
    profile: Option<PathBuf>,

    #[command(flatten)]
    timing: TimingArgs,
}

#[derive(Parser, Debug)]
struct PackArgs {
    /// Input pack JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,

    #[command(flatten)]
    timing: TimingArgs,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Artifact to inspect.
    path: PathBuf,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ProfilesArgs {
    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
        Command::Pack(args) => cmd_pack(args),
        Command::Probe(args) => cmd_probe(args),
        Command::Profiles(args) => cmd_profiles(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_scene(path: &Path) -> anyhow::Result<SceneDescription> {
    let scene = SceneDescription::from_path(path)
        .with_context(|| format!("load scene '{}'", path.display()))?;
    scene.validate()?;
    Ok(scene)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.in_path)?;
    Exporter::new().export_still(&scene, args.time, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.in_path)?;

    let target = if let Some(p) = &args.profile {
        ExportTarget::Platform(PlatformProfile::from_path(p)?)
    } else if let Some(p) = args.platform {
        ExportTarget::from(p)
    } else {
        let format = match args.format {
            Some(f) => f,
            None => ExportFormat::from_path(&args.out).with_context(|| {
                format!(
                    "cannot infer format from '{}'; pass --format",
                    args.out.display()
                )
            })?,
        };
        ExportTarget::Format(format)
    };

    let base = match target {
        ExportTarget::Format(ExportFormat::Video) => ExportSettings::video(),
        _ => ExportSettings::default(),
    };
    let settings = args.timing.resolve(base)?;

    let req = ExportRequest::new(scene, target, &args.out).with_settings(settings);
    let mut last_tenth = 0u64;
    let job = Exporter::new().export_with(&req, &CancelToken::new(), &mut |job| {
        let tenth = (job.progress() * 10.0).floor() as u64;
        if tenth > last_tenth {
            last_tenth = tenth;
            tracing::info!(progress = job.progress(), "exporting");
        }
    });

    match job.status() {
        JobStatus::Succeeded => {
            eprintln!(
                "wrote {} ({} frames, {} bytes)",
                job.output().display(),
                job.total_frames(),
                job.byte_len().unwrap_or(0)
            );
            Ok(())
        }
        JobStatus::Failed { kind, message } => anyhow::bail!("export failed ({kind}): {message}"),
        other => anyhow::bail!("export ended in non-terminal state {other:?}"),
    }
}

fn cmd_pack(args: PackArgs) -> anyhow::Result<()> {
    let pack = StickerPack::from_path(&args.in_path)?;
    let settings = args.timing.resolve(ExportSettings::default())?;
    let report = Exporter::new().export_pack(&pack, &args.out_dir, settings, &CancelToken::new())?;
    for job in &report.jobs {
        match job.status() {
            JobStatus::Succeeded => eprintln!("wrote {}", job.output().display()),
            JobStatus::Failed { kind, message } => {
                eprintln!("failed {} ({kind}): {message}", job.output().display())
            }
            _ => {}
        }
    }
    if report.failures() > 0 {
        anyhow::bail!(
            "{} of {} stickers in '{}' failed",
            report.failures(),
            pack.stickers.len(),
            report.name
        );
    }
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let info = kinetype::probe_artifact(&args.path)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }
    let loops = match info.loop_count {
        Some(0) => "forever".to_string(),
        Some(n) => n.to_string(),
        None => "none".to_string(),
    };
    println!("kind:    {:?}", info.kind);
    println!("size:    {}x{}", info.width, info.height);
    println!("frames:  {}", info.frame_count);
    println!("loop:    {loops}");
    println!("bytes:   {}", info.byte_len);
    Ok(())
}

fn cmd_profiles(args: ProfilesArgs) -> anyhow::Result<()> {
    let profiles: Vec<PlatformProfile> = Platform::ALL.into_iter().map(Platform::profile).collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }
    for p in &profiles {
        let formats: Vec<String> = p.formats.iter().map(ToString::to_string).collect();
        println!(
            "{:<10} {:>4}x{:<4} {:>9} B  {:<16} {}",
            p.name,
            p.max_width,
            p.max_height,
            p.max_file_bytes,
            formats.join(","),
            if p.requires_transparency {
                "transparent"
            } else {
                "any background"
            }
        );
    }
    Ok(())
}
