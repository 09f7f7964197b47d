use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use webp_renditions::config::{self, BackendKind, RenditionConfig};
use webp_renditions::imaging::tool_backend::tool_statuses;
use webp_renditions::imaging::{AspectRatio, Preset, ToolBackend};
use webp_renditions::output;
use webp_renditions::plan::{Mode, PlanError, parse_widths};
use webp_renditions::process::{self, ConvertSettings, ProcessError};

fn version_string() -> &'static str {
    if env!("RENDITIONS_RELEASE_TAG") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("RENDITIONS_GIT_COMMIT") {
        "" => "dev@unknown",
        // Called once per process, so leaking the string is fine
        commit => Box::leak(format!("dev@{commit}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "webp-renditions")]
#[command(about = "Generate responsive WebP renditions of an image")]
#[command(long_about = "\
Generate responsive WebP renditions of an image

Each requested width becomes one WebP file. Widths larger than the source are
skipped, never upscaled. The largest rendition is the unsuffixed file; every
other rendition carries its dimensions in the name:

  webp/
  ├── photo.webp              # 2560x1707, largest surviving width
  ├── photo-1920x1280.webp
  ├── photo-1280x853.webp
  ├── photo-960x640.webp
  └── photo-640x427.webp      # smallest, encoded at --thumb-quality

Heights follow the source aspect ratio, or a fixed --ratio (16:9, 4:3, 1:1)
with a center crop.

Defaults come from webp-renditions.toml in the working directory when present.
Run 'webp-renditions gen-config' to generate a documented one.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./webp-renditions.toml if it exists)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Which backend encodes the renditions.
#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    /// ImageMagick + cwebp
    Tools,
    /// Built-in decoder and lossless WebP encoder
    Rust,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Tools => BackendKind::Tools,
            BackendArg::Rust => BackendKind::Rust,
        }
    }
}

/// A parsed `--widths` list.
///
/// Wrapped so clap treats it as one value instead of a repeated argument.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WidthList(Vec<u32>);

impl FromStr for WidthList {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_widths(s).map(WidthList)
    }
}

/// Flags shared by `convert` and `plan`.
#[derive(clap::Args, Clone)]
#[command(group(ArgGroup::new("sizing").required(true).multiple(true).args(["widths", "ratio"])))]
struct RenditionArgs {
    /// Source image
    input: PathBuf,

    /// Comma-separated widths, e.g. "2560,1920,1280"
    #[arg(short, long)]
    widths: Option<WidthList>,

    /// Fixed aspect ratio with center crop: 16:9, 4:3 or 1:1
    /// (uses the configured widths unless --widths is given)
    #[arg(short, long)]
    ratio: Option<AspectRatio>,

    /// Output basename (default: input file name without extension)
    #[arg(short, long)]
    name: Option<String>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// WebP quality, 0-100
    #[arg(short, long)]
    quality: Option<u32>,

    /// Quality for the smallest rendition, 0-100
    #[arg(long)]
    thumb_quality: Option<u32>,

    /// Compression effort, 0 (fast) to 6 (smallest)
    #[arg(short, long)]
    method: Option<u32>,

    /// Encoder preset: photo, picture, drawing, icon or text
    #[arg(short, long)]
    preset: Option<Preset>,

    /// Encoding backend
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Renditions encoded in parallel (capped at the core count)
    #[arg(short, long)]
    jobs: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Encode all renditions
    Convert(RenditionArgs),
    /// Show the renditions that would be produced, without encoding
    Plan {
        #[command(flatten)]
        args: RenditionArgs,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report which external tools are installed
    Check,
    /// Print a stock webp-renditions.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Convert(args) => {
            let config = load_config(cli.config.as_deref())?;
            let (kind, settings) = resolve_settings(&args, &config);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::convert(kind, &settings, Some(tx));
            // The sender is dropped by now, so the printer drains and exits
            if printer.join().is_err() {
                eprintln!("warning: progress printer panicked");
            }
            output::print_summary(&result?);
        }
        Command::Plan { args, json } => {
            let config = load_config(cli.config.as_deref())?;
            let (kind, settings) = resolve_settings(&args, &config);
            let prepared = process::prepare(kind, &settings)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&prepared)?);
            } else {
                output::print_plan(&prepared);
            }
        }
        Command::Check => {
            let detection = ToolBackend::detect();
            output::print_tools(&tool_statuses(), &detection);
            detection.map_err(ProcessError::from)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Explicit `--config` must exist; the default file is optional.
fn load_config(path: Option<&Path>) -> Result<RenditionConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

/// Merge command-line flags over the loaded config.
fn resolve_settings(
    args: &RenditionArgs,
    config: &RenditionConfig,
) -> (BackendKind, ConvertSettings) {
    let widths = match &args.widths {
        Some(WidthList(widths)) => widths.clone(),
        None => config.sizes.widths.clone(),
    };
    let mode = match args.ratio {
        Some(ratio) => Mode::FixedRatio(ratio),
        None => Mode::Proportional,
    };
    // --jobs takes priority; both are capped at the core count
    let processing = config::ProcessingConfig {
        max_processes: args.jobs.or(config.processing.max_processes),
        ..config.processing.clone()
    };

    let settings = ConvertSettings {
        input: args.input.clone(),
        widths,
        basename: args.name.clone(),
        output_dir: args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output.dir)),
        quality: args.quality.unwrap_or(config.encoding.quality),
        thumb_quality: args.thumb_quality.or(config.encoding.thumb_quality),
        method: args.method.unwrap_or(config.encoding.method),
        mode,
        preset: args.preset.or(config.encoding.preset),
        fallback: (config.probe.fallback[0], config.probe.fallback[1]),
        on_failure: config.probe.on_failure,
        threads: config::effective_threads(&processing),
    };
    let kind = args
        .backend
        .map(BackendKind::from)
        .unwrap_or(config.processing.backend);
    (kind, settings)
}
