use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{bail, Context as _};
use clap::{Args, Parser, Subcommand, ValueEnum};
use penplot::artifacts::{self, ArtifactPaths};
use penplot::{
    init_logging_with, Config, LogFormat, MeasurementSystem, OrderingStrategy, PathSetDocument,
    Placement,
};
use penplot_camtools::{plan, RasterMask, RasterPreprocessor, Vectorizer};
use penplot_settings::{default_config_path, ensure_config_dir};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "penplot", version, about = "Turn line-art images into pen-plotter G-code")]
struct Cli {
    /// Configuration file (.toml or .json); defaults to the user config if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogChoice::Compact, global = true)]
    log_format: LogChoice,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the whole pipeline: image -> mask -> SVG -> G-code.
    Run(RunArgs),
    /// Write the thinned black-on-white mask of an image.
    Preprocess(PreprocessArgs),
    /// Trace a mask image into an SVG path document.
    Vectorize(VectorizeArgs),
    /// Plan an SVG path document into G-code.
    Plan(PlanArgs),
    /// Run the pipeline on several images in parallel.
    Batch(BatchArgs),
    /// Write a configuration file with default values.
    InitConfig(InitConfigArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogChoice {
    Pretty,
    Compact,
    Json,
}

impl From<LogChoice> for LogFormat {
    fn from(choice: LogChoice) -> Self {
        match choice {
            LogChoice::Pretty => LogFormat::Pretty,
            LogChoice::Compact => LogFormat::Compact,
            LogChoice::Json => LogFormat::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderingChoice {
    NearestNeighbor,
    TwoOpt,
}

impl From<OrderingChoice> for OrderingStrategy {
    fn from(choice: OrderingChoice) -> Self {
        match choice {
            OrderingChoice::NearestNeighbor => OrderingStrategy::NearestNeighbor,
            OrderingChoice::TwoOpt => OrderingStrategy::TwoOpt,
        }
    }
}

/// Placement and motion overrides shared by the planning commands.
#[derive(Args, Debug, Clone)]
struct PlanOptions {
    /// Left edge of the drawing on the canvas.
    #[arg(long, allow_hyphen_values = true)]
    x: Option<f64>,

    /// Lower edge of the drawing on the canvas.
    #[arg(long, allow_hyphen_values = true)]
    y: Option<f64>,

    /// Drawing width.
    #[arg(long)]
    width: Option<f64>,

    /// Drawing height.
    #[arg(long)]
    height: Option<f64>,

    /// Clockwise rotation about the drawing center, in degrees.
    #[arg(long, allow_hyphen_values = true)]
    rotation: Option<f64>,

    /// Pen-down feed rate.
    #[arg(long)]
    draw_speed: Option<f64>,

    /// Pen-up feed rate.
    #[arg(long)]
    travel_speed: Option<f64>,

    /// Path ordering heuristic.
    #[arg(long, value_enum)]
    ordering: Option<OrderingChoice>,

    /// Program units: metric (mm, G21) or imperial (in, G20).
    #[arg(long)]
    units: Option<MeasurementSystem>,

    /// Omit the comment header from the G-code.
    #[arg(long)]
    plain: bool,
}

impl PlanOptions {
    fn apply(&self, config: &mut Config) {
        let placement = &mut config.output.default_placement;
        if let Some(x) = self.x {
            placement.x_mm = x;
        }
        if let Some(y) = self.y {
            placement.y_mm = y;
        }
        if let Some(width) = self.width {
            placement.width_mm = width;
        }
        if let Some(height) = self.height {
            placement.height_mm = height;
        }
        if let Some(rotation) = self.rotation {
            placement.rotation_deg = rotation;
        }
        if let Some(speed) = self.draw_speed {
            config.planner.draw_speed = speed;
        }
        if let Some(speed) = self.travel_speed {
            config.planner.travel_speed = speed;
        }
        if let Some(ordering) = self.ordering {
            config.planner.ordering = ordering.into();
        }
        if let Some(units) = self.units {
            config.planner.units = units;
        }
        if self.plain {
            config.output.annotate_gcode = false;
        }
    }
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input image.
    input: PathBuf,

    /// Directory for the artifacts (default: next to the input).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[command(flatten)]
    plan: PlanOptions,
}

#[derive(Parser, Debug)]
struct PreprocessArgs {
    /// Input image.
    input: PathBuf,

    /// Directory for the mask (default: next to the input).
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct VectorizeArgs {
    /// Mask image (dark lines on white).
    input: PathBuf,

    /// Directory for the SVG (default: next to the input).
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// SVG path document.
    input: PathBuf,

    /// Output G-code path (default: input with a .gcode extension).
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    plan: PlanOptions,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Input images.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for the artifacts (default: next to each input).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[command(flatten)]
    plan: PlanOptions,
}

#[derive(Parser, Debug)]
struct InitConfigArgs {
    /// Where to write the file (default: the user config location).
    #[arg(long)]
    path: Option<PathBuf>,

    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with(cli.log_format.into())?;

    let config_path = cli.config.as_deref();
    match cli.cmd {
        Command::Run(args) => cmd_run(load_config(config_path)?, args),
        Command::Preprocess(args) => cmd_preprocess(load_config(config_path)?, args),
        Command::Vectorize(args) => cmd_vectorize(load_config(config_path)?, args),
        Command::Plan(args) => cmd_plan(load_config(config_path)?, args),
        Command::Batch(args) => cmd_batch(load_config(config_path)?, args),
        Command::InitConfig(args) => cmd_init_config(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    Config::load_or_default(path).with_context(|| match path {
        Some(p) => format!("load config '{}'", p.display()),
        None => "load default config".to_string(),
    })
}

fn configured(mut config: Config, options: &PlanOptions) -> anyhow::Result<(Config, Placement)> {
    options.apply(&mut config);
    config.validate().context("invalid options")?;
    let placement = config.output.default_placement;
    Ok((config, placement))
}

fn out_dir<'a>(arg: &'a Option<PathBuf>, config: &'a Config) -> Option<&'a Path> {
    arg.as_deref().or(config.output.output_directory.as_deref())
}

fn cmd_run(config: Config, args: RunArgs) -> anyhow::Result<()> {
    let (config, placement) = configured(config, &args.plan)?;
    let paths = ArtifactPaths::for_input(&args.input, out_dir(&args.out_dir, &config))?;

    let output = config
        .pipeline()
        .run_file(&args.input, &placement)
        .with_context(|| format!("process '{}'", args.input.display()))?;
    artifacts::write_pipeline_output(&output, &paths, &config.output)?;

    let stats = output.program.statistics();
    println!(
        "{}: {} paths, {:.1} draw, {:.1} travel, ~{:.0}s -> {}",
        args.input.display(),
        stats.path_count,
        stats.draw_distance,
        stats.travel_distance,
        stats.estimated_seconds,
        paths.gcode.display()
    );
    Ok(())
}

fn cmd_preprocess(config: Config, args: PreprocessArgs) -> anyhow::Result<()> {
    let paths = ArtifactPaths::for_input(&args.input, out_dir(&args.out_dir, &config))?;
    let mask = RasterPreprocessor::new(config.preprocess.clone())
        .process_file(&args.input)
        .with_context(|| format!("preprocess '{}'", args.input.display()))?;

    artifacts::ensure_parent(&paths.mask)?;
    mask.save(&paths.mask)
        .with_context(|| format!("write mask '{}'", paths.mask.display()))?;
    println!("wrote {}", paths.mask.display());
    Ok(())
}

fn cmd_vectorize(config: Config, args: VectorizeArgs) -> anyhow::Result<()> {
    let out =
        artifacts::sibling_with_extension(&args.input, "svg", out_dir(&args.out_dir, &config))?;
    let mask = RasterMask::load(&args.input)
        .with_context(|| format!("load mask '{}'", args.input.display()))?;
    let paths = Vectorizer::new(config.vectorize.clone())
        .extract(&mask)
        .with_context(|| format!("vectorize '{}'", args.input.display()))?;

    let document = PathSetDocument::new(f64::from(mask.width()), f64::from(mask.height()), paths);
    artifacts::ensure_parent(&out)?;
    document
        .save(&out)
        .with_context(|| format!("write svg '{}'", out.display()))?;
    println!("wrote {} ({} paths)", out.display(), document.paths().len());
    Ok(())
}

fn cmd_plan(config: Config, args: PlanArgs) -> anyhow::Result<()> {
    let (config, placement) = configured(config, &args.plan)?;
    let out = match &args.out {
        Some(out) => out.clone(),
        None => artifacts::sibling_with_extension(
            &args.input,
            "gcode",
            config.output.output_directory.as_deref(),
        )?,
    };

    let document = PathSetDocument::from_file(&args.input)
        .with_context(|| format!("read svg '{}'", args.input.display()))?;
    let program = plan(document.paths(), &placement, &config.planner)
        .with_context(|| format!("plan '{}'", args.input.display()))?;

    artifacts::write_gcode(&program, &out, config.output.annotate_gcode)?;
    println!("wrote {} ({} draw moves)", out.display(), program.draw_count());
    Ok(())
}

fn cmd_batch(config: Config, args: BatchArgs) -> anyhow::Result<()> {
    let (config, placement) = configured(config, &args.plan)?;
    let out_dir = out_dir(&args.out_dir, &config).map(Path::to_path_buf);
    let (tx, rx) = mpsc::channel();

    let mut workers = Vec::with_capacity(args.inputs.len());
    for input in args.inputs {
        let tx = tx.clone();
        let config = config.clone();
        let out_dir = out_dir.clone();
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());

        let worker_input = input.clone();
        let handle = thread::Builder::new()
            .name(format!("penplot-{}", name))
            .spawn(move || {
                let input = worker_input;
                let result = (|| -> anyhow::Result<_> {
                    let paths = ArtifactPaths::for_input(&input, out_dir.as_deref())?;
                    let output = config
                        .pipeline()
                        .run_file(&input, &placement)
                        .with_context(|| format!("process '{}'", input.display()))?;
                    artifacts::write_pipeline_output(&output, &paths, &config.output)?;
                    Ok((output.program.statistics(), paths.gcode))
                })();
                let _ = tx.send((input, result));
            })
            .context("spawn worker thread")?;
        workers.push((input, handle));
    }
    drop(tx);

    let mut failures = 0usize;
    for (input, result) in rx {
        match result {
            Ok((stats, gcode)) => {
                info!("Finished {}", input.display());
                println!(
                    "{}: {} paths, ~{:.0}s -> {}",
                    input.display(),
                    stats.path_count,
                    stats.estimated_seconds,
                    gcode.display()
                );
            }
            Err(e) => {
                failures += 1;
                error!("{}: {:#}", input.display(), e);
            }
        }
    }

    // A worker that panicked never reported back
    for (input, handle) in workers {
        if handle.join().is_err() {
            failures += 1;
            error!("{}: worker panicked", input.display());
        }
    }

    if failures > 0 {
        bail!("{} input(s) failed", failures);
    }
    Ok(())
}

fn cmd_init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => {
            ensure_config_dir()?;
            default_config_path()?
        }
    };
    if path.exists() && !args.force {
        bail!(
            "'{}' already exists (use --force to overwrite)",
            path.display()
        );
    }

    artifacts::ensure_parent(&path)?;
    Config::new()
        .save_to_file(&path)
        .with_context(|| format!("write config '{}'", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}
