use clap::{Parser, Subcommand};
use painterly::config::{self, PipelineConfig};
use painterly::imaging::RustBackend;
use painterly::inference::CommandInference;
use painterly::naming::default_output_path;
use painterly::output;
use painterly::pipeline::{Orchestrator, PipelineSettings};
use painterly::store::OutputStore;
use painterly::types::ProcessingRequest;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "painterly")]
#[command(about = "Paint photos with a neural stroke model")]
#[command(long_about = "\
Paint photos with a neural stroke model

Each run fits the input within a maximum dimension, hands it to the
inference program, and collects the result. With --animation, the
painting steps are assembled into a looping GIF.

Files:

  painterly.toml                   # Config (optional; see gen-config)
  inference/output/                # Store: inference writes here
  ├── <name>.png                   # Painted result for <name>.png
  ├── <name>/0000.jpg ...          # Painting steps (animation only)
  └── animation.gif                # Last assembled animation

Results are moved next to the input as <name>_painttransformed.<ext>
unless --output is given.

Run 'painterly gen-config' to generate a documented painterly.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./painterly.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output store directory (overrides store.root)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ProcessArgs {
    /// Image to paint
    input: PathBuf,

    /// Also produce a GIF of the painting process
    #[arg(long)]
    animation: bool,

    /// Send the image to inference at its original size
    #[arg(long)]
    no_resize: bool,

    /// Where to put the result (extension follows the produced file)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Paint one image
    Process(ProcessArgs),
    /// Delete all results and frames from the output store
    Clear,
    /// Print a stock painterly.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Process(args) => {
            let config = config::load_config(cli.config.as_deref())?;
            let store = open_store(cli.store.as_deref(), &config)?;
            let orchestrator = build_orchestrator(&config);
            init_thread_pool(&config.processing);

            let animate = args.animation || config.animation.enabled;
            let resize = config.resize.enabled && !args.no_resize;
            let mut request = ProcessingRequest::new(orchestrator.open(&args.input)?);
            request.animate = animate;
            request.resize = resize;
            request.output_path = Some(
                args.output
                    .clone()
                    .unwrap_or_else(|| default_output_path(&args.input, animate)),
            );

            let session = store.lock();
            match orchestrator.process(&session, &request) {
                Ok(result) if args.json => println!("{}", output::format_result_json(&result)?),
                Ok(result) => output::print_result(&args.input, &result),
                Err(err) => {
                    output::print_failure(&err, animate, resize);
                    std::process::exit(1);
                }
            }
        }
        Command::Clear => {
            let config = config::load_config(cli.config.as_deref())?;
            let store = open_store(cli.store.as_deref(), &config)?;
            let session = store.lock();
            let summary = build_orchestrator(&config).clear_output_store(&session)?;
            output::print_clear(store.root(), &summary);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Open the store at `--store`, or at `store.root` from config.
fn open_store(cli_store: Option<&Path>, config: &PipelineConfig) -> std::io::Result<OutputStore> {
    let root = cli_store
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.store.root));
    OutputStore::open(root, &config.animation.file_name)
}

fn build_orchestrator(config: &PipelineConfig) -> Orchestrator<RustBackend, CommandInference> {
    let inference = CommandInference::new(
        config.inference.program.clone(),
        config.inference.args.clone(),
        config.inference.oom_markers.clone(),
    );
    Orchestrator::new(
        RustBackend::new(),
        inference,
        PipelineSettings::from_config(config),
    )
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
