use clap::{Parser, Subcommand};
use simple_blog::{config, output, pipeline::Pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("BLOG_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("BLOG_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-blog")]
#[command(about = "Static site generator for a markdown blog")]
#[command(long_about = "\
Static site generator for a markdown blog

Articles are markdown files with a leading metadata block. Directories under
article/ become topics on the archive page, and the archive keeps its order
from one build to the next.

Content structure:

  content/
  ├── config.toml                  # Site config (optional)
  ├── article/                     # Articles, any depth
  │   ├── rust/
  │   │   └── ownership.md         # → article/ownership.html
  │   └── ops/
  │       └── deploy.md
  ├── about/about.md               # Exactly one document
  ├── index/index.md               # Exactly one document
  └── static/                      # Copied to <output>/static/

Every document starts with:

  title: Ownership
  date: 01/03/2021                 # day/month/year

Run 'simple-blog gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory holding the archive ordering between builds
    #[arg(long, default_value = ".simple-blog-state", global = true)]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: load → process → generate → write
    Build,
    /// Validate the content directory without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let pipeline = Pipeline::new(&cli.source, &cli.output, &cli.state_dir);

    match cli.command {
        Command::Build => {
            println!("==> Stage 1: Loading {}", cli.source.display());
            let sources = pipeline.load()?;
            output::print_load_output(&sources);

            println!("==> Stage 2: Processing documents");
            init_thread_pool(&sources.config.processing);
            let processed = pipeline.process(&sources)?;
            output::print_process_output(&processed);

            println!("==> Stage 3: Generating pages");
            let site = pipeline.generate(&sources.config, &processed)?;
            output::print_generate_output(&processed, &site);

            println!("==> Stage 4: Writing → {}", cli.output.display());
            let summary = pipeline.write(&sources, &site)?;
            output::print_write_output(&summary, &cli.output);

            pipeline.commit(&site)?;
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let sources = pipeline.load()?;
            init_thread_pool(&sources.config.processing);
            let processed = pipeline.process(&sources)?;
            let site = pipeline.generate(&sources.config, &processed)?;
            output::print_process_output(&processed);
            output::print_generate_output(&processed, &site);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the config can lower the count, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
