use anyhow::{Context, Result};
use clap::Parser;
use ogshot::routes::{BuildRoute, LogSink, RouteSink, WriterSink};
use ogshot::{FailurePolicy, GeneratorConfig, NamingScheme, SelectionRule};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Generate open-graph preview images for a built static site
#[derive(Parser)]
#[command(name = "ogshot", version)]
struct Cli {
    /// Build output root (a path or a file:// URL)
    #[arg(long, default_value = "dist")]
    dist: String,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Subdirectory of <dist>/assets/ that receives the images
    #[arg(long)]
    path: Option<String>,

    /// Regular expression matched against normalized page paths (repeatable)
    #[arg(long = "pattern")]
    patterns: Vec<String>,

    /// HTML template containing an @title placeholder
    #[arg(long)]
    template: Option<PathBuf>,

    /// JSON file listing the routes known to the build
    #[arg(long)]
    routes: Option<PathBuf>,

    /// What to do with a page that has no <title>
    #[arg(long, value_enum)]
    on_missing_title: Option<FailurePolicy>,

    /// How image file names are derived
    #[arg(long, value_enum)]
    naming: Option<NamingScheme>,

    /// Upper bound on the network-idle wait per page, in milliseconds
    #[arg(long)]
    network_idle_timeout_ms: Option<u64>,

    /// Build output root name stripped from page paths before matching
    /// (defaults to the name of the --dist directory)
    #[arg(long)]
    root_token: Option<String>,

    /// Index file name stripped from page paths before matching
    #[arg(long)]
    index_file: Option<String>,

    /// Print the route listing through the logger instead of stderr
    #[arg(long)]
    log_routes: bool,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    // `try_init` also routes records from the `log` facade into tracing
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };

    if let Some(path) = &cli.path {
        config.path = path.clone();
    }
    if !cli.patterns.is_empty() {
        config.patterns = cli.patterns.iter().map(SelectionRule::new).collect();
    }
    if let Some(template) = &cli.template {
        config.template = template.clone();
    }
    if let Some(policy) = cli.on_missing_title {
        config.on_missing_title = policy;
    }
    if let Some(naming) = cli.naming {
        config.naming = naming;
    }
    if let Some(ms) = cli.network_idle_timeout_ms {
        config.network_idle_timeout_ms = ms;
    }
    if let Some(token) = &cli.root_token {
        config.root_token = Some(token.clone());
    }
    if let Some(index_file) = &cli.index_file {
        config.index_file = index_file.clone();
    }
    Ok(config)
}

fn load_routes(cli: &Cli) -> Result<Vec<BuildRoute>> {
    let Some(path) = &cli.routes else {
        return Ok(Vec::new());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid routes file {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = load_config(&cli)?;
    let routes = load_routes(&cli)?;
    let output_dir = ogshot::output_dir_from_handle(&cli.dist)?;

    let mut sink: Box<dyn RouteSink> = if cli.log_routes {
        Box::new(LogSink)
    } else {
        Box::new(WriterSink::stderr())
    };

    let report = ogshot::run(&config, &output_dir, &routes, sink.as_mut())
        .with_context(|| format!("open-graph image generation failed for {}", output_dir.display()))?;

    tracing::info!(
        "Generated {} image(s), skipped {} page(s)",
        report.generated.len(),
        report.skipped.len()
    );
    Ok(())
}
