use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use metriage_engine::analyzer::{analyze_file, AnalyzeOptions, LOAD_LEVEL_SUBDIR};
use metriage_report::{render_console, render_markdown, ColorMode};
use metriage_rules::loader::{load_load_detection_rules, load_rules};
use metriage_rules::validator::validate_message_templates;
use metriage_rules::version::Version;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use metriage_server::app;
use metriage_server::config::ServerConfig;
use metriage_server::state::AppState;

const DEFAULT_RULES_DIR: &str = "./automated-rules";

#[derive(Parser)]
#[command(name = "metriage")]
#[command(about = "Evaluate Prometheus metrics snapshots against declarative TOML rules", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a Prometheus metrics file
    Analyze(AnalyzeArgs),
    /// Validate TOML rule files
    Validate {
        #[arg(default_value = DEFAULT_RULES_DIR)]
        rules_dir: PathBuf,
    },
    /// List all available rules
    ListRules {
        #[arg(default_value = DEFAULT_RULES_DIR)]
        rules_dir: PathBuf,
    },
    /// Run the HTTP analysis service
    Serve {
        #[arg(short, long, env = "METRIAGE_CONFIG", default_value = "config/server.toml")]
        config: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Console,
    Markdown,
    Json,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Directory containing TOML rules
    #[arg(long, default_value = DEFAULT_RULES_DIR)]
    rules: PathBuf,
    /// Directory containing load detection rules (default: <rules>/load-level)
    #[arg(long)]
    load_level_dir: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    format: OutputFormat,
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Cluster name (derived from the file name if not provided)
    #[arg(long)]
    cluster: Option<String>,
    /// Override the detected load level (low/medium/high)
    #[arg(long)]
    load_level: Option<String>,
    /// Override the detected ACS version (e.g. 4.8 or 4.8.2)
    #[arg(long, value_parser = parse_acs_version)]
    acs_version: Option<String>,
    /// Prometheus text exposition file
    metrics_file: PathBuf,
}

fn parse_acs_version(raw: &str) -> std::result::Result<String, String> {
    match Version::parse(raw) {
        Some(_) => Ok(raw.to_string()),
        None => Err(format!("'{raw}' is not a version like 4.8 or 4.8.2")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("metriage=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::Validate { rules_dir } => run_validate(&rules_dir),
        Command::ListRules { rules_dir } => run_list_rules(&rules_dir),
        Command::Serve { config } => run_server(&config).await,
    }
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let opts = AnalyzeOptions {
        rules_dir: args.rules,
        load_level_dir: args.load_level_dir,
        cluster_name: args.cluster,
        load_level_override: args.load_level,
        acs_version_override: args.acs_version,
    };
    let report = analyze_file(&args.metrics_file, &opts)
        .map_err(|e| anyhow::anyhow!("Analysis of '{}' failed: {}", args.metrics_file.display(), e))?;

    let color = if args.output.is_none() && std::io::stdout().is_terminal() {
        ColorMode::Colored
    } else {
        ColorMode::Plain
    };
    let content = match args.format {
        OutputFormat::Console => render_console(&report, color),
        OutputFormat::Markdown => render_markdown(&report),
        OutputFormat::Json => serde_json::to_string_pretty(&report)? + "\n",
    };

    match args.output {
        None => print!("{content}"),
        Some(path) => {
            std::fs::write(&path, content)
                .map_err(|e| anyhow::anyhow!("Failed to write output '{}': {}", path.display(), e))?;
            eprintln!("Report written to {}", path.display());
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn run_validate(rules_dir: &Path) -> Result<()> {
    println!("Validating rules in {}...", rules_dir.display());

    let rules = load_rules(rules_dir).map_err(|e| anyhow::anyhow!("Validation failed: {e}"))?;

    let mut warnings = 0usize;
    for rule in &rules {
        if let Err(e) = validate_message_templates(rule) {
            eprintln!("Warning: {}: {}", rule.name(), e);
            warnings += 1;
        }
    }

    let load_level_dir = rules_dir.join(LOAD_LEVEL_SUBDIR);
    if load_level_dir.is_dir() {
        let detection = load_load_detection_rules(&load_level_dir)
            .map_err(|e| anyhow::anyhow!("Validation failed: {e}"))?;
        println!("✅ All {} load detection rules are valid!", detection.len());
    }

    if warnings > 0 {
        println!("✅ All {} rules are valid ({} template warnings)", rules.len(), warnings);
    } else {
        println!("✅ All {} rules are valid!", rules.len());
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn run_list_rules(rules_dir: &Path) -> Result<()> {
    let rules = load_rules(rules_dir).map_err(|e| anyhow::anyhow!("Failed to load rules: {e}"))?;

    println!("Found {} rules:\n", rules.len());
    for rule in &rules {
        println!("- {} ({}): {}", rule.name(), rule.rule_type(), rule.description);
    }
    Ok(())
}

async fn run_server(config_path: &str) -> Result<()> {
    let config = ServerConfig::load(config_path)?;
    let addr = config.socket_addr()?;

    tracing::info!(
        listen = %addr,
        rules_dir = %config.rules_dir,
        load_level_dir = ?config.load_level_dir,
        max_file_size = config.max_file_size,
        request_timeout_secs = config.request_timeout_secs,
        "metriage server starting"
    );

    let app = app::build_http_app(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
            tracing::info!("Shutting down gracefully");
        })
        .await?;
    Ok(())
}
