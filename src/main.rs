use std::io::stderr;
use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use crossterm::tty::IsTty;
use inspektor::analyzer::Analyzer;
use inspektor::config::{ColorChoice, Config, load_config, load_config_from_path};
use inspektor::error::InspectError;
use inspektor::inspect::{Inspector, Target};
use inspektor::logging;
use inspektor::ui::{Spinner, Theme, render_json, render_report};
use tracing::info;

const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Parser)]
#[command(
    name = "inspektor",
    version,
    about = "Process inspector with AI-assisted diagnostics"
)]
#[command(group(ArgGroup::new("target").required(true).args(["pid", "port"])))]
struct Cli {
    /// Process id to inspect
    pid: Option<u32>,

    /// Inspect the process listening on this TCP or UDP port
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Print a JSON document instead of the report
    #[arg(long, short = 'j')]
    json: bool,

    /// Log collection and analysis details to stderr
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Skip the AI backend and use the built-in rules
    #[arg(long)]
    no_ai: bool,

    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Color output: auto, always, never
    #[arg(long, value_enum)]
    color: Option<ColorChoice>,
}

impl Cli {
    fn target(&self) -> Option<Target> {
        match (self.pid, self.port) {
            (Some(pid), _) => Some(Target::Pid(pid)),
            (None, Some(port)) => Some(Target::Port(port)),
            (None, None) => None,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = load_config_for_cli(&cli);

    match run(&cli, &config).await {
        Err(report) if report.downcast_ref::<InspectError>().is_some() => {
            eprintln!("error: {report}");
            std::process::exit(1);
        }
        result => result,
    }
}

async fn run(cli: &Cli, config: &Config) -> Result<()> {
    let target = cli
        .target()
        .ok_or_else(|| eyre!("a PID or --port is required"))?;
    let theme = Theme::from_choice(config.output.color);
    let animate = !cli.json && config.output.spinner && stderr().is_tty();
    let start_spinner = |message: String| animate.then(|| Spinner::start(message, theme));

    let mut inspector = Inspector::new();

    let pid = match target {
        Target::Pid(pid) => pid,
        Target::Port(port) => {
            let spinner = start_spinner(format!("Finding process on port {port}..."));
            let (returned, resolved) = tokio::task::spawn_blocking(move || {
                let pid = inspector.resolve(target);
                (inspector, pid)
            })
            .await?;
            inspector = returned;
            if let Some(spinner) = spinner {
                spinner.stop().await;
            }
            let pid = resolved?;
            if !cli.json {
                let found = format!("✓ Found process {pid} listening on port {port}");
                println!("\n{}\n", theme.bold(&found, theme.good));
            }
            pid
        }
    };

    let spinner = start_spinner("Analyzing process and system metrics...".to_string());
    let collection = tokio::task::spawn_blocking(move || inspector.collect(pid));
    let analyzer = Analyzer::connect(&config.ai).await;
    info!(mode = ?analyzer.mode(), "analyzer ready");

    let snapshot = match collection.await? {
        Ok(snapshot) => snapshot,
        Err(err) => {
            if let Some(spinner) = spinner {
                spinner.stop().await;
            }
            return Err(err.into());
        }
    };
    let findings = analyzer.analyze(&snapshot).await;
    if let Some(spinner) = spinner {
        spinner.stop().await;
    }

    if cli.json {
        println!("{}", render_json(&snapshot, &findings)?);
    } else {
        print!("{}", render_report(&snapshot, &findings, &theme));
    }
    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Ok(key) = std::env::var(API_KEY_ENV)
        && !key.trim().is_empty()
    {
        config.ai.api_key = key;
    }
    if cli.no_ai {
        config.ai.enabled = false;
    }
    if let Some(color) = cli.color {
        config.output.color = color;
    }

    config
}
