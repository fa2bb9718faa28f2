//! Interactive environment driver.
//!
//! Reads one JSON action per line on stdin, prints one JSON observation per
//! line on stdout. The first observation is printed on startup so an agent
//! can begin acting immediately.

use std::io::BufRead;
use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use webgym_env::{EnvConfig, WebEnv};

#[derive(Parser)]
#[command(name = "webgym")]
#[command(about = "Reduced-DOM web environment for RL agents")]
#[command(version)]
struct Cli {
    /// Environment config file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start URL (overrides config)
    #[arg(long)]
    url: Option<String>,

    /// Run the browser headless (overrides config)
    #[arg(long)]
    headless: bool,

    /// Pretty-print observations
    #[arg(long)]
    pretty: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut config = match &cli.config {
        Some(path) => EnvConfig::load(path)?,
        None => EnvConfig::default(),
    };
    if cli.headless {
        config.browser.headless = true;
    }
    if let Some(url) = cli.url {
        config.start_url = Some(url);
    }

    let mut env = WebEnv::launch(config).await?;

    let first = env.observation().await?;
    print_observation(&first, cli.pretty)?;

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        let obs = env.step(line).await?;
        let done = obs.terminated;
        print_observation(&obs, cli.pretty)?;
        if done {
            break;
        }
    }

    env.close().await?;
    Ok(())
}

fn print_observation(obs: &webgym_env::Observation, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(obs)?
    } else {
        serde_json::to_string(obs)?
    };
    println!("{json}");
    Ok(())
}
