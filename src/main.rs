use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use emissary_console::config::{ConsoleConfig, Overrides};
use emissary_console::repl::start_repl;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(about = "Terminal client for the admin console")]
struct Args {
    /// JSON config file; flags below override its values.
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Server base url, e.g. http://localhost:8001
    #[clap(short, long)]
    url: Option<String>,

    #[clap(long)]
    console_path: Option<String>,

    #[clap(long)]
    nav_path: Option<String>,

    #[clap(long)]
    version_path: Option<String>,

    #[clap(long)]
    history_size: Option<usize>,

    #[clap(long)]
    timeout_secs: Option<u64>,

    /// Write logs here instead of stderr.
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.url.clone(),
            console_path: self.console_path.clone(),
            nav_path: self.nav_path.clone(),
            version_path: self.version_path.clone(),
            history_size: self.history_size,
            timeout_secs: self.timeout_secs,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match &args.log_file {
        Some(path) => {
            let log_file = std::fs::File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(Mutex::new(log_file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(std::io::stderr)
                .init();
        }
    }
    tracing::debug!(?args, "parsed command line arguments");

    let config = ConsoleConfig::resolve(args.config.as_deref(), args.overrides())
        .context("loading configuration")?;
    tracing::debug!(?config, "configuration resolved");

    start_repl(config)
}
