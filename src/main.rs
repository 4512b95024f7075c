// Submits a prompt to the hosted generative UI app and prints the generated
// files as JSON on stdout. Progress and operator prompts go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use codegen_bridge::{CodegenBridge, Config, PollTimeoutPolicy};

#[derive(Debug, Parser)]
#[command(name = "codegen-bridge", version, about)]
struct Cli {
    /// Prompt to submit to the application
    prompt: String,

    /// YAML config file (default: <config dir>/codegen-bridge/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run without a window; needs an already signed-in profile
    #[arg(long)]
    headless: bool,

    /// What to do if readiness is never signalled: extract or fail
    #[arg(long, value_name = "POLICY")]
    on_timeout: Option<PollTimeoutPolicy>,

    /// Upper bound on the readiness wait, in seconds
    #[arg(long, value_name = "SECS")]
    max_wait_secs: Option<u64>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(policy) = self.on_timeout {
            config.on_poll_timeout = policy;
        }
        if let Some(secs) = self.max_wait_secs {
            let interval = config.timing.poll_interval_ms.max(1);
            let ticks = secs.saturating_mul(1000).div_ceil(interval);
            config.timing.poll_max_ticks = u32::try_from(ticks).unwrap_or(u32::MAX);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let result = CodegenBridge::new(config).generate(&cli.prompt).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
