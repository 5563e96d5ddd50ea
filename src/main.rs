use anyhow::{Context, Result};
use clap::Parser;
use pagefire::{Site, SiteConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "pagefire", version, about = "Render a tree of Tera templates into static pages")]
struct Cli {
  /// After the initial build, keep rebuilding whenever a template changes.
  #[arg(long)]
  watch: bool,

  /// Template root (default: `templates`).
  #[arg(long, value_name = "DIR")]
  templates: Option<PathBuf>,

  /// Directory pages are written into (default: the working directory).
  #[arg(long, value_name = "DIR")]
  output: Option<PathBuf>,

  /// Configuration file (default: `pagefire.toml` if present).
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Seconds between keep-alive ticks in watch mode.
  #[arg(long, value_name = "SECS")]
  poll_interval: Option<f64>,

  /// Extra positional arguments are accepted and ignored.
  #[arg(hide = true, trailing_var_arg = true)]
  _rest: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
  let cli = Cli::parse();

  let mut config = SiteConfig::discover(cli.config.as_deref()).context("load configuration")?;
  if let Some(templates) = cli.templates {
    config.templates = templates;
  }
  if let Some(output) = cli.output {
    config.output = output;
  }
  if let Some(poll_interval) = cli.poll_interval {
    config.poll_interval = poll_interval;
  }
  let options = config.watch_options()?;

  let site: Site = config.builder().build().context("load templates")?;
  site.build().context("build templates")?;
  log::info!("Templates built.");

  if !cli.watch {
    return Ok(());
  }

  log::info!("Press Ctrl+C to stop.");
  let summary = pagefire::watch(Arc::new(site), options, shutdown_signal())
    .await
    .context("watch templates")?;
  log::debug!("{} rebuild(s), {} failed", summary.passes, summary.failures);
  log::info!("Process killed");

  Ok(())
}

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    log::error!("Failed to listen for Ctrl+C, stopping: {}", e);
  }
}
