use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use git_insights::cli::{normalize, Cli};
use git_insights::manager::CollectionManager;
use git_insights::render;
use git_insights::schema::Schema;
use git_insights::secrets::{EnvSecretSource, SecretSource};
use git_insights::util;

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  init_tracing();

  // Phase 1: normalize configuration
  let cfg = normalize(cli).context("invalid configuration")?;
  debug!(config = %serde_json::to_string(&cfg)?, "effective configuration");

  // Phase 2: resolve the token before any API call
  let token = EnvSecretSource
    .secret(&cfg.pat_secret_name)
    .context("failed to resolve the personal access token")?;

  // Phase 3: collect and aggregate
  let schema = Schema::standard().context("record schema is inconsistent")?;
  let manager = CollectionManager::new(cfg.collection_settings(), &token, schema)?;
  let table = manager
    .aggregate(&cfg.group_by_columns())
    .context("collection failed")?;
  info!(groups = table.len(), "aggregated activity");

  // Phase 4: write output
  render::write_output(&cfg.out, &render::to_csv(&table))
    .with_context(|| format!("failed to write output to {}", cfg.out))?;

  Ok(())
}
