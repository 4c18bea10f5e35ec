use std::sync::Arc;

use clap::Parser;
use miette::Result;
use tracing_subscriber::{fmt, EnvFilter};

use palisade::authz::loader;
use palisade::settings::Settings;
use palisade::web;

#[derive(Parser, Debug)]
#[command(
    name = "palisade",
    version,
    about = "Route-level RBAC authorization service"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // load and compile policies; any configuration error is fatal here,
    // never at request time
    let authz = Arc::new(loader::load_policies(&settings.authz.policies_dir)?);

    // start web server
    web::serve(settings, authz).await?;
    Ok(())
}
