use clap::Parser;

use pitchdeck_proxy::config::{Args, Config};
use pitchdeck_proxy::{logger, server};

// Load .env, validate config, start logging, then serve until the listener fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional, real environment variables win
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = Config::from_args(args)?;

    logger::init_logger(&config.log_level, config.log_json)?;

    server::run(config).await?;
    Ok(())
}
