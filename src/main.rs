use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

mod aggregator;
mod api;
mod error;
mod github;

mod config;
use config::OrgDeskConfig;

#[derive(Parser)]
#[clap(version)]
struct Opts {
    /// Configuration file for orgdesk
    #[clap(short, long, value_parser)]
    config: PathBuf,
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opts = Opts::parse();
    let config_file = File::open(&opts.config)
        .with_context(|| format!("couldn't open {}:", opts.config.display()))?;
    let config: OrgDeskConfig = serde_yaml::from_reader(BufReader::new(config_file))
        .context("couldn't parse config file")?;
    config.validate().context("invalid configuration")?;

    info!(
        "managing GitHub organization {} through {}",
        config.github_org, config.github_api_url
    );

    let rocket = api::mount(rocket::build(), config);
    rocket
        .launch()
        .await
        .map(|_| ())
        .map_err(|err| anyhow::anyhow!(err))
}
