use clap::Parser;
use transwarp::cli::{run_cli, Cli};
use transwarp::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    log_config.log_level = cli.log_level.clone();
    let _guard = init_logging_with_config(&log_config)?;

    run_cli(cli)
}
