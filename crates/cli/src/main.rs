use clap::Parser;
use tracing_subscriber::EnvFilter;

use ap_cli::cli::{Cli, Command, ConfigCommand};
use ap_domain::config::LoggingConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Plan(args) => {
            let (config, _config_path) = ap_cli::cli::load_config()?;
            init_tracing(&config.logging);
            let code = ap_cli::cli::plan::run(&config, &args).await?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Validate) => {
            init_tracing(&LoggingConfig::default());
            let (config, config_path) = ap_cli::cli::load_config()?;
            if !ap_cli::cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            init_tracing(&LoggingConfig::default());
            let (config, _config_path) = ap_cli::cli::load_config()?;
            ap_cli::cli::config::show(&config)
        }
        Command::Version => {
            println!("agentplan {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Logs go to stderr so `--json` output on stdout stays machine-readable.
fn init_tracing(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
