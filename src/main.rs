use clap::Parser;
use flightcache::cli::{commands, Cli, Commands};
use flightcache::FlightResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> FlightResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = commands::load_config(&cli.config);

    // Determine log level: CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("flightcache={}", log_level)
            .parse()
            .unwrap_or_else(|_| "flightcache=info".parse().expect("fallback directive is valid")),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if config.general.log_format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            commands::init(path)?;
        }
        Commands::Dedup {
            callers,
            delay_ms,
            key,
            threads,
            json,
        } => {
            commands::dedup(key, callers, delay_ms, threads, json, &config).await?;
        }
        Commands::Cache {
            capacity,
            ops,
            json,
        } => {
            commands::cache(capacity, &ops, json, &config)?;
        }
        Commands::Version => {
            commands::version();
        }
    }

    Ok(())
}
