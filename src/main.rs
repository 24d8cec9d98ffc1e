mod cli;

use u7d_gateway::{config, server};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn start(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting u7d gateway");
    tracing::info!(
        "Catalog at {}, worker {:?}",
        config.catalog.base_url(),
        config.worker.program
    );

    // Streams are I/O bound; a single thread serves them all.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(server::start_server(config))
}

fn validate(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => println!("Validating config: {:?}", p),
        None => println!("No config file specified, using defaults"),
    }

    let config = config::load_config_or_default(path)?;
    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Catalog: {}", config.catalog.base_url());
    println!("  Worker: {}", config.worker.program.display());
    println!("  Relay host: {}", config.relay.host);
    println!("  Multicast proxy: {}", config.relay.multicast_base_url);
    println!("  Channel list: {}", config.files.channels_path().display());
    println!("  Guide: {}", config.files.guide_path().display());

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "u7d_gateway=trace,u7d_common=trace,tower_http=debug".to_string()
        } else {
            "u7d_gateway=debug,u7d_common=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => start(host, port, cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate(path.as_deref())
        }
        Commands::Version => {
            println!("u7d-gateway {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
