use std::path::Path;

use anyhow::Context;
use colored::Colorize;

use seqstore_identity::{EntityId, IdentityAllocator};
use seqstore_server::{AppState, Backend, SeqstoreServer, ServiceConfig};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli.config.as_deref(), |name| std::env::var(name).ok())?;
    match cli.command {
        Command::Serve(args) => cmd_serve(apply_serve_args(config, &args)).await,
        Command::NextId => cmd_next_id(&config).await,
        Command::Config => cmd_config(&config),
    }
}

/// Defaults, then the TOML file if given, then the environment.
pub fn resolve_config<F>(path: Option<&Path>, lookup: F) -> anyhow::Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match path {
        Some(path) => ServiceConfig::load(path)
            .with_context(|| format!("reading config file {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    Ok(base.apply_env(lookup)?)
}

/// Command-line flags override everything else.
pub fn apply_serve_args(mut config: ServiceConfig, args: &ServeArgs) -> ServiceConfig {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(backend) = args.backend {
        config.backend = match backend {
            BackendArg::S3 => Backend::S3,
            BackendArg::Memory => Backend::Memory,
        };
    }
    config
}

async fn cmd_serve(config: ServiceConfig) -> anyhow::Result<()> {
    let server = SeqstoreServer::new(config).context("invalid server configuration")?;
    println!(
        "{} seqstore on {} ({:?} backend, prefix {:?})",
        "✓".green().bold(),
        server.config().bind_addr.to_string().bold(),
        server.config().backend,
        server.config().prefix,
    );
    server.serve().await?;
    Ok(())
}

/// The id the next create would allocate. Nothing is written.
pub async fn next_id(config: &ServiceConfig) -> anyhow::Result<EntityId> {
    let state = AppState::from_config(config).context("invalid configuration")?;
    let id = IdentityAllocator::from_config(&state.writer)
        .allocate(&*state.store)
        .await?;
    Ok(id)
}

async fn cmd_next_id(config: &ServiceConfig) -> anyhow::Result<()> {
    let id = next_id(config).await?;
    println!("{}", id.to_string().yellow().bold());
    Ok(())
}

fn cmd_config(config: &ServiceConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
