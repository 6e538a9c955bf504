mod cli;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cf_av::catalog;
use cf_av::{EngineLocator, LocalEngine, MediaRunner};
use cf_core::config::Config;
use cf_core::wire::WireOperation;
use cf_core::MediaReference;
use cf_pipeline::{presets, JobResult, Orchestrator, RemoteEngineClient};
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipforge=debug,cf_core=debug,cf_av=debug,cf_pipeline=debug,cf_server=debug,tower_http=debug".to_string()
        } else {
            "clipforge=info,cf_core=info,cf_av=info,cf_pipeline=info,cf_server=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = Config::load_or_default(cli.config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            block_on(async move { cf_server::start(config).await.map_err(anyhow::Error::from) })
        }
        Commands::Run {
            source,
            ops,
            name,
            content_type,
        } => {
            let source = MediaReference {
                url: source,
                content_type,
                original_name: name,
            };
            run_operations(cli.config.as_deref(), source, &ops)
        }
        Commands::Style { source, style } => {
            run_style(cli.config.as_deref(), MediaReference::from_url(source), &style)
        }
        Commands::Operations { name } => {
            match name {
                Some(name) => print_entry(catalog::lookup(&name)?),
                None => catalog::entries().iter().for_each(print_entry),
            }
            Ok(())
        }
        Commands::Styles => {
            for style in presets::styles() {
                println!("{:<10} {}", style.id, style.description);
            }
            Ok(())
        }
        Commands::CheckEngine => check_engine(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("clipforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(future)
}

/// Build an orchestrator from config, resolving the local engine if possible.
async fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let runner = match EngineLocator::new(config.engine.clone()).resolve().await {
        Ok(engine) => Some(Arc::new(LocalEngine::new(Arc::new(engine))) as Arc<dyn MediaRunner>),
        Err(e) => {
            tracing::warn!(error = %e, "local media engine unavailable");
            None
        }
    };
    Ok(Orchestrator::from_config(config, runner)?)
}

fn run_operations(
    config_path: Option<&Path>,
    source: MediaReference,
    ops: &[String],
) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let operations = ops
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            serde_json::from_str::<WireOperation>(raw)
                .with_context(|| format!("--op #{}: not a valid operation object", i + 1))
        })
        .collect::<Result<Vec<_>>>()?;

    block_on(async move {
        let orchestrator = build_orchestrator(&config).await?;
        let result = orchestrator.execute_wire_batch(&source, &operations).await;
        report(&result)
    })
}

fn run_style(config_path: Option<&Path>, source: MediaReference, style: &str) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    block_on(async move {
        let orchestrator = build_orchestrator(&config).await?;
        let result = orchestrator.execute_style(&source, style).await;
        report(&result)
    })
}

fn report(result: &JobResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    if result.success {
        Ok(())
    } else {
        anyhow::bail!("job failed: {}", result.message)
    }
}

fn print_entry(entry: &catalog::CatalogEntry) {
    println!("{:<18} {}", entry.kind.wire_name(), entry.summary);
    for param in entry.parameters {
        let aliases = if param.aliases.is_empty() {
            String::new()
        } else {
            format!(" (alias: {})", param.aliases.join(", "))
        };
        println!(
            "    {:<12} {:<9} {}{aliases}",
            param.name,
            if param.required { "required" } else { "optional" },
            param.range
        );
    }
    println!("    example: {}", entry.example);
}

fn check_engine(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path)?;

    block_on(async move {
        match EngineLocator::new(config.engine.clone()).resolve().await {
            Ok(engine) => {
                println!("ffmpeg:  {} ({})", engine.ffmpeg.display(), engine.source.as_str());
                println!("version: {}", engine.version);
                match &engine.ffprobe {
                    Some(path) => println!("ffprobe: {}", path.display()),
                    None => {
                        println!("ffprobe: not found (aspect crops use engine-side expressions)")
                    }
                }
            }
            Err(e) => println!("ffmpeg:  unavailable ({e})"),
        }

        if config.remote.enabled {
            let client = RemoteEngineClient::new(&config.remote)?;
            let health = client.health_check().await;
            println!(
                "remote:  {} available={} capable={} version={}",
                client.base_url(),
                health.available,
                health.capable,
                health.version.as_deref().unwrap_or("unknown")
            );
        } else {
            println!("remote:  disabled");
        }
        Ok(())
    })
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => Config::load(p).with_context(|| format!("failed to load {}", p.display()))?,
        None => Config::load_or_default(None)?,
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("Configuration is valid");
    } else {
        println!("Configuration is valid with {} warning(s):", warnings.len());
        for warning in warnings {
            println!("  - {warning}");
        }
    }
    Ok(())
}
