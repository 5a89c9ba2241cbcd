use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use release_registry::cache::{SqliteStore, VersionCache};
use release_registry::config::{RegistryConfig, log_dir};
use release_registry::github::GitHubClient;
use release_registry::providers::DirectoryKeyStore;
use release_registry::service::{
    ModuleIdentity, ProviderIdentity, RefreshRequest, Refresher, RegistryService,
    SpawnRefreshTrigger, service_discovery,
};

const NOT_FOUND_EXIT: u8 = 2;

#[derive(Parser)]
#[command(name = "release-registry")]
#[command(version, about = "Provider and module registry backed by GitHub releases")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log to stderr instead of the daily log file
    #[arg(long, global = true)]
    log_stderr: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Provider lookups
    Providers {
        #[command(subcommand)]
        action: ProviderCommand,
    },
    /// Module lookups
    Modules {
        #[command(subcommand)]
        action: ModuleCommand,
    },
    /// Repopulate a cached listing now
    Populate {
        #[command(subcommand)]
        target: PopulateCommand,
    },
    /// Print the service discovery document
    WellKnown,
}

#[derive(Subcommand)]
enum ProviderCommand {
    /// List available versions
    Versions {
        namespace: String,
        provider_type: String,
    },
    /// Show download details for one version and platform
    Download {
        namespace: String,
        provider_type: String,
        version: String,
        os: String,
        arch: String,
    },
}

#[derive(Subcommand)]
enum ModuleCommand {
    /// List available versions
    Versions {
        namespace: String,
        name: String,
        system: String,
    },
    /// Show the source location of one version
    Download {
        namespace: String,
        name: String,
        system: String,
        version: String,
    },
}

#[derive(Subcommand)]
enum PopulateCommand {
    Provider {
        namespace: String,
        provider_type: String,
    },
    Module {
        namespace: String,
        name: String,
        system: String,
    },
}

/// Everything a command needs, built once
struct App {
    service: RegistryService,
    refresher: Arc<Refresher>,
    trigger: Arc<SpawnRefreshTrigger>,
}

impl App {
    fn build(config: &RegistryConfig) -> anyhow::Result<Self> {
        let client = Arc::new(GitHubClient::new(&config.github)?);
        let store = SqliteStore::new(&config.db_path())
            .with_context(|| format!("Failed to open cache at {:?}", config.db_path()))?;
        let cache = VersionCache::new(Arc::new(store));
        let keys = Arc::new(DirectoryKeyStore::new(config.keys_dir()));

        let refresher = Arc::new(Refresher::new(client.clone(), cache.clone()));
        let trigger = Arc::new(SpawnRefreshTrigger::new(refresher.clone()));
        let service = RegistryService::new(
            client,
            cache,
            keys,
            trigger.clone(),
            config.provider_namespace_redirects.clone(),
        );

        Ok(Self {
            service,
            refresher,
            trigger,
        })
    }
}

fn init_logging(log_stderr: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if log_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    let dir = log_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {:?}", dir))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, "release-registry.log"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(writer)
        .init();

    Ok(Some(guard))
}

/// Runs the command; `Ok(None)` means not found.
async fn run(command: Command, config: RegistryConfig) -> anyhow::Result<Option<Value>> {
    if let Command::WellKnown = command {
        return Ok(Some(serde_json::to_value(service_discovery())?));
    }

    let app = App::build(&config)?;
    let output = match command {
        Command::Providers { action } => match action {
            ProviderCommand::Versions {
                namespace,
                provider_type,
            } => to_json(
                app.service
                    .list_provider_versions(&namespace, &provider_type)
                    .await?,
            )?,
            ProviderCommand::Download {
                namespace,
                provider_type,
                version,
                os,
                arch,
            } => to_json(
                app.service
                    .resolve_download(&namespace, &provider_type, &version, &os, &arch)
                    .await?,
            )?,
        },
        Command::Modules { action } => match action {
            ModuleCommand::Versions {
                namespace,
                name,
                system,
            } => to_json(
                app.service
                    .list_module_versions(&namespace, &name, &system)
                    .await?,
            )?,
            ModuleCommand::Download {
                namespace,
                name,
                system,
                version,
            } => to_json(
                app.service
                    .module_download(&namespace, &name, &system, &version)
                    .await?,
            )?,
        },
        Command::Populate { target } => {
            let request = match target {
                PopulateCommand::Provider {
                    namespace,
                    provider_type,
                } => RefreshRequest::provider(&ProviderIdentity::new(
                    app.service.effective_namespace(&namespace),
                    &provider_type,
                )),
                PopulateCommand::Module {
                    namespace,
                    name,
                    system,
                } => RefreshRequest::module(&ModuleIdentity::new(&namespace, &name, &system)),
            };
            app.refresher.populate(&request).await?;
            info!("Populated {:?}", request);
            Some(serde_json::to_value(&request)?)
        }
        Command::WellKnown => Some(serde_json::to_value(service_discovery())?),
    };

    app.trigger.wait_for_pending().await?;
    Ok(output)
}

fn to_json<T: serde::Serialize>(value: Option<T>) -> anyhow::Result<Option<Value>> {
    value
        .map(|v| serde_json::to_value(v).map_err(anyhow::Error::from))
        .transpose()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_logging(cli.log_stderr) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = RegistryConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")
        .and_then(|config| {
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(run(cli.command, config))
        });

    match result {
        Ok(Some(output)) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("{}", json!({ "errors": ["not found"] }));
            ExitCode::from(NOT_FOUND_EXIT)
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
