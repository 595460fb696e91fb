use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, bail};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use sketch::application::{
    DisplayPorts, DisplayService, DisplayServiceConfig, LoadImagesUseCase, LoadStatus,
    ResolveUriUseCase,
};
use sketch::domain::entities::ImageSize;
use sketch::infrastructure::config::ConfigOrigin;
use sketch::infrastructure::uri::{global, install_global};
use sketch::infrastructure::{
    AppConfig, CliArgs, Command, DiskImageCache, HttpImageDownloader, ImageCrateDecoder,
    ConfigStore, InMemoryTargetBinding, MemoryImageCache, UriModelRegistry,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<(ConfigStore, AppConfig, ConfigOrigin)> {
    let store = ConfigStore::locate(args.config.as_deref())?;
    let loaded = store.load()?;
    let mut config = loaded.config;
    config.merge_with_args(args);
    Ok((store, config, loaded.origin))
}

fn run_config(store: &ConfigStore, config: &AppConfig, write: bool) -> Result<()> {
    if write {
        store.save(config)?;
        info!(path = %store.path().display(), "Stored effective config");
        println!("wrote {}", store.path().display());
    } else {
        print!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}

fn run_resolve(registry: Arc<UriModelRegistry>, uris: &[String], json: bool) -> Result<()> {
    let use_case = ResolveUriUseCase::new(registry);
    let results = use_case.execute_all(uris.iter().map(String::as_str));
    let failed = results.iter().filter(|(_, result)| result.is_err()).count();

    if json {
        let values: Vec<serde_json::Value> = results
            .iter()
            .map(|(uri, result)| match result {
                Ok(resolved) => serde_json::to_value(resolved),
                Err(e) => Ok(serde_json::json!({ "uri": uri, "error": e.to_string() })),
            })
            .collect::<Result<_, _>>()?;
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        for (uri, result) in &results {
            match result {
                Ok(resolved) => {
                    println!("{uri}");
                    println!("  kind:      {}", resolved.kind);
                    println!("  content:   {}", resolved.content);
                    println!("  cache key: {}", resolved.disk_cache_key);
                    println!("  from net:  {}", resolved.from_net);
                }
                Err(e) => println!("{uri}\n  error: {e}"),
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} uris did not resolve", results.len());
    }
    Ok(())
}

async fn run_load(
    config: &AppConfig,
    registry: Arc<UriModelRegistry>,
    uris: &[String],
    target_size: Option<ImageSize>,
    out: Option<&Path>,
    json: bool,
) -> Result<()> {
    let disk_cache = Arc::new(
        DiskImageCache::new(config.effective_cache_dir(), config.cache.disk_cache_size).await?,
    );
    let downloader = HttpImageDownloader::new(&config.downloader_config(), disk_cache.clone())?;

    let ports = DisplayPorts {
        resolver: registry,
        context: config.source_context(),
        memory_cache: Arc::new(MemoryImageCache::new(config.cache.memory_cache_size)),
        disk_cache,
        downloader: Arc::new(downloader),
        decoder: Arc::new(ImageCrateDecoder),
        binding: Arc::new(InMemoryTargetBinding::new()),
    };
    let service = Arc::new(DisplayService::new(
        ports,
        DisplayServiceConfig {
            max_concurrent_requests: config.display.max_concurrent_requests,
        },
    ));

    let reports = LoadImagesUseCase::new(Arc::clone(&service), config.display.options.clone())
        .execute(uris, target_size, out)
        .await;
    service.shutdown().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{report}");
        }
    }

    let failed = reports
        .iter()
        .filter(|report| report.status == LoadStatus::Failed)
        .count();
    if failed > 0 {
        bail!("{failed} of {} images failed to load", reports.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let (store, config, origin) = load_config(&args)?;
    init_logging(&config)?;

    info!(version = sketch::VERSION, config = %store.path().display(), "Starting sketch");
    if origin == ConfigOrigin::Defaults {
        warn!(path = %store.path().display(), "Config file did not parse, running with defaults");
    }

    install_global(config.build_registry()?)?;
    let registry = global();

    match &args.command {
        Command::Resolve { uris, json } => run_resolve(registry, uris, *json),
        Command::Config { write } => run_config(&store, &config, *write),
        Command::Load {
            uris, out, json, ..
        } => {
            run_load(
                &config,
                registry,
                uris,
                args.command.target_size(),
                out.as_deref(),
                *json,
            )
            .await
        }
    }
}
