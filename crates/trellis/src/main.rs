mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{CliArgs, Commands};
use trellis_core::kernel::constants::{APP_NAME, APP_VERSION, DEFAULT_COMPONENTS_DIR};
use trellis_core::{
    ComponentLoader, DisabledComponents, Error, LibraryBackend, LoaderSettings, ManifestDirectory, Result,
};

fn init_logging() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

async fn list_components(settings: &LoaderSettings, extra_dirs: Vec<PathBuf>, json: bool) -> Result<()> {
    let mut dirs = settings.component_dirs.clone();
    dirs.extend(extra_dirs);
    if dirs.is_empty() {
        dirs.push(PathBuf::from(DEFAULT_COMPONENTS_DIR));
    }

    let backend = LibraryBackend::new(settings.unload_policy);
    let mut loader = ComponentLoader::from_settings(backend, settings)?;
    for dir in &dirs {
        let adapter = ManifestDirectory::new(dir).with_manifest_file_name(settings.manifest_file_name.clone());
        loader.add_components(&adapter).await?;
    }

    let policy = DisabledComponents::from_settings(settings).into_policy();
    let summary = loader.load_components(policy)?;
    debug!("Load summary: {:?}", summary);

    let records = loader.components();
    if json {
        let text = serde_json::to_string_pretty(&records)
            .map_err(|e| Error::Other(format!("Failed to serialize components: {}", e)))?;
        println!("{}", text);
    } else if records.is_empty() {
        println!("No components discovered.");
    } else {
        println!("{}", cli::render_table(&records));
    }

    loader.unload_components();
    Ok(())
}

fn set_disabled(settings: &mut LoaderSettings, config: &Path, identifier: &str, disabled: bool) -> Result<()> {
    let changed = if disabled {
        settings.disable(identifier)
    } else {
        settings.enable(identifier)
    };
    let verb = if disabled { "disabled" } else { "enabled" };

    if !changed {
        println!("Component '{}' is already {}.", identifier, verb);
        return Ok(());
    }
    settings.save(config)?;
    println!("Component '{}' {}. Takes effect on next load.", identifier, verb);
    Ok(())
}

async fn run(args: CliArgs) -> Result<()> {
    let mut settings = LoaderSettings::load(&args.config)?;
    debug!("Using settings from {}", args.config.display());

    match args.command.unwrap_or(Commands::List { json: false }) {
        Commands::List { json } => list_components(&settings, args.dirs, json).await,
        Commands::Disable { identifier } => set_disabled(&mut settings, &args.config, &identifier, true),
        Commands::Enable { identifier } => set_disabled(&mut settings, &args.config, &identifier, false),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }
    info!("{} v{}", APP_NAME, APP_VERSION);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
