use anyhow::{Context, Result};
use std::env;
use std::io;
use std::path::PathBuf;
use std::process;
use torrent_migrate::core::config::{Config, Settings};
use torrent_migrate::core::error::MigrateError;
use torrent_migrate::core::prompt::Prompter;
use torrent_migrate::core::tracing_init::init_tracing;
use torrent_migrate::pipeline;
use tracing::{error, info};

fn main() {
    let args: Vec<String> = env::args().collect();

    // Optional config file; anything it leaves out is prompted for
    let config = match args.get(1).map(PathBuf::from) {
        Some(path) => match Config::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Failed to load configuration from '{}': {:#}. \
                    See config.example.toml for the expected layout.",
                    path.display(),
                    e
                );
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    init_tracing(&config.logging);

    match run(&config) {
        Ok(matched) => {
            println!("Total matched torrents (deduplicated): {}", matched);
        }
        Err(e) => {
            let kind = e.downcast_ref::<MigrateError>().map(MigrateError::kind);
            let message = format!("{:#}", e);
            error!(error = %message, kind = ?kind, "Migration aborted");
            process::exit(1);
        }
    }
}

fn run(config: &Config) -> Result<usize> {
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    let settings = Settings::resolve(config, &mut prompter)?;

    info!(
        source = %settings.source.url,
        target = %settings.target.url,
        source_dir = %settings.source_dir.display(),
        target_dir = %settings.target_dir.display(),
        "Starting torrent migration"
    );

    // Every call is awaited in turn, one thread is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    let report = runtime.block_on(pipeline::run(&settings))?;

    info!(
        listed = report.listed,
        matched = report.matched,
        copied = report.copied,
        added = report.added,
        duplicates = report.duplicates,
        "Migration complete"
    );

    Ok(report.matched)
}
