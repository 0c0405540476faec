pub mod filter;
pub mod migrate;
pub mod upload;

use tracing::info;

use crate::core::config::Settings;
use crate::core::error::MigrateError;
use crate::rpc::client::RpcClient;

/// Counts gathered over one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub listed: usize,
    pub matched: usize,
    pub copied: usize,
    pub added: usize,
    pub duplicates: usize,
}

/// List, filter, copy, re-upload. Each stage finishes before the next starts
/// and the first error ends the run.
pub async fn run(settings: &Settings) -> Result<MigrationReport, MigrateError> {
    let mut report = MigrationReport::default();

    let mut source = RpcClient::new(
        settings.source.url.clone(),
        settings.source.credentials.clone(),
        settings.timeout,
    )?;

    info!(endpoint = %source.endpoint(), "Listing torrents on source instance");
    let listing = source.torrent_get().await?;
    report.listed = listing.len();

    let selection = filter::select_by_passkey(&listing, &settings.passkey);
    for torrent in selection.iter() {
        println!("{}", torrent);
    }
    report.matched = selection.len();

    info!(
        listed = report.listed,
        matched = report.matched,
        "Torrent listing filtered"
    );

    let copied = migrate::migrate_all(
        &selection,
        &settings.source_dir,
        &settings.target_dir,
        |file| println!("File copied: {} -> {}", file.from.display(), file.to.display()),
    )?;
    report.copied = copied.len();

    info!(
        copied = report.copied,
        target_dir = %settings.target_dir.display(),
        "Torrent files copied"
    );

    let mut target = RpcClient::new(
        settings.target.url.clone(),
        settings.target.credentials.clone(),
        settings.timeout,
    )?;

    info!(endpoint = %target.endpoint(), "Uploading torrents to target instance");
    let uploads = upload::upload_all(&mut target, &selection, &settings.target_dir).await?;
    report.added = uploads.added;
    report.duplicates = uploads.duplicates;

    Ok(report)
}
