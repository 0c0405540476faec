use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::error::FileError;
use crate::pipeline::filter::Selection;

/// A finished copy
#[derive(Debug, Clone, PartialEq)]
pub struct CopiedFile {
    pub from: PathBuf,
    pub to: PathBuf,
    pub bytes: u64,
}

pub fn torrent_file_name(hash_string: &str) -> String {
    format!("{}.torrent", hash_string)
}

/// Copy `<hash>.torrent` from `source_dir` to `target_dir`, overwriting any
/// existing destination. Both handles are closed before this returns.
///
/// When both paths resolve to the same file nothing is written; truncating
/// the destination would empty the source.
pub fn copy_torrent_file(source_dir: &Path, target_dir: &Path, hash_string: &str) -> Result<CopiedFile, FileError> {
    let file_name = torrent_file_name(hash_string);
    let from = source_dir.join(&file_name);
    let to = target_dir.join(&file_name);

    let mut source = File::open(&from).map_err(|source| FileError::Open {
        path: from.clone(),
        source,
    })?;

    if same_file(&from, &to) {
        let bytes = source
            .metadata()
            .map_err(|source| FileError::Read {
                path: from.clone(),
                source,
            })?
            .len();
        debug!(path = %from.display(), bytes, "Source and target are the same file, copy skipped");
        return Ok(CopiedFile { from, to, bytes });
    }

    let mut destination = File::create(&to).map_err(|source| FileError::Create {
        path: to.clone(),
        source,
    })?;

    let bytes = io::copy(&mut source, &mut destination).map_err(|source| FileError::Copy {
        from: from.clone(),
        to: to.clone(),
        source,
    })?;

    debug!(from = %from.display(), to = %to.display(), bytes, "Torrent file copied");

    Ok(CopiedFile { from, to, bytes })
}

/// True when both paths exist and canonicalize to the same location
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copy every selected torrent's file, in selection order, stopping at the first failure.
/// `on_copied` runs after each successful copy.
pub fn migrate_all<F>(
    selection: &Selection,
    source_dir: &Path,
    target_dir: &Path,
    mut on_copied: F,
) -> Result<Vec<CopiedFile>, FileError>
where
    F: FnMut(&CopiedFile),
{
    let mut copied = Vec::with_capacity(selection.len());

    for torrent in selection.iter() {
        let file = copy_torrent_file(source_dir, target_dir, &torrent.hash_string)?;
        on_copied(&file);
        copied.push(file);
    }

    Ok(copied)
}
