//! Content checksums over build context files
//!
//! Two layers: `paths_checksum` hashes an explicit list of already
//! resolved paths, and `context_globs_checksum` runs the full pipeline
//! for an instruction (materialize, resolve globs, fail on bad or empty
//! resolution, checksum the union).
//!
//! Checksums cover content plus identity (relative path, mode, size) and
//! are independent of input ordering: paths are sorted and deduplicated
//! before hashing. Timestamps never participate.

use crate::context::archive::BuildContextArchive;
use crate::context::stat::{stat_globs, StatOptions};
use crate::error::{StrataError, StrataResult};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Checksum the content and identity of an explicit path list.
///
/// `rel_paths` are relative to `dir`. Duplicates are allowed; the result
/// depends only on the set of paths, not their order.
pub async fn paths_checksum(
    dir: &Path,
    rel_paths: &[String],
    cancel: &CancellationToken,
) -> StrataResult<String> {
    let dir = dir.to_path_buf();
    let rel_paths = rel_paths.to_vec();
    let cancel = cancel.clone();

    tokio::task::spawn_blocking(move || paths_checksum_sync(&dir, rel_paths, &cancel))
        .await
        .map_err(|e| StrataError::io("checksum worker", std::io::Error::other(e)))?
}

fn paths_checksum_sync(
    dir: &Path,
    mut rel_paths: Vec<String>,
    cancel: &CancellationToken,
) -> StrataResult<String> {
    rel_paths.sort();
    rel_paths.dedup();

    let mut hasher = Sha256::new();

    for rel_path in &rel_paths {
        if cancel.is_cancelled() {
            return Err(StrataError::Cancelled);
        }

        let path = dir.join(rel_path);
        let entry = entry_line(&path, rel_path)?;
        hasher.update(entry.as_bytes());
        hasher.update(b"\n");
    }

    Ok(hex::encode(hasher.finalize()))
}

/// One canonical line per entry. Files carry mode, size and a content
/// hash; symlinks carry their target; directories just their path.
fn entry_line(path: &Path, rel_path: &str) -> StrataResult<String> {
    let meta = path
        .symlink_metadata()
        .map_err(|e| checksum_err(path, e))?;

    let file_type = meta.file_type();
    if file_type.is_symlink() {
        let target = std::fs::read_link(path).map_err(|e| checksum_err(path, e))?;
        Ok(format!("L:{}:{}", rel_path, target.to_string_lossy()))
    } else if file_type.is_dir() {
        Ok(format!("D:{rel_path}"))
    } else {
        let content_hash = file_content_hash(path)?;
        Ok(format!(
            "F:{}:{:o}:{}:{}",
            rel_path,
            entry_mode(&meta),
            meta.len(),
            content_hash
        ))
    }
}

fn file_content_hash(path: &Path) -> StrataResult<String> {
    let mut file = std::fs::File::open(path).map_err(|e| checksum_err(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let read = file.read(&mut buffer).map_err(|e| checksum_err(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(unix)]
fn entry_mode(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn entry_mode(_meta: &std::fs::Metadata) -> u32 {
    0
}

fn checksum_err(path: &Path, e: std::io::Error) -> StrataError {
    StrataError::PathChecksum {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Checksum every file selected by `globs` within the build context.
///
/// Remote-URL sources must be filtered out by the caller before this
/// point; only local globs are ever checksummed. Any glob that fails to
/// resolve fails the whole operation naming the pattern, and a glob list
/// that selects nothing at all is an error in its own right rather than
/// a no-op.
pub async fn context_globs_checksum(
    archive: &BuildContextArchive,
    globs: &[String],
    options: StatOptions,
    cancel: &CancellationToken,
) -> StrataResult<String> {
    let dir = archive.extract_or_get_dir(cancel).await?;

    let globs_owned = globs.to_vec();
    let cancel_owned = cancel.clone();
    tokio::task::spawn_blocking(move || {
        globs_checksum_sync(&dir, &globs_owned, options, &cancel_owned)
    })
    .await
    .map_err(|e| StrataError::io("checksum worker", std::io::Error::other(e)))?
}

fn globs_checksum_sync(
    dir: &Path,
    globs: &[String],
    options: StatOptions,
    cancel: &CancellationToken,
) -> StrataResult<String> {
    let stats = stat_globs(dir, globs, options);

    for stat in &stats {
        if let Some(reason) = &stat.error {
            return Err(StrataError::glob(&stat.glob, reason));
        }
    }

    let matches: Vec<String> = stats
        .iter()
        .flat_map(|stat| stat.matches.iter().map(|m| m.rel_path.clone()))
        .collect();

    if matches.is_empty() {
        return Err(StrataError::NoGlobMatches {
            globs: globs.to_vec(),
        });
    }

    paths_checksum_sync(dir, matches, cancel)
}
