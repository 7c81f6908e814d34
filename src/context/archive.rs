//! Lazily materialized build context
//!
//! A build context starts as a directory or a tar archive on disk. The
//! first caller that needs real files triggers materialization; everyone
//! else waits on the same in-flight attempt and shares its outcome,
//! success or failure. The outcome is memoized for the whole build, so a
//! failed extraction is never silently retried.

use crate::error::{StrataError, StrataResult};
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Where the build context comes from
#[derive(Debug, Clone)]
pub enum ContextSource {
    /// An existing directory, used in place without copying
    Directory(PathBuf),

    /// A tar archive (optionally gzip-compressed), extracted on first use
    Archive(PathBuf),
}

impl ContextSource {
    /// Classify a path by suffix: `.tar`, `.tar.gz` and `.tgz` are
    /// archives, everything else is treated as a directory.
    pub fn detect(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if name.ends_with(".tar") || name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            ContextSource::Archive(path)
        } else {
            ContextSource::Directory(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ContextSource::Directory(path) => path,
            ContextSource::Archive(path) => path,
        }
    }
}

/// Why materialization failed. Kept cloneable so the memoized outcome can
/// be handed to every waiter.
#[derive(Debug, Clone)]
enum MaterializeError {
    SourceNotFound(PathBuf),
    Cancelled,
    Failed(String),
}

type MaterializeOutcome = Result<PathBuf, MaterializeError>;

/// Shared, materialize-once view of the build context.
///
/// All stages of one build hold a reference to the same archive; the
/// extracted directory is read-only from their perspective, so the only
/// coordination needed is the single-materialization guarantee.
pub struct BuildContextArchive {
    source: ContextSource,
    extraction_root: PathBuf,
    materialized: OnceCell<MaterializeOutcome>,
}

impl BuildContextArchive {
    /// `extraction_root` is where archive sources get unpacked; directory
    /// sources never touch it.
    pub fn new(source: ContextSource, extraction_root: impl Into<PathBuf>) -> Self {
        Self {
            source,
            extraction_root: extraction_root.into(),
            materialized: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &ContextSource {
        &self.source
    }

    /// Return the materialized context directory, extracting on first use.
    ///
    /// Concurrent callers during the first materialization all receive
    /// the same directory, or the same error if it failed. Cancellation
    /// mid-extraction fails the attempt for every waiter and removes the
    /// partial directory.
    pub async fn extract_or_get_dir(&self, cancel: &CancellationToken) -> StrataResult<PathBuf> {
        let outcome = self
            .materialized
            .get_or_init(|| self.materialize(cancel.clone()))
            .await;

        match outcome {
            Ok(dir) => Ok(dir.clone()),
            Err(MaterializeError::SourceNotFound(path)) => {
                Err(StrataError::ContextSourceNotFound(path.clone()))
            }
            Err(MaterializeError::Cancelled) => Err(StrataError::Cancelled),
            Err(MaterializeError::Failed(reason)) => Err(StrataError::ContextExtract {
                reason: reason.clone(),
            }),
        }
    }

    async fn materialize(&self, cancel: CancellationToken) -> MaterializeOutcome {
        if cancel.is_cancelled() {
            return Err(MaterializeError::Cancelled);
        }

        match &self.source {
            ContextSource::Directory(dir) => match tokio::fs::metadata(dir).await {
                Ok(meta) if meta.is_dir() => {
                    debug!("Using build context directory {}", dir.display());
                    Ok(dir.clone())
                }
                Ok(_) => Err(MaterializeError::Failed(format!(
                    "{} is not a directory",
                    dir.display()
                ))),
                Err(_) => Err(MaterializeError::SourceNotFound(dir.clone())),
            },
            ContextSource::Archive(archive_path) => {
                if tokio::fs::metadata(archive_path).await.is_err() {
                    return Err(MaterializeError::SourceNotFound(archive_path.clone()));
                }

                if let Err(e) = tokio::fs::create_dir_all(&self.extraction_root).await {
                    return Err(MaterializeError::Failed(format!(
                        "creating extraction root {}: {e}",
                        self.extraction_root.display()
                    )));
                }

                let dest = self
                    .extraction_root
                    .join(format!("strata-context-{}", uuid::Uuid::new_v4()));
                if let Err(e) = tokio::fs::create_dir(&dest).await {
                    return Err(MaterializeError::Failed(format!(
                        "creating extraction directory {}: {e}",
                        dest.display()
                    )));
                }

                let archive = archive_path.clone();
                let unpack_dest = dest.clone();
                let unpack_cancel = cancel.clone();
                let unpack = tokio::task::spawn_blocking(move || {
                    extract_archive(&archive, &unpack_dest, &unpack_cancel)
                })
                .await;

                let result = match unpack {
                    Ok(result) => result,
                    Err(e) => Err(MaterializeError::Failed(format!(
                        "extraction task failed: {e}"
                    ))),
                };

                if let Err(err) = result {
                    // Never leave a partial extraction behind as materialized
                    let _ = tokio::fs::remove_dir_all(&dest).await;
                    return Err(err);
                }

                info!(
                    "Extracted build context {} to {}",
                    archive_path.display(),
                    dest.display()
                );
                Ok(dest)
            }
        }
    }

    /// Remove the extracted directory, if this build created one.
    ///
    /// Called once after the whole build completes. Directory sources are
    /// left untouched.
    pub async fn cleanup(&self) {
        if matches!(self.source, ContextSource::Directory(_)) {
            return;
        }
        if let Some(Ok(dir)) = self.materialized.get() {
            debug!("Removing extracted build context {}", dir.display());
            // Best-effort: a leftover directory is only wasted disk
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }
}

fn extract_archive(
    archive_path: &Path,
    dest: &Path,
    cancel: &CancellationToken,
) -> Result<(), MaterializeError> {
    let file = std::fs::File::open(archive_path).map_err(|e| {
        MaterializeError::Failed(format!("opening {}: {e}", archive_path.display()))
    })?;

    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        unpack_entries(
            tar::Archive::new(flate2::read::GzDecoder::new(file)),
            dest,
            cancel,
        )
    } else {
        unpack_entries(tar::Archive::new(file), dest, cancel)
    }
}

fn unpack_entries<R: std::io::Read>(
    mut archive: tar::Archive<R>,
    dest: &Path,
    cancel: &CancellationToken,
) -> Result<(), MaterializeError> {
    let entries = archive
        .entries()
        .map_err(|e| MaterializeError::Failed(format!("reading archive entries: {e}")))?;

    for entry in entries {
        if cancel.is_cancelled() {
            return Err(MaterializeError::Cancelled);
        }
        let mut entry =
            entry.map_err(|e| MaterializeError::Failed(format!("reading archive entry: {e}")))?;
        let entry_path = entry.path().map_err(|e| {
            MaterializeError::Failed(format!("reading archive entry path: {e}"))
        })?;
        let entry_path = entry_path.into_owned();
        entry.unpack_in(dest).map_err(|e| {
            MaterializeError::Failed(format!("unpacking {}: {e}", entry_path.display()))
        })?;
    }

    Ok(())
}
