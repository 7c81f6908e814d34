//! Clean command - remove old build records and leftover contexts

use crate::cli::args::CleanArgs;
use crate::config::{Config, ConfigManager};
use crate::error::{StrataError, StrataResult};
use crate::store::BuildRecord;
use crate::ui::{self, UiContext};
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Execute the clean command
pub async fn execute(args: CleanArgs, config: &Config) -> StrataResult<()> {
    let ctx = UiContext::detect();
    let gc_days = args.days.unwrap_or(config.store.gc_days);

    if gc_days == 0 {
        println!("Record cleanup is disabled (gc_days = 0)");
        return Ok(());
    }

    let records = BuildRecord::list_all().await?;
    let stale: Vec<&BuildRecord> = records
        .iter()
        .filter(|record| record.is_older_than_days(gc_days))
        .collect();

    // Extraction dirs are scratch space, swept regardless of age.
    let contexts = leftover_contexts(config).await?;

    if stale.is_empty() && contexts.is_empty() {
        println!("No build records older than {gc_days} days.");
        return Ok(());
    }

    ui::intro(&ctx, "Cleaning build state");

    for record in &stale {
        let age_days = (Utc::now() - record.updated_at).num_days();
        ui::step_info(
            &ctx,
            &format!("record {} ({} days old)", record.plan, age_days),
        );
    }
    for dir in &contexts {
        ui::step_info(&ctx, &format!("context {}", dir.display()));
    }

    if args.dry_run {
        ui::step_warn(
            &ctx,
            &format!(
                "Dry run - would remove {} record(s) and {} context dir(s)",
                stale.len(),
                contexts.len()
            ),
        );
        return Ok(());
    }

    let mut removed_records = 0;
    for record in stale {
        debug!("Deleting build record for {}", record.plan);
        record.delete().await?;
        removed_records += 1;
    }

    let mut removed_contexts = 0;
    for dir in contexts {
        debug!("Removing extracted context {}", dir.display());
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| StrataError::io(format!("removing context {}", dir.display()), e))?;
        removed_contexts += 1;
    }

    ui::outro_success(
        &ctx,
        &format!("Removed {removed_records} record(s) and {removed_contexts} context dir(s)"),
    );

    Ok(())
}

/// Extraction dirs left behind under the contexts root, oldest-name first.
async fn leftover_contexts(config: &Config) -> StrataResult<Vec<PathBuf>> {
    let root = config
        .context
        .extraction_root
        .clone()
        .unwrap_or_else(ConfigManager::contexts_dir);

    if !root.exists() {
        return Ok(vec![]);
    }

    let mut dirs = vec![];
    let mut entries = fs::read_dir(&root)
        .await
        .map_err(|e| StrataError::io("reading contexts directory", e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StrataError::io("reading contexts entry", e))?
    {
        let path = entry.path();
        let name = entry.file_name();
        if path.is_dir() && name.to_string_lossy().starts_with("strata-context-") {
            dirs.push(path);
        }
    }

    dirs.sort();
    Ok(dirs)
}
