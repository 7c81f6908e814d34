//! Sign command - compute every stage signature of a build plan

use crate::cli::args::{OutputFormat, SignArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{StrataError, StrataResult};
use crate::plan::{BuildPlan, PLAN_FILE_NAME};
use crate::signature::Signature;
use crate::stage::{PinnedResolver, Resolution};
use crate::store::{BuildRecord, StageRecord};
use crate::ui::{self, UiContext};
use console::style;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Execute the sign command
pub async fn execute(
    args: SignArgs,
    config: &Config,
    cancel: &CancellationToken,
) -> StrataResult<()> {
    let plan_path = match args.plan {
        Some(ref p) => p.clone(),
        None => PathBuf::from(PLAN_FILE_NAME),
    };

    let plan = BuildPlan::load(&plan_path).await?;
    let plan_name = plan.build.name.clone();

    // CLI flag beats the plan, the plan beats global config
    let backend = args
        .backend
        .clone()
        .or_else(|| plan.build.backend.clone())
        .unwrap_or_else(|| config.build.backend.clone());

    let extraction_root = config
        .context
        .extraction_root
        .clone()
        .unwrap_or_else(ConfigManager::contexts_dir);

    let plan_dir = plan_path.parent().unwrap_or_else(|| Path::new("."));
    let mut chain = plan.into_chain(plan_dir, &backend, &extraction_root);

    debug!("Signing plan {} for backend {}", plan_name, backend);
    chain.sign_all(&PinnedResolver, cancel).await?;

    let mut signed = Vec::with_capacity(chain.stages().len());
    for stage in chain.stages() {
        let signature = stage.signature().ok_or_else(|| StrataError::StageNotSigned {
            stage: stage.name().to_string(),
        })?;
        signed.push((
            stage.name().to_string(),
            stage.instruction().kind_name().to_string(),
            signature.clone(),
        ));
    }

    // Compare against the last recorded build to tell hits from rebuilds
    let previous = BuildRecord::load(&plan_name).await?;

    let mut stage_records = Vec::with_capacity(signed.len());
    let mut hits = 0usize;
    for (name, kind, signature) in signed {
        let resolution = resolution_for(previous.as_ref(), &name, &signature);
        if resolution == Resolution::CacheHit {
            hits += 1;
        }
        chain.resolve_stage(&name, resolution)?;
        stage_records.push(StageRecord {
            name,
            kind,
            signature,
            resolution,
        });
    }

    let mut record = BuildRecord::new(
        plan_name,
        backend,
        chain.base_image().map(str::to_string),
        stage_records,
    );
    if let Some(ref prev) = previous {
        record.created_at = prev.created_at;
    }

    if args.record {
        record.save().await?;
        debug!("Recorded build at {}", record.file_path().display());
    }

    if config.build.keep_context {
        debug!("Keeping extracted context (keep_context = true)");
    } else {
        chain.cleanup().await;
    }

    match args.format {
        OutputFormat::Table => print_table(&record, previous.is_none(), hits),
        OutputFormat::Json => print_json(&record)?,
        OutputFormat::Plain => print_plain(&record),
    }

    Ok(())
}

/// A stage is a cache hit when the last recorded build signed it with the
/// same signature.
fn resolution_for(
    previous: Option<&BuildRecord>,
    stage: &str,
    signature: &Signature,
) -> Resolution {
    match previous.and_then(|record| record.signature_of(stage)) {
        Some(recorded) if recorded == signature => Resolution::CacheHit,
        _ => Resolution::Rebuilt,
    }
}

fn print_table(record: &BuildRecord, first_build: bool, hits: usize) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, &format!("Signed {}", record.plan));

    println!(
        "{:<20} {:<12} {:<14} {:<10}",
        style("STAGE").bold(),
        style("KIND").bold(),
        style("SIGNATURE").bold(),
        style("RESOLUTION").bold()
    );
    println!("{}", "-".repeat(58));

    for stage in &record.stages {
        let resolution_styled = match stage.resolution {
            Resolution::CacheHit => style("cache hit").green(),
            Resolution::Rebuilt => style("rebuilt").yellow(),
        };
        println!(
            "{:<20} {:<12} {:<14} {:<10}",
            stage.name,
            stage.kind,
            stage.signature.short(),
            resolution_styled
        );
    }

    println!();
    if first_build {
        ui::step_info(&ctx, "No recorded build to compare against");
    }
    if let Some(tag) = record.image_tag() {
        ui::key_value(&ctx, "image", &tag);
    }
    ui::outro_success(
        &ctx,
        &format!("{} stage(s) signed, {} from cache", record.stages.len(), hits),
    );
}

fn print_json(record: &BuildRecord) -> StrataResult<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

fn print_plain(record: &BuildRecord) {
    for stage in &record.stages {
        println!("{} {}", stage.name, stage.signature);
    }
}
