//! Init command - create a starter strata.toml

use crate::cli::args::InitArgs;
use crate::error::{StrataError, StrataResult};
use crate::plan::PLAN_FILE_NAME;
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Template for a new build plan
const INIT_TEMPLATE: &str = r#"# Strata build plan
# Every stage gets a signature derived from this file and the build
# context, so unchanged stages are served from cache on the next build.
# Docs: https://github.com/strata-build/strata

[build]
name = "app"
from = "docker.io/library/alpine:3.20"
context = "."
# backend = "podman"

[[stages]]
kind = "workdir"
path = "/app"

[[stages]]
name = "sources"
kind = "copy"
src = ["**"]
dst = "/app/"

[[stages]]
kind = "run"
command = ["echo replace this with your build steps"]

[[stages]]
kind = "cmd"
command = ["/app/run.sh"]
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> StrataResult<()> {
    let ctx = UiContext::detect();

    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => {
            std::env::current_dir().map_err(|e| StrataError::io("getting current directory", e))?
        }
    };

    let plan_path = target_dir.join(PLAN_FILE_NAME);

    if plan_path.exists() && !args.force {
        return Err(StrataError::User(format!(
            "{} already exists. Use --force to overwrite.",
            plan_path.display()
        )));
    }

    ensure_dir(&target_dir).await?;

    fs::write(&plan_path, INIT_TEMPLATE)
        .await
        .map_err(|e| StrataError::io(format!("writing {}", plan_path.display()), e))?;

    ui::step_ok_detail(&ctx, "Created build plan", &plan_path.display().to_string());

    Ok(())
}

async fn ensure_dir(dir: &Path) -> StrataResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| StrataError::io(format!("creating directory {}", dir.display()), e))?;
    }
    Ok(())
}
