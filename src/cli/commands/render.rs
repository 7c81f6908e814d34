//! Render command - print a plan as Containerfile lines

use std::path::PathBuf;

use crate::cli::args::RenderArgs;
use crate::error::StrataResult;
use crate::plan::{BuildPlan, PLAN_FILE_NAME};

/// Execute the render command
///
/// Output is plain text on stdout so it can be piped straight into a
/// backend or diffed against a hand-written Containerfile.
pub async fn execute(args: RenderArgs) -> StrataResult<()> {
    let plan_path = args
        .plan
        .unwrap_or_else(|| PathBuf::from(PLAN_FILE_NAME));
    let plan = BuildPlan::load(&plan_path).await?;

    for line in render_lines(&plan) {
        println!("{line}");
    }

    Ok(())
}

/// One FROM line, then each stage instruction in plan order.
fn render_lines(plan: &BuildPlan) -> Vec<String> {
    let mut lines = Vec::with_capacity(plan.stages.len() + 1);
    lines.push(format!("FROM {}", plan.build.from));
    for spec in &plan.stages {
        lines.push(spec.instruction.render());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn lines_follow_plan_order() {
        let plan = BuildPlan::parse(
            r#"
            [build]
            name = "app"
            from = "docker.io/library/alpine:3.20"

            [[stages]]
            kind = "workdir"
            path = "/app"

            [[stages]]
            kind = "run"
            command = ["make build"]

            [[stages]]
            kind = "cmd"
            command = ["/app/bin/server"]
            prepend_shell = false
            "#,
            Path::new("strata.toml"),
        )
        .unwrap();

        assert_eq!(
            render_lines(&plan),
            vec![
                "FROM docker.io/library/alpine:3.20",
                "WORKDIR /app",
                "RUN make build",
                "CMD [\"/app/bin/server\"]",
            ]
        );
    }

    #[test]
    fn scratch_base_renders_verbatim() {
        let plan = BuildPlan::parse(
            r#"
            [build]
            name = "static"
            from = "scratch"

            [[stages]]
            kind = "copy"
            src = ["server"]
            dst = "/server"
            "#,
            Path::new("strata.toml"),
        )
        .unwrap();

        assert_eq!(
            render_lines(&plan),
            vec!["FROM scratch", "COPY server /server"]
        );
    }

    #[test]
    fn copy_from_stage_stays_in_the_output() {
        let plan = BuildPlan::parse(
            r#"
            [build]
            name = "app"
            from = "debian:12"

            [[stages]]
            name = "builder"
            kind = "run"
            command = ["cargo build --release"]

            [[stages]]
            kind = "copy"
            from = "builder"
            src = ["target/release/app"]
            dst = "/usr/local/bin/app"
            "#,
            Path::new("strata.toml"),
        )
        .unwrap();

        let lines = render_lines(&plan);
        assert_eq!(
            lines[2],
            "COPY --from=builder target/release/app /usr/local/bin/app"
        );
    }
}
