//! Integration tests for strata

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::path::Path;
use tempfile::TempDir;

/// Command with config and state redirected into an isolated home.
fn strata(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("strata");
    cmd.env("XDG_CONFIG_HOME", home.path().join("config"));
    cmd.env("XDG_STATE_HOME", home.path().join("state"));
    cmd.env_remove("STRATA_CONFIG");
    cmd
}

/// A small project whose plan copies from src/ and runs a build step.
fn write_project(dir: &Path) {
    std::fs::create_dir_all(dir.join("src")).unwrap();
    std::fs::write(dir.join("src/main.txt"), "fn main() {}\n").unwrap();
    std::fs::write(dir.join("src/util.txt"), "pub fn util() {}\n").unwrap();
    std::fs::write(
        dir.join("strata.toml"),
        r#"
[build]
name = "demo"
from = "docker.io/library/alpine:3.20"

[[stages]]
kind = "workdir"
path = "/app"

[[stages]]
name = "sources"
kind = "copy"
src = ["src/**"]
dst = "/app/"

[[stages]]
kind = "run"
command = ["sh /app/src/main.txt"]
"#,
    )
    .unwrap();
}

/// Run `sign --format plain` in a project and return stdout.
fn sign_plain(home: &TempDir, project: &Path, extra: &[&str]) -> String {
    let mut args = vec!["sign", "--format", "plain"];
    args.extend_from_slice(extra);
    let assert = strata(home)
        .current_dir(project)
        .args(&args)
        .assert()
        .success();
    String::from_utf8_lossy(&assert.get_output().stdout).to_string()
}

mod cli_tests {
    use super::*;
    use predicates::prelude::*;

    #[test]
    fn help_displays() {
        let home = TempDir::new().unwrap();
        strata(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "incremental container image builds",
            ));
    }

    #[test]
    fn version_displays() {
        let home = TempDir::new().unwrap();
        strata(&home)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("strata"));
    }

    #[test]
    fn init_writes_starter_plan() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        strata(&home)
            .current_dir(project.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Created build plan"));

        assert!(project.path().join("strata.toml").exists());
    }

    #[test]
    fn init_refuses_overwrite_without_force() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        std::fs::write(project.path().join("strata.toml"), "existing").unwrap();

        strata(&home)
            .current_dir(project.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));

        strata(&home)
            .current_dir(project.path())
            .args(["init", "--force"])
            .assert()
            .success();
    }

    #[test]
    fn sign_without_plan_fails_with_hint() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        strata(&home)
            .current_dir(project.path())
            .arg("sign")
            .assert()
            .failure()
            .stderr(
                predicate::str::contains("build plan not found")
                    .and(predicate::str::contains("pass --plan")),
            );
    }

    #[test]
    fn clean_days_zero_is_disabled() {
        let home = TempDir::new().unwrap();
        strata(&home)
            .args(["clean", "--days", "0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("disabled"));
    }

    #[test]
    fn clean_with_empty_store_reports_nothing() {
        let home = TempDir::new().unwrap();
        strata(&home)
            .arg("clean")
            .assert()
            .success()
            .stdout(predicate::str::contains("No build records older than"));
    }
}

mod signing_tests {
    use super::*;
    use predicates::prelude::*;

    #[test]
    fn sign_is_deterministic_across_runs() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write_project(project.path());

        let first = sign_plain(&home, project.path(), &[]);
        let second = sign_plain(&home, project.path(), &[]);

        assert_eq!(first, second);
        assert_eq!(first.lines().count(), 3);
        for line in first.lines() {
            let signature = line.split_whitespace().last().unwrap();
            assert_eq!(signature.len(), 64);
            assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn source_change_invalidates_downstream_stages() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write_project(project.path());

        let before: Vec<String> = sign_plain(&home, project.path(), &[])
            .lines()
            .map(String::from)
            .collect();

        std::fs::write(project.path().join("src/util.txt"), "pub fn util() { changed }\n")
            .unwrap();

        let after: Vec<String> = sign_plain(&home, project.path(), &[])
            .lines()
            .map(String::from)
            .collect();

        // The workdir stage precedes the copy, so it keeps its signature;
        // the copy and everything after it re-sign.
        assert_eq!(before[0], after[0]);
        assert_ne!(before[1], after[1]);
        assert_ne!(before[2], after[2]);
    }

    #[test]
    fn backend_identity_changes_signatures() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write_project(project.path());

        let podman = sign_plain(&home, project.path(), &[]);
        let docker = sign_plain(&home, project.path(), &["--backend", "docker"]);

        assert_ne!(podman, docker);
    }

    #[test]
    fn recorded_build_reports_cache_hits() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write_project(project.path());

        strata(&home)
            .current_dir(project.path())
            .args(["sign", "--record"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("No recorded build to compare against")
                    .and(predicate::str::contains("0 from cache"))
                    .and(predicate::str::contains("strata-demo:")),
            );

        strata(&home)
            .current_dir(project.path())
            .arg("sign")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("cache hit")
                    .and(predicate::str::contains("3 from cache")),
            );
    }

    #[test]
    fn changed_file_rebuilds_only_downstream() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write_project(project.path());

        strata(&home)
            .current_dir(project.path())
            .args(["sign", "--record"])
            .assert()
            .success();

        std::fs::write(project.path().join("src/main.txt"), "fn main() { v2 }\n").unwrap();

        strata(&home)
            .current_dir(project.path())
            .arg("sign")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("rebuilt")
                    .and(predicate::str::contains("1 from cache")),
            );
    }

    #[test]
    fn json_output_is_machine_readable() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write_project(project.path());

        strata(&home)
            .current_dir(project.path())
            .args(["sign", "--format", "json"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("\"plan\": \"demo\"")
                    .and(predicate::str::contains("\"resolution\": \"rebuilt\"")),
            );
    }

    #[test]
    fn unmatched_copy_globs_fail_naming_the_pattern() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        std::fs::write(
            project.path().join("strata.toml"),
            r#"
[build]
name = "empty"
from = "docker.io/library/alpine:3.20"

[[stages]]
kind = "copy"
src = ["nothing/**"]
dst = "/app/"
"#,
        )
        .unwrap();

        strata(&home)
            .current_dir(project.path())
            .arg("sign")
            .assert()
            .failure()
            .stderr(
                predicate::str::contains("no glob matches")
                    .and(predicate::str::contains("nothing/**")),
            );
    }

    #[test]
    fn render_prints_containerfile() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write_project(project.path());

        strata(&home)
            .current_dir(project.path())
            .arg("render")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("FROM docker.io/library/alpine:3.20")
                    .and(predicate::str::contains("WORKDIR /app"))
                    .and(predicate::str::contains("COPY src/** /app/"))
                    .and(predicate::str::contains("RUN sh /app/src/main.txt")),
            );
    }

    #[test]
    fn clean_removes_old_records() {
        let home = TempDir::new().unwrap();
        let builds = home.path().join("state/strata/builds");
        std::fs::create_dir_all(&builds).unwrap();
        std::fs::write(
            builds.join("ancient.json"),
            r#"{
                "plan": "ancient",
                "backend": "podman",
                "base_image": null,
                "stages": [],
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();

        strata(&home)
            .args(["clean", "--dry-run"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("ancient")
                    .and(predicate::str::contains("Dry run - would remove 1 record(s)")),
            );
        assert!(builds.join("ancient.json").exists());

        strata(&home)
            .arg("clean")
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 1 record(s)"));
        assert!(!builds.join("ancient.json").exists());
    }
}
