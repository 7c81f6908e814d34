//! Build plan loading
//!
//! A build plan (`strata.toml`) names the project, the base image, the
//! build context, and an ordered list of stages. Loading validates the
//! plan and lowers it into a [`StageChain`] ready for signing.

use crate::context::{BuildContextArchive, ContextSource};
use crate::error::{StrataError, StrataResult};
use crate::instruction::Instruction;
use crate::stage::{DependencyDeclaration, Stage, StageChain};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

/// Default plan file name, looked up in the working directory.
pub const PLAN_FILE_NAME: &str = "strata.toml";

/// The `[build]` table of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    /// Project name, used in image tags and store records.
    pub name: String,

    /// Base image reference, or `"scratch"` for no base.
    pub from: String,

    /// Build context directory or tar archive, relative to the plan file.
    #[serde(default = "default_context")]
    pub context: String,

    /// Backend override; the configured default applies when unset.
    #[serde(default)]
    pub backend: Option<String>,
}

fn default_context() -> String {
    ".".to_string()
}

/// One `[[stages]]` entry: an instruction plus chain metadata.
///
/// Instruction fields sit directly in the stage table next to `kind`,
/// so a stage reads as one flat block of TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSpec {
    /// Stage name; generated from position and kind when unset.
    #[serde(default)]
    pub name: Option<String>,

    /// Declared content dependencies beyond the build context.
    #[serde(default)]
    pub dependencies: Vec<DependencyDeclaration>,

    #[serde(flatten)]
    pub instruction: Instruction,
}

impl StageSpec {
    /// The name this stage goes by in the chain.
    pub fn effective_name(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!(
                "{index:02}-{}",
                self.instruction.kind_name().to_ascii_lowercase()
            ),
        }
    }
}

/// A parsed build plan.
///
/// Plans that come through [`BuildPlan::load`] or [`BuildPlan::parse`]
/// are validated: stage names are unique and stage references only
/// reach backwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildPlan {
    pub build: BuildSection,
    #[serde(default)]
    pub stages: Vec<StageSpec>,
}

impl BuildPlan {
    /// Load and validate a plan file.
    pub async fn load(path: &Path) -> StrataResult<Self> {
        if !path.exists() {
            return Err(StrataError::PlanNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| StrataError::io(format!("reading plan {}", path.display()), e))?;
        Self::parse(&content, path)
    }

    /// Parse and validate plan content, attributing errors to `path`.
    pub fn parse(content: &str, path: &Path) -> StrataResult<Self> {
        let plan: BuildPlan = toml::from_str(content).map_err(|e| StrataError::PlanInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        plan.validate(path)?;
        Ok(plan)
    }

    /// Effective stage names in plan order.
    pub fn stage_names(&self) -> Vec<String> {
        self.stages
            .iter()
            .enumerate()
            .map(|(index, spec)| spec.effective_name(index))
            .collect()
    }

    fn validate(&self, path: &Path) -> StrataResult<()> {
        let invalid = |reason: String| StrataError::PlanInvalid {
            path: path.to_path_buf(),
            reason,
        };

        if self.build.name.trim().is_empty() {
            return Err(invalid("build.name must not be empty".to_string()));
        }
        if self.build.from.trim().is_empty() {
            return Err(invalid(
                "build.from must not be empty; use \"scratch\" to start from nothing".to_string(),
            ));
        }
        if self.stages.is_empty() {
            return Err(invalid("a plan needs at least one [[stages]] entry".to_string()));
        }

        for spec in &self.stages {
            if spec.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
                return Err(invalid("stage names must not be empty".to_string()));
            }
        }

        let names = self.stage_names();
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(invalid(format!("duplicate stage name: {name}")));
            }
        }

        for (index, spec) in self.stages.iter().enumerate() {
            let earlier = &names[..index];

            for dependency in &spec.dependencies {
                if let DependencyDeclaration::Stage { stage } = dependency {
                    if !earlier.iter().any(|name| name == stage) {
                        return Err(invalid(format!(
                            "stage {} depends on {stage}, which is not an earlier stage",
                            names[index]
                        )));
                    }
                }
            }

            // `--from` may name an earlier stage or an external image,
            // never the current or a later stage.
            if let Instruction::Copy(copy) = &spec.instruction {
                if names[index..].iter().any(|name| name == &copy.from) {
                    return Err(invalid(format!(
                        "stage {} copies --from={}, which is not an earlier stage",
                        names[index], copy.from
                    )));
                }
            }
        }

        Ok(())
    }

    /// Lower the plan into a signable chain.
    ///
    /// `plan_dir` anchors the relative context path, `backend` is the
    /// effective backend after overrides, and `extraction_root` is where
    /// archive contexts are unpacked.
    pub fn into_chain(self, plan_dir: &Path, backend: &str, extraction_root: &Path) -> StageChain {
        let base_image = match self.build.from.as_str() {
            "scratch" => None,
            from => Some(from.to_string()),
        };

        let source = ContextSource::detect(plan_dir.join(&self.build.context));
        let archive = BuildContextArchive::new(source, extraction_root);

        let names = self.stage_names();
        let mut stages = Vec::with_capacity(self.stages.len());
        for (index, spec) in self.stages.into_iter().enumerate() {
            let mut dependencies = spec.dependencies;

            // COPY --from of an earlier stage is an implicit dependency
            // on that stage's content.
            if let Instruction::Copy(copy) = &spec.instruction {
                let from_stage = names[..index].iter().any(|name| name == &copy.from);
                let declared = dependencies.iter().any(|dependency| {
                    matches!(dependency, DependencyDeclaration::Stage { stage } if stage == &copy.from)
                });
                if from_stage && !declared {
                    dependencies.push(DependencyDeclaration::Stage {
                        stage: copy.from.clone(),
                    });
                }
            }

            stages.push(Stage::new(
                names[index].clone(),
                spec.instruction,
                dependencies,
                index > 0,
            ));
        }

        StageChain::new(stages, base_image, backend, archive)
    }
}
