//! Stage chain
//!
//! Sequences stages in build order and links every signature to its
//! predecessor's. Each stage's token stream starts with the previous
//! stage's resolved identity (or an explicit no-predecessor marker), the
//! backend identity, and the resolved content of declared dependencies;
//! the instruction's own contribution comes last. Because stage k+1
//! embeds stage k's signature, changing any stage invalidates everything
//! after it and nothing before it.

use crate::context::BuildContextArchive;
use crate::error::{StrataError, StrataResult};
use crate::instruction::{push_pair, SignatureContext};
use crate::signature::Signature;
use crate::stage::{DependencyDeclaration, DependencyResolver, Resolution, Stage};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Owns the stages of one build plan, the shared build context, and the
/// configuration folded into every signature.
pub struct StageChain {
    stages: Vec<Stage>,
    base_image: Option<String>,
    backend: String,
    archive: BuildContextArchive,
}

impl StageChain {
    /// `base_image` is the first stage's predecessor identity; `None`
    /// means the build starts from scratch.
    pub fn new(
        stages: Vec<Stage>,
        base_image: Option<String>,
        backend: impl Into<String>,
        archive: BuildContextArchive,
    ) -> Self {
        Self {
            stages,
            base_image,
            backend: backend.into(),
            archive,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// `None` when the build starts from scratch.
    pub fn base_image(&self) -> Option<&str> {
        self.base_image.as_deref()
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn archive(&self) -> &BuildContextArchive {
        &self.archive
    }

    /// Compute one stage's signature given its predecessor's identity.
    ///
    /// Pure with respect to the chain: no state is recorded. Stage
    /// dependencies are resolved from already-signed stages in this
    /// chain; image dependencies go through `resolver`.
    pub async fn compute_signature(
        &self,
        index: usize,
        prev_identity: Option<&str>,
        resolver: &dyn DependencyResolver,
        cancel: &CancellationToken,
    ) -> StrataResult<Signature> {
        let stage = self
            .stages
            .get(index)
            .ok_or_else(|| StrataError::StageNotFound(format!("#{index}")))?;

        // A non-first stage without a predecessor identity would sign as
        // if it were first, breaking invalidation of everything after it.
        if stage.has_prev_stage() && prev_identity.is_none() {
            return Err(StrataError::StageNotSigned {
                stage: self.stages[index.saturating_sub(1)].name().to_string(),
            });
        }

        let mut tokens = Vec::new();
        match prev_identity {
            Some(identity) => push_pair(&mut tokens, "PrevImage", identity),
            None => tokens.push("NoPrevImage".to_string()),
        }
        push_pair(&mut tokens, "Backend", &self.backend);

        for dependency in stage.dependencies() {
            match dependency {
                DependencyDeclaration::Stage { stage: target } => {
                    let signature = self.signed_signature_of(target)?;
                    push_pair(&mut tokens, "StageDependency", signature.as_str());
                }
                image => tokens.extend(resolver.resolve(image).await?),
            }
        }

        let ctx = SignatureContext {
            archive: &self.archive,
            cancel,
        };
        tokens.extend(stage.instruction().signature_tokens(&ctx).await?);

        Ok(Signature::of_tokens(&tokens))
    }

    fn signed_signature_of(&self, name: &str) -> StrataResult<&Signature> {
        let stage = self
            .stages
            .iter()
            .find(|stage| stage.name() == name)
            .ok_or_else(|| StrataError::StageNotFound(name.to_string()))?;
        stage.signature().ok_or_else(|| StrataError::StageNotSigned {
            stage: name.to_string(),
        })
    }

    /// Sign every stage in build order, feeding each signature forward
    /// as the next stage's predecessor identity.
    ///
    /// Strictly sequential: stage k's signature needs stage k-1's. The
    /// first failure aborts the walk and leaves later stages pending.
    pub async fn sign_all(
        &mut self,
        resolver: &dyn DependencyResolver,
        cancel: &CancellationToken,
    ) -> StrataResult<()> {
        let mut prev_identity = self.base_image.clone();

        for index in 0..self.stages.len() {
            let signature = self
                .compute_signature(index, prev_identity.as_deref(), resolver, cancel)
                .await?;
            debug!(
                "Signed stage {} as {}",
                self.stages[index].name(),
                signature.short()
            );
            prev_identity = Some(signature.as_str().to_string());
            self.stages[index].mark_signed(signature)?;
        }

        Ok(())
    }

    /// Record the build driver's verdict for a signed stage.
    pub fn resolve_stage(&mut self, name: &str, resolution: Resolution) -> StrataResult<()> {
        let stage = self
            .stages
            .iter_mut()
            .find(|stage| stage.name() == name)
            .ok_or_else(|| StrataError::StageNotFound(name.to_string()))?;
        stage.mark_resolved(resolution)
    }

    /// Drop the extracted build context, once the whole build is done.
    pub async fn cleanup(&self) {
        self.archive.cleanup().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextSource;
    use crate::instruction::{
        CopyInstruction, EnvInstruction, Instruction, RunInstruction, WorkdirInstruction,
    };
    use crate::stage::{PinnedResolver, StageState};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn run(command: &str) -> Instruction {
        Instruction::Run(RunInstruction {
            command: vec![command.to_string()],
            prepend_shell: true,
            network: String::new(),
            security: String::new(),
            mounts: Vec::new(),
        })
    }

    fn workdir(path: &str) -> Instruction {
        Instruction::Workdir(WorkdirInstruction {
            path: path.to_string(),
        })
    }

    fn env(key: &str, value: &str) -> Instruction {
        Instruction::Env(EnvInstruction {
            vars: BTreeMap::from([(key.to_string(), value.to_string())]),
        })
    }

    // None of the instructions in these tests reference context files,
    // so the context is never materialized and need not exist
    fn pure_archive() -> BuildContextArchive {
        BuildContextArchive::new(
            ContextSource::Directory(PathBuf::from("unused-context")),
            "unused-extract",
        )
    }

    fn chain(instructions: Vec<Instruction>, base_image: Option<&str>) -> StageChain {
        let stages = instructions
            .into_iter()
            .enumerate()
            .map(|(index, instruction)| {
                Stage::new(format!("stage-{index}"), instruction, Vec::new(), index > 0)
            })
            .collect();
        StageChain::new(
            stages,
            base_image.map(|s| s.to_string()),
            "podman",
            pure_archive(),
        )
    }

    async fn signatures_of(chain: &mut StageChain) -> Vec<Signature> {
        chain
            .sign_all(&PinnedResolver, &CancellationToken::new())
            .await
            .unwrap();
        chain
            .stages()
            .iter()
            .map(|stage| stage.signature().unwrap().clone())
            .collect()
    }

    #[tokio::test]
    async fn signing_is_deterministic() {
        let instructions = || vec![workdir("/app"), run("make build"), env("TERM", "xterm")];

        let first = signatures_of(&mut chain(instructions(), Some("alpine:3.20"))).await;
        let second = signatures_of(&mut chain(instructions(), Some("alpine:3.20"))).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn changing_a_stage_invalidates_it_and_everything_after() {
        let base = signatures_of(&mut chain(
            vec![workdir("/app"), run("make build"), env("TERM", "xterm")],
            Some("alpine:3.20"),
        ))
        .await;
        let changed = signatures_of(&mut chain(
            vec![workdir("/app"), run("make test"), env("TERM", "xterm")],
            Some("alpine:3.20"),
        ))
        .await;

        assert_eq!(base[0], changed[0]);
        assert_ne!(base[1], changed[1]);
        assert_ne!(base[2], changed[2]);
    }

    #[tokio::test]
    async fn base_image_change_invalidates_the_whole_chain() {
        let on_320 = signatures_of(&mut chain(
            vec![workdir("/app"), run("make build")],
            Some("alpine:3.20"),
        ))
        .await;
        let on_321 = signatures_of(&mut chain(
            vec![workdir("/app"), run("make build")],
            Some("alpine:3.21"),
        ))
        .await;

        assert_ne!(on_320[0], on_321[0]);
        assert_ne!(on_320[1], on_321[1]);
    }

    #[tokio::test]
    async fn scratch_differs_from_any_base_image() {
        let from_scratch =
            signatures_of(&mut chain(vec![workdir("/app")], None)).await;
        let from_base =
            signatures_of(&mut chain(vec![workdir("/app")], Some("alpine:3.20"))).await;
        assert_ne!(from_scratch[0], from_base[0]);
    }

    #[tokio::test]
    async fn backend_identity_participates() {
        let mut on_podman = chain(vec![workdir("/app")], Some("alpine:3.20"));
        let mut on_docker = chain(vec![workdir("/app")], Some("alpine:3.20"));
        on_docker.backend = "docker".to_string();

        let podman_sigs = signatures_of(&mut on_podman).await;
        let docker_sigs = signatures_of(&mut on_docker).await;
        assert_ne!(podman_sigs[0], docker_sigs[0]);
    }

    #[tokio::test]
    async fn image_dependency_content_counts_not_its_literal() {
        let with_dep = |reference: &str, digest: &str| {
            let stages = vec![Stage::new(
                "stage-0",
                workdir("/app"),
                vec![DependencyDeclaration::Image {
                    reference: reference.to_string(),
                    digest: Some(digest.to_string()),
                }],
                false,
            )];
            StageChain::new(
                stages,
                Some("alpine:3.20".to_string()),
                "podman",
                pure_archive(),
            )
        };

        let original = signatures_of(&mut with_dep("tools:v1", "sha256:aaa")).await;
        let renamed = signatures_of(&mut with_dep("tools:v1-renamed", "sha256:aaa")).await;
        let repinned = signatures_of(&mut with_dep("tools:v1", "sha256:bbb")).await;

        // Renaming the reference changes nothing; new content changes all
        assert_eq!(original[0], renamed[0]);
        assert_ne!(original[0], repinned[0]);
    }

    #[tokio::test]
    async fn stage_dependency_folds_in_the_signed_signature() {
        let make_chain = |builder_cmd: &str| {
            let stages = vec![
                Stage::new("builder", run(builder_cmd), Vec::new(), false),
                Stage::new(
                    "package",
                    Instruction::Copy(CopyInstruction {
                        src: vec!["/build/out".to_string()],
                        dst: "/app".to_string(),
                        from: "builder".to_string(),
                        chown: String::new(),
                        chmod: String::new(),
                    }),
                    vec![DependencyDeclaration::Stage {
                        stage: "builder".to_string(),
                    }],
                    true,
                ),
            ];
            StageChain::new(
                stages,
                Some("alpine:3.20".to_string()),
                "podman",
                pure_archive(),
            )
        };

        let original = signatures_of(&mut make_chain("make build")).await;
        let changed = signatures_of(&mut make_chain("make build --release")).await;
        assert_ne!(original[1], changed[1]);
    }

    #[tokio::test]
    async fn forward_stage_dependency_fails_as_unsigned() {
        let stages = vec![
            Stage::new(
                "early",
                workdir("/app"),
                vec![DependencyDeclaration::Stage {
                    stage: "late".to_string(),
                }],
                false,
            ),
            Stage::new("late", run("make build"), Vec::new(), true),
        ];
        let mut chain = StageChain::new(
            stages,
            Some("alpine:3.20".to_string()),
            "podman",
            pure_archive(),
        );

        let err = chain
            .sign_all(&PinnedResolver, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::StageNotSigned { ref stage } if stage == "late"));
    }

    #[tokio::test]
    async fn unknown_stage_dependency_is_not_found() {
        let stages = vec![Stage::new(
            "only",
            workdir("/app"),
            vec![DependencyDeclaration::Stage {
                stage: "ghost".to_string(),
            }],
            false,
        )];
        let mut chain = StageChain::new(
            stages,
            Some("alpine:3.20".to_string()),
            "podman",
            pure_archive(),
        );

        let err = chain
            .sign_all(&PinnedResolver, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::StageNotFound(ref name) if name == "ghost"));
    }

    #[tokio::test]
    async fn sign_all_leaves_every_stage_signed() {
        let mut chain = chain(
            vec![workdir("/app"), run("make build")],
            Some("alpine:3.20"),
        );
        chain
            .sign_all(&PinnedResolver, &CancellationToken::new())
            .await
            .unwrap();

        for stage in chain.stages() {
            assert!(matches!(stage.state(), StageState::Signed(_)));
        }
    }

    #[tokio::test]
    async fn later_stage_needs_its_predecessor_identity() {
        let chain = chain(
            vec![workdir("/app"), run("make build")],
            Some("alpine:3.20"),
        );

        let err = chain
            .compute_signature(1, None, &PinnedResolver, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::StageNotSigned { ref stage } if stage == "stage-0"));
    }

    #[tokio::test]
    async fn resolve_records_the_driver_verdict() {
        let mut chain = chain(vec![workdir("/app")], Some("alpine:3.20"));
        chain
            .sign_all(&PinnedResolver, &CancellationToken::new())
            .await
            .unwrap();

        chain.resolve_stage("stage-0", Resolution::CacheHit).unwrap();
        assert!(matches!(
            chain.stages()[0].state(),
            StageState::Resolved(_, Resolution::CacheHit)
        ));

        let err = chain.resolve_stage("ghost", Resolution::Rebuilt).unwrap_err();
        assert!(matches!(err, StrataError::StageNotFound(_)));
    }
}
