//! Stage model
//!
//! A stage is one instruction's worth of build work, chained to its
//! predecessor's output. Stages are created once per build plan and are
//! immutable apart from their build-attempt state, which only ever moves
//! forward: pending, signed, resolved.

pub mod chain;

pub use chain::StageChain;

use crate::error::{StrataError, StrataResult};
use crate::instruction::Instruction;
use crate::signature::Signature;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An external reference whose resolved content feeds a stage signature.
///
/// The declaration literal never enters the signature; whatever it
/// resolves to does. Renaming a stage dependency without changing what
/// it points at leaves signatures untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DependencyDeclaration {
    /// Another image; `digest` pins its resolved content
    Image {
        reference: String,
        #[serde(default)]
        digest: Option<String>,
    },

    /// An earlier stage in the same plan, by name
    Stage { stage: String },
}

/// Resolves image dependencies to content tokens.
///
/// Stage dependencies are resolved by the chain itself, which already
/// holds the signed predecessor; only image references go through here.
#[async_trait]
pub trait DependencyResolver: Send + Sync {
    async fn resolve(&self, dependency: &DependencyDeclaration) -> StrataResult<Vec<String>>;
}

/// Resolver that only accepts pre-pinned image digests.
///
/// No registry access happens during signing, so an unpinned image
/// reference is a plan error rather than something to look up.
pub struct PinnedResolver;

#[async_trait]
impl DependencyResolver for PinnedResolver {
    async fn resolve(&self, dependency: &DependencyDeclaration) -> StrataResult<Vec<String>> {
        match dependency {
            DependencyDeclaration::Image {
                digest: Some(digest),
                ..
            } => Ok(vec!["ImageDigest".to_string(), digest.clone()]),
            DependencyDeclaration::Image {
                reference,
                digest: None,
            } => Err(StrataError::DependencyResolve {
                name: reference.clone(),
                reason: "image dependency has no pinned digest".to_string(),
            }),
            DependencyDeclaration::Stage { stage } => Err(StrataError::DependencyResolve {
                name: stage.clone(),
                reason: "stage dependencies are resolved by the chain".to_string(),
            }),
        }
    }
}

/// How the build driver settled a signed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    CacheHit,
    Rebuilt,
}

/// Per-stage progress within one build attempt. There is no way back to
/// `Pending` once signed.
#[derive(Debug, Clone, PartialEq)]
pub enum StageState {
    Pending,
    Signed(Signature),
    Resolved(Signature, Resolution),
}

/// One stage of a build plan.
pub struct Stage {
    name: String,
    instruction: Instruction,
    rendered: String,
    dependencies: Vec<DependencyDeclaration>,
    has_prev_stage: bool,
    state: StageState,
}

impl Stage {
    pub fn new(
        name: impl Into<String>,
        instruction: Instruction,
        dependencies: Vec<DependencyDeclaration>,
        has_prev_stage: bool,
    ) -> Self {
        let rendered = instruction.render();
        Self {
            name: name.into(),
            instruction,
            rendered,
            dependencies,
            has_prev_stage,
            state: StageState::Pending,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instruction(&self) -> &Instruction {
        &self.instruction
    }

    /// The backend-facing Containerfile line for this stage.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub fn dependencies(&self) -> &[DependencyDeclaration] {
        &self.dependencies
    }

    pub fn has_prev_stage(&self) -> bool {
        self.has_prev_stage
    }

    pub fn state(&self) -> &StageState {
        &self.state
    }

    pub fn signature(&self) -> Option<&Signature> {
        match &self.state {
            StageState::Pending => None,
            StageState::Signed(sig) | StageState::Resolved(sig, _) => Some(sig),
        }
    }

    pub(crate) fn mark_signed(&mut self, signature: Signature) -> StrataResult<()> {
        match self.state {
            StageState::Pending => {
                self.state = StageState::Signed(signature);
                Ok(())
            }
            _ => Err(StrataError::StageAlreadyResolved {
                stage: self.name.clone(),
            }),
        }
    }

    pub(crate) fn mark_resolved(&mut self, resolution: Resolution) -> StrataResult<()> {
        match &self.state {
            StageState::Pending => Err(StrataError::StageNotSigned {
                stage: self.name.clone(),
            }),
            StageState::Signed(signature) => {
                self.state = StageState::Resolved(signature.clone(), resolution);
                Ok(())
            }
            StageState::Resolved(_, _) => Err(StrataError::StageAlreadyResolved {
                stage: self.name.clone(),
            }),
        }
    }
}
