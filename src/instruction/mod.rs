//! Build instructions
//!
//! One module per instruction kind. Each kind knows which of its fields
//! feed the stage signature and in what canonical order, and how it
//! renders into a Containerfile line. The stage chain only ever sees the
//! closed `Instruction` enum, never a concrete kind.
//!
//! Signature tokens follow one rule everywhere: literal fields go in
//! verbatim (never normalized), and only locally referenced file content
//! is additionally checksummed. Cosmetically different instructions are
//! therefore different stages; precision beats hit rate.

mod add;
mod cmd;
mod copy;
mod entrypoint;
mod env;
mod expose;
mod healthcheck;
mod label;
mod maintainer;
mod onbuild;
mod run;
mod shell;
mod stop_signal;
mod user;
mod volume;
mod workdir;

pub use add::AddInstruction;
pub use cmd::CmdInstruction;
pub use copy::CopyInstruction;
pub use entrypoint::EntrypointInstruction;
pub use env::EnvInstruction;
pub use expose::ExposeInstruction;
pub use healthcheck::HealthcheckInstruction;
pub use label::LabelInstruction;
pub use maintainer::MaintainerInstruction;
pub use onbuild::OnBuildInstruction;
pub use run::RunInstruction;
pub use shell::ShellInstruction;
pub use stop_signal::StopSignalInstruction;
pub use user::UserInstruction;
pub use volume::VolumeInstruction;
pub use workdir::WorkdirInstruction;

use crate::context::BuildContextArchive;
use crate::error::StrataResult;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Everything an instruction may consult while producing its signature
/// tokens. Only copy-style instructions actually touch the context.
pub struct SignatureContext<'a> {
    pub archive: &'a BuildContextArchive,
    pub cancel: &'a CancellationToken,
}

/// A single parsed build instruction.
///
/// Closed set of kinds, tagged by `kind` in build plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
    Add(AddInstruction),
    Cmd(CmdInstruction),
    Copy(CopyInstruction),
    Entrypoint(EntrypointInstruction),
    Env(EnvInstruction),
    Expose(ExposeInstruction),
    Healthcheck(HealthcheckInstruction),
    Label(LabelInstruction),
    Maintainer(MaintainerInstruction),
    OnBuild(OnBuildInstruction),
    Run(RunInstruction),
    Shell(ShellInstruction),
    StopSignal(StopSignalInstruction),
    User(UserInstruction),
    Volume(VolumeInstruction),
    Workdir(WorkdirInstruction),
}

impl Instruction {
    /// Canonical kind discriminator, folded into every signature so two
    /// kinds with coincidentally identical fields never collide.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Instruction::Add(i) => i.kind_name(),
            Instruction::Cmd(i) => i.kind_name(),
            Instruction::Copy(i) => i.kind_name(),
            Instruction::Entrypoint(i) => i.kind_name(),
            Instruction::Env(i) => i.kind_name(),
            Instruction::Expose(i) => i.kind_name(),
            Instruction::Healthcheck(i) => i.kind_name(),
            Instruction::Label(i) => i.kind_name(),
            Instruction::Maintainer(i) => i.kind_name(),
            Instruction::OnBuild(i) => i.kind_name(),
            Instruction::Run(i) => i.kind_name(),
            Instruction::Shell(i) => i.kind_name(),
            Instruction::StopSignal(i) => i.kind_name(),
            Instruction::User(i) => i.kind_name(),
            Instruction::Volume(i) => i.kind_name(),
            Instruction::Workdir(i) => i.kind_name(),
        }
    }

    /// Kind-specific signature tokens, starting with the discriminator.
    ///
    /// Async because copy-style kinds may materialize the build context
    /// and checksum matched files; every other kind is pure.
    pub async fn signature_tokens(
        &self,
        ctx: &SignatureContext<'_>,
    ) -> StrataResult<Vec<String>> {
        match self {
            Instruction::Add(i) => i.signature_tokens(ctx).await,
            Instruction::Copy(i) => i.signature_tokens(ctx).await,
            Instruction::Cmd(i) => Ok(i.signature_tokens()),
            Instruction::Entrypoint(i) => Ok(i.signature_tokens()),
            Instruction::Env(i) => Ok(i.signature_tokens()),
            Instruction::Expose(i) => Ok(i.signature_tokens()),
            Instruction::Healthcheck(i) => Ok(i.signature_tokens()),
            Instruction::Label(i) => Ok(i.signature_tokens()),
            Instruction::Maintainer(i) => Ok(i.signature_tokens()),
            Instruction::OnBuild(i) => Ok(i.signature_tokens()),
            Instruction::Run(i) => Ok(i.signature_tokens()),
            Instruction::Shell(i) => Ok(i.signature_tokens()),
            Instruction::StopSignal(i) => Ok(i.signature_tokens()),
            Instruction::User(i) => Ok(i.signature_tokens()),
            Instruction::Volume(i) => Ok(i.signature_tokens()),
            Instruction::Workdir(i) => Ok(i.signature_tokens()),
        }
    }

    /// The Containerfile line this instruction renders to.
    pub fn render(&self) -> String {
        match self {
            Instruction::Add(i) => i.render(),
            Instruction::Cmd(i) => i.render(),
            Instruction::Copy(i) => i.render(),
            Instruction::Entrypoint(i) => i.render(),
            Instruction::Env(i) => i.render(),
            Instruction::Expose(i) => i.render(),
            Instruction::Healthcheck(i) => i.render(),
            Instruction::Label(i) => i.render(),
            Instruction::Maintainer(i) => i.render(),
            Instruction::OnBuild(i) => i.render(),
            Instruction::Run(i) => i.render(),
            Instruction::Shell(i) => i.render(),
            Instruction::StopSignal(i) => i.render(),
            Instruction::User(i) => i.render(),
            Instruction::Volume(i) => i.render(),
            Instruction::Workdir(i) => i.render(),
        }
    }
}

/// Append a `label, value` token pair.
pub(crate) fn push_pair(tokens: &mut Vec<String>, label: &str, value: impl Into<String>) {
    tokens.push(label.to_string());
    tokens.push(value.into());
}

/// Append a label followed by every value in order.
pub(crate) fn push_list(tokens: &mut Vec<String>, label: &str, values: &[String]) {
    tokens.push(label.to_string());
    tokens.extend(values.iter().cloned());
}

/// Render an argument vector in exec (JSON array) form.
pub(crate) fn exec_form(args: &[String]) -> String {
    let quoted: Vec<String> = args
        .iter()
        .map(|arg| {
            format!(
                "\"{}\"",
                arg.replace('\\', "\\\\").replace('"', "\\\"")
            )
        })
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Quote a value for ENV/LABEL lines. Values containing variable
/// references, spaces, quotes or backslashes must be quoted; embedded
/// quotes and backslashes are escaped to prevent injection.
pub(crate) fn containerfile_quote(value: &str) -> String {
    if value.contains('$') || value.contains(' ') || value.contains('"') || value.contains('\\') {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}
