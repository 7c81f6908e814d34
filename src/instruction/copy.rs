//! COPY instruction
//!
//! Unlike ADD, sources are always local paths. When `from` names another
//! stage the sources live in that stage's filesystem, so no local
//! checksum is taken; the plan loader turns `from` into a stage
//! dependency instead and the chain folds that stage's resolved state in.

use crate::context::{context_globs_checksum, StatOptions};
use crate::error::StrataResult;
use crate::instruction::{push_list, push_pair, SignatureContext};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyInstruction {
    pub src: Vec<String>,
    pub dst: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub chown: String,
    #[serde(default)]
    pub chmod: String,
}

impl CopyInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Copy"
    }

    pub async fn signature_tokens(
        &self,
        ctx: &SignatureContext<'_>,
    ) -> StrataResult<Vec<String>> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_pair(&mut tokens, "Raw", self.render());
        push_pair(&mut tokens, "From", &self.from);
        push_list(&mut tokens, "Src", &self.src);
        push_pair(&mut tokens, "Dst", &self.dst);
        push_pair(&mut tokens, "Chown", &self.chown);
        push_pair(&mut tokens, "Chmod", &self.chmod);

        if self.from.is_empty() && !self.src.is_empty() {
            let checksum = context_globs_checksum(
                ctx.archive,
                &self.src,
                StatOptions::default(),
                ctx.cancel,
            )
            .await?;
            push_pair(&mut tokens, "SrcChecksum", checksum);
        }

        Ok(tokens)
    }

    pub fn render(&self) -> String {
        let mut parts = vec!["COPY".to_string()];
        if !self.from.is_empty() {
            parts.push(format!("--from={}", self.from));
        }
        if !self.chown.is_empty() {
            parts.push(format!("--chown={}", self.chown));
        }
        if !self.chmod.is_empty() {
            parts.push(format!("--chmod={}", self.chmod));
        }
        parts.extend(self.src.iter().cloned());
        parts.push(self.dst.clone());
        parts.join(" ")
    }
}
