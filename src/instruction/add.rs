//! ADD instruction
//!
//! Sources may be local globs or remote URLs. Local sources contribute a
//! content checksum on top of their literal text; remote URLs contribute
//! their literal text only. A URL's remote content changing is invisible
//! to the cache: the textual form is taken as the caller's intended
//! identity for the reference, and no fetch happens here.

use crate::context::{context_globs_checksum, StatOptions};
use crate::error::StrataResult;
use crate::instruction::{push_list, push_pair, SignatureContext};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddInstruction {
    pub src: Vec<String>,
    pub dst: String,
    #[serde(default)]
    pub chown: String,
    #[serde(default)]
    pub chmod: String,
}

impl AddInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Add"
    }

    pub async fn signature_tokens(
        &self,
        ctx: &SignatureContext<'_>,
    ) -> StrataResult<Vec<String>> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_pair(&mut tokens, "Raw", self.render());
        push_list(&mut tokens, "Src", &self.src);
        push_pair(&mut tokens, "Dst", &self.dst);
        push_pair(&mut tokens, "Chown", &self.chown);
        push_pair(&mut tokens, "Chmod", &self.chmod);

        let local_globs: Vec<String> = self
            .src
            .iter()
            .filter(|src| !is_remote_url(src))
            .cloned()
            .collect();

        if !local_globs.is_empty() {
            let checksum = context_globs_checksum(
                ctx.archive,
                &local_globs,
                StatOptions {
                    check_for_archives: true,
                },
                ctx.cancel,
            )
            .await?;
            push_pair(&mut tokens, "SrcChecksum", checksum);
        }

        Ok(tokens)
    }

    pub fn render(&self) -> String {
        let mut parts = vec!["ADD".to_string()];
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

fn is_remote_url(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}
