//! RUN instruction

use crate::instruction::{exec_form, push_list, push_pair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInstruction {
    pub command: Vec<String>,

    /// Shell form (`RUN make build`) wraps the command in the image
    /// shell; exec form (`RUN ["make", "build"]`) does not. Shell form
    /// is the default, matching how RUN lines are usually written.
    #[serde(default = "default_prepend_shell")]
    pub prepend_shell: bool,

    /// `--network=` flag value, empty for the backend default
    #[serde(default)]
    pub network: String,

    /// `--security=` flag value, empty for the backend default
    #[serde(default)]
    pub security: String,

    /// `--mount=` specs, folded into the signature in sorted order
    #[serde(default)]
    pub mounts: Vec<String>,
}

fn default_prepend_shell() -> bool {
    true
}

impl RunInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Run"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_list(&mut tokens, "Command", &self.command);
        push_pair(&mut tokens, "PrependShell", self.prepend_shell.to_string());
        push_pair(&mut tokens, "Network", &self.network);
        push_pair(&mut tokens, "Security", &self.security);

        let mut mounts = self.mounts.clone();
        mounts.sort();
        push_list(&mut tokens, "Mounts", &mounts);

        tokens
    }

    pub fn render(&self) -> String {
        let mut parts = vec!["RUN".to_string()];
        if !self.network.is_empty() {
            parts.push(format!("--network={}", self.network));
        }
        if !self.security.is_empty() {
            parts.push(format!("--security={}", self.security));
        }
        for mount in &self.mounts {
            parts.push(format!("--mount={mount}"));
        }
        if self.prepend_shell {
            parts.push(self.command.join(" "));
        } else {
            parts.push(exec_form(&self.command));
        }
        parts.join(" ")
    }
}
