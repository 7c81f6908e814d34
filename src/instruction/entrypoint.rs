//! ENTRYPOINT instruction

use crate::instruction::{exec_form, push_list, push_pair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrypointInstruction {
    pub command: Vec<String>,

    #[serde(default)]
    pub prepend_shell: bool,
}

impl EntrypointInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Entrypoint"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_list(&mut tokens, "Entrypoint", &self.command);
        push_pair(&mut tokens, "PrependShell", self.prepend_shell.to_string());
        tokens
    }

    pub fn render(&self) -> String {
        if self.prepend_shell {
            format!("ENTRYPOINT {}", self.command.join(" "))
        } else {
            format!("ENTRYPOINT {}", exec_form(&self.command))
        }
    }
}
