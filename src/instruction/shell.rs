//! SHELL instruction

use crate::instruction::{exec_form, push_list, push_pair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellInstruction {
    pub shell: Vec<String>,
}

impl ShellInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Shell"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_list(&mut tokens, "Shell", &self.shell);
        tokens
    }

    /// SHELL only accepts the JSON array form.
    pub fn render(&self) -> String {
        format!("SHELL {}", exec_form(&self.shell))
    }
}
