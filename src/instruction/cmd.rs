//! CMD instruction

use crate::instruction::{exec_form, push_list, push_pair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmdInstruction {
    pub command: Vec<String>,

    #[serde(default)]
    pub prepend_shell: bool,
}

impl CmdInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Cmd"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_list(&mut tokens, "Cmd", &self.command);
        push_pair(&mut tokens, "PrependShell", self.prepend_shell.to_string());
        tokens
    }

    pub fn render(&self) -> String {
        if self.prepend_shell {
            format!("CMD {}", self.command.join(" "))
        } else {
            format!("CMD {}", exec_form(&self.command))
        }
    }
}
