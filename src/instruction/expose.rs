//! EXPOSE instruction
//!
//! Ports keep their declaration order: `EXPOSE 80 443` and
//! `EXPOSE 443 80` are distinct stages.

use crate::instruction::{push_list, push_pair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposeInstruction {
    pub ports: Vec<String>,
}

impl ExposeInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Expose"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_list(&mut tokens, "Expose", &self.ports);
        tokens
    }

    pub fn render(&self) -> String {
        format!("EXPOSE {}", self.ports.join(" "))
    }
}
