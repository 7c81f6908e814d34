//! WORKDIR instruction

use crate::instruction::push_pair;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkdirInstruction {
    pub path: String,
}

impl WorkdirInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Workdir"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_pair(&mut tokens, "Workdir", &self.path);
        tokens
    }

    pub fn render(&self) -> String {
        format!("WORKDIR {}", self.path)
    }
}
