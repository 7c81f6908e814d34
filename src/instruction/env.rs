//! ENV instruction
//!
//! Variables are kept in a sorted map so token order (and therefore the
//! signature) is independent of declaration order in the plan.

use crate::instruction::{containerfile_quote, push_pair};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvInstruction {
    pub vars: BTreeMap<String, String>,
}

impl EnvInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Env"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        tokens.push("Envs".to_string());
        for (key, value) in &self.vars {
            push_pair(&mut tokens, key, value);
        }
        tokens
    }

    pub fn render(&self) -> String {
        let pairs: Vec<String> = self
            .vars
            .iter()
            .map(|(key, value)| format!("{}={}", key, containerfile_quote(value)))
            .collect();
        format!("ENV {}", pairs.join(" "))
    }
}
