//! LABEL instruction

use crate::instruction::{containerfile_quote, push_pair};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelInstruction {
    pub labels: BTreeMap<String, String>,
}

impl LabelInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Label"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        tokens.push("Labels".to_string());
        for (key, value) in &self.labels {
            push_pair(&mut tokens, key, value);
        }
        tokens
    }

    pub fn render(&self) -> String {
        let pairs: Vec<String> = self
            .labels
            .iter()
            .map(|(key, value)| format!("{}={}", key, containerfile_quote(value)))
            .collect();
        format!("LABEL {}", pairs.join(" "))
    }
}
