//! VOLUME instruction

use crate::instruction::{push_list, push_pair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeInstruction {
    pub volumes: Vec<String>,
}

impl VolumeInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Volume"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_list(&mut tokens, "Volumes", &self.volumes);
        tokens
    }

    pub fn render(&self) -> String {
        format!("VOLUME {}", self.volumes.join(" "))
    }
}
