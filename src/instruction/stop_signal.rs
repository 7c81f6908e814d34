//! STOPSIGNAL instruction

use crate::instruction::push_pair;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopSignalInstruction {
    pub signal: String,
}

impl StopSignalInstruction {
    pub fn kind_name(&self) -> &'static str {
        "StopSignal"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_pair(&mut tokens, "Signal", &self.signal);
        tokens
    }

    pub fn render(&self) -> String {
        format!("STOPSIGNAL {}", self.signal)
    }
}
