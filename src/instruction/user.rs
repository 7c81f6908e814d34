//! USER instruction

use crate::instruction::push_pair;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInstruction {
    pub user: String,
}

impl UserInstruction {
    pub fn kind_name(&self) -> &'static str {
        "User"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_pair(&mut tokens, "User", &self.user);
        tokens
    }

    pub fn render(&self) -> String {
        format!("USER {}", self.user)
    }
}
