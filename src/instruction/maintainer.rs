//! MAINTAINER instruction (deprecated upstream, still accepted)

use crate::instruction::push_pair;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintainerInstruction {
    pub maintainer: String,
}

impl MaintainerInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Maintainer"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_pair(&mut tokens, "Maintainer", &self.maintainer);
        tokens
    }

    pub fn render(&self) -> String {
        format!("MAINTAINER {}", self.maintainer)
    }
}
