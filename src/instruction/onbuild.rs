//! ONBUILD instruction
//!
//! The trigger expression is carried as opaque text; it only runs in
//! downstream builds, so its literal form is its identity here.

use crate::instruction::push_pair;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnBuildInstruction {
    pub expression: String,
}

impl OnBuildInstruction {
    pub fn kind_name(&self) -> &'static str {
        "OnBuild"
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_pair(&mut tokens, "Expression", &self.expression);
        tokens
    }

    pub fn render(&self) -> String {
        format!("ONBUILD {}", self.expression)
    }
}
