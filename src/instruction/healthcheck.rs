//! HEALTHCHECK instruction
//!
//! Durations stay in their textual form ("30s", "1m30s"); parsing them
//! would normalize away differences the signature should see.

use crate::instruction::{push_list, push_pair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthcheckInstruction {
    /// Probe command; empty disables inherited healthchecks
    #[serde(default)]
    pub test: Vec<String>,

    #[serde(default)]
    pub interval: Option<String>,

    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub start_period: Option<String>,

    #[serde(default)]
    pub retries: Option<u32>,
}

impl HealthcheckInstruction {
    pub fn kind_name(&self) -> &'static str {
        "Healthcheck"
    }

    /// `NONE` disables inherited healthchecks, anything else probes.
    pub fn check_type(&self) -> &'static str {
        if self.test.is_empty() {
            "NONE"
        } else {
            "CMD"
        }
    }

    pub fn signature_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        push_pair(&mut tokens, "Instruction", self.kind_name());
        push_pair(&mut tokens, "Type", self.check_type());
        push_list(&mut tokens, "Test", &self.test);
        push_pair(&mut tokens, "Interval", self.interval.clone().unwrap_or_default());
        push_pair(&mut tokens, "Timeout", self.timeout.clone().unwrap_or_default());
        push_pair(
            &mut tokens,
            "StartPeriod",
            self.start_period.clone().unwrap_or_default(),
        );
        push_pair(
            &mut tokens,
            "Retries",
            self.retries.map(|r| r.to_string()).unwrap_or_default(),
        );
        tokens
    }

    pub fn render(&self) -> String {
        if self.test.is_empty() {
            return "HEALTHCHECK NONE".to_string();
        }
        let mut parts = vec!["HEALTHCHECK".to_string()];
        if let Some(interval) = &self.interval {
            parts.push(format!("--interval={interval}"));
        }
        if let Some(timeout) = &self.timeout {
            parts.push(format!("--timeout={timeout}"));
        }
        if let Some(start_period) = &self.start_period {
            parts.push(format!("--start-period={start_period}"));
        }
        if let Some(retries) = self.retries {
            parts.push(format!("--retries={retries}"));
        }
        parts.push("CMD".to_string());
        parts.push(self.test.join(" "));
        parts.join(" ")
    }
}
