use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

const MAX_DETAIL_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub status: Option<u16>,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    pub fn is_rate_limited(&self) -> bool {
        self.status == Some(429)
    }

    /// Upstream bodies can be large; keep logs to a bounded prefix.
    pub fn truncated_output(&self) -> Option<String> {
        self.raw_output.as_deref().map(truncate)
    }
}

pub fn truncate(s: &str) -> String {
    match s.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={}, stage={}): {}",
            self.provider.as_str(),
            self.stage,
            self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_output_on_char_boundary() {
        let long = "é".repeat(MAX_DETAIL_CHARS + 10);
        let out = truncate(&long);
        assert_eq!(out.chars().count(), MAX_DETAIL_CHARS + 1);
        assert!(out.ends_with('…'));
        assert_eq!(truncate("short"), "short");
    }
}
