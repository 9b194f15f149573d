pub mod anthropic;
pub mod error;
pub mod json;

/// A single prompt for a text completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
        }
    }
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Returns the raw completion text. Provider failures are reported as
    /// [`error::LlmDiagnosticsError`] inside the `anyhow::Error`.
    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String>;
}
