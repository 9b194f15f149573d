use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("hotel {0} not found")]
    HotelNotFound(Uuid),
    #[error("AI provider rate limit exceeded")]
    RateLimited,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PricingError {
    /// HTTP status the API answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::RateLimited => 429,
            Self::Configuration(_) | Self::HotelNotFound(_) | Self::Internal(_) => 500,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest(message) => message.clone(),
            Self::RateLimited => {
                "Our pricing assistant is busy right now. Please try again in a minute.".to_owned()
            }
            Self::Configuration(_) => "Price recommendations are not available right now.".to_owned(),
            Self::HotelNotFound(_) => "The requested hotel could not be found.".to_owned(),
            Self::Internal(_) => "Failed to generate a price recommendation.".to_owned(),
        }
    }

    /// Errors worth reporting to Sentry.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::HotelNotFound(_) | Self::Internal(_)
        )
    }
}
