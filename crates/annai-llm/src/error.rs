use thiserror::Error;

/// Errors from the hosted text-generation call.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API credential was supplied. Checked at client construction,
    /// before any request is attempted.
    #[error("missing API key for the generation service: set GROQ_API_KEY")]
    MissingApiKey,

    /// The credential cannot form a valid Authorization header.
    #[error("API key is not a valid header value")]
    InvalidApiKey,

    /// Transport-level failure: connect, timeout, or response decoding.
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status after retries.
    #[error("generation service returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The service answered 200 but with no usable completion.
    #[error("generation service returned an empty completion")]
    EmptyCompletion,
}

/// Result type alias for generation-client operations.
pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_names_the_env_var() {
        assert!(LlmError::MissingApiKey.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn api_error_carries_status_and_body() {
        let err = LlmError::Api {
            status: 429,
            body: "rate limited".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("rate limited"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LlmError>();
    }
}
