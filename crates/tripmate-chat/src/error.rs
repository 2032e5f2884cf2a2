//! Error types for the conversational core.

use tripmate_core::error::TripmateError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("LLM error: {0}")]
    Llm(String),
    #[error("extraction error: {0}")]
    Extraction(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<TripmateError> for ChatError {
    fn from(err: TripmateError) -> Self {
        ChatError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Llm(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::Disabled;
        assert_eq!(err.to_string(), "chat is disabled");

        let err = ChatError::EmptyMessage;
        assert_eq!(err.to_string(), "message cannot be empty");

        let err = ChatError::MessageTooLong(2000);
        assert_eq!(
            err.to_string(),
            "message exceeds maximum length of 2000 characters"
        );

        let id = Uuid::new_v4();
        let err = ChatError::SessionNotFound(id);
        assert_eq!(err.to_string(), format!("session not found: {}", id));

        let err = ChatError::Llm("quota exceeded".to_string());
        assert_eq!(err.to_string(), "LLM error: quota exceeded");

        let err = ChatError::Extraction("no JSON object".to_string());
        assert_eq!(err.to_string(), "extraction error: no JSON object");

        let err = ChatError::Config("GEMINI_API_KEY missing".to_string());
        assert_eq!(err.to_string(), "configuration error: GEMINI_API_KEY missing");
    }

    #[test]
    fn test_chat_error_from_tripmate_error() {
        let err: ChatError = TripmateError::Config("bad port".to_string()).into();
        assert!(matches!(err, ChatError::Config(_)));
        assert!(err.to_string().contains("bad port"));
    }

    #[test]
    fn test_chat_error_session_not_found_nil_uuid() {
        let err = ChatError::SessionNotFound(Uuid::nil());
        assert_eq!(
            err.to_string(),
            "session not found: 00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_chat_error_message_too_long_boundary_zero() {
        let err = ChatError::MessageTooLong(0);
        assert_eq!(
            err.to_string(),
            "message exceeds maximum length of 0 characters"
        );
    }

    #[test]
    fn test_errors_implement_debug() {
        let dbg = format!("{:?}", ChatError::Disabled);
        assert!(dbg.contains("Disabled"));

        let dbg = format!("{:?}", ChatError::SessionNotFound(Uuid::new_v4()));
        assert!(dbg.contains("SessionNotFound"));
    }
}
