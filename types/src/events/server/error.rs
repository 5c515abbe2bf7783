/// Error codes the server reports as unrecoverable for the session. Codes
/// outside this set are treated as non-terminal and logged for later
/// classification.
const TERMINAL_ERROR_CODES: &[&str] = &[
    "invalid_api_key",
    "session_expired",
    "session_not_found",
    "invalid_session_state",
];

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetails {
    #[serde(rename = "type")]
    error_type: String,
    code: Option<String>,
    message: String,
    param: Option<String>,
    event_id: Option<String>,
}

impl ErrorDetails {
    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn param(&self) -> Option<&str> {
        self.param.as_deref()
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    /// Whether this error ends the session. Only codes on the known-terminal
    /// list qualify; anything else, including codes we have never seen,
    /// leaves the session alive.
    pub fn is_terminal(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|code| TERMINAL_ERROR_CODES.contains(&code))
    }
}

impl ErrorDetails {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error_type: error_type.to_string(),
            code: None,
            message: message.to_string(),
            param: None,
            event_id: None,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn with_param(mut self, param: &str) -> Self {
        self.param = Some(param.to_string());
        self
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_terminal_code() {
        let details = ErrorDetails::new("invalid_request_error", "expired").with_code("session_expired");
        assert!(details.is_terminal());
    }

    #[test]
    fn unknown_code_is_non_terminal() {
        let details = ErrorDetails::new("server_error", "glitch").with_code("transient_hiccup");
        assert!(!details.is_terminal());
        let details = ErrorDetails::new("server_error", "no code at all");
        assert!(!details.is_terminal());
    }
}
