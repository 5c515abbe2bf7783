use crate::config::ConfigError;

/// The engine-wide error taxonomy. Component-local failures (a single
/// malformed inbound message, a dropped audio chunk) are absorbed where they
/// happen and never become an `EngineError`; everything here crosses a
/// component boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The connect handshake itself failed. Always fatal for the attempt.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Socket-level failure after the handshake.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote service reported an error. `terminal` follows the
    /// known-terminal code list; unknown codes are non-terminal.
    #[error("server error (code {code:?}): {message}")]
    Protocol {
        code: Option<String>,
        message: String,
        terminal: bool,
    },

    /// The caller asked a channel to carry a payload its schema cannot
    /// express. Rejected before anything is transmitted.
    #[error("unsupported payload: {0}")]
    CapabilityMismatch(String),

    /// An audio device could not be opened or written. Does not tear down
    /// the streaming session.
    #[error("audio device unavailable: {0}")]
    Resource(String),

    /// Invalid configuration or caller input.
    #[error("{0}")]
    Application(String),

    /// A turn is already in flight; submissions are not interleaved.
    #[error("a turn is already in flight")]
    Busy,

    /// The streaming channel has no live connection.
    #[error("streaming channel is not connected")]
    NotConnected,
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Application(err.to_string())
    }
}
