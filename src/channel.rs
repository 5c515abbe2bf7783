//! The seams between the orchestrator and its two transports.
//!
//! The orchestrator is generic over these traits rather than the concrete
//! clients so routing and state-machine behavior can be tested against
//! mocks, without a network or a remote service.

use crate::client::ServerRx;
use crate::error::EngineError;
use crate::response::Response;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use xr_session_types::audio::Base64EncodedAudioBytes;
use xr_session_types::session::Session;

/// The persistent duplex streaming channel. Carries voice and text turns
/// only; the conversation schema has no image content part, so an image can
/// never be offered through this interface.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StreamingChannel: Send + Sync {
    /// Opens the connection. Never retried internally; reconnection policy
    /// belongs to the orchestrator.
    async fn connect(&mut self) -> Result<(), EngineError>;

    /// Sends `session.update`. Idempotent; resending with changed fields
    /// redefines behavior for all subsequent turns.
    async fn configure_session(&mut self, session: Session) -> Result<(), EngineError>;

    /// Creates a user text item and requests a response for it.
    async fn send_text(&mut self, text: &str) -> Result<(), EngineError>;

    /// Appends one base64 PCM16 chunk to the input audio buffer.
    async fn append_audio(&mut self, audio: Base64EncodedAudioBytes) -> Result<(), EngineError>;

    /// Marks the input audio segment complete.
    async fn commit_audio(&mut self) -> Result<(), EngineError>;

    /// Discards the uncommitted input audio buffer.
    async fn clear_audio(&mut self) -> Result<(), EngineError>;

    /// Subscribes to the ordered inbound event stream.
    fn subscribe(&self) -> Result<ServerRx, EngineError>;

    fn is_live(&self) -> bool;

    async fn disconnect(&mut self);
}

/// The stateless request/response channel for image-grounded queries.
/// Independent of the streaming connection's lifecycle.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VisionChannel: Send + Sync {
    /// Issues a single request carrying the prompt and the image, and
    /// returns the completed answer. Never partial data.
    async fn analyze(&self, image: &[u8], prompt: &str) -> Result<Response, EngineError>;
}
