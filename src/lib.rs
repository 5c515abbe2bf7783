//! Real-time multimodal session engine.
//!
//! One persistent duplex connection carries voice and text turns; a
//! stateless request/response channel carries image-grounded queries the
//! streaming protocol cannot express. The [`orchestrator::SessionOrchestrator`]
//! routes each turn to exactly one of the two, the [`pipeline`] moves PCM
//! audio between the microphone, the wire and the speaker, and a single
//! observable state value tracks the whole session.

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod response;
pub mod vision;

pub use xr_session_types as types;
pub use xr_session_utils as utils;

pub use client::{connect, connect_with_config, Client, ServerRx};
pub use config::EngineConfig;
pub use error::EngineError;
pub use orchestrator::{IntegrationState, SessionOrchestrator, Turn};
pub use response::{Response, ResponseSource};
pub use vision::VisionClient;
