//! Engine configuration.
//!
//! Loads the externally supplied settings (credential, default voice,
//! instruction text, language, model names) from environment variables and
//! validates them once at startup.

use secrecy::SecretString;
use std::env;
use xr_session_types::audio::{AudioFormat, ServerVadTurnDetection, TranscriptionModel, TurnDetection, Voice};
use xr_session_types::session::Session;

/// Fallback instruction text when `ASSISTANT_INSTRUCTIONS` is unset.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a voice assistant for a headset wearer. \
    Answer briefly and conversationally; your replies are spoken aloud.";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
}

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    api_key: SecretString,
    realtime_model: String,
    vision_model: String,
    voice: Voice,
    instructions: String,
    language: String,
}

impl EngineConfig {
    /// Loads configuration from environment variables.
    ///
    // *   `OPENAI_API_KEY`: The service credential. Required; the engine fails fast without it.
    // *   `REALTIME_MODEL`: (Optional) The streaming-channel model.
    // *   `VISION_MODEL`: (Optional) The stateless-channel model. Defaults to "gpt-4o".
    // *   `ASSISTANT_VOICE`: (Optional) The default voice identity. Defaults to "alloy".
    // *   `ASSISTANT_INSTRUCTIONS`: (Optional) The default instruction text.
    // *   `ASSISTANT_LANGUAGE`: (Optional) BCP-47 tag for response language. Defaults to "en".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. Useful for local development, ignored if not present.
        dotenvy::dotenv().ok();

        let api_key = env::var(crate::client::consts::API_KEY_ENV)
            .map_err(|_| ConfigError::MissingVar(crate::client::consts::API_KEY_ENV.to_string()))?;
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar(crate::client::consts::API_KEY_ENV.to_string()));
        }

        let realtime_model =
            env::var("REALTIME_MODEL").unwrap_or_else(|_| crate::client::consts::DEFAULT_MODEL.to_string());
        let vision_model = env::var("VISION_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let voice = env::var("ASSISTANT_VOICE")
            .ok()
            .and_then(|v| v.parse::<Voice>().ok())
            .unwrap_or(Voice::Alloy);
        let instructions =
            env::var("ASSISTANT_INSTRUCTIONS").unwrap_or_else(|_| DEFAULT_INSTRUCTIONS.to_string());
        let language = env::var("ASSISTANT_LANGUAGE").unwrap_or_else(|_| "en".to_string());

        Ok(Self {
            api_key: SecretString::from(api_key),
            realtime_model,
            vision_model,
            voice,
            instructions,
            language,
        })
    }

    /// Builds a config without touching the environment. Intended for tests
    /// and embedders with their own settings storage.
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: SecretString::from(api_key.to_string()),
            realtime_model: crate::client::consts::DEFAULT_MODEL.to_string(),
            vision_model: "gpt-4o".to_string(),
            voice: Voice::Alloy,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            language: "en".to_string(),
        }
    }

    pub fn with_voice(mut self, voice: Voice) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_instructions(mut self, instructions: &str) -> Self {
        self.instructions = instructions.to_string();
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn realtime_model(&self) -> &str {
        &self.realtime_model
    }

    pub fn vision_model(&self) -> &str {
        &self.vision_model
    }

    pub fn voice(&self) -> &Voice {
        &self.voice
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_voice(&mut self, voice: Voice) {
        self.voice = voice;
    }

    pub fn set_language(&mut self, language: &str) {
        self.language = language.to_string();
    }

    /// The negotiated session configuration derived from the current
    /// defaults. Sent on connect and re-sent whenever voice or language
    /// change mid-session.
    pub fn to_session(&self) -> Session {
        let mut instructions = self.instructions.clone();
        if !self.language.is_empty() {
            instructions.push_str(&format!(" Respond in the user's language: {}.", self.language));
        }

        let turn_detection = TurnDetection::ServerVad(
            ServerVadTurnDetection::default()
                .with_interrupt_response(true)
                .with_create_response(true),
        );

        Session::new()
            .with_modalities_enable_audio()
            .with_instructions(&instructions)
            .with_voice(self.voice.clone())
            .with_input_audio_format(AudioFormat::Pcm16)
            .with_output_audio_format(AudioFormat::Pcm16)
            .with_input_audio_transcription_enable(TranscriptionModel::Whisper)
            .with_turn_detection_enable(turn_detection)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_carries_voice_and_language() {
        let config = EngineConfig::new("sk-test")
            .with_voice(Voice::Nova)
            .with_language("de");
        let session = config.to_session();
        assert_eq!(session.voice(), Some(&Voice::Nova));
        assert!(session.instructions().unwrap().contains("de"));
        assert!(session.turn_detection().is_some());
    }
}
