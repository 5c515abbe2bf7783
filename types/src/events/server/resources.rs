use crate::audio::{AudioFormat, Voice};

/// The session object as reported by the server.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionResource {
    id: Option<String>,
    model: Option<String>,
    modalities: Option<Vec<String>>,
    instructions: Option<String>,
    voice: Option<Voice>,
    input_audio_format: Option<AudioFormat>,
    output_audio_format: Option<AudioFormat>,
}

impl SessionResource {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn modalities(&self) -> Option<&[String]> {
        self.modalities.as_deref()
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    pub fn input_audio_format(&self) -> Option<&AudioFormat> {
        self.input_audio_format.as_ref()
    }

    pub fn output_audio_format(&self) -> Option<&AudioFormat> {
        self.output_audio_format.as_ref()
    }
}

/// A conversation item as reported by the server.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ItemResource {
    id: Option<String>,
    #[serde(rename = "type")]
    item_type: Option<String>,
    status: Option<String>,
    role: Option<String>,
}

impl ItemResource {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn item_type(&self) -> Option<&str> {
        self.item_type.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

/// A response object as reported by the server.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseResource {
    id: Option<String>,
    status: Option<String>,
    usage: Option<Usage>,
    #[serde(default)]
    output: Vec<ItemResource>,
}

impl ResponseResource {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }

    pub fn outputs(&self) -> &[ItemResource] {
        &self.output
    }
}

/// Token usage reported on `response.done`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Usage {
    total_tokens: i32,
    input_tokens: i32,
    output_tokens: i32,
}

impl Usage {
    pub fn total_tokens(&self) -> i32 {
        self.total_tokens
    }

    pub fn input_tokens(&self) -> i32 {
        self.input_tokens
    }

    pub fn output_tokens(&self) -> i32 {
        self.output_tokens
    }
}

/// One entry of `rate_limits.updated`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RateLimitInformation {
    name: String,
    limit: i64,
    remaining: i64,
    reset_seconds: f64,
}

impl RateLimitInformation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn reset_seconds(&self) -> f64 {
        self.reset_seconds
    }
}
