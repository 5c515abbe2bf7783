use crate::audio::Base64EncodedAudioBytes;
use crate::session::Session;
use crate::Item;

/// `session.update` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionUpdateEvent {
    event_id: Option<String>,

    /// The session configuration to update
    session: Session,
}

impl SessionUpdateEvent {
    pub fn new(session: Session) -> Self {
        Self {
            event_id: None,
            session,
        }
    }

    pub fn set_event_id(&mut self, event_id: &str) {
        self.event_id = Some(event_id.to_string());
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

/// `input_audio_buffer.append` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InputAudioBufferAppendEvent {
    event_id: Option<String>,

    /// The audio data to append to the buffer
    audio: Base64EncodedAudioBytes,
}

impl InputAudioBufferAppendEvent {
    pub fn new(audio: Base64EncodedAudioBytes) -> Self {
        Self {
            event_id: None,
            audio,
        }
    }

    pub fn set_event_id(&mut self, event_id: &str) {
        self.event_id = Some(event_id.to_string());
    }

    pub fn audio(&self) -> &Base64EncodedAudioBytes {
        &self.audio
    }
}

/// `input_audio_buffer.commit` event, marks the input audio segment complete
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InputAudioBufferCommitEvent {
    event_id: Option<String>,
}

impl Default for InputAudioBufferCommitEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl InputAudioBufferCommitEvent {
    pub fn new() -> Self {
        Self { event_id: None }
    }

    pub fn set_event_id(&mut self, event_id: &str) {
        self.event_id = Some(event_id.to_string());
    }
}

/// `input_audio_buffer.clear` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InputAudioBufferClearEvent {
    event_id: Option<String>,
}

impl Default for InputAudioBufferClearEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl InputAudioBufferClearEvent {
    pub fn new() -> Self {
        Self { event_id: None }
    }

    pub fn set_event_id(&mut self, event_id: &str) {
        self.event_id = Some(event_id.to_string());
    }
}

/// `conversation.item.create` event. Items carry text or audio content only;
/// there is no image content part in the conversation schema.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConversationItemCreateEvent {
    event_id: Option<String>,

    /// The ID of the preceding item after which the new item will be inserted
    pub previous_item_id: Option<String>,
    /// The item to add to the conversation
    pub item: Item,
}

impl ConversationItemCreateEvent {
    pub fn new(item: Item) -> Self {
        Self {
            event_id: None,
            previous_item_id: None,
            item,
        }
    }

    pub fn set_event_id(&mut self, event_id: &str) {
        self.event_id = Some(event_id.to_string());
    }

    pub fn with_previous_item_id(mut self, previous_item_id: &str) -> Self {
        self.previous_item_id = Some(previous_item_id.to_string());
        self
    }
}

/// `response.create` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseCreateEvent {
    event_id: Option<String>,

    /// Configuration overrides for this response only
    response: Option<Session>,
}

impl Default for ResponseCreateEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCreateEvent {
    pub fn new() -> Self {
        Self {
            event_id: None,
            response: None,
        }
    }

    pub fn set_event_id(&mut self, event_id: &str) {
        self.event_id = Some(event_id.to_string());
    }

    pub fn with_update_session(mut self, session: Session) -> Self {
        self.response = Some(session);
        self
    }
}
