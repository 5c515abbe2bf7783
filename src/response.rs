/// Which channel produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// The persistent streaming channel (voice/text turns).
    Streaming,
    /// The stateless image-query channel.
    Vision,
}

/// The accumulated result of one completed turn. Finalized exactly once —
/// on `response.done` for streaming turns, on completion for image turns —
/// and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Response {
    id: Option<String>,
    text: String,
    had_audio: bool,
    source: ResponseSource,
}

impl Response {
    pub(crate) fn streaming(id: Option<String>, text: String, had_audio: bool) -> Self {
        Self {
            id,
            text,
            had_audio,
            source: ResponseSource::Streaming,
        }
    }

    pub(crate) fn vision(text: String) -> Self {
        Self {
            id: None,
            text,
            had_audio: false,
            source: ResponseSource::Vision,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether synthesized speech was streamed alongside the text.
    pub fn had_audio(&self) -> bool {
        self.had_audio
    }

    pub fn source(&self) -> ResponseSource {
        self.source
    }
}
