use crate::response::Response;

/// Accumulation buffer for the response currently streaming in. Deltas are
/// correlated by item id; the buffer finalizes exactly once, on
/// `response.done`, into an immutable [`Response`]. A `response.done` with
/// no prior `response.created` finalizes to `None` so callers can log it as
/// out-of-order and leave state untouched.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    response_id: Option<String>,
    item_id: Option<String>,
    text: String,
    transcript: String,
    audio_chunks: usize,
    active: bool,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn begin(&mut self, response_id: Option<&str>) {
        if self.active {
            tracing::warn!("response.created while a response is already accumulating; restarting buffer");
        }
        *self = Self::default();
        self.response_id = response_id.map(str::to_string);
        self.active = true;
    }

    pub fn push_text(&mut self, item_id: &str, delta: &str) {
        if !self.note_item(item_id, "response.text.delta") {
            return;
        }
        self.text.push_str(delta);
    }

    pub fn push_transcript(&mut self, item_id: &str, delta: &str) {
        if !self.note_item(item_id, "response.audio_transcript.delta") {
            return;
        }
        self.transcript.push_str(delta);
    }

    pub fn note_audio(&mut self, item_id: &str) {
        if !self.note_item(item_id, "response.audio.delta") {
            return;
        }
        self.audio_chunks += 1;
    }

    /// Consumes the buffer. Returns `None` when no response was begun.
    pub fn finalize(&mut self) -> Option<Response> {
        if !self.active {
            return None;
        }
        let done = std::mem::take(self);
        // Text-modality output takes precedence; voice-only responses carry
        // their content in the audio transcript.
        let text = if !done.text.is_empty() {
            done.text
        } else {
            done.transcript
        };
        Some(Response::streaming(done.response_id, text, done.audio_chunks > 0))
    }

    fn note_item(&mut self, item_id: &str, kind: &str) -> bool {
        if !self.active {
            tracing::warn!(kind, item_id, "delta received with no response in progress; dropped");
            return false;
        }
        match &self.item_id {
            None => self.item_id = Some(item_id.to_string()),
            Some(known) if known != item_id => {
                tracing::debug!(known = %known, item_id, "delta for a different item in the same response");
            }
            _ => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_and_finalizes_once() {
        let mut accum = ResponseAccumulator::new();
        accum.begin(Some("resp_1"));
        accum.push_text("item_1", "Hello, ");
        accum.push_text("item_1", "world");
        accum.note_audio("item_1");

        let response = accum.finalize().expect("should finalize");
        assert_eq!(response.id(), Some("resp_1"));
        assert_eq!(response.text(), "Hello, world");
        assert!(response.had_audio());

        // Already consumed; a second done is out-of-order.
        assert!(accum.finalize().is_none());
    }

    #[test]
    fn done_without_created_yields_none() {
        let mut accum = ResponseAccumulator::new();
        accum.push_text("item_1", "orphan delta");
        assert!(accum.finalize().is_none());
    }

    #[test]
    fn voice_only_response_uses_transcript() {
        let mut accum = ResponseAccumulator::new();
        accum.begin(Some("resp_2"));
        accum.push_transcript("item_2", "Spoken answer.");
        accum.note_audio("item_2");

        let response = accum.finalize().unwrap();
        assert_eq!(response.text(), "Spoken answer.");
        assert!(response.had_audio());
    }
}
