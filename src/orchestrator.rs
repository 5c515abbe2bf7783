//! The session orchestrator.
//!
//! Routes each submitted turn to exactly one channel — image-bearing turns
//! to the stateless vision channel, everything else to the streaming
//! channel — owns the session lifecycle (connect, one-shot reconnect on
//! first failure, teardown in a fixed order), and publishes the single
//! state value plus the response stream consumed by UI and TTS
//! collaborators.

mod state;

pub use state::IntegrationState;

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, watch};

use crate::channel::{StreamingChannel, VisionChannel};
use crate::client::accum::ResponseAccumulator;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::pipeline::Playback;
use crate::response::Response;
use xr_session_types as types;
use xr_session_types::audio::Voice;

/// One unit of user input, resolved by exactly one Response or error. The
/// route is fixed at construction: image turns never touch the streaming
/// channel, text turns never touch the vision channel.
#[derive(Debug, Clone)]
pub enum Turn {
    Text { text: String },
    Image { image: Vec<u8>, prompt: String },
}

struct Core {
    state: IntegrationState,
    turn_active: bool,
    pending: Option<Turn>,
    closing: bool,
}

struct Inner<S, V> {
    streaming: tokio::sync::Mutex<S>,
    vision: V,
    config: Mutex<EngineConfig>,
    core: Mutex<Core>,
    state_tx: watch::Sender<IntegrationState>,
    processing_tx: watch::Sender<bool>,
    response_tx: broadcast::Sender<Response>,
}

pub struct SessionOrchestrator<S, V>
where
    S: StreamingChannel + 'static,
    V: VisionChannel + 'static,
{
    inner: Arc<Inner<S, V>>,
    event_task: Option<tokio::task::JoinHandle<()>>,
    drain_task: Option<tokio::task::JoinHandle<()>>,
    playback: Option<Arc<tokio::sync::Mutex<Playback>>>,
}

impl<S, V> Inner<S, V>
where
    S: StreamingChannel + 'static,
    V: VisionChannel + 'static,
{
    fn core(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn config(&self) -> MutexGuard<'_, EngineConfig> {
        self.config.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The single writer of IntegrationState. Refuses edges outside the
    /// machine and reports whether the transition happened.
    fn transition(&self, to: IntegrationState) -> bool {
        let mut core = self.core();
        if core.state == to {
            return true;
        }
        if !core.state.can_transition(to) {
            tracing::warn!(from = ?core.state, ?to, "refused state transition");
            return false;
        }
        tracing::debug!(from = ?core.state, ?to, "state transition");
        core.state = to;
        drop(core);
        self.state_tx.send_replace(to);
        true
    }

    fn set_processing(&self, on: bool) {
        self.processing_tx.send_replace(on);
    }

    /// Resolves the in-flight turn, with or without a response having been
    /// emitted, and returns the machine to listening.
    fn finish_turn(&self) {
        self.core().turn_active = false;
        self.set_processing(false);
        let state = self.core().state;
        if matches!(state, IntegrationState::Processing | IntegrationState::Responding) {
            self.transition(IntegrationState::Listening);
        }
    }

    /// First response fragment for the in-flight turn.
    fn mark_responding(&self) {
        let should = {
            let core = self.core();
            core.turn_active && core.state == IntegrationState::Processing
        };
        if should {
            self.transition(IntegrationState::Responding);
        }
    }

    async fn submit(&self, turn: Turn) -> Result<(), EngineError> {
        match turn {
            Turn::Text { text } => self.submit_text(text).await,
            Turn::Image { image, prompt } => self.submit_image(image, prompt).await,
        }
    }

    async fn submit_text(&self, text: String) -> Result<(), EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::Application("empty text turn".to_string()));
        }
        {
            let mut core = self.core();
            if core.turn_active {
                return Err(EngineError::Busy);
            }
            match core.state {
                IntegrationState::Listening => {
                    core.turn_active = true;
                }
                IntegrationState::Connecting | IntegrationState::Ready => {
                    // At most one turn waits for the channel to come up.
                    if core.pending.is_some() {
                        return Err(EngineError::Busy);
                    }
                    core.pending = Some(Turn::Text { text });
                    tracing::debug!("text turn queued until the session is ready");
                    return Ok(());
                }
                _ => return Err(EngineError::NotConnected),
            }
        }
        self.transition(IntegrationState::Processing);
        self.set_processing(true);

        let result = self.streaming.lock().await.send_text(&text).await;
        if let Err(e) = result {
            tracing::error!("failed to dispatch text turn: {}", e);
            self.finish_turn();
            if matches!(e, EngineError::Transport(_) | EngineError::NotConnected) {
                self.transition(IntegrationState::Error);
            }
            return Err(e);
        }
        Ok(())
    }

    async fn submit_image(&self, image: Vec<u8>, prompt: String) -> Result<(), EngineError> {
        if image.is_empty() {
            return Err(EngineError::CapabilityMismatch(
                "image turn submitted without image bytes; submit a text turn instead".to_string(),
            ));
        }
        let track_state = {
            let mut core = self.core();
            if core.turn_active {
                return Err(EngineError::Busy);
            }
            match core.state {
                IntegrationState::Listening => {
                    core.turn_active = true;
                    true
                }
                // The stateless channel works while the streaming channel is
                // down; the failed machine just does not walk the turn edges.
                IntegrationState::Error => {
                    core.turn_active = true;
                    false
                }
                _ => {
                    return Err(EngineError::Application(
                        "no active session for an image turn".to_string(),
                    ))
                }
            }
        };
        if track_state {
            self.transition(IntegrationState::Processing);
        }
        self.set_processing(true);

        match self.vision.analyze(&image, &prompt).await {
            Ok(response) => {
                if track_state {
                    self.transition(IntegrationState::Responding);
                }
                if self.response_tx.send(response).is_err() {
                    tracing::debug!("no subscribers for the completed response");
                }
                self.finish_turn();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("image query failed: {}", e);
                self.finish_turn();
                Err(e)
            }
        }
    }

    async fn dispatch_pending(&self) {
        let pending = self.core().pending.take();
        if let Some(turn) = pending {
            self.transition(IntegrationState::Listening);
            if let Err(e) = self.submit(turn).await {
                tracing::error!("queued turn failed: {}", e);
            }
        }
    }

    async fn handle_event(&self, accumulator: &mut ResponseAccumulator, event: types::ServerEvent) {
        use types::ServerEvent as E;
        match event {
            E::SessionCreated(data) => {
                tracing::info!(session_id = ?data.session().id(), "session created");
                let session = self.config().to_session();
                if let Err(e) = self.streaming.lock().await.configure_session(session).await {
                    tracing::error!("failed to send session configuration: {}", e);
                    self.transition(IntegrationState::Error);
                    return;
                }
                self.transition(IntegrationState::Ready);
                self.dispatch_pending().await;
            }
            E::SessionUpdated(data) => {
                tracing::debug!(session_id = ?data.session().id(), "session configuration acknowledged");
            }
            E::InputAudioBufferSpeechStarted(data) => {
                // Server VAD is authoritative for utterance boundaries.
                tracing::debug!(item_id = data.item_id(), "user speech started");
            }
            E::InputAudioBufferSpeechStopped(data) => {
                tracing::debug!(item_id = data.item_id(), "user speech stopped");
            }
            E::InputAudioBufferCommitted(data) => {
                // Server VAD turned the buffered audio into a voice turn.
                let start = {
                    let mut core = self.core();
                    if core.state == IntegrationState::Listening && !core.turn_active {
                        core.turn_active = true;
                        true
                    } else {
                        false
                    }
                };
                if start {
                    tracing::debug!(item_id = data.item_id(), "voice turn committed");
                    self.transition(IntegrationState::Processing);
                    self.set_processing(true);
                }
            }
            E::InputAudioBufferCleared(_) => {
                tracing::debug!("input audio buffer cleared");
            }
            E::ConversationItemCreated(data) => {
                tracing::debug!(item_id = ?data.item().id(), "conversation item created");
            }
            E::ConversationItemInputAudioTranscriptionCompleted(data) => {
                tracing::info!("user said: {:?}", data.transcript().trim());
            }
            E::ConversationItemInputAudioTranscriptionFailed(data) => {
                tracing::warn!("input transcription failed: {}", data.error().message());
            }
            E::ResponseCreated(data) => {
                accumulator.begin(data.response().id());
            }
            E::ResponseTextDelta(data) => {
                accumulator.push_text(data.item_id(), data.delta());
                self.mark_responding();
            }
            E::ResponseAudioTranscriptDelta(data) => {
                accumulator.push_transcript(data.item_id(), data.delta());
                self.mark_responding();
            }
            E::ResponseAudioDelta(data) => {
                accumulator.note_audio(data.item_id());
                self.mark_responding();
            }
            E::ResponseTextDone(_) | E::ResponseAudioTranscriptDone(_) | E::ResponseAudioDone(_) => {}
            E::ResponseDone(data) => match accumulator.finalize() {
                Some(response) => {
                    // An empty response still walks PROCESSING → RESPONDING
                    // before resolving.
                    self.mark_responding();
                    if self.response_tx.send(response).is_err() {
                        tracing::debug!("no subscribers for the completed response");
                    }
                    self.finish_turn();
                }
                None => {
                    tracing::warn!(
                        event_id = data.event_id(),
                        "response.done with no prior response.created; ignored"
                    );
                }
            },
            E::RateLimitsUpdated(data) => {
                for limit in data.rate_limits() {
                    tracing::debug!(name = limit.name(), remaining = limit.remaining(), "rate limit updated");
                }
            }
            E::Error(data) => {
                let details = data.error();
                if details.is_terminal() {
                    tracing::error!(code = ?details.code(), "terminal server error: {}", details.message());
                    {
                        let mut core = self.core();
                        core.turn_active = false;
                        core.pending = None;
                    }
                    self.set_processing(false);
                    self.transition(IntegrationState::Error);
                } else {
                    tracing::warn!(code = ?details.code(), "non-terminal server error: {}", details.message());
                }
            }
            E::Close { reason } => {
                if self.core().closing {
                    tracing::debug!("connection closed during teardown");
                } else {
                    tracing::error!(?reason, "streaming connection lost");
                    {
                        let mut core = self.core();
                        core.turn_active = false;
                        core.pending = None;
                    }
                    self.set_processing(false);
                    self.transition(IntegrationState::Error);
                }
            }
            _ => {
                tracing::debug!("unhandled server event");
            }
        }
    }
}

impl<S, V> SessionOrchestrator<S, V>
where
    S: StreamingChannel + 'static,
    V: VisionChannel + 'static,
{
    pub fn new(streaming: S, vision: V, config: EngineConfig) -> Self {
        let (state_tx, _) = watch::channel(IntegrationState::Idle);
        let (processing_tx, _) = watch::channel(false);
        let (response_tx, _) = broadcast::channel(32);
        Self {
            inner: Arc::new(Inner {
                streaming: tokio::sync::Mutex::new(streaming),
                vision,
                config: Mutex::new(config),
                core: Mutex::new(Core {
                    state: IntegrationState::Idle,
                    turn_active: false,
                    pending: None,
                    closing: false,
                }),
                state_tx,
                processing_tx,
                response_tx,
            }),
            event_task: None,
            drain_task: None,
            playback: None,
        }
    }

    /// The observable session state.
    pub fn state(&self) -> watch::Receiver<IntegrationState> {
        self.inner.state_tx.subscribe()
    }

    /// Completed responses, one per resolved turn.
    pub fn responses(&self) -> broadcast::Receiver<Response> {
        self.inner.response_tx.subscribe()
    }

    /// True from turn admission until its resolution.
    pub fn is_processing(&self) -> watch::Receiver<bool> {
        self.inner.processing_tx.subscribe()
    }

    /// Connects the streaming channel and starts event dispatch. Makes one
    /// immediate reconnect attempt on first failure, then moves to ERROR;
    /// every later recovery is an explicit [`Self::retry`].
    pub async fn start_session(&mut self) -> Result<(), EngineError> {
        {
            let core = self.inner.core();
            if core.state != IntegrationState::Idle {
                return Err(EngineError::Application(format!(
                    "cannot start a session from {:?}",
                    core.state
                )));
            }
        }
        self.inner.core().closing = false;
        self.inner.transition(IntegrationState::Connecting);

        let connect_result = {
            let mut streaming = self.inner.streaming.lock().await;
            match streaming.connect().await {
                Ok(()) => Ok(()),
                Err(first) => {
                    tracing::warn!("connect failed, retrying once: {}", first);
                    streaming.connect().await
                }
            }
        };
        if let Err(e) = connect_result {
            tracing::error!("connect failed: {}", e);
            self.inner.transition(IntegrationState::Error);
            return Err(e);
        }
        self.spawn_event_loop().await
    }

    /// Manual retry from ERROR. A single connect attempt; no hidden loops.
    pub async fn retry(&mut self) -> Result<(), EngineError> {
        {
            let core = self.inner.core();
            if core.state != IntegrationState::Error {
                return Err(EngineError::Application(format!(
                    "retry is only valid from Error, not {:?}",
                    core.state
                )));
            }
        }
        if let Some(event_task) = self.event_task.take() {
            event_task.abort();
        }
        self.inner.streaming.lock().await.disconnect().await;
        self.inner.transition(IntegrationState::Connecting);

        let result = self.inner.streaming.lock().await.connect().await;
        if let Err(e) = result {
            tracing::error!("reconnect failed: {}", e);
            self.inner.transition(IntegrationState::Error);
            return Err(e);
        }
        self.spawn_event_loop().await
    }

    async fn spawn_event_loop(&mut self) -> Result<(), EngineError> {
        let mut events = self.inner.streaming.lock().await.subscribe()?;
        let inner = self.inner.clone();
        self.event_task = Some(tokio::spawn(async move {
            let mut accumulator = ResponseAccumulator::new();
            loop {
                match events.recv().await {
                    Ok(event) => inner.handle_event(&mut accumulator, event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
        Ok(())
    }

    /// READY → LISTENING. Capture wiring is the embedder's side of the
    /// pipeline; this only opens the gate for turns.
    pub fn start_listening(&self) -> Result<(), EngineError> {
        if self.inner.transition(IntegrationState::Listening) {
            Ok(())
        } else {
            Err(EngineError::Application("listening requires a ready session".to_string()))
        }
    }

    /// Registers the audio tasks so teardown can cancel them in order.
    pub fn attach_audio(
        &mut self,
        drain: tokio::task::JoinHandle<()>,
        playback: Arc<tokio::sync::Mutex<Playback>>,
    ) {
        self.drain_task = Some(drain);
        self.playback = Some(playback);
    }

    /// Tears the session down in a fixed, finite order — producers before
    /// the resources they write into: capture drain, then event dispatch,
    /// then playback, then the connection.
    pub async fn end_session(&mut self) {
        self.inner.core().closing = true;
        if let Some(drain) = self.drain_task.take() {
            drain.abort();
        }
        if let Some(event_task) = self.event_task.take() {
            event_task.abort();
        }
        if let Some(playback) = self.playback.take() {
            playback.lock().await.stop().await;
        }
        self.inner.streaming.lock().await.disconnect().await;
        {
            let mut core = self.inner.core();
            core.turn_active = false;
            core.pending = None;
            core.closing = false;
        }
        self.inner.set_processing(false);
        self.inner.transition(IntegrationState::Idle);
    }

    pub async fn submit_text_turn(&self, text: &str) -> Result<(), EngineError> {
        self.inner.submit(Turn::Text { text: text.to_string() }).await
    }

    /// A voice turn that was already transcribed by the speech-recognition
    /// collaborator. Routed exactly like a typed text turn.
    pub async fn submit_voice_turn(&self, transcribed_text: &str) -> Result<(), EngineError> {
        self.inner
            .submit(Turn::Text {
                text: transcribed_text.to_string(),
            })
            .await
    }

    pub async fn submit_image_turn(&self, image: Vec<u8>, prompt: &str) -> Result<(), EngineError> {
        self.inner
            .submit(Turn::Image {
                image,
                prompt: prompt.to_string(),
            })
            .await
    }

    /// Changes the voice identity. Re-negotiates the live session; otherwise
    /// only the stored default changes.
    pub async fn set_voice(&self, voice: Voice) -> Result<(), EngineError> {
        self.inner.config().set_voice(voice);
        self.reconfigure_if_live().await
    }

    /// Changes the response language. Same re-negotiation rule as voice.
    pub async fn set_language(&self, language: &str) -> Result<(), EngineError> {
        self.inner.config().set_language(language);
        self.reconfigure_if_live().await
    }

    async fn reconfigure_if_live(&self) -> Result<(), EngineError> {
        let session = self.inner.config().to_session();
        let mut streaming = self.inner.streaming.lock().await;
        if streaming.is_live() {
            streaming.configure_session(session).await
        } else {
            Ok(())
        }
    }
}

impl SessionOrchestrator<crate::client::Client, crate::vision::VisionClient> {
    /// Wires the concrete clients from one validated configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        use secrecy::ExposeSecret;

        let client_config = crate::client::config::Config::builder()
            .with_api_key(config.api_key().expose_secret())
            .with_model(config.realtime_model())
            .build();
        let streaming = crate::client::Client::new(1024, client_config);
        let vision =
            crate::vision::VisionClient::new(config.api_key().clone(), config.vision_model().to_string());
        Self::new(streaming, vision, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{MockStreamingChannel, MockVisionChannel};
    use tokio::sync::broadcast::Sender;

    fn event(json: &str) -> types::ServerEvent {
        serde_json::from_str(json).expect("test event should parse")
    }

    const SESSION_CREATED: &str =
        r#"{"type":"session.created","event_id":"event_1","session":{"id":"sess_1"}}"#;
    const RESPONSE_CREATED: &str =
        r#"{"type":"response.created","event_id":"event_2","response":{"id":"resp_1"}}"#;
    const RESPONSE_DONE: &str =
        r#"{"type":"response.done","event_id":"event_4","response":{"id":"resp_1","status":"completed"}}"#;

    fn text_delta(delta: &str) -> String {
        format!(
            r#"{{"type":"response.text.delta","event_id":"event_3","response_id":"resp_1",
                "item_id":"item_1","output_index":0,"content_index":0,"delta":"{}"}}"#,
            delta
        )
    }

    /// A streaming mock wired for the connect dance, plus the broadcast
    /// sender the test uses to play the server side.
    fn connected_mock() -> (MockStreamingChannel, Sender<types::ServerEvent>) {
        let (tx, _) = tokio::sync::broadcast::channel(32);
        let mut streaming = MockStreamingChannel::new();
        streaming.expect_connect().times(1).returning(|| Ok(()));
        let subscribe_tx = tx.clone();
        streaming
            .expect_subscribe()
            .times(1)
            .returning(move || Ok(subscribe_tx.subscribe()));
        streaming
            .expect_configure_session()
            .times(1)
            .returning(|_| Ok(()));
        (streaming, tx)
    }

    async fn listening(
        streaming: MockStreamingChannel,
        vision: MockVisionChannel,
        tx: &Sender<types::ServerEvent>,
    ) -> SessionOrchestrator<MockStreamingChannel, MockVisionChannel> {
        let mut orchestrator = SessionOrchestrator::new(streaming, vision, EngineConfig::new("sk-test"));
        let mut state = orchestrator.state();
        orchestrator.start_session().await.expect("connect should succeed");
        tx.send(event(SESSION_CREATED)).unwrap();
        state
            .wait_for(|s| *s == IntegrationState::Ready)
            .await
            .expect("should reach READY");
        orchestrator.start_listening().expect("should start listening");
        orchestrator
    }

    #[tokio::test]
    async fn session_created_moves_connecting_to_ready() {
        let (streaming, tx) = connected_mock();
        let mut orchestrator =
            SessionOrchestrator::new(streaming, MockVisionChannel::new(), EngineConfig::new("sk-test"));
        let mut state = orchestrator.state();

        orchestrator.start_session().await.unwrap();
        assert_eq!(*state.borrow_and_update(), IntegrationState::Connecting);

        tx.send(event(SESSION_CREATED)).unwrap();
        state.wait_for(|s| *s == IntegrationState::Ready).await.unwrap();
    }

    #[tokio::test]
    async fn connect_failure_retries_once_then_errors() {
        let mut streaming = MockStreamingChannel::new();
        streaming
            .expect_connect()
            .times(2)
            .returning(|| Err(EngineError::Connect("refused".to_string())));
        let mut orchestrator =
            SessionOrchestrator::new(streaming, MockVisionChannel::new(), EngineConfig::new("sk-test"));

        let result = orchestrator.start_session().await;
        assert!(matches!(result, Err(EngineError::Connect(_))));
        assert_eq!(*orchestrator.state().borrow(), IntegrationState::Error);
    }

    #[tokio::test]
    async fn text_turn_goes_to_the_streaming_channel_only() {
        let (mut streaming, tx) = connected_mock();
        streaming
            .expect_send_text()
            .times(1)
            .withf(|text| text == "What is in this image?")
            .returning(|_| Ok(()));
        // No image attached, so this is a plain text turn — the vision
        // channel must never be touched (its mock panics on any call).
        let orchestrator = listening(streaming, MockVisionChannel::new(), &tx).await;
        let mut state = orchestrator.state();
        let mut responses = orchestrator.responses();

        orchestrator.submit_text_turn("What is in this image?").await.unwrap();
        state.wait_for(|s| *s == IntegrationState::Processing).await.unwrap();

        tx.send(event(RESPONSE_CREATED)).unwrap();
        tx.send(event(&text_delta("It is a text answer."))).unwrap();
        state.wait_for(|s| *s == IntegrationState::Responding).await.unwrap();

        tx.send(event(RESPONSE_DONE)).unwrap();
        state.wait_for(|s| *s == IntegrationState::Listening).await.unwrap();

        let response = responses.recv().await.unwrap();
        assert_eq!(response.text(), "It is a text answer.");
        assert_eq!(response.source(), crate::response::ResponseSource::Streaming);
    }

    #[tokio::test]
    async fn image_turn_goes_to_the_vision_channel_only() {
        let (streaming, tx) = connected_mock();
        let mut vision = MockVisionChannel::new();
        vision
            .expect_analyze()
            .times(1)
            .withf(|image, prompt| !image.is_empty() && prompt == "what am I looking at?")
            .returning(|_, _| Ok(Response::vision("A potted plant.".to_string())));

        // The streaming mock has no send_text/append_audio expectations: any
        // attempt to route the image turn through it panics the test.
        let orchestrator = listening(streaming, vision, &tx).await;
        let mut responses = orchestrator.responses();

        orchestrator
            .submit_image_turn(vec![0xFF, 0xD8], "what am I looking at?")
            .await
            .unwrap();

        let response = responses.recv().await.unwrap();
        assert_eq!(response.text(), "A potted plant.");
        assert_eq!(response.source(), crate::response::ResponseSource::Vision);
        assert_eq!(*orchestrator.state().borrow(), IntegrationState::Listening);
    }

    #[tokio::test]
    async fn image_turn_without_bytes_is_rejected_synchronously() {
        let (streaming, tx) = connected_mock();
        let orchestrator = listening(streaming, MockVisionChannel::new(), &tx).await;

        let result = orchestrator.submit_image_turn(vec![], "what is this?").await;
        assert!(matches!(result, Err(EngineError::CapabilityMismatch(_))));
        assert_eq!(*orchestrator.state().borrow(), IntegrationState::Listening);
    }

    #[tokio::test]
    async fn a_second_submission_is_rejected_busy() {
        let (mut streaming, tx) = connected_mock();
        streaming.expect_send_text().times(1).returning(|_| Ok(()));
        let orchestrator = listening(streaming, MockVisionChannel::new(), &tx).await;
        let mut state = orchestrator.state();

        orchestrator.submit_text_turn("first").await.unwrap();
        state.wait_for(|s| *s == IntegrationState::Processing).await.unwrap();

        assert!(matches!(
            orchestrator.submit_text_turn("second").await,
            Err(EngineError::Busy)
        ));
        assert!(matches!(
            orchestrator.submit_image_turn(vec![1], "and this?").await,
            Err(EngineError::Busy)
        ));
    }

    #[tokio::test]
    async fn response_done_without_created_is_ignored() {
        let (streaming, tx) = connected_mock();
        let orchestrator = listening(streaming, MockVisionChannel::new(), &tx).await;
        let mut responses = orchestrator.responses();

        tx.send(event(RESPONSE_DONE)).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(*orchestrator.state().borrow(), IntegrationState::Listening);
        assert!(matches!(
            responses.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn unknown_error_codes_are_non_terminal() {
        let (streaming, tx) = connected_mock();
        let orchestrator = listening(streaming, MockVisionChannel::new(), &tx).await;
        let mut state = orchestrator.state();

        tx.send(event(
            r#"{"type":"error","event_id":"event_5",
                "error":{"type":"server_error","code":"mystery_code","message":"odd"}}"#,
        ))
        .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(*orchestrator.state().borrow(), IntegrationState::Listening);

        tx.send(event(
            r#"{"type":"error","event_id":"event_6",
                "error":{"type":"invalid_request_error","code":"session_expired","message":"gone"}}"#,
        ))
        .unwrap();
        state.wait_for(|s| *s == IntegrationState::Error).await.unwrap();
    }

    #[tokio::test]
    async fn queued_text_turn_dispatches_once_ready() {
        let (mut streaming, tx) = connected_mock();
        streaming
            .expect_send_text()
            .times(1)
            .withf(|text| text == "queued question")
            .returning(|_| Ok(()));
        let mut orchestrator =
            SessionOrchestrator::new(streaming, MockVisionChannel::new(), EngineConfig::new("sk-test"));
        let mut state = orchestrator.state();

        orchestrator.start_session().await.unwrap();
        orchestrator.submit_text_turn("queued question").await.unwrap();
        assert!(matches!(
            orchestrator.submit_text_turn("one pending turn at most").await,
            Err(EngineError::Busy)
        ));

        tx.send(event(SESSION_CREATED)).unwrap();
        state.wait_for(|s| *s == IntegrationState::Processing).await.unwrap();
    }

    #[tokio::test]
    async fn voice_change_offline_only_updates_defaults() {
        let mut streaming = MockStreamingChannel::new();
        streaming.expect_is_live().return_const(false);
        let orchestrator =
            SessionOrchestrator::new(streaming, MockVisionChannel::new(), EngineConfig::new("sk-test"));

        orchestrator.set_voice(Voice::Nova).await.unwrap();
        assert_eq!(orchestrator.inner.config().voice(), &Voice::Nova);
    }

    #[tokio::test]
    async fn connection_loss_outside_teardown_is_an_error() {
        let (streaming, tx) = connected_mock();
        let orchestrator = listening(streaming, MockVisionChannel::new(), &tx).await;
        let mut state = orchestrator.state();

        tx.send(types::ServerEvent::Close {
            reason: Some("socket reset".to_string()),
        })
        .unwrap();
        state.wait_for(|s| *s == IntegrationState::Error).await.unwrap();
    }
}
