//! The streaming session client.
//!
//! Owns the persistent duplex connection: one writer task draining the
//! client-event queue onto the socket, one reader task decoding inbound
//! messages into [`types::ServerEvent`] and fanning them out over a
//! broadcast channel. The two tasks are independent; neither blocks the
//! other. The client never reconnects on its own — a dropped connection
//! surfaces as a `Close` event and the orchestrator decides what happens
//! next, so in-flight turns are never duplicated silently.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::channel::StreamingChannel;
use crate::error::EngineError;
use xr_session_types as types;
use xr_session_types::audio::Base64EncodedAudioBytes;
use xr_session_types::session::Session;

pub(crate) mod accum;
pub mod config;
pub(crate) mod consts;
mod stats;
mod utils;

pub use stats::Stats;

pub type ClientTx = tokio::sync::mpsc::Sender<types::ClientEvent>;
type ServerTx = tokio::sync::broadcast::Sender<types::ServerEvent>;
pub type ServerRx = tokio::sync::broadcast::Receiver<types::ServerEvent>;

pub struct Connection {
    send_handle: tokio::task::JoinHandle<()>,
    recv_handle: tokio::task::JoinHandle<()>,
}

pub struct Client {
    capacity: usize,
    config: config::Config,
    c_tx: Option<ClientTx>,
    s_tx: Option<ServerTx>,
    conn: Option<Connection>,
    alive: Arc<AtomicBool>,
    event_seq: Arc<AtomicU64>,
    stats: Arc<Mutex<Stats>>,
}

impl Client {
    pub fn new(capacity: usize, config: config::Config) -> Self {
        Self {
            capacity,
            config,
            c_tx: None,
            s_tx: None,
            conn: None,
            alive: Arc::new(AtomicBool::new(false)),
            event_seq: Arc::new(AtomicU64::new(0)),
            stats: Arc::new(Mutex::new(Stats::new())),
        }
    }

    pub async fn connect(&mut self) -> Result<(), EngineError> {
        if self.c_tx.is_some() {
            return Err(EngineError::Connect("already connected".to_string()));
        }

        let request = utils::build_request(&self.config)
            .map_err(|e| EngineError::Connect(e.to_string()))?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| EngineError::Connect(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel::<types::ClientEvent>(self.capacity);
        let (s_tx, _) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx.clone());
        self.s_tx = Some(s_tx.clone());
        self.alive.store(true, Ordering::SeqCst);
        self.event_seq.store(0, Ordering::SeqCst);

        let event_seq = self.event_seq.clone();
        let send_handle = tokio::spawn(async move {
            while let Some(mut event) = c_rx.recv().await {
                let seq = event_seq.fetch_add(1, Ordering::SeqCst);
                event.set_event_id(&format!("evt_{}", seq));
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send message: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize event: {}", e);
                    }
                }
            }
        });

        let stats = self.stats.clone();
        let alive = self.alive.clone();
        let recv_handle = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        let close = types::ServerEvent::Close {
                            reason: Some(e.to_string()),
                        };
                        let _ = s_tx.send(close);
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<types::ServerEvent>(&text) {
                            Ok(types::ServerEvent::Unrecognized) => {
                                // Unknown vocabulary is never fatal.
                                tracing::warn!("unrecognized server event dropped: {}", text);
                            }
                            Ok(event) => {
                                if let types::ServerEvent::ResponseDone(ref response) = event {
                                    if let Some(usage) = response.response().usage() {
                                        let total_tokens = usage.total_tokens();
                                        let input_tokens = usage.input_tokens();
                                        let output_tokens = usage.output_tokens();

                                        if let Ok(mut stats_guard) = stats.lock() {
                                            stats_guard.update_usage(total_tokens, input_tokens, output_tokens);
                                        } else {
                                            tracing::error!("failed to update stats");
                                        }

                                        tracing::debug!(
                                            "total_tokens: {}, input_tokens: {}, output_tokens: {}",
                                            total_tokens,
                                            input_tokens,
                                            output_tokens
                                        );
                                    }
                                }

                                if s_tx.send(event).is_err() {
                                    tracing::debug!("no subscribers for server event");
                                }
                            }
                            Err(e) => {
                                // A single malformed message never affects
                                // session liveness.
                                tracing::error!("failed to deserialize event: {}, text=> {:?}", e, text);
                            }
                        }
                    }
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary message: {:?}", bin.len());
                    }
                    Message::Close(reason) => {
                        tracing::info!("connection closed: {:?}", reason);
                        let close = types::ServerEvent::Close {
                            reason: reason.map(|f| f.reason.to_string()),
                        };
                        let _ = s_tx.send(close);
                        break;
                    }
                    _ => {}
                }
            }
            alive.store(false, Ordering::SeqCst);
        });

        self.conn = Some(Connection {
            send_handle,
            recv_handle,
        });
        Ok(())
    }

    pub fn server_events(&self) -> Result<ServerRx, EngineError> {
        match self.s_tx {
            Some(ref tx) => Ok(tx.subscribe()),
            None => Err(EngineError::NotConnected),
        }
    }

    pub fn stats(&self) -> Result<Stats, EngineError> {
        self.stats
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| EngineError::Application("stats lock poisoned".to_string()))
    }

    pub fn is_live(&self) -> bool {
        self.c_tx.is_some() && self.alive.load(Ordering::SeqCst)
    }

    /// Tears the connection down in a fixed order: the writer drains and
    /// stops first, then the reader is released. Safe to call twice.
    pub async fn disconnect(&mut self) {
        self.c_tx.take();
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.send_handle.await {
                tracing::debug!("send task ended with: {}", e);
            }
            conn.recv_handle.abort();
        }
        self.s_tx.take();
        self.alive.store(false, Ordering::SeqCst);
    }

    async fn send_client_event(&mut self, event: types::ClientEvent) -> Result<(), EngineError> {
        match self.c_tx {
            Some(ref tx) => tx
                .send(event)
                .await
                .map_err(|e| EngineError::Transport(format!("client event queue closed: {}", e))),
            None => Err(EngineError::NotConnected),
        }
    }

    pub async fn update_session(&mut self, config: Session) -> Result<(), EngineError> {
        let event = types::ClientEvent::SessionUpdate(types::events::client::SessionUpdateEvent::new(config));
        self.send_client_event(event).await
    }

    pub async fn append_input_audio_buffer(&mut self, audio: Base64EncodedAudioBytes) -> Result<(), EngineError> {
        let event =
            types::ClientEvent::InputAudioBufferAppend(types::events::client::InputAudioBufferAppendEvent::new(audio));
        self.send_client_event(event).await
    }

    pub async fn commit_input_audio_buffer(&mut self) -> Result<(), EngineError> {
        let event =
            types::ClientEvent::InputAudioBufferCommit(types::events::client::InputAudioBufferCommitEvent::new());
        self.send_client_event(event).await
    }

    pub async fn clear_input_audio_buffer(&mut self) -> Result<(), EngineError> {
        let event =
            types::ClientEvent::InputAudioBufferClear(types::events::client::InputAudioBufferClearEvent::new());
        self.send_client_event(event).await
    }

    pub async fn create_conversation_item(&mut self, item: types::Item) -> Result<(), EngineError> {
        let event =
            types::ClientEvent::ConversationItemCreate(types::events::client::ConversationItemCreateEvent::new(item));
        self.send_client_event(event).await
    }

    pub async fn create_response(&mut self) -> Result<(), EngineError> {
        let event = types::ClientEvent::ResponseCreate(types::events::client::ResponseCreateEvent::new());
        self.send_client_event(event).await
    }
}

#[async_trait::async_trait]
impl StreamingChannel for Client {
    async fn connect(&mut self) -> Result<(), EngineError> {
        Client::connect(self).await
    }

    async fn configure_session(&mut self, session: Session) -> Result<(), EngineError> {
        self.update_session(session).await
    }

    async fn send_text(&mut self, text: &str) -> Result<(), EngineError> {
        let item = types::MessageItem::builder()
            .with_role(types::MessageRole::User)
            .with_input_text(text)
            .build();
        self.create_conversation_item(types::Item::Message(item)).await?;
        self.create_response().await
    }

    async fn append_audio(&mut self, audio: Base64EncodedAudioBytes) -> Result<(), EngineError> {
        self.append_input_audio_buffer(audio).await
    }

    async fn commit_audio(&mut self) -> Result<(), EngineError> {
        self.commit_input_audio_buffer().await
    }

    async fn clear_audio(&mut self) -> Result<(), EngineError> {
        self.clear_input_audio_buffer().await
    }

    fn subscribe(&self) -> Result<ServerRx, EngineError> {
        self.server_events()
    }

    fn is_live(&self) -> bool {
        Client::is_live(self)
    }

    async fn disconnect(&mut self) {
        Client::disconnect(self).await
    }
}

pub async fn connect_with_config(capacity: usize, config: config::Config) -> Result<Client, EngineError> {
    let mut client = Client::new(capacity, config);
    client.connect().await?;
    Ok(client)
}

pub async fn connect() -> Result<Client, EngineError> {
    let config = config::Config::new();
    connect_with_config(1024, config).await
}
