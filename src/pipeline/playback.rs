use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ringbuf::traits::Producer;
use ringbuf::HeapProd;
use rubato::Resampler;

use crate::client::ServerRx;
use crate::error::EngineError;
use crate::pipeline::{AudioFrame, Direction, DUPLICATE_WINDOW_MS, OUTPUT_CHUNK_SIZE};
use xr_session_utils as utils;
use xr_session_utils::audio::WIRE_PCM16_SAMPLE_RATE;

/// The audio output seam. The real implementation pushes into the device's
/// shared ring buffer; tests substitute their own sink to observe chunk
/// writes.
#[async_trait]
pub trait PlaybackSink: Send {
    /// The chunk size this sink wants per write: small enough to keep
    /// latency low, large enough to avoid underrun, and never below the
    /// device's reported minimum.
    fn chunk_size(&self) -> usize;

    async fn write(&mut self, chunk: &[f32]) -> Result<(), EngineError>;
}

/// Writes into the ring buffer shared with the cpal output callback.
pub struct RingBufferSink {
    producer: HeapProd<f32>,
    chunk: usize,
}

impl RingBufferSink {
    /// `device_min` is the output device's reported minimum buffer size.
    pub fn new(producer: HeapProd<f32>, device_min: usize) -> Self {
        Self {
            producer,
            chunk: device_min.max(OUTPUT_CHUNK_SIZE),
        }
    }
}

#[async_trait]
impl PlaybackSink for RingBufferSink {
    fn chunk_size(&self) -> usize {
        self.chunk
    }

    async fn write(&mut self, chunk: &[f32]) -> Result<(), EngineError> {
        let mut dropped = 0usize;
        for sample in chunk {
            if self.producer.try_push(*sample).is_err() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::warn!(dropped, "output ring buffer full; samples dropped");
        }
        Ok(())
    }
}

struct ActivePlayback {
    stop: Arc<AtomicBool>,
    handle: tokio::task::JoinHandle<()>,
}

/// Owns the single active playback stream. A newer request preempts the
/// current one — output halts within one chunk-write boundary and the sink
/// is released before the new stream starts — unless it is a byte-identical
/// duplicate inside the debounce window, which is dropped.
pub struct Playback {
    active: Option<ActivePlayback>,
    last_request: Option<(u64, tokio::time::Instant)>,
    duplicate_window: std::time::Duration,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new()
    }
}

impl Playback {
    pub fn new() -> Self {
        Self {
            active: None,
            last_request: None,
            duplicate_window: std::time::Duration::from_millis(DUPLICATE_WINDOW_MS),
        }
    }

    pub fn with_duplicate_window(mut self, window: std::time::Duration) -> Self {
        self.duplicate_window = window;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Starts a new playback stream and returns its feeder. Frames sent on
    /// the feeder are written chunk by chunk; closing it ends the stream.
    pub async fn begin_stream<S>(&mut self, mut sink: S) -> tokio::sync::mpsc::Sender<AudioFrame>
    where
        S: PlaybackSink + 'static,
    {
        self.preempt().await;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let (feed_tx, mut feed_rx) = tokio::sync::mpsc::channel::<AudioFrame>(64);

        let handle = tokio::spawn(async move {
            let chunk_size = sink.chunk_size().max(1);
            while let Some(frame) = feed_rx.recv().await {
                let samples = frame.into_samples();
                for chunk in samples.chunks(chunk_size) {
                    if stop_flag.load(Ordering::SeqCst) {
                        return;
                    }
                    if let Err(e) = sink.write(chunk).await {
                        tracing::error!("playback write failed: {}", e);
                        return;
                    }
                }
            }
        });

        self.active = Some(ActivePlayback { stop, handle });
        feed_tx
    }

    /// Plays one complete utterance. Returns false when the request was
    /// dropped as a duplicate of the previous one.
    pub async fn speak<S>(&mut self, sink: S, samples: Vec<f32>) -> bool
    where
        S: PlaybackSink + 'static,
    {
        let digest = hash_samples(&samples);
        if let Some((last, at)) = self.last_request {
            if last == digest && at.elapsed() < self.duplicate_window {
                tracing::debug!("duplicate playback request inside debounce window; dropped");
                return false;
            }
        }
        self.last_request = Some((digest, tokio::time::Instant::now()));

        let feeder = self.begin_stream(sink).await;
        if feeder
            .send(AudioFrame::new(Direction::Playback, 0, samples))
            .await
            .is_err()
        {
            tracing::warn!("playback stream ended before the utterance was queued");
        }
        true
    }

    /// Halts the active stream within one chunk-write boundary and releases
    /// its sink.
    pub async fn stop(&mut self) {
        self.preempt().await;
    }

    async fn preempt(&mut self) {
        if let Some(active) = self.active.take() {
            active.stop.store(true, Ordering::SeqCst);
            if let Err(e) = active.handle.await {
                if !e.is_cancelled() {
                    tracing::warn!("playback task ended with: {}", e);
                }
            }
        }
    }
}

/// Opens the output device and wires its callback to a shared ring buffer.
/// Returns the stream (playback runs while it is alive), the sink to hand
/// to [`Playback`], and the device sample rate. Device failures are
/// Resource errors and leave the streaming session untouched.
pub fn build_playback_sink(
    device_name: Option<String>,
) -> Result<(cpal::Stream, RingBufferSink, f64), EngineError> {
    use cpal::traits::{DeviceTrait, StreamTrait};
    use ringbuf::traits::{Consumer, Split};

    let output = utils::device::get_or_default_output(device_name)
        .map_err(|e| EngineError::Resource(e.to_string()))?;

    let output_config = output
        .default_output_config()
        .map_err(|e| EngineError::Resource(e.to_string()))?;
    let device_min = match output_config.buffer_size() {
        cpal::SupportedBufferSize::Range { min, .. } => *min as usize,
        cpal::SupportedBufferSize::Unknown => OUTPUT_CHUNK_SIZE,
    };
    let output_config = cpal::StreamConfig {
        channels: output_config.channels(),
        sample_rate: output_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(cpal::FrameCount::from(OUTPUT_CHUNK_SIZE as u32)),
    };
    let output_channel_count = output_config.channels as usize;
    let output_sample_rate = output_config.sample_rate.0 as f64;
    tracing::info!("Output stream config: {:?}", &output_config);

    let buffer = utils::audio::shared_buffer(output_sample_rate as usize * crate::pipeline::OUTPUT_LATENCY_MS / 1000);
    let (producer, mut consumer) = buffer.split();

    let output_data_fn = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        let mut sample_index = 0;
        while sample_index < data.len() {
            let sample = consumer.try_pop().unwrap_or(0.0);
            // Left channel (ch:0).
            if sample_index < data.len() {
                data[sample_index] = sample;
                sample_index += 1;
            }
            // Right channel (ch:1), if it exists.
            if output_channel_count > 1 && sample_index < data.len() {
                data[sample_index] = sample;
                sample_index += 1;
            }
            // Ignore other channels.
            sample_index += output_channel_count.saturating_sub(2);
        }
    };
    let stream = output
        .build_output_stream(
            &output_config,
            output_data_fn,
            move |err| tracing::error!("An error occurred on output stream: {}", err),
            None,
        )
        .map_err(|e| EngineError::Resource(e.to_string()))?;
    stream.play().map_err(|e| EngineError::Resource(e.to_string()))?;

    Ok((stream, RingBufferSink::new(producer, device_min), output_sample_rate))
}

fn hash_samples(samples: &[f32]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for sample in samples {
        sample.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Bridges the streaming channel to a playback feeder: decodes inbound
/// audio deltas, resamples from the 24 kHz wire rate to the output device
/// rate, and forwards the frames.
pub fn spawn_delta_feed(
    mut events: ServerRx,
    feeder: tokio::sync::mpsc::Sender<AudioFrame>,
    output_sample_rate: f64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut resampler = match utils::audio::create_resampler(WIRE_PCM16_SAMPLE_RATE, output_sample_rate, 100) {
            Ok(resampler) => resampler,
            Err(e) => {
                tracing::error!("failed to create playback resampler: {}", e);
                return;
            }
        };
        let mut seq: u64 = 0;

        loop {
            match events.recv().await {
                Ok(xr_session_types::ServerEvent::ResponseAudioDelta(delta)) => {
                    let decoded = utils::audio::decode(delta.delta());
                    if decoded.is_empty() {
                        continue;
                    }
                    let chunk_size = resampler.input_frames_next();
                    let mut resampled: Vec<f32> = vec![];
                    for samples in utils::audio::split_for_chunks(&decoded, chunk_size) {
                        if let Ok(resamples) = resampler.process(&[samples.as_slice()], None) {
                            if let Some(resamples) = resamples.first() {
                                resampled.extend(resamples.iter().cloned());
                            }
                        }
                    }
                    let frame = AudioFrame::new(Direction::Playback, seq, resampled);
                    seq += 1;
                    if feeder.send(frame).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "playback feed lagged behind the event stream");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct GatedSink {
        chunk: usize,
        writes: Arc<AtomicUsize>,
        gate: Arc<tokio::sync::Semaphore>,
    }

    #[async_trait]
    impl PlaybackSink for GatedSink {
        fn chunk_size(&self) -> usize {
            self.chunk
        }

        async fn write(&mut self, _chunk: &[f32]) -> Result<(), EngineError> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| EngineError::Resource("gate closed".to_string()))?;
            permit.forget();
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CountingSink {
        chunk: usize,
        writes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PlaybackSink for CountingSink {
        fn chunk_size(&self) -> usize {
            self.chunk
        }

        async fn write(&mut self, _chunk: &[f32]) -> Result<(), EngineError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn wait_for(writes: &Arc<AtomicUsize>, count: usize) {
        for _ in 0..1000 {
            if writes.load(Ordering::SeqCst) >= count {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        panic!("sink never reached {} writes", count);
    }

    #[tokio::test]
    async fn stop_halts_within_one_chunk_boundary() {
        let writes = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let sink = GatedSink {
            chunk: 4,
            writes: writes.clone(),
            gate: gate.clone(),
        };

        let mut playback = Playback::new();
        // 10 chunks of 4 samples.
        assert!(playback.speak(sink, vec![0.25; 40]).await);

        // Let exactly 3 chunks through, then stop while chunk 4 is blocked
        // mid-write.
        gate.add_permits(3);
        wait_for(&writes, 3).await;
        tokio::join!(playback.stop(), async {
            gate.add_permits(100);
        });

        assert!(writes.load(Ordering::SeqCst) <= 4, "stop must halt within one chunk");
        assert!(!playback.is_active());
    }

    #[tokio::test]
    async fn duplicate_request_inside_window_is_dropped() {
        let writes = Arc::new(AtomicUsize::new(0));
        let samples = vec![0.5; 16];

        let mut playback = Playback::new();
        let first = playback
            .speak(
                CountingSink {
                    chunk: 4,
                    writes: writes.clone(),
                },
                samples.clone(),
            )
            .await;
        assert!(first);

        let second = playback
            .speak(
                CountingSink {
                    chunk: 4,
                    writes: writes.clone(),
                },
                samples,
            )
            .await;
        assert!(!second, "byte-identical request within the window must be dropped");
    }

    #[tokio::test]
    async fn different_request_is_not_debounced() {
        let writes = Arc::new(AtomicUsize::new(0));
        let mut playback = Playback::new();
        assert!(
            playback
                .speak(
                    CountingSink {
                        chunk: 4,
                        writes: writes.clone(),
                    },
                    vec![0.5; 16],
                )
                .await
        );
        assert!(
            playback
                .speak(
                    CountingSink {
                        chunk: 4,
                        writes: writes.clone(),
                    },
                    vec![-0.5; 16],
                )
                .await
        );
    }

    #[tokio::test]
    async fn delta_feed_decodes_and_forwards_frames() {
        let (tx, rx) = tokio::sync::broadcast::channel(8);
        let (feed_tx, mut feed_rx) = tokio::sync::mpsc::channel(8);
        let handle = spawn_delta_feed(rx, feed_tx, WIRE_PCM16_SAMPLE_RATE);

        let audio = utils::audio::encode(&vec![0.1_f32; 50]);
        let json = format!(
            r#"{{
                "type": "response.audio.delta",
                "event_id": "event_9",
                "response_id": "resp_1",
                "item_id": "item_1",
                "output_index": 0,
                "content_index": 0,
                "delta": "{}"
            }}"#,
            audio
        );
        let event: xr_session_types::ServerEvent = serde_json::from_str(&json).unwrap();
        tx.send(event).unwrap();

        let frame = feed_rx.recv().await.expect("frame should be forwarded");
        assert_eq!(frame.direction(), Direction::Playback);
        assert_eq!(frame.seq(), 0);
        assert!(!frame.samples().is_empty());

        drop(tx);
        handle.await.unwrap();
    }
}
