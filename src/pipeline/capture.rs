use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FrameCount, StreamConfig};
use rubato::Resampler;

use crate::channel::StreamingChannel;
use crate::error::EngineError;
use crate::pipeline::{AudioFrame, Direction, CAPTURE_WARN_DEPTH, INPUT_CHUNK_SIZE};
use xr_session_utils as utils;
use xr_session_utils::audio::WIRE_PCM16_SAMPLE_RATE;

/// Producer half of the capture queue. `push` assigns the sequence number,
/// enqueues and returns immediately — it is safe to call from the audio
/// callback thread and never blocks on the network.
pub struct CaptureQueue {
    tx: tokio::sync::mpsc::UnboundedSender<AudioFrame>,
    seq: AtomicU64,
    depth: Arc<AtomicUsize>,
    warn_depth: usize,
}

/// Consumer half, drained by [`spawn_drain`].
pub struct CaptureStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<AudioFrame>,
    depth: Arc<AtomicUsize>,
}

impl CaptureQueue {
    pub fn channel() -> (CaptureQueue, CaptureStream) {
        Self::channel_with_warn_depth(CAPTURE_WARN_DEPTH)
    }

    pub fn channel_with_warn_depth(warn_depth: usize) -> (CaptureQueue, CaptureStream) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        (
            CaptureQueue {
                tx,
                seq: AtomicU64::new(0),
                depth: depth.clone(),
                warn_depth,
            },
            CaptureStream { rx, depth },
        )
    }

    /// Returns false when the consumer is gone and the frame was dropped.
    pub fn push(&self, samples: Vec<f32>) -> bool {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let frame = AudioFrame::new(Direction::Capture, seq, samples);
        if self.tx.send(frame).is_err() {
            return false;
        }
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        if depth > self.warn_depth {
            tracing::warn!(depth, "capture queue backlog; network drain is not keeping up");
        }
        true
    }
}

impl CaptureStream {
    pub async fn recv(&mut self) -> Option<AudioFrame> {
        let frame = self.rx.recv().await;
        if frame.is_some() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }
        frame
    }
}

/// Watches capture sequence numbers. A gap means frames were lost between
/// producer and consumer; it is reported, never fatal.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    next: Option<u64>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of missing frames before `seq`, if any.
    pub fn observe(&mut self, seq: u64) -> Option<u64> {
        let gap = match self.next {
            Some(expected) if seq > expected => Some(seq - expected),
            _ => None,
        };
        self.next = Some(seq + 1);
        gap
    }
}

/// Builds the cpal input stream feeding `queue`, mixing down to mono.
/// Returns the stream (capture runs while it is alive; drop it to stop)
/// and the device sample rate. Device failures are Resource errors and do
/// not affect the streaming session.
pub fn build_capture_stream(
    device_name: Option<String>,
    queue: CaptureQueue,
) -> Result<(cpal::Stream, f64), EngineError> {
    let input = utils::device::get_or_default_input(device_name)
        .map_err(|e| EngineError::Resource(e.to_string()))?;

    let input_config = input
        .default_input_config()
        .map_err(|e| EngineError::Resource(e.to_string()))?;
    let input_config = StreamConfig {
        channels: input_config.channels(),
        sample_rate: input_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(INPUT_CHUNK_SIZE as u32)),
    };
    let input_channel_count = input_config.channels as usize;
    let input_sample_rate = input_config.sample_rate.0 as f64;
    tracing::info!("Input stream config: {:?}", &input_config);

    let input_data_fn = move |data: &[f32], _: &cpal::InputCallbackInfo| {
        let audio = if input_channel_count > 1 {
            data.chunks(input_channel_count)
                .map(|c| c.iter().sum::<f32>() / input_channel_count as f32)
                .collect::<Vec<f32>>()
        } else {
            data.to_vec()
        };
        if !queue.push(audio) {
            tracing::warn!("capture frame dropped; drain task is gone");
        }
    };

    let stream = input
        .build_input_stream(
            &input_config,
            input_data_fn,
            move |err| tracing::error!("An error occurred on input stream: {}", err),
            None,
        )
        .map_err(|e| EngineError::Resource(e.to_string()))?;
    stream.play().map_err(|e| EngineError::Resource(e.to_string()))?;

    Ok((stream, input_sample_rate))
}

/// Drains the capture queue onto the streaming channel: resamples to the
/// 24 kHz wire rate, base64 encodes, appends, then sleeps the frame's
/// natural duration so backlogged audio does not burst the connection.
pub fn spawn_drain<C>(
    mut stream: CaptureStream,
    client: Arc<tokio::sync::Mutex<C>>,
    input_sample_rate: f64,
) -> tokio::task::JoinHandle<()>
where
    C: StreamingChannel + 'static,
{
    tokio::spawn(async move {
        let mut resampler =
            match utils::audio::create_resampler(input_sample_rate, WIRE_PCM16_SAMPLE_RATE, INPUT_CHUNK_SIZE) {
                Ok(resampler) => resampler,
                Err(e) => {
                    tracing::error!("failed to create capture resampler: {}", e);
                    return;
                }
            };
        let mut tracker = SequenceTracker::new();
        let mut buffer: VecDeque<f32> = VecDeque::with_capacity(INPUT_CHUNK_SIZE * 2);

        while let Some(frame) = stream.recv().await {
            if let Some(gap) = tracker.observe(frame.seq()) {
                tracing::warn!(gap, seq = frame.seq(), "capture sequence gap detected");
            }
            let pace = frame.natural_duration(input_sample_rate);

            buffer.extend(frame.into_samples());
            let mut resampled: Vec<f32> = vec![];
            while buffer.len() >= INPUT_CHUNK_SIZE {
                let chunk: Vec<f32> = buffer.drain(..INPUT_CHUNK_SIZE).collect();
                if let Ok(resamples) = resampler.process(&[chunk.as_slice()], None) {
                    if let Some(resamples) = resamples.first() {
                        resampled.extend(resamples.iter().cloned());
                    }
                }
            }
            if !resampled.is_empty() {
                let audio_bytes = utils::audio::encode(&resampled);
                if let Err(e) = client.lock().await.append_audio(audio_bytes).await {
                    tracing::warn!("failed to append audio buffer: {}", e);
                }
            }

            tokio::time::sleep(pace).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sequence_numbers_are_strictly_increasing() {
        let (queue, mut stream) = CaptureQueue::channel();
        for _ in 0..5 {
            assert!(queue.push(vec![0.0; 4]));
        }
        let mut last = None;
        for _ in 0..5 {
            let frame = stream.recv().await.unwrap();
            if let Some(prev) = last {
                assert_eq!(frame.seq(), prev + 1);
            }
            last = Some(frame.seq());
        }
    }

    #[test]
    fn tracker_reports_gap_size() {
        let mut tracker = SequenceTracker::new();
        assert_eq!(tracker.observe(0), None);
        assert_eq!(tracker.observe(1), None);
        // Frames 2 and 3 lost.
        assert_eq!(tracker.observe(4), Some(2));
        assert_eq!(tracker.observe(5), None);
    }

    #[test]
    fn push_reports_closed_consumer() {
        let (queue, stream) = CaptureQueue::channel();
        drop(stream);
        assert!(!queue.push(vec![0.0; 4]));
    }
}
