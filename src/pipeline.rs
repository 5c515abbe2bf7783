//! The audio pipeline.
//!
//! Capture side: microphone samples are enqueued as [`AudioFrame`]s and the
//! caller returns immediately; a separate drain task resamples, base64
//! encodes and sends each frame over the streaming channel, paced at
//! roughly the frame's natural duration. Playback side: inbound synthesized
//! speech is decoded and written to the output device in bounded chunks,
//! interruptible within one chunk-write boundary.

mod capture;
mod playback;

pub use capture::{build_capture_stream, spawn_drain, CaptureQueue, CaptureStream, SequenceTracker};
pub use playback::{build_playback_sink, spawn_delta_feed, Playback, PlaybackSink, RingBufferSink};

/// The size of each audio chunk read from the microphone input stream.
pub const INPUT_CHUNK_SIZE: usize = 1024;
/// The size of each audio chunk for the audio output stream.
pub const OUTPUT_CHUNK_SIZE: usize = 1024;
/// The latency for the output audio buffer in milliseconds.
pub const OUTPUT_LATENCY_MS: usize = 1000;
/// Byte-identical playback requests inside this window are dropped.
pub const DUPLICATE_WINDOW_MS: u64 = 300;
/// Capture queue depth above which back-pressure is logged.
pub const CAPTURE_WARN_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Capture,
    Playback,
}

/// A chunk of mono PCM samples tagged with its direction and a sequence
/// number that increases strictly within one stream. Ownership moves into
/// the queue on enqueue and each frame is consumed exactly once.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    direction: Direction,
    seq: u64,
    samples: Vec<f32>,
}

impl AudioFrame {
    pub fn new(direction: Direction, seq: u64, samples: Vec<f32>) -> Self {
        Self {
            direction,
            seq,
            samples,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// The wall-clock duration of this frame at the given sample rate.
    pub fn natural_duration(&self, sample_rate: f64) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.samples.len() as f64 / sample_rate)
    }
}
