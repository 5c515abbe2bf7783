/// Wire audio format: mono 16-bit linear PCM at 24 kHz, base64-encoded per chunk.
pub const PCM16_SAMPLE_RATE: u32 = 24_000;
pub const PCM16_CHANNELS: u16 = 1;
pub const PCM16_BITS_PER_SAMPLE: u16 = 16;
