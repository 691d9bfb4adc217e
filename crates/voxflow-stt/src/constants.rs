//! Constants for STT processing

/// Standard sample rate for STT processing (16 kHz)
pub(crate) const SAMPLE_RATE_HZ: u32 = 16_000;

/// Frame size in samples for STT processing
pub(crate) const FRAME_SIZE_SAMPLES: u32 = 512;
