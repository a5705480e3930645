//! Fuzz target for WAV decoding.
//!
//! The decoder sees whatever ffmpeg wrote to the output temp file, which on
//! partial failures can be truncated or garbage. It must reject such input
//! without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sttd::AudioBuffer;

fuzz_target!(|data: &[u8]| {
    let _ = AudioBuffer::from_wav_bytes(data);
});
