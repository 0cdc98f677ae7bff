#![no_main]

use huffpress::{inspect, Codec, CodecConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Use the size the frame claims so decoding gets past the size check
    let size = match inspect(data) {
        Ok(info) => info.uncompressed_len,
        Err(_) => return,
    };

    // Skip frames that would allocate unreasonably large outputs
    if size > 16 * 1024 * 1024 {
        return;
    }

    let codec = match Codec::with_config(CodecConfig { num_threads: 1, ..Default::default() }) {
        Ok(codec) => codec,
        Err(_) => return,
    };

    // Decoding may fail on invalid input - that's OK
    // We're looking for panics/crashes, not errors
    if let Ok(out) = codec.decompress(data, size as usize) {
        assert_eq!(out.len() as u64, size);
    }
});
