#![no_main]

use huffpress::{Codec, CodecConfig, CompressionLevel};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte selects the level, the rest is the payload
    let level = CompressionLevel::try_from(1 + (data[0] % 9) as i32).unwrap();
    let payload = &data[1..];

    // Limit data size to avoid slowdowns
    let payload = if payload.len() > 64 * 1024 { &payload[..64 * 1024] } else { payload };

    let config = CodecConfig { compression_level: level, chunk_size: 4096, num_threads: 1 };
    let codec = Codec::with_config(config).unwrap();

    let compressed = codec.compress(payload, codec.compress_bound(payload.len())).unwrap();
    let decompressed = codec.decompress(&compressed, payload.len()).unwrap();
    assert_eq!(decompressed, payload, "Round-trip mismatch");
});
