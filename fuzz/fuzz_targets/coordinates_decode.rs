//! Fuzz target for coordinate-string decoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use timemark::decode_coordinates;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = decode_coordinates(text);
    }
});
