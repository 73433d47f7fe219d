//! Fuzz target for KML parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the KML reader, checking
//! for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use timemark::from_kml_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }
    let _ = from_kml_slice(data);
});
