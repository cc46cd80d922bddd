#![no_main]

use dexray::Vendor;
use libfuzzer_sys::fuzz_target;
use strum::IntoEnumIterator;

fuzz_target!(|data: &[u8]| {
    for vendor in Vendor::iter() {
        let _ = vendor.parse(data);
    }
});
